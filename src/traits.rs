//! Core seams for the day-tour planner.
//!
//! The engine depends on a single external capability: a distance matrix for
//! the addresses of one carrier run. It is injected through
//! [`DistanceMatrixProvider`] so the HTTP client, the synthetic estimator and
//! test doubles are interchangeable.

use crate::error::ProviderError;

/// Metric distances in meters, indexed by the provided address order.
///
/// `matrix[i][j]` is the distance from address `i` to address `j`. Symmetry
/// is not assumed.
pub type DistanceMatrix = Vec<Vec<u64>>;

/// Provides a distance matrix for a list of addresses.
///
/// Implementations should return an `n x n` matrix where `n == addresses.len()`.
/// The engine checks the shape and falls back to the synthetic estimator when
/// it does not hold.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, addresses: &[String]) -> Result<DistanceMatrix, ProviderError>;
}

/// Returns true when `matrix` is square with side `n`.
pub fn is_square(matrix: &DistanceMatrix, n: usize) -> bool {
    matrix.len() == n && matrix.iter().all(|row| row.len() == n)
}
