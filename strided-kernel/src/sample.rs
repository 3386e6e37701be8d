//! Uniform sampling of indices without replacement.

use rand::Rng;

use crate::{Result, StridedError};

/// Draw `k` distinct indices uniformly from `[0, population)`.
///
/// Single-pass reservoir sampling: O(population) time, O(k) space. The
/// returned indices are in reservoir order, not sorted.
///
/// # Errors
/// [`StridedError::Argument`] unless `0 <= k < population`.
pub fn without_replacement<R: Rng + ?Sized>(
    population: usize,
    k: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    if population == 0 {
        return Err(StridedError::argument("population must be positive"));
    }
    if k >= population {
        return Err(StridedError::argument(format!(
            "sample size {k} must be smaller than the population {population}"
        )));
    }

    let mut result: Vec<usize> = (0..k).collect();
    for i in k..population {
        let j = rng.gen_range(0..=i);
        if j < k {
            result[j] = i;
        }
    }
    Ok(result)
}

/// [`without_replacement`] using the thread-local generator.
pub fn without_replacement_default(population: usize, k: usize) -> Result<Vec<usize>> {
    without_replacement(population, k, &mut rand::thread_rng())
}
