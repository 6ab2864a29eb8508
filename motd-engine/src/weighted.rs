//! Deterministic weighted choice.
use thiserror::Error;

/// Anything that can take part in a weighted draw.
pub trait Weighted {
    /// Configured weight; values below one are treated as one.
    fn weight(&self) -> u32;
}

impl<T: Weighted + ?Sized> Weighted for std::sync::Arc<T> {
    fn weight(&self) -> u32 {
        (**self).weight()
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceError {
    #[error("weighted choice requires at least one candidate")]
    Empty,
}

#[inline]
fn effective_weight<T: Weighted>(candidate: &T) -> u64 {
    u64::from(candidate.weight().max(1))
}

/// Pick one candidate using `seed` as the roll.
///
/// The same candidate order and seed always yield the same candidate, and
/// every candidate has a non-zero share of the seed space.
///
/// # Errors
///
/// Returns [`ChoiceError::Empty`] when `candidates` is empty.
pub fn pick<T: Weighted>(candidates: &[T], seed: u64) -> Result<&T, ChoiceError> {
    pick_index(candidates, seed).map(|idx| &candidates[idx])
}

/// Index form of [`pick`].
///
/// # Errors
///
/// Returns [`ChoiceError::Empty`] when `candidates` is empty.
pub fn pick_index<T: Weighted>(candidates: &[T], seed: u64) -> Result<usize, ChoiceError> {
    if candidates.is_empty() {
        return Err(ChoiceError::Empty);
    }
    let total: u64 = candidates.iter().map(effective_weight).sum();
    let roll = seed % total;
    let mut current = 0;
    for (idx, candidate) in candidates.iter().enumerate() {
        current += effective_weight(candidate);
        if roll < current {
            return Ok(idx);
        }
    }
    Ok(0)
}
