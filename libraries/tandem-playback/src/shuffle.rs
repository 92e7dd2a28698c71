//! Anchored shuffle order generation
//!
//! A shuffle order is a permutation of queue indices whose first element is
//! the track the listener was on when shuffle began. The remaining indices
//! are a uniform Fisher-Yates permutation.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::error::PlaybackError;

/// Build a shuffle order for a queue of `len` items anchored at `anchor`
///
/// Returns an empty order for an empty queue. An anchor past the end is
/// clamped to the last index.
pub fn anchored_order<R: Rng + ?Sized>(len: usize, anchor: usize, rng: &mut R) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }

    let anchor = if anchor >= len {
        debug!(
            "{}, anchoring shuffle at last item",
            PlaybackError::OutOfRangeIndex { index: anchor, len }
        );
        len - 1
    } else {
        anchor
    };

    let mut rest: Vec<usize> = (0..len).filter(|&i| i != anchor).collect();
    rest.shuffle(rng);

    let mut order = Vec::with_capacity(len);
    order.push(anchor);
    order.extend(rest);
    order
}

/// Whether `order` is a permutation of `0..len`
pub fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &index in order {
        if index >= len || seen[index] {
            return false;
        }
        seen[index] = true;
    }
    true
}
