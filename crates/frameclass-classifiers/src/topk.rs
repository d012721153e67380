//! Reduction of a raw score vector to a ranked top-K list.
//!
//! Two strategies are provided, one per backend:
//!
//! - [`top_k_stable_sort`] sorts every score in descending order with a stable
//!   sort and truncates. Equal scores keep their original index order.
//! - [`top_k_bounded`] makes a single pass over the scores and keeps a sorted
//!   buffer of at most `k` running maxima. A score only displaces an entry it
//!   strictly exceeds, so among equal scores the first one seen wins.
//!
//! For inputs without ties both strategies return the same list. NaN scores
//! are never ranked by either strategy.

use frameclass_core::types::descending;

/// Number of predictions returned by `top_k_predictions`
pub const TOP_K: usize = 3;

/// Index of the highest score. Ties go to the lowest index; NaN is skipped.
///
/// Returns `None` when there is nothing to rank.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, value)) if score <= value => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}

/// Full stable sort, descending, truncated to `k`
pub fn top_k_stable_sort(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, score)| !score.is_nan())
        .collect();
    ranked.sort_by(|a, b| descending(a.1, b.1));
    ranked.truncate(k);
    ranked
}

/// Single-scan insertion into a bounded buffer of `k` entries
pub fn top_k_bounded(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut buffer: Vec<(usize, f32)> = Vec::with_capacity(k + 1);
    if k == 0 {
        return buffer;
    }

    for (index, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        // First slot whose value the new score strictly exceeds
        let slot = buffer
            .iter()
            .position(|&(_, value)| score > value)
            .unwrap_or(buffer.len());
        if slot < k {
            buffer.insert(slot, (index, score));
            buffer.truncate(k);
        }
    }
    buffer
}
