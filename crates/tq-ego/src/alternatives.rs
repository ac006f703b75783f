//! Picking alternatives from per-alternative query results.
//!
//! Route-relative queries return one value per alternative, in alternative
//! order.  Several queries can be combined by zipping their results before
//! filtering, e.g. `distances.iter().zip(&objects)`.

use std::cmp::Ordering;

/// Indices of the alternatives whose result satisfies `filter`.
pub fn alternatives_where<T>(results: &[T], filter: impl Fn(&T) -> bool) -> Vec<usize> {
    results
        .iter()
        .enumerate()
        .filter(|(_, r)| filter(r))
        .map(|(i, _)| i)
        .collect()
}

/// Like [`alternatives_where`], then ordered by `compare`.  Ties keep
/// alternative order.
pub fn alternatives_sorted<T>(
    results: &[T],
    filter:  impl Fn(&T) -> bool,
    compare: impl Fn(&T, &T) -> Ordering,
) -> Vec<usize> {
    let mut indices = alternatives_where(results, filter);
    indices.sort_by(|&a, &b| compare(&results[a], &results[b]));
    indices
}
