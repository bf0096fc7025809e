//! Lazy k-way merge over pre-sorted slices
//!
//! Each shard returns its terms already sorted. The merge keeps one cursor per
//! input and a min-heap of the current heads, so producing the next element
//! costs O(log k) and the merged result is never materialized.
//! Duplicates across inputs are all emitted.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap entry: the head of one input
struct MergeEntry<'a, T> {
    value: &'a T,
    source: usize,
    position: usize,
}

impl<T: Ord> PartialEq for MergeEntry<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: Ord> Eq for MergeEntry<'_, T> {}

impl<T: Ord> PartialOrd for MergeEntry<'_, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> Ord for MergeEntry<'_, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; equal values come out lowest source first
        other
            .value
            .cmp(self.value)
            .then_with(|| other.source.cmp(&self.source))
    }
}

/// Ascending merge of k sorted inputs, consumed once
pub struct KWayMerge<'a, T> {
    sources: Vec<&'a [T]>,
    heap: BinaryHeap<MergeEntry<'a, T>>,
    remaining: usize,
}

impl<'a, T: Ord> KWayMerge<'a, T> {
    /// Merge the first `lengths[i]` elements of each `arrays[i]`.
    ///
    /// Inputs may be over-allocated buffers. A length past the end of its
    /// array is clamped, and arrays without a length contribute nothing.
    pub fn new<A: AsRef<[T]>>(arrays: &'a [A], lengths: &[usize]) -> Self {
        let sources: Vec<&'a [T]> = arrays
            .iter()
            .enumerate()
            .map(|(i, array)| {
                let array = array.as_ref();
                let len = lengths.get(i).copied().unwrap_or(0).min(array.len());
                &array[..len]
            })
            .collect();

        let mut heap = BinaryHeap::with_capacity(sources.len());
        for (source, slice) in sources.iter().enumerate() {
            if let Some(value) = slice.first() {
                heap.push(MergeEntry {
                    value,
                    source,
                    position: 0,
                });
            }
        }

        let remaining = sources.iter().map(|s| s.len()).sum();
        Self {
            sources,
            heap,
            remaining,
        }
    }

    /// Elements not yet emitted
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }
}

/// Merge full-length sorted inputs
pub fn merge_sorted<T: Ord, A: AsRef<[T]>>(arrays: &[A]) -> KWayMerge<'_, T> {
    let lengths: Vec<usize> = arrays.iter().map(|a| a.as_ref().len()).collect();
    KWayMerge::new(arrays, &lengths)
}

impl<'a, T: Ord> Iterator for KWayMerge<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let entry = self.heap.pop()?;
        let next_position = entry.position + 1;
        if let Some(value) = self.sources[entry.source].get(next_position) {
            self.heap.push(MergeEntry {
                value,
                source: entry.source,
                position: next_position,
            });
        }
        self.remaining -= 1;
        Some(entry.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Ord> ExactSizeIterator for KWayMerge<'_, T> {}

impl<T: Ord> std::iter::FusedIterator for KWayMerge<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn test_merge_basic() {
        let arrays = vec![vec![1, 4, 7], vec![2, 5, 8], vec![3, 6, 9]];
        let merged: Vec<i32> = merge_sorted(&arrays).copied().collect();
        assert_eq!(merged, (1..=9).collect::<Vec<_>>());
    }

    #[test]
    fn test_merge_keeps_duplicates_and_respects_lengths() {
        let arrays = vec![vec!["a", "c", "zz"], vec!["a", "b", "yy"], vec![]];
        let merged: Vec<&str> = KWayMerge::new(&arrays, &[2, 2, 0]).copied().collect();
        assert_eq!(merged, vec!["a", "a", "b", "c"]);
    }

    #[test]
    fn test_merge_clamps_and_ignores_missing_lengths() {
        let arrays = vec![vec![5, 6], vec![1, 2, 3]];
        let merge = KWayMerge::new(&arrays, &[10]);
        assert_eq!(merge.len(), 2);
        assert_eq!(merge.copied().collect::<Vec<_>>(), vec![5, 6]);
    }

    #[test]
    fn test_merge_ties_come_from_lowest_source_first() {
        let arrays = vec![vec![(1, "x")], vec![(1, "x")]];
        let lengths = [1, 1];
        let mut merge = KWayMerge::new(&arrays, &lengths);
        let first = merge.next().unwrap();
        assert!(std::ptr::eq(first, &arrays[0][0]));
        let second = merge.next().unwrap();
        assert!(std::ptr::eq(second, &arrays[1][0]));
        assert!(merge.next().is_none());
        assert!(merge.next().is_none());
    }

    #[test]
    fn test_merge_random_string_arrays() {
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..20 {
            let k = rng.random_range(1..12);
            let mut arrays = Vec::with_capacity(k);
            let mut lengths = Vec::with_capacity(k);
            for _ in 0..k {
                let len = rng.random_range(0..250);
                let mut terms: Vec<String> = (0..len)
                    .map(|_| format!("term{}", rng.random_range(0..500)))
                    .collect();
                terms.sort();
                // over-allocate like a reused per-shard buffer
                terms.push("~unused".to_string());
                arrays.push(terms);
                lengths.push(len);
            }

            let merge = KWayMerge::new(&arrays, &lengths);
            assert_eq!(merge.num_sources(), k);
            let expected_total: usize = lengths.iter().sum();
            assert_eq!(merge.remaining(), expected_total);

            let merged: Vec<&String> = merge.collect();
            assert_eq!(merged.len(), expected_total);
            assert!(merged.windows(2).all(|w| w[0] <= w[1]));
            assert!(merged.iter().all(|t| t.as_str() != "~unused"));
        }
    }

    #[test]
    fn test_merge_empty_inputs() {
        let arrays: Vec<Vec<u64>> = Vec::new();
        assert_eq!(merge_sorted(&arrays).count(), 0);

        let arrays: Vec<Vec<u64>> = vec![vec![], vec![]];
        assert_eq!(merge_sorted(&arrays).count(), 0);
    }
}
