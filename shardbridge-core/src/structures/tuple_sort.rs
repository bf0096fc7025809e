//! In-place quicksort over packed tuple payloads
//!
//! Sorts the payload region of a tuple buffer by `(blockno, offno)` without
//! materializing tuples. Every comparison reads the 6-byte key straight out of
//! the slice and every swap exchanges `stride` bytes.
//!
//! - Median-of-three pivot with Hoare partitioning
//! - Recurses into the smaller partition and loops on the larger one, so stack
//!   depth stays O(log n) even for millions of tuples
//! - Insertion sort below [`INSERTION_SORT_THRESHOLD`]
//! - Not stable

use byteorder::{ByteOrder, LittleEndian};

/// Partitions at or below this many tuples are finished with insertion sort
pub const INSERTION_SORT_THRESHOLD: usize = 16;

/// Smallest stride that still holds a `(blockno, offno)` key
const KEY_LEN: usize = 6;

#[inline(always)]
fn key_at(payload: &[u8], stride: usize, idx: usize) -> u64 {
    let off = idx * stride;
    let blockno = LittleEndian::read_u32(&payload[off..off + 4]) as u64;
    let offno = LittleEndian::read_u16(&payload[off + 4..off + KEY_LEN]) as u64;
    (blockno << 16) | offno
}

#[inline(always)]
fn swap_tuples(payload: &mut [u8], stride: usize, a: usize, b: usize) {
    if a == b {
        return;
    }
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    let (left, right) = payload.split_at_mut(hi * stride);
    left[lo * stride..(lo + 1) * stride].swap_with_slice(&mut right[..stride]);
}

/// Sort `payload` (a whole number of `stride`-byte tuples) by `(blockno, offno)`
pub fn sort_tuples(payload: &mut [u8], stride: usize) {
    debug_assert!(stride >= KEY_LEN);
    debug_assert_eq!(payload.len() % stride, 0);

    let count = payload.len() / stride;
    if count < 2 {
        return;
    }
    quicksort(payload, stride, 0, count - 1);
}

/// True when adjacent tuples are in ascending `(blockno, offno)` order
pub fn is_sorted_tuples(payload: &[u8], stride: usize) -> bool {
    let count = payload.len() / stride;
    (1..count).all(|i| key_at(payload, stride, i - 1) <= key_at(payload, stride, i))
}

/// Sorts the inclusive range `[lo, hi]`
fn quicksort(payload: &mut [u8], stride: usize, mut lo: usize, mut hi: usize) {
    while lo < hi {
        if hi - lo < INSERTION_SORT_THRESHOLD {
            insertion_sort(payload, stride, lo, hi);
            return;
        }

        let split = partition(payload, stride, lo, hi);

        // left = [lo, split], right = [split + 1, hi]
        if split - lo < hi - split {
            quicksort(payload, stride, lo, split);
            lo = split + 1;
        } else {
            quicksort(payload, stride, split + 1, hi);
            hi = split;
        }
    }
}

/// Hoare partition around the median of `lo`, `mid`, `hi`.
///
/// Returns `j` with `lo <= j < hi` such that every key in `[lo, j]` is
/// `<=` every key in `[j + 1, hi]`.
fn partition(payload: &mut [u8], stride: usize, lo: usize, hi: usize) -> usize {
    let mid = lo + (hi - lo) / 2;

    if key_at(payload, stride, mid) < key_at(payload, stride, lo) {
        swap_tuples(payload, stride, lo, mid);
    }
    if key_at(payload, stride, hi) < key_at(payload, stride, lo) {
        swap_tuples(payload, stride, lo, hi);
    }
    if key_at(payload, stride, hi) < key_at(payload, stride, mid) {
        swap_tuples(payload, stride, mid, hi);
    }
    let pivot = key_at(payload, stride, mid);

    let mut i = lo;
    let mut j = hi;
    loop {
        while key_at(payload, stride, i) < pivot {
            i += 1;
        }
        while key_at(payload, stride, j) > pivot {
            j -= 1;
        }
        if i >= j {
            return j;
        }
        swap_tuples(payload, stride, i, j);
        i += 1;
        j -= 1;
    }
}

fn insertion_sort(payload: &mut [u8], stride: usize, lo: usize, hi: usize) {
    for i in lo + 1..=hi {
        let mut j = i;
        while j > lo && key_at(payload, stride, j - 1) > key_at(payload, stride, j) {
            swap_tuples(payload, stride, j - 1, j);
            j -= 1;
        }
    }
}
