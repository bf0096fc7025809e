//! Sparse bitmap over arbitrary 64-bit integers
//!
//! Values are split like a roaring bitmap, but with a much narrower low part:
//! - High 56 bits pick a bucket (hash map key)
//! - Low 8 bits index a 256-bit dense vector inside the bucket
//!
//! Transaction ids are handed out monotonically, so live candidate sets fill
//! buckets densely. Scattered values cost one small bucket each instead of a
//! 64K-bit container. Memory grows with the number of buckets touched, never
//! with the value range.
//!
//! Supports insert, membership and enumeration only; there is no removal.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use rustc_hash::FxHashMap;
use std::io::{self, Read, Write};

use crate::error::{Error, Result};

/// Number of low-order bits addressed inside a bucket
pub const BUCKET_BITS: u32 = 8;

const BUCKET_WORDS: usize = (1 << BUCKET_BITS) / 64;
const LOW_MASK: i64 = (1 << BUCKET_BITS) - 1;

#[inline]
fn split(value: i64) -> (i64, usize) {
    // arithmetic shift keeps negative values in negative buckets
    (value >> BUCKET_BITS, (value & LOW_MASK) as usize)
}

#[inline]
fn join(key: i64, low: usize) -> i64 {
    (key << BUCKET_BITS) | low as i64
}

/// Dense bit-vector over the low bits of one bucket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Bucket {
    words: [u64; BUCKET_WORDS],
}

impl Bucket {
    #[inline]
    fn insert(&mut self, low: usize) -> bool {
        let word = &mut self.words[low / 64];
        let mask = 1u64 << (low % 64);
        let fresh = *word & mask == 0;
        *word |= mask;
        fresh
    }

    #[inline]
    fn contains(&self, low: usize) -> bool {
        (self.words[low / 64] >> (low % 64)) & 1 == 1
    }

    fn cardinality(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// Membership set over `i64` keyed by high-order bucket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseLongBitmap {
    buckets: FxHashMap<i64, Bucket>,
    len: usize,
}

impl SparseLongBitmap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size for roughly `buckets` distinct high-order keys
    pub fn with_bucket_capacity(buckets: usize) -> Self {
        Self {
            buckets: FxHashMap::with_capacity_and_hasher(buckets, Default::default()),
            len: 0,
        }
    }

    /// Insert a value. Returns true if it was not present before.
    #[inline]
    pub fn insert(&mut self, value: i64) -> bool {
        let (key, low) = split(value);
        let fresh = self.buckets.entry(key).or_default().insert(low);
        if fresh {
            self.len += 1;
        }
        fresh
    }

    #[inline]
    pub fn contains(&self, value: i64) -> bool {
        let (key, low) = split(value);
        self.buckets
            .get(&key)
            .is_some_and(|bucket| bucket.contains(low))
    }

    /// Number of distinct values
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets allocated so far
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Approximate heap footprint in bytes
    pub fn size_bytes(&self) -> usize {
        self.buckets.capacity() * (std::mem::size_of::<(i64, Bucket)>() + 1)
    }

    /// One iterator per bucket. Each is ascending; bucket order is unspecified.
    pub fn buckets(&self) -> impl Iterator<Item = BucketIter<'_>> + '_ {
        self.buckets.iter().map(|(&key, bucket)| BucketIter {
            key,
            words: &bucket.words,
            word_idx: 0,
            current: bucket.words[0],
        })
    }

    /// All values, bucket by bucket
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.buckets().flatten()
    }

    /// Serialize as bucket count followed by `(key, words)` per bucket
    pub fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u64::<LittleEndian>(self.buckets.len() as u64)?;
        for (&key, bucket) in &self.buckets {
            writer.write_i64::<LittleEndian>(key)?;
            for &word in &bucket.words {
                writer.write_u64::<LittleEndian>(word)?;
            }
        }
        Ok(())
    }

    pub fn deserialize<R: Read>(reader: &mut R) -> Result<Self> {
        let read = |reader: &mut R| -> io::Result<Self> {
            let num_buckets = reader.read_u64::<LittleEndian>()?;
            let mut bitmap = Self::new();
            for _ in 0..num_buckets {
                let key = reader.read_i64::<LittleEndian>()?;
                let mut bucket = Bucket::default();
                for word in bucket.words.iter_mut() {
                    *word = reader.read_u64::<LittleEndian>()?;
                }
                let card = bucket.cardinality();
                if card == 0 {
                    return Err(io::Error::new(io::ErrorKind::InvalidData, "empty bucket"));
                }
                if bitmap.buckets.insert(key, bucket).is_some() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "duplicate bucket key",
                    ));
                }
                bitmap.len += card;
            }
            Ok(bitmap)
        };
        read(reader).map_err(|e| Error::from_decode(e, "sparse bitmap"))
    }
}

impl Extend<i64> for SparseLongBitmap {
    fn extend<I: IntoIterator<Item = i64>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl FromIterator<i64> for SparseLongBitmap {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let mut bitmap = Self::new();
        bitmap.extend(iter);
        bitmap
    }
}

/// Ascending iterator over the values of one bucket
pub struct BucketIter<'a> {
    key: i64,
    words: &'a [u64; BUCKET_WORDS],
    word_idx: usize,
    current: u64,
}

impl BucketIter<'_> {
    /// High-order key shared by every value of this bucket
    pub fn key(&self) -> i64 {
        self.key
    }
}

impl Iterator for BucketIter<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some(join(self.key, self.word_idx * 64 + bit));
            }
            self.word_idx += 1;
            if self.word_idx >= BUCKET_WORDS {
                return None;
            }
            self.current = self.words[self.word_idx];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_bitmap_basic() {
        let mut bitmap = SparseLongBitmap::new();
        assert!(bitmap.insert(1));
        assert!(bitmap.insert(255));
        assert!(bitmap.insert(256));
        assert!(!bitmap.insert(1));

        assert!(bitmap.contains(1));
        assert!(bitmap.contains(255));
        assert!(bitmap.contains(256));
        assert!(!bitmap.contains(2));
        assert!(!bitmap.contains(-1));
        assert_eq!(bitmap.len(), 3);
        assert_eq!(bitmap.num_buckets(), 2);
    }

    #[test]
    fn test_bitmap_large_value() {
        let mut bitmap = SparseLongBitmap::new();
        bitmap.insert(764_301_484_974_400_394);
        assert!(bitmap.contains(764_301_484_974_400_394));
        assert!(!bitmap.contains(764_301_484_974_400_395));
    }

    #[test]
    fn test_bitmap_extremes() {
        let values = [i64::MIN, i64::MIN + 1, -257, -256, -1, 0, i64::MAX - 1, i64::MAX];
        let bitmap: SparseLongBitmap = values.iter().copied().collect();
        for v in values {
            assert!(bitmap.contains(v), "missing {}", v);
        }
        let mut all: Vec<i64> = bitmap.iter().collect();
        all.sort_unstable();
        assert_eq!(all, values.to_vec());
    }

    #[test]
    fn test_bitmap_random_completeness() {
        let mut rng = StdRng::seed_from_u64(1234);
        let mut expected = HashSet::new();
        let mut bitmap = SparseLongBitmap::new();

        while expected.len() < 327_680 {
            // mix of scattered values and dense runs
            let v = if rng.random_bool(0.5) {
                rng.random::<i64>()
            } else {
                rng.random_range(-100_000i64..100_000)
            };
            assert_eq!(bitmap.insert(v), expected.insert(v));
        }

        assert_eq!(bitmap.len(), expected.len());
        for &v in &expected {
            assert!(bitmap.contains(v));
        }

        let mut seen = HashSet::with_capacity(expected.len());
        for bucket in bitmap.buckets() {
            let values: Vec<i64> = bucket.collect();
            assert!(values.windows(2).all(|w| w[0] < w[1]));
            for v in values {
                assert!(seen.insert(v), "duplicate {}", v);
            }
        }
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_bucket_iter_key() {
        let mut bitmap = SparseLongBitmap::new();
        bitmap.insert(-3);
        let bucket = bitmap.buckets().next().unwrap();
        assert_eq!(bucket.key(), -1);
        assert_eq!(bucket.collect::<Vec<_>>(), vec![-3]);
    }

    #[test]
    fn test_bitmap_serialization() {
        let mut rng = StdRng::seed_from_u64(5);
        let bitmap: SparseLongBitmap = (0..10_000).map(|_| rng.random::<i64>() >> 20).collect();

        let mut buffer = Vec::new();
        bitmap.serialize(&mut buffer).unwrap();
        let restored = SparseLongBitmap::deserialize(&mut &buffer[..]).unwrap();
        assert_eq!(restored, bitmap);

        buffer.truncate(buffer.len() - 3);
        assert!(matches!(
            SparseLongBitmap::deserialize(&mut &buffer[..]),
            Err(Error::MalformedBuffer(_))
        ));
    }
}
