//! Packed (location, score) tuple buffers
//!
//! Search results travel back to the row store as one flat buffer so the
//! consumer can walk them in heap order without parsing per-hit objects.
//!
//! ## Layout (little-endian)
//!
//! ```text
//! [0]        null flag (always 0 for a present response)
//! [1..9]     tuple count (u64)
//! [9..13]    max score (f32), only when scores are present
//! [header..] count * stride bytes:
//!            [0..4]  blockno + 32768 (u32)
//!            [4..6]  offno (u16)
//!            [6..10] score (f32), only when scores are present
//! ```
//!
//! The layout carries no version tag and no scores flag. The reader has to
//! know whether it asked for scores, because `9 + 6n` and `13 + 10m` collide
//! for some counts.

use byteorder::{ByteOrder, LittleEndian};

use super::item_pointer::ItemPointer;
use super::tuple_sort::{is_sorted_tuples, sort_tuples};
use crate::error::{Error, Result};

/// Added to every blockno on encode so an encoded value of 0 never occurs
pub const BLOCKNO_BIAS: u32 = 32_768;

/// Value of the leading flag byte for a present (non-null) response
pub const NULL_FLAG_PRESENT: u8 = 0;

/// Header length without scores: flag + count
pub const HEADER_LEN: usize = 1 + 8;

/// Header length with scores: flag + count + max score
pub const SCORED_HEADER_LEN: usize = HEADER_LEN + 4;

/// Tuple stride without scores: blockno + offno
pub const TUPLE_STRIDE: usize = 4 + 2;

/// Tuple stride with scores: blockno + offno + score
pub const SCORED_TUPLE_STRIDE: usize = TUPLE_STRIDE + 4;

const COUNT_OFFSET: usize = 1;
const MAX_SCORE_OFFSET: usize = HEADER_LEN;
const OFFNO_OFFSET: usize = 4;
const SCORE_OFFSET: usize = 6;

#[inline]
pub const fn header_len(has_scores: bool) -> usize {
    if has_scores {
        SCORED_HEADER_LEN
    } else {
        HEADER_LEN
    }
}

#[inline]
pub const fn tuple_stride(has_scores: bool) -> usize {
    if has_scores {
        SCORED_TUPLE_STRIDE
    } else {
        TUPLE_STRIDE
    }
}

/// One decoded tuple. `pointer` is the unbiased physical row address.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationTuple {
    pub pointer: ItemPointer,
    pub score: Option<f32>,
}

impl LocationTuple {
    pub fn new(pointer: ItemPointer, score: Option<f32>) -> Self {
        Self { pointer, score }
    }
}

/// Streaming encoder for a tuple buffer
///
/// The count and max score are patched into the header by [`finish`](Self::finish),
/// so callers do not need to know the hit count up front.
#[derive(Debug)]
pub struct TupleWriter {
    data: Vec<u8>,
    has_scores: bool,
    count: u64,
    max_score: Option<f32>,
}

impl TupleWriter {
    pub fn new(has_scores: bool) -> Self {
        Self::with_capacity(has_scores, 0)
    }

    /// Create a writer with room for `capacity` tuples
    pub fn with_capacity(has_scores: bool, capacity: usize) -> Self {
        let header = header_len(has_scores);
        let mut data = Vec::with_capacity(header + capacity * tuple_stride(has_scores));
        data.resize(header, 0);
        data[0] = NULL_FLAG_PRESENT;
        Self {
            data,
            has_scores,
            count: 0,
            max_score: None,
        }
    }

    /// Append one tuple
    ///
    /// For a scored writer a missing score is written as 0.0. For an
    /// unscored writer any score is dropped.
    pub fn push(&mut self, tuple: LocationTuple) -> Result<()> {
        let biased = tuple
            .pointer
            .blockno
            .checked_add(BLOCKNO_BIAS)
            .ok_or_else(|| {
                Error::InvalidItemPointer(format!(
                    "blockno {} exceeds the encodable range",
                    tuple.pointer.blockno
                ))
            })?;

        let start = self.data.len();
        self.data.resize(start + tuple_stride(self.has_scores), 0);
        let slot = &mut self.data[start..];
        LittleEndian::write_u32(&mut slot[0..OFFNO_OFFSET], biased);
        LittleEndian::write_u16(&mut slot[OFFNO_OFFSET..SCORE_OFFSET], tuple.pointer.offno);

        if self.has_scores {
            let score = tuple.score.unwrap_or(0.0);
            LittleEndian::write_f32(&mut slot[SCORE_OFFSET..SCORED_TUPLE_STRIDE], score);
            self.max_score = Some(match self.max_score {
                Some(max) => max.max(score),
                None => score,
            });
        }

        self.count += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Patch the header and hand back the finished buffer
    pub fn finish(mut self) -> TupleBuffer {
        LittleEndian::write_u64(
            &mut self.data[COUNT_OFFSET..COUNT_OFFSET + 8],
            self.count,
        );
        if self.has_scores {
            LittleEndian::write_f32(
                &mut self.data[MAX_SCORE_OFFSET..SCORED_HEADER_LEN],
                self.max_score.unwrap_or(0.0),
            );
        }
        TupleBuffer {
            data: self.data,
            count: self.count as usize,
            has_scores: self.has_scores,
        }
    }
}

/// Encode a slice of tuples into wire bytes
pub fn encode_tuples(tuples: &[LocationTuple], has_scores: bool) -> Result<Vec<u8>> {
    let mut writer = TupleWriter::with_capacity(has_scores, tuples.len());
    for &tuple in tuples {
        writer.push(tuple)?;
    }
    Ok(writer.finish().into_bytes())
}

/// Decode wire bytes into tuples. Either the whole buffer decodes or nothing does.
pub fn decode_tuples(data: &[u8], has_scores: bool) -> Result<Vec<LocationTuple>> {
    let buffer = TupleBuffer::from_bytes(data.to_vec(), has_scores)?;
    Ok(buffer.iter().collect())
}

/// A validated tuple buffer
///
/// Construction checks the flag byte and that the length is exactly
/// `header + count * stride`. All accessors work on byte offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleBuffer {
    data: Vec<u8>,
    count: usize,
    has_scores: bool,
}

impl TupleBuffer {
    pub fn from_bytes(data: Vec<u8>, has_scores: bool) -> Result<Self> {
        let header = header_len(has_scores);
        if data.len() < header {
            return Err(Error::MalformedBuffer(format!(
                "tuple buffer of {} bytes is shorter than its {} byte header",
                data.len(),
                header
            )));
        }
        if data[0] != NULL_FLAG_PRESENT {
            return Err(Error::MalformedBuffer(format!(
                "unexpected null flag {:#04x}",
                data[0]
            )));
        }

        let count = LittleEndian::read_u64(&data[COUNT_OFFSET..COUNT_OFFSET + 8]);
        let expected = usize::try_from(count)
            .ok()
            .and_then(|c| c.checked_mul(tuple_stride(has_scores)))
            .and_then(|payload| payload.checked_add(header));

        if expected != Some(data.len()) {
            return Err(Error::MalformedBuffer(format!(
                "tuple buffer has {} bytes but header declares {} tuples of {} bytes",
                data.len(),
                count,
                tuple_stride(has_scores)
            )));
        }

        // 0..BLOCKNO_BIAS is never produced by an encoder
        let stride = tuple_stride(has_scores);
        if let Some(pos) = data[header..]
            .chunks_exact(stride)
            .position(|slot| LittleEndian::read_u32(&slot[0..OFFNO_OFFSET]) < BLOCKNO_BIAS)
        {
            return Err(Error::MalformedBuffer(format!(
                "tuple {} has an unbiased blockno",
                pos
            )));
        }

        Ok(Self {
            data,
            count: count as usize,
            has_scores,
        })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn has_scores(&self) -> bool {
        self.has_scores
    }

    pub fn stride(&self) -> usize {
        tuple_stride(self.has_scores)
    }

    /// Offset of the first tuple
    pub fn payload_offset(&self) -> usize {
        header_len(self.has_scores)
    }

    pub fn max_score(&self) -> Option<f32> {
        self.has_scores
            .then(|| LittleEndian::read_f32(&self.data[MAX_SCORE_OFFSET..SCORED_HEADER_LEN]))
    }

    pub fn get(&self, idx: usize) -> Option<LocationTuple> {
        if idx >= self.count {
            return None;
        }
        let off = self.payload_offset() + idx * self.stride();
        let slot = &self.data[off..off + self.stride()];
        let blockno = LittleEndian::read_u32(&slot[0..OFFNO_OFFSET]) - BLOCKNO_BIAS;
        let offno = LittleEndian::read_u16(&slot[OFFNO_OFFSET..SCORE_OFFSET]);
        let score = self
            .has_scores
            .then(|| LittleEndian::read_f32(&slot[SCORE_OFFSET..SCORED_TUPLE_STRIDE]));
        Some(LocationTuple {
            pointer: ItemPointer::new(blockno, offno),
            score,
        })
    }

    /// Raw (still biased) blockno of tuple `idx`
    pub fn encoded_blockno(&self, idx: usize) -> Option<u32> {
        (idx < self.count).then(|| {
            let off = self.payload_offset() + idx * self.stride();
            LittleEndian::read_u32(&self.data[off..off + OFFNO_OFFSET])
        })
    }

    pub fn iter(&self) -> TupleIter<'_> {
        TupleIter {
            buffer: self,
            next: 0,
        }
    }

    /// Sort tuples in place by `(blockno, offno)`; header bytes are untouched
    pub fn sort(&mut self) {
        let start = self.payload_offset();
        let stride = self.stride();
        if self.count > 100_000 {
            log::debug!("Sorting {} tuples in place", self.count);
        }
        sort_tuples(&mut self.data[start..], stride);
    }

    pub fn is_sorted(&self) -> bool {
        is_sorted_tuples(&self.data[self.payload_offset()..], self.stride())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Iterator over the tuples of a [`TupleBuffer`]
pub struct TupleIter<'a> {
    buffer: &'a TupleBuffer,
    next: usize,
}

impl Iterator for TupleIter<'_> {
    type Item = LocationTuple;

    fn next(&mut self) -> Option<Self::Item> {
        let tuple = self.buffer.get(self.next)?;
        self.next += 1;
        Some(tuple)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.buffer.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TupleIter<'_> {}
