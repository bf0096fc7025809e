//! Wire format for transaction id sets (vacuum path)
//!
//! ```text
//! [0]      null flag (always 0)
//! [1..9]   count (u64, little-endian)
//! [9..]    count * u64 xids, no defined order
//! ```

use byteorder::{ByteOrder, LittleEndian};

use super::sparse_bitmap::SparseLongBitmap;
use super::tuple_codec::NULL_FLAG_PRESENT;
use crate::error::{Error, Result};

pub const XID_SET_HEADER_LEN: usize = 1 + 8;

const XID_LEN: usize = 8;

/// Encode any sequence of xids
///
/// Duplicates are written as given; callers dedup through a set first.
pub fn encode_xid_set<I: IntoIterator<Item = u64>>(xids: I) -> Vec<u8> {
    let iter = xids.into_iter();
    let mut data = Vec::with_capacity(XID_SET_HEADER_LEN + iter.size_hint().0 * XID_LEN);
    data.resize(XID_SET_HEADER_LEN, 0);
    data[0] = NULL_FLAG_PRESENT;

    let mut count = 0u64;
    let mut word = [0u8; XID_LEN];
    for xid in iter {
        LittleEndian::write_u64(&mut word, xid);
        data.extend_from_slice(&word);
        count += 1;
    }
    LittleEndian::write_u64(&mut data[1..XID_SET_HEADER_LEN], count);
    data
}

/// Encode the distinct members of a bitmap
pub fn encode_bitmap_xids(bitmap: &SparseLongBitmap) -> Vec<u8> {
    encode_xid_set(bitmap.iter().map(|v| v as u64))
}

/// Decode an xid set, validating the flag byte and exact length
pub fn decode_xid_set(data: &[u8]) -> Result<Vec<u64>> {
    if data.len() < XID_SET_HEADER_LEN {
        return Err(Error::MalformedBuffer(format!(
            "xid set of {} bytes is shorter than its header",
            data.len()
        )));
    }
    if data[0] != NULL_FLAG_PRESENT {
        return Err(Error::MalformedBuffer(format!(
            "unexpected null flag {:#04x}",
            data[0]
        )));
    }

    let count = LittleEndian::read_u64(&data[1..XID_SET_HEADER_LEN]);
    let payload = &data[XID_SET_HEADER_LEN..];
    let expected = usize::try_from(count)
        .ok()
        .and_then(|c| c.checked_mul(XID_LEN));
    if expected != Some(payload.len()) {
        return Err(Error::MalformedBuffer(format!(
            "xid set declares {} values but carries {} payload bytes",
            count,
            payload.len()
        )));
    }

    Ok(payload
        .chunks_exact(XID_LEN)
        .map(LittleEndian::read_u64)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xid_set_layout() {
        let bytes = encode_xid_set([7u64, 3, u64::MAX]);
        assert_eq!(bytes.len(), 9 + 24);
        assert_eq!(bytes[0], 0);
        assert_eq!(LittleEndian::read_u64(&bytes[1..9]), 3);
        assert_eq!(LittleEndian::read_u64(&bytes[9..17]), 7);
        assert_eq!(decode_xid_set(&bytes).unwrap(), vec![7, 3, u64::MAX]);
    }

    #[test]
    fn test_empty_xid_set() {
        let bytes = encode_xid_set(std::iter::empty());
        assert_eq!(bytes, vec![0u8; 9]);
        assert!(decode_xid_set(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_bitmap_xids_are_distinct() {
        let bitmap: SparseLongBitmap = [5i64, 5, 900, 1 << 40].into_iter().collect();
        let mut xids = decode_xid_set(&encode_bitmap_xids(&bitmap)).unwrap();
        xids.sort_unstable();
        assert_eq!(xids, vec![5, 900, 1 << 40]);
    }

    #[test]
    fn test_malformed_xid_set() {
        let mut bytes = encode_xid_set([1u64, 2]);
        bytes.pop();
        assert!(matches!(decode_xid_set(&bytes), Err(Error::MalformedBuffer(_))));
        assert!(matches!(decode_xid_set(&[0u8; 4]), Err(Error::MalformedBuffer(_))));

        let mut bytes = encode_xid_set([1u64]);
        bytes[0] = 0xff;
        assert!(matches!(decode_xid_set(&bytes), Err(Error::MalformedBuffer(_))));
    }
}
