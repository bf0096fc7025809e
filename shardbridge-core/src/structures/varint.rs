//! LEB128 variable-length integers
//!
//! A `u64` takes at most 10 bytes. The 10th byte may only carry the single
//! remaining high bit; anything wider is rejected instead of truncated.

use byteorder::ReadBytesExt;
use std::io::{self, Read, Write};

/// Longest encoding of a `u64`
pub const MAX_VINT_LEN: usize = 10;

/// Encode `value` into `out`, returning the number of bytes used
#[inline]
pub fn encode_vint(mut value: u64, out: &mut [u8; MAX_VINT_LEN]) -> usize {
    let mut n = 0;
    while value >= 0x80 {
        out[n] = (value as u8) | 0x80;
        value >>= 7;
        n += 1;
    }
    out[n] = value as u8;
    n + 1
}

/// Append the encoding of `value` to a byte vector
#[inline]
pub fn push_vint(buf: &mut Vec<u8>, value: u64) {
    let mut scratch = [0u8; MAX_VINT_LEN];
    let n = encode_vint(value, &mut scratch);
    buf.extend_from_slice(&scratch[..n]);
}

#[inline]
pub fn write_vint<W: Write + ?Sized>(writer: &mut W, value: u64) -> io::Result<()> {
    let mut scratch = [0u8; MAX_VINT_LEN];
    let n = encode_vint(value, &mut scratch);
    writer.write_all(&scratch[..n])
}

#[inline]
pub fn read_vint<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut result = 0u64;
    for i in 0..MAX_VINT_LEN - 1 {
        let byte = reader.read_u8()?;
        result |= ((byte & 0x7F) as u64) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }

    // only bit 63 is left for the last byte
    let last = reader.read_u8()?;
    if last > 1 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "varint overflows u64",
        ));
    }
    Ok(result | (last as u64) << 63)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vint_boundaries() {
        for value in [0u64, 127, 128, 16_383, 16_384, u32::MAX as u64, u64::MAX] {
            let mut buf = Vec::new();
            write_vint(&mut buf, value).unwrap();
            assert_eq!(read_vint(&mut &buf[..]).unwrap(), value);

            let mut pushed = Vec::new();
            push_vint(&mut pushed, value);
            assert_eq!(pushed, buf);
        }

        let mut buf = Vec::new();
        push_vint(&mut buf, 127);
        assert_eq!(buf.len(), 1);
        buf.clear();
        push_vint(&mut buf, u64::MAX);
        assert_eq!(buf.len(), MAX_VINT_LEN);
    }

    #[test]
    fn test_vint_truncated() {
        let buf = [0x80u8, 0x80];
        assert!(read_vint(&mut &buf[..]).is_err());
    }

    #[test]
    fn test_vint_rejects_overflow() {
        // nine continuation bytes then a last byte carrying two bits
        let mut buf = vec![0xFFu8; 9];
        buf.push(0x03);
        let err = read_vint(&mut &buf[..]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        // an 11th byte is never valid
        let mut long = vec![0x80u8; 10];
        long.push(0x00);
        assert_eq!(
            read_vint(&mut &long[..]).unwrap_err().kind(),
            io::ErrorKind::InvalidData
        );

        let mut max = vec![0xFFu8; 9];
        max.push(0x01);
        assert_eq!(read_vint(&mut &max[..]).unwrap(), u64::MAX);
    }
}
