//! Physical row addresses

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Physical address of a stored row: heap page and slot within the page.
///
/// Ordered by `(blockno, offno)`, which is heap-scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemPointer {
    pub blockno: u32,
    pub offno: u16,
}

impl ItemPointer {
    pub const fn new(blockno: u32, offno: u16) -> Self {
        Self { blockno, offno }
    }

    /// Parse the `"<blockno>-<offno>"` form used as the search document id
    pub fn parse(id: &str) -> Result<Self> {
        let invalid = || Error::InvalidItemPointer(id.to_string());

        let (blockno, offno) = id.split_once('-').ok_or_else(invalid)?;
        if blockno.is_empty()
            || offno.is_empty()
            || !blockno.bytes().all(|b| b.is_ascii_digit())
            || !offno.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        Ok(Self {
            blockno: blockno.parse().map_err(|_| invalid())?,
            offno: offno.parse().map_err(|_| invalid())?,
        })
    }

    /// Sort key packed into one integer
    #[inline]
    pub const fn sort_key(&self) -> u64 {
        ((self.blockno as u64) << 16) | self.offno as u64
    }
}

impl FromStr for ItemPointer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ItemPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.blockno, self.offno)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(ItemPointer::parse("0-1").unwrap(), ItemPointer::new(0, 1));
        assert_eq!(
            "4294934527-65535".parse::<ItemPointer>().unwrap(),
            ItemPointer::new(4_294_934_527, 65_535)
        );
        assert_eq!(ItemPointer::new(12, 4).to_string(), "12-4");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for id in ["", "12", "-4", "12-", "12-x", "+1-2", "1-65536", "1-2-3", " 1-2"] {
            assert!(
                matches!(ItemPointer::parse(id), Err(Error::InvalidItemPointer(_))),
                "accepted {:?}",
                id
            );
        }
    }

    #[test]
    fn test_ordering_matches_sort_key() {
        let a = ItemPointer::new(1, 65_535);
        let b = ItemPointer::new(2, 0);
        assert!(a < b);
        assert!(a.sort_key() < b.sort_key());
    }
}
