//! Compact set of string identifiers
//!
//! Document-id sets on the vacuum path routinely hold hundreds of thousands of
//! short strings. Instead of one heap allocation per `String`, members live
//! back to back in a single string arena:
//!
//! - `arena`: every member ever inserted, concatenated into one `String`
//! - `slots`: `(offset, len)` per member, tombstoned on removal
//! - `table`: `hashbrown::HashTable` of slot indices, hashed with Fx
//!
//! Removal tombstones the slot and leaves its bytes behind; [`compact`]
//! reclaims them, and runs automatically once dead bytes dominate.
//! At most one `null` member is tracked with a flag.
//!
//! ## Serialized form
//!
//! ```text
//! [0]      flags: bit 0 = contains null
//! [1..9]   number of non-null members (u64, little-endian)
//! then per member: vint byte length, UTF-8 bytes
//! ```
//!
//! [`compact`]: CompactIdentifierSet::compact

use byteorder::{LittleEndian, ReadBytesExt};
use hashbrown::HashTable;
use hashbrown::hash_table::Entry;
use rustc_hash::FxBuildHasher;
use std::fmt;
use std::hash::BuildHasher;
use std::io::{self, Read, Write};

use super::varint::{push_vint, read_vint};
use crate::error::{Error, Result};

const FLAG_HAS_NULL: u8 = 0b1;

/// Removed slots are reclaimed once they exceed this many and outnumber live ones
const COMPACT_MIN_DEAD: usize = 1024;

const TOMBSTONE: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
struct Slot {
    offset: usize,
    len: u32,
}

impl Slot {
    #[inline]
    fn is_live(&self) -> bool {
        self.len != TOMBSTONE
    }
}

#[inline]
fn member<'a>(arena: &'a str, slots: &[Slot], idx: u32) -> &'a str {
    // slots always start and end on member boundaries
    let slot = slots[idx as usize];
    &arena[slot.offset..slot.offset + slot.len as usize]
}

/// Deduplicated set of string identifiers with at most one `null` member
#[derive(Clone, Default)]
pub struct CompactIdentifierSet {
    arena: String,
    slots: Vec<Slot>,
    table: HashTable<u32>,
    hasher: FxBuildHasher,
    has_null: bool,
    dead: usize,
}

impl CompactIdentifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size for `members` identifiers of about `avg_len` bytes each
    pub fn with_capacity(members: usize, avg_len: usize) -> Self {
        Self {
            arena: String::with_capacity(members * avg_len),
            slots: Vec::with_capacity(members),
            table: HashTable::with_capacity(members),
            ..Self::default()
        }
    }

    /// Insert a member (`None` is the null member). Returns true if it was new.
    pub fn insert(&mut self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            let fresh = !self.has_null;
            self.has_null = true;
            return fresh;
        };

        let hash = self.hasher.hash_one(value);
        let Self {
            arena,
            slots,
            table,
            hasher,
            ..
        } = self;

        match table.entry(
            hash,
            |&idx| member(arena, slots, idx) == value,
            |&idx| hasher.hash_one(member(arena, slots, idx)),
        ) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                let idx = slots.len() as u32;
                slots.push(Slot {
                    offset: arena.len(),
                    len: value.len() as u32,
                });
                arena.push_str(value);
                vacant.insert(idx);
                true
            }
        }
    }

    /// Remove a member. Returns true if it was present.
    pub fn remove(&mut self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            let present = self.has_null;
            self.has_null = false;
            return present;
        };

        let hash = self.hasher.hash_one(value);
        let (arena, slots) = (&self.arena, &mut self.slots);
        let removed = match self
            .table
            .find_entry(hash, |&idx| member(arena, slots, idx) == value)
        {
            Ok(entry) => {
                let (idx, _) = entry.remove();
                slots[idx as usize].len = TOMBSTONE;
                true
            }
            Err(_) => false,
        };

        if removed {
            self.dead += 1;
            if self.dead >= COMPACT_MIN_DEAD && self.dead > self.table.len() {
                self.compact();
            }
        }
        removed
    }

    pub fn contains(&self, value: Option<&str>) -> bool {
        match value {
            None => self.has_null,
            Some(value) => {
                let hash = self.hasher.hash_one(value);
                self.table
                    .find(hash, |&idx| member(&self.arena, &self.slots, idx) == value)
                    .is_some()
            }
        }
    }

    pub fn contains_null(&self) -> bool {
        self.has_null
    }

    /// Number of members, counting the null member
    pub fn len(&self) -> usize {
        self.table.len() + self.has_null as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-null members in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.slots
            .iter()
            .filter(|slot| slot.is_live())
            .map(|slot| &self.arena[slot.offset..slot.offset + slot.len as usize])
    }

    /// Drop tombstoned slots and their arena bytes
    pub fn compact(&mut self) {
        if self.dead == 0 {
            return;
        }
        let live = self.table.len();
        let mut arena = String::with_capacity(self.arena.len());
        let mut slots = Vec::with_capacity(live);
        for slot in self.slots.iter().filter(|slot| slot.is_live()) {
            slots.push(Slot {
                offset: arena.len(),
                len: slot.len,
            });
            arena.push_str(&self.arena[slot.offset..slot.offset + slot.len as usize]);
        }

        let mut table = HashTable::with_capacity(live);
        for idx in 0..slots.len() as u32 {
            let hash = self.hasher.hash_one(member(&arena, &slots, idx));
            table.insert_unique(hash, idx, |&i| {
                self.hasher.hash_one(member(&arena, &slots, i))
            });
        }

        self.arena = arena;
        self.slots = slots;
        self.table = table;
        self.dead = 0;
    }

    /// Approximate heap footprint in bytes
    pub fn size_bytes(&self) -> usize {
        self.arena.capacity()
            + self.slots.capacity() * std::mem::size_of::<Slot>()
            + self.table.capacity() * (std::mem::size_of::<u32>() + 1)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.serialize())
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(9 + self.arena.len() + self.table.len() * 2);
        data.push(if self.has_null { FLAG_HAS_NULL } else { 0 });
        data.extend_from_slice(&(self.table.len() as u64).to_le_bytes());
        for value in self.iter() {
            push_vint(&mut data, value.len() as u64);
            data.extend_from_slice(value.as_bytes());
        }
        data
    }

    /// Rebuild a set from [`serialize`](Self::serialize) output
    ///
    /// Rejects unknown flags, invalid UTF-8, duplicate members and trailing bytes.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let mut reader = data;
        let set = Self::read_from(&mut reader)?;
        if !reader.is_empty() {
            return Err(Error::MalformedBuffer(format!(
                "{} trailing bytes after identifier set",
                reader.len()
            )));
        }
        Ok(set)
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let decode = |e| Error::from_decode(e, "identifier set");

        let flags = reader.read_u8().map_err(decode)?;
        if flags & !FLAG_HAS_NULL != 0 {
            return Err(Error::MalformedBuffer(format!(
                "unknown identifier set flags {:#04x}",
                flags
            )));
        }
        let count = reader.read_u64::<LittleEndian>().map_err(decode)?;

        // count comes off the wire, so cap the up-front allocation
        let mut set = Self::with_capacity(count.min(1 << 20) as usize, 16);
        set.has_null = flags & FLAG_HAS_NULL != 0;

        let mut buf = Vec::new();
        for _ in 0..count {
            let len = read_vint(reader).map_err(decode)?;
            if len >= TOMBSTONE as u64 {
                return Err(Error::MalformedBuffer(format!(
                    "identifier length {} out of range",
                    len
                )));
            }
            // grow with the bytes actually present, not the claimed length
            buf.clear();
            reader
                .by_ref()
                .take(len)
                .read_to_end(&mut buf)
                .map_err(decode)?;
            if buf.len() as u64 != len {
                return Err(Error::MalformedBuffer(format!(
                    "identifier truncated: {} of {} bytes",
                    buf.len(),
                    len
                )));
            }
            let value = std::str::from_utf8(&buf).map_err(|e| {
                Error::MalformedBuffer(format!("identifier is not UTF-8: {}", e))
            })?;
            if !set.insert(Some(value)) {
                return Err(Error::MalformedBuffer(format!(
                    "duplicate identifier {:?}",
                    value
                )));
            }
        }
        Ok(set)
    }
}

impl PartialEq for CompactIdentifierSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.has_null == other.has_null
            && self.iter().all(|value| other.contains(Some(value)))
    }
}

impl Eq for CompactIdentifierSet {}

impl fmt::Debug for CompactIdentifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        if self.has_null {
            set.entry(&Option::<&str>::None);
        }
        set.entries(self.iter().map(Some)).finish()
    }
}

impl<'a> Extend<Option<&'a str>> for CompactIdentifierSet {
    fn extend<I: IntoIterator<Item = Option<&'a str>>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a> FromIterator<Option<&'a str>> for CompactIdentifierSet {
    fn from_iter<I: IntoIterator<Item = Option<&'a str>>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
