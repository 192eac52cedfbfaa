//! This module contains the slot-structured representation of a storage
//! layout that collation produces.

use serde::{Deserialize, Serialize};

use crate::{
    constant::SLOT_SIZE_BYTES,
    layout::{Encoding, TypeDescriptor},
    utility::U256W,
};

/// A single 32-byte storage slot and the values packed into it.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// The index of the slot in storage.
    pub index: U256W,

    /// The number of bytes of the slot that are claimed, including
    /// reservations that hold no content and the padding that closes out a
    /// struct or fixed-size array.
    pub reserved_bytes: usize,

    /// The number of bytes of the slot that hold content.
    pub filled_bytes: usize,

    /// The values in the slot, in increasing order of offset.
    pub entries: Vec<SlotEntry>,
}

impl Slot {
    /// Creates a new, empty slot with the provided `index`.
    pub fn new(index: impl Into<U256W>) -> Self {
        Self {
            index:          index.into(),
            reserved_bytes: 0,
            filled_bytes:   0,
            entries:        Vec::new(),
        }
    }

    /// Gets the number of unclaimed bytes remaining in the slot.
    #[must_use]
    pub fn remaining_bytes(&self) -> usize {
        SLOT_SIZE_BYTES.saturating_sub(self.reserved_bytes)
    }

    /// Checks if nothing has claimed any part of the slot yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reserved_bytes == 0
    }

    /// Places a value named `name` of type `typ` (identified by `type_id`) at
    /// the first unclaimed byte of the slot.
    pub(crate) fn place(&mut self, name: String, type_id: &str, typ: &TypeDescriptor) {
        let size = typ.size_bytes();
        self.entries.push(SlotEntry {
            name,
            type_id: type_id.to_string(),
            type_label: typ.label.clone(),
            encoding: typ.encoding,
            offset: self.reserved_bytes,
            size,
        });
        self.reserved_bytes += size;
        self.filled_bytes += typ.filled_bytes();
    }

    /// Claims the remainder of the slot so that nothing else can be packed
    /// into it.
    pub(crate) fn seal(&mut self) {
        self.reserved_bytes = SLOT_SIZE_BYTES;
    }

    /// Gets the state of every byte in the slot, indexed by offset.
    ///
    /// Bytes covered by a mapping's reservation or by the padding after a
    /// composite are [`ByteState::Reserved`], bytes holding a value are
    /// [`ByteState::Filled`], and the rest are [`ByteState::Untouched`].
    #[must_use]
    pub fn occupancy(&self) -> [ByteState; SLOT_SIZE_BYTES] {
        let mut states = [ByteState::Untouched; SLOT_SIZE_BYTES];
        let reserved = self.reserved_bytes.min(SLOT_SIZE_BYTES);
        states[..reserved].fill(ByteState::Reserved);

        for entry in self.entries.iter().filter(|e| e.encoding != Encoding::Mapping) {
            let end = entry.end().min(SLOT_SIZE_BYTES);
            let start = entry.offset.min(end);
            states[start..end].fill(ByteState::Filled);
        }

        states
    }
}

/// A value packed into a slot.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotEntry {
    /// The full path of the value, such as `config.limits[2]`.
    pub name: String,

    /// The identifier of the value's type in the layout's type table.
    pub type_id: String,

    /// The human-readable label of the value's type.
    pub type_label: String,

    /// How the value's type is placed in storage.
    pub encoding: Encoding,

    /// The byte offset of the value within the slot.
    pub offset: usize,

    /// The number of bytes the value occupies within the slot.
    pub size: usize,
}

impl SlotEntry {
    /// Gets the offset of the first byte after the value.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.size
    }
}

/// The state of a single byte within a slot.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ByteState {
    /// No value has claimed the byte.
    Untouched,

    /// The byte is claimed but holds no content.
    Reserved,

    /// The byte holds part of a value.
    Filled,
}
