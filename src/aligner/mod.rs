//! This module contains the aligner, which lines up two independently collated
//! layouts and reports, for every byte either of them covers, what occupied it
//! on each side and whether the two differ.
//!
//! # Alignment
//!
//! Slots are paired by position, and each pair is swept from its first byte
//! with one cursor per side. Before the sweep, each side's entries are padded
//! with gap segments so that both sides cover every byte up to the larger of
//! the two reservations. Every step of the sweep emits one [`MergedUnit`] that
//! ends where the nearer of the two current segments ends, and advances every
//! side whose segment ended there.
//!
//! Two segments are considered the same if they have the same name and the
//! same type label once array lengths are removed. Sizes are not compared, so
//! resizing a fixed-size array is not on its own reported as a change.

pub mod flat;

use itertools::{EitherOrBoth, Itertools};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::{
    collator::{Slot, SlotEntry},
    constant::GAP_LABEL,
    error::{
        alignment::{Error, Result},
        container::{Locatable, Location},
    },
    layout::types::normalize_label,
    utility::U256W,
};

/// The configuration for alignment.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Config {
    /// Whether a layout with fewer slots than the other is extended with
    /// empty slots so that the two can be aligned.
    ///
    /// When this is `false`, differing slot counts are an error.
    ///
    /// Defaults to `false`.
    pub pad_missing_slots: bool,
}

impl Config {
    /// Sets the `pad_missing_slots` config parameter to `value`.
    #[must_use]
    pub fn with_pad_missing_slots(mut self, value: bool) -> Self {
        self.pad_missing_slots = value;
        self
    }
}

/// One side of a [`MergedUnit`]: either a value from a slot, or a gap covering
/// bytes that no value occupies.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSide {
    /// The full path of the value, or empty for a gap.
    pub name: String,

    /// The identifier of the value's type, or empty for a gap.
    pub type_id: String,

    /// The label of the value's type, or empty for a gap.
    pub type_label: String,

    /// The offset within the slot of the value or gap.
    pub offset: usize,

    /// The number of bytes that the value or gap covers.
    pub size: usize,
}

impl UnitSide {
    /// Constructs a gap of `size` bytes starting at `offset`.
    #[must_use]
    pub fn gap(offset: usize, size: usize) -> Self {
        Self {
            name: GAP_LABEL.to_string(),
            type_id: GAP_LABEL.to_string(),
            type_label: GAP_LABEL.to_string(),
            offset,
            size,
        }
    }

    /// Checks if this side is a gap rather than a value.
    #[must_use]
    pub fn is_gap(&self) -> bool {
        self.name == GAP_LABEL && self.type_label == GAP_LABEL
    }

    /// Gets the offset of the first byte after the value or gap.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.size
    }

    /// Checks if `self` and `other` describe the same declaration.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        same_declaration(&self.name, &self.type_label, &other.name, &other.type_label)
    }
}

impl From<&SlotEntry> for UnitSide {
    fn from(entry: &SlotEntry) -> Self {
        Self {
            name:       entry.name.clone(),
            type_id:    entry.type_id.clone(),
            type_label: entry.type_label.clone(),
            offset:     entry.offset,
            size:       entry.size,
        }
    }
}

/// A byte range within a slot, together with what covers it in each of the
/// two layouts.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedUnit {
    /// The index of the slot the range lies in.
    pub slot_index: U256W,

    /// The offset of the first byte of the range within the slot.
    pub start: usize,

    /// The offset of the first byte after the range.
    pub end: usize,

    /// What covers the range in layout A.
    pub a: UnitSide,

    /// What covers the range in layout B.
    pub b: UnitSide,

    /// Whether the two sides describe different declarations.
    pub changed: bool,
}

/// A pair of aligned slots.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedSlot {
    /// The index shared by the two slots.
    pub index: U256W,

    /// The bytes reserved in the slot in layout A.
    pub reserved_bytes_a: usize,

    /// The bytes reserved in the slot in layout B.
    pub reserved_bytes_b: usize,

    /// The bytes filled in the slot in layout A.
    pub filled_bytes_a: usize,

    /// The bytes filled in the slot in layout B.
    pub filled_bytes_b: usize,

    /// The units tiling the slot, in increasing order of offset.
    pub units: Vec<MergedUnit>,
}

impl MergedSlot {
    /// Checks if any unit in the slot differs between the two layouts.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.units.iter().any(|u| u.changed)
    }
}

/// Aligns the slots of layout A against those of layout B.
///
/// # Errors
///
/// Returns [`Err`] if the layouts have different numbers of slots and
/// `config` does not allow padding, or if the slots at some position have
/// different indices.
pub fn merge(slots_a: &[Slot], slots_b: &[Slot], config: &Config) -> Result<Vec<MergedSlot>> {
    if slots_a.len() != slots_b.len() {
        let error = Error::SlotCountMismatch {
            a: slots_a.len(),
            b: slots_b.len(),
        };
        if !config.pad_missing_slots {
            return Err(error.locate(Location::Document).into());
        }
        warn!(a = slots_a.len(), b = slots_b.len(), "padding shorter layout with empty slots");
    }

    slots_a
        .iter()
        .zip_longest(slots_b)
        .map(|pair| match pair {
            EitherOrBoth::Both(a, b) => merge_slots(a, b),
            EitherOrBoth::Left(a) => merge_slots(a, &Slot::new(a.index)),
            EitherOrBoth::Right(b) => merge_slots(&Slot::new(b.index), b),
        })
        .collect()
}

/// Iterates over every unit in `merged` that differs between the layouts.
pub fn changed_units(merged: &[MergedSlot]) -> impl Iterator<Item = &MergedUnit> {
    merged.iter().flat_map(|s| s.units.iter()).filter(|u| u.changed)
}

/// Sweeps a single pair of slots that share an index.
fn merge_slots(slot_a: &Slot, slot_b: &Slot) -> Result<MergedSlot> {
    if slot_a.index != slot_b.index {
        let error = Error::SlotIndexMismatch {
            a: slot_a.index,
            b: slot_b.index,
        };
        return Err(error.locate(Location::slot(slot_a.index)).into());
    }

    let span = slot_a.reserved_bytes.max(slot_b.reserved_bytes);
    let segments_a = segments(slot_a, span);
    let segments_b = segments(slot_b, span);

    let mut units = Vec::with_capacity(segments_a.len().max(segments_b.len()));
    let (mut index_a, mut index_b, mut cursor) = (0, 0, 0);

    while let (Some(a), Some(b)) = (segments_a.get(index_a), segments_b.get(index_b)) {
        let (end_a, end_b) = (a.end(), b.end());
        let end = end_a.min(end_b);
        let changed = !a.same_as(b);

        trace!(index = %slot_a.index, start = cursor, end, changed, "merged unit");
        units.push(MergedUnit {
            slot_index: slot_a.index,
            start: cursor,
            end,
            a: a.clone(),
            b: b.clone(),
            changed,
        });
        cursor = end;

        if end_a <= end_b {
            index_a += 1;
        }
        if end_b <= end_a {
            index_b += 1;
        }
    }

    debug!(index = %slot_a.index, units = units.len(), "aligned slot pair");

    Ok(MergedSlot {
        index: slot_a.index,
        reserved_bytes_a: slot_a.reserved_bytes,
        reserved_bytes_b: slot_b.reserved_bytes,
        filled_bytes_a: slot_a.filled_bytes,
        filled_bytes_b: slot_b.filled_bytes,
        units,
    })
}

/// Gets the entries of `slot` padded with gaps, so that together they cover
/// every byte from zero to `span`.
fn segments(slot: &Slot, span: usize) -> Vec<UnitSide> {
    let mut segments = Vec::with_capacity(slot.entries.len() * 2 + 1);
    let mut cursor = 0;

    for entry in &slot.entries {
        if entry.offset > cursor {
            segments.push(UnitSide::gap(cursor, entry.offset - cursor));
        }
        segments.push(UnitSide::from(entry));
        cursor = cursor.max(entry.end());
    }

    if span > cursor {
        segments.push(UnitSide::gap(cursor, span - cursor));
    }

    segments
}

/// Compares two declarations by name and by array-length-normalized type
/// label.
pub(crate) fn same_declaration(name_a: &str, label_a: &str, name_b: &str, label_b: &str) -> bool {
    name_a == name_b && normalize_label(label_a) == normalize_label(label_b)
}

#[cfg(test)]
mod test {
    use crate::{
        aligner::{changed_units, merge, Config, MergedSlot},
        collator::{collate, Slot, SlotEntry},
        error::alignment::Error,
        layout::{Encoding, StorageElement, StorageLayout, TypeDescriptor, TypeTable},
        utility::U256W,
    };

    fn types() -> TypeTable {
        TypeTable::new()
            .with("t_uint8", TypeDescriptor::value("uint8", 1))
            .with("t_uint128", TypeDescriptor::value("uint128", 16))
            .with("t_uint256", TypeDescriptor::value("uint256", 32))
            .with(
                "t_array(t_uint8)2_storage",
                TypeDescriptor::fixed_array("uint8[2]", 32, "t_uint8"),
            )
            .with(
                "t_array(t_uint8)5_storage",
                TypeDescriptor::fixed_array("uint8[5]", 32, "t_uint8"),
            )
    }

    fn slots(storage: &[(&str, &str)]) -> anyhow::Result<Vec<Slot>> {
        let storage = storage
            .iter()
            .map(|(label, typ)| StorageElement::new(*label, *typ))
            .collect();
        Ok(collate(&StorageLayout::new(storage, types()))?)
    }

    fn assert_tiles(slot: &MergedSlot) {
        let mut cursor = 0;
        for unit in &slot.units {
            assert_eq!(unit.start, cursor);
            assert!(unit.end >= unit.start);
            cursor = unit.end;
        }
        assert_eq!(cursor, slot.reserved_bytes_a.max(slot.reserved_bytes_b));
    }

    #[test]
    fn identical_layouts_have_no_changes() -> anyhow::Result<()> {
        let a = slots(&[("a", "t_uint128"), ("b", "t_uint128")])?;
        let merged = merge(&a, &a, &Config::default())?;

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].units.len(), 2);
        assert!(!merged[0].has_changes());
        assert_tiles(&merged[0]);

        Ok(())
    }

    #[test]
    fn renames_are_changes() -> anyhow::Result<()> {
        let a = slots(&[("a", "t_uint256")])?;
        let b = slots(&[("aa", "t_uint256")])?;
        let merged = merge(&a, &b, &Config::default())?;

        assert_eq!(merged[0].units.len(), 1);
        let unit = &merged[0].units[0];
        assert!(unit.changed);
        assert_eq!((unit.start, unit.end), (0, 32));
        assert_eq!(unit.a.name, "a");
        assert_eq!(unit.b.name, "aa");

        Ok(())
    }

    #[test]
    fn overlapping_ranges_are_split_at_every_boundary() -> anyhow::Result<()> {
        let a = slots(&[("a", "t_uint128"), ("b", "t_uint128")])?;
        let b = slots(&[("a", "t_uint8"), ("c", "t_uint128")])?;
        let merged = merge(&a, &b, &Config::default())?;
        let slot = &merged[0];

        let ranges: Vec<_> = slot.units.iter().map(|u| (u.start, u.end, u.changed)).collect();
        assert_eq!(ranges, vec![
            (0, 1, true),
            (1, 16, true),
            (16, 17, true),
            (17, 32, true),
        ]);
        assert_eq!(slot.units[0].a.name, "a");
        assert_eq!(slot.units[0].b.name, "a");
        assert_eq!(slot.units[3].b.name, "");
        assert_tiles(slot);

        Ok(())
    }

    #[test]
    fn shared_boundaries_advance_both_sides_together() -> anyhow::Result<()> {
        let a = slots(&[("a", "t_uint128"), ("b", "t_uint128")])?;
        let b = slots(&[("x", "t_uint128"), ("b", "t_uint128")])?;
        let merged = merge(&a, &b, &Config::default())?;

        assert_eq!(merged[0].units.len(), 2);
        assert!(merged[0].units[0].changed);
        assert!(!merged[0].units[1].changed);

        Ok(())
    }

    #[test]
    fn resized_arrays_are_not_changes() -> anyhow::Result<()> {
        let a = slots(&[("xs", "t_array(t_uint8)2_storage")])?;
        let b = slots(&[("xs", "t_array(t_uint8)5_storage")])?;
        let merged = merge(&a, &b, &Config::default())?;

        // Elements two to four are new, and face the padding of the shorter array.
        let changed: Vec<_> = changed_units(&merged).map(|u| u.b.name.as_str()).collect();
        assert_eq!(changed, vec!["xs[2]", "xs[3]", "xs[4]"]);
        assert_tiles(&merged[0]);

        Ok(())
    }

    #[test]
    fn sizes_alone_are_not_compared() -> anyhow::Result<()> {
        let entry = |label: &str, size: usize| SlotEntry {
            name: "packed".into(),
            type_id: format!("t_array(t_uint8){size}_storage"),
            type_label: label.into(),
            encoding: Encoding::Inplace,
            offset: 0,
            size,
        };
        let mut slot_a = Slot::new(0usize);
        slot_a.entries.push(entry("uint8[2]", 2));
        slot_a.reserved_bytes = 32;
        let mut slot_b = Slot::new(0usize);
        slot_b.entries.push(entry("uint8[5]", 5));
        slot_b.reserved_bytes = 32;

        let merged = merge(&[slot_a], &[slot_b], &Config::default())?;
        let first = &merged[0].units[0];
        assert_eq!((first.start, first.end), (0, 2));
        assert!(!first.changed);

        Ok(())
    }

    #[test]
    fn differing_slot_counts_are_rejected() -> anyhow::Result<()> {
        let a = slots(&[("a", "t_uint256")])?;
        let b = slots(&[("a", "t_uint256"), ("b", "t_uint256")])?;
        let errors = merge(&a, &b, &Config::default()).expect_err("Slot counts differ");

        assert_eq!(errors.payloads()[0].payload, Error::SlotCountMismatch { a: 1, b: 2 });

        Ok(())
    }

    #[test]
    fn differing_slot_counts_can_be_padded() -> anyhow::Result<()> {
        let a = slots(&[("a", "t_uint256")])?;
        let b = slots(&[("a", "t_uint256"), ("b", "t_uint256")])?;
        let merged = merge(&a, &b, &Config::default().with_pad_missing_slots(true))?;

        assert_eq!(merged.len(), 2);
        assert!(!merged[0].has_changes());
        assert_eq!(merged[1].index, U256W::from(1usize));
        assert_eq!(merged[1].reserved_bytes_a, 0);
        assert!(merged[1].units[0].a.is_gap());
        assert!(merged[1].units[0].changed);
        assert_tiles(&merged[1]);

        Ok(())
    }

    #[test]
    fn misaligned_slot_indices_are_rejected() {
        let a = vec![Slot::new(0usize)];
        let b = vec![Slot::new(1usize)];
        let errors = merge(&a, &b, &Config::default()).expect_err("Indices differ");

        assert_eq!(errors.payloads()[0].payload, Error::SlotIndexMismatch {
            a: U256W::from(0usize),
            b: U256W::from(1usize),
        });
    }
}
