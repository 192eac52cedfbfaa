//! This module provides a coarser view of alignment that ignores slot
//! boundaries, treating each layout as a run of byte intervals across the
//! whole of storage.
//!
//! The intervals are derived from collated slots, so this view never
//! disagrees with [`super::merge`] about where a value lives.

use ethnum::U256;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    aligner::same_declaration,
    collator::Slot,
    constant::{GAP_LABEL, SLOT_SIZE_BYTES},
    error::{
        alignment::{Error, Result, Side},
        container::{Locatable, Location},
    },
    utility::U256W,
};

/// A run of bytes in storage covered by one value, or by nothing.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    /// The position of the first byte, counted from the start of slot zero.
    pub start: U256W,

    /// The position of the first byte after the interval.
    pub end: U256W,

    /// The full path of the value, or empty for a gap.
    pub label: String,

    /// The label of the value's type, or empty for a gap.
    pub type_label: String,
}

impl Interval {
    /// Constructs a gap covering the bytes from `start` up to `end`.
    #[must_use]
    pub fn gap(start: U256W, end: U256W) -> Self {
        Self {
            start,
            end,
            label: GAP_LABEL.to_string(),
            type_label: GAP_LABEL.to_string(),
        }
    }

    /// Checks if this interval is a gap rather than a value.
    #[must_use]
    pub fn is_gap(&self) -> bool {
        self.label == GAP_LABEL && self.type_label == GAP_LABEL
    }
}

/// A run of bytes in storage, together with what covers it in each of the
/// two layouts.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedInterval {
    /// The position of the first byte of the run.
    pub start: U256W,

    /// The position of the first byte after the run.
    pub end: U256W,

    /// What covers the run in layout A.
    pub a: Interval,

    /// What covers the run in layout B.
    pub b: Interval,

    /// Whether the two sides describe different declarations.
    pub changed: bool,
}

/// Flattens collated `slots` into consecutive byte intervals, with gaps
/// inserted wherever bytes between two values are not covered by either.
///
/// # Errors
///
/// Returns [`Err`] if the byte position of some slot does not fit in 256 bits.
pub fn flatten(slots: &[Slot]) -> Result<Vec<Interval>> {
    let mut intervals = Vec::new();
    let mut covered_until: Option<U256> = None;

    for slot in slots {
        let location = || Location::slot(slot.index);
        let overflow = || Error::ByteOffsetOverflow { index: slot.index };
        let base = slot_base(slot.index).locate(location())?;
        let cursor = covered_until.get_or_insert(base);

        for entry in &slot.entries {
            let start = base
                .checked_add(U256::from(entry.offset as u128))
                .ok_or_else(overflow)
                .locate(location())?;
            let end = start
                .checked_add(U256::from(entry.size as u128))
                .ok_or_else(overflow)
                .locate(location())?;

            if start > *cursor {
                intervals.push(Interval::gap((*cursor).into(), start.into()));
            }
            intervals.push(Interval {
                start:      start.into(),
                end:        end.into(),
                label:      entry.name.clone(),
                type_label: entry.type_label.clone(),
            });
            *cursor = (*cursor).max(end);
        }
    }

    Ok(intervals)
}

/// Aligns the flattened intervals of layout A against those of layout B.
///
/// The side that starts later is prefixed with a gap from where the other
/// starts, and the side that ends first is extended with a gap up to where the
/// other ends, so that every byte covered by either side appears in the result
/// and is attributed to what actually covers it on each side.
///
/// # Errors
///
/// Returns [`Err`] if either side has no intervals.
pub fn merge(intervals_a: &[Interval], intervals_b: &[Interval]) -> Result<Vec<MergedInterval>> {
    let (first_a, last_a) = bounds(intervals_a, Side::A)?;
    let (first_b, last_b) = bounds(intervals_b, Side::B)?;
    let start = first_a.start.min(first_b.start);
    let end = last_a.end.max(last_b.end);

    let padded = |intervals: &[Interval], first_start: U256W, last_end: U256W| {
        let mut padded = Vec::with_capacity(intervals.len() + 2);
        if start < first_start {
            padded.push(Interval::gap(start, first_start));
        }
        padded.extend_from_slice(intervals);
        if last_end < end {
            padded.push(Interval::gap(last_end, end));
        }
        padded
    };
    let padded_a = padded(intervals_a, first_a.start, last_a.end);
    let padded_b = padded(intervals_b, first_b.start, last_b.end);

    let mut merged = Vec::with_capacity(padded_a.len().max(padded_b.len()));
    let (mut index_a, mut index_b) = (0, 0);
    let mut cursor = start;

    while let (Some(a), Some(b)) = (padded_a.get(index_a), padded_b.get(index_b)) {
        let end = a.end.min(b.end);
        merged.push(MergedInterval {
            start: cursor,
            end,
            a: a.clone(),
            b: b.clone(),
            changed: !same_declaration(&a.label, &a.type_label, &b.label, &b.type_label),
        });
        cursor = end;

        if a.end <= b.end {
            index_a += 1;
        }
        if b.end <= a.end {
            index_b += 1;
        }
    }

    debug!(intervals = merged.len(), "aligned flattened layouts");

    Ok(merged)
}

/// Gets the position of the first byte of the slot at `index`.
fn slot_base(index: U256W) -> std::result::Result<U256, Error> {
    index
        .0
        .checked_mul(U256::from(SLOT_SIZE_BYTES as u128))
        .ok_or(Error::ByteOffsetOverflow { index })
}

/// Gets the first and last intervals of one side of the alignment.
fn bounds(intervals: &[Interval], side: Side) -> Result<(&Interval, &Interval)> {
    match (intervals.first(), intervals.last()) {
        (Some(first), Some(last)) => Ok((first, last)),
        _ => Err(Error::EmptyLayout { side }.locate(Location::Document).into()),
    }
}
