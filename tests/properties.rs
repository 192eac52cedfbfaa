//! This module is an integration test that checks the structural guarantees of
//! collation and alignment across every layout in the test assets.
#![cfg(test)]

use storage_layout_diff::{
    aligner,
    collator::{self, Slot},
    constant::SLOT_SIZE_BYTES,
    layout::Encoding,
};

mod common;

const LAYOUTS: [&str; 3] = [
    "./asset/TokenV1.json",
    "./asset/TokenV2.json",
    "./asset/TokenV3.json",
];

fn all_collated() -> anyhow::Result<Vec<Vec<Slot>>> {
    LAYOUTS.iter().map(|path| common::collate_file(*path)).collect()
}

#[test]
fn entries_never_overlap_or_overfill() -> anyhow::Result<()> {
    for slots in all_collated()? {
        for slot in &slots {
            let mut end = 0;
            for entry in &slot.entries {
                assert!(entry.offset >= end, "{} overlaps", entry.name);
                end = entry.end();
            }

            let total: usize = slot.entries.iter().map(|e| e.size).sum();
            assert!(total <= slot.reserved_bytes);
            assert!(slot.reserved_bytes <= SLOT_SIZE_BYTES);
            assert!(slot.filled_bytes <= slot.reserved_bytes);
        }
    }

    Ok(())
}

#[test]
fn indirect_values_reserve_whole_slots() -> anyhow::Result<()> {
    for slots in all_collated()? {
        for entry in slots.iter().flat_map(|s| &s.entries) {
            match entry.encoding {
                Encoding::Mapping | Encoding::DynamicArray | Encoding::Bytes => {
                    assert_eq!(entry.size, SLOT_SIZE_BYTES);
                }
                Encoding::Inplace => assert!(entry.size <= SLOT_SIZE_BYTES),
            }
        }

        for slot in &slots {
            let mappings = slot
                .entries
                .iter()
                .filter(|e| e.encoding == Encoding::Mapping)
                .count();
            let content: usize = slot
                .entries
                .iter()
                .filter(|e| e.encoding != Encoding::Mapping)
                .map(|e| e.size)
                .sum();
            assert_eq!(slot.filled_bytes, content, "mappings: {mappings}");
        }
    }

    Ok(())
}

#[test]
fn slot_indices_are_consecutive() -> anyhow::Result<()> {
    for slots in all_collated()? {
        for pair in slots.windows(2) {
            assert_eq!(pair[0].index.successor(), Some(pair[1].index));
        }
    }

    Ok(())
}

#[test]
fn merged_units_tile_every_slot_pair() -> anyhow::Result<()> {
    let collated = all_collated()?;
    let config = aligner::Config::default().with_pad_missing_slots(true);

    for a in &collated {
        for b in &collated {
            for slot in aligner::merge(a, b, &config)? {
                let mut cursor = 0;
                for unit in &slot.units {
                    assert_eq!(unit.start, cursor);
                    assert!(unit.end > unit.start);
                    assert!(unit.start >= unit.a.offset && unit.end <= unit.a.end());
                    assert!(unit.start >= unit.b.offset && unit.end <= unit.b.end());
                    cursor = unit.end;
                }
                assert_eq!(cursor, slot.reserved_bytes_a.max(slot.reserved_bytes_b));
            }
        }
    }

    Ok(())
}

#[test]
fn a_layout_never_differs_from_itself() -> anyhow::Result<()> {
    for path in LAYOUTS {
        let layout = common::load_layout(path)?;
        let merged = common::diff(layout.clone(), layout.clone())?;
        assert!(merged.iter().all(|s| !s.has_changes()), "{path}");

        assert_eq!(collator::collate(&layout)?, collator::collate(&layout)?);
    }

    Ok(())
}
