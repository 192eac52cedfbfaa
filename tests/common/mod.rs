//! This module contains common utilities for simplifying the writing of
//! integration tests for this library.

#![cfg(test)]

use std::fs::File;

use anyhow::anyhow;
use storage_layout_diff::{
    aligner,
    collator,
    collator::Slot,
    layout::{StorageElement, TypeDescriptor, TypeTable},
    StorageLayout,
};

/// Loads the layout document stored at the provided `path`.
#[allow(unused)] // It is actually
pub fn load_layout(path: impl Into<String>) -> anyhow::Result<StorageLayout> {
    let path = path.into();
    let file = File::open(&path).map_err(|_| anyhow!("File {path} not available"))?;
    let layout = StorageLayout::from_reader(file)?;
    Ok(layout)
}

/// Loads and collates the layout document stored at the provided `path` using
/// the default collator configuration.
#[allow(unused)] // It is actually
pub fn collate_file(path: impl Into<String>) -> anyhow::Result<Vec<Slot>> {
    let layout = load_layout(path)?;
    Ok(collator::collate(&layout)?)
}

/// Gets a type table containing the elementary value types used by the
/// hand-written test layouts.
#[allow(unused)] // It is actually
pub fn elementary_types() -> TypeTable {
    TypeTable::new()
        .with("t_bool", TypeDescriptor::value("bool", 1))
        .with("t_uint8", TypeDescriptor::value("uint8", 1))
        .with("t_uint16", TypeDescriptor::value("uint16", 2))
        .with("t_uint128", TypeDescriptor::value("uint128", 16))
        .with("t_uint256", TypeDescriptor::value("uint256", 32))
        .with("t_address", TypeDescriptor::value("address", 20))
}

/// Builds a layout declaring each `(label, type)` pair in `storage` in order,
/// against the provided `types`.
#[allow(unused)] // It is actually
pub fn layout_of(types: &TypeTable, storage: &[(&str, &str)]) -> StorageLayout {
    let storage = storage
        .iter()
        .map(|(label, typ)| StorageElement::new(*label, *typ))
        .collect();
    StorageLayout::new(storage, types.clone())
}

/// Runs the full comparison of `a` against `b` with the default
/// configurations.
#[allow(unused)] // It is actually
pub fn diff(
    a: StorageLayout,
    b: StorageLayout,
) -> storage_layout_diff::error::Result<Vec<aligner::MergedSlot>> {
    storage_layout_diff::new(a, b, collator::Config::default(), aligner::Config::default()).diff()
}
