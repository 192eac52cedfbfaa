//! This module contains constants that are needed throughout the codebase.

/// The size of a single storage slot on the EVM, in bytes.
///
/// Every slot is one 256-bit word, and packing never lets a value straddle two
/// of them.
pub const SLOT_SIZE_BYTES: usize = 32;

/// The number of bytes the compiler reserves inline for any mapping.
///
/// None of these bytes hold content, as the mapping's entries live at
/// hash-derived locations.
pub const MAPPING_RESERVATION_BYTES: usize = SLOT_SIZE_BYTES;

/// The number of bytes reserved (and filled) inline by a dynamic array or a
/// `bytes`/`string` value, which is where its length is stored.
pub const DYNAMIC_LENGTH_BYTES: usize = SLOT_SIZE_BYTES;

/// The name and type label given to the synthetic segments that cover bytes
/// no declaration occupies.
pub const GAP_LABEL: &str = "";

/// The default indentation used when writing a layout document as JSON.
pub const DEFAULT_JSON_INDENT: usize = 2;
