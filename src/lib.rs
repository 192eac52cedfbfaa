//! This library reconstructs the byte-level layout of a smart contract's
//! persistent storage from the storage layout that the Solidity compiler
//! emits, and compares two such layouts to find where they differ.
//!
//! It is intended to be used for checking that an upgrade to a contract does
//! not move or reinterpret any of the storage that the deployed version has
//! already written.
//!
//! # How it Works
//!
//! From a very high level, the comparison is performed as follows:
//!
//! 1. Each layout is read as a [`StorageLayout`]: a flat list of the contract's
//!    storage declarations, and a table of metadata for every type they use.
//! 2. The [`collator`] packs the declarations of each layout into a sequence
//!    of 32-byte [`collator::Slot`]s, expanding structs and fixed-size arrays
//!    into their members as it goes.
//! 3. The [`aligner`] pairs the slots of the two layouts and sweeps each pair
//!    byte by byte, producing [`aligner::MergedUnit`]s that say what occupies
//!    each range on either side, and whether that changed.
//!
//! Rendering the results is left to the client.
//!
//! # Basic Usage
//!
//! For the most basic usage of the library, it is sufficient to construct a
//! [`differ::Differ`] and call the `.diff` method.
//!
//! ```
//! use storage_layout_diff as sld;
//! use storage_layout_diff::{
//!     aligner,
//!     collator,
//!     layout::{StorageElement, StorageLayout, TypeDescriptor, TypeTable},
//! };
//!
//! let types = TypeTable::new()
//!     .with("t_uint128", TypeDescriptor::value("uint128", 16))
//!     .with("t_uint256", TypeDescriptor::value("uint256", 32));
//!
//! let before = StorageLayout::new(
//!     vec![
//!         StorageElement::new("low", "t_uint128"),
//!         StorageElement::new("high", "t_uint128"),
//!     ],
//!     types.clone(),
//! );
//! let after = StorageLayout::new(vec![StorageElement::new("both", "t_uint256")], types);
//!
//! let merged = sld::new(
//!     before,
//!     after,
//!     collator::Config::default(),
//!     aligner::Config::default(),
//! )
//! .diff()
//! .unwrap();
//!
//! assert_eq!(merged.len(), 1);
//! assert_eq!(merged[0].units.len(), 2);
//! assert!(merged[0].has_changes());
//! ```

#![warn(clippy::all, clippy::cargo, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Allows for better API naming

pub mod aligner;
pub mod collator;
pub mod constant;
pub mod differ;
pub mod error;
pub mod layout;
pub mod utility;

// Re-exports to provide the library interface.
pub use differ::new;
pub use layout::StorageLayout;
