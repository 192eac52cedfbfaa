//! This module contains the definitions for the storage layout document that
//! the compiler emits, and that the library both consumes and persists.
//!
//! The document has the shape `{ "storage": [...], "types": {...} }`, where
//! `storage` is the flat list of top-level declarations in declaration order
//! and `types` maps each type identifier to its [`TypeDescriptor`].

pub mod types;

use std::io::Read;

use serde::{Deserialize, Serialize};

pub use self::types::{Encoding, Shape, TypeDescriptor, TypeTable};
use crate::{
    constant::DEFAULT_JSON_INDENT,
    error::{
        container::{Locatable, Location},
        interchange,
    },
};

/// A storage layout as emitted by the compiler for a single contract.
///
/// Collation and alignment only ever read this document, so a layout that is
/// loaded and then written back is unchanged apart from formatting.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct StorageLayout {
    /// The top-level storage declarations, in declaration order.
    pub storage: Vec<StorageElement>,

    /// The metadata for every type referenced by the declarations.
    pub types: TypeTable,
}

impl StorageLayout {
    /// Constructs a new layout from the provided `storage` declarations and
    /// their `types`.
    #[must_use]
    pub fn new(storage: Vec<StorageElement>, types: TypeTable) -> Self {
        Self { storage, types }
    }

    /// Parses a layout from its JSON document form.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `json` is not a valid layout document.
    pub fn from_json_str(json: &str) -> interchange::Result<Self> {
        let layout = serde_json::from_str(json)
            .map_err(|e| interchange::Error::parse(&e))
            .locate(Location::Document)?;
        Ok(layout)
    }

    /// Parses a layout from the bytes of its JSON document form.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `bytes` is not a valid layout document.
    pub fn from_json_slice(bytes: &[u8]) -> interchange::Result<Self> {
        let layout = serde_json::from_slice(bytes)
            .map_err(|e| interchange::Error::parse(&e))
            .locate(Location::Document)?;
        Ok(layout)
    }

    /// Reads a layout in JSON document form from the provided `reader`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if reading fails or the data read is not a valid layout
    /// document.
    pub fn from_reader(reader: impl Read) -> interchange::Result<Self> {
        let layout = serde_json::from_reader(reader)
            .map_err(|e| interchange::Error::parse(&e))
            .locate(Location::Document)?;
        Ok(layout)
    }

    /// Writes the layout to its JSON document form, indenting nested values by
    /// `indent` spaces.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the layout cannot be serialized.
    pub fn to_json_string(&self, indent: usize) -> interchange::Result<String> {
        let indent = " ".repeat(indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut buffer = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)
            .map_err(|e| interchange::Error::serialize(&e))
            .locate(Location::Document)?;

        // The serializer only ever emits UTF-8.
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Writes the layout to its JSON document form with the default
    /// indentation.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the layout cannot be serialized.
    pub fn to_json_pretty(&self) -> interchange::Result<String> {
        self.to_json_string(DEFAULT_JSON_INDENT)
    }
}

/// A single storage declaration as the compiler reports it.
///
/// This is used both for the top-level declarations of a contract and for the
/// members of a struct type.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageElement {
    /// The identifier of the declaration's AST node, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ast_id: Option<u64>,

    /// The fully-qualified name of the contract that declares the variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,

    /// The name of the variable or struct member.
    pub label: String,

    /// The compiler's byte offset for the variable within its slot.
    #[serde(default)]
    pub offset: usize,

    /// The compiler's slot number for the variable, as a decimal string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,

    /// The identifier of the variable's type in the [`TypeTable`].
    #[serde(rename = "type")]
    pub typ: String,
}

impl StorageElement {
    /// Constructs a new element named `label` that has the type identified by
    /// `typ`, and that carries none of the compiler's positional metadata.
    pub fn new(label: impl Into<String>, typ: impl Into<String>) -> Self {
        Self {
            ast_id:   None,
            contract: None,
            label:    label.into(),
            offset:   0,
            slot:     None,
            typ:      typ.into(),
        }
    }
}
