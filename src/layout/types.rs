//! This module contains the type metadata table that accompanies a storage
//! layout, and the interpretation of its entries that collation relies on.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    constant::{DYNAMIC_LENGTH_BYTES, MAPPING_RESERVATION_BYTES},
    error::collation::Error,
    layout::StorageElement,
};

/// The table of type metadata for a layout, keyed by type identifier.
///
/// The table is ordered by identifier so that anything walking it does so
/// deterministically.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TypeTable {
    types: BTreeMap<String, TypeDescriptor>,
}

impl TypeTable {
    /// Creates an empty type table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `descriptor` to the table under the identifier `id`, replacing any
    /// existing entry.
    pub fn insert(&mut self, id: impl Into<String>, descriptor: TypeDescriptor) {
        self.types.insert(id.into(), descriptor);
    }

    /// Builder-style version of [`Self::insert`].
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.insert(id, descriptor);
        self
    }

    /// Looks up the descriptor for the type with identifier `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if there is no type with the identifier `id` in the
    /// table.
    pub fn resolve(&self, id: &str) -> Result<&TypeDescriptor, Error> {
        self.types.get(id).ok_or_else(|| Error::UnknownType {
            type_id: id.to_string(),
        })
    }

    /// Gets the number of types in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Checks if the table contains no types.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// How the value of a type is placed in storage.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// The value occupies its size directly in the slot, or is a composite
    /// whose members do.
    Inplace,

    /// Only a reservation appears inline, and the entries live at
    /// hash-derived locations.
    Mapping,

    /// The length is stored inline, and the elements live at a hash-derived
    /// location.
    DynamicArray,

    /// A `bytes` or `string` value, which keeps its length (or short contents)
    /// inline in the same way as a dynamic array.
    Bytes,
}

/// The metadata for a single type, as recorded by the compiler.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    /// The way that values of this type are placed in storage.
    pub encoding: Encoding,

    /// The human-readable form of the type, such as `uint8[3]`.
    pub label: String,

    /// The number of bytes the inline representation of the type occupies.
    #[serde(with = "number_of_bytes")]
    pub number_of_bytes: usize,

    /// The identifier of the element type, present on array types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,

    /// The identifier of the key type, present on mapping types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// The identifier of the value type, present on mapping types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// The members in declaration order, present on struct types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<StorageElement>>,
}

impl TypeDescriptor {
    /// Constructs the descriptor for a plain inplace value named `label` that
    /// occupies `number_of_bytes` bytes.
    pub fn value(label: impl Into<String>, number_of_bytes: usize) -> Self {
        Self::bare(Encoding::Inplace, label, number_of_bytes)
    }

    /// Constructs the descriptor for a struct named `label` that occupies
    /// `number_of_bytes` bytes and has the provided `members`.
    pub fn structure(
        label: impl Into<String>,
        number_of_bytes: usize,
        members: Vec<StorageElement>,
    ) -> Self {
        let mut descriptor = Self::bare(Encoding::Inplace, label, number_of_bytes);
        descriptor.members = Some(members);
        descriptor
    }

    /// Constructs the descriptor for a fixed-size array named `label` (of the
    /// form `<base>[<length>]`) whose elements have type `base`.
    pub fn fixed_array(
        label: impl Into<String>,
        number_of_bytes: usize,
        base: impl Into<String>,
    ) -> Self {
        let mut descriptor = Self::bare(Encoding::Inplace, label, number_of_bytes);
        descriptor.base = Some(base.into());
        descriptor
    }

    /// Constructs the descriptor for a dynamic array named `label` whose
    /// elements have type `base`.
    pub fn dynamic_array(label: impl Into<String>, base: impl Into<String>) -> Self {
        let mut descriptor = Self::bare(Encoding::DynamicArray, label, DYNAMIC_LENGTH_BYTES);
        descriptor.base = Some(base.into());
        descriptor
    }

    /// Constructs the descriptor for a mapping named `label` from `key` to
    /// `value`.
    pub fn mapping(
        label: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let mut descriptor = Self::bare(Encoding::Mapping, label, MAPPING_RESERVATION_BYTES);
        descriptor.key = Some(key.into());
        descriptor.value = Some(value.into());
        descriptor
    }

    /// Constructs the descriptor for a `bytes` or `string` type named `label`.
    pub fn bytes(label: impl Into<String>) -> Self {
        Self::bare(Encoding::Bytes, label, DYNAMIC_LENGTH_BYTES)
    }

    fn bare(encoding: Encoding, label: impl Into<String>, number_of_bytes: usize) -> Self {
        Self {
            encoding,
            label: label.into(),
            number_of_bytes,
            base: None,
            key: None,
            value: None,
            members: None,
        }
    }

    /// Gets the number of bytes that a value of this type reserves in its
    /// slot.
    ///
    /// Mappings, dynamic arrays, and `bytes` always reserve a full slot,
    /// whatever the metadata claims.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        match self.encoding {
            Encoding::Inplace => self.number_of_bytes,
            Encoding::Mapping => MAPPING_RESERVATION_BYTES,
            Encoding::DynamicArray | Encoding::Bytes => DYNAMIC_LENGTH_BYTES,
        }
    }

    /// Gets the number of reserved bytes that actually hold content.
    #[must_use]
    pub fn filled_bytes(&self) -> usize {
        match self.encoding {
            Encoding::Mapping => 0,
            _ => self.size_bytes(),
        }
    }

    /// Gets the label of the type with the lengths of any fixed-size arrays
    /// removed, so that `uint8[3]` and `uint8[7]` both become `uint8[]`.
    #[must_use]
    pub fn normalized_label(&self) -> String {
        normalize_label(&self.label)
    }

    /// Determines how collation has to treat a value of this type.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the descriptor carries a combination of fields that
    /// no type can have, or if a fixed-size array's label does not state its
    /// length.
    pub fn shape(&self, type_id: &str) -> Result<Shape<'_>, Error> {
        let invalid = |reason: &str| Error::InvalidShape {
            type_id: type_id.to_string(),
            reason:  reason.to_string(),
        };

        match self.encoding {
            Encoding::Inplace => match (&self.members, &self.base) {
                (Some(_), Some(_)) => Err(invalid("both struct members and an element type")),
                (Some(members), None) => Ok(Shape::Struct { members }),
                (None, Some(base)) => Ok(Shape::FixedArray {
                    base,
                    length: self.fixed_length()?,
                }),
                (None, None) => Ok(Shape::Value),
            },
            Encoding::Mapping if self.members.is_some() || self.base.is_some() => {
                Err(invalid("a mapping with struct members or an element type"))
            }
            Encoding::DynamicArray | Encoding::Bytes if self.members.is_some() => {
                Err(invalid("a dynamically-sized type with struct members"))
            }
            Encoding::Mapping | Encoding::DynamicArray | Encoding::Bytes => Ok(Shape::Indirect),
        }
    }

    /// Parses the declared length of a fixed-size array out of its label.
    fn fixed_length(&self) -> Result<usize, Error> {
        let malformed = || Error::MalformedArrayLabel {
            label: self.label.clone(),
        };
        let without_close = self.label.strip_suffix(']').ok_or_else(malformed)?;
        let open = without_close.rfind('[').ok_or_else(malformed)?;
        let (base, digits) = (&without_close[..open], &without_close[open + 1..]);

        if base.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        digits.parse().map_err(|_| malformed())
    }
}

/// The structural categories of type that collation distinguishes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Shape<'a> {
    /// A scalar inplace value that is placed directly into a slot.
    Value,

    /// A struct whose members are packed one after another.
    Struct { members: &'a [StorageElement] },

    /// A fixed-size array of `length` elements of type `base`.
    FixedArray { base: &'a str, length: usize },

    /// A mapping, dynamic array, or `bytes` value, of which only the inline
    /// part is placed.
    Indirect,
}

/// Removes the lengths from any fixed-size array suffixes in `label`.
#[must_use]
pub fn normalize_label(label: &str) -> String {
    let mut normalized = String::with_capacity(label.len());
    let mut rest = label;

    while let Some(open) = rest.find('[') {
        normalized.push_str(&rest[..=open]);
        let after = &rest[open + 1..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        rest = if after[digits..].starts_with(']') {
            &after[digits..]
        } else {
            after
        };
    }
    normalized.push_str(rest);

    normalized
}

/// The compiler writes byte counts as decimal strings, but hand-written
/// documents commonly use plain numbers, so both are accepted. Counts are
/// always written back as strings.
mod number_of_bytes {
    use super::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Text(String),
        Number(usize),
    }

    #[allow(clippy::trivially_copy_pass_by_ref)] // Signature required by serde
    pub fn serialize<S: Serializer>(value: &usize, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<usize, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Count::deserialize(deserializer)? {
            Count::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
            Count::Number(count) => Ok(count),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        error::collation::Error,
        layout::{types::normalize_label, Shape, StorageElement, TypeDescriptor, TypeTable},
    };

    #[test]
    fn normalizes_fixed_array_lengths() {
        assert_eq!(normalize_label("uint8[3]"), "uint8[]");
        assert_eq!(normalize_label("uint8[7]"), "uint8[]");
        assert_eq!(normalize_label("uint256[2][10]"), "uint256[][]");
        assert_eq!(normalize_label("uint256[]"), "uint256[]");
        assert_eq!(normalize_label("struct S[4]"), "struct S[]");
        assert_eq!(normalize_label("address"), "address");
        assert_ne!(normalize_label("uint8[2]"), normalize_label("uint16[2]"));
    }

    #[test]
    fn leaves_non_numeric_brackets_alone() {
        assert_eq!(normalize_label("weird[x]"), "weird[x]");
        assert_eq!(normalize_label("open[12"), "open[12");
    }

    #[test]
    fn mappings_and_dynamic_types_reserve_a_full_slot() {
        let mut mapping = TypeDescriptor::mapping("mapping(address => bool)", "t_address", "t_bool");
        mapping.number_of_bytes = 1;
        assert_eq!(mapping.size_bytes(), 32);
        assert_eq!(mapping.filled_bytes(), 0);

        let array = TypeDescriptor::dynamic_array("uint8[]", "t_uint8");
        assert_eq!(array.size_bytes(), 32);
        assert_eq!(array.filled_bytes(), 32);

        let string = TypeDescriptor::bytes("string");
        assert_eq!(string.filled_bytes(), 32);

        let value = TypeDescriptor::value("uint64", 8);
        assert_eq!(value.size_bytes(), 8);
        assert_eq!(value.filled_bytes(), 8);
    }

    #[test]
    fn classifies_shapes() -> anyhow::Result<()> {
        let members = vec![StorageElement::new("x", "t_uint8")];
        let structure = TypeDescriptor::structure("struct S", 32, members.clone());
        assert_eq!(
            structure.shape("t_struct(S)")?,
            Shape::Struct {
                members: &members
            }
        );

        let array = TypeDescriptor::fixed_array("uint8[12]", 32, "t_uint8");
        assert_eq!(
            array.shape("t_array(t_uint8)12_storage")?,
            Shape::FixedArray {
                base:   "t_uint8",
                length: 12,
            }
        );

        let dynamic = TypeDescriptor::dynamic_array("uint8[]", "t_uint8");
        assert_eq!(dynamic.shape("t_array(t_uint8)dyn_storage")?, Shape::Indirect);
        assert_eq!(TypeDescriptor::value("bool", 1).shape("t_bool")?, Shape::Value);

        Ok(())
    }

    #[test]
    fn rejects_malformed_fixed_array_labels() {
        for label in ["uint8", "uint8[]", "[3]", "uint8[3x]"] {
            let array = TypeDescriptor::fixed_array(label, 32, "t_uint8");
            assert_eq!(
                array.shape("t_bad"),
                Err(Error::MalformedArrayLabel {
                    label: label.to_string(),
                })
            );
        }
    }

    #[test]
    fn rejects_impossible_descriptors() {
        let mut mapping = TypeDescriptor::mapping("mapping(uint => uint)", "t_uint256", "t_uint256");
        mapping.members = Some(vec![]);
        assert!(matches!(
            mapping.shape("t_mapping"),
            Err(Error::InvalidShape { .. })
        ));

        let mut both = TypeDescriptor::structure("struct S", 32, vec![]);
        both.base = Some("t_uint8".into());
        assert!(matches!(both.shape("t_struct"), Err(Error::InvalidShape { .. })));
    }

    #[test]
    fn reports_unknown_types() {
        assert!(TypeTable::new().is_empty());
        let table = TypeTable::new().with("t_bool", TypeDescriptor::value("bool", 1));
        assert_eq!(table.len(), 1);
        assert!(table.resolve("t_bool").is_ok());
        assert_eq!(
            table.resolve("t_uint8"),
            Err(Error::UnknownType {
                type_id: "t_uint8".into(),
            })
        );
    }
}
