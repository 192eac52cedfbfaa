//! This module contains errors pertaining to the collation of a flat list of
//! storage declarations into packed storage slots.

use thiserror::Error;

use crate::error::container::{self, Location};

/// Errors that occur while resolving declarations against the type table and
/// packing them into slots in [`crate::collator`].
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("Type `{type_id}` is not present in the type table")]
    UnknownType { type_id: String },

    #[error("Fixed-size array label `{label}` does not have the form `<base>[<length>]`")]
    MalformedArrayLabel { label: String },

    #[error("Type `{type_id}` has an invalid shape: {reason}")]
    InvalidShape { type_id: String, reason: String },

    #[error("Packing ran past the last slot in the storage space")]
    SlotIndexOverflow,
}

/// Make it possible to attach locations to these errors.
impl container::Locatable for Error {
    type Located = LocatedError;

    fn locate(self, location: Location) -> Self::Located {
        container::Located {
            location,
            payload: self,
        }
    }
}

/// A collation error with an associated location in the layout.
pub type LocatedError = container::Located<Error>;

/// A container of collation errors.
pub type Errors = container::Errors<LocatedError>;

/// The result type for methods that may have collation errors.
pub type Result<T> = std::result::Result<T, Errors>;
