//! This module contains errors pertaining to reading and writing the JSON
//! interchange form of a storage layout.

use thiserror::Error;

use crate::error::container::{self, Location};

/// Errors that occur when converting a [`crate::layout::StorageLayout`] to or
/// from its JSON document form.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("Could not parse storage layout document: {reason}")]
    Parse { reason: String },

    #[error("Could not write storage layout document: {reason}")]
    Serialize { reason: String },
}

impl Error {
    /// Constructs a parse error from the underlying JSON `error`.
    #[must_use]
    pub fn parse(error: &serde_json::Error) -> Self {
        Self::Parse {
            reason: error.to_string(),
        }
    }

    /// Constructs a serialization error from the underlying JSON `error`.
    #[must_use]
    pub fn serialize(error: &serde_json::Error) -> Self {
        Self::Serialize {
            reason: error.to_string(),
        }
    }
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

/// An interchange error with an associated location.
pub type LocatedError = container::Located<Error>;

/// A container of interchange errors.
pub type Errors = container::Errors<LocatedError>;

/// The result type for methods that may have interchange errors.
pub type Result<T> = std::result::Result<T, Errors>;
