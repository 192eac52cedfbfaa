//! This module contains errors pertaining to the alignment of two collated
//! storage layouts against each other.

use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::{
    error::container::{self, Location},
    utility::U256W,
};

/// Names one of the two layouts being aligned.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Side {
    A,
    B,
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Errors that occur when the preconditions for aligning two layouts in
/// [`crate::aligner`] do not hold.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("Cannot align {a} slots in layout A against {b} slots in layout B")]
    SlotCountMismatch { a: usize, b: usize },

    #[error("Cannot align slot {a} in layout A against slot {b} in layout B")]
    SlotIndexMismatch { a: U256W, b: U256W },

    #[error("Layout {side} has no storage to align")]
    EmptyLayout { side: Side },

    #[error("The byte offset of slot {index} does not fit in the storage space")]
    ByteOffsetOverflow { index: U256W },
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

/// An alignment error with an associated location in the layout.
pub type LocatedError = container::Located<Error>;

/// A container of alignment errors.
pub type Errors = container::Errors<LocatedError>;

/// The result type for methods that may have alignment errors.
pub type Result<T> = std::result::Result<T, Errors>;
