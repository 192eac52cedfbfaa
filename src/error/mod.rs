//! This module contains the primary error type for the library's interface.
//! It also re-exports the more specific error types that are
//! subsystem-specific.

pub mod alignment;
pub mod collation;
pub mod container;
pub mod interchange;

use thiserror::Error;

/// The interface result type for the library.
///
/// # Usage
///
/// Any function considered to be part of the public interface of the library
/// should return this result type. Subsystems should return the more-specific
/// child error types as appropriate.
pub type Result<T> = std::result::Result<T, Errors>;

/// The interface error type for the library.
///
/// All errors returned from the library interface (and hence encountered by the
/// clients of the library) should be members of this enum.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    /// Errors from resolving and packing declarations into slots.
    #[error(transparent)]
    Collation(#[from] collation::Error),

    /// Errors from aligning two collated layouts.
    #[error(transparent)]
    Alignment(#[from] alignment::Error),

    /// Errors from reading or writing the layout document.
    #[error(transparent)]
    Interchange(#[from] interchange::Error),
}

/// Make it possible to attach locations to these errors.
impl container::Locatable for Error {
    type Located = LocatedError;

    fn locate(self, location: container::Location) -> Self::Located {
        container::Located {
            location,
            payload: self,
        }
    }
}

/// A library error with an associated location in a layout.
pub type LocatedError = container::Located<Error>;

/// A container of errors that may occur in the library.
pub type Errors = container::Errors<LocatedError>;

/// Generates the conversions from a subsystem's located errors (and their
/// containers) into the general located error and container types.
macro_rules! rewrap_subsystem_errors {
    ($($subsystem:ident),* $(,)?) => {
        $(
            impl From<$subsystem::LocatedError> for LocatedError {
                fn from(value: $subsystem::LocatedError) -> Self {
                    Self {
                        location: value.location,
                        payload:  Error::from(value.payload),
                    }
                }
            }

            impl From<$subsystem::LocatedError> for Errors {
                fn from(value: $subsystem::LocatedError) -> Self {
                    let re_wrapped: LocatedError = value.into();
                    re_wrapped.into()
                }
            }

            impl From<$subsystem::Errors> for Errors {
                fn from(value: $subsystem::Errors) -> Self {
                    let errs: Vec<$subsystem::LocatedError> = value.into();
                    let new_errs: Vec<LocatedError> =
                        errs.into_iter().map(std::convert::Into::into).collect();

                    new_errs.into()
                }
            }
        )*
    };
}

rewrap_subsystem_errors!(alignment, collation, interchange);
