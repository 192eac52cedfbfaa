use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::utility::U256W;

/// The place in a storage layout that an error refers to.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Location {
    /// A declaration, named by its full path (e.g. `owner.balances[3].amount`).
    Declaration(String),

    /// A storage slot, named by its index.
    Slot(U256W),

    /// The layout document as a whole.
    Document,
}

impl Location {
    /// Constructs a location pointing at the declaration with the provided
    /// `path`.
    pub fn declaration(path: impl Into<String>) -> Self {
        Self::Declaration(path.into())
    }

    /// Constructs a location pointing at the slot with the provided `index`.
    pub fn slot(index: impl Into<U256W>) -> Self {
        Self::Slot(index.into())
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Declaration(path) => write!(f, "`{path}`"),
            Self::Slot(index) => write!(f, "slot {index}"),
            Self::Document => write!(f, "document"),
        }
    }
}

/// An error that is localised to a particular place in a storage layout.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub struct Located<E>
where
    E: Clone,
{
    /// Where in the layout the error occurred.
    pub location: Location,

    /// The error data
    pub payload: E,
}

/// Displays the error prefixed by the location where it occurred.
impl<E> Display for Located<E>
where
    E: Display + Clone,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.location, self.payload)
    }
}

/// A trait for types that can have a layout location attached to them.
pub trait Locatable
where
    Self: Sized,
{
    /// The return type with the attached location.
    type Located;

    /// Attach the provided `location` to the error.
    fn locate(self, location: Location) -> Self::Located;
}

/// A blanket implementation that allows for attaching a location to any result.
impl<T, E> Locatable for Result<T, E>
where
    E: std::error::Error + Clone,
{
    type Located = Result<T, Located<E>>;

    fn locate(self, location: Location) -> Self::Located {
        self.map_err(|e| Located {
            location,
            payload: e,
        })
    }
}

/// An error that is a collection of errors.
///
/// The order of the errors in the container is the order in which they were
/// added to it.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub struct Errors<E> {
    payloads: Vec<E>,
}

impl<E> Errors<E> {
    /// Creates a new container for errors.
    #[must_use]
    pub fn new() -> Self {
        let payloads = vec![];
        Self { payloads }
    }

    /// Gets the errors contained within this error.
    #[must_use]
    pub fn payloads(&self) -> &[E] {
        self.payloads.as_slice()
    }

    /// Gets the length of the errors container.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    /// Checks if the errors container is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> Errors<E>
where
    E: std::error::Error,
{
    /// Adds the provided `error` to the container.
    pub fn add(&mut self, error: E) {
        self.payloads.push(error);
    }
}

/// The default errors container is one containing no errors.
impl<E> Default for Errors<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Allow conversion from any error type to a container of errors.
impl<E> From<E> for Errors<E>
where
    E: std::error::Error,
{
    fn from(value: E) -> Self {
        let mut errors = Self::default();
        errors.add(value);
        errors
    }
}

/// Allow conversion from the errors container to a vector of errors.
impl<E> From<Errors<E>> for Vec<E>
where
    E: std::error::Error,
{
    fn from(value: Errors<E>) -> Self {
        value.payloads
    }
}

/// Allow conversion from a vector of errors to the errors container.
impl<E> From<Vec<E>> for Errors<E>
where
    E: std::error::Error,
{
    fn from(value: Vec<E>) -> Self {
        Self { payloads: value }
    }
}

/// Displays the errors in the sequence in which they occur in the container.
///
/// It has a header specifying how many errors occurred, and then prints one
/// error per line after that.
impl<E> Display for Errors<E>
where
    E: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.payloads.is_empty() {
            write!(f, "Encountered no errors")?;
        } else {
            writeln!(f, "Encountered {} errors:", self.payloads.len())?;
            for error in &self.payloads {
                writeln!(f, "{error}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::error::{
        collation,
        container::{Locatable, Location},
        Errors,
    };

    #[test]
    fn located_errors_display_their_location() {
        let result: Result<(), collation::Error> = Err(collation::Error::UnknownType {
            type_id: "t_missing".into(),
        });
        let located = result.locate(Location::declaration("owner.balance"));
        let error = located.expect_err("Result was constructed as an error");

        assert_eq!(error.location, Location::declaration("owner.balance"));
        assert_eq!(
            error.to_string(),
            "[`owner.balance`]: Type `t_missing` is not present in the type table"
        );
    }

    #[test]
    fn containers_report_their_contents() {
        let empty = Errors::new();
        assert!(empty.is_empty());
        assert_eq!(empty.to_string(), "Encountered no errors");

        let error = collation::Error::SlotIndexOverflow.locate(Location::slot(3usize));
        let errors: Errors = crate::error::LocatedError::from(error).into();
        assert_eq!(errors.len(), 1);
        assert!(errors.to_string().starts_with("Encountered 1 errors:"));
    }
}
