//! This module contains the collator, which reconstructs the physical slot
//! layout of contract storage from the compiler's flat list of declarations.
//!
//! # Packing
//!
//! Declarations are placed depth-first and in declaration order into a
//! sequence of 32-byte slots:
//!
//! - A value goes at the first unclaimed byte of the current slot, unless it
//!   does not fit in what remains, in which case a new slot is opened for it.
//! - Mappings, dynamic arrays, and `bytes` claim 32 bytes. Of these only the
//!   latter two count the bytes as filled, as they keep their length inline.
//! - Structs and fixed-size arrays are expanded into their members (named
//!   `parent.member`) or elements (named `parent[i]`), which are then packed
//!   as if declared in their place. Once the last of them is placed, the slot
//!   it ended in is claimed in full, so that nothing declared afterwards can
//!   share it.

pub mod slot;

use tracing::{debug, trace};

pub use self::slot::{ByteState, Slot, SlotEntry};
use crate::{
    error::{
        collation::{Error, Result},
        container::{Locatable, Location},
    },
    layout::{Shape, StorageLayout, TypeTable},
    utility::U256W,
};

/// The configuration for collation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Config {
    /// The index of the slot that packing starts in.
    ///
    /// Defaults to slot zero.
    pub first_slot: U256W,
}

impl Config {
    /// Sets the `first_slot` config parameter to `value`.
    #[must_use]
    pub fn with_first_slot(mut self, value: impl Into<U256W>) -> Self {
        self.first_slot = value.into();
        self
    }
}

/// Collates the declarations of `layout` into slots, starting from slot zero.
///
/// # Errors
///
/// Returns [`Err`] if a declaration refers to a type that cannot be resolved
/// in the layout's type table, or if that type cannot be interpreted.
pub fn collate(layout: &StorageLayout) -> Result<Vec<Slot>> {
    collate_with(layout, &Config::default())
}

/// Collates the declarations of `layout` into slots as directed by `config`.
///
/// The result is ordered by increasing slot index, with no gaps between
/// indices. A layout with no declarations produces no slots.
///
/// # Errors
///
/// Returns [`Err`] if a declaration refers to a type that cannot be resolved
/// in the layout's type table, or if that type cannot be interpreted.
pub fn collate_with(layout: &StorageLayout, config: &Config) -> Result<Vec<Slot>> {
    let mut collator = Collator::new(&layout.types, config);
    for element in &layout.storage {
        collator.declare(element.label.clone(), element.typ.clone())?;
    }
    let slots = collator.finish();

    debug!(
        declarations = layout.storage.len(),
        slots = slots.len(),
        "collated storage layout"
    );

    Ok(slots)
}

/// A pending unit of collation work.
#[derive(Clone, Debug, Eq, PartialEq)]
enum Work {
    /// A declaration named `name` with the type identified by `type_id`
    /// remains to be placed.
    Declare { name: String, type_id: String },

    /// The composite named `name` has had all of its members placed, so the
    /// slot it ended in must be closed off.
    Seal { name: String },
}

/// The packing state shared by all the declarations of a single layout.
///
/// Composites are expanded onto an explicit work stack rather than by
/// recursion, with a [`Work::Seal`] queued beneath their members.
struct Collator<'a> {
    types:   &'a TypeTable,
    config:  &'a Config,
    slots:   Vec<Slot>,
    pending: Vec<Work>,
}

impl<'a> Collator<'a> {
    fn new(types: &'a TypeTable, config: &'a Config) -> Self {
        Self {
            types,
            config,
            slots: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Places the top-level declaration `name` of type `type_id`, along with
    /// everything it expands to.
    fn declare(&mut self, name: String, type_id: String) -> Result<()> {
        self.pending.push(Work::Declare { name, type_id });

        while let Some(work) = self.pending.pop() {
            match work {
                Work::Declare { name, type_id } => self.place(name, &type_id)?,
                Work::Seal { name } => self.seal(&name),
            }
        }

        Ok(())
    }

    fn place(&mut self, name: String, type_id: &str) -> Result<()> {
        let types = self.types;
        let location = || Location::declaration(name.as_str());
        let typ = types.resolve(type_id).locate(location())?;
        let shape = typ.shape(type_id).locate(location())?;
        let slot = self.slot_for(typ.size_bytes()).locate(location())?;

        match shape {
            Shape::Value | Shape::Indirect => {
                trace!(%name, type_id, index = %slot.index, offset = slot.reserved_bytes, "placed");
                slot.place(name, type_id, typ);
            }
            Shape::Struct { members } => {
                let children = members
                    .iter()
                    .map(|member| Work::Declare {
                        name:    format!("{name}.{}", member.label),
                        type_id: member.typ.clone(),
                    })
                    .collect();
                self.expand(name, children);
            }
            Shape::FixedArray { base, length } => {
                let children = (0..length)
                    .map(|i| Work::Declare {
                        name:    format!("{name}[{i}]"),
                        type_id: base.to_string(),
                    })
                    .collect();
                self.expand(name, children);
            }
        }

        Ok(())
    }

    /// Queues the `children` of the composite `name` so that they are placed
    /// in order, followed by the sealing of the composite's final slot.
    fn expand(&mut self, name: String, children: Vec<Work>) {
        self.pending.push(Work::Seal { name });
        self.pending.extend(children.into_iter().rev());
    }

    /// Claims the rest of the last slot on behalf of the composite `name`.
    fn seal(&mut self, name: &str) {
        if let Some(slot) = self.slots.last_mut() {
            debug!(composite = name, index = %slot.index, filled = slot.filled_bytes, "sealed slot");
            slot.seal();
        }
    }

    /// Gets the slot that a value of `size` bytes has to start in, opening a
    /// new one if the current slot cannot take it.
    fn slot_for(&mut self, size: usize) -> std::result::Result<&mut Slot, Error> {
        let next_index = match self.slots.last() {
            None => Some(self.config.first_slot),
            Some(current) if !current.is_empty() && size > current.remaining_bytes() => {
                Some(current.index.successor().ok_or(Error::SlotIndexOverflow)?)
            }
            Some(_) => None,
        };

        if let Some(index) = next_index {
            debug!(%index, "opened slot");
            self.slots.push(Slot::new(index));
        }

        self.slots.last_mut().ok_or(Error::SlotIndexOverflow)
    }

    fn finish(self) -> Vec<Slot> {
        self.slots
    }
}
