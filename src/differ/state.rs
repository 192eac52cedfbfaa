//! This module contains the state tracking functionality for the differ.

use std::fmt::Debug;

use crate::{aligner, aligner::MergedSlot, collator, collator::Slot};

/// A marker trait that says that the type implementing it is a differ state.
///
/// Differ states can be transitioned between as part of the
/// [`crate::differ::Differ`] state machine, and are intended to enforce that
/// correct state transitions take place.
pub trait State
where
    Self: Debug + Sized,
{
}

/// The initial state for the differ.
#[derive(Debug)]
pub struct HasLayouts {
    /// The collation configuration, applied to both layouts.
    pub collator_config: collator::Config,

    /// The alignment configuration.
    pub aligner_config: aligner::Config,
}
impl State for HasLayouts {}

/// The state for a differ that has collated both of its layouts.
#[derive(Debug)]
pub struct Collated {
    /// The slots of layout A.
    pub slots_a: Vec<Slot>,

    /// The slots of layout B.
    pub slots_b: Vec<Slot>,

    /// The alignment configuration.
    pub aligner_config: aligner::Config,
}
impl State for Collated {}

/// The state for a differ that has aligned the two collated layouts.
#[derive(Debug)]
pub struct Aligned {
    /// The slots of layout A.
    pub slots_a: Vec<Slot>,

    /// The slots of layout B.
    pub slots_b: Vec<Slot>,

    /// The aligned slot pairs.
    pub merged: Vec<MergedSlot>,
}
impl State for Aligned {}
