//! This module contains the definition of the differ, which drives a pair of
//! storage layouts through collation and alignment.

pub mod state;

use crate::{
    aligner,
    aligner::MergedSlot,
    collator,
    collator::Slot,
    differ::state::State,
    error,
    layout::StorageLayout,
};

/// Creates a new differ comparing `layout_a` against `layout_b`, using the
/// provided `collator_config` for both layouts and `aligner_config` to align
/// them.
///
/// The two layouts are independent inputs, and may have been obtained in any
/// order or concurrently.
#[must_use]
pub fn new(
    layout_a: StorageLayout,
    layout_b: StorageLayout,
    collator_config: collator::Config,
    aligner_config: aligner::Config,
) -> Differ<state::HasLayouts> {
    let layouts = LayoutPair { layout_a, layout_b };
    let state = state::HasLayouts {
        collator_config,
        aligner_config,
    };
    Differ { layouts, state }
}

/// The two layouts being compared.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LayoutPair {
    /// The layout on side A, usually the older of the two.
    pub layout_a: StorageLayout,

    /// The layout on side B, usually the newer of the two.
    pub layout_b: StorageLayout,
}

/// The `Differ` is responsible for taking two storage layouts and producing
/// the byte-level comparison between them.
///
/// # Enforcing Valid State Transitions
///
/// The differ enforces that only correct state transitions can occur through
/// use of structs that implement the exact state required by it at any given
/// point.
///
/// There is the [`Self::state`] function that provides access to the state data
/// of whichever state the differ is currently in.
#[derive(Debug)]
pub struct Differ<S: State> {
    /// The layouts that are being compared.
    layouts: LayoutPair,

    /// The internal state of the differ.
    state: S,
}

/// The operations available in all states.
impl<S: State> Differ<S> {
    /// Gets a reference to the layouts being compared.
    pub fn layouts(&self) -> &LayoutPair {
        &self.layouts
    }

    /// Gets an immutable reference to the current state of the differ.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Moves the differ into the state `NS`, with the value of the state
    /// created by applying `transform` to the layouts and the current state.
    fn transform_state<NS: State>(
        self,
        transform: impl FnOnce(&LayoutPair, S) -> error::Result<NS>,
    ) -> error::Result<Differ<NS>> {
        let state = transform(&self.layouts, self.state)?;
        let layouts = self.layouts;

        Ok(Differ { layouts, state })
    }
}

/// Operations available on a newly-created differ.
impl Differ<state::HasLayouts> {
    /// Executes the comparison from beginning to end, performing all the
    /// intermediate steps automatically and returning the aligned slots.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if any step in the process fails.
    pub fn diff(self) -> error::Result<Vec<MergedSlot>> {
        let differ = self.collate()?;
        let differ = differ.align()?;

        Ok(differ.into_merged())
    }

    /// Collates both layouts into slots.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if either layout cannot be collated.
    pub fn collate(self) -> error::Result<Differ<state::Collated>> {
        self.transform_state(|layouts, old_state| {
            let config = &old_state.collator_config;
            let slots_a = collator::collate_with(&layouts.layout_a, config)?;
            let slots_b = collator::collate_with(&layouts.layout_b, config)?;
            Ok(state::Collated {
                slots_a,
                slots_b,
                aligner_config: old_state.aligner_config,
            })
        })
    }
}

/// Operations available on a differ that has collated both layouts.
impl Differ<state::Collated> {
    /// Aligns the slots of the two collated layouts against each other.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the collated layouts cannot be aligned.
    pub fn align(self) -> error::Result<Differ<state::Aligned>> {
        self.transform_state(|_, old_state| {
            let merged = aligner::merge(
                &old_state.slots_a,
                &old_state.slots_b,
                &old_state.aligner_config,
            )?;
            Ok(state::Aligned {
                slots_a: old_state.slots_a,
                slots_b: old_state.slots_b,
                merged,
            })
        })
    }

    /// Gets the slots of layout A.
    #[must_use]
    pub fn slots_a(&self) -> &[Slot] {
        &self.state.slots_a
    }

    /// Gets the slots of layout B.
    #[must_use]
    pub fn slots_b(&self) -> &[Slot] {
        &self.state.slots_b
    }
}

/// Operations available on a differ that has aligned the two layouts.
impl Differ<state::Aligned> {
    /// Gets the aligned slot pairs.
    #[must_use]
    pub fn merged(&self) -> &[MergedSlot] {
        &self.state.merged
    }

    /// Checks if any byte of storage is occupied differently in the two
    /// layouts.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.state.merged.iter().any(MergedSlot::has_changes)
    }

    /// Consumes the differ, returning the aligned slot pairs.
    #[must_use]
    pub fn into_merged(self) -> Vec<MergedSlot> {
        self.state.merged
    }
}
