use thiserror::Error;

use crate::slot::Slot;

/// Errors raised at the binding boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BindingError {
    /// A forwarding call reached the table before any bindings were installed.
    #[error("runtime binding `{slot}` ({}) called before nbjit_init_runtime", .slot.symbol())]
    Uninitialized { slot: Slot },

    /// The host passed a null entry for a slot.
    #[error("null entry for runtime binding `{slot}` (argument {})", .slot.index())]
    NullEntry { slot: Slot },
}

impl BindingError {
    pub fn slot(&self) -> Slot {
        match *self {
            BindingError::Uninitialized { slot } | BindingError::NullEntry { slot } => slot,
        }
    }
}
