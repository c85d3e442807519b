//! State transitions
//!
//! Scroll containers describe their lifecycle as small enums that react to
//! event ids from [`crate::events::event_types`]. Implementors only list the
//! transitions that exist; any other event leaves the state unchanged.
//!
//! # Example
//!
//! ```rust
//! use glide_core::events::event_types::*;
//! use glide_core::StateTransitions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
//! enum Drag {
//!     #[default]
//!     Idle,
//!     Dragging,
//! }
//!
//! impl StateTransitions for Drag {
//!     fn on_event(&self, event: u32) -> Option<Self> {
//!         match (self, event) {
//!             (Drag::Idle, DRAG) => Some(Drag::Dragging),
//!             (Drag::Dragging, DRAG_END) => Some(Drag::Idle),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let mut state = Drag::Idle;
//! assert!(state.apply(DRAG));
//! assert_eq!(state, Drag::Dragging);
//! assert!(!state.apply(DRAG));
//! ```

use std::hash::Hash;

use crate::events::EventType;

/// Trait for enum states driven by event ids
pub trait StateTransitions:
    Clone + Copy + PartialEq + Eq + Hash + Send + Sync + std::fmt::Debug + 'static
{
    /// Handle an event and return the new state, or None if no transition
    fn on_event(&self, event: EventType) -> Option<Self>;

    /// Transition in place. Returns true when the state changed.
    fn apply(&mut self, event: EventType) -> bool {
        match self.on_event(event) {
            Some(next) if next != *self => {
                tracing::trace!("{:?} --{}--> {:?}", self, event, next);
                *self = next;
                true
            }
            _ => false,
        }
    }
}
