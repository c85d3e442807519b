//! Glide Core
//!
//! Shared building blocks for the glide scroll engine.
//!
//! # Modules
//!
//! - **geometry**: axes, sizes, and viewport-relative dimensions
//! - **events**: event type ids and gesture events delivered by the input layer
//! - **fsm**: the `StateTransitions` trait used by every scroll state machine
//! - **error**: construction errors for geometry values

pub mod error;
pub mod events;
pub mod fsm;
pub mod geometry;

pub use error::GeometryError;
pub use events::{Event, EventData, EventType};
pub use fsm::StateTransitions;
pub use geometry::{Axis, Dimension, Size, TextDirection};
