//! Glide Scroll
//!
//! Scroll physics for nested scroll containers: the offset state machine,
//! overscroll friction and edge effects, snapping and paging, and the
//! protocol nested containers use to share deltas and release velocities.
//!
//! # Modules
//!
//! - **offset**: scroll offset state, boundary queries, and the update path
//! - **edge**: edge effects and reach/crash detection
//! - **snap** / **paging**: resting offsets and release prediction
//! - **nested**: nested scroll modes and the container trait
//! - **pattern**: the scrollable container implementing the protocol
//! - **negotiator**: nested-scroll filtering for embedded web content
//! - **tree**: the view arena routing gestures through nested parents
//! - **events**: user callbacks and event history
//! - **config**: TOML-loadable scroll configuration
//! - **dump**: diagnostic snapshots
//!
//! # Example
//!
//! ```rust
//! use glide_core::Axis;
//! use glide_scroll::{ContainerKind, LayoutInfo, ScrollConfig, ScrollPattern, ScrollSource, ViewTree};
//!
//! let mut tree = ViewTree::new();
//! let mut list = ScrollPattern::new(ContainerKind::List, ScrollConfig::no_bounce());
//! list.on_layout(LayoutInfo::along(Axis::Vertical, 500.0, 2000.0));
//! let id = tree.insert_root("list", Some(Box::new(list)));
//!
//! tree.scroll_start(id, 0.0);
//! tree.scroll_update(id, -120.0, ScrollSource::Update);
//! tree.scroll_end(id, 0.0);
//!
//! let list = tree.container_as::<ScrollPattern>(id).unwrap();
//! assert_eq!(list.offset(), -120.0);
//! ```

pub mod config;
pub mod dump;
pub mod edge;
pub mod events;
pub mod negotiator;
pub mod nested;
pub mod offset;
pub mod paging;
pub mod pattern;
pub mod snap;
pub mod source;
pub mod tree;

pub use config::{ConfigError, ScrollConfig};
pub use dump::{EventRecord, History, LayoutRecord, ScrollEventKind};
pub use edge::{EdgeEffect, EffectEdge, ScrollEdge};
pub use events::{ScrollEventHub, ScrollEventPayload};
pub use negotiator::WebNegotiator;
pub use nested::{
    ContainerKind, GesturePhase, NestableScrollContainer, NestedScrollMode, NestedScrollOptions,
    NestedScrollOptionsExt, NestedState, ParentsMap, ScrollResult,
};
pub use offset::{OverScrollOffset, ScrollableState, NEAR_ZERO};
pub use paging::{paging_delta, paging_offset, PAGING_SPEED_THRESHOLD};
pub use pattern::{LayoutInfo, ScrollPattern};
pub use snap::{
    SnapAlign, SnapConfig, SnapDirection, SnapEngine, SnapSource, MAX_SNAP_OFFSETS, SNAP_INTERVAL_MIN,
    SPRING_ACCURACY,
};
pub use source::{ScrollSource, ScrollSourceType, ScrollState};
pub use tree::{NodeId, ScrollChain, TreeError, ViewNode, ViewTree};
