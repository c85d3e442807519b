//! Nested scroll protocol
//!
//! Types shared by every container taking part in nested scrolling, and the
//! [`NestableScrollContainer`] trait the view tree dispatches through.
//!
//! Deltas use the offset convention throughout: negative moves forward
//! (toward the end of the content), positive moves back toward the start.

use std::any::Any;

use glide_core::events::event_types;
use glide_core::{Axis, EventType, StateTransitions};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::source::ScrollSource;
use crate::tree::{NodeId, ScrollChain};

/// How a container shares a delta with its nested-scroll parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestedScrollMode {
    /// Never involve the parent
    #[default]
    SelfOnly,
    /// Consume locally, hand the remainder to the parent
    SelfFirst,
    /// Offer to the parent, consume the remainder locally
    ParentFirst,
    /// Both move by the full delta
    Parallel,
}

/// Nested modes for a scrollable, per direction along its axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NestedScrollOptions {
    #[serde(default)]
    pub forward: NestedScrollMode,
    #[serde(default)]
    pub backward: NestedScrollMode,
}

impl NestedScrollOptions {
    pub fn new(forward: NestedScrollMode, backward: NestedScrollMode) -> Self {
        Self { forward, backward }
    }

    pub fn uniform(mode: NestedScrollMode) -> Self {
        Self::new(mode, mode)
    }

    /// Mode for a delta; negative deltas move forward
    pub fn mode_for(&self, offset: f32) -> NestedScrollMode {
        if offset < 0.0 {
            self.forward
        } else {
            self.backward
        }
    }

    pub fn need_parent(&self) -> bool {
        self.forward != NestedScrollMode::SelfOnly || self.backward != NestedScrollMode::SelfOnly
    }

    pub fn need_parent_for(&self, forward: bool) -> bool {
        let mode = if forward { self.forward } else { self.backward };
        mode != NestedScrollMode::SelfOnly
    }
}

/// Per-direction nested modes for a two-axis embedder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NestedScrollOptionsExt {
    #[serde(default)]
    pub scroll_up: NestedScrollMode,
    #[serde(default)]
    pub scroll_down: NestedScrollMode,
    #[serde(default)]
    pub scroll_left: NestedScrollMode,
    #[serde(default)]
    pub scroll_right: NestedScrollMode,
}

impl NestedScrollOptionsExt {
    pub fn uniform(mode: NestedScrollMode) -> Self {
        Self {
            scroll_up: mode,
            scroll_down: mode,
            scroll_left: mode,
            scroll_right: mode,
        }
    }

    /// Collapse to forward/backward options for one axis. Forward is down
    /// on the vertical axis and right on the horizontal one.
    pub fn for_axis(&self, axis: Axis) -> NestedScrollOptions {
        if axis.is_horizontal() {
            NestedScrollOptions::new(self.scroll_right, self.scroll_left)
        } else {
            NestedScrollOptions::new(self.scroll_down, self.scroll_up)
        }
    }
}

/// Role of a delta in the nested dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NestedState {
    /// Straight from the gesture recognizer
    Gesture,
    /// Forwarded by a child, may be partially consumed
    ChildScroll,
    /// Forwarded by a child that wants to overscroll
    ChildOverScroll,
    /// Dry run: report what would remain without moving
    ChildCheckOverScroll,
}

/// Outcome of a nested dispatch
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollResult {
    /// Part of the delta the container did not consume
    pub remain: f32,
    /// The container hit one of its edges
    pub reach_edge: bool,
}

impl ScrollResult {
    pub fn new(remain: f32, reach_edge: bool) -> Self {
        Self { remain, reach_edge }
    }
}

/// Kinds of nestable containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    List,
    Scroll,
    Grid,
    WaterFlow,
    /// Embedded web content delegating through the negotiator
    Web,
}

impl ContainerKind {
    /// Whether the container runs the full scrollable protocol
    pub fn is_scrollable(&self) -> bool {
        !matches!(self, ContainerKind::Web)
    }
}

/// Nearest nestable ancestor per axis
pub type ParentsMap = FxHashMap<Axis, NodeId>;

// ============================================================================
// Gesture phase
// ============================================================================

/// Lifecycle of one scroll gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GesturePhase {
    #[default]
    Idle,
    ScrollStarted,
    Scrolling,
    ScrollEnded,
}

impl StateTransitions for GesturePhase {
    fn on_event(&self, event: EventType) -> Option<Self> {
        use event_types::*;
        match (self, event) {
            (GesturePhase::Idle | GesturePhase::ScrollEnded, SCROLL_START) => {
                Some(GesturePhase::ScrollStarted)
            }
            (GesturePhase::ScrollStarted | GesturePhase::Scrolling, SCROLL) => {
                Some(GesturePhase::Scrolling)
            }
            (GesturePhase::ScrollStarted | GesturePhase::Scrolling, SCROLL_END) => {
                Some(GesturePhase::ScrollEnded)
            }
            (GesturePhase::ScrollStarted | GesturePhase::Scrolling, TOUCH_CANCEL) => {
                Some(GesturePhase::Idle)
            }
            (GesturePhase::ScrollEnded, ANIMATION_SETTLED) => Some(GesturePhase::Idle),
            _ => None,
        }
    }
}

impl GesturePhase {
    pub fn is_active(&self) -> bool {
        matches!(self, GesturePhase::ScrollStarted | GesturePhase::Scrolling)
    }
}

// ============================================================================
// Container trait
// ============================================================================

/// A view that takes part in nested scrolling.
///
/// Methods receiving a [`ScrollChain`] may call into the container's own
/// nested-scroll parent through it; the container itself is checked out of
/// the tree for the duration of the call.
pub trait NestableScrollContainer: Any {
    fn kind(&self) -> ContainerKind;

    fn axis(&self) -> Axis;

    /// Axis used to read raw input events
    fn input_axis(&self) -> Axis {
        self.axis()
    }

    fn nested_scroll(&self) -> NestedScrollOptions;

    /// Parent resolved at the last scroll start
    fn nested_parent(&self) -> Option<NodeId>;

    fn set_nested_parent(&mut self, parent: Option<NodeId>);

    fn current_offset(&self) -> f32;

    /// Offer `offset` to this container
    fn handle_scroll(
        &mut self,
        chain: &mut ScrollChain<'_>,
        offset: f32,
        source: ScrollSource,
        state: NestedState,
        velocity: f32,
    ) -> ScrollResult;

    /// Offer a release velocity. Returns true when the container took over
    /// the motion.
    fn handle_scroll_velocity(&mut self, chain: &mut ScrollChain<'_>, velocity: f32) -> bool;

    fn on_scroll_start_recursive(&mut self, chain: &mut ScrollChain<'_>, position: f32, velocity: f32);

    fn on_scroll_end_recursive(&mut self, chain: &mut ScrollChain<'_>, velocity: Option<f32>);

    fn on_scroll_drag_end_recursive(&mut self, chain: &mut ScrollChain<'_>);

    /// Whether the container is currently stretched past an edge
    fn nested_scroll_out_of_boundary(&self) -> bool;

    /// Drag delta from the gesture recognizer
    fn on_gesture_update(&mut self, chain: &mut ScrollChain<'_>, offset: f32, source: ScrollSource) {
        self.handle_scroll(chain, offset, source, NestedState::Gesture, 0.0);
    }

    /// Finger lifted with `velocity`
    fn on_gesture_end(&mut self, chain: &mut ScrollChain<'_>, velocity: f32) {
        self.on_scroll_drag_end_recursive(chain);
        if !self.handle_scroll_velocity(chain, velocity) {
            self.on_scroll_end_recursive(chain, Some(velocity));
        }
    }

    /// Gesture cancelled; ends the scroll without a fling
    fn on_touch_cancel(&mut self, chain: &mut ScrollChain<'_>) {
        self.on_scroll_end_recursive(chain, None);
    }

    /// Advance animations by `dt` seconds. Returns whether anything moved.
    fn on_tick(&mut self, _chain: &mut ScrollChain<'_>, _dt: f32) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
