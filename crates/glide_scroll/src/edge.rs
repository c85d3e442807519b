//! Edge effects and edge events
//!
//! Detects when the offset crosses one of the content boundaries, either
//! between two consecutive updates ("crash") or between two layout passes
//! ("reach"), and reports it through the event hub.

use glide_core::Axis;
use serde::{Deserialize, Serialize};

use crate::events::ScrollEventHub;
use crate::offset::ScrollableState;

/// Behavior when the content is dragged past an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeEffect {
    /// Rubber-band past the edge, spring back on release
    Spring,
    /// Stop at the edge and accumulate a fade amount
    Fade,
    /// Hard stop at the edge
    #[default]
    None,
}

/// Which edges the edge effect applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectEdge {
    #[default]
    All,
    Start,
    End,
}

impl EffectEdge {
    pub fn allows_start(&self) -> bool {
        !matches!(self, EffectEdge::End)
    }

    pub fn allows_end(&self) -> bool {
        !matches!(self, EffectEdge::Start)
    }
}

/// Edge reported by the scroll-edge event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollEdge {
    Top,
    Bottom,
    Left,
    Right,
}

impl ScrollEdge {
    pub fn start_of(axis: Axis) -> Self {
        if axis.is_horizontal() {
            ScrollEdge::Left
        } else {
            ScrollEdge::Top
        }
    }

    pub fn end_of(axis: Axis) -> Self {
        if axis.is_horizontal() {
            ScrollEdge::Right
        } else {
            ScrollEdge::Bottom
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(self, ScrollEdge::Top | ScrollEdge::Left)
    }
}

impl ScrollableState {
    /// The last update crossed or landed on the start boundary
    pub fn is_crash_top(&self) -> bool {
        let (last, current) = (self.last_offset, self.current_offset);
        (last < 0.0 && current >= 0.0) || (last > 0.0 && current <= 0.0)
    }

    /// The last update crossed or landed on the end boundary
    pub fn is_crash_bottom(&self) -> bool {
        let end = -self.scrollable_distance;
        let (last, current) = (self.last_offset, self.current_offset);
        (last > end && current <= end) || (last < end && current >= end)
    }

    /// Offset arrived at the start since the previous layout. The first
    /// layout counts as arriving from anywhere.
    pub fn reach_start(&self, first_layout: bool) -> bool {
        let (prev, current) = (self.prev_offset, self.current_offset);
        ((prev < 0.0 || first_layout) && current >= 0.0) || (prev > 0.0 && current <= 0.0)
    }

    pub fn reach_end(&self, first_layout: bool) -> bool {
        let end = self.end_boundary();
        let (prev, current) = (self.prev_offset, self.current_offset);
        ((prev > end || first_layout) && current <= end) || (prev < end && current >= end)
    }

    pub fn handle_crash_top(&self, events: &mut ScrollEventHub) {
        let edge = ScrollEdge::start_of(self.axis);
        tracing::trace!("crash {:?} at {:.1}", edge, self.current_offset);
        events.fire_scroll_edge(edge, self.current_offset);
    }

    pub fn handle_crash_bottom(&self, events: &mut ScrollEventHub) {
        let edge = ScrollEdge::end_of(self.axis);
        tracing::trace!("crash {:?} at {:.1}", edge, self.current_offset);
        events.fire_scroll_edge(edge, self.current_offset);
    }

    /// Whether the edge effect is active for a delta heading toward `offset`
    /// (positive heads to the start)
    pub fn has_edge_effect(&self, offset: f32) -> bool {
        if self.edge_effect == EdgeEffect::None {
            return false;
        }
        if self.effect_edge == EffectEdge::All {
            return true;
        }
        let over = self.over_scroll_offset(offset);
        let over = if offset > 0.0 { over.start } else { over.end };
        (over >= 0.0 && self.effect_edge.allows_start())
            || (over <= 0.0 && self.effect_edge.allows_end())
    }
}
