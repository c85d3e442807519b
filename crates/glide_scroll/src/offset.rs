//! Offset state and boundary policy
//!
//! [`ScrollableState`] owns the main-axis offset of one container. The offset
//! is `0` at the start of the content and grows negative as the content
//! scrolls forward, so the resting range is `[-scrollable_distance, 0]`.
//!
//! Every change goes through [`ScrollableState::update_offset`], which runs
//! the overscroll friction, the edge-effect gate, the boundary clamp, and the
//! will-scroll interceptor before committing.

use glide_animation::{ExponentialFriction, FrictionCurve};
use glide_core::Axis;

use crate::edge::{EdgeEffect, EffectEdge};
use crate::events::ScrollEventHub;
use crate::source::ScrollSource;

/// Deltas smaller than this are treated as zero
pub const NEAR_ZERO: f32 = 0.001;

pub(crate) fn near_zero(value: f32) -> bool {
    value.abs() < NEAR_ZERO
}

/// Part of a delta that lands past the start or end boundary
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OverScrollOffset {
    pub start: f32,
    pub end: f32,
}

#[derive(Debug)]
pub struct ScrollableState {
    pub(crate) axis: Axis,
    pub(crate) current_offset: f32,
    /// Offset before the most recent update
    pub(crate) last_offset: f32,
    /// Offset at the most recent layout
    pub(crate) prev_offset: f32,
    pub(crate) scrollable_distance: f32,
    pub(crate) viewport_length: f32,
    pub(crate) extent: f32,
    pub(crate) scroll_source: ScrollSource,
    pub(crate) edge_effect: EdgeEffect,
    pub(crate) effect_edge: EffectEdge,
    pub(crate) reversed: bool,
    /// Programmatic animations may stretch past an edge
    pub(crate) controller_can_over_scroll: bool,
    pub(crate) friction: Box<dyn FrictionCurve>,
    /// Accumulated overscroll for the fade effect
    pub(crate) fade_amount: f32,
    dirty: bool,
}

impl Default for ScrollableState {
    fn default() -> Self {
        Self::new(EdgeEffect::default(), EffectEdge::default())
    }
}

impl ScrollableState {
    pub fn new(edge_effect: EdgeEffect, effect_edge: EffectEdge) -> Self {
        Self {
            axis: Axis::Vertical,
            current_offset: 0.0,
            last_offset: 0.0,
            prev_offset: 0.0,
            scrollable_distance: 0.0,
            viewport_length: 0.0,
            extent: 0.0,
            scroll_source: ScrollSource::None,
            edge_effect,
            effect_edge,
            reversed: false,
            controller_can_over_scroll: false,
            friction: Box::new(ExponentialFriction::default()),
            fade_amount: 0.0,
            dirty: false,
        }
    }

    pub fn with_friction(mut self, friction: Box<dyn FrictionCurve>) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn current_offset(&self) -> f32 {
        self.current_offset
    }

    /// Offset as presented to a reversed layout, `[0, d]` at rest
    pub fn display_offset(&self) -> f32 {
        if self.reversed {
            -self.current_offset
        } else {
            self.current_offset
        }
    }

    pub fn last_offset(&self) -> f32 {
        self.last_offset
    }

    pub fn prev_offset(&self) -> f32 {
        self.prev_offset
    }

    pub fn scrollable_distance(&self) -> f32 {
        self.scrollable_distance
    }

    pub fn viewport_length(&self) -> f32 {
        self.viewport_length
    }

    pub fn extent(&self) -> f32 {
        self.extent
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn source(&self) -> ScrollSource {
        self.scroll_source
    }

    pub fn set_source(&mut self, source: ScrollSource) {
        self.scroll_source = source;
    }

    pub fn edge_effect(&self) -> EdgeEffect {
        self.edge_effect
    }

    pub fn set_edge_effect(&mut self, edge_effect: EdgeEffect, effect_edge: EffectEdge) {
        self.edge_effect = edge_effect;
        self.effect_edge = effect_edge;
    }

    pub fn effect_edge(&self) -> EffectEdge {
        self.effect_edge
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn fade_amount(&self) -> f32 {
        self.fade_amount
    }

    pub fn set_controller_can_over_scroll(&mut self, can: bool) {
        self.controller_can_over_scroll = can;
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Consume the one-shot re-layout request
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Offset of the end boundary, `0` when nothing can scroll
    pub fn end_boundary(&self) -> f32 {
        if self.scrollable_distance >= 0.0 {
            -self.scrollable_distance
        } else {
            0.0
        }
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Refresh geometry from a layout pass. Returns true when the axis
    /// changed, which resets the offset to the start.
    pub fn set_layout(&mut self, axis: Axis, viewport_length: f32, extent: f32) -> bool {
        let axis_changed = axis != self.axis;
        if axis_changed {
            tracing::debug!("axis changed {:?} -> {:?}, resetting offset", self.axis, axis);
            self.axis = axis;
            self.current_offset = 0.0;
            self.last_offset = 0.0;
            self.prev_offset = 0.0;
        }
        let viewport_length = if viewport_length.is_finite() {
            viewport_length.max(0.0)
        } else {
            0.0
        };
        let extent = if extent.is_finite() { extent.max(0.0) } else { 0.0 };
        self.viewport_length = viewport_length;
        self.extent = extent;
        self.scrollable_distance = extent - viewport_length;
        axis_changed
    }

    /// Record the offset seen by this layout for the next reach check
    pub(crate) fn commit_layout(&mut self) {
        self.prev_offset = self.current_offset;
    }

    // =========================================================================
    // Boundary queries
    // =========================================================================

    pub fn is_at_top(&self) -> bool {
        self.current_offset >= 0.0
    }

    pub fn is_at_bottom(&self) -> bool {
        self.current_offset <= self.end_boundary()
    }

    /// Whether the offset lies past either boundary. `use_current` checks the
    /// live offset, otherwise the offset seen by the last layout.
    pub fn is_out_of_boundary(&self, use_current: bool) -> bool {
        let offset = if use_current {
            self.current_offset
        } else {
            self.prev_offset
        };
        if self.scrollable_distance > 0.0 {
            offset > 0.0 || offset < -self.scrollable_distance
        } else {
            offset != 0.0
        }
    }

    /// Split `delta` into the parts that would land past each boundary
    pub fn over_scroll_offset(&self, delta: f32) -> OverScrollOffset {
        let current = self.current_offset;
        let next = current + delta;
        let mut offset = OverScrollOffset::default();

        if current > 0.0 && next > 0.0 {
            offset.start = delta;
        } else if current > 0.0 && next <= 0.0 {
            offset.start = -current;
        } else if current <= 0.0 && next > 0.0 {
            offset.start = next;
        }

        let end = self.end_boundary();
        if current < end && next < end {
            offset.end = delta;
        } else if current < end && next >= end {
            offset.end = end - current;
        } else if current >= end && next < end {
            offset.end = next - end;
        }
        offset
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Clamp `position` into the resting range when the source or the edge
    /// effect forbids overscroll
    pub fn validate_offset(&self, source: ScrollSource, position: f32) -> f32 {
        if self.scrollable_distance <= 0.0 || source == ScrollSource::Jump {
            return position;
        }
        if self.edge_effect != EdgeEffect::Spring || source.is_rigid() {
            return position.clamp(-self.scrollable_distance, 0.0);
        }
        position
    }

    /// Damp `delta` while the offset is already stretched past an edge
    pub fn adjust_offset(&self, delta: f32, source: ScrollSource) -> f32 {
        if delta == 0.0 || self.viewport_length <= 0.0 || source.skips_friction() {
            return delta;
        }
        let current = self.current_offset;
        let past_start = current.max(0.0);
        let past_end = if self.scrollable_distance > 0.0 {
            (-self.scrollable_distance - current).max(0.0)
        } else {
            current.min(0.0).abs()
        };
        // moving back toward the content is never damped
        if (past_start > 0.0 && delta < 0.0) || (past_end > 0.0 && delta > 0.0) {
            return delta;
        }
        let past = past_start.max(past_end);
        if past <= 0.0 {
            return delta;
        }
        let gamma = (past - delta.abs()) / self.viewport_length;
        let adjusted = delta * self.friction.apply(gamma);
        tracing::trace!(
            "friction past={:.1} gamma={:.3} {:.2} -> {:.2}",
            past,
            gamma,
            delta,
            adjusted
        );
        adjusted
    }

    /// Gate a delta that pushes further past an edge. Returns false when the
    /// container must not move.
    pub fn handle_edge_effect(&mut self, delta: f32, source: ScrollSource) -> bool {
        let push_start = self.is_at_top() && delta > 0.0;
        let push_end = self.is_at_bottom() && delta < 0.0;
        if !push_start && !push_end {
            return true;
        }
        match self.edge_effect {
            EdgeEffect::Spring => {
                let edge_allowed = (push_start && self.effect_edge.allows_start())
                    || (push_end && self.effect_edge.allows_end());
                edge_allowed && source.can_spring_over_scroll(self.controller_can_over_scroll)
            }
            EdgeEffect::Fade => {
                if matches!(source, ScrollSource::Update | ScrollSource::Animation) {
                    self.fade_amount += delta.abs();
                    tracing::trace!("fade amount {:.1}", self.fade_amount);
                }
                false
            }
            EdgeEffect::None => false,
        }
    }

    /// Apply `delta` from `source`. Returns whether the update was accepted.
    pub fn update_offset(
        &mut self,
        delta: f32,
        source: ScrollSource,
        events: &mut ScrollEventHub,
    ) -> bool {
        self.scroll_source = source;
        self.last_offset = self.current_offset;
        if !delta.is_finite() {
            tracing::debug!("dropping non-finite delta {}", delta);
            return false;
        }

        let mut delta = delta;
        if source != ScrollSource::Jump {
            delta = self.adjust_offset(delta, source);
            if !self.handle_edge_effect(delta, source) {
                if self.is_out_of_boundary(true) {
                    self.mark_dirty();
                }
                return false;
            }
        }

        let current = self.current_offset;
        let will = self.validate_offset(source, current + delta);
        let user_offset = events.fire_will_scroll(self.axis, current - will, source);
        self.current_offset = self.validate_offset(source, current - user_offset);
        self.mark_dirty();

        let moved = self.last_offset - self.current_offset;
        events.fire_did_scroll(self.axis, moved, source);

        if self.is_crash_top() {
            self.handle_crash_top(events);
        } else if self.is_crash_bottom() {
            self.handle_crash_bottom(events);
        }
        true
    }

    /// Jump straight to `position` without clamping
    pub fn jump_to(&mut self, position: f32, events: &mut ScrollEventHub) -> bool {
        self.update_offset(position - self.current_offset, ScrollSource::Jump, events)
    }

    /// Clamp a stale offset into range after the content shrank
    pub(crate) fn clamp_to_bounds(&mut self) -> bool {
        let clamped = self
            .current_offset
            .clamp(self.end_boundary(), 0.0);
        if clamped != self.current_offset {
            tracing::debug!(
                "clamping stale offset {:.1} -> {:.1}",
                self.current_offset,
                clamped
            );
            self.current_offset = clamped;
            self.mark_dirty();
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glide_animation::QuadraticFriction;

    fn state(edge_effect: EdgeEffect, viewport: f32, distance: f32) -> ScrollableState {
        let mut state = ScrollableState::new(edge_effect, EffectEdge::All);
        state.set_layout(Axis::Vertical, viewport, viewport + distance);
        state
    }

    #[test]
    fn test_rigid_sources_stay_in_bounds() {
        let mut events = ScrollEventHub::new();
        let mut state = state(EdgeEffect::Spring, 500.0, 300.0);
        let deltas = [-120.0, -250.0, 80.0, 400.0, -1000.0, 15.0];
        for source in [ScrollSource::Bar, ScrollSource::Axis] {
            for delta in deltas {
                state.update_offset(delta, source, &mut events);
                let offset = state.current_offset();
                assert!((-300.0..=0.0).contains(&offset), "{source:?} {offset}");
            }
        }
    }

    #[test]
    fn test_drag_without_spring_clamps() {
        let mut events = ScrollEventHub::new();
        let mut state = state(EdgeEffect::None, 500.0, 300.0);
        for delta in [-200.0, -200.0, -50.0, 600.0, 30.0] {
            state.update_offset(delta, ScrollSource::Update, &mut events);
            assert!((-300.0..=0.0).contains(&state.current_offset()));
        }
    }

    #[test]
    fn test_edge_gate_rejects_push_at_edge() {
        let mut events = ScrollEventHub::new();
        let mut state = state(EdgeEffect::None, 500.0, 300.0);
        state.take_dirty();
        assert!(!state.update_offset(10.0, ScrollSource::Update, &mut events));
        assert_eq!(state.current_offset(), 0.0);
        assert!(!state.is_dirty());
    }

    #[test]
    fn test_spring_drag_overscrolls() {
        let mut events = ScrollEventHub::new();
        let mut state = state(EdgeEffect::Spring, 500.0, 300.0);
        assert!(state.update_offset(40.0, ScrollSource::Update, &mut events));
        assert_eq!(state.current_offset(), 40.0);
        assert!(state.is_out_of_boundary(true));
        assert!(!state.is_out_of_boundary(false));

        // bar drags never stretch
        assert!(!state.update_offset(10.0, ScrollSource::Bar, &mut events));
    }

    #[test]
    fn test_jump_is_unclamped() {
        let mut events = ScrollEventHub::new();
        let mut state = state(EdgeEffect::None, 500.0, 300.0);
        assert!(state.jump_to(-900.0, &mut events));
        assert_eq!(state.current_offset(), -900.0);
    }

    #[test]
    fn test_friction_scenario() {
        let mut state = state(EdgeEffect::Spring, 1000.0, 500.0);
        state.current_offset = 100.0;
        let adjusted = state.adjust_offset(50.0, ScrollSource::Update);
        assert!(adjusted.abs() < 50.0);
        assert!(adjusted > 0.0);
    }

    #[test]
    fn test_friction_never_amplifies() {
        let curves: [Box<dyn FrictionCurve>; 2] = [
            Box::new(ExponentialFriction::default()),
            Box::new(QuadraticFriction::default()),
        ];
        for curve in curves {
            let mut state = state(EdgeEffect::Spring, 800.0, 400.0).with_friction(curve);
            for past in [1.0, 20.0, 150.0, 790.0, 2000.0] {
                state.current_offset = past;
                for delta in [0.5, 5.0, 40.0, 300.0, 1200.0] {
                    let adjusted = state.adjust_offset(delta, ScrollSource::Update);
                    assert!(adjusted.abs() <= delta.abs());
                    assert!(adjusted >= 0.0);
                }
            }
        }
    }

    #[test]
    fn test_friction_damps_more_when_deeper() {
        let mut state = state(EdgeEffect::Spring, 1000.0, 500.0);
        let mut last = f32::MAX;
        for past in [50.0, 100.0, 200.0, 400.0, 800.0] {
            state.current_offset = -500.0 - past;
            let factor = state.adjust_offset(-10.0, ScrollSource::Update) / -10.0;
            assert!(factor < last);
            last = factor;
        }
    }

    #[test]
    fn test_friction_skips_recovery_and_animation() {
        let mut state = state(EdgeEffect::Spring, 1000.0, 500.0);
        state.current_offset = 100.0;
        assert_eq!(state.adjust_offset(-30.0, ScrollSource::Update), -30.0);
        assert_eq!(state.adjust_offset(30.0, ScrollSource::Animation), 30.0);

        state.viewport_length = 0.0;
        assert_eq!(state.adjust_offset(30.0, ScrollSource::Update), 30.0);
    }

    #[test]
    fn test_over_scroll_offset_split() {
        let mut state = state(EdgeEffect::Spring, 500.0, 100.0);
        state.current_offset = -10.0;
        assert_eq!(
            state.over_scroll_offset(30.0),
            OverScrollOffset {
                start: 20.0,
                end: 0.0
            }
        );
        state.current_offset = 15.0;
        assert_eq!(state.over_scroll_offset(-40.0).start, -15.0);
        state.current_offset = -90.0;
        assert_eq!(state.over_scroll_offset(-25.0).end, -15.0);
        state.current_offset = -120.0;
        assert_eq!(state.over_scroll_offset(50.0).end, 20.0);
    }

    #[test]
    fn test_no_scroll_content_is_out_of_boundary_when_moved() {
        let mut state = state(EdgeEffect::Spring, 500.0, -100.0);
        assert!(!state.is_out_of_boundary(true));
        state.current_offset = -3.0;
        assert!(state.is_out_of_boundary(true));
        assert_eq!(state.end_boundary(), 0.0);
    }

    #[test]
    fn test_will_scroll_override_applies() {
        let mut events = ScrollEventHub::new();
        events.on_will_scroll(|payload| Some(payload.offset_y * 0.5));
        let mut state = state(EdgeEffect::None, 500.0, 300.0);
        state.update_offset(-40.0, ScrollSource::Update, &mut events);
        assert_eq!(state.current_offset(), -20.0);
    }

    #[test]
    fn test_axis_change_resets_offset() {
        let mut events = ScrollEventHub::new();
        let mut state = state(EdgeEffect::None, 500.0, 300.0);
        state.update_offset(-100.0, ScrollSource::Update, &mut events);
        assert!(!state.set_layout(Axis::Vertical, 500.0, 800.0));
        assert_eq!(state.current_offset(), -100.0);
        assert!(state.set_layout(Axis::Horizontal, 500.0, 800.0));
        assert_eq!(state.current_offset(), 0.0);
    }

    #[test]
    fn test_display_offset_for_reversed_layout() {
        let mut events = ScrollEventHub::new();
        let mut state = state(EdgeEffect::None, 500.0, 300.0).with_reversed(true);
        state.update_offset(-120.0, ScrollSource::Update, &mut events);
        assert_eq!(state.display_offset(), 120.0);
    }
}
