//! Web content negotiator
//!
//! Embedded web content scrolls natively inside its own engine. The
//! [`WebNegotiator`] sits between that engine and the surrounding
//! scrollables: every engine offset and release velocity is filtered
//! through the nested modes first, and only what the parents leave over is
//! applied to the page.
//!
//! Engine values use the content convention (positive scrolls toward the
//! end of the page) and are physical, so horizontal values flip under a
//! right-to-left direction.

use std::any::Any;

use glide_core::events::event_types;
use glide_core::{Axis, Size, StateTransitions, TextDirection};

use crate::edge::{EdgeEffect, EffectEdge};
use crate::events::ScrollEventHub;
use crate::nested::{
    ContainerKind, GesturePhase, NestableScrollContainer, NestedScrollMode, NestedScrollOptions,
    NestedScrollOptionsExt, NestedState, ParentsMap, ScrollResult,
};
use crate::offset::{near_zero, ScrollableState};
use crate::source::ScrollSource;
use crate::tree::{NodeId, ScrollChain};

#[derive(Debug)]
pub struct WebNegotiator {
    expected_axis: Axis,
    direction: TextDirection,
    nested: NestedScrollOptionsExt,
    parents: ParentsMap,
    vertical: ScrollableState,
    horizontal: ScrollableState,
    events: ScrollEventHub,
    phase: GesturePhase,
    /// The parent reported its edge on the previous parent-first offset
    is_parent_reach_edge: bool,
    is_first_fling_velocity: bool,
    is_drag_end: bool,
}

impl WebNegotiator {
    pub fn new(nested: NestedScrollOptionsExt) -> Self {
        let mut vertical = ScrollableState::new(EdgeEffect::None, EffectEdge::All);
        let mut horizontal = ScrollableState::new(EdgeEffect::None, EffectEdge::All);
        vertical.set_layout(Axis::Vertical, 0.0, 0.0);
        horizontal.set_layout(Axis::Horizontal, 0.0, 0.0);
        Self {
            expected_axis: Axis::Vertical,
            direction: TextDirection::default(),
            nested,
            parents: ParentsMap::default(),
            vertical,
            horizontal,
            events: ScrollEventHub::new(),
            phase: GesturePhase::Idle,
            is_parent_reach_edge: false,
            is_first_fling_velocity: true,
            is_drag_end: false,
        }
    }

    pub fn with_direction(mut self, direction: TextDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Axis the current gesture scrolls along
    pub fn set_expected_axis(&mut self, axis: Axis) {
        self.expected_axis = match axis {
            Axis::Horizontal => Axis::Horizontal,
            _ => Axis::Vertical,
        };
    }

    pub fn expected_axis(&self) -> Axis {
        self.expected_axis
    }

    pub fn set_nested_scroll_ext(&mut self, nested: NestedScrollOptionsExt) {
        self.nested = nested;
    }

    /// Page viewport and document size as reported by the engine
    pub fn set_layout(&mut self, viewport: Size, content: Size) {
        self.vertical
            .set_layout(Axis::Vertical, viewport.height, content.height);
        self.horizontal
            .set_layout(Axis::Horizontal, viewport.width, content.width);
    }

    /// Page offset along `axis`
    pub fn offset(&self, axis: Axis) -> f32 {
        self.state(axis).current_offset()
    }

    pub fn events_mut(&mut self) -> &mut ScrollEventHub {
        &mut self.events
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn parents(&self) -> &ParentsMap {
        &self.parents
    }

    fn state(&self, axis: Axis) -> &ScrollableState {
        if axis.is_horizontal() {
            &self.horizontal
        } else {
            &self.vertical
        }
    }

    fn options(&self) -> NestedScrollOptions {
        self.nested.for_axis(self.expected_axis)
    }

    fn parent_for(&self, chain: &ScrollChain<'_>, axis: Axis) -> Option<NodeId> {
        let parent = *self.parents.get(&axis)?;
        chain.kind(parent).map(|_| parent)
    }

    /// Engine value to a delta in offset convention
    fn to_delta(&self, engine_value: f32) -> f32 {
        let direct = if self.direction.is_rtl() && self.expected_axis.is_horizontal() {
            -engine_value
        } else {
            engine_value
        };
        -direct
    }

    /// Move the page itself. Returns whether it moved.
    fn scroll_locally(&mut self, delta: f32) -> bool {
        if near_zero(delta) {
            return false;
        }
        let state = if self.expected_axis.is_horizontal() {
            &mut self.horizontal
        } else {
            &mut self.vertical
        };
        let before = state.current_offset();
        state.update_offset(delta, ScrollSource::Update, &mut self.events);
        state.current_offset() != before
    }

    // =========================================================================
    // Engine filters
    // =========================================================================

    /// Offer an engine scroll offset to the nested parent. Returns true when
    /// the nested machinery consumed it and the engine must not scroll.
    pub fn filter_scroll_event_handle_offset(&mut self, chain: &mut ScrollChain<'_>, offset: f32) -> bool {
        let delta = self.to_delta(offset);
        if near_zero(delta) {
            return false;
        }
        let Some(parent) = self.parent_for(chain, self.expected_axis) else {
            return self.scroll_locally(delta);
        };

        // an overscrolled ancestor recovers first
        let remain = chain
            .handle_scroll(parent, delta, ScrollSource::Update, NestedState::ChildCheckOverScroll, 0.0)
            .map_or(delta, |probe| probe.remain);
        if near_zero(remain) {
            return true;
        }

        match self.options().mode_for(remain) {
            NestedScrollMode::ParentFirst => {
                let Some(result) =
                    chain.handle_scroll(parent, remain, ScrollSource::Update, NestedState::ChildScroll, 0.0)
                else {
                    return self.scroll_locally(remain);
                };
                if self.is_parent_reach_edge && result.reach_edge {
                    return false;
                }
                self.is_parent_reach_edge = result.reach_edge;
                self.scroll_locally(result.remain);
                true
            }
            NestedScrollMode::Parallel => {
                let before = chain.tree().container(parent).map(|c| c.current_offset());
                chain.handle_scroll(parent, remain, ScrollSource::Update, NestedState::ChildScroll, 0.0);
                let after = chain.tree().container(parent).map(|c| c.current_offset());
                let local_moved = self.scroll_locally(remain);
                local_moved || before != after
            }
            _ => self.scroll_locally(remain),
        }
    }

    /// Engine offset entry point; anything the filter leaves is applied to
    /// the page, and self-first leftovers go to the parent.
    pub fn handle_engine_offset(&mut self, chain: &mut ScrollChain<'_>, offset: f32) -> bool {
        if self.filter_scroll_event_handle_offset(chain, offset) {
            return true;
        }
        let delta = self.to_delta(offset);
        if near_zero(delta) {
            return false;
        }
        if self.scroll_locally(delta) {
            return true;
        }
        let Some(parent) = self.parent_for(chain, self.expected_axis) else {
            return false;
        };
        if self.options().mode_for(delta) != NestedScrollMode::SelfFirst {
            return false;
        }
        chain
            .handle_scroll(parent, delta, ScrollSource::Update, NestedState::ChildScroll, 0.0)
            .is_some_and(|result| !near_zero(delta - result.remain))
    }

    /// Offer a release velocity (engine convention) to the nested parent.
    /// Returns true when a parent took over the fling.
    pub fn filter_scroll_event_handle_velocity(&mut self, chain: &mut ScrollChain<'_>, velocity: f32) -> bool {
        let velocity = self.to_delta(velocity);
        let Some(parent) = self.parent_for(chain, self.expected_axis) else {
            return false;
        };
        if chain.out_of_boundary(parent) {
            return chain.handle_scroll_velocity(parent, velocity).unwrap_or(false);
        }
        match self.options().mode_for(velocity) {
            NestedScrollMode::ParentFirst => {
                if self.is_parent_reach_edge || !self.is_first_fling_velocity {
                    return false;
                }
                self.is_first_fling_velocity = false;
                chain.handle_scroll_velocity(parent, velocity).unwrap_or(false)
            }
            NestedScrollMode::Parallel => {
                if self.is_first_fling_velocity {
                    self.is_first_fling_velocity = false;
                    chain.handle_scroll_velocity(parent, velocity);
                }
                false
            }
            _ => false,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub fn on_scroll_start(&mut self, chain: &mut ScrollChain<'_>, position: f32) {
        self.parents = chain.resolve_parents();
        self.is_parent_reach_edge = false;
        self.is_first_fling_velocity = true;
        self.is_drag_end = false;
        if self.phase.apply(event_types::SCROLL_START) {
            self.events
                .fire_scroll_start(self.offset(self.expected_axis));
        }
        if !self.options().need_parent() {
            return;
        }
        if let Some(parent) = self.parent_for(chain, self.expected_axis) {
            chain.on_scroll_start_recursive(parent, position, 0.0);
        }
    }

    pub fn on_drag_end(&mut self, chain: &mut ScrollChain<'_>) {
        if self.is_drag_end {
            return;
        }
        self.is_drag_end = true;
        if let Some(parent) = self.parent_for(chain, self.expected_axis) {
            chain.on_scroll_drag_end_recursive(parent);
        }
    }

    pub fn on_scroll_end(&mut self, chain: &mut ScrollChain<'_>, velocity: Option<f32>) {
        if !self.phase.apply(event_types::SCROLL_END) {
            return;
        }
        if self.options().need_parent() {
            if let Some(parent) = self.parent_for(chain, self.expected_axis) {
                chain.on_scroll_end_recursive(parent, velocity);
            }
        }
        self.events.fire_scroll_stop(self.offset(self.expected_axis));
        self.phase.apply(event_types::ANIMATION_SETTLED);
    }

    pub fn on_touch_cancel(&mut self, chain: &mut ScrollChain<'_>) {
        if !self.phase.is_active() {
            return;
        }
        if self.options().need_parent() {
            if let Some(parent) = self.parent_for(chain, self.expected_axis) {
                chain.on_scroll_end_recursive(parent, None);
            }
        }
        self.events.fire_scroll_stop(self.offset(self.expected_axis));
        self.phase.apply(event_types::TOUCH_CANCEL);
    }
}

impl NestableScrollContainer for WebNegotiator {
    fn kind(&self) -> ContainerKind {
        ContainerKind::Web
    }

    fn axis(&self) -> Axis {
        Axis::Free
    }

    fn input_axis(&self) -> Axis {
        self.expected_axis
    }

    fn nested_scroll(&self) -> NestedScrollOptions {
        self.options()
    }

    fn nested_parent(&self) -> Option<NodeId> {
        self.parents.get(&self.expected_axis).copied()
    }

    fn set_nested_parent(&mut self, parent: Option<NodeId>) {
        match parent {
            Some(parent) => {
                self.parents.insert(self.expected_axis, parent);
            }
            None => {
                self.parents.remove(&self.expected_axis);
            }
        }
    }

    fn current_offset(&self) -> f32 {
        self.offset(self.expected_axis)
    }

    /// As a parent the page absorbs what it can along the expected axis
    fn handle_scroll(
        &mut self,
        _chain: &mut ScrollChain<'_>,
        offset: f32,
        _source: ScrollSource,
        state: NestedState,
        _velocity: f32,
    ) -> ScrollResult {
        if state == NestedState::ChildCheckOverScroll {
            return ScrollResult::new(offset, true);
        }
        let before = self.current_offset();
        self.scroll_locally(offset);
        let consumed = self.current_offset() - before;
        let remain = offset - consumed;
        ScrollResult::new(remain, !near_zero(remain))
    }

    fn handle_scroll_velocity(&mut self, _chain: &mut ScrollChain<'_>, _velocity: f32) -> bool {
        false
    }

    fn on_scroll_start_recursive(&mut self, chain: &mut ScrollChain<'_>, position: f32, _velocity: f32) {
        self.on_scroll_start(chain, position);
    }

    fn on_scroll_end_recursive(&mut self, chain: &mut ScrollChain<'_>, velocity: Option<f32>) {
        self.on_scroll_end(chain, velocity);
    }

    fn on_scroll_drag_end_recursive(&mut self, chain: &mut ScrollChain<'_>) {
        self.on_drag_end(chain);
    }

    fn nested_scroll_out_of_boundary(&self) -> bool {
        false
    }

    fn on_gesture_update(&mut self, chain: &mut ScrollChain<'_>, offset: f32, _source: ScrollSource) {
        let engine_value = -offset;
        let engine_value = if self.direction.is_rtl() && self.expected_axis.is_horizontal() {
            -engine_value
        } else {
            engine_value
        };
        self.phase.apply(event_types::SCROLL);
        self.handle_engine_offset(chain, engine_value);
    }

    fn on_gesture_end(&mut self, chain: &mut ScrollChain<'_>, velocity: f32) {
        self.on_drag_end(chain);
        let engine_velocity = -velocity;
        let engine_velocity = if self.direction.is_rtl() && self.expected_axis.is_horizontal() {
            -engine_velocity
        } else {
            engine_velocity
        };
        if !self.filter_scroll_event_handle_velocity(chain, engine_velocity) {
            tracing::trace!("web content keeps fling velocity {:.1}", velocity);
        }
        self.on_scroll_end(chain, Some(velocity));
    }

    fn on_touch_cancel(&mut self, chain: &mut ScrollChain<'_>) {
        WebNegotiator::on_touch_cancel(self, chain);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
