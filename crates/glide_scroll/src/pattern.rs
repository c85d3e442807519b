//! Scroll pattern
//!
//! [`ScrollPattern`] is the scrollable container behind lists, grids,
//! water-flows, and plain scroll views. It owns the offset state, the snap
//! engine, and a tick-driven animator, and implements the nested scroll
//! protocol against its resolved parent.
//!
//! # Lifecycle
//!
//! ```text
//! on_scroll_start_recursive ──> handle_scroll (Gesture)* ──> on_gesture_end
//!                                                              │
//!                         ┌────────────── fling / spring <─────┤
//!                         ▼                                    ▼
//!                on_tick ... finished ──> on_scroll_end ──> snap settle or stop
//! ```

use std::any::Any;

use glide_animation::{Animator, Fling, Frame, MotionKind, SpringConfig};
use glide_core::events::event_types;
use glide_core::{Axis, Size, StateTransitions};

use crate::config::ScrollConfig;
use crate::dump::{self, History, LayoutRecord};
use crate::edge::{EdgeEffect, EffectEdge, ScrollEdge};
use crate::events::ScrollEventHub;
use crate::nested::{
    ContainerKind, GesturePhase, NestableScrollContainer, NestedScrollMode, NestedScrollOptions,
    NestedState, ScrollResult,
};
use crate::offset::{near_zero, ScrollableState};
use crate::snap::{SnapDirection, SnapEngine, SPRING_ACCURACY};
use crate::source::{ScrollSource, ScrollState};
use crate::tree::{NodeId, ScrollChain};

/// Nested velocity samples older than this are dropped (seconds)
const NESTED_VELOCITY_STALE: f32 = 0.1;
/// Frame time assumed when the measured one is out of range (seconds)
const DEFAULT_FRAME_TIME: f32 = 0.016;
const MIN_FRAME_TIME: f32 = 0.001;

/// Geometry delivered by the layout engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutInfo {
    pub axis: Axis,
    pub viewport: Size,
    pub content: Size,
}

impl LayoutInfo {
    pub fn new(axis: Axis, viewport: Size, content: Size) -> Self {
        Self {
            axis,
            viewport,
            content,
        }
    }

    /// Layout along `axis` with main-axis lengths only
    pub fn along(axis: Axis, viewport_length: f32, content_length: f32) -> Self {
        let (viewport, content) = if axis.is_horizontal() {
            (
                Size::new(viewport_length, 0.0),
                Size::new(content_length, 0.0),
            )
        } else {
            (
                Size::new(0.0, viewport_length),
                Size::new(0.0, content_length),
            )
        };
        Self::new(axis, viewport, content)
    }
}

pub struct ScrollPattern {
    kind: ContainerKind,
    config: ScrollConfig,
    state: ScrollableState,
    events: ScrollEventHub,
    snap: SnapEngine,
    animator: Animator,
    /// Source tagged on spring frames
    animation_source: ScrollSource,
    phase: GesturePhase,
    nested_parent: Option<NodeId>,
    can_over_scroll: bool,
    nested_scrolling: bool,
    is_nested_interrupt: bool,
    scroll_start_fired: bool,
    drag_distance: f32,
    velocity: f32,
    nested_scroll_velocity: f32,
    /// Seconds since the last nested velocity sample
    nested_velocity_age: f32,
    layout_history: History<LayoutRecord>,
    first_layout: bool,
}

impl std::fmt::Debug for ScrollPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollPattern")
            .field("kind", &self.kind)
            .field("offset", &self.state.current_offset())
            .field("phase", &self.phase)
            .field("animator", &self.animator.kind())
            .field("nested_parent", &self.nested_parent)
            .finish_non_exhaustive()
    }
}

impl ScrollPattern {
    pub fn new(kind: ContainerKind, config: ScrollConfig) -> Self {
        let state = Self::build_state(&config);
        let snap = SnapEngine::new(config.snap.clone(), config.paging);
        Self {
            kind,
            config,
            state,
            events: ScrollEventHub::new(),
            snap,
            animator: Animator::new(),
            animation_source: ScrollSource::Animation,
            phase: GesturePhase::Idle,
            nested_parent: None,
            can_over_scroll: false,
            nested_scrolling: false,
            is_nested_interrupt: false,
            scroll_start_fired: false,
            drag_distance: 0.0,
            velocity: 0.0,
            nested_scroll_velocity: 0.0,
            nested_velocity_age: 0.0,
            layout_history: History::default(),
            first_layout: true,
        }
    }

    fn build_state(config: &ScrollConfig) -> ScrollableState {
        let mut state = ScrollableState::new(config.edge_effect, config.effect_edge)
            .with_friction(config.friction.build())
            .with_reversed(config.reversed);
        state.set_controller_can_over_scroll(config.animate_can_over_scroll);
        state
    }

    /// Apply a new configuration, keeping the current offset
    pub fn set_config(&mut self, config: ScrollConfig) {
        self.state.set_edge_effect(config.edge_effect, config.effect_edge);
        self.state.friction = config.friction.build();
        self.state.reversed = config.reversed;
        self.state
            .set_controller_can_over_scroll(config.animate_can_over_scroll);
        self.snap.set_config(config.snap.clone(), config.paging);
        self.snap
            .update(self.state.viewport_length(), self.state.scrollable_distance());
        self.config = config;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    pub fn state(&self) -> &ScrollableState {
        &self.state
    }

    pub fn events(&self) -> &ScrollEventHub {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut ScrollEventHub {
        &mut self.events
    }

    pub fn snap(&self) -> &SnapEngine {
        &self.snap
    }

    /// Offset as seen by the renderer
    pub fn offset(&self) -> f32 {
        self.state.display_offset()
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn is_animating(&self) -> bool {
        !self.animator.is_idle()
    }

    pub fn animation_kind(&self) -> Option<MotionKind> {
        self.animator.kind()
    }

    pub fn can_over_scroll(&self) -> bool {
        self.can_over_scroll
    }

    pub fn is_scroll_snap(&self) -> bool {
        self.snap.is_enabled()
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.state.source().scroll_state()
    }

    /// Velocity to continue with, preferring a fresher nested sample
    pub fn current_velocity(&self) -> f32 {
        let nested = self.nested_scroll_velocity();
        if nested.abs() > self.velocity.abs() {
            nested
        } else {
            self.velocity
        }
    }

    fn nested_scroll_velocity(&self) -> f32 {
        if near_zero(self.nested_scroll_velocity)
            || self.nested_velocity_age >= NESTED_VELOCITY_STALE
        {
            0.0
        } else {
            self.nested_scroll_velocity
        }
    }

    /// Parent id that still resolves to an available container
    fn live_parent(&self, chain: &ScrollChain<'_>) -> Option<NodeId> {
        let parent = self.nested_parent?;
        if chain.kind(parent).is_none() {
            tracing::debug!("nested parent {:?} is gone, scrolling alone", parent);
            return None;
        }
        Some(parent)
    }

    fn parent_is_scrollable(chain: &ScrollChain<'_>, parent: NodeId) -> bool {
        chain.kind(parent).is_some_and(|kind| kind.is_scrollable())
    }

    /// Offer `offset` to `parent`. A parent that cannot be reached consumes
    /// nothing.
    fn offer(
        &self,
        chain: &mut ScrollChain<'_>,
        parent: NodeId,
        offset: f32,
        source: ScrollSource,
        state: NestedState,
    ) -> ScrollResult {
        chain
            .handle_scroll(parent, offset, source, state, self.current_velocity())
            .unwrap_or(ScrollResult::new(offset, false))
    }

    fn controller_animating(&self) -> bool {
        !self.animator.is_idle() && self.animation_source == ScrollSource::AnimationController
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Refresh geometry after a layout pass. Returns whether the container
    /// needs to be redrawn.
    pub fn on_layout(&mut self, info: LayoutInfo) -> bool {
        let viewport_length = info.viewport.main(info.axis);
        let extent = info.content.main(info.axis);
        let geometry_changed = self.first_layout
            || viewport_length != self.state.viewport_length()
            || extent != self.state.extent();
        let axis_changed = self.state.set_layout(info.axis, viewport_length, extent);
        if axis_changed {
            self.animator.stop();
        }
        self.snap
            .update(self.state.viewport_length(), self.state.scrollable_distance());

        if self.animator.is_idle() && !self.phase.is_active() && self.state.is_out_of_boundary(true)
        {
            if self.state.edge_effect() == EdgeEffect::Spring {
                self.check_restart_spring();
            } else {
                self.state.clamp_to_bounds();
            }
        }

        let offset = self.state.current_offset();
        if self.state.reach_start(self.first_layout) {
            self.events.fire_reach_start(offset);
        }
        if self.state.reach_end(self.first_layout) {
            self.events.fire_reach_end(offset);
        }
        self.state.commit_layout();
        self.first_layout = false;
        self.layout_history.push(LayoutRecord {
            axis: self.state.axis(),
            viewport_length: self.state.viewport_length(),
            extent: self.state.extent(),
            scrollable_distance: self.state.scrollable_distance(),
            offset,
        });

        let dirty = self.state.take_dirty();
        dirty || geometry_changed || axis_changed
    }

    // =========================================================================
    // Programmatic scrolling
    // =========================================================================

    /// Move to `position` immediately, clamped to the content
    pub fn scroll_to(&mut self, position: f32) -> bool {
        self.animator.stop();
        let target = position.clamp(self.state.end_boundary(), 0.0);
        self.state.jump_to(target, &mut self.events)
    }

    /// Animate to `position`
    pub fn animate_to(&mut self, position: f32) {
        let target = if self.config.animate_can_over_scroll {
            position
        } else {
            position.clamp(self.state.end_boundary(), 0.0)
        };
        let current = self.state.current_offset();
        if (target - current).abs() <= SPRING_ACCURACY {
            return;
        }
        self.animator.stop();
        self.animation_source = ScrollSource::AnimationController;
        self.fire_scroll_start();
        self.animator
            .spring_to(SpringConfig::snap(), current, target, 0.0);
    }

    pub fn scroll_to_edge(&mut self, edge: ScrollEdge, smooth: bool) {
        let target = if edge.is_start() {
            0.0
        } else {
            self.state.end_boundary()
        };
        if smooth {
            self.animate_to(target);
        } else {
            self.scroll_to(target);
        }
    }

    /// Move one viewport toward the end, or toward the start when `reverse`
    pub fn scroll_page(&mut self, reverse: bool, smooth: bool) {
        let page = self.state.viewport_length();
        let current = self.state.current_offset();
        let target = if reverse { current + page } else { current - page };
        if smooth {
            self.animate_to(target);
        } else {
            self.scroll_to(target);
        }
    }

    /// Start a fling as if the user released at `velocity`
    pub fn fling(&mut self, chain: &mut ScrollChain<'_>, velocity: f32) {
        self.animator.stop();
        if self.state.is_out_of_boundary(true) {
            self.handle_over_scroll(chain, velocity);
        } else {
            self.on_scroll_start_recursive_inner(chain, 0.0, velocity);
            if !self.start_fling(velocity) {
                self.on_scroll_end_recursive_inner(chain, Some(velocity));
            }
        }
    }

    /// Cancel any running animation and report the stop
    pub fn stop_animation(&mut self) {
        if self.animator.stop().is_none() {
            return;
        }
        self.velocity = 0.0;
        self.state.set_source(ScrollSource::None);
        self.fire_scroll_stop();
    }

    // =========================================================================
    // Scroll events
    // =========================================================================

    fn fire_scroll_start(&mut self) {
        if !self.scroll_start_fired {
            self.scroll_start_fired = true;
            self.events.fire_scroll_start(self.state.current_offset());
        }
    }

    fn fire_scroll_stop(&mut self) {
        if self.scroll_start_fired {
            self.scroll_start_fired = false;
            self.events.fire_scroll_stop(self.state.current_offset());
        }
        self.phase.apply(event_types::SCROLL_END);
        self.phase.apply(event_types::ANIMATION_SETTLED);
    }

    fn execute_scroll_frame_begin(&mut self, offset: &mut f32, source: ScrollSource) {
        let state = if source == ScrollSource::Animation {
            ScrollState::Fling
        } else {
            ScrollState::Scroll
        };
        *offset = -self.events.fire_scroll_frame_begin(-*offset, state);
    }

    /// Apply `offset` locally. The start marker only announces the gesture.
    fn handle_scroll_impl(&mut self, offset: f32, source: ScrollSource) -> bool {
        if source == ScrollSource::Start {
            self.animator.stop();
            self.fire_scroll_start();
            return true;
        }
        if self.controller_animating() && source != ScrollSource::AnimationController {
            tracing::trace!("ignoring {:?} delta during programmatic animation", source);
            return false;
        }
        self.state.update_offset(offset, source, &mut self.events)
    }

    fn update_nested_scroll_velocity(&mut self, offset: f32, state: NestedState) {
        if state == NestedState::Gesture {
            return;
        }
        let elapsed = self.nested_velocity_age;
        let elapsed = if !(MIN_FRAME_TIME..NESTED_VELOCITY_STALE).contains(&elapsed) {
            DEFAULT_FRAME_TIME
        } else {
            elapsed
        };
        self.nested_scroll_velocity = offset / elapsed;
        self.nested_velocity_age = 0.0;
    }

    // =========================================================================
    // Nested dispatch
    // =========================================================================

    /// Recover from overscroll before sharing a delta. Returns true when
    /// nothing is left to dispatch.
    fn handle_out_boundary(
        &mut self,
        chain: &mut ScrollChain<'_>,
        offset: &mut f32,
        source: ScrollSource,
        state: NestedState,
        result: &mut ScrollResult,
    ) -> bool {
        if state != NestedState::Gesture && state != NestedState::ChildCheckOverScroll {
            return false;
        }
        let over = self.state.over_scroll_offset(*offset);
        let back_over = if *offset < 0.0 { over.start } else { over.end };
        if !near_zero(back_over) {
            *offset -= back_over;
            self.handle_scroll_impl(back_over, source);
        }
        if !near_zero(*offset) {
            if let Some(parent) = self.live_parent(chain) {
                let probe = self.offer(chain, parent, *offset, source, NestedState::ChildCheckOverScroll);
                *offset = probe.remain;
            }
        }
        if state == NestedState::ChildCheckOverScroll {
            *result = ScrollResult::new(*offset, true);
            *offset = 0.0;
        }
        near_zero(*offset)
    }

    fn handle_scroll_parent_first(
        &mut self,
        chain: &mut ScrollChain<'_>,
        parent: NodeId,
        offset: &mut f32,
        source: ScrollSource,
        state: NestedState,
    ) -> ScrollResult {
        if state == NestedState::ChildOverScroll {
            if !self.state.has_edge_effect(*offset) {
                return self.offer(chain, parent, *offset, source, NestedState::ChildOverScroll);
            }
            self.execute_scroll_frame_begin(offset, source);
            return ScrollResult::new(0.0, true);
        }
        let result = self.offer(chain, parent, *offset, source, NestedState::ChildScroll);
        *offset = result.remain;
        if near_zero(*offset) {
            self.can_over_scroll = !Self::parent_is_scrollable(chain, parent);
            return ScrollResult::new(0.0, false);
        }
        let all_offset = *offset;
        self.execute_scroll_frame_begin(offset, source);
        let mut remain = if offset.abs() < all_offset.abs() {
            all_offset - *offset
        } else {
            0.0
        };
        let over = self.state.over_scroll_offset(*offset);
        let over_offset = if *offset > 0.0 { over.start } else { over.end };
        remain += over_offset;
        if near_zero(remain) {
            self.can_over_scroll = false;
            return ScrollResult::new(0.0, false);
        }
        if state == NestedState::ChildScroll {
            *offset -= over_offset;
            self.can_over_scroll = false;
            return ScrollResult::new(remain, !near_zero(over_offset));
        }
        let mut parent_edge_effect = false;
        if !self.state.has_edge_effect(*offset) {
            let result = self.offer(chain, parent, remain, source, NestedState::ChildOverScroll);
            if near_zero(result.remain) {
                *offset -= over_offset;
                parent_edge_effect = near_zero(*offset) && result.reach_edge;
            }
        }
        self.can_over_scroll =
            (!near_zero(over_offset) && self.state.has_edge_effect(*offset)) || parent_edge_effect;
        ScrollResult::new(0.0, self.can_over_scroll)
    }

    fn handle_scroll_self_first(
        &mut self,
        chain: &mut ScrollChain<'_>,
        parent: NodeId,
        offset: &mut f32,
        source: ScrollSource,
        state: NestedState,
    ) -> ScrollResult {
        if state == NestedState::ChildOverScroll {
            let result = self.offer(chain, parent, *offset, source, NestedState::ChildOverScroll);
            if near_zero(result.remain) {
                *offset = 0.0;
                return result;
            }
            self.execute_scroll_frame_begin(offset, source);
            if !self.state.has_edge_effect(*offset) {
                return result;
            }
            return ScrollResult::new(0.0, true);
        }
        let all_offset = *offset;
        self.execute_scroll_frame_begin(offset, source);
        let remain = if offset.abs() < all_offset.abs() {
            all_offset - *offset
        } else {
            0.0
        };
        let over = self.state.over_scroll_offset(*offset);
        let over_offset = if *offset > 0.0 { over.start } else { over.end };
        if near_zero(over_offset) && near_zero(remain) {
            self.can_over_scroll = false;
            return ScrollResult::new(0.0, false);
        }
        *offset -= over_offset;
        let result = self.offer(
            chain,
            parent,
            over_offset + remain,
            source,
            NestedState::ChildScroll,
        );
        if near_zero(result.remain) {
            self.can_over_scroll = !Self::parent_is_scrollable(chain, parent);
            return ScrollResult::new(0.0, false);
        }
        if state == NestedState::ChildScroll {
            self.can_over_scroll = false;
            return result;
        }
        // the parent gets the first chance to overscroll
        let over_result =
            self.offer(chain, parent, result.remain, source, NestedState::ChildOverScroll);
        *offset += if over_offset.abs() < result.remain.abs() {
            over_offset
        } else {
            over_result.remain
        };
        let parent_edge_effect = result.reach_edge && near_zero(*offset);
        self.can_over_scroll =
            (!near_zero(over_offset) && self.state.has_edge_effect(*offset)) || parent_edge_effect;
        ScrollResult::new(0.0, self.can_over_scroll)
    }

    fn handle_scroll_self_only(
        &mut self,
        offset: &mut f32,
        source: ScrollSource,
        state: NestedState,
    ) -> ScrollResult {
        let all_offset = *offset;
        self.execute_scroll_frame_begin(offset, source);
        let mut remain = all_offset - *offset;
        let over = self.state.over_scroll_offset(*offset);
        let over_offset = if *offset > 0.0 { over.start } else { over.end };
        remain += over_offset;
        if near_zero(remain) {
            self.can_over_scroll = false;
            return ScrollResult::new(0.0, false);
        }
        let mut can_over_scroll = false;
        match state {
            NestedState::ChildScroll => *offset -= over_offset,
            NestedState::Gesture => {
                can_over_scroll = !near_zero(over_offset) && self.state.has_edge_effect(*offset);
            }
            _ => {
                if self.state.has_edge_effect(*offset) {
                    remain = 0.0;
                }
            }
        }
        self.can_over_scroll = can_over_scroll;
        ScrollResult::new(remain, !near_zero(over_offset))
    }

    fn handle_scroll_parallel(
        &mut self,
        chain: &mut ScrollChain<'_>,
        parent: NodeId,
        offset: &mut f32,
        source: ScrollSource,
        state: NestedState,
    ) -> ScrollResult {
        let mut remain = 0.0;
        if state == NestedState::ChildOverScroll {
            if self.state.edge_effect() == EdgeEffect::None {
                let result = self.offer(chain, parent, *offset, source, NestedState::ChildOverScroll);
                remain = result.remain;
                *offset = 0.0;
            } else {
                self.execute_scroll_frame_begin(offset, source);
            }
            return ScrollResult::new(remain, true);
        }

        let mut can_over_scroll = false;
        let parent_offset = *offset;
        self.execute_scroll_frame_begin(offset, source);
        let result = self.offer(chain, parent, parent_offset, source, NestedState::ChildScroll);

        let over = self.state.over_scroll_offset(*offset);
        let over_offset = if *offset > 0.0 { over.start } else { over.end };
        if !near_zero(over_offset) && result.reach_edge {
            if state == NestedState::ChildScroll {
                remain = over_offset;
                *offset -= over_offset;
            } else if self.state.edge_effect() == EdgeEffect::None {
                self.offer(chain, parent, result.remain, source, NestedState::ChildOverScroll);
                can_over_scroll = true;
                *offset -= over_offset;
            } else {
                can_over_scroll = true;
            }
        } else if !near_zero(over_offset) {
            *offset -= over_offset;
        }
        self.can_over_scroll = can_over_scroll;
        ScrollResult::new(remain, !near_zero(over_offset) && result.reach_edge)
    }

    // =========================================================================
    // Release and overscroll
    // =========================================================================

    /// Start a fling, or a spring straight onto the predicted snap offset
    fn start_fling(&mut self, velocity: f32) -> bool {
        let velocity = if near_zero(velocity) {
            self.current_velocity()
        } else {
            velocity
        };
        if velocity.abs() < self.config.velocity_threshold {
            return false;
        }
        let fling = Fling::new(velocity, self.config.deceleration, self.config.velocity_threshold);
        if self.snap.is_enabled() {
            let predicted = fling.predicted_distance();
            if let Some(correction) = self.snap.calc_predict_snap_offset(
                &self.state,
                predicted,
                self.drag_distance,
                velocity,
                SnapDirection::None,
            ) {
                let current = self.state.current_offset();
                self.drag_distance = 0.0;
                self.animation_source = ScrollSource::Animation;
                self.fire_scroll_start();
                self.animator
                    .spring_to(SpringConfig::snap(), current, current + correction, velocity);
                return true;
            }
        }
        self.animation_source = ScrollSource::Animation;
        self.fire_scroll_start();
        self.animator.fling(fling);
        true
    }

    fn can_spring_over_scroll(&self) -> bool {
        match self.state.effect_edge() {
            EffectEdge::All => true,
            EffectEdge::Start => self.state.is_at_top(),
            EffectEdge::End => self.state.is_at_bottom(),
        }
    }

    /// Spring toward the nearest edge, launched with `velocity`
    fn spring_to_edge(&mut self, velocity: f32) {
        let current = self.state.current_offset();
        let end = self.state.end_boundary();
        let target = if current >= 0.0 {
            0.0
        } else if current <= end || (current - end).abs() < current.abs() {
            end
        } else {
            0.0
        };
        self.animation_source = ScrollSource::AnimationSpring;
        self.fire_scroll_start();
        self.animator
            .spring_to(self.config.spring, current, target, velocity);
    }

    fn process_spring_effect(&mut self, chain: &mut ScrollChain<'_>, velocity: f32, need_restart: bool) {
        if self.state.edge_effect() != EdgeEffect::Spring {
            return;
        }
        if !self.state.is_out_of_boundary(true) && !self.can_over_scroll {
            self.on_scroll_end_recursive_inner(chain, Some(velocity));
            return;
        }
        if need_restart || self.animator.kind() != Some(MotionKind::Spring) {
            self.animator.stop();
            self.spring_to_edge(velocity);
        } else {
            let velocity = self.animator.velocity();
            self.spring_to_edge(velocity);
        }
    }

    /// Spring back if the offset was left past an edge with nothing running
    fn check_restart_spring(&mut self) {
        if self.state.edge_effect() != EdgeEffect::Spring {
            return;
        }
        if !self.animator.is_idle() || !self.state.is_out_of_boundary(true) {
            return;
        }
        tracing::debug!("restarting spring from {:.1}", self.state.current_offset());
        self.spring_to_edge(0.0);
    }

    /// Hand the release to an ancestor that is stretched past its edge
    fn handle_scrollable_over_scroll(&mut self, chain: &mut ScrollChain<'_>, velocity: f32) -> bool {
        let mut result = false;
        let mut ancestor = self.live_parent(chain);
        while let Some(id) = ancestor {
            if chain.out_of_boundary(id) {
                result = chain.handle_scroll_velocity(id, velocity).unwrap_or(false);
                break;
            }
            if !chain
                .nested_scroll(id)
                .is_some_and(|nested| nested.need_parent())
            {
                break;
            }
            ancestor = chain.nested_parent(id);
        }
        if result {
            self.on_scroll_end_recursive_inner(chain, Some(velocity));
        }
        result
    }

    fn handle_over_scroll(&mut self, chain: &mut ScrollChain<'_>, velocity: f32) -> bool {
        let out_of_boundary = self.state.is_out_of_boundary(true);
        let need_spring =
            self.state.edge_effect() == EdgeEffect::Spring && self.can_spring_over_scroll();
        let nested = self.config.nested;
        let parent = self
            .live_parent(chain)
            .filter(|_| nested.need_parent_for(velocity < 0.0) && !out_of_boundary);

        let Some(parent) = parent else {
            if need_spring && !self.controller_animating() {
                // the stop fires once the spring settles
                self.process_spring_effect(chain, velocity, true);
                return true;
            }
            self.on_scroll_end_recursive_inner(chain, Some(velocity));
            return false;
        };

        let parent_scrollable = Self::parent_is_scrollable(chain, parent);
        if parent_scrollable && self.handle_scrollable_over_scroll(chain, velocity) {
            return true;
        }
        if nested.mode_for(velocity) == NestedScrollMode::SelfFirst || !parent_scrollable {
            if chain.handle_scroll_velocity(parent, velocity).unwrap_or(false) {
                self.on_scroll_end();
                return true;
            }
            if need_spring {
                self.process_spring_effect(chain, velocity, false);
                return true;
            }
        }
        if need_spring {
            self.process_spring_effect(chain, velocity, false);
            return true;
        }
        if self.state.edge_effect() == EdgeEffect::Fade {
            self.on_scroll_end_recursive_inner(chain, Some(velocity));
            return false;
        }
        self.on_scroll_end();
        chain.handle_scroll_velocity(parent, velocity).unwrap_or(false)
    }

    // =========================================================================
    // Start / end
    // =========================================================================

    fn on_scroll_start_recursive_inner(&mut self, chain: &mut ScrollChain<'_>, position: f32, _velocity: f32) {
        self.is_nested_interrupt = false;
        self.handle_scroll_impl(position, ScrollSource::Start);
        if let Some(parent) = self.live_parent(chain) {
            if self.config.nested.need_parent() {
                let velocity = self.current_velocity();
                chain.on_scroll_start_recursive(parent, position, velocity);
            }
        }
    }

    fn on_scroll_end_recursive_inner(&mut self, chain: &mut ScrollChain<'_>, velocity: Option<f32>) {
        self.on_scroll_end();
        if let Some(parent) = self.live_parent(chain) {
            if self.config.nested.need_parent() || self.is_nested_interrupt {
                chain.on_scroll_end_recursive(parent, velocity);
            }
        }
        self.is_nested_interrupt = false;
    }

    fn on_scroll_end(&mut self) {
        self.phase.apply(event_types::SCROLL_END);
        self.state.set_source(ScrollSource::None);
        if self.scroll_snap_trigger() {
            return;
        }
        self.fire_scroll_stop();
    }

    /// Settle onto the nearest snap offset when at rest. Returns whether a
    /// settle animation started.
    pub fn scroll_snap_trigger(&mut self) -> bool {
        if self.scroll_state() != ScrollState::Idle || !self.animator.is_idle() {
            return false;
        }
        if !self.snap.is_enabled() {
            return false;
        }
        let Some(correction) = self.snap.calc_predict_snap_offset(
            &self.state,
            0.0,
            self.drag_distance,
            0.0,
            SnapDirection::None,
        ) else {
            return false;
        };
        self.drag_distance = 0.0;
        if correction.abs() <= SPRING_ACCURACY {
            return false;
        }
        let current = self.state.current_offset();
        tracing::debug!("snap settle {:.1} -> {:.1}", current, current + correction);
        self.fire_scroll_start();
        self.animation_source = ScrollSource::Animation;
        self.animator
            .spring_to(SpringConfig::snap(), current, current + correction, 0.0);
        true
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub fn dump(&self) -> serde_json::Value {
        serde_json::json!({
            "kind": self.kind,
            "axis": self.state.axis(),
            "offset": self.state.current_offset(),
            "scrollable_distance": self.state.scrollable_distance(),
            "viewport_length": self.state.viewport_length(),
            "edge_effect": self.state.edge_effect(),
            "effect_edge": self.state.effect_edge(),
            "nested": self.config.nested,
            "phase": format!("{:?}", self.phase),
            "source": self.state.source(),
            "snap": {
                "config": self.snap.config(),
                "paging": self.snap.is_paging(),
                "offsets": self.snap.offsets(),
                "last_page_length": self.snap.last_page_length(),
            },
            "layout_history": self.layout_history.to_json(),
            "events": self.events.history().to_json(),
        })
    }

    pub fn dump_text(&self) -> String {
        dump::to_text(&self.dump())
    }
}

impl NestableScrollContainer for ScrollPattern {
    fn kind(&self) -> ContainerKind {
        self.kind
    }

    fn axis(&self) -> Axis {
        self.state.axis()
    }

    fn nested_scroll(&self) -> NestedScrollOptions {
        self.config.nested
    }

    fn nested_parent(&self) -> Option<NodeId> {
        self.nested_parent
    }

    fn set_nested_parent(&mut self, parent: Option<NodeId>) {
        self.nested_parent = parent;
    }

    fn current_offset(&self) -> f32 {
        self.state.current_offset()
    }

    fn handle_scroll(
        &mut self,
        chain: &mut ScrollChain<'_>,
        offset: f32,
        source: ScrollSource,
        state: NestedState,
        _velocity: f32,
    ) -> ScrollResult {
        let mut result = ScrollResult::default();
        let mut offset = offset;
        let init_offset = offset;
        if near_zero(offset) {
            self.execute_scroll_frame_begin(&mut offset, source);
        } else if !self.handle_out_boundary(chain, &mut offset, source, state, &mut result) {
            let parent = self.live_parent(chain);
            let mode = self.config.nested.mode_for(offset);
            result = match (parent, mode) {
                (Some(parent), NestedScrollMode::ParentFirst) if !self.is_scroll_snap() => {
                    self.handle_scroll_parent_first(chain, parent, &mut offset, source, state)
                }
                (Some(parent), NestedScrollMode::SelfFirst) => {
                    self.handle_scroll_self_first(chain, parent, &mut offset, source, state)
                }
                (Some(parent), NestedScrollMode::Parallel) => {
                    self.handle_scroll_parallel(chain, parent, &mut offset, source, state)
                }
                _ => self.handle_scroll_self_only(&mut offset, source, state),
            };
        } else if state == NestedState::ChildCheckOverScroll {
            return result;
        }
        tracing::trace!(
            "handle_scroll {:?} {:?} init={:.2} processed={:.2} can_over_scroll={}",
            source,
            state,
            init_offset,
            offset,
            self.can_over_scroll
        );
        self.phase.apply(event_types::SCROLL);
        self.update_nested_scroll_velocity(offset, state);
        if offset != 0.0 {
            self.handle_scroll_impl(offset, source);
        }
        result
    }

    fn handle_scroll_velocity(&mut self, chain: &mut ScrollChain<'_>, velocity: f32) -> bool {
        // at an edge the release turns into overscroll instead of a fling
        self.nested_scrolling = false;
        let need_fling_at_edge = !((self.state.is_at_top() && velocity > 0.0)
            || (self.state.is_at_bottom() && velocity < 0.0));
        let out_of_boundary = self.state.is_out_of_boundary(true);
        tracing::trace!(
            "handle_scroll_velocity v={:.1} out={} fling_at_edge={}",
            velocity,
            out_of_boundary,
            need_fling_at_edge
        );
        if !out_of_boundary && need_fling_at_edge {
            return self.start_fling(velocity);
        }
        self.can_over_scroll = true;
        self.handle_over_scroll(chain, velocity) || self.state.edge_effect() == EdgeEffect::Fade
    }

    fn on_scroll_start_recursive(&mut self, chain: &mut ScrollChain<'_>, position: f32, velocity: f32) {
        let parents = chain.resolve_parents();
        let axis = match self.state.axis() {
            Axis::Free => Axis::Vertical,
            axis => axis,
        };
        self.nested_parent = parents.get(&axis).copied();
        self.phase.apply(event_types::SCROLL_START);
        self.drag_distance = 0.0;
        self.on_scroll_start_recursive_inner(chain, position, velocity);
        self.nested_scrolling = true;
        self.animator.stop();
    }

    fn on_scroll_end_recursive(&mut self, chain: &mut ScrollChain<'_>, velocity: Option<f32>) {
        if self.phase == GesturePhase::Idle {
            tracing::trace!("scroll end without an active gesture");
            return;
        }
        if !self.animator.is_idle() && !self.nested_scrolling {
            return;
        }
        self.on_scroll_end_recursive_inner(chain, velocity);
        self.nested_scrolling = false;
        self.check_restart_spring();
    }

    fn on_scroll_drag_end_recursive(&mut self, chain: &mut ScrollChain<'_>) {
        if let Some(parent) = self.live_parent(chain) {
            if self.config.nested.need_parent() {
                chain.on_scroll_drag_end_recursive(parent);
            }
        }
        self.check_restart_spring();
    }

    fn nested_scroll_out_of_boundary(&self) -> bool {
        self.state.is_out_of_boundary(true)
    }

    fn on_gesture_update(&mut self, chain: &mut ScrollChain<'_>, offset: f32, source: ScrollSource) {
        if self.state.axis() == Axis::None {
            return;
        }
        let offset = if self.state.is_reversed() { -offset } else { offset };
        if source == ScrollSource::Update {
            self.drag_distance += offset;
        }
        self.handle_scroll(chain, offset, source, NestedState::Gesture, 0.0);
    }

    fn on_gesture_end(&mut self, chain: &mut ScrollChain<'_>, velocity: f32) {
        let velocity = if self.state.is_reversed() {
            -velocity
        } else {
            velocity
        };
        self.velocity = velocity;
        self.on_scroll_drag_end_recursive(chain);
        if !self.handle_scroll_velocity(chain, velocity) {
            self.on_scroll_end_recursive(chain, Some(velocity));
        }
    }

    fn on_touch_cancel(&mut self, chain: &mut ScrollChain<'_>) {
        self.velocity = 0.0;
        self.on_scroll_end_recursive(chain, None);
    }

    fn on_tick(&mut self, chain: &mut ScrollChain<'_>, dt: f32) -> bool {
        self.nested_velocity_age += dt;
        let Some(frame) = self.animator.tick(dt) else {
            return false;
        };
        let before = self.state.current_offset();
        match frame {
            Frame::Fling {
                delta,
                velocity,
                finished,
            } => {
                self.velocity = velocity;
                if delta != 0.0 {
                    self.handle_scroll(chain, delta, ScrollSource::Animation, NestedState::Gesture, velocity);
                }
                let moved = self.state.current_offset() != before;
                if finished {
                    self.velocity = 0.0;
                    self.on_scroll_end_recursive_inner(chain, Some(0.0));
                } else if !moved && delta != 0.0 {
                    // blocked at an edge: the rest of the motion becomes overscroll
                    self.animator.stop();
                    self.can_over_scroll = true;
                    self.handle_over_scroll(chain, velocity);
                } else if self.state.is_out_of_boundary(true)
                    && self.state.edge_effect() == EdgeEffect::Spring
                {
                    self.process_spring_effect(chain, velocity, true);
                }
                moved
            }
            Frame::Spring {
                position,
                velocity,
                finished,
            } => {
                self.velocity = velocity;
                let delta = position - before;
                if delta != 0.0 {
                    let source = self.animation_source;
                    self.handle_scroll_impl(delta, source);
                }
                if finished {
                    self.velocity = 0.0;
                    self.on_scroll_end_recursive_inner(chain, Some(0.0));
                }
                self.state.current_offset() != before
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snap::{SnapAlign, SnapConfig};
    use crate::tree::ViewTree;
    use glide_core::Dimension;
    use std::cell::RefCell;
    use std::rc::Rc;

    const FRAME: f32 = 1.0 / 60.0;

    fn single(config: ScrollConfig, viewport: f32, content: f32) -> (ViewTree, NodeId) {
        let mut tree = ViewTree::new();
        let mut pattern = ScrollPattern::new(ContainerKind::List, config);
        pattern.on_layout(LayoutInfo::along(Axis::Vertical, viewport, content));
        let id = tree.insert_root("list", Some(Box::new(pattern)));
        (tree, id)
    }

    fn pattern(tree: &ViewTree, id: NodeId) -> &ScrollPattern {
        tree.container_as::<ScrollPattern>(id).unwrap()
    }

    fn run_until_idle(tree: &mut ViewTree) {
        for _ in 0..600 {
            tree.tick(FRAME);
        }
    }

    fn assert_near(actual: f32, expected: f32) {
        assert!((actual - expected).abs() < 0.01, "{actual} != {expected}");
    }

    fn record(tree: &mut ViewTree, id: NodeId) -> Rc<RefCell<Vec<&'static str>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let pattern = tree.container_as_mut::<ScrollPattern>(id).unwrap();
        {
            let log = log.clone();
            pattern.events_mut().on_scroll_start(move || log.borrow_mut().push("start"));
        }
        {
            let log = log.clone();
            pattern.events_mut().on_scroll_stop(move || log.borrow_mut().push("stop"));
        }
        log
    }

    #[test]
    fn test_first_layout_fires_reach_start() {
        let mut pattern = ScrollPattern::new(ContainerKind::Scroll, ScrollConfig::default());
        let reached = Rc::new(RefCell::new(0));
        {
            let reached = reached.clone();
            pattern.events_mut().on_reach_start(move || *reached.borrow_mut() += 1);
        }
        assert!(pattern.on_layout(LayoutInfo::along(Axis::Vertical, 500.0, 1000.0)));
        assert!(!pattern.on_layout(LayoutInfo::along(Axis::Vertical, 500.0, 1000.0)));
        assert_eq!(*reached.borrow(), 1);
    }

    #[test]
    fn test_drag_and_stop_events() {
        let (mut tree, id) = single(ScrollConfig::no_bounce(), 500.0, 1000.0);
        let log = record(&mut tree, id);
        tree.scroll_start(id, 0.0);
        tree.scroll_update(id, -40.0, ScrollSource::Update);
        tree.scroll_update(id, -60.0, ScrollSource::Update);
        assert_eq!(pattern(&tree, id).offset(), -100.0);
        tree.scroll_end(id, 0.0);
        assert_eq!(log.borrow().as_slice(), &["start", "stop"]);
        assert_eq!(pattern(&tree, id).phase(), GesturePhase::Idle);
    }

    #[test]
    fn test_fling_decelerates_and_stops() {
        let (mut tree, id) = single(ScrollConfig::no_bounce(), 500.0, 5000.0);
        let log = record(&mut tree, id);
        tree.scroll_start(id, 0.0);
        tree.scroll_update(id, -10.0, ScrollSource::Update);
        tree.scroll_end(id, -1200.0);
        assert!(pattern(&tree, id).is_animating());
        run_until_idle(&mut tree);
        let pattern = pattern(&tree, id);
        assert!(!pattern.is_animating());
        // v²/2a = 480 plus the drag
        assert!((pattern.offset() + 490.0).abs() < 20.0, "{}", pattern.offset());
        assert_eq!(log.borrow().as_slice(), &["start", "stop"]);
    }

    #[test]
    fn test_fling_stops_at_edge_without_bounce() {
        let (mut tree, id) = single(ScrollConfig::no_bounce(), 500.0, 700.0);
        tree.scroll_start(id, 0.0);
        tree.scroll_end(id, -3000.0);
        run_until_idle(&mut tree);
        let pattern = pattern(&tree, id);
        assert_eq!(pattern.offset(), -200.0);
        assert!(!pattern.is_animating());
    }

    #[test]
    fn test_overscroll_springs_back() {
        let (mut tree, id) = single(ScrollConfig::spring(), 500.0, 1000.0);
        tree.scroll_start(id, 0.0);
        tree.scroll_update(id, 60.0, ScrollSource::Update);
        assert!(pattern(&tree, id).offset() > 0.0);
        tree.scroll_end(id, 0.0);
        assert_eq!(pattern(&tree, id).animation_kind(), Some(MotionKind::Spring));
        run_until_idle(&mut tree);
        assert_eq!(pattern(&tree, id).offset(), 0.0);
        assert_eq!(pattern(&tree, id).phase(), GesturePhase::Idle);
    }

    #[test]
    fn test_snap_settles_after_drag() {
        let config = ScrollConfig::no_bounce()
            .with_snap(SnapConfig::interval(SnapAlign::Start, Dimension::Px(100.0)));
        let (mut tree, id) = single(config, 300.0, 800.0);
        let log = record(&mut tree, id);
        tree.scroll_start(id, 0.0);
        tree.scroll_update(id, -430.0, ScrollSource::Update);
        tree.touch_cancel(id);
        assert!(pattern(&tree, id).is_animating());
        // the stop waits for the settle
        assert_eq!(log.borrow().as_slice(), &["start"]);
        run_until_idle(&mut tree);
        assert_near(pattern(&tree, id).offset(), -400.0);
        assert_eq!(log.borrow().as_slice(), &["start", "stop"]);
    }

    #[test]
    fn test_snap_fling_lands_on_offset() {
        let config = ScrollConfig::no_bounce()
            .with_snap(SnapConfig::interval(SnapAlign::Start, Dimension::Px(100.0)));
        let (mut tree, id) = single(config, 300.0, 2000.0);
        tree.scroll_start(id, 0.0);
        tree.scroll_update(id, -20.0, ScrollSource::Update);
        tree.scroll_end(id, -1000.0);
        run_until_idle(&mut tree);
        // predicted rest at -353 rounds to the nearer -400
        assert_near(pattern(&tree, id).offset(), -400.0);
        assert!(!pattern(&tree, id).is_animating());
    }

    #[test]
    fn test_paging_advances_one_page() {
        let config = ScrollConfig::no_bounce().with_paging(true);
        let (mut tree, id) = single(config, 500.0, 2300.0);
        tree.scroll_start(id, 0.0);
        tree.scroll_update(id, -300.0, ScrollSource::Update);
        tree.touch_cancel(id);
        run_until_idle(&mut tree);
        assert_near(pattern(&tree, id).offset(), -500.0);
    }

    #[test]
    fn test_animate_to_and_scroll_page() {
        let mut pattern = ScrollPattern::new(ContainerKind::Scroll, ScrollConfig::default());
        pattern.on_layout(LayoutInfo::along(Axis::Vertical, 500.0, 2000.0));
        pattern.scroll_page(false, false);
        assert_eq!(pattern.offset(), -500.0);
        pattern.scroll_to_edge(ScrollEdge::Bottom, false);
        assert_eq!(pattern.offset(), -1500.0);
        pattern.scroll_to(200.0);
        assert_eq!(pattern.offset(), 0.0);

        let mut tree = ViewTree::new();
        let id = tree.insert_root("scroll", Some(Box::new(pattern)));
        tree.with_container_as::<ScrollPattern, _>(id, |pattern, _| pattern.animate_to(-700.0));
        run_until_idle(&mut tree);
        assert_near(tree.container_as::<ScrollPattern>(id).unwrap().offset(), -700.0);
    }

    #[test]
    fn test_stop_animation_reports_stop() {
        let mut pattern = ScrollPattern::new(ContainerKind::Scroll, ScrollConfig::default());
        pattern.on_layout(LayoutInfo::along(Axis::Vertical, 500.0, 2000.0));
        let stops = Rc::new(RefCell::new(0));
        {
            let stops = stops.clone();
            pattern.events_mut().on_scroll_stop(move || *stops.borrow_mut() += 1);
        }
        pattern.animate_to(-900.0);
        assert!(pattern.is_animating());
        pattern.stop_animation();
        assert!(!pattern.is_animating());
        assert_eq!(*stops.borrow(), 1);
        pattern.stop_animation();
        assert_eq!(*stops.borrow(), 1);
    }

    #[test]
    fn test_content_shrink_clamps_idle_offset() {
        let mut pattern = ScrollPattern::new(ContainerKind::List, ScrollConfig::no_bounce());
        pattern.on_layout(LayoutInfo::along(Axis::Vertical, 500.0, 2000.0));
        pattern.scroll_to(-1400.0);
        let reached = Rc::new(RefCell::new(0));
        {
            let reached = reached.clone();
            pattern.events_mut().on_reach_end(move || *reached.borrow_mut() += 1);
        }
        assert!(pattern.on_layout(LayoutInfo::along(Axis::Vertical, 500.0, 1200.0)));
        assert_eq!(pattern.offset(), -700.0);
        assert_eq!(*reached.borrow(), 1);
    }

    #[test]
    fn test_dump_contains_state() {
        let config = ScrollConfig::spring()
            .with_snap(SnapConfig::interval(SnapAlign::Start, Dimension::Px(100.0)));
        let mut pattern = ScrollPattern::new(ContainerKind::Grid, config);
        pattern.on_layout(LayoutInfo::along(Axis::Vertical, 300.0, 800.0));
        let value = pattern.dump();
        assert_eq!(value["kind"], "grid");
        assert_eq!(value["edge_effect"], "spring");
        assert_eq!(value["snap"]["offsets"].as_array().map(Vec::len), Some(6));
        assert_eq!(value["layout_history"].as_array().map(Vec::len), Some(1));
        assert!(pattern.dump_text().contains("scrollable_distance: 500.0"));
    }
}
