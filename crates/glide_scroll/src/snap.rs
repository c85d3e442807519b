//! Snap engine
//!
//! Keeps the list of resting offsets a snapping container may settle at,
//! sorted descending from `0` to `-scrollable_distance`, and predicts the
//! correction that lands a gesture on one of them.

use glide_core::Dimension;
use serde::{Deserialize, Serialize};

use crate::offset::ScrollableState;
use crate::paging::paging_offset;

/// Corrections at or below this are not worth animating
pub const SPRING_ACCURACY: f32 = 0.1;

/// Intervals shorter than this produce no snap offsets
pub const SNAP_INTERVAL_MIN: f32 = 1.0;

/// Interval snapping stops generating offsets past this many entries
pub const MAX_SNAP_OFFSETS: usize = 1 << 20;

/// Where inside the viewport a snap boundary lines up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapAlign {
    #[default]
    None,
    Start,
    Center,
    End,
}

/// How snap boundaries are generated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapSource {
    /// Boundaries every `interval`
    Interval(Dimension),
    /// Explicit boundary positions measured from the content start
    Paginations(Vec<Dimension>),
}

impl Default for SnapSource {
    fn default() -> Self {
        SnapSource::Paginations(Vec::new())
    }
}

fn default_snap_to_side() -> (bool, bool) {
    (true, true)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SnapConfig {
    #[serde(default)]
    pub align: SnapAlign,
    #[serde(default)]
    pub source: SnapSource,
    /// Whether the first and last boundary attract the offset
    #[serde(default = "default_snap_to_side")]
    pub enable_snap_to_side: (bool, bool),
}

impl SnapConfig {
    pub fn interval(align: SnapAlign, interval: Dimension) -> Self {
        Self {
            align,
            source: SnapSource::Interval(interval),
            enable_snap_to_side: default_snap_to_side(),
        }
    }

    pub fn paginations(align: SnapAlign, positions: Vec<Dimension>) -> Self {
        Self {
            align,
            source: SnapSource::Paginations(positions),
            enable_snap_to_side: default_snap_to_side(),
        }
    }

    pub fn with_snap_to_side(mut self, start: bool, end: bool) -> Self {
        self.enable_snap_to_side = (start, end);
        self
    }
}

/// Direction hint from discrete input such as a rotary crown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SnapDirection {
    #[default]
    None,
    /// Toward the start of the content
    Forward,
    /// Toward the end of the content
    Backward,
}

#[derive(Debug, Clone, Default)]
pub struct SnapEngine {
    config: Option<SnapConfig>,
    paging: bool,
    offsets: Vec<f32>,
    last_page_length: f32,
    /// Geometry the offsets were built for
    built_for: Option<(f32, f32)>,
}

impl SnapEngine {
    pub fn new(config: Option<SnapConfig>, paging: bool) -> Self {
        Self {
            config,
            paging,
            ..Self::default()
        }
    }

    pub fn config(&self) -> Option<&SnapConfig> {
        self.config.as_ref()
    }

    /// Replace the configuration; offsets are rebuilt on the next layout
    pub fn set_config(&mut self, config: Option<SnapConfig>, paging: bool) {
        self.config = config;
        self.paging = paging;
        self.built_for = None;
    }

    pub fn is_paging(&self) -> bool {
        self.paging
    }

    /// Whether the container snaps at all
    pub fn is_enabled(&self) -> bool {
        self.paging
            || self
                .config
                .as_ref()
                .is_some_and(|config| config.align != SnapAlign::None)
    }

    pub fn offsets(&self) -> &[f32] {
        &self.offsets
    }

    pub fn last_page_length(&self) -> f32 {
        self.last_page_length
    }

    /// Rebuild when the geometry changed since the last build. Returns
    /// whether a rebuild happened.
    pub fn update(&mut self, viewport_length: f32, scrollable_distance: f32) -> bool {
        if self.built_for == Some((viewport_length, scrollable_distance)) {
            return false;
        }
        self.rebuild(viewport_length, scrollable_distance);
        true
    }

    pub fn rebuild(&mut self, viewport_length: f32, scrollable_distance: f32) {
        self.offsets.clear();
        self.last_page_length = 0.0;
        self.built_for = Some((viewport_length, scrollable_distance));
        if !self.is_enabled() || scrollable_distance <= 0.0 || viewport_length <= 0.0 {
            return;
        }

        let (align, source) = match &self.config {
            Some(config) if config.align != SnapAlign::None => (config.align, config.source.clone()),
            Some(config) => (SnapAlign::Start, config.source.clone()),
            None => (
                SnapAlign::Start,
                SnapSource::Interval(Dimension::Px(viewport_length)),
            ),
        };
        match source {
            SnapSource::Interval(interval) => {
                let interval = interval.resolve(viewport_length);
                self.build_interval(align, interval, viewport_length, scrollable_distance);
            }
            SnapSource::Paginations(positions) => {
                let positions: Vec<f32> = positions
                    .iter()
                    .map(|position| position.resolve(viewport_length))
                    .collect();
                self.build_paginations(align, &positions, viewport_length, scrollable_distance);
            }
        }
        tracing::debug!(
            "snap offsets rebuilt: {} entries, last page {:.1}",
            self.offsets.len(),
            self.last_page_length
        );
    }

    fn build_interval(&mut self, align: SnapAlign, interval: f32, viewport: f32, distance: f32) {
        if !interval.is_finite() || interval < SNAP_INTERVAL_MIN {
            tracing::debug!("snap interval {} too small, snapping disabled", interval);
            return;
        }
        // positions are stepped in f64 so far offsets stay distinct in f32
        let anchor = f64::from(match align {
            SnapAlign::Center => (viewport - interval) / 2.0,
            SnapAlign::End => viewport - interval,
            _ => 0.0,
        });
        let end = -distance;
        self.offsets.push(0.0);
        let mut step = 0u64;
        loop {
            let offset = (anchor - step as f64 * f64::from(interval)) as f32;
            if offset <= end {
                break;
            }
            if self.offsets.len() >= MAX_SNAP_OFFSETS {
                tracing::warn!(
                    "snap interval {} yields more than {} offsets, truncating",
                    interval,
                    MAX_SNAP_OFFSETS
                );
                break;
            }
            if self.offsets.last().is_some_and(|&last| offset < last) {
                self.offsets.push(offset);
            }
            step += 1;
        }
        let last_inner = self.offsets.last().copied().unwrap_or(0.0);
        let gap = last_inner - end;
        if gap < interval {
            self.last_page_length = gap;
        }
        self.offsets.push(end);
    }

    fn build_paginations(&mut self, align: SnapAlign, positions: &[f32], viewport: f32, distance: f32) {
        let end = -distance;
        let extent = distance + viewport;
        let mut bounds = Vec::with_capacity(positions.len() + 2);
        bounds.push(0.0);
        for &position in positions {
            let last = bounds.last().copied().unwrap_or(0.0);
            if !position.is_finite() || position <= last || position >= extent {
                tracing::trace!("skipping pagination boundary {}", position);
                continue;
            }
            bounds.push(position);
        }
        bounds.push(extent);

        self.offsets.push(0.0);
        for pair in bounds.windows(2) {
            let (current, next) = (pair[0], pair[1]);
            let offset = match align {
                SnapAlign::Center => (viewport - (current + next)) / 2.0,
                SnapAlign::End => viewport - next,
                _ => -current,
            };
            if offset >= 0.0 {
                continue;
            }
            if offset <= end {
                break;
            }
            self.offsets.push(offset);
        }
        self.offsets.push(end);
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Correction to add to an in-flight delta so the gesture ends on a snap
    /// offset. None when the container should not snap.
    pub fn calc_predict_snap_offset(
        &self,
        state: &ScrollableState,
        delta: f32,
        drag_distance: f32,
        velocity: f32,
        direction: SnapDirection,
    ) -> Option<f32> {
        let offsets = &self.offsets;
        if offsets.len() < 2 {
            return None;
        }
        if direction != SnapDirection::None {
            return self.calc_predict_next_snap_offset(state, delta, direction);
        }

        let current = state.current_offset();
        let final_position = if self.paging {
            paging_offset(
                current,
                drag_distance,
                velocity,
                state.viewport_length(),
                state.scrollable_distance(),
                self.last_page_length,
            )
        } else {
            current + delta
        };

        let (snap_to_start, snap_to_end) = self
            .config
            .as_ref()
            .map_or((true, true), |config| config.enable_snap_to_side);
        let second = offsets[1];
        let second_last = offsets[offsets.len() - 2];
        if !snap_to_start && (final_position > second || current > second) {
            return None;
        }
        if !snap_to_end && (final_position < second_last || current < second_last) {
            return None;
        }

        let first = offsets[0];
        let last = offsets[offsets.len() - 1];
        let mut target = final_position;
        if final_position < first && final_position > last {
            for pair in offsets.windows(2) {
                let (start, end) = (pair[0], pair[1]);
                if final_position <= start && final_position >= end {
                    target = if final_position - end < start - final_position {
                        end
                    } else {
                        start
                    };
                    break;
                }
            }
        }
        tracing::trace!(
            "predict snap current={:.1} final={:.1} target={:.1}",
            current,
            final_position,
            target
        );
        Some(target - current)
    }

    /// Correction to the neighboring snap offset in `direction`
    pub fn calc_predict_next_snap_offset(
        &self,
        state: &ScrollableState,
        delta: f32,
        direction: SnapDirection,
    ) -> Option<f32> {
        let offsets = &self.offsets;
        let len = offsets.len();
        if len < 2 || direction == SnapDirection::None {
            return None;
        }
        let current = state.current_offset();
        let target = current + delta;
        if direction == SnapDirection::Backward && target <= offsets[len - 1] {
            return Some(-state.scrollable_distance() - current);
        }
        if direction == SnapDirection::Forward && target >= offsets[0] {
            return Some(-current);
        }

        let (mut start, mut end) = (0usize, len);
        while start < end {
            let mid = (start + end) / 2;
            if offsets[mid] < target {
                end = mid;
            } else if offsets[mid] > target {
                start = mid + 1;
            } else {
                let next = match direction {
                    SnapDirection::Forward => offsets[mid.saturating_sub(1)],
                    _ => offsets[(mid + 1).min(len - 1)],
                };
                return Some(next - current);
            }
        }
        let next = match direction {
            SnapDirection::Forward => offsets[start.saturating_sub(1)],
            _ => offsets[start.min(len - 1)],
        };
        Some(next - current)
    }
}
