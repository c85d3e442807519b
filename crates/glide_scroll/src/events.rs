//! Scroll event hub
//!
//! User-facing callbacks fired by a scroll container. Payload offsets use
//! the content convention: positive amounts move toward the end of the
//! content, the opposite sign of an offset delta.

use glide_core::Axis;

use crate::dump::{EventRecord, History, ScrollEventKind};
use crate::edge::ScrollEdge;
use crate::source::{ScrollSource, ScrollState};

/// Payload for scroll callbacks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollEventPayload {
    pub offset_x: f32,
    pub offset_y: f32,
    pub state: ScrollState,
    pub source: ScrollSource,
}

impl ScrollEventPayload {
    /// Payload with `amount` placed on the main axis
    pub fn along(axis: Axis, amount: f32, source: ScrollSource) -> Self {
        let (offset_x, offset_y) = if axis.is_horizontal() {
            (amount, 0.0)
        } else {
            (0.0, amount)
        };
        Self {
            offset_x,
            offset_y,
            state: source.scroll_state(),
            source,
        }
    }

    pub fn main(&self, axis: Axis) -> f32 {
        if axis.is_horizontal() {
            self.offset_x
        } else {
            self.offset_y
        }
    }
}

pub type NotifyCallback = Box<dyn FnMut()>;
pub type ScrollCallback = Box<dyn FnMut(&ScrollEventPayload)>;
pub type EdgeCallback = Box<dyn FnMut(ScrollEdge)>;
/// Returns an amount to apply instead of the proposed one, or None to keep it
pub type WillScrollCallback = Box<dyn FnMut(&ScrollEventPayload) -> Option<f32>>;
/// Rewrites the amount a container is about to consume during nested dispatch
pub type FrameBeginCallback = Box<dyn FnMut(f32, ScrollState) -> f32>;

/// Callback registry for one scroll container
#[derive(Default)]
pub struct ScrollEventHub {
    on_reach_start: Vec<NotifyCallback>,
    on_reach_end: Vec<NotifyCallback>,
    on_scroll_start: Vec<NotifyCallback>,
    on_scroll_stop: Vec<NotifyCallback>,
    on_did_scroll: Vec<ScrollCallback>,
    on_scroll_edge: Vec<EdgeCallback>,
    on_will_scroll: Option<WillScrollCallback>,
    on_scroll_frame_begin: Option<FrameBeginCallback>,
    history: History<EventRecord>,
}

impl std::fmt::Debug for ScrollEventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollEventHub")
            .field("on_reach_start", &self.on_reach_start.len())
            .field("on_reach_end", &self.on_reach_end.len())
            .field("on_scroll_start", &self.on_scroll_start.len())
            .field("on_scroll_stop", &self.on_scroll_stop.len())
            .field("on_did_scroll", &self.on_did_scroll.len())
            .field("on_scroll_edge", &self.on_scroll_edge.len())
            .field("on_will_scroll", &self.on_will_scroll.is_some())
            .field("on_scroll_frame_begin", &self.on_scroll_frame_begin.is_some())
            .field("history", &self.history.len())
            .finish()
    }
}

impl ScrollEventHub {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Registration
    // =========================================================================

    pub fn on_reach_start<F: FnMut() + 'static>(&mut self, f: F) -> &mut Self {
        self.on_reach_start.push(Box::new(f));
        self
    }

    pub fn on_reach_end<F: FnMut() + 'static>(&mut self, f: F) -> &mut Self {
        self.on_reach_end.push(Box::new(f));
        self
    }

    pub fn on_scroll_start<F: FnMut() + 'static>(&mut self, f: F) -> &mut Self {
        self.on_scroll_start.push(Box::new(f));
        self
    }

    pub fn on_scroll_stop<F: FnMut() + 'static>(&mut self, f: F) -> &mut Self {
        self.on_scroll_stop.push(Box::new(f));
        self
    }

    pub fn on_did_scroll<F: FnMut(&ScrollEventPayload) + 'static>(&mut self, f: F) -> &mut Self {
        self.on_did_scroll.push(Box::new(f));
        self
    }

    pub fn on_scroll_edge<F: FnMut(ScrollEdge) + 'static>(&mut self, f: F) -> &mut Self {
        self.on_scroll_edge.push(Box::new(f));
        self
    }

    /// Install the will-scroll interceptor, replacing any previous one
    pub fn on_will_scroll<F>(&mut self, f: F) -> &mut Self
    where
        F: FnMut(&ScrollEventPayload) -> Option<f32> + 'static,
    {
        self.on_will_scroll = Some(Box::new(f));
        self
    }

    pub fn on_scroll_frame_begin<F>(&mut self, f: F) -> &mut Self
    where
        F: FnMut(f32, ScrollState) -> f32 + 'static,
    {
        self.on_scroll_frame_begin = Some(Box::new(f));
        self
    }

    // =========================================================================
    // Firing
    // =========================================================================

    pub fn fire_reach_start(&mut self, offset: f32) {
        self.record(ScrollEventKind::ReachStart, offset);
        for callback in self.on_reach_start.iter_mut() {
            callback();
        }
    }

    pub fn fire_reach_end(&mut self, offset: f32) {
        self.record(ScrollEventKind::ReachEnd, offset);
        for callback in self.on_reach_end.iter_mut() {
            callback();
        }
    }

    pub fn fire_scroll_start(&mut self, offset: f32) {
        self.record(ScrollEventKind::ScrollStart, offset);
        for callback in self.on_scroll_start.iter_mut() {
            callback();
        }
    }

    pub fn fire_scroll_stop(&mut self, offset: f32) {
        self.record(ScrollEventKind::ScrollStop, offset);
        for callback in self.on_scroll_stop.iter_mut() {
            callback();
        }
    }

    pub fn fire_scroll_edge(&mut self, edge: ScrollEdge, offset: f32) {
        self.record(ScrollEventKind::ScrollEdge(edge), offset);
        for callback in self.on_scroll_edge.iter_mut() {
            callback(edge);
        }
    }

    pub fn fire_did_scroll(&mut self, axis: Axis, amount: f32, source: ScrollSource) {
        if self.on_did_scroll.is_empty() {
            return;
        }
        let payload = ScrollEventPayload::along(axis, amount, source);
        for callback in self.on_did_scroll.iter_mut() {
            callback(&payload);
        }
    }

    /// Offer `amount` to the interceptor and return what should be applied
    pub fn fire_will_scroll(&mut self, axis: Axis, amount: f32, source: ScrollSource) -> f32 {
        let Some(callback) = self.on_will_scroll.as_mut() else {
            return amount;
        };
        let payload = ScrollEventPayload::along(axis, amount, source);
        match callback(&payload) {
            Some(value) if value.is_finite() => {
                if value != amount {
                    tracing::trace!("will-scroll override {:.2} -> {:.2}", amount, value);
                }
                value
            }
            Some(value) => {
                tracing::debug!("ignoring non-finite will-scroll override {}", value);
                amount
            }
            None => amount,
        }
    }

    pub fn fire_scroll_frame_begin(&mut self, amount: f32, state: ScrollState) -> f32 {
        match self.on_scroll_frame_begin.as_mut() {
            Some(callback) => {
                let value = callback(amount, state);
                if value.is_finite() {
                    value
                } else {
                    amount
                }
            }
            None => amount,
        }
    }

    pub fn history(&self) -> &History<EventRecord> {
        &self.history
    }

    fn record(&mut self, kind: ScrollEventKind, offset: f32) {
        tracing::debug!("scroll event {:?} at {:.1}", kind, offset);
        self.history.push(EventRecord { kind, offset });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_payload_along_axis() {
        let payload = ScrollEventPayload::along(Axis::Horizontal, 12.0, ScrollSource::Update);
        assert_eq!(payload.offset_x, 12.0);
        assert_eq!(payload.offset_y, 0.0);
        assert_eq!(payload.state, ScrollState::Scroll);
        assert_eq!(payload.main(Axis::Horizontal), 12.0);
    }

    #[test]
    fn test_will_scroll_override() {
        let mut hub = ScrollEventHub::new();
        assert_eq!(hub.fire_will_scroll(Axis::Vertical, 10.0, ScrollSource::Update), 10.0);

        hub.on_will_scroll(|payload| Some(payload.offset_y / 2.0));
        assert_eq!(hub.fire_will_scroll(Axis::Vertical, 10.0, ScrollSource::Update), 5.0);

        hub.on_will_scroll(|_| Some(f32::NAN));
        assert_eq!(hub.fire_will_scroll(Axis::Vertical, 10.0, ScrollSource::Update), 10.0);
    }

    #[test]
    fn test_callbacks_fire_and_record() {
        let starts = Rc::new(Cell::new(0));
        let edges = Rc::new(Cell::new(None));
        let mut hub = ScrollEventHub::new();
        {
            let starts = starts.clone();
            hub.on_scroll_start(move || starts.set(starts.get() + 1));
        }
        {
            let edges = edges.clone();
            hub.on_scroll_edge(move |edge| edges.set(Some(edge)));
        }

        hub.fire_scroll_start(0.0);
        hub.fire_scroll_edge(ScrollEdge::Bottom, -500.0);

        assert_eq!(starts.get(), 1);
        assert_eq!(edges.get(), Some(ScrollEdge::Bottom));
        assert_eq!(hub.history().len(), 2);
        assert_eq!(
            hub.history().last().map(|record| record.kind),
            Some(ScrollEventKind::ScrollEdge(ScrollEdge::Bottom))
        );
    }

    #[test]
    fn test_frame_begin_rewrites_amount() {
        let mut hub = ScrollEventHub::new();
        assert_eq!(hub.fire_scroll_frame_begin(8.0, ScrollState::Scroll), 8.0);
        hub.on_scroll_frame_begin(|amount, _| amount * 0.5);
        assert_eq!(hub.fire_scroll_frame_begin(8.0, ScrollState::Scroll), 4.0);
    }
}
