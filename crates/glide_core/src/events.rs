//! Gesture events
//!
//! Event ids and payloads produced by the input layer. Recognizing gestures
//! is not glide's job; it only consumes the deltas and velocities below.

/// Event type identifier
pub type EventType = u32;

/// Common event types
pub mod event_types {
    use super::EventType;

    pub const POINTER_DOWN: EventType = 1;
    pub const POINTER_UP: EventType = 2;
    /// Drag event (touch down + move)
    pub const DRAG: EventType = 6;
    /// Drag ended (touch up after drag), carries the release velocity
    pub const DRAG_END: EventType = 7;
    /// Touch sequence cancelled by the platform
    pub const TOUCH_CANCEL: EventType = 8;
    /// Wheel or trackpad scroll
    pub const SCROLL: EventType = 30;
    /// Scroll gesture ended (for deceleration/momentum)
    pub const SCROLL_END: EventType = 31;
    /// First delta of a gesture is about to arrive
    pub const SCROLL_START: EventType = 33;
    /// Layout pass completed
    pub const LAYOUT: EventType = 40;

    // Internal animation events
    pub const ANIMATION_TICK: EventType = 10000;
    pub const ANIMATION_SETTLED: EventType = 10001;
    pub const HIT_EDGE: EventType = 10002;
}

/// A gesture event addressed to a view node
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub event_type: EventType,
    /// Target node, in the `KeyData::as_ffi` encoding of the view tree
    pub target: u64,
    pub data: EventData,
}

/// Event-specific data
#[derive(Clone, Debug, PartialEq)]
pub enum EventData {
    /// Offset delta, negative values move toward the end of the content
    Scroll { delta_x: f32, delta_y: f32 },
    /// Release velocity in pixels per second, same sign convention as `Scroll`
    Velocity { velocity_x: f32, velocity_y: f32 },
    /// Position at gesture start
    Position { x: f32, y: f32 },
    None,
}

impl Event {
    pub fn new(event_type: EventType, target: u64, data: EventData) -> Self {
        Self {
            event_type,
            target,
            data,
        }
    }

    /// Component of the payload along the vertical or horizontal axis
    pub fn main_value(&self, horizontal: bool) -> f32 {
        match self.data {
            EventData::Scroll { delta_x, delta_y } => pick(horizontal, delta_x, delta_y),
            EventData::Velocity {
                velocity_x,
                velocity_y,
            } => pick(horizontal, velocity_x, velocity_y),
            EventData::Position { x, y } => pick(horizontal, x, y),
            EventData::None => 0.0,
        }
    }
}

fn pick(horizontal: bool, x: f32, y: f32) -> f32 {
    if horizontal {
        x
    } else {
        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_value() {
        let event = Event::new(
            event_types::DRAG,
            7,
            EventData::Scroll {
                delta_x: 3.0,
                delta_y: -12.0,
            },
        );
        assert_eq!(event.main_value(false), -12.0);
        assert_eq!(event.main_value(true), 3.0);

        let none = Event::new(event_types::TOUCH_CANCEL, 7, EventData::None);
        assert_eq!(none.main_value(false), 0.0);
    }
}
