//! Scroll sources
//!
//! Every offset update is tagged with where it came from. The tag decides
//! whether boundaries are rigid, whether friction applies, and which
//! [`ScrollState`] observers see.

use serde::{Deserialize, Serialize};

/// Origin of an offset delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollSource {
    /// Finger drag
    Update,
    /// Fling momentum
    Animation,
    /// Programmatic jump, never clamped
    Jump,
    /// Edge spring-back or snap settle
    AnimationSpring,
    /// Scroll bar thumb drag
    Bar,
    /// Momentum after a scroll bar drag
    BarFling,
    /// Scrolling a focused child into view
    FocusJump,
    /// Mouse wheel or trackpad axis event
    Axis,
    /// Programmatic animated scroll
    AnimationController,
    /// Rotary crown
    Crown,
    /// Rotary knob
    Rotate,
    /// Status bar tap (scroll to top)
    StatusBar,
    /// Gesture start marker, carries no motion
    Start,
    /// Delta forwarded from a nested child
    Child,
    #[default]
    None,
}

/// Scroll state reported to observers, derived from the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollState {
    #[default]
    Idle,
    Scroll,
    Fling,
}

/// Coarse source classification handed to user callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollSourceType {
    Drag,
    Fling,
    EdgeEffect,
    OtherUserInput,
    ScrollBar,
    ScrollBarFling,
    Scroller,
    ScrollerAnimation,
}

impl ScrollSource {
    pub fn scroll_state(&self) -> ScrollState {
        match self {
            ScrollSource::Update | ScrollSource::Axis | ScrollSource::Bar | ScrollSource::Crown => {
                ScrollState::Scroll
            }
            ScrollSource::Animation
            | ScrollSource::AnimationSpring
            | ScrollSource::AnimationController
            | ScrollSource::BarFling => ScrollState::Fling,
            _ => ScrollState::Idle,
        }
    }

    pub fn source_type(&self) -> ScrollSourceType {
        match self {
            ScrollSource::Update => ScrollSourceType::Drag,
            ScrollSource::Animation => ScrollSourceType::Fling,
            ScrollSource::Jump => ScrollSourceType::Scroller,
            ScrollSource::AnimationSpring => ScrollSourceType::EdgeEffect,
            ScrollSource::Bar => ScrollSourceType::ScrollBar,
            ScrollSource::BarFling => ScrollSourceType::ScrollBarFling,
            ScrollSource::AnimationController => ScrollSourceType::ScrollerAnimation,
            _ => ScrollSourceType::OtherUserInput,
        }
    }

    /// Sources that always clamp to the content bounds
    pub fn is_rigid(&self) -> bool {
        matches!(
            self,
            ScrollSource::Bar | ScrollSource::BarFling | ScrollSource::Rotate | ScrollSource::Axis
        )
    }

    /// Sources that move without overscroll friction
    pub fn skips_friction(&self) -> bool {
        matches!(
            self,
            ScrollSource::Animation | ScrollSource::AnimationSpring | ScrollSource::FocusJump
        )
    }

    /// Sources allowed to stretch past an edge with a spring edge effect
    pub fn can_spring_over_scroll(&self, controller_can_over_scroll: bool) -> bool {
        match self {
            ScrollSource::Update | ScrollSource::Animation | ScrollSource::AnimationSpring => true,
            ScrollSource::AnimationController => controller_can_over_scroll,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_state_mapping() {
        assert_eq!(ScrollSource::Update.scroll_state(), ScrollState::Scroll);
        assert_eq!(ScrollSource::Crown.scroll_state(), ScrollState::Scroll);
        assert_eq!(ScrollSource::BarFling.scroll_state(), ScrollState::Fling);
        assert_eq!(
            ScrollSource::AnimationController.scroll_state(),
            ScrollState::Fling
        );
        assert_eq!(ScrollSource::Jump.scroll_state(), ScrollState::Idle);
        assert_eq!(ScrollSource::Child.scroll_state(), ScrollState::Idle);
        assert_eq!(ScrollSource::Start.scroll_state(), ScrollState::Idle);
    }

    #[test]
    fn test_source_type_mapping() {
        assert_eq!(ScrollSource::Update.source_type(), ScrollSourceType::Drag);
        assert_eq!(
            ScrollSource::AnimationSpring.source_type(),
            ScrollSourceType::EdgeEffect
        );
        assert_eq!(
            ScrollSource::StatusBar.source_type(),
            ScrollSourceType::OtherUserInput
        );
    }

    #[test]
    fn test_rigid_and_friction_sets() {
        assert!(ScrollSource::Axis.is_rigid());
        assert!(!ScrollSource::Update.is_rigid());
        assert!(ScrollSource::FocusJump.skips_friction());
        assert!(!ScrollSource::Update.skips_friction());
        assert!(ScrollSource::AnimationController.can_spring_over_scroll(true));
        assert!(!ScrollSource::AnimationController.can_spring_over_scroll(false));
        assert!(!ScrollSource::Bar.can_spring_over_scroll(true));
    }
}
