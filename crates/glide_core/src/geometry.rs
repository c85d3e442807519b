//! Geometry primitives
//!
//! Axes, sizes, and dimensions that can be expressed either in pixels or
//! relative to a viewport.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

// ============================================================================
// Axis
// ============================================================================

/// Scroll axis of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Vertical scrolling (default)
    #[default]
    Vertical,
    /// Horizontal scrolling
    Horizontal,
    /// Both directions
    Free,
    /// Scrolling disabled
    None,
}

impl Axis {
    pub fn is_horizontal(&self) -> bool {
        matches!(self, Axis::Horizontal)
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self, Axis::Vertical)
    }

    /// The perpendicular axis. `Free` and `None` map to themselves.
    pub fn cross(&self) -> Axis {
        match self {
            Axis::Vertical => Axis::Horizontal,
            Axis::Horizontal => Axis::Vertical,
            other => *other,
        }
    }

    /// Whether a container scrolling along `self` can take deltas on `axis`
    pub fn covers(&self, axis: Axis) -> bool {
        match (self, axis) {
            (Axis::None, _) | (_, Axis::None) => false,
            (Axis::Free, _) => true,
            (a, b) => *a == b,
        }
    }
}

/// Layout direction, used to flip horizontal deltas for right-to-left content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

impl TextDirection {
    pub fn is_rtl(&self) -> bool {
        matches!(self, TextDirection::Rtl)
    }
}

// ============================================================================
// Size
// ============================================================================

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Checked constructor rejecting negative or non-finite extents
    pub fn try_new(width: f32, height: f32) -> Result<Self, GeometryError> {
        Ok(Self {
            width: GeometryError::check_length("width", width)?,
            height: GeometryError::check_length("height", height)?,
        })
    }

    /// Length along the main axis. `Free` measures vertically, `None` is zero.
    pub fn main(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Vertical | Axis::Free => self.height,
            Axis::Horizontal => self.width,
            Axis::None => 0.0,
        }
    }

    /// Length along the cross axis
    pub fn cross(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Vertical | Axis::Free => self.width,
            Axis::Horizontal => self.height,
            Axis::None => 0.0,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.width.is_finite() && self.height.is_finite()
    }
}

// ============================================================================
// Dimension
// ============================================================================

/// A length in pixels or as a fraction of the viewport length
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Px(f32),
    /// Fraction of the viewport, 0.0 to 1.0
    Percent(f32),
}

impl Default for Dimension {
    fn default() -> Self {
        Dimension::Px(0.0)
    }
}

impl Dimension {
    pub fn px(value: f32) -> Result<Self, GeometryError> {
        GeometryError::check_length("dimension", value).map(Dimension::Px)
    }

    pub fn percent(value: f32) -> Result<Self, GeometryError> {
        if !value.is_finite() {
            return Err(GeometryError::NonFinite {
                what: "percent",
                value,
            });
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(GeometryError::PercentOutOfRange(value));
        }
        Ok(Dimension::Percent(value))
    }

    /// Re-run the checked constructors, for values that came from deserialization
    pub fn validate(&self) -> Result<(), GeometryError> {
        match *self {
            Dimension::Px(v) => Dimension::px(v).map(|_| ()),
            Dimension::Percent(v) => Dimension::percent(v).map(|_| ()),
        }
    }

    /// Convert to pixels given the viewport length
    pub fn resolve(&self, viewport_length: f32) -> f32 {
        match *self {
            Dimension::Px(v) => v,
            Dimension::Percent(p) => p * viewport_length,
        }
    }
}
