//! Overscroll friction
//!
//! A friction curve maps how far the content is already stretched past an
//! edge (as a fraction of the viewport) to a factor in `[0, 1]` applied to
//! the next delta. Deeper stretch means a smaller factor.

use serde::{Deserialize, Serialize};

/// Damping curve used while the offset is past a boundary
pub trait FrictionCurve: std::fmt::Debug {
    /// Factor for a stretch ratio. Inputs are clamped to `[0, 1]` by callers
    /// of [`FrictionCurve::apply`]; implementations may assume that range.
    fn factor(&self, gamma: f32) -> f32;

    /// Clamp `gamma`, evaluate, and clamp the result into `[0, 1]`
    fn apply(&self, gamma: f32) -> f32 {
        let gamma = if gamma.is_nan() {
            0.0
        } else {
            gamma.clamp(0.0, 1.0)
        };
        self.factor(gamma).clamp(0.0, 1.0)
    }
}

/// `exp(-ratio * gamma)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialFriction {
    pub ratio: f32,
}

impl Default for ExponentialFriction {
    fn default() -> Self {
        Self { ratio: 1.848 }
    }
}

impl FrictionCurve for ExponentialFriction {
    fn factor(&self, gamma: f32) -> f32 {
        (-self.ratio * gamma).exp()
    }
}

/// `scale * (1 - gamma)²`, the pager-style curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticFriction {
    pub scale: f32,
}

impl Default for QuadraticFriction {
    fn default() -> Self {
        Self { scale: 0.72 }
    }
}

impl FrictionCurve for QuadraticFriction {
    fn factor(&self, gamma: f32) -> f32 {
        let remaining = 1.0 - gamma;
        self.scale * remaining * remaining
    }
}

/// Serializable selection of a friction curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "curve", rename_all = "snake_case")]
pub enum FrictionConfig {
    Exponential { ratio: f32 },
    Quadratic { scale: f32 },
}

impl Default for FrictionConfig {
    fn default() -> Self {
        FrictionConfig::Exponential { ratio: 1.848 }
    }
}

impl FrictionConfig {
    pub fn build(&self) -> Box<dyn FrictionCurve> {
        match *self {
            FrictionConfig::Exponential { ratio } => Box::new(ExponentialFriction { ratio }),
            FrictionConfig::Quadratic { scale } => Box::new(QuadraticFriction { scale }),
        }
    }

    /// Coefficient of the curve, for validation
    pub fn coefficient(&self) -> f32 {
        match *self {
            FrictionConfig::Exponential { ratio } => ratio,
            FrictionConfig::Quadratic { scale } => scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_is_one_at_boundary() {
        let curve = ExponentialFriction::default();
        assert_eq!(curve.apply(0.0), 1.0);
    }

    #[test]
    fn test_curves_decrease_with_stretch() {
        let curves: [Box<dyn FrictionCurve>; 2] = [
            Box::new(ExponentialFriction::default()),
            Box::new(QuadraticFriction::default()),
        ];
        for curve in curves.iter() {
            let mut last = f32::MAX;
            for step in 0..=10 {
                let factor = curve.apply(step as f32 / 10.0);
                assert!(factor <= last, "{curve:?} not decreasing at {step}");
                assert!((0.0..=1.0).contains(&factor));
                last = factor;
            }
        }
    }

    #[test]
    fn test_apply_clamps_input() {
        let curve = ExponentialFriction::default();
        // negative stretch would amplify without the clamp
        assert_eq!(curve.apply(-0.5), 1.0);
        assert_eq!(curve.apply(3.0), curve.apply(1.0));
        assert_eq!(curve.apply(f32::NAN), 1.0);
    }

    #[test]
    fn test_config_builds_matching_curve() {
        let curve = FrictionConfig::Quadratic { scale: 0.5 }.build();
        assert!((curve.apply(0.5) - 0.125).abs() < 1e-6);
        assert_eq!(FrictionConfig::default().coefficient(), 1.848);
    }
}
