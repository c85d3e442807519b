//! Scroll configuration
//!
//! Physics and behavior settings for a scroll container, loadable from TOML.
//!
//! ```toml
//! edge_effect = "spring"
//! deceleration = 1800.0
//! paging = false
//!
//! [friction]
//! curve = "exponential"
//! ratio = 1.848
//!
//! [nested]
//! forward = "self_first"
//! backward = "parent_first"
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context;
use glide_animation::{FrictionConfig, SpringConfig};
use glide_core::GeometryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::edge::{EdgeEffect, EffectEdge};
use crate::nested::NestedScrollOptions;
use crate::snap::{SnapConfig, SnapSource};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse scroll config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize scroll config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("invalid snap dimension: {0}")]
    Geometry(#[from] GeometryError),
}

/// Configuration for one scroll container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollConfig {
    #[serde(default)]
    pub edge_effect: EdgeEffect,
    #[serde(default)]
    pub effect_edge: EffectEdge,
    #[serde(default)]
    pub nested: NestedScrollOptions,
    #[serde(default)]
    pub friction: FrictionConfig,
    /// Fling deceleration in pixels/second²
    #[serde(default = "default_deceleration")]
    pub deceleration: f32,
    /// Fling stops below this speed (pixels/second)
    #[serde(default = "default_velocity_threshold")]
    pub velocity_threshold: f32,
    /// Spring used for edge bounce and snap settling
    #[serde(default)]
    pub spring: SpringConfig,
    #[serde(default)]
    pub paging: bool,
    #[serde(default)]
    pub snap: Option<SnapConfig>,
    /// Content laid out from the end
    #[serde(default)]
    pub reversed: bool,
    /// Programmatic animations may stretch past an edge
    #[serde(default)]
    pub animate_can_over_scroll: bool,
}

fn default_deceleration() -> f32 {
    1500.0
}

fn default_velocity_threshold() -> f32 {
    10.0
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            edge_effect: EdgeEffect::default(),
            effect_edge: EffectEdge::default(),
            nested: NestedScrollOptions::default(),
            friction: FrictionConfig::default(),
            deceleration: default_deceleration(),
            velocity_threshold: default_velocity_threshold(),
            spring: SpringConfig::default(),
            paging: false,
            snap: None,
            reversed: false,
            animate_can_over_scroll: false,
        }
    }
}

impl ScrollConfig {
    /// Hard stops at both edges
    pub fn no_bounce() -> Self {
        Self {
            edge_effect: EdgeEffect::None,
            ..Self::default()
        }
    }

    /// Rubber-band overscroll with spring-back
    pub fn spring() -> Self {
        Self {
            edge_effect: EdgeEffect::Spring,
            ..Self::default()
        }
    }

    pub fn with_nested(mut self, nested: NestedScrollOptions) -> Self {
        self.nested = nested;
        self
    }

    pub fn with_snap(mut self, snap: SnapConfig) -> Self {
        self.snap = Some(snap);
        self
    }

    pub fn with_paging(mut self, paging: bool) -> Self {
        self.paging = paging;
        self
    }

    /// Check values that deserialization cannot rule out
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.deceleration.is_finite() || self.deceleration <= 0.0 {
            return Err(invalid("deceleration", self.deceleration, "must be positive"));
        }
        if !self.velocity_threshold.is_finite() || self.velocity_threshold < 0.0 {
            return Err(invalid(
                "velocity_threshold",
                self.velocity_threshold,
                "must not be negative",
            ));
        }
        let coefficient = self.friction.coefficient();
        if !coefficient.is_finite() || coefficient <= 0.0 {
            return Err(invalid("friction", coefficient, "must be positive"));
        }
        if !self.spring.is_valid() {
            return Err(ConfigError::Invalid {
                field: "spring",
                reason: format!("{:?} has non-positive parameters", self.spring),
            });
        }
        if let Some(snap) = &self.snap {
            match &snap.source {
                SnapSource::Interval(interval) => interval.validate()?,
                SnapSource::Paginations(positions) => {
                    for position in positions {
                        position.validate()?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: ScrollConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load a config file
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }
}

fn invalid(field: &'static str, value: f32, reason: &str) -> ConfigError {
    tracing::warn!("rejecting scroll config: {} = {} ({})", field, value, reason);
    ConfigError::Invalid {
        field,
        reason: format!("{value} {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nested::NestedScrollMode;
    use crate::snap::SnapAlign;
    use glide_core::Dimension;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ScrollConfig::from_toml_str("").unwrap();
        assert_eq!(config, ScrollConfig::default());
        assert_eq!(config.deceleration, 1500.0);
        assert_eq!(config.edge_effect, EdgeEffect::None);
    }

    #[test]
    fn test_parse_nested_and_friction() {
        let config = ScrollConfig::from_toml_str(
            r#"
            edge_effect = "spring"
            deceleration = 1800.0

            [friction]
            curve = "quadratic"
            scale = 0.6

            [nested]
            forward = "self_first"
            backward = "parent_first"
            "#,
        )
        .unwrap();
        assert_eq!(config.edge_effect, EdgeEffect::Spring);
        assert_eq!(config.friction, FrictionConfig::Quadratic { scale: 0.6 });
        assert_eq!(config.nested.forward, NestedScrollMode::SelfFirst);
        assert_eq!(config.nested.backward, NestedScrollMode::ParentFirst);
    }

    #[test]
    fn test_round_trip_with_snap() {
        let config = ScrollConfig::spring()
            .with_snap(SnapConfig::interval(SnapAlign::Center, Dimension::Percent(0.5)))
            .with_paging(true);
        let text = config.to_toml().unwrap();
        let parsed = ScrollConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            ScrollConfig::from_toml_str("deceleration = -1.0"),
            Err(ConfigError::Invalid {
                field: "deceleration",
                ..
            })
        ));
        assert!(matches!(
            ScrollConfig::from_toml_str("edge_effect = \"wobble\""),
            Err(ConfigError::Parse(_))
        ));

        let config = ScrollConfig::default()
            .with_snap(SnapConfig::paginations(SnapAlign::Start, vec![Dimension::Percent(2.0)]));
        assert!(matches!(config.validate(), Err(ConfigError::Geometry(_))));
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = ScrollConfig::load_from_file(Path::new("/nonexistent/glide.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
