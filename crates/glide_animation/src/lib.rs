//! Glide Animation System
//!
//! Motion primitives that drive a scroll offset between input events.
//!
//! # Features
//!
//! - **Spring Physics**: RK4-integrated springs with stiffness, damping, mass
//! - **Fling**: constant-deceleration momentum with a stop threshold
//! - **Friction**: pluggable overscroll damping curves
//! - **Animator**: a tick-driven state machine holding at most one motion

pub mod animator;
pub mod fling;
pub mod friction;
pub mod spring;

pub use animator::{Animator, Frame, MotionKind};
pub use fling::Fling;
pub use friction::{ExponentialFriction, FrictionConfig, FrictionCurve, QuadraticFriction};
pub use spring::{Spring, SpringConfig};
