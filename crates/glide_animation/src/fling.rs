//! Fling momentum
//!
//! Constant-deceleration motion started from a release velocity. Each step
//! yields the distance travelled during that step; the fling finishes once
//! its speed drops below the stop threshold.

/// Momentum scroll after a release gesture
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fling {
    velocity: f32,
    /// Deceleration in pixels/second²
    deceleration: f32,
    /// Speed below which the fling stops (pixels/second)
    threshold: f32,
}

impl Fling {
    pub fn new(velocity: f32, deceleration: f32, threshold: f32) -> Self {
        Self {
            velocity,
            deceleration: deceleration.abs().max(f32::EPSILON),
            threshold: threshold.abs(),
        }
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn is_finished(&self) -> bool {
        self.velocity.abs() < self.threshold || self.velocity == 0.0
    }

    /// Signed distance the fling covers before coming to rest
    pub fn predicted_distance(&self) -> f32 {
        let speed = self.velocity.abs();
        self.velocity.signum() * speed * speed / (2.0 * self.deceleration)
    }

    /// Advance by `dt` seconds and return the distance moved
    pub fn step(&mut self, dt: f32) -> f32 {
        if self.is_finished() || dt <= 0.0 {
            return 0.0;
        }
        let speed = self.velocity.abs();
        let next_speed = (speed - self.deceleration * dt).max(0.0);
        let travelled = (speed + next_speed) * 0.5 * dt * self.velocity.signum();
        self.velocity = next_speed * self.velocity.signum();
        if next_speed < self.threshold {
            self.velocity = 0.0;
        }
        travelled
    }
}
