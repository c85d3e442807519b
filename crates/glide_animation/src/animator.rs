//! Tick-driven animator
//!
//! Holds at most one active motion. The owner pumps [`Animator::tick`] once
//! per frame and feeds the resulting frame back into its offset engine.
//! Cancelling is just returning to idle.

use crate::fling::Fling;
use crate::spring::{Spring, SpringConfig};

/// The kind of motion currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    Fling,
    Spring,
}

#[derive(Debug, Clone, Copy)]
enum Motion {
    Fling(Fling),
    Spring(Spring),
}

/// Output of one animation tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame {
    /// Relative distance covered by a fling during the tick
    Fling {
        delta: f32,
        velocity: f32,
        finished: bool,
    },
    /// Absolute position of a spring after the tick
    Spring {
        position: f32,
        velocity: f32,
        finished: bool,
    },
}

impl Frame {
    pub fn is_finished(&self) -> bool {
        match *self {
            Frame::Fling { finished, .. } | Frame::Spring { finished, .. } => finished,
        }
    }
}

#[derive(Debug, Default)]
pub struct Animator {
    motion: Option<Motion>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fling(&mut self, fling: Fling) {
        tracing::debug!("animator: fling v={:.1}", fling.velocity());
        self.motion = Some(Motion::Fling(fling));
    }

    pub fn spring_to(&mut self, config: SpringConfig, from: f32, to: f32, velocity: f32) {
        tracing::debug!(
            "animator: spring {:.1} -> {:.1} v={:.1}",
            from,
            to,
            velocity
        );
        self.motion = Some(Motion::Spring(Spring::launch(config, from, to, velocity)));
    }

    /// Cancel the running motion, returning its velocity
    pub fn stop(&mut self) -> Option<f32> {
        self.motion.take().map(|motion| match motion {
            Motion::Fling(fling) => fling.velocity(),
            Motion::Spring(spring) => spring.velocity(),
        })
    }

    pub fn is_idle(&self) -> bool {
        self.motion.is_none()
    }

    pub fn kind(&self) -> Option<MotionKind> {
        self.motion.as_ref().map(|motion| match motion {
            Motion::Fling(_) => MotionKind::Fling,
            Motion::Spring(_) => MotionKind::Spring,
        })
    }

    pub fn velocity(&self) -> f32 {
        match &self.motion {
            Some(Motion::Fling(fling)) => fling.velocity(),
            Some(Motion::Spring(spring)) => spring.velocity(),
            None => 0.0,
        }
    }

    /// Target of the running spring
    pub fn spring_target(&self) -> Option<f32> {
        match &self.motion {
            Some(Motion::Spring(spring)) => Some(spring.target()),
            _ => None,
        }
    }

    /// Advance the running motion. Finished motions are cleared.
    pub fn tick(&mut self, dt: f32) -> Option<Frame> {
        let frame = match self.motion.as_mut()? {
            Motion::Fling(fling) => {
                let delta = fling.step(dt);
                Frame::Fling {
                    delta,
                    velocity: fling.velocity(),
                    finished: fling.is_finished(),
                }
            }
            Motion::Spring(spring) => {
                spring.step(dt);
                let finished = spring.is_settled();
                Frame::Spring {
                    position: if finished {
                        spring.target()
                    } else {
                        spring.value()
                    },
                    velocity: if finished { 0.0 } else { spring.velocity() },
                    finished,
                }
            }
        };
        if frame.is_finished() {
            self.motion = None;
        }
        Some(frame)
    }
}
