// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Damped spring simulation.
//!
//! Animated values chase a target through a mass-spring-damper model that
//! is advanced explicitly once per rendered frame. Large frame times are
//! split into fixed sub-steps so the integration stays stable.

use serde::{Deserialize, Serialize};

/// Longest single integration step, in seconds.
const MAX_SUBSTEP: f32 = 1.0 / 240.0;

/// Distance from the target below which a slow spring snaps to rest.
const REST_DELTA: f32 = 1e-3;

/// Speed below which a spring near its target snaps to rest.
const REST_SPEED: f32 = 1e-3;

/// Spring parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spring {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
}

impl Default for Spring {
    fn default() -> Self {
        Self::new(100.0, 10.0)
    }
}

impl Spring {
    /// A spring with unit mass.
    pub fn new(stiffness: f32, damping: f32) -> Self {
        Self {
            stiffness,
            damping,
            mass: 1.0,
        }
    }

    /// Damping ratio; 1.0 is critical damping.
    pub fn damping_ratio(&self) -> f32 {
        let k = self.stiffness.max(0.0);
        let m = self.mass.max(1e-6);
        self.damping.max(0.0) / (2.0 * (k * m).sqrt()).max(1e-6)
    }
}

/// Position and velocity of one animated value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpringState {
    pub value: f32,
    pub velocity: f32,
}

impl SpringState {
    /// A value at rest.
    pub fn at(value: f32) -> Self {
        Self {
            value,
            velocity: 0.0,
        }
    }

    pub fn is_settled(&self, target: f32) -> bool {
        (self.value - target).abs() < REST_DELTA && self.velocity.abs() < REST_SPEED
    }
}

/// Advance a spring toward `target` by `dt` seconds.
pub fn step(spring: &Spring, state: SpringState, target: f32, dt: f32) -> SpringState {
    if !dt.is_finite() || dt <= 0.0 || state.is_settled(target) {
        return if state.is_settled(target) {
            SpringState::at(target)
        } else {
            state
        };
    }

    let k = spring.stiffness.max(0.0);
    let c = spring.damping.max(0.0);
    let m = spring.mass.max(1e-6);

    let substeps = (dt / MAX_SUBSTEP).ceil().max(1.0) as u32;
    let h = dt / substeps as f32;

    let mut x = state.value;
    let mut v = state.velocity;
    for _ in 0..substeps {
        let accel = (-k * (x - target) - c * v) / m;
        v += accel * h;
        x += v * h;
    }

    let next = SpringState {
        value: x,
        velocity: v,
    };
    if next.is_settled(target) {
        SpringState::at(target)
    } else {
        next
    }
}

/// A spring-driven value with its own target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animated {
    pub spring: Spring,
    pub state: SpringState,
    pub target: f32,
}

impl Animated {
    pub fn new(spring: Spring, value: f32) -> Self {
        Self {
            spring,
            state: SpringState::at(value),
            target: value,
        }
    }

    pub fn value(&self) -> f32 {
        self.state.value
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    pub fn tick(&mut self, dt: f32) -> f32 {
        self.state = step(&self.spring, self.state, self.target, dt);
        self.state.value
    }

    pub fn is_settled(&self) -> bool {
        self.state.is_settled(self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn run(spring: Spring, from: f32, to: f32, seconds: f32) -> (SpringState, f32) {
        let mut state = SpringState::at(from);
        let mut peak = from;
        let frames = (seconds / FRAME) as usize;
        for _ in 0..frames {
            state = step(&spring, state, to, FRAME);
            peak = peak.max(state.value);
        }
        (state, peak)
    }

    #[test]
    fn test_springs_settle_on_target() {
        for spring in [Spring::new(120.0, 15.0), Spring::new(200.0, 25.0), Spring::new(400.0, 30.0)] {
            let (state, _) = run(spring, 0.0, 15.0, 5.0);
            assert_eq!(state, SpringState::at(15.0), "{:?}", spring);
        }
    }

    #[test]
    fn test_underdamped_overshoots_but_is_bounded() {
        let spring = Spring::new(120.0, 15.0);
        assert!(spring.damping_ratio() < 1.0);

        let (_, peak) = run(spring, 0.0, 10.0, 2.0);
        assert!(peak > 10.0);
        assert!(peak < 13.0, "peak {}", peak);
    }

    #[test]
    fn test_critically_damped_does_not_overshoot() {
        let spring = Spring::new(100.0, 20.0);
        assert!((spring.damping_ratio() - 1.0).abs() < 1e-6);

        let (_, peak) = run(spring, 0.0, 1.0, 3.0);
        assert!(peak <= 1.0 + 1e-4, "peak {}", peak);
    }

    #[test]
    fn test_large_frame_time_stays_stable() {
        let spring = Spring::new(400.0, 30.0);
        let state = step(&spring, SpringState::at(0.0), 180.0, 0.5);
        assert!(state.value.is_finite());
        assert!(state.value > 0.0 && state.value < 250.0, "value {}", state.value);
    }

    #[test]
    fn test_zero_dt_is_identity() {
        let spring = Spring::default();
        let state = SpringState {
            value: 3.0,
            velocity: 1.0,
        };
        assert_eq!(step(&spring, state, 10.0, 0.0), state);
    }

    #[test]
    fn test_animated_value_moves_toward_target() {
        let mut value = Animated::new(Spring::new(200.0, 25.0), 1.0);
        assert!(value.is_settled());

        value.set_target(1.07);
        assert!(!value.is_settled());
        let first = value.tick(FRAME);
        assert!(first > 1.0 && first < 1.07);
    }
}
