// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Card presentation state.
//!
//! The renderer keeps three pieces of input state (pointer, hover, flip)
//! and a spring per animated channel. Input events only move spring
//! targets; `tick` advances the springs once per frame and resolves every
//! visual value through [`VisualParams::derive`].

use super::handoff::{HandoffPayload, MissingHandoffState};
use crate::config::CardConfig;
use crate::util::geometry::{clamp01, map_range};
use crate::util::spring::Animated;

/// Largest combined tilt that still changes the shadow, in degrees.
const SHADOW_TILT_CAP: f32 = 30.0;
const SHADOW_BLUR: (f32, f32) = (20.0, 40.0);
const SHADOW_SPREAD: (f32, f32) = (10.0, 20.0);

/// Which face of the card is in front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Face {
    #[default]
    Front,
    Back,
}

impl Face {
    pub fn toggled(self) -> Self {
        match self {
            Face::Front => Face::Back,
            Face::Back => Face::Front,
        }
    }

    /// Flip angle at rest for this face.
    pub fn angle(self) -> f32 {
        match self {
            Face::Front => 0.0,
            Face::Back => 180.0,
        }
    }
}

/// Drop shadow under the card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowParams {
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
    pub spread: f32,
}

impl ShadowParams {
    /// Shadow for the given smoothed tilt. Offsets point away from the
    /// tilt; blur and spread grow with the tilt magnitude.
    pub fn from_tilt(rotate_x: f32, rotate_y: f32) -> Self {
        let magnitude = (rotate_x.abs() + rotate_y.abs()).min(SHADOW_TILT_CAP);
        Self {
            offset_x: -rotate_y * 2.0,
            offset_y: rotate_x * 2.0,
            blur: map_range(magnitude, (0.0, SHADOW_TILT_CAP), SHADOW_BLUR),
            spread: map_range(magnitude, (0.0, SHADOW_TILT_CAP), SHADOW_SPREAD),
        }
    }
}

/// Fully resolved visual values for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualParams {
    pub rotate_x: f32,
    pub rotate_y: f32,
    pub scale: f32,
    pub lift: f32,
    /// Rotation of the front face; the back face sits 180 degrees behind.
    pub flip_angle: f32,
    pub front_visible: bool,
    pub shadow: ShadowParams,
}

impl VisualParams {
    pub fn derive(rotate_x: f32, rotate_y: f32, scale: f32, lift: f32, flip_angle: f32) -> Self {
        Self {
            rotate_x,
            rotate_y,
            scale,
            lift,
            flip_angle,
            front_visible: flip_angle.to_radians().cos() >= 0.0,
            shadow: ShadowParams::from_tilt(rotate_x, rotate_y),
        }
    }

    /// Rotation of the face currently in front.
    pub fn visible_face_angle(&self) -> f32 {
        if self.front_visible {
            self.flip_angle
        } else {
            self.flip_angle - 180.0
        }
    }
}

/// Tilt targets for a normalized pointer position.
pub fn tilt_for_pointer(x: f32, y: f32, max_tilt: f32) -> (f32, f32) {
    let rotate_x = map_range(clamp01(y), (0.0, 1.0), (max_tilt, -max_tilt));
    let rotate_y = map_range(clamp01(x), (0.0, 1.0), (-max_tilt, max_tilt));
    (rotate_x, rotate_y)
}

/// Interactive state of the card view.
#[derive(Debug, Clone)]
pub struct PresentationRenderer {
    payload: HandoffPayload,
    config: CardConfig,
    face: Face,
    pointer: (f32, f32),
    hovered: bool,
    rotate_x: Animated,
    rotate_y: Animated,
    scale: Animated,
    lift: Animated,
    flip: Animated,
}

impl PresentationRenderer {
    /// Build the card view from the handoff payload, if there is a usable one.
    pub fn new(
        payload: Option<HandoffPayload>,
        config: &CardConfig,
    ) -> Result<Self, MissingHandoffState> {
        let payload = payload.ok_or(MissingHandoffState::Absent)?;
        payload.check()?;
        log::debug!(
            "Card springs: tilt {:.2}, hover {:.2}, flip {:.2} damping ratio",
            config.tilt_spring.damping_ratio(),
            config.hover_spring.damping_ratio(),
            config.flip_spring.damping_ratio()
        );

        Ok(Self {
            payload,
            config: config.clone(),
            face: Face::Front,
            pointer: (0.5, 0.5),
            hovered: false,
            rotate_x: Animated::new(config.tilt_spring, 0.0),
            rotate_y: Animated::new(config.tilt_spring, 0.0),
            scale: Animated::new(config.hover_spring, 1.0),
            lift: Animated::new(config.hover_spring, 0.0),
            flip: Animated::new(config.flip_spring, Face::Front.angle()),
        })
    }

    pub fn payload(&self) -> &HandoffPayload {
        &self.payload
    }

    #[cfg(test)]
    pub fn face(&self) -> Face {
        self.face
    }

    #[cfg(test)]
    pub fn pointer(&self) -> (f32, f32) {
        self.pointer
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn perspective(&self) -> f32 {
        self.config.perspective
    }

    /// Pointer moved over the card, in normalized card coordinates.
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        self.pointer = (clamp01(x), clamp01(y));
        self.retarget_tilt();
    }

    pub fn on_pointer_enter(&mut self) {
        self.hovered = true;
        self.scale.set_target(self.config.hover_scale);
        self.lift.set_target(self.config.hover_lift);
    }

    pub fn on_pointer_leave(&mut self) {
        self.hovered = false;
        self.pointer = (0.5, 0.5);
        self.retarget_tilt();
        self.scale.set_target(1.0);
        self.lift.set_target(0.0);
    }

    /// Click or tap: show the other face.
    pub fn on_activate(&mut self) -> Face {
        self.face = self.face.toggled();
        self.flip.set_target(self.face.angle());
        log::debug!("Card flipped to {:?}", self.face);
        self.face
    }

    /// Target values the springs are heading toward.
    #[cfg(test)]
    pub fn target(&self) -> VisualParams {
        VisualParams::derive(
            self.rotate_x.target,
            self.rotate_y.target,
            self.scale.target,
            self.lift.target,
            self.flip.target,
        )
    }

    /// Current smoothed values without advancing time.
    pub fn current(&self) -> VisualParams {
        VisualParams::derive(
            self.rotate_x.value(),
            self.rotate_y.value(),
            self.scale.value(),
            self.lift.value(),
            self.flip.value(),
        )
    }

    /// Advance every spring by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> VisualParams {
        VisualParams::derive(
            self.rotate_x.tick(dt),
            self.rotate_y.tick(dt),
            self.scale.tick(dt),
            self.lift.tick(dt),
            self.flip.tick(dt),
        )
    }

    /// Whether all springs are at rest.
    pub fn is_settled(&self) -> bool {
        [&self.rotate_x, &self.rotate_y, &self.scale, &self.lift, &self.flip]
            .iter()
            .all(|a| a.is_settled())
    }

    fn retarget_tilt(&mut self) {
        let (rx, ry) = tilt_for_pointer(self.pointer.0, self.pointer.1, self.config.max_tilt_deg);
        self.rotate_x.set_target(rx);
        self.rotate_y.set_target(ry);
    }
}
