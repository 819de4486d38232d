// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Every section has defaults, so a config file only needs the values it
//! changes. See `io::serialization` for loading.

use crate::io::encoder::RenderConfig;
use crate::models::validation::ValidationRules;
use crate::util::spring::Spring;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub validation: ValidationRules,
    pub qr: RenderConfig,
    pub card: CardConfig,
}

/// Presentation tuning for the card view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    /// Tilt at the card edges, in degrees.
    pub max_tilt_deg: f32,
    /// Scale while the pointer is over the card.
    pub hover_scale: f32,
    /// Depth lift toward the viewer while hovered, in points.
    pub hover_lift: f32,
    /// Distance from the viewer to the card plane, in points.
    pub perspective: f32,
    pub tilt_spring: Spring,
    pub hover_spring: Spring,
    pub flip_spring: Spring,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            max_tilt_deg: 15.0,
            hover_scale: 1.07,
            hover_lift: 80.0,
            perspective: 2200.0,
            tilt_spring: Spring::new(120.0, 15.0),
            hover_spring: Spring::new(200.0, 25.0),
            flip_spring: Spring::new(400.0, 30.0),
        }
    }
}
