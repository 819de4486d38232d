// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides pointer normalization, linear range mapping, and
//! the 3D rotation and perspective projection used to draw the card.

/// Convert pixel coordinates inside a rect to normalized coordinates,
/// clamped to 0.0..=1.0.
pub fn normalize_coordinates(pixel_x: f32, pixel_y: f32, width: f32, height: f32) -> (f32, f32) {
    let nx = if width > 0.0 { pixel_x / width } else { 0.5 };
    let ny = if height > 0.0 { pixel_y / height } else { 0.5 };
    (clamp01(nx), clamp01(ny))
}

/// Clamp to 0.0..=1.0, mapping NaN to the midpoint.
pub fn clamp01(v: f32) -> f32 {
    if v.is_nan() {
        0.5
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Map `v` from `from` to `to` linearly, clamping to the output range.
pub fn map_range(v: f32, from: (f32, f32), to: (f32, f32)) -> f32 {
    let span = from.1 - from.0;
    let t = if span == 0.0 { 0.0 } else { (v - from.0) / span };
    to.0 + (to.1 - to.0) * t.clamp(0.0, 1.0)
}

/// Rotation and placement of a card face in view space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardTransform {
    /// Rotation of the face about its own vertical axis, in degrees.
    pub face_deg: f32,
    /// Tilt about the horizontal axis; positive tips the top edge away.
    pub rotate_x_deg: f32,
    /// Tilt about the vertical axis; positive tips the right edge away.
    pub rotate_y_deg: f32,
    pub scale: f32,
    /// Offset toward the viewer, in points.
    pub lift: f32,
    /// Viewer distance from the card plane, in points.
    pub perspective: f32,
}

impl CardTransform {
    /// Project a point in card-local coordinates (origin at the card
    /// center, y pointing down) to a screen offset from the card center.
    pub fn project(&self, x: f32, y: f32) -> (f32, f32) {
        let (x, y, z) = (x, y, 0.0_f32);

        // Face flip about the vertical axis.
        let (sf, cf) = self.face_deg.to_radians().sin_cos();
        let (x, z) = (x * cf + z * sf, -x * sf + z * cf);

        // Tilt about the vertical axis.
        let (sy, cy) = self.rotate_y_deg.to_radians().sin_cos();
        let (x, z) = (x * cy + z * sy, -x * sy + z * cy);

        // Tilt about the horizontal axis.
        let (sx, cx) = self.rotate_x_deg.to_radians().sin_cos();
        let (y, z) = (y * cx - z * sx, y * sx + z * cx);

        let (x, y, z) = (x * self.scale, y * self.scale, z * self.scale + self.lift);

        let d = self.perspective.max(1.0);
        // Points reaching the viewer plane are pinned just in front of it.
        let f = d / (d - z).max(1.0);
        (x * f, y * f)
    }
}
