// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! QR artifact encoding.
//!
//! This module turns a serialized record into a PNG QR code. The module
//! matrix comes from the `qrcode` crate; rasterization and PNG encoding
//! are done here so the output is fully determined by the payload and the
//! render configuration.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, Rgba, RgbaImage};
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Errors raised while producing an artifact.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingFailure {
    #[error("payload of {0} bytes does not fit in a QR code")]
    PayloadTooLarge(usize),

    #[error("could not encode QR code: {0}")]
    Qr(String),

    #[error("could not render QR image: {0}")]
    Render(String),

    #[error("could not serialize record: {0}")]
    Payload(String),
}

impl From<serde_json::Error> for EncodingFailure {
    fn from(e: serde_json::Error) -> Self {
        EncodingFailure::Payload(e.to_string())
    }
}

/// An sRGB color with alpha, written as `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(pub [u8; 4]);

impl HexColor {
    pub const BLACK: HexColor = HexColor([0, 0, 0, 255]);
    pub const WHITE: HexColor = HexColor([255, 255, 255, 255]);
}

impl TryFrom<String> for HexColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let hex = value.trim().trim_start_matches('#');
        if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid color {:?}, expected #rrggbb or #rrggbbaa", value));
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
        let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(HexColor([channel(0)?, channel(2)?, channel(4)?, alpha]))
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        if a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
        }
    }
}

/// Fixed rendering configuration for QR artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Target image width in pixels. Modules are whole pixels, so the
    /// actual image may be slightly smaller.
    pub pixel_width: u32,
    /// Quiet zone around the code, in modules.
    pub margin: u32,
    pub foreground: HexColor,
    pub background: HexColor,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pixel_width: 200,
            margin: 2,
            foreground: HexColor::BLACK,
            background: HexColor::WHITE,
        }
    }
}

/// A rendered QR image.
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    payload: String,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    png: Vec<u8>,
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("payload", &self.payload)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("png_bytes", &self.png.len())
            .finish()
    }
}

impl Artifact {
    /// The exact string that was encoded.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// RGBA8 pixels, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn png(&self) -> &[u8] {
        &self.png
    }

    /// The artifact as a renderable `data:` URL.
    pub fn data_url(&self) -> String {
        format!("{}{}", DATA_URL_PREFIX, STANDARD.encode(self.png()))
    }
}

/// Decode the PNG bytes carried by a `data:image/png;base64,` URL.
pub fn png_from_data_url(url: &str) -> anyhow::Result<Vec<u8>> {
    let encoded = url
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or_else(|| anyhow::anyhow!("not a PNG data URL"))?;
    Ok(STANDARD.decode(encoded)?)
}

/// Whether a string looks like an artifact URL.
pub fn is_png_data_url(url: &str) -> bool {
    url.len() > DATA_URL_PREFIX.len() && url.starts_with(DATA_URL_PREFIX)
}

/// Something that can turn a payload into an image artifact.
pub trait ArtifactEncoder: Send + Sync {
    fn encode(&self, payload: &str, config: &RenderConfig) -> Result<Artifact, EncodingFailure>;
}

/// QR encoder with error correction level M.
#[derive(Debug, Default, Clone, Copy)]
pub struct QrEncoder;

impl ArtifactEncoder for QrEncoder {
    fn encode(&self, payload: &str, config: &RenderConfig) -> Result<Artifact, EncodingFailure> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M).map_err(
            |e| match e {
                qrcode::types::QrError::DataTooLong => EncodingFailure::PayloadTooLarge(payload.len()),
                other => EncodingFailure::Qr(other.to_string()),
            },
        )?;

        let image = rasterize(&code, config);
        let (width, height) = image.dimensions();

        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| EncodingFailure::Render(e.to_string()))?;

        log::debug!(
            "Encoded {} byte payload as {}x{} QR ({} modules)",
            payload.len(),
            width,
            height,
            code.width()
        );

        Ok(Artifact {
            payload: payload.to_string(),
            width,
            height,
            pixels: image.into_raw(),
            png,
        })
    }
}

/// Draw the module matrix with whole-pixel modules and a quiet zone.
fn rasterize(code: &QrCode, config: &RenderConfig) -> RgbaImage {
    let modules = code.width() as u32;
    let total = modules + 2 * config.margin;
    let scale = (config.pixel_width / total).max(1);
    let side = total * scale;

    let light = Rgba(config.background.0);
    let dark = Rgba(config.foreground.0);
    let mut image = RgbaImage::from_pixel(side, side, light);

    let colors = code.to_colors();
    for (i, color) in colors.iter().enumerate() {
        if *color != qrcode::Color::Dark {
            continue;
        }
        let mx = (i as u32 % modules) + config.margin;
        let my = (i as u32 / modules) + config.margin;
        for y in my * scale..(my + 1) * scale {
            for x in mx * scale..(mx + 1) * scale {
                image.put_pixel(x, y, dark);
            }
        }
    }

    image
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Read a QR artifact back into its text content.
    pub(crate) fn decode_qr(png: &[u8]) -> String {
        let img = image::load_from_memory(png).unwrap().to_luma8();
        let (w, h) = img.dimensions();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(w as usize, h as usize, |x, y| {
            img.get_pixel(x as u32, y as u32).0[0]
        });
        let grids = prepared.detect_grids();
        assert_eq!(grids.len(), 1, "expected exactly one QR code");
        let (_, content) = grids[0].decode().unwrap();
        content
    }

    #[test]
    fn test_round_trip_through_data_url() {
        let payload = r#"{"name":"Jane Doe","batch":"2020","branch":"Computer Science and Engineering","photoUrl":""}"#;
        let artifact = QrEncoder.encode(payload, &RenderConfig::default()).unwrap();

        let png = png_from_data_url(&artifact.data_url()).unwrap();
        assert_eq!(png, artifact.png());
        assert_eq!(decode_qr(&png), payload);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let config = RenderConfig::default();
        let a = QrEncoder.encode("same payload", &config).unwrap();
        let b = QrEncoder.encode("same payload", &config).unwrap();
        let c = QrEncoder.encode("other payload", &config).unwrap();

        assert_eq!(a.png(), b.png());
        assert_eq!(a.data_url(), b.data_url());
        assert_ne!(a.png(), c.png());
    }

    #[test]
    fn test_image_fits_requested_width() {
        let artifact = QrEncoder.encode("hello", &RenderConfig::default()).unwrap();
        let (w, h) = artifact.size();
        assert_eq!(w, h);
        assert!(w <= 200 && w > 150, "width {}", w);
        assert_eq!(artifact.pixels().len(), (w * h * 4) as usize);
    }

    #[test]
    fn test_quiet_zone_uses_background() {
        let config = RenderConfig {
            background: HexColor([10, 20, 30, 255]),
            ..RenderConfig::default()
        };
        let artifact = QrEncoder.encode("hello", &config).unwrap();
        assert_eq!(&artifact.pixels()[0..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_oversized_payload_fails() {
        let payload = "x".repeat(4000);
        let err = QrEncoder.encode(&payload, &RenderConfig::default()).unwrap_err();
        assert_eq!(err, EncodingFailure::PayloadTooLarge(4000));
    }

    #[test]
    fn test_hex_color_parsing() {
        assert_eq!(HexColor::try_from("#000000".to_string()), Ok(HexColor::BLACK));
        assert_eq!(
            HexColor::try_from("ff000080".to_string()),
            Ok(HexColor([255, 0, 0, 128]))
        );
        assert!(HexColor::try_from("#fff".to_string()).is_err());
        assert!(HexColor::try_from("#gggggg".to_string()).is_err());
        assert_eq!(HexColor([255, 0, 0, 128]).to_string(), "#ff000080");
        assert_eq!(HexColor::WHITE.to_string(), "#ffffff");
    }

    #[test]
    fn test_rejects_non_data_urls() {
        assert!(png_from_data_url("https://example.com/qr.png").is_err());
        assert!(!is_png_data_url("data:image/png;base64,"));
        assert!(is_png_data_url("data:image/png;base64,iVBO"));
    }

    #[test]
    fn test_serialization_error_becomes_failure() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let failure = EncodingFailure::from(err);
        assert!(matches!(failure, EncodingFailure::Payload(_)));
        assert!(failure.to_string().starts_with("could not serialize record"));
    }
}
