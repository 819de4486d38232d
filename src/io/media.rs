// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Photo loading.
//!
//! This module handles loading local photos, shrinking them to a size
//! suitable for the card, and converting them to RGBA pixels for display
//! in egui. Loading runs on a background thread and reports back over a
//! channel that the UI polls each frame.

use anyhow::{Context, Result};
use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use url::Url;

/// Longest side of a photo kept in memory.
const MAX_PHOTO_SIDE: u32 = 512;

/// File extensions offered by the photo picker and accepted on drop.
pub const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "bmp", "gif", "webp", "tiff"];

/// A decoded image as RGBA8 pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl std::fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LoadedImage({}x{})", self.width, self.height)
    }
}

impl LoadedImage {
    pub fn to_color_image(&self) -> egui::ColorImage {
        let size = [self.width as usize, self.height as usize];
        egui::ColorImage::from_rgba_unmultiplied(size, &self.pixels)
    }
}

/// Load an image file, shrinking it so neither side exceeds the card limit.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let img = image::open(path).with_context(|| format!("cannot read {}", path.display()))?;
    let img = if img.width() > MAX_PHOTO_SIDE || img.height() > MAX_PHOTO_SIDE {
        img.resize(MAX_PHOTO_SIDE, MAX_PHOTO_SIDE, FilterType::Lanczos3)
    } else {
        img
    };
    let rgba = img.to_rgba8();

    Ok(LoadedImage {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

/// Decode PNG bytes held in memory.
pub fn load_png(bytes: &[u8]) -> Result<LoadedImage> {
    let rgba = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)?.to_rgba8();
    Ok(LoadedImage {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

/// Load a photo on a background thread.
pub fn spawn_load(path: PathBuf) -> Receiver<Result<PhotoResource, String>> {
    let (sender, receiver) = channel();

    std::thread::spawn(move || {
        let result = load_image(&path)
            .map(|image| {
                log::info!("Loaded photo: {} ({}x{})", path.display(), image.width, image.height);
                PhotoResource { path, image }
            })
            .map_err(|e| format!("{:#}", e));
        let _ = sender.send(result);
    });

    receiver
}

/// Whether a path has an extension the photo picker accepts.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// A locally chosen photo, decoded and ready to be referenced.
#[derive(Debug, Clone)]
pub struct PhotoResource {
    pub path: PathBuf,
    pub image: LoadedImage,
}

/// Displayable reference to a chosen photo.
///
/// Cloning shares the decoded pixels; they are released when the last
/// clone is dropped.
#[derive(Debug, Clone)]
pub struct PhotoRef {
    url: String,
    image: Arc<LoadedImage>,
}

impl PhotoRef {
    pub fn from_resource(resource: PhotoResource) -> Self {
        Self {
            url: file_url(&resource.path),
            image: Arc::new(resource.image),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn image(&self) -> &LoadedImage {
        &self.image
    }

    #[cfg(test)]
    pub fn downgrade(&self) -> std::sync::Weak<LoadedImage> {
        Arc::downgrade(&self.image)
    }
}

/// `file://` URL for a local path, percent-encoded.
///
/// Falls back to the plain path text when no URL can be formed; the
/// photo field accepts plain paths as well.
pub fn file_url(path: &Path) -> String {
    let absolute = std::fs::canonicalize(path)
        .or_else(|_| std::env::current_dir().map(|dir| dir.join(path)))
        .unwrap_or_else(|_| path.to_path_buf());
    match Url::from_file_path(&absolute) {
        Ok(url) => url.to_string(),
        Err(()) => absolute.to_string_lossy().into_owned(),
    }
}

/// Local path behind a photo URL, if it points at the local file system.
///
/// Plain paths are accepted too since the photo URL may be typed by hand.
pub fn path_from_url(url: &str) -> Option<PathBuf> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    match Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "file" => parsed.to_file_path().ok(),
        // A single letter scheme is a Windows drive, not a URL.
        Ok(parsed) if parsed.scheme().len() == 1 => Some(PathBuf::from(url)),
        Ok(_) => None,
        Err(_) => Some(PathBuf::from(url)),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn tiny_resource(name: &str) -> PhotoResource {
        PhotoResource {
            path: PathBuf::from(format!("/photos/{}", name)),
            image: LoadedImage {
                width: 1,
                height: 1,
                pixels: vec![255, 0, 0, 255],
            },
        }
    }

    #[test]
    fn test_photo_ref_derives_file_url() {
        let photo = PhotoRef::from_resource(tiny_resource("jane.png"));
        assert!(photo.url().starts_with("file://"));
        assert!(photo.url().ends_with("/photos/jane.png"));
    }

    #[test]
    fn test_photo_released_with_last_reference() {
        let photo = PhotoRef::from_resource(tiny_resource("jane.png"));
        let weak = photo.downgrade();
        let shared = photo.clone();

        drop(photo);
        assert!(weak.upgrade().is_some());
        drop(shared);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_path_from_url() {
        assert_eq!(path_from_url("file:///tmp/a.png"), Some(PathBuf::from("/tmp/a.png")));
        assert_eq!(path_from_url("/tmp/a.png"), Some(PathBuf::from("/tmp/a.png")));
        assert_eq!(path_from_url("C:/a.png"), Some(PathBuf::from("C:/a.png")));
        assert_eq!(path_from_url("https://example.com/a.png"), None);
        assert_eq!(path_from_url("data:image/png;base64,iVBO"), None);
        assert_eq!(path_from_url("  "), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_url_escapes_reserved_characters() {
        let path = Path::new("/photos/my photo #1?.png");
        let url = file_url(path);
        assert_eq!(url, "file:///photos/my%20photo%20%231%3F.png");

        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.fragment(), None);
        assert_eq!(parsed.query(), None);
        assert_eq!(path_from_url(&url), Some(path.to_path_buf()));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_url_round_trips_percent_sign() {
        let path = Path::new("/photos/100% me.png");
        let url = file_url(path);
        assert_eq!(url, "file:///photos/100%25%20me.png");
        assert_eq!(path_from_url(&url), Some(path.to_path_buf()));
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_image(Path::new("me.JPG")));
        assert!(is_supported_image(Path::new("/a/b/me.png")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("noext")));
    }

    #[test]
    fn test_load_image_shrinks_large_photos() {
        let path = std::env::temp_dir().join("alumni-card-media-test.png");
        image::RgbaImage::from_pixel(1024, 256, image::Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();

        let loaded = load_image(&path).unwrap();
        assert_eq!((loaded.width, loaded.height), (512, 128));
        assert_eq!(loaded.pixels.len(), 512 * 128 * 4);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_image_missing_file() {
        assert!(load_image(Path::new("/definitely/not/here.png")).is_err());
    }
}
