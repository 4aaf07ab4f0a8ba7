//! TrueType text for titles and labels.

use crate::types::{ZooError, ZooResult};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use std::path::{Path, PathBuf};

/// Fonts tried when no explicit font is configured
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub struct TextRenderer {
    font: Font<'static>,
}

impl TextRenderer {
    pub fn from_bytes(bytes: Vec<u8>) -> ZooResult<Self> {
        Font::try_from_vec(bytes)
            .map(|font| Self { font })
            .ok_or_else(|| ZooError::Render("Invalid TrueType font data".to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> ZooResult<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(bytes)
    }

    /// Load the configured font, else the first usable system font.
    ///
    /// Returns `None` (after a warning) when no font can be loaded; the
    /// figure is then drawn without text.
    pub fn load(explicit: Option<&Path>) -> Option<Self> {
        let candidates: Vec<PathBuf> = explicit
            .map(Path::to_path_buf)
            .into_iter()
            .chain(SYSTEM_FONTS.iter().map(PathBuf::from))
            .collect();

        for path in &candidates {
            if !path.is_file() {
                continue;
            }
            match Self::from_file(path) {
                Ok(text) => {
                    log::debug!("Using font {}", path.display());
                    return Some(text);
                }
                Err(e) => log::warn!("Cannot use font {}: {}", path.display(), e),
            }
        }

        log::warn!("No usable TrueType font found, text will be omitted (set EOSZOO_FONT)");
        None
    }

    /// Width and height in pixels of `text` at `size`
    pub fn measure(&self, text: &str, size: f32) -> (i32, i32) {
        text_size(Scale::uniform(size), &self.font, text)
    }

    /// Draw with the top-left corner at (x, y)
    pub fn draw(&self, image: &mut RgbaImage, text: &str, x: i32, y: i32, size: f32, color: Rgba<u8>) {
        draw_text_mut(image, color, x, y, Scale::uniform(size), &self.font, text);
    }

    /// Draw horizontally centred on `cx`
    pub fn draw_centered(
        &self,
        image: &mut RgbaImage,
        text: &str,
        cx: i32,
        y: i32,
        size: f32,
        color: Rgba<u8>,
    ) {
        let (w, _) = self.measure(text, size);
        self.draw(image, text, cx - w / 2, y, size, color);
    }

    /// Draw right-aligned so the text ends at `right`
    pub fn draw_right(
        &self,
        image: &mut RgbaImage,
        text: &str,
        right: i32,
        y: i32,
        size: f32,
        color: Rgba<u8>,
    ) {
        let (w, _) = self.measure(text, size);
        self.draw(image, text, right - w, y, size, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_font_bytes() {
        assert!(TextRenderer::from_bytes(vec![0u8; 16]).is_err());
    }

    #[test]
    fn test_missing_explicit_font_falls_through() {
        // Either a system font is picked up or nothing is; neither may panic
        let _ = TextRenderer::load(Some(Path::new("/nonexistent/font.ttf")));
    }
}
