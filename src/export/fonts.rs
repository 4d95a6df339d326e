//! Fonts for export text.
//!
//! Glyphs are looked up along a chain: font files named in settings, then well-known
//! system fonts with wide script coverage, then the fonts egui ships with. The first font
//! that has a glyph for a character draws it.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ab_glyph::{Font, FontArc, FontRef, FontVec, GlyphId, InvalidFont};
use eframe::egui::{FontDefinitions, FontFamily};
use tracing::{debug, warn};

/// Checked in order when present. Covers Devanagari and other Indic scripts.
const SYSTEM_FALLBACKS: &[&str] = &[
    "C:\\Windows\\Fonts\\Nirmala.ttf",
    "/usr/share/fonts/truetype/noto/NotoSansDevanagari-Regular.ttf",
    "/usr/share/fonts/noto/NotoSansDevanagari-Regular.ttf",
    "/usr/share/fonts/truetype/lohit-devanagari/Lohit-Devanagari.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
];

#[derive(Clone)]
pub struct FontSet {
    fonts: Arc<Vec<FontArc>>,
}

impl FontSet {
    /// egui's proportional family, in its own fallback order.
    pub fn bundled() -> Self {
        Self {
            fonts: Arc::new(bundled_fonts()),
        }
    }

    /// Configured files, then system fallbacks, then the bundled fonts.
    pub fn for_export(configured: &[String]) -> Self {
        let mut fonts = Vec::new();
        for path in configured.iter().map(PathBuf::from) {
            match read_font(&path) {
                Ok(font) => fonts.push(font),
                Err(e) => warn!(path = %path.display(), "skipping export font: {e}"),
            }
        }
        for path in SYSTEM_FALLBACKS.iter().map(Path::new) {
            if !path.exists() {
                continue;
            }
            match read_font(path) {
                Ok(font) => {
                    debug!(path = %path.display(), "using system font for export");
                    fonts.push(font);
                }
                Err(e) => warn!(path = %path.display(), "unreadable system font: {e}"),
            }
        }
        fonts.extend(bundled_fonts());
        Self {
            fonts: Arc::new(fonts),
        }
    }

    /// The font whose metrics set the line height and baseline.
    pub fn primary(&self) -> Option<&FontArc> {
        self.fonts.first()
    }

    /// First font with a real glyph for `c`.
    pub fn lookup(&self, c: char) -> Option<(&FontArc, GlyphId)> {
        self.fonts.iter().find_map(|font| {
            let id = font.glyph_id(c);
            (id.0 != 0).then_some((font, id))
        })
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet").field("fonts", &self.len()).finish()
    }
}

fn bundled_fonts() -> Vec<FontArc> {
    let defs = FontDefinitions::default();
    let names = defs
        .families
        .get(&FontFamily::Proportional)
        .cloned()
        .unwrap_or_default();
    names
        .iter()
        .filter_map(|name| {
            let data = defs.font_data.get(name)?;
            match load_font(data.font.clone(), data.index) {
                Ok(font) => Some(font),
                Err(e) => {
                    warn!(font = %name, "bundled font failed to load: {e}");
                    None
                }
            }
        })
        .collect()
}

fn load_font(bytes: Cow<'static, [u8]>, index: u32) -> Result<FontArc, InvalidFont> {
    match bytes {
        Cow::Borrowed(slice) => FontRef::try_from_slice_and_index(slice, index).map(FontArc::from),
        Cow::Owned(vec) => FontVec::try_from_vec_and_index(vec, index).map(FontArc::from),
    }
}

fn read_font(path: &Path) -> std::io::Result<FontArc> {
    let bytes = fs::read(path)?;
    FontVec::try_from_vec(bytes)
        .map(FontArc::from)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_fonts_cover_latin() {
        let fonts = FontSet::bundled();
        assert!(!fonts.is_empty());
        assert!(fonts.primary().is_some());
        for c in ['A', 'z', '0', ':', '(', 'é', 'ü'] {
            assert!(fonts.lookup(c).is_some(), "no glyph for {c:?}");
        }
    }

    #[test]
    fn unknown_code_points_have_no_glyph() {
        assert!(FontSet::bundled().lookup('\u{10FFFD}').is_none());
    }

    #[test]
    fn unreadable_configured_fonts_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("not-a-font.ttf");
        fs::write(&bogus, b"definitely not a font").unwrap();
        let configured = vec![
            bogus.to_string_lossy().to_string(),
            dir.path().join("missing.ttf").to_string_lossy().to_string(),
        ];
        let fonts = FontSet::for_export(&configured);
        assert!(fonts.len() >= FontSet::bundled().len());
        assert!(fonts.lookup('A').is_some());
    }
}
