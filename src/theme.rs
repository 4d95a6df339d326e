use eframe::egui::{self, Color32, Context, Rounding};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_THEME: &str = "campus_light";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub name: String,
    pub surface: String,
    pub panel: String,
    pub text: String,
    pub muted_text: String,
    pub accent: String,
    pub accent_soft: String,
    pub border: String,
    /// Fill for destructive buttons (clear subjects, clear all data).
    pub danger: String,
    pub radius: f32,
    pub font_size_base: f32,
}

impl ThemeConfig {
    /// Colour for hints and empty-state text.
    pub fn muted(&self) -> Color32 {
        parse_color(&self.muted_text)
    }
}

pub fn themes_dir(base: &Path) -> PathBuf {
    base.join("themes")
}

pub fn presets_file(base: &Path) -> PathBuf {
    themes_dir(base).join("presets.json")
}

/// Seeds `themes/presets.json` so users can edit or add presets.
pub fn ensure_theme_files(base: &Path) -> io::Result<()> {
    let dir = themes_dir(base);
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
    }

    let presets_path = presets_file(base);
    if !presets_path.exists() {
        let json = serde_json::to_string_pretty(&default_presets())?;
        fs::write(&presets_path, json)?;
    }
    Ok(())
}

pub fn load_presets(base: &Path) -> Vec<ThemeConfig> {
    if let Ok(contents) = fs::read_to_string(presets_file(base)) {
        if let Ok(list) = serde_json::from_str::<Vec<ThemeConfig>>(&contents) {
            if !list.is_empty() {
                return list;
            }
        }
    }
    default_presets()
}

/// The preset named `preferred`, else the default preset, else the first one.
pub fn resolve_theme(presets: &[ThemeConfig], preferred: Option<&str>) -> ThemeConfig {
    let wanted = preferred.unwrap_or(DEFAULT_THEME);
    presets
        .iter()
        .find(|p| p.name == wanted)
        .or_else(|| presets.iter().find(|p| p.name == DEFAULT_THEME))
        .or_else(|| presets.first())
        .cloned()
        .unwrap_or_else(|| default_presets().remove(0))
}

pub fn apply_theme(theme: &ThemeConfig, ctx: &Context) {
    let mut style = (*ctx.style()).clone();
    let mut visuals = if is_dark(theme) {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };

    visuals.panel_fill = parse_color(&theme.panel);
    visuals.extreme_bg_color = parse_color(&theme.surface);
    visuals.widgets.noninteractive.bg_fill = parse_color(&theme.surface);
    visuals.widgets.noninteractive.fg_stroke.color = parse_color(&theme.text);
    visuals.widgets.noninteractive.bg_stroke.color = parse_color(&theme.border);
    visuals.widgets.inactive.bg_fill = parse_color(&theme.surface);
    visuals.widgets.inactive.weak_bg_fill = parse_color(&theme.surface);
    visuals.widgets.inactive.fg_stroke.color = parse_color(&theme.text);
    visuals.widgets.inactive.bg_stroke.color = parse_color(&theme.border);

    for state in [&mut visuals.widgets.hovered, &mut visuals.widgets.active] {
        state.bg_fill = parse_color(&theme.accent_soft);
        state.weak_bg_fill = parse_color(&theme.accent_soft);
        state.bg_stroke.color = parse_color(&theme.accent);
        state.fg_stroke.color = parse_color(&theme.text);
    }
    visuals.selection.bg_fill = parse_color(&theme.accent_soft);
    visuals.selection.stroke.color = parse_color(&theme.accent);
    visuals.striped = true;

    let rounding = Rounding::same(theme.radius);
    visuals.window_rounding = rounding;
    visuals.widgets.noninteractive.rounding = rounding;
    visuals.widgets.inactive.rounding = rounding;
    visuals.widgets.hovered.rounding = rounding;
    visuals.widgets.active.rounding = rounding;

    style.text_styles = [
        (
            egui::TextStyle::Small,
            egui::FontId::proportional(theme.font_size_base - 2.0),
        ),
        (
            egui::TextStyle::Body,
            egui::FontId::proportional(theme.font_size_base),
        ),
        (
            egui::TextStyle::Button,
            egui::FontId::proportional(theme.font_size_base),
        ),
        (
            egui::TextStyle::Heading,
            egui::FontId::proportional(theme.font_size_base + 6.0),
        ),
        (
            egui::TextStyle::Monospace,
            egui::FontId::monospace(theme.font_size_base - 1.0),
        ),
    ]
    .into();
    style.visuals = visuals;
    ctx.set_style(style);
}

fn is_dark(theme: &ThemeConfig) -> bool {
    let bg = parse_color(&theme.panel);
    // Rec. 709 luma; below the midpoint reads as a dark theme.
    let luminance = 0.2126 * (bg.r() as f32) + 0.7152 * (bg.g() as f32) + 0.0722 * (bg.b() as f32);
    luminance < 128.0
}

/// `#rrggbb` or `#rrggbbaa`; anything else is light gray.
pub fn parse_color(hex: &str) -> Color32 {
    let h = hex.trim_start_matches('#');
    if h.len() == 6 {
        if let Ok(rgb) = u32::from_str_radix(h, 16) {
            let [_, r, g, b] = rgb.to_be_bytes();
            return Color32::from_rgb(r, g, b);
        }
    } else if h.len() == 8 {
        if let Ok(rgba) = u32::from_str_radix(h, 16) {
            let [r, g, b, a] = rgba.to_be_bytes();
            return Color32::from_rgba_unmultiplied(r, g, b, a);
        }
    }
    Color32::LIGHT_GRAY
}

pub fn default_presets() -> Vec<ThemeConfig> {
    vec![
        ThemeConfig {
            name: "campus_light".to_string(),
            surface: "#f4f6f9".to_string(),
            panel: "#ffffff".to_string(),
            text: "#1d2733".to_string(),
            muted_text: "#5f6f80".to_string(),
            accent: "#3a6ea5".to_string(),
            accent_soft: "#dce7f3".to_string(),
            border: "#c9d1db".to_string(),
            danger: "#c0392b".to_string(),
            radius: 4.0,
            font_size_base: 15.0,
        },
        ThemeConfig {
            name: "slate_dark".to_string(),
            surface: "#222a33".to_string(),
            panel: "#171d24".to_string(),
            text: "#e3eaf2".to_string(),
            muted_text: "#97a6b6".to_string(),
            accent: "#5aa9e6".to_string(),
            accent_soft: "#24405a".to_string(),
            border: "#34404d".to_string(),
            danger: "#e06c5f".to_string(),
            radius: 4.0,
            font_size_base: 15.0,
        },
        ThemeConfig {
            name: "print_contrast".to_string(),
            surface: "#ffffff".to_string(),
            panel: "#ffffff".to_string(),
            text: "#000000".to_string(),
            muted_text: "#333333".to_string(),
            accent: "#000000".to_string(),
            accent_soft: "#e6e6e6".to_string(),
            border: "#000000".to_string(),
            danger: "#b00020".to_string(),
            radius: 0.0,
            font_size_base: 17.0,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_parse_or_fall_back() {
        assert_eq!(parse_color("#3a6ea5"), Color32::from_rgb(0x3a, 0x6e, 0xa5));
        assert_eq!(parse_color("ffffffff"), Color32::WHITE);
        assert_eq!(parse_color("not a color"), Color32::LIGHT_GRAY);
    }

    #[test]
    fn presets_have_distinct_muted_text() {
        for preset in default_presets() {
            assert_ne!(preset.muted(), Color32::LIGHT_GRAY, "{}", preset.name);
            assert_ne!(preset.muted(), parse_color(&preset.text), "{}", preset.name);
        }
    }

    #[test]
    fn preset_lookup_falls_back_to_default() {
        let presets = default_presets();
        assert_eq!(resolve_theme(&presets, Some("slate_dark")).name, "slate_dark");
        assert_eq!(resolve_theme(&presets, Some("missing")).name, DEFAULT_THEME);
        assert_eq!(resolve_theme(&presets, None).name, DEFAULT_THEME);
        assert_eq!(resolve_theme(&[], None).name, DEFAULT_THEME);
    }

    #[test]
    fn presets_are_seeded_and_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        ensure_theme_files(dir.path()).unwrap();
        assert!(presets_file(dir.path()).exists());
        let names: Vec<String> = load_presets(dir.path()).into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["campus_light", "slate_dark", "print_contrast"]);
        assert!(is_dark(&resolve_theme(&default_presets(), Some("slate_dark"))));
    }
}
