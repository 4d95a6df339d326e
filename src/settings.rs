use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::export::MIN_EXPORT_SCALE;

pub const APP_FOLDER_NAME: &str = "TimetableMaker";
pub const SETTINGS_VERSION: &str = "0.1.0";

fn default_slot_count() -> usize {
    5
}

fn default_export_scale() -> u32 {
    MIN_EXPORT_SCALE
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExportSettings {
    #[serde(default = "default_export_scale")]
    pub scale: u32,
    /// Where console exports land. Defaults to `<base>/exports`.
    #[serde(default)]
    pub directory: Option<String>,
    /// Extra TTF/OTF files tried before the built-in fonts, e.g. for Devanagari names.
    #[serde(default)]
    pub font_files: Vec<String>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            scale: default_export_scale(),
            directory: None,
            font_files: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UiSettings {
    #[serde(default)]
    pub last_theme: Option<String>,
    #[serde(default)]
    pub window_size: Option<(f32, f32)>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Settings {
    pub version: String,
    pub base_path: String,
    pub mode: String,
    /// Pre-filled value of the "No. of Time Slots" input.
    #[serde(default = "default_slot_count")]
    pub default_slot_count: usize,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub ui: UiSettings,
}

impl Settings {
    pub fn defaults_for(base: &Path) -> Self {
        Self {
            version: SETTINGS_VERSION.to_string(),
            base_path: base.to_string_lossy().to_string(),
            mode: "gui".to_string(),
            default_slot_count: default_slot_count(),
            export: ExportSettings::default(),
            ui: UiSettings::default(),
        }
    }

    pub fn export_dir(&self) -> PathBuf {
        match &self.export.directory {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => Path::new(&self.base_path).join("exports"),
        }
    }
}

pub fn default_base_path() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()));

    if let Some(dir) = exe_dir {
        return dir.join("data");
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_FOLDER_NAME)
}

pub fn ensure_base_folders(base: &Path) -> io::Result<()> {
    let dirs = [
        base.to_path_buf(),
        base.join("config"),
        base.join("storage"),
        base.join("exports"),
        base.join("themes"),
    ];

    for d in dirs {
        if !d.exists() {
            fs::create_dir_all(&d)?;
        }
    }

    Ok(())
}

pub fn settings_path(base: &Path) -> PathBuf {
    base.join("config").join("settings.json")
}

/// Loads `config/settings.json`, writing defaults on first run.
///
/// A file that cannot be read or parsed is moved aside to `settings.json.bak` and replaced
/// by defaults. Only failing to write the new file is an error.
pub fn load_or_init_settings(base: &Path) -> io::Result<Settings> {
    let config_path = settings_path(base);

    if config_path.exists() {
        match read_settings(&config_path) {
            Ok(mut settings) => {
                // Ensure base_path stays in sync with the current base
                if settings.base_path != base.to_string_lossy() {
                    settings.base_path = base.to_string_lossy().to_string();
                }
                return Ok(settings);
            }
            Err(e) => {
                warn!(path = %config_path.display(), "unreadable settings, using defaults: {e}");
                if let Err(e) = fs::rename(&config_path, backup_path(base)) {
                    warn!("could not keep a copy of the old settings: {e}");
                }
            }
        }
    }

    let settings = Settings::defaults_for(base);
    save_settings(&settings, base)?;
    Ok(settings)
}

fn backup_path(base: &Path) -> PathBuf {
    settings_path(base).with_extension("json.bak")
}

fn read_settings(path: &Path) -> io::Result<Settings> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("JSON parse error: {e}")))
}

pub fn save_settings(settings: &Settings, base: &Path) -> io::Result<()> {
    let config_path = settings_path(base);
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("JSON encode error: {e}")))?;
    fs::write(&config_path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_run_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        ensure_base_folders(dir.path()).unwrap();
        for sub in ["config", "storage", "exports", "themes"] {
            assert!(dir.path().join(sub).is_dir(), "{sub} missing");
        }

        let settings = load_or_init_settings(dir.path()).unwrap();
        assert!(settings_path(dir.path()).exists());
        assert_eq!(settings.default_slot_count, 5);
        assert_eq!(settings.export.scale, 2);
        assert_eq!(settings.export_dir(), dir.path().join("exports"));
    }

    #[test]
    fn older_files_fill_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = settings_path(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{ "version": "0.0.9", "base_path": "/elsewhere", "mode": "cli" }"#,
        )
        .unwrap();

        let settings = load_or_init_settings(dir.path()).unwrap();
        assert_eq!(settings.mode, "cli");
        assert_eq!(settings.base_path, dir.path().to_string_lossy());
        assert_eq!(settings.default_slot_count, 5);
        assert!(settings.ui.last_theme.is_none());
    }

    #[test]
    fn save_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::defaults_for(dir.path());
        settings.export.directory = Some("/tmp/timetables".into());
        settings.ui.last_theme = Some("chalkboard_dark".into());
        save_settings(&settings, dir.path()).unwrap();

        let reloaded = load_or_init_settings(dir.path()).unwrap();
        assert_eq!(reloaded.export_dir(), PathBuf::from("/tmp/timetables"));
        assert_eq!(reloaded.ui.last_theme.as_deref(), Some("chalkboard_dark"));
    }

    #[test]
    fn corrupt_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = settings_path(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{").unwrap();

        let settings = load_or_init_settings(dir.path()).unwrap();
        assert_eq!(settings.mode, "gui");
        assert_eq!(settings.default_slot_count, 5);
        assert_eq!(settings.base_path, dir.path().to_string_lossy());
        assert_eq!(fs::read_to_string(backup_path(dir.path())).unwrap(), "{");

        let reread = load_or_init_settings(dir.path()).unwrap();
        assert_eq!(reread.export.scale, 2);
        assert!(reread.export.font_files.is_empty());
    }
}
