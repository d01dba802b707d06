//! Persistent user settings in a JSON file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "inktools";
const SETTINGS_FILE: &str = "settings.json";

pub const MAX_RECENT_FILES: usize = 16;
pub const MAX_PIXEL_SAMPLER_MODE: i32 = 1;

fn is_zero(n: &i32) -> bool {
    *n == 0
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Saved position and size of a window.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowState {
    #[serde(skip_serializing_if = "is_zero")]
    pub x: i32,
    #[serde(skip_serializing_if = "is_zero")]
    pub y: i32,
    #[serde(skip_serializing_if = "is_zero")]
    pub width: i32,
    #[serde(skip_serializing_if = "is_zero")]
    pub height: i32,
    #[serde(skip_serializing_if = "is_false")]
    pub maximized: bool,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "mainwindow")]
    pub main_window: WindowState,
    pub image_sample_directory: Option<PathBuf>,
    pub database_file_name: Option<PathBuf>,
    pub pixel_sampler_mode: i32,
    #[serde(rename = "recentfiles", skip_serializing_if = "Vec::is_empty")]
    pub recent_files: Vec<PathBuf>,
}

impl Settings {
    /// Default settings file location.
    pub fn default_path() -> Option<PathBuf> {
        let config_dir = match std::env::var_os("XDG_CONFIG_HOME") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => PathBuf::from(std::env::var_os("HOME")?).join(".config"),
        };
        Some(config_dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Load settings, a missing file gives the default settings.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No settings file at {path:?}, using defaults");
            return Ok(Default::default());
        }

        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {path:?}"))?;
        let mut settings: Settings = serde_json::from_str(&text)
            .with_context(|| format!("error in settings file {path:?}"))?;
        settings.normalize();
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)? + "\n")
            .with_context(|| format!("failed to write settings {path:?}"))?;
        Ok(())
    }

    /// Remember a file in the recent files list.
    ///
    /// Files already on the list stay where they are, the oldest entry is
    /// dropped when the list grows too long.
    pub fn add_recent_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if path.as_os_str().is_empty() || self.recent_files.contains(&path) {
            return;
        }
        self.recent_files.push(path);
        if self.recent_files.len() > MAX_RECENT_FILES {
            self.recent_files.remove(0);
        }
    }

    fn normalize(&mut self) {
        self.pixel_sampler_mode =
            self.pixel_sampler_mode.clamp(0, MAX_PIXEL_SAMPLER_MODE);

        let files = std::mem::take(&mut self.recent_files);
        for file in files {
            let trimmed = file.to_string_lossy().trim().to_owned();
            self.add_recent_file(trimmed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join(SETTINGS_FILE);

        let mut settings = Settings::default();
        settings.main_window.width = 800;
        settings.main_window.maximized = true;
        settings.database_file_name = Some("/tmp/inks.org".into());
        settings.add_recent_file("/tmp/inks.org");
        settings.save(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"mainwindow\""));
        assert!(text.contains("\"recentfiles\""));
        // Zero geometry isn't written out.
        assert!(!text.contains("\"height\""));

        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_load_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(
            &path,
            r#"{
  "pixel_sampler_mode": 9,
  "recentfiles": ["a.org", "  ", "b.org ", "a.org"],
  "unknown_key": true
}"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.pixel_sampler_mode, MAX_PIXEL_SAMPLER_MODE);
        assert_eq!(
            settings.recent_files,
            vec![PathBuf::from("a.org"), PathBuf::from("b.org")]
        );
    }

    #[test]
    fn test_negative_sampler_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, r#"{"pixel_sampler_mode": -4}"#).unwrap();
        assert_eq!(Settings::load(&path).unwrap().pixel_sampler_mode, 0);
    }

    #[test]
    fn test_bad_types_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, r#"{"recentfiles": [1, 2]}"#).unwrap();
        let err = Settings::load(&path).unwrap_err();
        assert!(format!("{err}").contains("error in settings file"));
    }

    #[test]
    fn test_recent_files_limit() {
        let mut settings = Settings::default();
        for i in 0..20 {
            settings.add_recent_file(format!("{i}.org"));
        }
        settings.add_recent_file("19.org");
        assert_eq!(settings.recent_files.len(), MAX_RECENT_FILES);
        assert_eq!(settings.recent_files[0], PathBuf::from("4.org"));
        assert_eq!(settings.recent_files[15], PathBuf::from("19.org"));
    }
}
