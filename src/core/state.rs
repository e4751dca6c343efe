//! Application settings
//!
//! Persisted to `<data dir>/Project Bookmarks/app_settings.json`. Missing or
//! unreadable settings fall back to defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::policy::{ScanOptions, SkipPolicy};

const APP_DIR_NAME: &str = "Project Bookmarks";
const DATABASE_FILE: &str = "projects.db";

/// Application-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Database file; defaults to `projects.db` in the app data directory
    pub database_path: Option<PathBuf>,
    /// Wait before measuring a newly added project
    pub initial_delay_ms: u64,
    /// Timeout for measuring one project
    pub single_timeout_secs: u64,
    /// Timeout for each project during "recalculate all"
    pub bulk_timeout_secs: u64,
    /// Deepest directory level entered during a scan
    pub max_depth: usize,
    /// Directory names to skip in addition to the built-in presets
    pub extra_excluded_dirs: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            database_path: None,
            initial_delay_ms: 100,
            single_timeout_secs: 60,
            bulk_timeout_secs: 30,
            max_depth: crate::core::DEFAULT_MAX_DEPTH,
            extra_excluded_dirs: Vec::new(),
        }
    }
}

/// Timing knobs for the size scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub initial_delay: Duration,
    pub single_timeout: Duration,
    pub bulk_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        AppSettings::default().scheduler_config()
    }
}

impl AppSettings {
    const SETTINGS_FILE: &'static str = "app_settings.json";

    /// Get the app data directory, creating it if needed
    pub fn app_data_dir() -> Result<PathBuf, String> {
        let data_dir =
            dirs::data_dir().ok_or_else(|| "Could not determine data directory".to_string())?;

        let app_dir = data_dir.join(APP_DIR_NAME);

        if !app_dir.exists() {
            std::fs::create_dir_all(&app_dir)
                .map_err(|e| format!("Failed to create app data directory: {}", e))?;
        }

        Ok(app_dir)
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        match Self::try_load() {
            Ok(settings) => {
                log::debug!("Loaded app settings from disk");
                settings
            }
            Err(e) => {
                log::debug!("Using default app settings: {}", e);
                Self::default()
            }
        }
    }

    fn try_load() -> Result<Self, String> {
        Self::load_from(&Self::app_data_dir()?.join(Self::SETTINGS_FILE))
    }

    fn load_from(settings_path: &Path) -> Result<Self, String> {
        if !settings_path.exists() {
            return Err("Settings file not found".to_string());
        }

        let contents = std::fs::read_to_string(settings_path)
            .map_err(|e| format!("Failed to read settings: {}", e))?;

        Self::from_json(&contents)
    }

    fn from_json(contents: &str) -> Result<Self, String> {
        serde_json::from_str(contents).map_err(|e| format!("Failed to parse settings: {}", e))
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::app_data_dir()?.join(Self::SETTINGS_FILE))
    }

    fn save_to(&self, settings_path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        std::fs::write(settings_path, json)
            .map_err(|e| format!("Failed to write settings: {}", e))?;

        log::debug!("Saved app settings to {:?}", settings_path);
        Ok(())
    }

    /// Where the project database lives
    pub fn resolved_database_path(&self) -> Result<PathBuf, String> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::app_data_dir()?.join(DATABASE_FILE)),
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            single_timeout: Duration::from_secs(self.single_timeout_secs),
            bulk_timeout: Duration::from_secs(self.bulk_timeout_secs),
        }
    }

    /// Options for whole-folder measurement
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::full()
            .with_max_depth(self.max_depth)
            .with_policy(SkipPolicy::full_size().with_excluded(self.extra_excluded_dirs.clone()))
    }

    /// Options for measurement filtered by file type
    pub fn typed_scan_options(&self, extensions: &[String]) -> ScanOptions {
        ScanOptions::by_type(extensions)
            .with_max_depth(self.max_depth)
            .with_policy(SkipPolicy::by_type().with_excluded(self.extra_excluded_dirs.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        let config = settings.scheduler_config();
        assert_eq!(config.initial_delay, Duration::from_millis(100));
        assert_eq!(config.single_timeout, Duration::from_secs(60));
        assert_eq!(config.bulk_timeout, Duration::from_secs(30));
        assert_eq!(settings.max_depth, 15);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = AppSettings::from_json(r#"{"bulk_timeout_secs": 5}"#).unwrap();
        assert_eq!(settings.bulk_timeout_secs, 5);
        assert_eq!(settings.single_timeout_secs, 60);
        assert!(settings.database_path.is_none());
    }

    #[test]
    fn test_saved_settings_load_back() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join(AppSettings::SETTINGS_FILE);
        let settings = AppSettings {
            database_path: Some(temp_dir.path().join("bookmarks.db")),
            bulk_timeout_secs: 12,
            extra_excluded_dirs: vec!["Pods".to_string()],
            ..Default::default()
        };

        settings.save_to(&path).unwrap();
        assert_eq!(AppSettings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_missing_settings_file_is_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        assert!(AppSettings::load_from(&temp_dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(AppSettings::from_json("not json").is_err());
    }

    #[test]
    fn test_explicit_database_path_wins() {
        let settings = AppSettings {
            database_path: Some(PathBuf::from("/tmp/custom.db")),
            ..Default::default()
        };
        assert_eq!(
            settings.resolved_database_path().unwrap(),
            PathBuf::from("/tmp/custom.db")
        );
    }

    #[test]
    fn test_scan_options_carry_extra_exclusions() {
        let settings = AppSettings {
            extra_excluded_dirs: vec!["Pods".to_string()],
            max_depth: 4,
            ..Default::default()
        };

        let full = settings.scan_options();
        assert_eq!(full.max_depth, 4);
        assert!(!full.policy.admits_dir("Pods"));
        assert!(full.policy.admits_dir("target"));

        let typed = settings.typed_scan_options(&["md".to_string()]);
        assert!(!typed.policy.admits_dir("Pods"));
        assert!(!typed.policy.admits_dir("target"));
        assert!(typed.extensions.contains("md"));
    }
}
