// UI settings
// Stored in <config-dir>/settings.json

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::SettingsError;

pub const DEFAULT_THEME: &str = "dark";
pub const DEFAULT_LANG: &str = "pl";
pub const DEFAULT_FOOTER_MODE: &str = "icons";
pub const DEFAULT_DATE_FORMAT: &str = "horizontal";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub lang: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LANG.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FooterSettings {
    /// "icons" | "icons-text"
    pub mode: String,
    /// "horizontal" | "vertical"
    #[serde(rename = "dateFormat")]
    pub date_format: String,
}

impl Default for FooterSettings {
    fn default() -> Self {
        Self {
            mode: DEFAULT_FOOTER_MODE.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: String,
    pub user: UserSettings,
    pub notifications: bool,
    pub autoupdate: bool,
    pub footer: FooterSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            user: UserSettings::default(),
            notifications: false,
            autoupdate: false,
            footer: FooterSettings::default(),
        }
    }
}

/// A checkbox value that arrives either as a JSON bool or as a form string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Text(String),
}

impl Flag {
    fn is_set(flag: &Option<Flag>) -> bool {
        matches!(flag, Some(Flag::Bool(true))) || matches!(flag, Some(Flag::Text(t)) if t == "true")
    }
}

/// Body of the settings form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub theme: Option<String>,
    pub language: Option<String>,
    pub notifications: Option<Flag>,
    pub autoupdate: Option<Flag>,
    pub footer_mode: Option<String>,
    pub date_format: Option<String>,
}

fn or_default(value: &Option<String>, default: &str) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

impl SettingsUpdate {
    /// Applies the form to `settings`. Every field is overwritten; missing
    /// values reset to their defaults.
    pub fn apply(&self, settings: &mut Settings) {
        settings.theme = or_default(&self.theme, DEFAULT_THEME);
        settings.user.lang = or_default(&self.language, DEFAULT_LANG);
        settings.notifications = Flag::is_set(&self.notifications);
        settings.autoupdate = Flag::is_set(&self.autoupdate);
        settings.footer.mode = or_default(&self.footer_mode, DEFAULT_FOOTER_MODE);
        settings.footer.date_format = or_default(&self.date_format, DEFAULT_DATE_FORMAT);
    }
}

/// Where settings come from; injected into the web state
pub trait SettingsService: Send + Sync {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}

/// Settings kept in a JSON file
pub struct FileSettings {
    path: PathBuf,
    // serializes writes between workers
    lock: Mutex<()>,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<config_dir>/settings.json`
    pub fn in_dir(config_dir: &Path) -> Self {
        Self::new(config_dir.join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn reset(&self) -> Settings {
        let defaults = Settings::default();
        if let Err(e) = self.write(&defaults) {
            error!(path = %self.path.display(), error = %e, "could not write default settings");
        }
        defaults
    }
}

impl SettingsService for FileSettings {
    /// Missing file: defaults are written and returned.
    /// Corrupt file: overwritten with defaults.
    fn load(&self) -> Settings {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if !self.path.exists() {
            info!(path = %self.path.display(), "created default settings file");
            return self.reset();
        }

        match fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "invalid settings file, restoring defaults");
                    self.reset()
                }
            },
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read settings file");
                Settings::default()
            }
        }
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.write(settings)?;
        info!(?settings, "saved settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let service = FileSettings::in_dir(&dir.path().join("config"));
        let settings = service.load();
        assert_eq!(settings, Settings::default());
        assert!(service.path().exists());
    }

    #[test]
    fn test_missing_fields_are_backfilled() {
        let dir = tempfile::tempdir().unwrap();
        let service = FileSettings::in_dir(dir.path());
        fs::write(service.path(), r#"{"theme": "light", "footer": {"mode": "icons-text"}}"#).unwrap();

        let settings = service.load();
        assert_eq!(settings.theme, "light");
        assert_eq!(settings.user.lang, "pl");
        assert_eq!(settings.footer.mode, "icons-text");
        assert_eq!(settings.footer.date_format, "horizontal");
    }

    #[test]
    fn test_corrupt_file_is_reset() {
        let dir = tempfile::tempdir().unwrap();
        let service = FileSettings::in_dir(dir.path());
        fs::write(service.path(), "{ broken").unwrap();

        assert_eq!(service.load(), Settings::default());
        let on_disk: Settings = serde_json::from_str(&fs::read_to_string(service.path()).unwrap()).unwrap();
        assert_eq!(on_disk, Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let service = FileSettings::in_dir(dir.path());
        let mut settings = Settings::default();
        settings.theme = "light".to_string();
        settings.notifications = true;
        service.save(&settings).unwrap();
        assert_eq!(service.load(), settings);
    }

    #[test]
    fn test_update_from_json_body() {
        let update: SettingsUpdate = serde_json::from_str(
            r#"{"theme": "light", "language": "en", "notifications": true, "autoupdate": "true", "footerMode": "icons-text", "dateFormat": "vertical"}"#,
        )
        .unwrap();
        let mut settings = Settings::default();
        update.apply(&mut settings);
        assert_eq!(settings.theme, "light");
        assert_eq!(settings.user.lang, "en");
        assert!(settings.notifications);
        assert!(settings.autoupdate);
        assert_eq!(settings.footer.mode, "icons-text");
        assert_eq!(settings.footer.date_format, "vertical");
    }

    #[test]
    fn test_update_resets_missing_values() {
        let mut settings = Settings {
            theme: "light".to_string(),
            notifications: true,
            ..Default::default()
        };
        let update: SettingsUpdate = serde_json::from_str(r#"{"notifications": "false"}"#).unwrap();
        update.apply(&mut settings);
        assert_eq!(settings.theme, DEFAULT_THEME);
        assert!(!settings.notifications);
    }
}
