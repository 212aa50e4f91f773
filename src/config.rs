use anyhow::{Context, Result, anyhow, bail};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".LiftLog";
const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_API_PORT: u16 = 7891;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_path: PathBuf,
    pub export_dir: PathBuf,
    pub api_port: u16,
    pub user_id: Option<String>,
    pub anonymous_session: bool,
    pub default_exercise: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let root = default_root_dir();

        Self {
            db_path: root.join("db").join("liftlog.db"),
            export_dir: default_export_dir(),
            api_port: DEFAULT_API_PORT,
            user_id: None,
            anonymous_session: false,
            default_exercise: None,
        }
    }
}

impl Config {
    pub fn root_dir() -> Result<PathBuf> {
        Ok(default_root_dir())
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(default_root_dir().join(CONFIG_FILE))
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        set_mode_600(config_path)?;

        Ok(())
    }

    pub fn ensure_bootstrap_files(&self) -> Result<()> {
        let root = Self::root_dir()?;
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create root directory: {}", root.display()))?;

        if let Some(parent) = self.db_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        fs::create_dir_all(&self.export_dir).with_context(|| {
            format!(
                "Failed to create export directory: {}",
                self.export_dir.display()
            )
        })?;

        Ok(())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match normalize_config_key(key) {
            "db_path" => {
                self.db_path = expand_home(value);
            }
            "export_dir" => {
                self.export_dir = expand_home(value);
            }
            "api_port" => {
                self.api_port = value
                    .parse::<u16>()
                    .map_err(|_| anyhow!("api_port must be a number"))?;
            }
            "user_id" => {
                self.user_id = (!value.trim().is_empty()).then(|| value.trim().to_string());
                self.anonymous_session = false;
            }
            "default_exercise" => {
                self.default_exercise = (!value.is_empty()).then(|| value.to_string());
            }
            _ => {
                bail!(
                    "Unsupported config key: {key}. Supported keys: db_path|db.path, export_dir|export.dir, api_port|api.port, user_id|session.user_id, default_exercise|progress.exercise"
                );
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Option<String> {
        match normalize_config_key(key) {
            "db_path" => Some(self.db_path.display().to_string()),
            "export_dir" => Some(self.export_dir.display().to_string()),
            "api_port" => Some(self.api_port.to_string()),
            "user_id" => Some(
                self.user_id
                    .clone()
                    .unwrap_or_else(|| "not_set".to_string()),
            ),
            "anonymous_session" => Some(self.anonymous_session.to_string()),
            "default_exercise" => Some(self.default_exercise.clone().unwrap_or_default()),
            _ => None,
        }
    }
}

fn normalize_config_key(key: &str) -> &str {
    match key {
        "db_path" | "db.path" => "db_path",
        "export_dir" | "export.dir" => "export_dir",
        "api_port" | "api.port" => "api_port",
        "user_id" | "session.user_id" => "user_id",
        "anonymous_session" | "session.anonymous" => "anonymous_session",
        "default_exercise" | "progress.exercise" => "default_exercise",
        _ => key,
    }
}

pub fn expand_home(raw: &str) -> PathBuf {
    raw.strip_prefix("~/")
        .and_then(|stripped| home_dir().map(|home| home.join(stripped)))
        .unwrap_or_else(|| PathBuf::from(raw))
}

pub fn default_export_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("LiftLog")
}

fn default_root_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn set_mode_600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set file permissions: {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Config, DEFAULT_API_PORT};
    use std::path::PathBuf;

    #[test]
    fn dotted_aliases_map_to_fields() {
        let mut config = Config::default();

        config.set_value("api.port", "8000").expect("port");
        config.set_value("session.user_id", " lifter ").expect("user");
        config.set_value("db.path", "/tmp/liftlog.db").expect("db");

        assert_eq!(config.api_port, 8000);
        assert_eq!(config.get_value("user_id").as_deref(), Some("lifter"));
        assert_eq!(config.db_path, PathBuf::from("/tmp/liftlog.db"));
        assert!(config.set_value("api_port", "eighty").is_err());
        assert!(config.set_value("unknown", "1").is_err());
    }

    #[test]
    fn save_and_load_round_trip_with_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "user_id": "lifter" }"#).expect("write");

        let config = Config::load_from(&path).expect("load");
        assert_eq!(config.user_id.as_deref(), Some("lifter"));
        assert_eq!(config.api_port, DEFAULT_API_PORT);

        config.save_to(&path).expect("save");
        assert_eq!(
            Config::load_from(&path).expect("reload").user_id.as_deref(),
            Some("lifter")
        );
    }
}
