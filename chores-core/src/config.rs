//! Global chores configuration.

use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::error::{ChoresError, ChoresResult};
use crate::view::CalendarView;

static DEFAULT_DATA_FILE: &str = "~/chores/chores.json";

fn default_data_file() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_FILE)
}

fn is_default_data_file(p: &PathBuf) -> bool {
    *p == default_data_file()
}

fn is_default_view(v: &CalendarView) -> bool {
    *v == CalendarView::default()
}

/// Configuration at ~/.config/chores/config.toml
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChoresConfig {
    #[serde(default = "default_data_file", skip_serializing_if = "is_default_data_file")]
    pub data_file: PathBuf,

    #[serde(default, skip_serializing_if = "is_default_view")]
    pub default_view: CalendarView,
}

impl Default for ChoresConfig {
    fn default() -> Self {
        ChoresConfig {
            data_file: default_data_file(),
            default_view: CalendarView::default(),
        }
    }
}

impl ChoresConfig {
    pub fn config_path() -> ChoresResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ChoresError::Config("Could not determine config directory".into()))?
            .join("chores");

        Ok(config_dir.join("config.toml"))
    }

    /// Load ~/.config/chores/config.toml, creating a commented default on first run.
    pub fn load() -> ChoresResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> ChoresResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .build()
            .map_err(|e| ChoresError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ChoresError::Config(e.to_string()))
    }

    /// Data file path with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_file.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    pub fn save_to(&self, path: &Path) -> ChoresResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ChoresError::Config(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ChoresError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Save the current config to ~/.config/chores/config.toml
    pub fn save(&self) -> ChoresResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> ChoresResult<()> {
        let contents = format!(
            "\
# chores configuration

# Where members, chores and completions are stored:
# data_file = \"{}\"

# Calendar view used when none is given (month, week or day):
# default_view = \"month\"
",
            DEFAULT_DATA_FILE
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ChoresError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ChoresError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commented_default_config_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        ChoresConfig::create_default_config(&path).unwrap();
        let config = ChoresConfig::load_from(&path).unwrap();

        assert_eq!(config, ChoresConfig::default());
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ChoresConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.default_view, CalendarView::Month);
    }

    #[test]
    fn test_saved_values_are_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = ChoresConfig {
            data_file: PathBuf::from("/tmp/office-chores.json"),
            default_view: CalendarView::Week,
        };
        config.save_to(&path).unwrap();

        assert_eq!(ChoresConfig::load_from(&path).unwrap(), config);
    }
}
