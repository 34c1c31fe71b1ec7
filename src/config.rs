//! User configuration, read from `~/.config/line-stager/config.toml`.

use error_set::error_set;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

error_set! {
    /// Errors from reading the configuration file
    ConfigError := {
        #[display("Failed to read config {path}: {message}")]
        ReadFailed { path: String, message: String },
        #[display("Invalid config {path}: {message}")]
        Invalid { path: String, message: String },
        #[display("Failed to render config: {message}")]
        RenderFailed { message: String },
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Executable used for every git invocation
    pub git_program: String,
    /// List individual untracked files (`git status -u`)
    pub untracked_files: bool,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            git_program: "git".to_string(),
            untracked_files: true,
            log_filter: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load from the default path, or defaults when no file exists there.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Invalid {
            path: path.display().to_string(),
            message: e.message().to_string(),
        })
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("line-stager").join("config.toml"))
    }

    /// Merge CLI overrides into config
    pub fn with_overrides(mut self, git_program: Option<String>) -> Self {
        if let Some(program) = git_program {
            self.git_program = program;
        }
        self
    }

    /// Render as TOML, in the same shape the file is read in.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::RenderFailed {
            message: e.to_string(),
        })
    }
}
