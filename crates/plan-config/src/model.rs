use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// User-configurable engine and CLI preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub locale: String,
    pub currency: String,
    #[serde(default = "EngineConfig::default_ui_color_enabled")]
    pub ui_color_enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Custom database file. Defaults to `<base>/data/planning.db`.
    pub database_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            currency: "USD".into(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            database_path: None,
            log_filter: None,
        }
    }
}

impl EngineConfig {
    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn resolve_database_path(&self, base: &Path) -> PathBuf {
        match &self.database_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => base.join(path),
            None => base.join("data").join("planning.db"),
        }
    }
}
