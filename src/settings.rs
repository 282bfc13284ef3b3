use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_WORD_LIMIT: usize = 300;
/// Word cap without semantic filtering.
pub const MAX_WORD_LIMIT: usize = 2000;
/// Word cap when the semantic filter runs, for display and cost.
pub const MAX_FILTERED_WORD_LIMIT: usize = 200;

pub const CREDENTIAL_ENV: &str = "OPENAI_API_KEY";

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ScreenSize {
    fn default() -> Self {
        ScreenSize {
            width: 1920,
            height: 1080,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub word_limit: usize,
    pub semantic_filter_enabled: bool,
    pub semantic_criterion: String,
    pub credential: Option<String>,
    pub screen: ScreenSize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            word_limit: DEFAULT_WORD_LIMIT,
            semantic_filter_enabled: false,
            semantic_criterion: String::new(),
            credential: None,
            screen: ScreenSize::default(),
        }
    }
}

impl Settings {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config {
            message: e.to_string(),
        })
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading settings - path={}", path.display());

        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("Unable to read {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&raw)
    }

    /// Fills a missing credential from `OPENAI_API_KEY`.
    pub fn with_env_credential(mut self) -> Self {
        if self.credential.is_none() {
            self.credential = std::env::var(CREDENTIAL_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }
        self
    }

    /// The configured limit clamped to `1..=cap`, where the cap depends on whether
    /// the semantic filter is on.
    pub fn effective_word_limit(&self) -> usize {
        let cap = if self.semantic_filter_enabled {
            MAX_FILTERED_WORD_LIMIT
        } else {
            MAX_WORD_LIMIT
        };
        self.word_limit.clamp(1, cap)
    }
}

/// Read-only access to the user's settings.
pub trait SettingsProvider {
    fn settings(&self) -> Settings;
}

impl SettingsProvider for Settings {
    fn settings(&self) -> Settings {
        self.clone()
    }
}
