use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use genchat_core::{Persona, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};

use crate::theme::Theme;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub endpoint: Option<String>,
    pub persona: Option<String>,
    pub theme: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn save_theme(theme: Theme) -> Result<()> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.theme = Some(theme.as_str().to_string());
        config.save()
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("genchat").join("config.json"))
    }
}

/// Effective startup settings after merging flags, environment and the
/// config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint: String,
    pub persona: Persona,
    pub theme: Theme,
}

impl Settings {
    /// `endpoint` already carries the flag-or-env value (clap merges those).
    /// Anything unset falls back to the config file, then to built-in defaults.
    pub fn resolve(
        endpoint: Option<String>,
        persona: Option<Persona>,
        theme: Option<Theme>,
        config: &Config,
    ) -> Result<Self> {
        let endpoint = endpoint
            .or_else(|| config.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let persona = match persona {
            Some(p) => p,
            None => match &config.persona {
                Some(name) => name.parse::<Persona>().context("invalid `persona` in config file")?,
                None => Persona::default(),
            },
        };

        let theme = match theme {
            Some(t) => t,
            None => match &config.theme {
                Some(name) => name.parse::<Theme>().context("invalid `theme` in config file")?,
                None => Theme::default(),
            },
        };

        Ok(Self {
            endpoint,
            persona,
            theme,
        })
    }
}
