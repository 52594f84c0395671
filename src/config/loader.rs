//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/licitagen/config.toml)
//! 3. Project config (./licitagen.toml)
//! 4. Environment variables (LICITAGEN_* prefix)

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use tracing::debug;

use super::types::Config;
use crate::types::{LicitaError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with the full resolution chain:
    /// defaults → global → project → env vars.
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // e.g. LICITAGEN_LLM_MODEL -> llm.model
        figment = figment.merge(Env::prefixed("LICITAGEN_").split('_').lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| LicitaError::Config(format!("configuration error: {e}")))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only (defaults still apply).
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| LicitaError::Config(format!("configuration error: {e}")))?;

        config.validate()?;

        Ok(config)
    }

    /// Write the default configuration to `path`. Refuses to overwrite unless
    /// `force` is set.
    pub fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(LicitaError::Config(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }

        let rendered = toml::to_string_pretty(&Config::default())
            .map_err(|e| LicitaError::Config(format!("failed to render defaults: {e}")))?;
        fs::write(path, rendered)?;
        Ok(())
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Global config directory (~/.config/licitagen/).
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("licitagen"))
    }

    /// Global config file path.
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Project config file path (current directory).
    pub fn project_config_path() -> PathBuf {
        PathBuf::from("licitagen.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheBackend;

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("licitagen.toml");
        fs::write(
            &path,
            r#"
[llm]
model = "gpt-4o"
temperature = 0.2

[cache]
backend = "sqlite"
ttl_secs = 120
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.llm.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.llm.temperature, 0.2);
        assert_eq!(config.cache.backend, CacheBackend::Sqlite);
        assert_eq!(config.cache.ttl_secs, 120);
        // Untouched sections keep their defaults.
        assert_eq!(config.llm.max_attempts, 3);
        assert!(!config.mail.enabled);
    }

    #[test]
    fn invalid_file_values_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("licitagen.toml");
        fs::write(&path, "[cache]\nttl_secs = 0\n").unwrap();

        assert!(ConfigLoader::load_from_file(&path).is_err());
    }

    #[test]
    fn write_default_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("licitagen.toml");

        ConfigLoader::write_default(&path, false).unwrap();
        assert!(ConfigLoader::write_default(&path, false).is_err());
        ConfigLoader::write_default(&path, true).unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert!(config.validate().is_ok());
    }
}
