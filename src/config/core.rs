use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
};
use serde::Serialize;
use std::path::Path;

use super::SeedpoolConfig;
use super::overrides::filter_unset;
use super::smart_load;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// Layered configuration source
pub struct ConfigLoader {
    figment: Figment,
}

impl ConfigLoader {
    /// Build the configuration chain:
    /// defaults -> repo or custom file -> `SEEDPOOL_` env -> CLI overrides
    pub fn load<T: Serialize>(
        custom_config: Option<&Path>,
        cli_overrides: Option<T>,
    ) -> Result<Self> {
        tracing::trace!("CONFIG LOAD: Starting");

        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        if let Some(custom_path) = custom_config {
            if !custom_path.is_file() {
                anyhow::bail!("Config file not found: {}", custom_path.display());
            }
            figment = figment.merge(smart_load::auto(custom_path));
        } else {
            figment = figment
                .merge(Toml::file_exact("seedpool.toml"))
                .merge(Json::file_exact("seedpool.json"))
                .merge(Yaml::file_exact("seedpool.yaml"))
                .merge(Yaml::file_exact("seedpool.yml"));
        }

        // Environment variables: SEEDPOOL_DISPATCH__MAX_THREADS=4
        figment = figment.merge(Env::prefixed("SEEDPOOL_").split("__"));

        if let Some(cli) = cli_overrides {
            tracing::trace!("CONFIG LOAD: Applying CLI overrides");
            figment = figment.merge(Serialized::defaults(filter_unset(cli)));
        }

        Ok(ConfigLoader { figment })
    }

    /// Extract and validate the typed configuration
    pub fn extract(&self) -> Result<SeedpoolConfig> {
        let config: SeedpoolConfig = self
            .figment
            .extract()
            .context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Get the full merged configuration as a structured value
    pub fn get_full_config(&self) -> Result<serde_json::Value> {
        Ok(self.figment.extract()?)
    }

    /// Get a nested object/section as JSON
    pub fn get_section(&self, path: &str) -> Result<serde_json::Value> {
        Ok(self.figment.extract_inner(path)?)
    }
}

impl SeedpoolConfig {
    /// Load, merge and validate configuration in one step
    pub fn load<T: Serialize>(
        custom_config: Option<&Path>,
        cli_overrides: Option<T>,
    ) -> Result<Self> {
        ConfigLoader::load(custom_config, cli_overrides)?.extract()
    }
}
