use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::Path;

use crate::cli::Output;
use crate::config::SeedpoolConfig;
use crate::config::core::ConfigLoader;
use crate::config::smart_load::ConfigFormat;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Display current merged configuration
    Show {
        /// Output format: json, toml, yaml
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
    /// Get configuration value (dotted path, e.g. dispatch.max_threads)
    Get { key: String },
    /// Validate the merged configuration
    Validate,
}

fn parse_format(format: &str) -> Result<ConfigFormat> {
    match format.to_lowercase().as_str() {
        "json" => Ok(ConfigFormat::Json),
        "yaml" | "yml" => Ok(ConfigFormat::Yaml),
        "toml" => Ok(ConfigFormat::Toml),
        _ => anyhow::bail!("Unsupported format: {format}. Use json, toml, or yaml"),
    }
}

/// Serialize the configuration in the requested format
pub fn export(config: &SeedpoolConfig, format: ConfigFormat) -> Result<String> {
    let text = match format {
        ConfigFormat::Toml => toml::to_string_pretty(config).context("Failed to serialize TOML")?,
        ConfigFormat::Json => {
            serde_json::to_string_pretty(config).context("Failed to serialize JSON")?
        }
        ConfigFormat::Yaml => serde_yml::to_string(config).context("Failed to serialize YAML")?,
    };
    Ok(text)
}

pub async fn execute(
    args: ConfigArgs,
    custom_config: Option<&Path>,
    output: &Output,
) -> Result<()> {
    match args.command {
        ConfigCommand::Show { format } => {
            let format = parse_format(&format)?;
            let config = SeedpoolConfig::load(custom_config, None::<&()>)?;
            output.line(export(&config, format)?.trim_end());
        }
        ConfigCommand::Get { key } => {
            let loader = ConfigLoader::load(custom_config, None::<&()>)?;
            let value = loader
                .get_section(&key)
                .with_context(|| format!("Configuration key '{key}' not found"))?;

            match value {
                serde_json::Value::String(s) => output.line(&s),
                serde_json::Value::Object(_) => output.line(&serde_json::to_string_pretty(&value)?),
                serde_json::Value::Array(items) => {
                    for item in items {
                        match item {
                            serde_json::Value::String(s) => output.line(&s),
                            other => output.line(&other.to_string()),
                        }
                    }
                }
                other => output.line(&other.to_string()),
            }
        }
        ConfigCommand::Validate => {
            let config = SeedpoolConfig::load(custom_config, None::<&()>)?;
            output.success("Configuration is valid");
            output.key_value(
                "Memory budget:",
                &format!("{:.2}GB", config.dispatch.max_memory_gb),
                false,
            );
            output.key_value(
                "Max threads:",
                &config.dispatch.resolved_max_threads().to_string(),
                false,
            );
            output.key_value("Program:", &config.executable.program.display().to_string(), false);
        }
    }

    Ok(())
}
