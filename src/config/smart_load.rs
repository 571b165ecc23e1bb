use figment::providers::{Format, Json, Toml, Yaml};
use std::path::Path;

/// Configuration file formats understood by seedpool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Format implied by a file extension, if any
    pub fn from_extension(path: &Path) -> Option<Self> {
        let extension = path.extension().and_then(|ext| ext.to_str())?;

        match extension.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Provider for a config file whose format is picked from its extension,
/// falling back to content sniffing and finally TOML
pub fn auto<P: AsRef<Path>>(path: P) -> impl figment::Provider {
    let path = path.as_ref();

    let format = ConfigFormat::from_extension(path).unwrap_or_else(|| {
        let detected = std::fs::read_to_string(path)
            .ok()
            .and_then(|content| detect_format_from_content(&content));
        tracing::debug!(
            "Config {} has no known extension, using {:?}",
            path.display(),
            detected.unwrap_or(ConfigFormat::Toml)
        );
        detected.unwrap_or(ConfigFormat::Toml)
    });

    match format {
        ConfigFormat::Toml => SmartProvider::Toml(Toml::file_exact(path)),
        ConfigFormat::Json => SmartProvider::Json(Json::file_exact(path)),
        ConfigFormat::Yaml => SmartProvider::Yaml(Yaml::file_exact(path)),
    }
}

enum SmartProvider {
    Toml(figment::providers::Data<Toml>),
    Json(figment::providers::Data<Json>),
    Yaml(figment::providers::Data<Yaml>),
}

impl figment::Provider for SmartProvider {
    fn metadata(&self) -> figment::Metadata {
        match self {
            SmartProvider::Toml(p) => p.metadata(),
            SmartProvider::Json(p) => p.metadata(),
            SmartProvider::Yaml(p) => p.metadata(),
        }
    }

    fn data(
        &self,
    ) -> Result<figment::value::Map<figment::Profile, figment::value::Dict>, figment::Error> {
        match self {
            SmartProvider::Toml(p) => p.data(),
            SmartProvider::Json(p) => p.data(),
            SmartProvider::Yaml(p) => p.data(),
        }
    }
}

fn detect_format_from_content(content: &str) -> Option<ConfigFormat> {
    let trimmed = content.trim();

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(ConfigFormat::Json);
    }

    // TOML first: section headers are also valid YAML flow sequences
    if trimmed.lines().any(|line| {
        let line = line.trim();
        (line.starts_with('[') && line.ends_with(']'))
            || (line.contains('=') && !line.contains(':'))
    }) {
        return Some(ConfigFormat::Toml);
    }

    if trimmed.starts_with("---") || trimmed.lines().any(|line| line.trim().contains(": ")) {
        return Some(ConfigFormat::Yaml);
    }

    None
}
