use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level Carto configuration, matching `carto.toml`.
///
/// Every threshold here is a policy knob, not a semantic contract: changing a
/// value changes coverage or resource usage, never graph correctness.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartoConfig {
    #[serde(default)]
    pub ingestion: IngestionSection,
    #[serde(default)]
    pub filtering: FilteringSection,
    #[serde(default)]
    pub languages: LanguageSelection,
}

impl CartoConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        let config: Self = toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ingestion.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        if self.ingestion.cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "cache_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionSection {
    /// Files processed per batch; cancellation and cache cleanup happen at
    /// batch boundaries.
    pub batch_size: usize,
    /// Soft per-file parse budget. A file that overruns takes the
    /// parse-failure fallback path.
    pub parse_timeout_ms: u64,
    /// Maximum parsed-file cache entries before LRU eviction.
    pub cache_capacity: usize,
    /// A first line longer than this marks the file as generated/minified.
    pub max_first_line_len: usize,
}

impl Default for IngestionSection {
    fn default() -> Self {
        Self {
            batch_size: 10,
            parse_timeout_ms: 5_000,
            cache_capacity: 512,
            max_first_line_len: 2_048,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilteringSection {
    /// Glob patterns excluded from parsing (vendor/build/doc trees, lock
    /// files). Matching files keep their File node but produce no
    /// definitions.
    pub ignore_patterns: Vec<String>,
    /// Substrings marking bundler output; matching files are never parsed.
    pub generated_signatures: Vec<String>,
    /// Config files allowed through to parsing despite not being source.
    pub config_allowlist: Vec<String>,
}

impl Default for FilteringSection {
    fn default() -> Self {
        Self {
            ignore_patterns: vec![
                "**/node_modules/**".into(),
                "**/vendor/**".into(),
                "**/target/**".into(),
                "**/.git/**".into(),
                "**/dist/**".into(),
                "**/build/**".into(),
                "**/__pycache__/**".into(),
                "**/*.min.js".into(),
                "**/*.lock".into(),
                "**/package-lock.json".into(),
                "**/*.png".into(),
                "**/*.jpg".into(),
                "**/*.gif".into(),
                "**/*.ico".into(),
                "**/*.woff*".into(),
                "**/*.so".into(),
                "**/*.dylib".into(),
                "**/*.wasm".into(),
            ],
            generated_signatures: vec![
                "webpackBootstrap".into(),
                "__webpack_require__".into(),
                "parcelRequire".into(),
                "/*! For license information".into(),
            ],
            config_allowlist: vec![
                "package.json".into(),
                "pyproject.toml".into(),
                "Cargo.toml".into(),
                "go.mod".into(),
            ],
        }
    }
}

/// Which languages to run grammar extraction for.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LanguageSelection {
    #[default]
    Auto,
    Explicit(Vec<String>),
}

impl LanguageSelection {
    pub fn allows(&self, language_id: &str) -> bool {
        match self {
            Self::Auto => true,
            Self::Explicit(ids) => ids.iter().any(|id| id == language_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CartoConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ingestion.batch_size, 10);
    }

    #[test]
    fn zero_batch_size_is_invalid() {
        let mut config = CartoConfig::default();
        config.ingestion.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml() {
        let text = "[ingestion]\nbatch_size = 25\n";
        let config: CartoConfig = toml::from_str(text).unwrap();
        assert_eq!(config.ingestion.batch_size, 25);
        // Unspecified sections fall back to defaults.
        assert!(!config.filtering.ignore_patterns.is_empty());
    }

    #[test]
    fn explicit_language_selection_filters() {
        let sel = LanguageSelection::Explicit(vec!["rust".into()]);
        assert!(sel.allows("rust"));
        assert!(!sel.allows("python"));
        assert!(LanguageSelection::Auto.allows("python"));
    }
}
