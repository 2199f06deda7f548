//! Prompt assembly configuration and its TOML file format
//!
//! ```toml
//! [resolver]
//! reject_straddling_blocks = true
//! block_separator = "\n"
//!
//! [fill]
//! collapse_blank_lines = true
//!
//! [templates]
//! dir = "templates"
//! ```
//!
//! Every table and key is optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::template::{FillConfig, ResolverConfig};

/// Errors that can occur when loading or parsing a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Configuration for the complete prompt assembly pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptConfig {
    /// Placeholder resolution configuration
    pub resolver: ResolverConfig,
    /// Template filling configuration
    pub fill: FillConfig,
    /// Directory templates are loaded from
    pub templates_dir: Option<PathBuf>,
}

/// TOML structure for deserializing configuration files
#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct TomlConfig {
    resolver: TomlResolver,
    fill: TomlFill,
    templates: TomlTemplates,
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct TomlResolver {
    reject_straddling_blocks: Option<bool>,
    block_separator: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct TomlFill {
    collapse_blank_lines: Option<bool>,
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct TomlTemplates {
    dir: Option<PathBuf>,
}

impl PromptConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    ///
    /// A relative `templates.dir` is resolved against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_str(&content)?;
        if let (Some(dir), Some(base)) = (&config.templates_dir, path.parent()) {
            if dir.is_relative() {
                config.templates_dir = Some(base.join(dir));
            }
        }
        Ok(config)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let defaults = Self::default();

        Ok(PromptConfig {
            resolver: ResolverConfig {
                reject_straddling_blocks: parsed
                    .resolver
                    .reject_straddling_blocks
                    .unwrap_or(defaults.resolver.reject_straddling_blocks),
                block_separator: parsed
                    .resolver
                    .block_separator
                    .unwrap_or(defaults.resolver.block_separator),
            },
            fill: FillConfig {
                collapse_blank_lines: parsed
                    .fill
                    .collapse_blank_lines
                    .unwrap_or(defaults.fill.collapse_blank_lines),
            },
            templates_dir: parsed.templates.dir,
        })
    }

    /// Set the resolver configuration
    pub fn with_resolver(mut self, config: ResolverConfig) -> Self {
        self.resolver = config;
        self
    }

    /// Set the fill configuration
    pub fn with_fill(mut self, config: FillConfig) -> Self {
        self.fill = config;
        self
    }

    /// Set the template directory
    pub fn with_templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates_dir = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = PromptConfig::from_str("").expect("Should parse");
        assert_eq!(config, PromptConfig::default());
    }

    #[test]
    fn test_parse_all_tables() {
        let toml_str = r#"
[resolver]
reject_straddling_blocks = false
block_separator = "\n\n"

[fill]
collapse_blank_lines = false

[templates]
dir = "/srv/templates"
"#;
        let config = PromptConfig::from_str(toml_str).expect("Should parse");
        assert!(!config.resolver.reject_straddling_blocks);
        assert_eq!(config.resolver.block_separator, "\n\n");
        assert!(!config.fill.collapse_blank_lines);
        assert_eq!(config.templates_dir, Some(PathBuf::from("/srv/templates")));
    }

    #[test]
    fn test_partial_table_keeps_defaults() {
        let config = PromptConfig::from_str("[resolver]\nblock_separator = \" \"").unwrap();
        assert!(config.resolver.reject_straddling_blocks);
        assert_eq!(config.resolver.block_separator, " ");
    }

    #[test]
    fn test_unknown_key_error() {
        assert!(PromptConfig::from_str("[fill]\ncollapse = true").is_err());
    }

    #[test]
    fn test_relative_templates_dir_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.toml");
        std::fs::write(&path, "[templates]\ndir = \"templates\"").unwrap();
        let config = PromptConfig::from_file(&path).unwrap();
        assert_eq!(config.templates_dir, Some(dir.path().join("templates")));
    }

    #[test]
    fn test_builder_pattern() {
        let config = PromptConfig::new()
            .with_resolver(ResolverConfig::new().with_reject_straddling_blocks(false))
            .with_fill(FillConfig::new().with_collapse_blank_lines(false))
            .with_templates_dir("t");
        assert!(!config.resolver.reject_straddling_blocks);
        assert!(!config.fill.collapse_blank_lines);
        assert_eq!(config.templates_dir, Some(PathBuf::from("t")));
    }
}
