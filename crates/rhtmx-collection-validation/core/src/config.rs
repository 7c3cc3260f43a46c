// File: src/config.rs
// Purpose: Configuration parsing from collection-validation.toml

use crate::message::MessageTemplates;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Collection validation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CollectionValidationConfig {
    #[serde(default)]
    pub messages: MessageTemplates,

    #[serde(default)]
    pub classes: CssClasses,

    #[serde(default)]
    pub render: RenderConfig,
}

/// CSS classes toggled on the message element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CssClasses {
    #[serde(default = "default_valid_class")]
    pub valid: String,

    #[serde(default = "default_error_class")]
    pub error: String,
}

/// Message element rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Tag of the message element (default: "span")
    #[serde(default = "default_tag")]
    pub tag: String,

    /// Emit `data-col-*` metadata for the client engine (default: true)
    #[serde(default = "default_true")]
    pub client_validation: bool,
}

// Default values
fn default_valid_class() -> String {
    "field-validation-valid".to_string()
}

fn default_error_class() -> String {
    "field-validation-error".to_string()
}

fn default_tag() -> String {
    "span".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for CssClasses {
    fn default() -> Self {
        Self {
            valid: default_valid_class(),
            error: default_error_class(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tag: default_tag(),
            client_validation: true,
        }
    }
}

impl CollectionValidationConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist or is empty, return default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: CollectionValidationConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./collection-validation.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("collection-validation.toml")
    }
}
