use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[cfg(test)]
mod config_test;

/// Largest source accepted by default: 1 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 1024 * 1024;

/// Overrides `max_input_bytes` when set to a positive integer.
pub const MAX_INPUT_ENV: &str = "VBSCOPE_MAX_INPUT_BYTES";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    pub max_input_bytes: usize,
    /// Extra names treated as built-ins by the undeclared-use check.
    pub extra_builtins: Vec<String>,
    /// Report undeclared uses as errors even without `Option Explicit`.
    pub strict_undeclared: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            extra_builtins: Vec::new(),
            strict_undeclared: false,
        }
    }
}

impl AnalyzerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse analyzer config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Apply `VBSCOPE_MAX_INPUT_BYTES` from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    pub(crate) fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(raw) = lookup(MAX_INPUT_ENV) {
            let limit: usize = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a byte count, got '{}'", MAX_INPUT_ENV, raw))?;
            if limit == 0 {
                anyhow::bail!("{} must be greater than zero", MAX_INPUT_ENV);
            }
            tracing::debug!(limit, "max input size overridden from environment");
            self.max_input_bytes = limit;
        }
        Ok(self)
    }
}
