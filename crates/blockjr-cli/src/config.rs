//! `blockjr.toml` configuration.

use anyhow::{anyhow, Context, Result};
use blockjr_compiler::{rulebooks, CommandNaming, MatchMode, NamingScheme, Scale};
use blockjr_core::{BlockType, RuleBook};
use blockjr_runtime::ExecutorConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub compile: CompileConfig,
    pub units: Vec<UnitPreset>,
    pub transport: TransportConfig,
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    pub naming: NamingScheme,
    /// Key of the unit preset applied to delay counts.
    pub unit: Option<String>,
    /// Per-type command name overrides, layered over `naming`.
    pub rename: BTreeMap<String, String>,
}

/// A selectable meaning for one delay unit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnitPreset {
    pub key: String,
    pub label: String,
    pub scale: f64,
}

impl UnitPreset {
    fn new(key: &str, label: &str, scale: f64) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            scale,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub attempts: u32,
    pub ack_timeout_ms: u64,
    pub retry_delay_ms: u64,
    pub stepwise: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        let delivery = ExecutorConfig::default();
        Self {
            attempts: delivery.attempts,
            ack_timeout_ms: delivery.ack_timeout_ms,
            retry_delay_ms: delivery.retry_delay_ms,
            stepwise: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Rule book file; the bundled elevator rules when unset.
    pub rules: Option<PathBuf>,
    pub mode: MatchMode,
    /// Exact-mode allow-list of block types.
    pub block_types: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compile: CompileConfig::default(),
            units: default_units(),
            transport: TransportConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

fn default_units() -> Vec<UnitPreset> {
    vec![
        UnitPreset::new("100m", "100 ms", 0.1),
        UnitPreset::new("10m", "10 ms", 0.01),
        UnitPreset::new("1s", "1 s", 1.0),
    ]
}

impl Config {
    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Command naming for `scheme`, or the configured scheme, with renames applied.
    pub fn naming(&self, scheme: Option<NamingScheme>) -> CommandNaming {
        let scheme = scheme.unwrap_or(self.compile.naming);
        self.compile
            .rename
            .iter()
            .fold(CommandNaming::for_scheme(scheme), |naming, (block_type, name)| {
                naming.rename(BlockType::from(block_type.as_str()), name.clone())
            })
    }

    /// Resolve the delay scale: an explicit factor wins, then a unit key,
    /// then the configured unit. No unit at all means raw counts.
    pub fn scale(&self, unit: Option<&str>, factor: Option<f64>) -> Result<Scale> {
        if let Some(factor) = factor {
            return Ok(Scale::new(factor)?);
        }
        match unit.or(self.compile.unit.as_deref()) {
            Some(key) => {
                let preset = self
                    .units
                    .iter()
                    .find(|u| u.key == key)
                    .ok_or_else(|| anyhow!("Unknown unit '{}'", key))?;
                Ok(Scale::new(preset.scale)?)
            }
            None => Ok(Scale::IDENTITY),
        }
    }

    pub fn executor(&self) -> ExecutorConfig {
        ExecutorConfig {
            attempts: self.transport.attempts,
            retry_delay_ms: self.transport.retry_delay_ms,
            ack_timeout_ms: self.transport.ack_timeout_ms,
        }
    }

    /// The rule book at `path`, or the configured one, or the bundled rules.
    pub fn rule_book(&self, path: Option<&Path>) -> Result<RuleBook> {
        match path.or(self.validation.rules.as_deref()) {
            Some(path) => RuleBook::load(path)
                .with_context(|| format!("Failed to load rules {}", path.display())),
            None => Ok(rulebooks::elevator()?),
        }
    }
}
