//! Configuration layering and environment overrides
//!
//! Layers are merged as TOML tables before deserialization, so a file that
//! sets one key leaves every other key to the layers below it. Later layers
//! win: defaults, the global file, the project sprout.toml, `SPROUT_*`
//! environment variables and finally command line overrides.

use ::toml::{Table, Value};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use tracing::debug;

use sprout_core::error::SproutError;

use crate::toml::{validate_config, SproutToml};
use crate::ConfigResult;

/// Project configuration file name
pub const PROJECT_FILE: &str = "sprout.toml";

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "SPROUT_";

const SECTIONS: [&str; 5] = ["platform", "build", "detection", "resolution", "ordering"];

/// Where a configuration value came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Global config file
    Global(Utf8PathBuf),
    /// Project sprout.toml file
    Project(Utf8PathBuf),
    /// Environment variable
    Environment(String),
    /// CLI flag
    CommandLine(String),
}

/// Merged configuration and the layers it was built from
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: SproutToml,
    pub sources: Vec<ConfigSource>,
}

/// Main configuration loading interface
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Directory the project search starts from
    cwd: Utf8PathBuf,
    /// Global file, if the platform has a config directory
    global_path: Option<Utf8PathBuf>,
    /// `SPROUT_*` variables, sorted by name
    env: BTreeMap<String, String>,
    /// Dotted key overrides in the order they were given
    cli_overrides: Vec<(String, String)>,
}

impl ConfigLoader {
    /// Create a loader with no environment overrides
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self {
            cwd,
            global_path: default_global_path(),
            env: BTreeMap::new(),
            cli_overrides: Vec::new(),
        }
    }

    /// Create a loader that reads `SPROUT_*` variables from the process environment
    pub fn from_env(cwd: Utf8PathBuf) -> Self {
        Self::new(cwd).with_env(collect_env_overrides())
    }

    /// Replace the global file location; `None` disables the global layer
    pub fn with_global_path(mut self, path: Option<Utf8PathBuf>) -> Self {
        self.global_path = path;
        self
    }

    /// Replace the environment overrides
    pub fn with_env(mut self, env: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env = env
            .into_iter()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect();
        self
    }

    /// Add a command line override such as `("build.max-nodes", "50")`
    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.cli_overrides.push((key.into(), value.into()));
        self
    }

    /// Find sprout.toml by walking up from the working directory
    pub fn find_project_file(&self) -> Option<Utf8PathBuf> {
        self.cwd
            .ancestors()
            .map(|dir| dir.join(PROJECT_FILE))
            .find(|path| path.is_file())
    }

    /// Merge every layer into one validated configuration
    pub fn load(&self) -> ConfigResult<LoadedConfig> {
        let mut merged = Table::new();
        let mut sources = Vec::new();

        if let Some(path) = self.global_path.as_deref().filter(|path| path.is_file()) {
            merge_tables(&mut merged, read_layer(path)?);
            sources.push(ConfigSource::Global(path.to_path_buf()));
        }

        if let Some(path) = self.find_project_file() {
            merge_tables(&mut merged, read_layer(&path)?);
            sources.push(ConfigSource::Project(path));
        }

        for (var, value) in &self.env {
            let Some(key) = env_key(var) else {
                debug!(%var, "ignoring unrecognised environment variable");
                continue;
            };
            set_dotted(&mut merged, &key, parse_scalar(value))?;
            sources.push(ConfigSource::Environment(var.clone()));
        }

        for (key, value) in &self.cli_overrides {
            set_dotted(&mut merged, key, parse_scalar(value))?;
            sources.push(ConfigSource::CommandLine(key.clone()));
        }

        let config: SproutToml = Value::Table(merged)
            .try_into()
            .map_err(|e: ::toml::de::Error| SproutError::ConfigValidation {
                field: describe_sources(&sources),
                reason: e.to_string(),
            })?;
        validate_config(&config)?;

        debug!(layers = sources.len(), "configuration loaded");
        Ok(LoadedConfig { config, sources })
    }
}

/// `dirs::config_dir()/sprout/config.toml`
pub fn default_global_path() -> Option<Utf8PathBuf> {
    let dir = dirs::config_dir()?;
    Utf8PathBuf::try_from(dir)
        .ok()
        .map(|dir| dir.join("sprout").join("config.toml"))
}

/// Collect `SPROUT_*` variables from the process environment
pub fn collect_env_overrides() -> BTreeMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(ENV_PREFIX))
        .collect()
}

/// Map `SPROUT_BUILD_MAX_NODES` to `build.max-nodes` and `SPROUT_CATALOG` to `catalog`
fn env_key(var: &str) -> Option<String> {
    let rest = var.strip_prefix(ENV_PREFIX)?.to_lowercase();
    if rest == "catalog" {
        return Some(rest);
    }

    SECTIONS.iter().find_map(|section| {
        let key = rest.strip_prefix(section)?.strip_prefix('_')?;
        (!key.is_empty()).then(|| format!("{}.{}", section, key.replace('_', "-")))
    })
}

fn read_layer(path: &Utf8Path) -> ConfigResult<Table> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SproutError::io(format!("Failed to read {}", path), e))?;
    let mut table: Table = content.parse().map_err(|e: ::toml::de::Error| SproutError::TomlParse {
        file: path.to_string(),
        message: e.to_string(),
    })?;

    // Relative catalog paths are relative to the file that names them
    if let (Some(Value::String(catalog)), Some(dir)) = (table.get_mut("catalog"), path.parent()) {
        if Utf8Path::new(catalog.as_str()).is_relative() {
            *catalog = dir.join(catalog.as_str()).into_string();
        }
    }

    Ok(table)
}

/// Recursively merge `overlay` into `base`, overlay winning
fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => merge_tables(existing, incoming),
            (Some(slot), value) => *slot = value,
            (None, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn set_dotted(table: &mut Table, key: &str, value: Value) -> ConfigResult<()> {
    let invalid = |reason: &str| SproutError::ConfigValidation {
        field: key.to_string(),
        reason: reason.to_string(),
    };

    let mut parts: Vec<&str> = key.split('.').collect();
    let leaf = parts.pop().filter(|leaf| !leaf.is_empty()).ok_or_else(|| invalid("empty key"))?;

    let mut current = table;
    for part in parts {
        let entry = current
            .entry(part.to_string())
            .or_insert(Value::Table(Table::new()));
        current = match entry {
            Value::Table(inner) => inner,
            _ => return Err(invalid("is not a section")),
        };
    }
    current.insert(leaf.to_string(), value);
    Ok(())
}

/// Booleans and integers are typed, everything else stays a string
fn parse_scalar(raw: &str) -> Value {
    match raw {
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        _ => raw
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}

fn describe_sources(sources: &[ConfigSource]) -> String {
    if sources.is_empty() {
        return "defaults".to_string();
    }
    sources
        .iter()
        .map(|source| match source {
            ConfigSource::Global(path) | ConfigSource::Project(path) => path.to_string(),
            ConfigSource::Environment(var) => var.clone(),
            ConfigSource::CommandLine(key) => format!("--{}", key),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
