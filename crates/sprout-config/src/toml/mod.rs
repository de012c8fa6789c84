//! sprout.toml configuration parsing and serialization

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use sprout_core::error::SproutError;
use sprout_core::types::{Architecture, OperatingSystem, TargetPlatform};
use sprout_resolver::{BuildOptions, DetectionOptions, OrderingOptions, ResolutionPolicy};

use crate::ConfigResult;

/// Complete sprout.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SproutToml {
    /// Descriptor catalog used when none is given on the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Utf8PathBuf>,

    /// Platform to plan for, defaulting to the host
    pub platform: PlatformSection,

    /// Graph construction
    pub build: BuildOptions,

    /// Conflict detection
    pub detection: DetectionOptions,

    /// What the resolver may change
    pub resolution: ResolutionPolicy,

    /// Installation ordering
    pub ordering: OrderingOptions,
}

/// Target platform section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<OperatingSystem>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<Architecture>,
}

impl PlatformSection {
    /// Resolve the target platform, filling unset parts from the host
    pub fn target(&self) -> ConfigResult<TargetPlatform> {
        if let (Some(os), Some(arch)) = (self.os, self.arch) {
            return Ok(TargetPlatform::new(os, arch));
        }

        let host = TargetPlatform::current().ok_or_else(|| SproutError::ConfigValidation {
            field: "platform".to_string(),
            reason: format!(
                "host platform {}-{} is not supported; set platform.os and platform.arch",
                std::env::consts::OS,
                std::env::consts::ARCH
            ),
        })?;

        Ok(TargetPlatform::new(
            self.os.unwrap_or(host.os),
            self.arch.unwrap_or(host.arch),
        ))
    }
}

/// Parse TOML string to SproutToml configuration
pub fn parse_sprout_toml(content: &str, file: &str) -> ConfigResult<SproutToml> {
    let config: SproutToml = toml::from_str(content).map_err(|e| SproutError::TomlParse {
        file: file.to_string(),
        message: e.to_string(),
    })?;

    validate_config(&config)?;

    Ok(config)
}

/// Serialize SproutToml to TOML string
pub fn serialize_sprout_toml(config: &SproutToml) -> ConfigResult<String> {
    toml::to_string_pretty(config).map_err(|e| SproutError::TomlParse {
        file: "sprout.toml".to_string(),
        message: format!("serialization failed: {}", e),
    })
}

/// Validate settings serde cannot check on its own
pub fn validate_config(config: &SproutToml) -> ConfigResult<()> {
    if config.build.max_nodes == 0 {
        return Err(SproutError::ConfigValidation {
            field: "build.max-nodes".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    if let Some(catalog) = &config.catalog {
        if catalog.as_str().is_empty() {
            return Err(SproutError::ConfigValidation {
                field: "catalog".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
    }

    Ok(())
}

/// Load and parse sprout.toml from file path
///
/// A relative `catalog` path is resolved against the file's directory.
pub fn load_from_file(path: &Utf8Path) -> ConfigResult<SproutToml> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SproutError::io(format!("Failed to read {}", path), e))?;

    let mut config = parse_sprout_toml(&content, path.as_str())?;
    if let (Some(catalog), Some(dir)) = (&config.catalog, path.parent()) {
        if catalog.is_relative() {
            config.catalog = Some(dir.join(catalog));
        }
    }

    Ok(config)
}
