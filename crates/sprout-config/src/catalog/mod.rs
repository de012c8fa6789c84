//! Tool descriptor catalogs
//!
//! A catalog is a `.json` file holding either an array of descriptors or an
//! object with a `tools` array, or a `.toml` file with `[[tools]]` tables.
//! Descriptors are taken as written; the graph builder does the validation.
//! Version constraints are single ranges; `||` disjunctions fail to parse.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sprout_core::error::SproutError;
use sprout_core::types::ToolDescriptor;

use crate::ConfigResult;

/// Catalog file contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
}

/// Parse a JSON catalog
pub fn parse_json(content: &str, file: &str) -> ConfigResult<Vec<ToolDescriptor>> {
    let json_error = |e: serde_json::Error| SproutError::JsonParse {
        file: file.to_string(),
        message: e.to_string(),
    };

    let value: serde_json::Value = serde_json::from_str(content).map_err(json_error)?;
    if value.is_array() {
        serde_json::from_value(value).map_err(json_error)
    } else if value.is_object() {
        let catalog: Catalog = serde_json::from_value(value).map_err(json_error)?;
        Ok(catalog.tools)
    } else {
        Err(SproutError::JsonParse {
            file: file.to_string(),
            message: "expected an array of tools or an object with a \"tools\" array".to_string(),
        })
    }
}

/// Parse a TOML catalog
pub fn parse_toml(content: &str, file: &str) -> ConfigResult<Vec<ToolDescriptor>> {
    let catalog: Catalog = toml::from_str(content).map_err(|e| SproutError::TomlParse {
        file: file.to_string(),
        message: e.to_string(),
    })?;
    Ok(catalog.tools)
}

/// Load a catalog, choosing the format by file extension
pub fn load_catalog(path: &Utf8Path) -> ConfigResult<Vec<ToolDescriptor>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SproutError::io(format!("Failed to read catalog {}", path), e))?;

    let tools = match path.extension() {
        Some("json") => parse_json(&content, path.as_str())?,
        Some("toml") => parse_toml(&content, path.as_str())?,
        other => {
            return Err(SproutError::ConfigValidation {
                field: "catalog".to_string(),
                reason: format!(
                    "unsupported catalog format {:?} for {}; use .json or .toml",
                    other.unwrap_or(""),
                    path
                ),
            })
        }
    };

    debug!(%path, tools = tools.len(), "catalog loaded");
    Ok(tools)
}
