//! Declarations of cherry-picking namespaces, in code or as TOML/JSON files.
//!
//! ```toml
//! name = "pkg"
//! attr_map = ["os.path:dirname,pathdirname", "os"]
//!
//! [additional_attrs]
//! version = "1.0"
//! ```

use crate::error::{CherryError, Result};
use crate::importer::parse_module_name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Declaration {
    /// Dotted name of the owning namespace
    pub name: String,

    /// Foreign-names resolved lazily, in declaration order
    #[serde(default)]
    pub attr_map: Vec<String>,

    /// Values bound eagerly at install time
    #[serde(default)]
    pub additional_attrs: BTreeMap<String, serde_json::Value>,
}

impl Declaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, foreign_name: impl Into<String>) -> Self {
        self.attr_map.push(foreign_name.into());
        self
    }

    pub fn with_additional(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.additional_attrs.insert(name.into(), value.into());
        self
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a declaration file; the format follows the file extension.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let declaration = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&text)?,
            Some("json") => Self::from_json_str(&text)?,
            _ => {
                return Err(CherryError::config(
                    path.display().to_string(),
                    "declaration files must end in .toml or .json",
                ))
            }
        };
        log::debug!(
            "Loaded declaration {:?} from {}",
            declaration.name,
            path.display()
        );
        Ok(declaration)
    }

    /// Check the parts that do not need the attribute map parsed
    pub fn validate(&self) -> Result<()> {
        parse_module_name(&self.name)
            .map_err(|err| CherryError::config(&self.name, err.to_string()))?;
        if self.attr_map.is_empty() {
            return Err(CherryError::config(
                &self.name,
                "the attribute map must contain at least one foreign-name",
            ));
        }
        Ok(())
    }
}
