//! `Module` - runtime representation of an imported module.

use crate::value::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// A loaded module: a name, where it came from and its attributes.
///
/// Attributes live behind a `RwLock` so a module can be shared between
/// threads and still receive submodule bindings after it loads.
#[derive(Debug)]
pub struct Module {
    name: String,
    origin: Option<PathBuf>,
    attrs: RwLock<BTreeMap<String, Value>>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: None,
            attrs: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a module that was loaded from a file or directory
    pub fn with_origin(name: impl Into<String>, origin: impl Into<PathBuf>) -> Self {
        Self {
            origin: Some(origin.into()),
            ..Self::new(name)
        }
    }

    /// Builder-style attribute binding used when constructing modules
    pub fn with_attr(self, name: impl Into<String>, value: Value) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn get_attr(&self, name: &str) -> Option<Value> {
        self.attrs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn set_attr(&self, name: impl Into<String>, value: Value) {
        self.attrs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), value);
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Returns `true` if the attribute existed and was removed.
    pub fn del_attr(&self, name: &str) -> bool {
        self.attrs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    /// All attribute names, sorted
    pub fn dir(&self) -> Vec<String> {
        self.attrs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Attribute names not starting with an underscore, sorted
    pub fn public_names(&self) -> Vec<String> {
        self.attrs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|name| !name.starts_with('_'))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.attrs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
