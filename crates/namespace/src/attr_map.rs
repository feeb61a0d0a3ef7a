//! Attribute-map expansion: turns declared foreign-names into a cherry-pick
//! plan.

use crate::error::{CherryError, Result};
use crate::foreign_name::{ForeignName, ForeignNameError};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// One expanded attribute-map entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttrMapping {
    /// Name bound on the cherry-picking namespace
    pub attr_name: String,
    /// What to import and which member to take
    pub target: ForeignName,
    /// The entry as it was declared
    pub item: String,
}

impl AttrMapping {
    pub fn expand(item: &str) -> std::result::Result<Self, InvalidEntry> {
        let target = ForeignName::parse(item).map_err(|source| InvalidEntry {
            entry: item.to_string(),
            source,
        })?;
        Ok(Self {
            attr_name: target.bound_name().to_string(),
            target,
            item: item.to_string(),
        })
    }

    pub fn module(&self) -> &str {
        self.target.module().full_name()
    }

    pub fn member(&self) -> Option<&str> {
        self.target.member()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("the attribute map contains an invalid item of {entry:?}: {source}")]
pub struct InvalidEntry {
    pub entry: String,
    #[source]
    pub source: ForeignNameError,
}

/// Expand entries in declaration order, dropping repeated entries that
/// expand to the same binding.
pub fn expand_attr_map<S: AsRef<str>>(
    entries: &[S],
) -> std::result::Result<Vec<AttrMapping>, InvalidEntry> {
    let mut seen = HashSet::new();
    let mut mappings = Vec::with_capacity(entries.len());
    for entry in entries {
        let mapping = AttrMapping::expand(entry.as_ref())?;
        if seen.insert((mapping.attr_name.clone(), mapping.target.clone())) {
            mappings.push(mapping);
        }
    }
    Ok(mappings)
}

/// Everything a cherry-picking namespace needs to know about its lazy names
#[derive(Debug, Clone)]
pub struct CherryPickPlan {
    mappings: Vec<AttrMapping>,
    identifiers: HashMap<String, usize>,
}

impl CherryPickPlan {
    /// Parse an attribute map for the namespace `namespace`.
    ///
    /// Fails on an empty map, on any malformed entry and when two different
    /// entries bind the same name.
    pub fn parse<S: AsRef<str>>(namespace: &str, entries: &[S]) -> Result<Self> {
        if entries.is_empty() {
            return Err(CherryError::config(
                namespace,
                "the attribute map must contain at least one foreign-name",
            ));
        }

        let mappings = expand_attr_map(entries)
            .map_err(|err| CherryError::config(namespace, err.to_string()))?;

        let mut identifiers = HashMap::with_capacity(mappings.len());
        for (idx, mapping) in mappings.iter().enumerate() {
            if identifiers.insert(mapping.attr_name.clone(), idx).is_some() {
                return Err(CherryError::config(
                    namespace,
                    format!(
                        "the attribute map has the attribute {:?} defined multiple times",
                        mapping.attr_name
                    ),
                ));
            }
        }

        Ok(Self {
            mappings,
            identifiers,
        })
    }

    pub fn mappings(&self) -> &[AttrMapping] {
        &self.mappings
    }

    pub fn get(&self, attr: &str) -> Option<&AttrMapping> {
        self.identifiers.get(attr).map(|&idx| &self.mappings[idx])
    }

    pub fn contains(&self, attr: &str) -> bool {
        self.identifiers.contains_key(attr)
    }

    /// Bound names in declaration order
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.mappings.iter().map(|m| m.attr_name.as_str())
    }

    /// Mappings grouped by module, modules in order of first appearance
    pub fn modules(&self) -> Vec<(&str, Vec<&AttrMapping>)> {
        let mut grouped: Vec<(&str, Vec<&AttrMapping>)> = Vec::new();
        for mapping in &self.mappings {
            match grouped.iter_mut().find(|(module, _)| *module == mapping.module()) {
                Some((_, group)) => group.push(mapping),
                None => grouped.push((mapping.module(), vec![mapping])),
            }
        }
        grouped
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
