use crate::foreign_name::{is_identifier, ForeignNameError};
use std::fmt;

/// An absolute dotted module name with pre-split segments.
///
/// Always valid: never relative, never with empty segments, every segment
/// shaped like an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DottedName {
    full_name: String,
    parts: Vec<String>,
}

impl DottedName {
    pub fn parse(name: &str) -> Result<Self, ForeignNameError> {
        if name.starts_with('.') {
            return Err(ForeignNameError::RelativePath(name.to_string()));
        }

        let parts: Vec<String> = name.split('.').map(str::to_string).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(ForeignNameError::EmptySegment(name.to_string()));
        }
        if let Some(bad) = parts.iter().find(|p| !is_identifier(p)) {
            return Err(ForeignNameError::InvalidIdentifier {
                identifier: bad.clone(),
                reason: "module path segments must be identifiers",
            });
        }

        Ok(Self {
            full_name: name.to_string(),
            parts,
        })
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn depth(&self) -> usize {
        self.parts.len()
    }

    /// The last segment, e.g. `path` for `os.path`
    pub fn leaf(&self) -> &str {
        self.parts
            .last()
            .map(String::as_str)
            .unwrap_or(self.full_name.as_str())
    }

    /// The containing package, e.g. `os` for `os.path`
    pub fn parent(&self) -> Option<DottedName> {
        if self.parts.len() < 2 {
            return None;
        }
        let parts = self.parts[..self.parts.len() - 1].to_vec();
        Some(Self {
            full_name: parts.join("."),
            parts,
        })
    }

    /// Append a segment, e.g. `os` + `path` -> `os.path`
    pub fn child(&self, segment: &str) -> Result<DottedName, ForeignNameError> {
        Self::parse(&format!("{}.{segment}", self.full_name))
    }
}

impl fmt::Display for DottedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}
