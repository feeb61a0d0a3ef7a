//! Foreign-name grammar: `<dotted.module.path>[:<member>][,<alias>]`.
//!
//! A foreign-name tells a cherry-picking namespace what to load lazily and
//! under which name to bind it:
//!
//! ```text
//! "os.path"                      -> binds `path`        to module os.path
//! "os.path,_path"                -> binds `_path`       to module os.path
//! "os.path:dirname"              -> binds `dirname`     to os.path.dirname
//! "os.path:dirname,pathdirname"  -> binds `pathdirname` to os.path.dirname
//! ```

use crate::dotted_name::DottedName;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Words that can never be bound as attribute names.
pub const RESERVED_WORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// Why a foreign-name or identifier was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForeignNameError {
    #[error("foreign-name is empty")]
    Empty,

    #[error("module path {0:?} is relative; only absolute paths are allowed")]
    RelativePath(String),

    #[error("module path {0:?} contains an empty segment")]
    EmptySegment(String),

    #[error("the identifier {identifier:?} is invalid: {reason}")]
    InvalidIdentifier {
        identifier: String,
        reason: &'static str,
    },
}

/// Returns true when `s` has identifier shape: a letter or `_`, then letters,
/// digits or `_`.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Returns true for names of the form `__name__`, which are kept for
/// namespace metadata.
pub fn is_dunder(s: &str) -> bool {
    s.len() > 4 && s.starts_with("__") && s.ends_with("__")
}

/// Validate a name that will be bound on a namespace.
pub fn validate_identifier(identifier: &str) -> Result<&str, ForeignNameError> {
    let invalid = |reason| ForeignNameError::InvalidIdentifier {
        identifier: identifier.to_string(),
        reason,
    };

    if !is_identifier(identifier) {
        return Err(invalid("not an identifier"));
    }
    if RESERVED_WORDS.contains(&identifier) {
        return Err(invalid("cannot be a reserved word"));
    }
    if is_dunder(identifier) {
        return Err(invalid("cannot be a special dunder"));
    }
    Ok(identifier)
}

/// A parsed foreign-name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForeignName {
    module: DottedName,
    member: Option<String>,
    alias: Option<String>,
}

impl ForeignName {
    /// Parse a foreign-name.
    ///
    /// The alias is split off at the last comma and the member at the last
    /// colon of what remains. Whitespace around each part is ignored, and an
    /// empty member or alias counts as absent.
    pub fn parse(raw: &str) -> Result<Self, ForeignNameError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ForeignNameError::Empty);
        }

        let (rest, alias) = match raw.rsplit_once(',') {
            Some((rest, alias)) => (rest, optional_identifier(alias)?),
            None => (raw, None),
        };
        let (module, member) = match rest.rsplit_once(':') {
            Some((module, member)) => (module, optional_identifier(member)?),
            None => (rest, None),
        };

        let module = DottedName::parse(module.trim())?;
        if member.is_none() && alias.is_none() {
            // The last segment becomes the bound name
            validate_identifier(module.leaf())?;
        }

        Ok(Self {
            module,
            member,
            alias,
        })
    }

    /// The absolute module path to import
    pub fn module(&self) -> &DottedName {
        &self.module
    }

    /// The attribute of the module to bind, if any
    pub fn member(&self) -> Option<&str> {
        self.member.as_deref()
    }

    /// The explicit binding name, if any
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The name bound on the owning namespace: alias, else member, else the
    /// last module segment.
    pub fn bound_name(&self) -> &str {
        self.alias
            .as_deref()
            .or(self.member.as_deref())
            .unwrap_or_else(|| self.module.leaf())
    }
}

fn optional_identifier(raw: &str) -> Result<Option<String>, ForeignNameError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    validate_identifier(trimmed).map(|s| Some(s.to_string()))
}

impl FromStr for ForeignName {
    type Err = ForeignNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ForeignName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.module)?;
        if let Some(member) = &self.member {
            write!(f, ":{member}")?;
        }
        if let Some(alias) = &self.alias {
            write!(f, ",{alias}")?;
        }
        Ok(())
    }
}
