use thiserror::Error;

/// Result type for namespace and import operations
pub type Result<T> = std::result::Result<T, CherryError>;

/// Errors raised while declaring, importing or resolving lazy attributes
#[derive(Error, Debug)]
pub enum CherryError {
    /// A declaration or attribute map is malformed; raised at install time
    #[error("Invalid cherry-pick configuration for {namespace:?}: {message}")]
    Config { namespace: String, message: String },

    /// No finder knows the requested module
    #[error("No module named {0:?}")]
    ModuleNotFound(String),

    /// A finder located the module but could not build it
    #[error("Failed to load module {module:?}: {message}")]
    LoadError { module: String, message: String },

    /// The imported module lacks the requested member
    #[error("Module {module:?} has no attribute {attr:?}")]
    MissingMember { module: String, attr: String },

    /// The namespace never declared this name
    #[error("Namespace {namespace:?} has no attribute {attr:?}")]
    UnknownName { namespace: String, attr: String },

    /// Not an absolute dotted module name
    #[error("Invalid module name {name:?}: {message}")]
    InvalidModuleName { name: String, message: String },

    /// A relative name could not be anchored on its package
    #[error("Cannot resolve relative import {name:?}: {message}")]
    RelativeImport { name: String, message: String },

    /// A native function rejected its arguments
    #[error("{function}() {message}")]
    InvalidArgument { function: String, message: String },

    /// Reading a declaration or module file failed
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A JSON declaration or data module is malformed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A TOML declaration or data module is malformed
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl CherryError {
    /// Create a configuration error for a namespace
    pub fn config(namespace: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            namespace: namespace.into(),
            message: message.into(),
        }
    }

    /// Create a load error for a module
    pub fn load(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LoadError {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Create an argument error for a native function
    pub fn invalid_argument(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Stable error class used by the CLI envelope
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config_error",
            Self::ModuleNotFound(_)
            | Self::LoadError { .. }
            | Self::InvalidModuleName { .. }
            | Self::RelativeImport { .. } => "import_error",
            Self::MissingMember { .. } | Self::UnknownName { .. } => "attribute_error",
            Self::InvalidArgument { .. } => "type_error",
            Self::IoError(_) | Self::JsonError(_) | Self::TomlError(_) => "io_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_import_and_attribute_failures() {
        assert_eq!(
            CherryError::ModuleNotFound("a".into()).kind(),
            "import_error"
        );
        assert_eq!(CherryError::load("a", "boom").kind(), "import_error");
        assert_eq!(
            CherryError::UnknownName {
                namespace: "pkg".into(),
                attr: "x".into()
            }
            .kind(),
            "attribute_error"
        );
        assert_eq!(CherryError::config("pkg", "bad").kind(), "config_error");
    }

    #[test]
    fn messages_name_the_failing_target() {
        let err = CherryError::MissingMember {
            module: "os.path".into(),
            attr: "nope".into(),
        };
        assert_eq!(
            err.to_string(),
            "Module \"os.path\" has no attribute \"nope\""
        );
    }

    #[test]
    fn wrapped_errors_convert_and_count_as_io() {
        let err: CherryError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.to_string(), "IO error: gone");
        assert_eq!(err.kind(), "io_error");

        let err: CherryError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(err.to_string().starts_with("JSON error: "));
        assert_eq!(err.kind(), "io_error");

        let err: CherryError = toml::from_str::<toml::Value>("= 1").unwrap_err().into();
        assert!(err.to_string().starts_with("TOML error: "));
        assert_eq!(err.kind(), "io_error");
    }
}
