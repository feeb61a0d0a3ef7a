//! # Cherry-pick Namespaces
//!
//! Lazy attribute namespaces: a namespace declares the names it exposes as
//! foreign-names, and each name is imported on first access only.
//!
//! ## Foreign-names
//!
//! ```text
//! <dotted.module.path>[:<member>][,<alias>]
//!
//! "os"                          -> binds `os`, the module
//! "os.path,_path"               -> binds `_path`, the module os.path
//! "os.path:dirname"             -> binds `dirname`, os.path.dirname
//! "os.path:dirname,pathdirname" -> binds `pathdirname`, os.path.dirname
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Declaration (code / TOML / JSON)
//!     │
//!     ├──> CherryPickPlan (parse every foreign-name, reject conflicts)
//!     │
//!     └──> Namespace
//!          ├─> eager additional attributes
//!          └─> one once-cell per lazy name
//!                   │ first access
//!                   ▼
//!               Importer ── module cache (one once-cell per module)
//!                   ├─> BuiltinFinder     (os, os.path)
//!                   └─> FileSystemFinder  (TOML/JSON data modules)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use cherry_namespace::{cherry_pick, Declaration, Importer};
//! use std::sync::Arc;
//!
//! let importer = Arc::new(Importer::new());
//! let declaration = Declaration::new("pkg")
//!     .with_attr("os.path:dirname,pathdirname")
//!     .with_additional("version", "1.0");
//!
//! let ns = cherry_pick(&importer, &declaration).unwrap();
//! assert!(!ns.is_resolved("pathdirname"));
//!
//! let dirname = ns.get("pathdirname").unwrap();
//! let parent = dirname
//!     .as_function()
//!     .unwrap()
//!     .call(&[cherry_namespace::Value::string("/usr/lib/file.txt")])
//!     .unwrap();
//! assert_eq!(parent.as_str(), Some("/usr/lib"));
//! assert!(ns.is_resolved("pathdirname"));
//! ```

mod attr_map;
mod declaration;
mod dotted_name;
mod error;
mod finder;
mod foreign_name;
mod importer;
mod lazy;
mod module;
mod namespace;
mod value;

pub use attr_map::{expand_attr_map, AttrMapping, CherryPickPlan, InvalidEntry};
pub use declaration::Declaration;
pub use dotted_name::DottedName;
pub use error::{CherryError, Result};
pub use finder::{load_module_file, BuiltinFinder, FileSystemFinder, ModuleFinder};
pub use foreign_name::{
    is_dunder, is_identifier, validate_identifier, ForeignName, ForeignNameError, RESERVED_WORDS,
};
pub use importer::Importer;
pub use lazy::{lazy_import_module, resolve_name, LazyModule};
pub use module::Module;
pub use namespace::{cherry_pick, Namespace};
pub use value::{NativeFn, NativeFunction, Value};
