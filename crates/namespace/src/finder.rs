//! Module finders: where an `Importer` looks for modules.
//!
//! ```text
//! Importer::import_module("pkg.data")
//!   ├── BuiltinFinder      (os, os.path)
//!   └── FileSystemFinder   (<root>/pkg/data.toml, <root>/pkg/data.json,
//!                           <root>/pkg/data/mod.toml, <root>/pkg/data/mod.json,
//!                           <root>/pkg/data/ as an empty package)
//! ```

use crate::dotted_name::DottedName;
use crate::error::{CherryError, Result};
use crate::foreign_name::is_identifier;
use crate::module::Module;
use crate::value::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Locates and builds modules by name.
pub trait ModuleFinder: Send + Sync {
    /// Short label used in logs
    fn label(&self) -> &str;

    /// Cheap existence check that does not load anything
    fn has_module(&self, name: &DottedName) -> bool;

    /// Build the module. `Ok(None)` means this finder does not know it.
    fn find(&self, name: &DottedName) -> Result<Option<Module>>;
}

// =============================================================================
// Builtin modules
// =============================================================================

type ModuleBuilder = fn() -> Module;

/// Modules implemented in Rust
pub struct BuiltinFinder {
    builders: HashMap<String, ModuleBuilder>,
}

impl BuiltinFinder {
    pub fn new() -> Self {
        let mut finder = Self::empty();
        finder.register("os", os_module);
        finder.register("os.path", os_path_module);
        finder
    }

    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, builder: ModuleBuilder) {
        self.builders.insert(name.into(), builder);
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for BuiltinFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleFinder for BuiltinFinder {
    fn label(&self) -> &str {
        "builtin"
    }

    fn has_module(&self, name: &DottedName) -> bool {
        self.builders.contains_key(name.full_name())
    }

    fn find(&self, name: &DottedName) -> Result<Option<Module>> {
        Ok(self.builders.get(name.full_name()).map(|build| build()))
    }
}

fn os_module() -> Module {
    Module::new("os")
        .with_attr("sep", Value::string("/"))
        .with_attr("name", Value::string("posix"))
}

fn os_path_module() -> Module {
    Module::new("os.path")
        .with_attr("sep", Value::string("/"))
        .with_attr("dirname", Value::function("os.path.dirname", path_dirname))
        .with_attr("basename", Value::function("os.path.basename", path_basename))
        .with_attr("join", Value::function("os.path.join", path_join))
        .with_attr("splitext", Value::function("os.path.splitext", path_splitext))
}

fn str_args<'a>(function: &str, args: &'a [Value]) -> Result<Vec<&'a str>> {
    args.iter()
        .map(|arg| {
            arg.as_str().ok_or_else(|| {
                CherryError::invalid_argument(
                    function,
                    format!("expects str arguments, got {}", arg.type_name()),
                )
            })
        })
        .collect()
}

fn single_str_arg<'a>(function: &str, args: &'a [Value]) -> Result<&'a str> {
    match str_args(function, args)?.as_slice() {
        [path] => Ok(*path),
        other => Err(CherryError::invalid_argument(
            function,
            format!("takes exactly one argument ({} given)", other.len()),
        )),
    }
}

/// Index just past the last separator
fn split_point(path: &str) -> usize {
    path.rfind('/').map_or(0, |idx| idx + 1)
}

fn path_dirname(args: &[Value]) -> Result<Value> {
    let path = single_str_arg("dirname", args)?;
    let head = &path[..split_point(path)];
    let trimmed = head.trim_end_matches('/');
    // A head made only of separators is the root and stays as-is
    Ok(Value::string(if trimmed.is_empty() { head } else { trimmed }))
}

fn path_basename(args: &[Value]) -> Result<Value> {
    let path = single_str_arg("basename", args)?;
    Ok(Value::string(&path[split_point(path)..]))
}

fn path_join(args: &[Value]) -> Result<Value> {
    let parts = str_args("join", args)?;
    let Some((first, rest)) = parts.split_first() else {
        return Err(CherryError::invalid_argument(
            "join",
            "missing 1 required positional argument",
        ));
    };

    let mut joined = first.to_string();
    for part in rest {
        if part.starts_with('/') {
            joined = part.to_string();
        } else if joined.is_empty() || joined.ends_with('/') {
            joined.push_str(part);
        } else {
            joined.push('/');
            joined.push_str(part);
        }
    }
    Ok(Value::string(joined))
}

fn path_splitext(args: &[Value]) -> Result<Value> {
    let path = single_str_arg("splitext", args)?;
    let base_start = split_point(path);
    let base = &path[base_start..];
    // Leading dots belong to the name (".bashrc" has no extension)
    let leading = base.len() - base.trim_start_matches('.').len();
    let split = base[leading..]
        .rfind('.')
        .map(|idx| base_start + leading + idx);
    let (root, ext) = match split {
        Some(idx) => (&path[..idx], &path[idx..]),
        None => (path, ""),
    };
    Ok(Value::data(serde_json::json!([root, ext])))
}

// =============================================================================
// File-system modules
// =============================================================================

const MODULE_EXTENSIONS: [&str; 2] = ["toml", "json"];
const PACKAGE_FILE_STEM: &str = "mod";

/// Loads data modules from TOML/JSON files under a list of roots.
///
/// The first root containing a match wins. A directory without a package
/// file is an empty package, so its children can still be imported.
pub struct FileSystemFinder {
    roots: Vec<PathBuf>,
}

impl FileSystemFinder {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Where the module may live under `root`, in lookup order.
    fn candidates(root: &Path, name: &DottedName) -> Vec<PathBuf> {
        let (leaf, parents) = match name.parts().split_last() {
            Some(split) => split,
            None => return Vec::new(),
        };
        let parent_dir = parents.iter().fold(root.to_path_buf(), |acc, p| acc.join(p));
        let package_dir = parent_dir.join(leaf);

        let mut candidates: Vec<PathBuf> = MODULE_EXTENSIONS
            .iter()
            .map(|ext| parent_dir.join(format!("{leaf}.{ext}")))
            .collect();
        candidates.extend(
            MODULE_EXTENSIONS
                .iter()
                .map(|ext| package_dir.join(format!("{PACKAGE_FILE_STEM}.{ext}"))),
        );
        candidates
    }

    fn locate(&self, name: &DottedName) -> Option<PathBuf> {
        for root in &self.roots {
            if let Some(file) = Self::candidates(root, name)
                .into_iter()
                .find(|path| path.is_file())
            {
                return Some(file);
            }
            let dir = name.parts().iter().fold(root.clone(), |acc, p| acc.join(p));
            if dir.is_dir() {
                return Some(dir);
            }
        }
        None
    }
}

impl ModuleFinder for FileSystemFinder {
    fn label(&self) -> &str {
        "filesystem"
    }

    fn has_module(&self, name: &DottedName) -> bool {
        self.locate(name).is_some()
    }

    fn find(&self, name: &DottedName) -> Result<Option<Module>> {
        match self.locate(name) {
            Some(path) if path.is_dir() => {
                log::debug!("Module {name} is a package directory {}", path.display());
                Ok(Some(Module::with_origin(name.full_name(), path)))
            }
            Some(path) => load_module_file(name, &path).map(Some),
            None => Ok(None),
        }
    }
}

/// Parse a module file into a module whose attributes are the top-level keys
pub fn load_module_file(name: &DottedName, path: &Path) -> Result<Module> {
    let text = fs::read_to_string(path)?;
    let data: serde_json::Value = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => {
            let table: toml::Table = toml::from_str(&text).map_err(|err| {
                CherryError::load(name.full_name(), format!("{}: {err}", path.display()))
            })?;
            serde_json::to_value(table)?
        }
        Some("json") => serde_json::from_str(&text).map_err(|err| {
            CherryError::load(name.full_name(), format!("{}: {err}", path.display()))
        })?,
        other => {
            return Err(CherryError::load(
                name.full_name(),
                format!("unsupported module file extension {other:?}"),
            ))
        }
    };

    let serde_json::Value::Object(entries) = data else {
        return Err(CherryError::load(
            name.full_name(),
            format!("{} must contain a top-level table", path.display()),
        ));
    };

    let module = Module::with_origin(name.full_name(), path);
    for (key, value) in entries {
        if !is_identifier(&key) {
            log::warn!(
                "Skipping attribute {key:?} of module {name}: not an identifier ({})",
                path.display()
            );
            continue;
        }
        module.set_attr(key, Value::data(value));
    }
    Ok(module)
}
