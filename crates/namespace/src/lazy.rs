//! Lazily imported modules.
//!
//! A [`LazyModule`] is a handle to a module that has not been loaded yet.
//! The first attribute access imports it through the shared [`Importer`];
//! later accesses go straight to the loaded module.

use crate::error::{CherryError, Result};
use crate::importer::{parse_module_name, Importer};
use crate::module::Module;
use crate::value::Value;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// Resolve a possibly relative module name against `package`.
///
/// `".sub"` is `sub` inside `package`, every extra leading dot walks one
/// level up. Absolute names are returned unchanged.
pub fn resolve_name(name: &str, package: Option<&str>) -> Result<String> {
    let level = name.chars().take_while(|&c| c == '.').count();
    if level == 0 {
        return Ok(name.to_string());
    }

    let relative_error = |message: &str| CherryError::RelativeImport {
        name: name.to_string(),
        message: message.to_string(),
    };

    let package = match package {
        Some(package) if !package.is_empty() => package,
        _ => return Err(relative_error("attempted relative import with no known parent package")),
    };

    let parts: Vec<&str> = package.split('.').collect();
    if level > parts.len() {
        return Err(relative_error("attempted relative import beyond top-level package"));
    }
    let base = parts[..parts.len() + 1 - level].join(".");

    let rest = &name[level..];
    if rest.is_empty() {
        Ok(base)
    } else {
        Ok(format!("{base}.{rest}"))
    }
}

/// Handle to a module that loads on first use
pub struct LazyModule {
    name: String,
    importer: Arc<Importer>,
    cell: OnceCell<Arc<Module>>,
}

impl LazyModule {
    /// Absolute name of the module
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the module has been loaded. Never triggers a load.
    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Load the module if needed and return it
    pub fn module(&self) -> Result<&Arc<Module>> {
        self.cell.get_or_try_init(|| {
            log::debug!("Loading lazily imported module {}", self.name);
            self.importer.import_module(&self.name)
        })
    }

    pub fn get_attr(&self, attr: &str) -> Result<Value> {
        let module = self.module()?;
        self.importer.import_from(module, attr)
    }

    pub fn dir(&self) -> Result<Vec<String>> {
        Ok(self.module()?.dir())
    }
}

impl fmt::Debug for LazyModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyModule")
            .field("name", &self.name)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// Import `name` lazily.
///
/// Relative names are anchored on `package`. The module must be known to
/// some finder now; loading it is deferred until first attribute access.
/// A module that is already in the cache is returned loaded.
pub fn lazy_import_module(
    importer: &Arc<Importer>,
    name: &str,
    package: Option<&str>,
) -> Result<LazyModule> {
    let absolute = resolve_name(name, package)?;
    parse_module_name(&absolute)?;

    let cell = match importer.cached_module(&absolute) {
        Some(module) => OnceCell::with_value(module),
        None if importer.has_module(&absolute) => OnceCell::new(),
        None => return Err(CherryError::ModuleNotFound(absolute)),
    };

    Ok(LazyModule {
        name: absolute,
        importer: Arc::clone(importer),
        cell,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_names_pass_through() {
        assert_eq!(resolve_name("os.path", None).unwrap(), "os.path");
        assert_eq!(resolve_name("os", Some("pkg")).unwrap(), "os");
    }

    #[test]
    fn relative_names_walk_up_the_package() {
        assert_eq!(resolve_name(".sub", Some("pkg")).unwrap(), "pkg.sub");
        assert_eq!(resolve_name(".", Some("pkg.inner")).unwrap(), "pkg.inner");
        assert_eq!(
            resolve_name("..sibling", Some("pkg.inner")).unwrap(),
            "pkg.sibling"
        );
        assert_eq!(resolve_name("...top", Some("a.b.c")).unwrap(), "a.top");
    }

    #[test]
    fn relative_without_package_fails() {
        let err = resolve_name(".sub", None).unwrap_err();
        assert!(matches!(err, CherryError::RelativeImport { .. }));
        assert!(err.to_string().contains("no known parent package"));
        assert!(resolve_name(".sub", Some("")).is_err());
    }

    #[test]
    fn relative_beyond_top_level_fails() {
        let err = resolve_name("...x", Some("pkg.inner")).unwrap_err();
        assert!(err.to_string().contains("beyond top-level package"));
    }

    #[test]
    fn lazy_module_loads_on_first_access() {
        let importer = Arc::new(Importer::new());
        let lazy = lazy_import_module(&importer, "os.path", None).unwrap();
        assert!(!lazy.is_loaded());
        assert!(!importer.is_loaded("os.path"));

        let dirname = lazy.get_attr("dirname").unwrap();
        assert!(lazy.is_loaded());
        assert!(importer.is_loaded("os.path"));
        assert_eq!(dirname.as_function().unwrap().qualname(), "os.path.dirname");
        assert_eq!(importer.load_count("os.path"), 1);
    }

    #[test]
    fn cached_modules_come_back_loaded() {
        let importer = Arc::new(Importer::new());
        let os = importer.import_module("os").unwrap();
        let lazy = lazy_import_module(&importer, "os", None).unwrap();
        assert!(lazy.is_loaded());
        assert!(Arc::ptr_eq(lazy.module().unwrap(), &os));
    }

    #[test]
    fn inserted_modules_are_served_without_finders() {
        let importer = Arc::new(Importer::new());
        let custom = Arc::new(Module::new("app.conf"));
        importer.insert_module("app.conf", Arc::clone(&custom));
        let lazy = lazy_import_module(&importer, "app.conf", None).unwrap();
        assert!(lazy.is_loaded());
        assert!(Arc::ptr_eq(lazy.module().unwrap(), &custom));
        assert_eq!(importer.load_count("app.conf"), 0);
    }

    #[test]
    fn unknown_modules_fail_up_front() {
        let importer = Arc::new(Importer::new());
        let err = lazy_import_module(&importer, "missing", None).unwrap_err();
        assert!(matches!(err, CherryError::ModuleNotFound(ref n) if n == "missing"));
    }

    #[test]
    fn relative_lazy_import_uses_package() {
        let importer = Arc::new(Importer::new());
        let lazy = lazy_import_module(&importer, ".path", Some("os")).unwrap();
        assert_eq!(lazy.name(), "os.path");
        assert!(lazy.dir().unwrap().contains(&"splitext".to_string()));
    }

    #[test]
    fn missing_attribute_is_reported() {
        let importer = Arc::new(Importer::new());
        let lazy = lazy_import_module(&importer, "os", None).unwrap();
        let err = lazy.get_attr("nope").unwrap_err();
        assert!(matches!(err, CherryError::MissingMember { .. }));
        assert!(lazy.is_loaded());
    }
}
