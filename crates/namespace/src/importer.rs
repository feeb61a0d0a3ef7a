//! The module system: a module cache in front of a list of finders.
//!
//! ```text
//! Importer
//!   ├── module cache   Mutex<HashMap<name, Arc<OnceCell<Arc<Module>>>>>
//!   ├── finders        RwLock<Vec<Arc<dyn ModuleFinder>>>
//!   ├── load counters  Mutex<HashMap<name, usize>>
//!   └── namespaces     Mutex<HashMap<name, Arc<Namespace>>>
//! ```
//!
//! The cache lock is only held long enough to find or create a module's
//! cell. Loading runs inside the cell, so one module loads at most once
//! while other modules load in parallel. A failed load drops its empty
//! cell from the cache and the next import retries.
//!
//! Installed namespaces are registered by name. Installing a namespace
//! under a name that is already taken replaces the registered one.

use crate::dotted_name::DottedName;
use crate::error::{CherryError, Result};
use crate::finder::{BuiltinFinder, FileSystemFinder, ModuleFinder};
use crate::module::Module;
use crate::namespace::Namespace;
use crate::value::Value;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

type ModuleCell = Arc<OnceCell<Arc<Module>>>;

pub struct Importer {
    finders: RwLock<Vec<Arc<dyn ModuleFinder>>>,
    modules: Mutex<HashMap<String, ModuleCell>>,
    load_counts: Mutex<HashMap<String, usize>>,
    namespaces: Mutex<HashMap<String, Arc<Namespace>>>,
}

impl Importer {
    /// Importer with the builtin modules only
    pub fn new() -> Self {
        Self::with_finders(vec![Arc::new(BuiltinFinder::new())])
    }

    /// Importer with builtin modules plus file-system module roots
    pub fn with_module_roots<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let importer = Self::new();
        importer.add_finder(Arc::new(FileSystemFinder::new(roots)));
        importer
    }

    pub fn with_finders(finders: Vec<Arc<dyn ModuleFinder>>) -> Self {
        Self {
            finders: RwLock::new(finders),
            modules: Mutex::new(HashMap::new()),
            load_counts: Mutex::new(HashMap::new()),
            namespaces: Mutex::new(HashMap::new()),
        }
    }

    /// Append a finder; it is consulted after the existing ones.
    pub fn add_finder(&self, finder: Arc<dyn ModuleFinder>) {
        self.finders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(finder);
    }

    /// Import an absolute dotted module name.
    ///
    /// Parent packages are imported first and every loaded child is bound on
    /// its parent under its leaf name.
    pub fn import_module(&self, name: &str) -> Result<Arc<Module>> {
        let dotted = parse_module_name(name)?;
        self.import_dotted(&dotted)
    }

    fn import_dotted(&self, name: &DottedName) -> Result<Arc<Module>> {
        let parent = match name.parent() {
            Some(parent) => Some(self.import_dotted(&parent)?),
            None => None,
        };

        let cell = self.cell_for(name.full_name());
        let loaded = cell.get_or_try_init(|| -> Result<Arc<Module>> {
            let module = Arc::new(self.load(name)?);
            if let Some(parent) = &parent {
                parent.set_attr(name.leaf(), Value::Module(Arc::clone(&module)));
            }
            Ok(module)
        });
        match loaded {
            Ok(module) => Ok(Arc::clone(module)),
            Err(err) => {
                self.discard_empty_cell(name.full_name(), &cell);
                Err(err)
            }
        }
    }

    fn cell_for(&self, name: &str) -> ModuleCell {
        let mut modules = self.modules.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(modules.entry(name.to_string()).or_default())
    }

    /// Remove `cell` from the cache if it is still the entry for `name`, is
    /// empty and no other import is waiting on it.
    fn discard_empty_cell(&self, name: &str, cell: &ModuleCell) {
        let mut modules = self.modules.lock().unwrap_or_else(PoisonError::into_inner);
        // Clones are only handed out under this lock: one for the map, one for us
        let stale = modules.get(name).is_some_and(|current| {
            Arc::ptr_eq(current, cell) && current.get().is_none() && Arc::strong_count(cell) == 2
        });
        if stale {
            modules.remove(name);
        }
    }

    fn load(&self, name: &DottedName) -> Result<Module> {
        *self
            .load_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.full_name().to_string())
            .or_default() += 1;

        // Snapshot so finders run without holding the finder lock
        let finders = self
            .finders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for finder in &finders {
            if let Some(module) = finder.find(name)? {
                log::debug!("Loaded module {name} via {} finder", finder.label());
                return Ok(module);
            }
        }
        Err(CherryError::ModuleNotFound(name.full_name().to_string()))
    }

    /// Get `member` from a module, importing `module.member` as a submodule
    /// when no such attribute exists.
    pub fn import_from(&self, module: &Module, member: &str) -> Result<Value> {
        if let Some(value) = module.get_attr(member) {
            return Ok(value);
        }

        let missing = || CherryError::MissingMember {
            module: module.name().to_string(),
            attr: member.to_string(),
        };
        let submodule = parse_module_name(module.name())?
            .child(member)
            .map_err(|_| missing())?;
        match self.import_dotted(&submodule) {
            Ok(sub) => Ok(Value::Module(sub)),
            Err(CherryError::ModuleNotFound(name)) if name == submodule.full_name() => {
                Err(missing())
            }
            Err(err) => Err(err),
        }
    }

    /// True if some finder could provide the module, or it is cached
    pub fn has_module(&self, name: &str) -> bool {
        if self.is_loaded(name) {
            return true;
        }
        let Ok(dotted) = DottedName::parse(name) else {
            return false;
        };
        self.finders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|finder| finder.has_module(&dotted))
    }

    /// Put a ready-made module into the cache, replacing any previous one
    pub fn insert_module(&self, name: impl Into<String>, module: Arc<Module>) {
        self.modules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), Arc::new(OnceCell::with_value(module)));
    }

    /// Drop a module from the cache; the next import loads it again
    pub fn remove_module(&self, name: &str) -> Option<Arc<Module>> {
        self.modules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .and_then(|cell| cell.get().cloned())
    }

    pub fn cached_module(&self, name: &str) -> Option<Arc<Module>> {
        self.modules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .and_then(|cell| cell.get().cloned())
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.cached_module(name).is_some()
    }

    /// Names of loaded modules, sorted
    pub fn cached_modules(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .modules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, cell)| cell.get().is_some())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub(crate) fn register_namespace(&self, ns: Arc<Namespace>) -> Option<Arc<Namespace>> {
        self.namespaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ns.name().to_string(), ns)
    }

    /// The namespace most recently installed under `name`
    pub fn namespace(&self, name: &str) -> Option<Arc<Namespace>> {
        self.namespaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Names of registered namespaces, sorted
    pub fn namespace_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .namespaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn remove_namespace(&self, name: &str) -> Option<Arc<Namespace>> {
        self.namespaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// How many times finders ran for `name`, failed attempts included
    pub fn load_count(&self, name: &str) -> usize {
        self.load_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
            .unwrap_or(0)
    }
}

impl Default for Importer {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn parse_module_name(name: &str) -> Result<DottedName> {
    DottedName::parse(name).map_err(|err| CherryError::InvalidModuleName {
        name: name.to_string(),
        message: err.to_string(),
    })
}
