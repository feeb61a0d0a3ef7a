//! Cherry-picking namespaces.
//!
//! A [`Namespace`] owns one once-cell per lazily declared name. Reading a
//! name for the first time imports its module through the [`Importer`],
//! takes the member if one was declared and stores the result in the cell.
//! Every later read returns the stored value without touching the importer.
//!
//! ```text
//! Namespace::get("pathdirname")
//!   ├── additional attribute?   -> eager value
//!   ├── lazy slot resolved?     -> cached value
//!   ├── lazy slot unresolved    -> import "os.path", take "dirname", cache
//!   └── otherwise               -> CherryError::UnknownName
//! ```

use crate::attr_map::{AttrMapping, CherryPickPlan};
use crate::declaration::Declaration;
use crate::error::{CherryError, Result};
use crate::foreign_name::is_identifier;
use crate::importer::{parse_module_name, Importer};
use crate::value::Value;
use once_cell::sync::OnceCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Weak};

struct LazySlot {
    mapping: AttrMapping,
    cell: OnceCell<Value>,
}

pub struct Namespace {
    name: String,
    importer: Weak<Importer>,
    attr_map: Vec<String>,
    plan: CherryPickPlan,
    slots: HashMap<String, LazySlot>,
    eager: BTreeMap<String, Value>,
    public: Vec<String>,
}

impl Namespace {
    /// Install a namespace from a declaration.
    ///
    /// Every foreign-name is parsed here; nothing is imported until a name
    /// is first read. The namespace is registered on the importer under its
    /// name, replacing any namespace installed there before.
    pub fn install(importer: &Arc<Importer>, declaration: &Declaration) -> Result<Arc<Self>> {
        declaration.validate()?;
        let additional = declaration
            .additional_attrs
            .iter()
            .map(|(key, value)| (key.clone(), Value::data(value.clone())));
        Self::new(importer, &declaration.name, &declaration.attr_map, additional)
    }

    /// Build a namespace from an attribute map and arbitrary eager values.
    pub fn new<S, I>(
        importer: &Arc<Importer>,
        name: &str,
        attr_map: &[S],
        additional: I,
    ) -> Result<Arc<Self>>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (String, Value)>,
    {
        parse_module_name(name).map_err(|err| CherryError::config(name, err.to_string()))?;
        let plan = CherryPickPlan::parse(name, attr_map)?;

        let mut eager = BTreeMap::new();
        for (key, value) in additional {
            if !is_identifier(&key) {
                return Err(CherryError::config(
                    name,
                    format!("the additional attribute {key:?} is not an identifier"),
                ));
            }
            if plan.contains(&key) {
                return Err(CherryError::config(
                    name,
                    format!("the additional attribute {key:?} is also in the attribute map"),
                ));
            }
            eager.insert(key, value);
        }

        let slots: HashMap<String, LazySlot> = plan
            .mappings()
            .iter()
            .map(|mapping| {
                let slot = LazySlot {
                    mapping: mapping.clone(),
                    cell: OnceCell::new(),
                };
                (mapping.attr_name.clone(), slot)
            })
            .collect();

        let mut public: Vec<String> = plan
            .identifiers()
            .map(str::to_string)
            .chain(eager.keys().filter(|key| !key.starts_with('_')).cloned())
            .collect();
        public.sort();

        let ns = Arc::new(Self {
            name: name.to_string(),
            importer: Arc::downgrade(importer),
            attr_map: attr_map.iter().map(|s| s.as_ref().to_string()).collect(),
            plan,
            slots,
            eager,
            public,
        });

        let replaced = importer.register_namespace(Arc::clone(&ns));
        log::debug!(
            "{} namespace {name} with {} lazy and {} eager attributes",
            if replaced.is_some() { "Reinstalled" } else { "Installed" },
            ns.slots.len(),
            ns.eager.len()
        );
        Ok(ns)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The importer this namespace resolves through, unless it was dropped
    pub fn importer(&self) -> Option<Arc<Importer>> {
        self.importer.upgrade()
    }

    /// Read an attribute, resolving it on first access
    pub fn get(&self, attr: &str) -> Result<Value> {
        if let Some(value) = self.eager.get(attr) {
            return Ok(value.clone());
        }
        let slot = self.slots.get(attr).ok_or_else(|| CherryError::UnknownName {
            namespace: self.name.clone(),
            attr: attr.to_string(),
        })?;
        slot.cell
            .get_or_try_init(|| self.resolve(&slot.mapping))
            .cloned()
    }

    fn resolve(&self, mapping: &AttrMapping) -> Result<Value> {
        log::debug!(
            "Resolving {}.{} from {:?}",
            self.name,
            mapping.attr_name,
            mapping.item
        );
        let importer = self.importer().ok_or_else(|| {
            CherryError::load(mapping.module(), "the importer of this namespace was dropped")
        })?;
        let module = importer.import_module(mapping.module())?;
        match mapping.member() {
            None => Ok(Value::Module(module)),
            Some(member) => module.get_attr(member).ok_or_else(|| {
                CherryError::MissingMember {
                    module: module.name().to_string(),
                    attr: member.to_string(),
                }
            }),
        }
    }

    /// Force every lazy name, stopping at the first failure
    pub fn resolve_all(&self) -> Result<()> {
        for attr in self.plan.identifiers() {
            self.get(attr)?;
        }
        Ok(())
    }

    /// Whether `attr` is bound without further resolution.
    /// Eager attributes always are.
    pub fn is_resolved(&self, attr: &str) -> bool {
        self.eager.contains_key(attr)
            || self
                .slots
                .get(attr)
                .is_some_and(|slot| slot.cell.get().is_some())
    }

    /// Lazy names resolved so far, in declaration order
    pub fn resolved_names(&self) -> Vec<&str> {
        self.plan
            .identifiers()
            .filter(|attr| self.is_resolved(attr))
            .collect()
    }

    /// Sorted public names: lazy names plus eager names not starting with `_`
    pub fn names(&self) -> &[String] {
        &self.public
    }

    /// Every name the namespace answers to, sorted
    pub fn dir(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .plan
            .identifiers()
            .map(str::to_string)
            .chain(self.eager.keys().cloned())
            .collect();
        names.sort();
        names
    }

    pub fn contains(&self, attr: &str) -> bool {
        self.eager.contains_key(attr) || self.slots.contains_key(attr)
    }

    /// The attribute map as declared
    pub fn attr_map(&self) -> &[String] {
        &self.attr_map
    }

    pub fn mapping(&self, attr: &str) -> Option<&AttrMapping> {
        self.plan.get(attr)
    }

    pub fn mappings(&self) -> &[AttrMapping] {
        self.plan.mappings()
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("names", &self.public)
            .field("resolved", &self.resolved_names())
            .finish()
    }
}

/// Install the cherry-picking namespace described by `declaration`
pub fn cherry_pick(importer: &Arc<Importer>, declaration: &Declaration) -> Result<Arc<Namespace>> {
    Namespace::install(importer, declaration)
}
