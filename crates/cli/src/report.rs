use anyhow::Error;
use cherry_namespace::{CherryError, LazyModule, Namespace};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
pub struct CheckReport<'a> {
    pub name: &'a str,
    pub names: &'a [String],
    pub mappings: Vec<MappingReport<'a>>,
}

#[derive(Serialize)]
pub struct MappingReport<'a> {
    pub attr: &'a str,
    pub module: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<&'a str>,
    pub item: &'a str,
}

pub fn check_report(ns: &Namespace) -> CheckReport<'_> {
    CheckReport {
        name: ns.name(),
        names: ns.names(),
        mappings: ns
            .mappings()
            .iter()
            .map(|mapping| MappingReport {
                attr: &mapping.attr_name,
                module: mapping.module(),
                member: mapping.member(),
                item: &mapping.item,
            })
            .collect(),
    }
}

/// Resolve `names` (every public name when empty) and render their values
pub fn resolve_report(
    ns: &Namespace,
    names: &[String],
) -> cherry_namespace::Result<BTreeMap<String, serde_json::Value>> {
    let names = if names.is_empty() { ns.names() } else { names };
    names
        .iter()
        .map(|name| -> cherry_namespace::Result<_> {
            Ok((name.clone(), ns.get(name)?.to_json()))
        })
        .collect()
}

#[derive(Serialize)]
pub struct InspectReport {
    pub module: String,
    pub origin: Option<String>,
    pub attributes: Vec<String>,
}

pub fn inspect_report(lazy: &LazyModule) -> cherry_namespace::Result<InspectReport> {
    let module = lazy.module()?;
    Ok(InspectReport {
        module: module.name().to_string(),
        origin: module.origin().map(|path| path.display().to_string()),
        attributes: module.dir(),
    })
}

#[derive(Serialize)]
pub struct ErrorReport {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    pub message: String,
}

impl ErrorReport {
    pub fn from_error(err: &Error) -> Self {
        Self {
            status: "error",
            kind: err.downcast_ref::<CherryError>().map(CherryError::kind),
            message: format!("{err:#}"),
        }
    }
}
