use cherry_namespace::{
    cherry_pick, CherryError, Declaration, DottedName, Importer, Module, ModuleFinder, Namespace,
    Value,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

/// Finder whose single module takes a while to build
struct SlowFinder {
    builds: AtomicUsize,
}

impl ModuleFinder for SlowFinder {
    fn label(&self) -> &str {
        "slow"
    }

    fn has_module(&self, name: &DottedName) -> bool {
        name.full_name() == "slow"
    }

    fn find(&self, name: &DottedName) -> cherry_namespace::Result<Option<Module>> {
        if name.full_name() != "slow" {
            return Ok(None);
        }
        self.builds.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        Ok(Some(
            Module::new("slow").with_attr("token", Value::object(String::from("shared"))),
        ))
    }
}

#[test]
fn concurrent_first_access_imports_once() {
    let finder = Arc::new(SlowFinder {
        builds: AtomicUsize::new(0),
    });
    let importer = Arc::new(Importer::with_finders(vec![
        finder.clone() as Arc<dyn ModuleFinder>
    ]));
    let ns = cherry_pick(&importer, &Declaration::new("pkg").with_attr("slow:token")).unwrap();

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let ns = Arc::clone(&ns);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                ns.get("token").unwrap()
            })
        })
        .collect();
    let values: Vec<Value> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(finder.builds.load(Ordering::SeqCst), 1);
    assert_eq!(importer.load_count("slow"), 1);
    for value in &values[1..] {
        assert!(value.ptr_eq(&values[0]));
    }
    assert_eq!(
        values[0].downcast_ref::<String>().map(String::as_str),
        Some("shared")
    );
}

#[test]
fn different_names_resolve_independently() {
    let importer = Arc::new(Importer::new());
    let ns = cherry_pick(
        &importer,
        &Declaration::new("pkg")
            .with_attr("os.path:dirname")
            .with_attr("os.path:basename")
            .with_attr("os:sep"),
    )
    .unwrap();

    let handles: Vec<_> = ["dirname", "basename", "sep"]
        .into_iter()
        .map(|name| {
            let ns = Arc::clone(&ns);
            thread::spawn(move || ns.get(name).map(|_| ()))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    assert_eq!(ns.resolved_names(), vec!["dirname", "basename", "sep"]);
    assert_eq!(importer.load_count("os.path"), 1);
    assert_eq!(importer.load_count("os"), 1);
}

#[test]
fn pathdirname_is_the_builtin_dirname() {
    let importer = Arc::new(Importer::new());
    let ns = cherry_pick(
        &importer,
        &Declaration::new("pkg").with_attr("os.path:dirname,pathdirname"),
    )
    .unwrap();

    let value = ns.get("pathdirname").unwrap();
    let dirname = importer
        .import_module("os.path")
        .unwrap()
        .get_attr("dirname")
        .unwrap();
    assert!(value.ptr_eq(&dirname));
    assert!(matches!(
        ns.get("dirname"),
        Err(CherryError::UnknownName { .. })
    ));
}

#[test]
fn relative_foreign_name_is_rejected() {
    let importer = Arc::new(Importer::new());
    let err = Namespace::new(&importer, "pkg", &[".sub"], std::iter::empty()).unwrap_err();
    assert!(matches!(err, CherryError::Config { .. }));
    assert!(importer.cached_modules().is_empty());
}

#[test]
fn unknown_names_fail_in_any_order() {
    let importer = Arc::new(Importer::new());
    let decl = Declaration::new("pkg").with_attr("os").with_additional("version", 1);

    let before = cherry_pick(&importer, &decl).unwrap();
    assert!(matches!(
        before.get("ghost"),
        Err(CherryError::UnknownName { .. })
    ));
    before.resolve_all().unwrap();
    assert!(matches!(
        before.get("ghost"),
        Err(CherryError::UnknownName { .. })
    ));

    let after = cherry_pick(&importer, &decl).unwrap();
    after.get("version").unwrap();
    assert!(matches!(
        after.get("ghost"),
        Err(CherryError::UnknownName { .. })
    ));
}

#[test]
fn data_modules_from_module_roots() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("app/db")).unwrap();
    fs::write(
        dir.path().join("app/settings.toml"),
        "debug = true\n[limits]\nmax = 5\n",
    )
    .unwrap();
    fs::write(dir.path().join("app/db/mod.json"), r#"{"url": "sqlite://"}"#).unwrap();

    let importer = Arc::new(Importer::with_module_roots([dir.path()]));
    let ns = cherry_pick(
        &importer,
        &Declaration::new("pkg")
            .with_attr("app.settings:limits")
            .with_attr("app.db:url,db_url")
            .with_attr("app.settings"),
    )
    .unwrap();

    assert_eq!(
        ns.get("limits").unwrap().to_json(),
        serde_json::json!({ "max": 5 })
    );
    assert_eq!(ns.get("db_url").unwrap().as_str(), Some("sqlite://"));

    let settings = ns.get("settings").unwrap();
    let settings = settings.as_module().unwrap();
    assert_eq!(
        settings.origin(),
        Some(dir.path().join("app/settings.toml").as_path())
    );
    let app = importer.cached_module("app").unwrap();
    assert!(app.has_attr("settings"));
    assert!(app.has_attr("db"));
}

#[test]
fn failed_import_is_retried_on_next_access() {
    let dir = tempdir().unwrap();
    let importer = Arc::new(Importer::with_module_roots([dir.path()]));
    let ns = cherry_pick(&importer, &Declaration::new("pkg").with_attr("late:value")).unwrap();

    let err = ns.get("value").unwrap_err();
    assert!(matches!(err, CherryError::ModuleNotFound(ref n) if n == "late"));
    assert!(!ns.is_resolved("value"));

    fs::write(dir.path().join("late.json"), r#"{"value": 7}"#).unwrap();
    let value = ns.get("value").unwrap();
    assert_eq!(value.as_data(), Some(&serde_json::json!(7)));
    assert!(ns.is_resolved("value"));
    assert_eq!(importer.load_count("late"), 2);
}

#[test]
fn lazy_import_module_defers_loading() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("conf.toml"), "level = \"info\"\n").unwrap();
    let importer = Arc::new(Importer::with_module_roots([dir.path()]));

    let lazy = cherry_namespace::lazy_import_module(&importer, "conf", None).unwrap();
    assert!(!lazy.is_loaded());
    assert_eq!(importer.load_count("conf"), 0);

    assert_eq!(lazy.get_attr("level").unwrap().as_str(), Some("info"));
    assert!(lazy.is_loaded());
    assert_eq!(importer.load_count("conf"), 1);
}
