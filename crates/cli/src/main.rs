use anyhow::{Context as AnyhowContext, Result};
use cherry_namespace::{cherry_pick, lazy_import_module, Declaration, Importer};
use clap::{Args, Parser, Subcommand};
use flags::OutputFormat;
use report::ErrorReport;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod flags;
mod report;

#[derive(Parser)]
#[command(name = "cherry")]
#[command(about = "Check and resolve lazy cherry-pick namespaces", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Directory searched for TOML/JSON data modules (repeatable)
    #[arg(long = "module-path", value_name = "DIR", global = true)]
    module_paths: Vec<PathBuf>,

    /// JSON output style
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a declaration and show its attribute map without importing anything
    Check(CheckArgs),

    /// Resolve names of a declared namespace and print their values
    Resolve(ResolveArgs),

    /// Lazily import a module, load it and list its attributes
    Inspect(InspectArgs),
}

#[derive(Args)]
struct CheckArgs {
    /// Declaration file (.toml or .json)
    decl: PathBuf,
}

#[derive(Args)]
struct ResolveArgs {
    /// Declaration file (.toml or .json)
    decl: PathBuf,

    /// Names to resolve (defaults to every public name)
    names: Vec<String>,
}

#[derive(Args)]
struct InspectArgs {
    /// Module name, absolute or relative to --package
    module: String,

    /// Package that anchors relative module names
    #[arg(long)]
    package: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let format = cli.format;
    if let Err(err) = run(cli) {
        log::debug!("Command failed: {err:?}");
        let body = ErrorReport::from_error(&err);
        match print_stdout(format, &body) {
            Ok(()) => {}
            Err(print_err) => eprintln!("Error: {err:#} ({print_err})"),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let importer = Arc::new(build_importer(&cli.module_paths));
    match cli.command {
        Commands::Check(args) => run_check(&importer, args, cli.format),
        Commands::Resolve(args) => run_resolve(&importer, args, cli.format),
        Commands::Inspect(args) => run_inspect(&importer, args, cli.format),
    }
}

fn build_importer(module_paths: &[PathBuf]) -> Importer {
    if module_paths.is_empty() {
        return Importer::new();
    }
    for path in module_paths {
        if !path.is_dir() {
            log::warn!("Module path {} is not a directory", path.display());
        }
    }
    Importer::with_module_roots(module_paths.iter().cloned())
}

fn load_declaration(path: &Path) -> Result<Declaration> {
    Declaration::load(path)
        .with_context(|| format!("Failed to load declaration {}", path.display()))
}

fn run_check(importer: &Arc<Importer>, args: CheckArgs, format: OutputFormat) -> Result<()> {
    let declaration = load_declaration(&args.decl)?;
    let ns = cherry_pick(importer, &declaration)?;
    log::info!(
        "Namespace {} declares {} lazy names",
        ns.name(),
        ns.mappings().len()
    );
    print_stdout(format, &report::check_report(&ns))
}

fn run_resolve(importer: &Arc<Importer>, args: ResolveArgs, format: OutputFormat) -> Result<()> {
    let declaration = load_declaration(&args.decl)?;
    let ns = cherry_pick(importer, &declaration)?;
    let values = report::resolve_report(&ns, &args.names)?;
    log::info!(
        "Resolved {} names; loaded modules: {}",
        values.len(),
        importer.cached_modules().join(", ")
    );
    print_stdout(format, &values)
}

fn run_inspect(importer: &Arc<Importer>, args: InspectArgs, format: OutputFormat) -> Result<()> {
    let lazy = lazy_import_module(importer, &args.module, args.package.as_deref())?;
    let inspected = report::inspect_report(&lazy)
        .with_context(|| format!("Failed to load module {}", lazy.name()))?;
    print_stdout(format, &inspected)
}

fn print_stdout<T: Serialize>(format: OutputFormat, value: &T) -> Result<()> {
    let value = serde_json::to_value(value)?;
    println!("{}", format.render(&value)?);
    Ok(())
}
