use anyhow::Context as _;
use blueprint_cache::PerformanceCache;
use blueprint_compiler::{
    BlueprintConfig, CompilationResult, HandlerStubGenerator, PipelineOrchestrator, ProgressEvent,
};
use blueprint_registry::{ComponentRegistry, StaticRegistry};
use blueprint_spec::Diagnostic;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn spec_command(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(
            Arg::new("spec")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Application spec (.json, .yaml or .yml)"),
        )
        .arg(
            Arg::new("out")
                .long("out")
                .short('o')
                .value_parser(value_parser!(PathBuf))
                .help("Output directory [default: ./output]"),
        )
        .arg(
            Arg::new("templates")
                .long("templates")
                .short('t')
                .value_parser(value_parser!(PathBuf))
                .help("Template directory [default: ./templates]"),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .action(ArgAction::SetTrue)
                .help("Treat unknown types, dangling references and prop errors as fatal"),
        )
        .arg(
            Arg::new("no-validate-props")
                .long("no-validate-props")
                .action(ArgAction::SetTrue)
                .help("Skip prop validation against the registry"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the result as JSON"),
        )
}

fn cli() -> Command {
    Command::new("blueprint")
        .version(blueprint_compiler::VERSION)
        .about("Compile declarative application specs into project trees")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("registry")
                .long("registry")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON component registry replacing the built-in catalogue"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging (overridden by RUST_LOG)"),
        )
        .subcommand(
            spec_command("compile", "Generate a project from a spec")
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Report what would be written without touching the disk"),
                )
                .arg(
                    Arg::new("overwrite")
                        .long("overwrite")
                        .action(ArgAction::SetTrue)
                        .help("Replace existing files"),
                )
                .arg(
                    Arg::new("no-cache")
                        .long("no-cache")
                        .action(ArgAction::SetTrue)
                        .help("Disable the performance cache"),
                )
                .arg(
                    Arg::new("persist-cache")
                        .long("persist-cache")
                        .action(ArgAction::SetTrue)
                        .help("Load and save the cache snapshot"),
                )
                .arg(
                    Arg::new("cache-dir")
                        .long("cache-dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Cache snapshot directory [default: .blueprint-cache]"),
                ),
        )
        .subcommand(spec_command("check", "Parse and validate a spec without generating"))
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn load_config(args: &ArgMatches) -> anyhow::Result<BlueprintConfig> {
    let Some(path) = args.get_one::<PathBuf>("config") else {
        return Ok(BlueprintConfig::default());
    };
    BlueprintConfig::load(path)
        .await
        .with_context(|| format!("loading configuration from {}", path.display()))
}

fn load_registry(path: Option<&Path>) -> anyhow::Result<Arc<dyn ComponentRegistry>> {
    let registry = match path {
        Some(path) => StaticRegistry::from_file(path)
            .with_context(|| format!("loading component registry from {}", path.display()))?,
        None => StaticRegistry::with_defaults(),
    };
    Ok(Arc::new(registry))
}

fn apply_flags(config: &mut BlueprintConfig, args: &ArgMatches, compiling: bool) {
    let options = &mut config.compile;
    if let Some(out) = args.get_one::<PathBuf>("out") {
        options.output_dir.clone_from(out);
    }
    if let Some(templates) = args.get_one::<PathBuf>("templates") {
        options.template_dir.clone_from(templates);
    }
    options.strict |= args.get_flag("strict");
    if args.get_flag("no-validate-props") {
        options.validate_props = false;
    }
    if !compiling {
        return;
    }

    options.dry_run |= args.get_flag("dry-run");
    options.overwrite |= args.get_flag("overwrite");
    if args.get_flag("no-cache") {
        options.use_cache = false;
    }
    if let Some(dir) = args.get_one::<PathBuf>("cache-dir") {
        config.cache.cache_dir.clone_from(dir);
    }
    config.cache.persist |= args.get_flag("persist-cache");
}

fn print_event(event: &ProgressEvent) {
    eprintln!("[{:>3}%] {:<9} {}", event.progress, event.phase.as_str(), event.message);
}

fn print_diagnostic(label: &str, diagnostic: &Diagnostic) {
    match diagnostic.path() {
        Some(path) => println!("{label} [{}] {path}: {}", diagnostic.kind, diagnostic.message),
        None => println!("{label} [{}] {}", diagnostic.kind, diagnostic.message),
    }
    if !diagnostic.suggestions.is_empty() {
        println!("    did you mean: {}", diagnostic.suggestions.join(", "));
    }
}

fn print_result(result: &CompilationResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    for error in &result.errors {
        print_diagnostic("error", error);
    }
    for warning in &result.warnings {
        print_diagnostic("warning", warning);
    }
    let status = if result.success { "succeeded" } else { "failed" };
    println!(
        "Compilation {status} at {} in {}ms ({} errors, {} warnings)",
        result.phase,
        result.time_taken.as_millis(),
        result.errors.len(),
        result.warnings.len(),
    );
    if let Some(path) = &result.output_path {
        println!("Output: {}", path.display());
    }
    Ok(())
}

async fn run(matches: ArgMatches) -> anyhow::Result<bool> {
    let Some((command, args)) = matches.subcommand() else {
        return Ok(true);
    };
    let compiling = command == "compile";

    let mut config = load_config(args).await?;
    apply_flags(&mut config, args, compiling);
    let registry_path = args.get_one::<PathBuf>("registry").or(config.registry.as_ref());
    let registry = load_registry(registry_path.map(PathBuf::as_path))?;

    let mut orchestrator = PipelineOrchestrator::new(registry)
        .with_api_generator(Arc::new(HandlerStubGenerator))
        .with_progress_callback(print_event);
    if config.compile.use_cache {
        orchestrator = orchestrator.with_cache(Arc::new(PerformanceCache::new(config.cache.clone())));
    }

    let spec = args
        .get_one::<PathBuf>("spec")
        .context("missing spec argument")?;
    let result = if compiling {
        orchestrator.compile(spec, &config.compile).await?
    } else {
        orchestrator.check(spec, &config.compile).await?
    };

    print_result(&result, args.get_flag("json"))?;
    Ok(result.success)
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    match run(matches).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(2);
        }
    }
}
