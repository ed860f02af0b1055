//! tagsync CLI
//!
//! Entry point for the `tagsync` command-line tool.

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tagsync::config::{self, EffectiveConfig, Settings};
use tagsync::{JsonFileStore, Reconciler, TagChange};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tagsync")]
#[command(about = "Reconcile resource tags against a tag store", version)]
struct Cli {
    /// Path to repo config file (default: .tagsync.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Reserved tag key pattern; repeat to replace the configured list
    #[arg(long = "reserved-pattern", global = true)]
    reserved_patterns: Vec<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the tag changes between two desired-state files
    Plan {
        /// Previous desired tags (JSON object); omitted means no tags
        #[arg(long)]
        old: Option<PathBuf>,

        /// New desired tags (JSON object)
        #[arg(long)]
        new: PathBuf,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Apply the change between two desired-state files to a resource
    Apply {
        /// Resource identifier (e.g. an ARN)
        #[arg(long, short = 'r')]
        resource: String,

        /// Previous desired tags (JSON object); omitted means no tags
        #[arg(long)]
        old: Option<PathBuf>,

        /// New desired tags (JSON object)
        #[arg(long)]
        new: PathBuf,

        /// Tag store file (default: store.path from config)
        #[arg(long, short = 's')]
        store: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print the user-managed tags currently on a resource
    Refresh {
        /// Resource identifier (e.g. an ARN)
        #[arg(long, short = 'r')]
        resource: String,

        /// Tag store file (default: store.path from config)
        #[arg(long, short = 's')]
        store: Option<PathBuf>,

        /// Write the tags to this file instead of stdout
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Show the effective configuration and where it came from
    Config {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let store_override = match &cli.command {
        Commands::Apply { store, .. } | Commands::Refresh { store, .. } => store.clone(),
        _ => None,
    };
    let effective = load_config(cli.config, &cli.reserved_patterns, store_override);

    match cli.command {
        Commands::Plan { old, new, json } => {
            run_plan(&effective, old.as_deref(), &new, json);
        }
        Commands::Apply {
            resource,
            old,
            new,
            json,
            ..
        } => {
            run_apply(&effective, &resource, old.as_deref(), &new, json);
        }
        Commands::Refresh { resource, out, .. } => {
            run_refresh(&effective, &resource, out.as_deref());
        }
        Commands::Config { json } => {
            run_config(&effective, json);
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "tagsync=debug,tagsync_store=debug" } else { "tagsync=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(
    repo_path: Option<PathBuf>,
    reserved_patterns: &[String],
    store_path: Option<PathBuf>,
) -> EffectiveConfig {
    let repo_path = repo_path.unwrap_or_else(|| PathBuf::from(config::REPO_CONFIG_PATH));
    let host_path = config::host_config_path();

    let mut overrides = serde_json::Map::new();
    if !reserved_patterns.is_empty() {
        overrides.insert(
            "reserved_prefix_patterns".to_string(),
            serde_json::json!(reserved_patterns),
        );
    }
    if let Some(path) = store_path {
        overrides.insert(
            "store".to_string(),
            serde_json::json!({ "path": path.to_string_lossy() }),
        );
    }
    let overrides = (!overrides.is_empty()).then_some(Value::Object(overrides));

    match EffectiveConfig::build(host_path.as_deref(), Some(repo_path.as_path()), overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    }
}

fn load_settings(effective: &EffectiveConfig) -> (Settings, Reconciler) {
    let settings = match effective.settings() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    match settings.filter() {
        Ok(filter) => (settings, Reconciler::new(filter)),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    }
}

fn read_json(path: &Path) -> Result<Value, String> {
    let contents =
        fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_json::from_str(&contents).map_err(|e| format!("{}: {}", path.display(), e))
}

fn load_change(old: Option<&Path>, new: &Path) -> TagChange {
    let old = match old.map(read_json).transpose() {
        Ok(v) => v.unwrap_or(Value::Null),
        Err(e) => {
            eprintln!("Error reading tags: {}", e);
            process::exit(1);
        }
    };
    let new = match read_json(new) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error reading tags: {}", e);
            process::exit(1);
        }
    };

    match TagChange::from_json(old, new) {
        Ok(change) => change,
        Err(e) => {
            eprintln!("Invalid tags: {}", e);
            process::exit(1);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn print_diff_human(diff: &tagsync::TagDiff) {
    if diff.is_empty() {
        println!("No tag changes.");
        return;
    }
    for (key, value) in diff.to_remove.iter() {
        println!("  - {} = {}", key, value);
    }
    for (key, value) in diff.to_create.iter() {
        println!("  + {} = {}", key, value);
    }
}

fn run_plan(effective: &EffectiveConfig, old: Option<&Path>, new: &Path, json_output: bool) {
    let (_, reconciler) = load_settings(effective);
    let change = load_change(old, new);

    let diff = match reconciler.plan(&change) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if json_output {
        print_json(&diff);
    } else {
        print_diff_human(&diff);
    }
}

fn run_apply(
    effective: &EffectiveConfig,
    resource: &str,
    old: Option<&Path>,
    new: &Path,
    json_output: bool,
) {
    let (settings, reconciler) = load_settings(effective);
    let change = load_change(old, new);
    let store = JsonFileStore::new(&settings.store.path);

    let applied = match reconciler.sync(&store, resource, &change) {
        Ok(applied) => applied,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match (applied, json_output) {
        (Some(diff), true) => print_json(&diff),
        (Some(diff), false) => {
            println!("Applied to {}:", resource);
            print_diff_human(&diff);
        }
        (None, true) => print_json(&tagsync::TagDiff::default()),
        (None, false) => println!("Desired tags unchanged; nothing to apply."),
    }
}

fn run_refresh(effective: &EffectiveConfig, resource: &str, out: Option<&Path>) {
    let (settings, reconciler) = load_settings(effective);
    let store = JsonFileStore::new(&settings.store.path);

    let tags = match reconciler.refresh(&store, resource) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match out {
        Some(path) => {
            let written = serde_json::to_string_pretty(&tags)
                .map_err(|e| e.to_string())
                .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));
            if let Err(e) = written {
                eprintln!("Error writing {}: {}", path.display(), e);
                process::exit(1);
            }
        }
        None => print_json(&tags),
    }
}

fn run_config(effective: &EffectiveConfig, json_output: bool) {
    if json_output {
        print_json(effective);
        return;
    }

    let (settings, reconciler) = load_settings(effective);
    println!("Reserved patterns: {}", reconciler.filter().patterns().join(", "));
    println!("Store: {}", settings.store.path.display());
    println!();
    println!("Sources:");
    for source in &effective.sources {
        match (&source.path, &source.digest) {
            (Some(path), Some(digest)) => {
                println!("  {:?}: {} (sha256 {})", source.origin, path, digest)
            }
            _ => println!("  {:?}", source.origin),
        }
    }
}
