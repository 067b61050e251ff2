//! ormhelper CLI.
//!
//! Generates database helper classes from decorated TypeScript tables.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use miette::{miette, IntoDiagnostic};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use tracing::debug;

use ormhelper_compiler::config::CONFIG_FILE_NAME;
use ormhelper_compiler::{Compiler, CompilerConfig, CompilerError};

mod ui;

#[derive(Parser)]
#[command(name = "ormhelper", version)]
#[command(about = "ormhelper - generates database helper classes from decorated TypeScript tables")]
struct Cli {
    /// Configuration file (defaults to ./ormhelper.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where sources are read from.
#[derive(Args, Clone, Default)]
struct SourceArgs {
    /// Directory containing the decorated sources
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Source language
    #[arg(short, long)]
    language: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate helper classes for every valid helper declaration
    Generate {
        #[command(flatten)]
        source: SourceArgs,

        /// Output directory for generated modules
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also print generated sources to stdout
        #[arg(long)]
        print: bool,
    },

    /// Check declarations without generating code
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show the upgrade dispatch of each helper
    Plan {
        #[command(flatten)]
        source: SourceArgs,

        /// Only show this helper (database name or class name)
        #[arg(long)]
        helper: Option<String>,

        /// Replay the dispatch starting from this installed version
        #[arg(long = "from")]
        from: Option<u32>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Watch for changes and regenerate
    Watch {
        #[command(flatten)]
        source: SourceArgs,

        /// Output directory for generated modules
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    match cli.command {
        Commands::Generate { source, output, print } => {
            let mut config = load_config(cli.config.as_deref(), &source, output)?;
            config.echo = print;
            generate(config)?;
        }

        Commands::Check { source } => {
            let config = load_config(cli.config.as_deref(), &source, None)?;
            check(config)?;
        }

        Commands::Plan {
            source,
            helper,
            from,
            json,
        } => {
            let config = load_config(cli.config.as_deref(), &source, None)?;
            plan(config, helper.as_deref(), from, json)?;
        }

        Commands::Watch { source, output } => {
            let config = load_config(cli.config.as_deref(), &source, output)?;
            run_watch_mode(config)?;
        }
    }

    Ok(())
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("ormhelper=debug")
        } else {
            EnvFilter::new("ormhelper=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Defaults, then the config file, then command-line flags.
fn load_config(
    explicit: Option<&Path>,
    source: &SourceArgs,
    output: Option<PathBuf>,
) -> miette::Result<CompilerConfig> {
    let path = match explicit {
        Some(path) if !path.exists() => {
            return Err(miette!("Config file not found: {}", path.display()));
        }
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(CONFIG_FILE_NAME),
    };

    let mut config = CompilerConfig::load(&path)?;
    debug!(path = %path.display(), "loaded configuration");

    if let Some(dir) = &source.source {
        config.source_dir = dir.clone();
    }
    if let Some(language) = &source.language {
        config.language = language.clone();
    }
    if let Some(dir) = output {
        config.out_dir = dir;
    }
    Ok(config)
}

fn generate(config: CompilerConfig) -> miette::Result<()> {
    let echo = config.echo;
    // The spinner would interleave with echoed sources.
    let spinner = (!echo).then(|| ui::spinner("Generating helpers..."));
    let start = Instant::now();

    let result = Compiler::new(config).generate();
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    match result {
        Ok(result) => {
            if echo {
                return Ok(());
            }
            ui::box_header("GENERATED");
            ui::box_line("");
            ui::box_line(&format!(
                "{} helper(s) {} {} table(s)",
                result.helpers,
                ui::symbols::DOT,
                result.tables
            ));
            ui::box_line("");
            ui::box_footer();
            for path in &result.written {
                ui::generated_line(path);
            }
            if result.write_failures > 0 {
                ui::error(&format!("{} file(s) could not be written", result.write_failures));
            }
            println!();
            ui::timing("Done", start.elapsed().as_millis());
            Ok(())
        }
        Err(e) => {
            ui::failed_header();
            Err(e.into())
        }
    }
}

fn check(config: CompilerConfig) -> miette::Result<()> {
    let spinner = ui::spinner("Checking declarations...");
    let result = Compiler::new(config).check();
    spinner.finish_and_clear();

    match result {
        Ok(result) => {
            ui::looking_good();
            println!();
            println!(
                "    {} helper(s) {} {} table(s)",
                result.helpers,
                ui::symbols::DOT,
                result.tables
            );
            Ok(())
        }
        Err(e) => {
            ui::failed_header();
            Err(e.into())
        }
    }
}

fn plan(config: CompilerConfig, helper: Option<&str>, from: Option<u32>, json: bool) -> miette::Result<()> {
    let plans = Compiler::new(config).plan(helper, from)?;

    if json {
        let text = serde_json::to_string_pretty(&plans).into_diagnostic()?;
        println!("{}", text);
        return Ok(());
    }

    if plans.is_empty() {
        ui::dim("No helpers declared.");
        return Ok(());
    }
    for plan in &plans {
        ui::plan_box(plan);
        println!();
    }
    Ok(())
}

fn run_watch_mode(config: CompilerConfig) -> miette::Result<()> {
    let source_dir = config.source_dir.clone();
    ui::info(&format!("Watching for changes in {}", source_dir.display()));
    println!();

    let compiler = Compiler::new(config);
    regenerate(&compiler);

    let (tx, rx) = mpsc::channel::<()>();
    let mut debouncer = new_debouncer(Duration::from_millis(500), move |result: DebounceEventResult| {
        if let Ok(events) = result {
            if events.iter().any(|e| is_source_file(&e.path)) {
                let _ = tx.send(());
            }
        }
    })
    .into_diagnostic()?;

    debouncer
        .watcher()
        .watch(&source_dir, RecursiveMode::Recursive)
        .into_diagnostic()?;

    ui::info("Ready! Waiting for changes...");

    // Ends when the watcher is dropped; Ctrl-C terminates the process.
    while rx.recv().is_ok() {
        println!();
        regenerate(&compiler);
        println!();
        ui::info("Ready! Waiting for changes...");
    }

    ui::dim("Stopping watch mode.");
    Ok(())
}

fn regenerate(compiler: &Compiler) {
    let spinner = ui::spinner("Regenerating...");
    let start = Instant::now();

    match compiler.generate() {
        Ok(result) => {
            spinner.finish_and_clear();
            ui::success(&format!(
                "Generated {} helper(s) in {}ms",
                result.helpers,
                start.elapsed().as_millis()
            ));
        }
        Err(e) => {
            spinner.finish_and_clear();
            report(e);
        }
    }
}

/// Prints a failed pass without leaving watch mode.
fn report(error: CompilerError) {
    ui::error(&error.to_string());
    eprintln!("{:?}", miette::Report::new(error));
}

fn is_source_file(path: &Path) -> bool {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    (name.ends_with(".ts") || name.ends_with(".tsx")) && !name.ends_with(".d.ts")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_source_file() {
        assert!(is_source_file(Path::new("src/db/question.ts")));
        assert!(is_source_file(Path::new("src/db/view.tsx")));
        assert!(!is_source_file(Path::new("src/db/types.d.ts")));
        assert!(!is_source_file(Path::new("src/db/notes.md")));
    }

    #[test]
    fn test_flags_override_defaults() {
        let source = SourceArgs {
            source: Some(PathBuf::from("app/models")),
            language: None,
        };
        let config = load_config(None, &source, Some(PathBuf::from("app/generated"))).unwrap();
        assert_eq!(config.source_dir, PathBuf::from("app/models"));
        assert_eq!(config.out_dir, PathBuf::from("app/generated"));
        assert_eq!(config.language, "typescript");
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let result = load_config(Some(Path::new("/nonexistent/ormhelper.toml")), &SourceArgs::default(), None);
        assert!(result.is_err());
    }
}
