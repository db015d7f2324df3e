//! Kestrel CLI: run configurable source checks from the command line.
//!
//! Provides `kestrel check` for scanning files with a cached rule engine,
//! `kestrel checks` for listing the available checks, and `kestrel config`
//! for managing the configuration locations stored in a settings file.

#![warn(missing_docs)]

mod check;
mod checks;
mod config;
mod setup;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Kestrel: configuration-driven source checks.
#[derive(Parser, Debug)]
#[command(name = "kestrel", version, about = "Kestrel source checker")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a settings file holding stored configuration locations.
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check source files.
    Check(CheckArgs),
    /// List the available checks.
    Checks,
    /// Manage stored configuration locations.
    Config {
        /// The action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments for the `kestrel check` subcommand.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Files to check.
    pub files: Vec<PathBuf>,

    /// Configuration document on local disk.
    #[arg(long, group = "configuration")]
    pub config_file: Option<String>,

    /// Configuration document behind an HTTP URL.
    #[arg(long, group = "configuration")]
    pub config_url: Option<String>,

    /// Built-in configuration (`default_checks.xml` or `strict_checks.xml`).
    #[arg(long, group = "configuration")]
    pub config_builtin: Option<String>,

    /// Override property for `${name}` placeholders (`name=value`).
    #[arg(short = 'p', long = "property", value_parser = setup::parse_property)]
    pub properties: Vec<(String, String)>,

    /// Project directory (expands `$PROJECT_DIR$`, anchors relative paths).
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    /// Module content root searched for relative suppression files.
    #[arg(long = "module-root")]
    pub module_roots: Vec<PathBuf>,

    /// Output format for diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Line separator written to staged files (`lf`, `crlf`, `cr`, `system`).
    #[arg(long)]
    pub line_separator: Option<String>,
}

/// Actions of the `kestrel config` subcommand.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// List stored locations; the active one is marked with `*`.
    List,
    /// Store a new location.
    Add {
        /// Location: resource name, file path, or URL.
        location: String,

        /// Kind of location (`classpath`, `local_file`, `http_url`).
        #[arg(long = "type", default_value = "local_file")]
        kind: String,

        /// Display name.
        #[arg(short, long, default_value = "")]
        description: String,

        /// Override property (`name=value`).
        #[arg(short = 'p', long = "property", value_parser = setup::parse_property)]
        properties: Vec<(String, String)>,
    },
    /// Make a stored location active, by index or location.
    Activate {
        /// Index from `kestrel config list`, or the location itself.
        location: String,
    },
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional settings file path.
    pub settings: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let color = match cli.color {
        ColorChoice::Auto => {
            std::env::var_os("NO_COLOR").is_none() && std::env::var("TERM").is_ok()
        }
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        settings: cli.settings,
    };

    let result = match cli.command {
        Command::Check(ref args) => check::run(args, &global),
        Command::Checks => checks::run(&global),
        Command::Config { ref action } => config::run(action, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr log subscriber.
///
/// `KESTREL_LOG` overrides the level picked from `--verbose` and `--quiet`.
fn init_logging(verbose: bool, quiet: bool) {
    let fallback = if verbose {
        "kestrel=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_env("KESTREL_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}
