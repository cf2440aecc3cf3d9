//! sitepipe CLI - Command-line interface for the sitepipe asset pipeline
//!
//! Compiles stylesheets, scripts, and templated pages, optimizes static
//! assets, bundles referenced sources, and serves the result with live
//! reload during development.

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::*;

/// Front-end asset pipeline: compile, bundle, optimize, and serve.
#[derive(Parser)]
#[command(name = "sitepipe")]
#[command(author, version)]
#[command(about = "Front-end asset pipeline: compile, bundle, optimize, and serve")]
#[command(propagate_version = true)]
#[command(next_help_heading = "Options")]
#[command(after_help = "Quick Start:
  sitepipe build      Produce a deployable dist/ directory
  sitepipe develop    Compile, watch, and serve with live reload
  sitepipe clean      Remove generated output

Examples:
  sitepipe develop --port 3000   Serve on a different port
  sitepipe build --strict        Fail on config errors instead of using defaults")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full production build into dist/
    #[command(visible_alias = "b")]
    Build {
        /// Project root (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Fail on pages.config.toml errors instead of silently using defaults
        #[arg(long)]
        strict: bool,
    },

    /// Compile, then watch sources and serve with live reload
    #[command(visible_alias = "dev")]
    Develop {
        /// Project root (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Port to listen on (overrides the configured port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Fail on pages.config.toml errors instead of silently using defaults
        #[arg(long)]
        strict: bool,
    },

    /// Serve existing output without recompiling first
    Serve {
        /// Project root (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Port to listen on (overrides the configured port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Fail on pages.config.toml errors instead of silently using defaults
        #[arg(long)]
        strict: bool,
    },

    /// Bundle annotated page references over existing compiled output
    Useref {
        /// Project root (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Fail on pages.config.toml errors instead of silently using defaults
        #[arg(long)]
        strict: bool,
    },

    /// Remove the generated dist/ and temp/ directories
    Clean {
        /// Project root (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn,sitepipe=info,sitepipe_core=info"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // Print help if no command is provided
    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            let _ = Cli::command().print_help();
            println!();
            return Ok(());
        }
    };

    match command {
        Commands::Build { path, strict } => build::run(&path, strict).await,
        Commands::Develop { path, port, strict } => develop::run(&path, port, strict).await,
        Commands::Serve { path, port, strict } => serve::run(&path, port, strict).await,
        Commands::Useref { path, strict } => useref::run(&path, strict).await,
        Commands::Clean { path } => clean::run(&path).await,
    }
}
