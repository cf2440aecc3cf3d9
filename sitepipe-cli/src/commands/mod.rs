//! Command implementations for the sitepipe CLI
//!
//! Each command module provides a `run` function that executes the command
//! logic. Project loading and report printing are shared here.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use sitepipe_core::{ConfigSource, PagesConfig, PipelineReport};

pub mod build;
pub mod clean;
pub mod develop;
pub mod serve;
pub mod useref;

/// A resolved project root with its loaded configuration.
pub(crate) struct Project {
    pub root: PathBuf,
    pub config: Arc<PagesConfig>,
    pub source: ConfigSource,
}

/// Resolve the project root and load its configuration.
///
/// In strict mode a broken `pages.config.toml` aborts the command; in
/// lenient mode it logs a warning and the defaults apply.
pub(crate) fn load_project(path: &str, strict: bool) -> Result<Project> {
    let root = Path::new(path)
        .canonicalize()
        .unwrap_or_else(|_| PathBuf::from(path));
    let loaded = PagesConfig::load(&root, strict)?;
    tracing::debug!("Project root resolved to {:?}", root);
    Ok(Project {
        root,
        config: Arc::new(loaded.config),
        source: loaded.source,
    })
}

impl Project {
    /// Print the command header: the action, the project root, and which
    /// configuration is in effect.
    pub fn print_header(&self, action: &str) {
        println!(
            "{} {}",
            format!("{action}:").green().bold(),
            self.root.display()
        );
        match &self.source {
            ConfigSource::File(path) => {
                println!("  {}: {}", "Config".cyan(), path.display());
            }
            ConfigSource::Defaults => {
                println!("  {}: {}", "Config".cyan(), "built-in defaults".dimmed());
            }
        }
    }
}

/// Print per-task timings and the pipeline total.
pub(crate) fn print_report(report: &PipelineReport) {
    for task in &report.tasks {
        println!(
            "  {:<10} {}",
            task.name,
            format_duration(task.duration).dimmed()
        );
    }
    println!(
        "{} {} task(s) in {}",
        "Done:".green().bold(),
        report.tasks.len(),
        format_duration(report.total)
    );
}

fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms >= 1000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{ms}ms")
    }
}
