//! Build tasks and the context they run in.
//!
//! Each task reads sources selected by a glob from the configuration,
//! transforms them, and writes results under `temp` (compile stage) or
//! `dist` (publish stage). Tasks are independent of each other; ordering
//! is imposed by the pipeline graph, not by the tasks themselves.

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::PagesConfig;
use crate::server::state::ReloadEvent;

pub mod clean;
pub mod extra;
pub mod font;
pub mod image;
pub mod page;
pub mod script;
pub mod style;

/// The tasks a pipeline can schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Clean,
    Style,
    Script,
    Page,
    Image,
    Font,
    Extra,
    Useref,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskKind::Clean => "clean",
            TaskKind::Style => "style",
            TaskKind::Script => "script",
            TaskKind::Page => "page",
            TaskKind::Image => "image",
            TaskKind::Font => "font",
            TaskKind::Extra => "extra",
            TaskKind::Useref => "useref",
        };
        write!(f, "{name}")
    }
}

/// Everything a task needs to run: the immutable project configuration
/// and, in develop mode, a channel for telling live reload clients what
/// changed. Tasks never mutate the configuration.
#[derive(Clone)]
pub struct TaskContext {
    pub config: Arc<PagesConfig>,
    reload: Option<broadcast::Sender<ReloadEvent>>,
}

impl TaskContext {
    pub fn new(config: Arc<PagesConfig>) -> Self {
        Self {
            config,
            reload: None,
        }
    }

    /// Context that forwards change notifications to reload clients.
    pub fn with_reload(config: Arc<PagesConfig>, reload: broadcast::Sender<ReloadEvent>) -> Self {
        Self {
            config,
            reload: Some(reload),
        }
    }

    /// Tell connected clients which compiled outputs changed.
    pub(crate) fn notify_changed(&self, paths: Vec<String>) {
        if paths.is_empty() {
            return;
        }
        if let Some(tx) = &self.reload {
            let _ = tx.send(ReloadEvent::Changed { paths });
        }
    }

    /// Ask connected clients for a full page reload.
    pub(crate) fn notify_reload(&self) {
        if let Some(tx) = &self.reload {
            let _ = tx.send(ReloadEvent::Reload);
        }
    }
}

/// What a task produced.
#[derive(Debug, Default, Clone, Copy)]
pub struct TaskOutcome {
    /// Number of files written (or removed, for clean).
    pub files: usize,
}

/// Run one task against the given context.
pub async fn run_task(kind: TaskKind, ctx: &TaskContext) -> Result<TaskOutcome> {
    let started = Instant::now();
    debug!("Task {} started", kind);

    let outcome = match kind {
        TaskKind::Clean => clean::run(ctx).await,
        TaskKind::Style => style::run(ctx).await,
        TaskKind::Script => script::run(ctx).await,
        TaskKind::Page => page::run(ctx).await,
        TaskKind::Image => image::run(ctx).await,
        TaskKind::Font => font::run(ctx).await,
        TaskKind::Extra => extra::run(ctx).await,
        TaskKind::Useref => crate::bundle::run(ctx).await,
    }?;

    info!(
        "Task {} finished: {} file(s) in {:?}",
        kind,
        outcome.files,
        started.elapsed()
    );
    Ok(outcome)
}

/// A source file matched by a glob, with its path relative to the
/// selection base retained for computing the output location.
#[derive(Debug, Clone)]
pub(crate) struct SourceFile {
    pub path: PathBuf,
    pub relative: PathBuf,
}

/// Select files under `base` matching a glob pattern.
///
/// Only plain files are returned and the result is sorted so task output
/// is deterministic. A pattern ending in `**` selects every file below
/// that point. Unreadable entries are logged and skipped; a pattern
/// matching nothing (or a missing base directory) yields an empty list.
pub(crate) fn select_sources(base: &Path, pattern: &str) -> Result<Vec<SourceFile>> {
    // A trailing `**` component enumerates the directories themselves;
    // the files inside need the extra `/*`.
    let normalized = if pattern == "**" || pattern.ends_with("/**") {
        format!("{pattern}/*")
    } else {
        pattern.to_string()
    };
    let full_pattern = base.join(&normalized);
    let pattern_str = full_pattern.to_string_lossy();

    let mut files = Vec::new();
    let entries = glob::glob(&pattern_str)
        .with_context(|| format!("invalid glob pattern '{pattern}'"))?;
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => {
                let relative = match path.strip_prefix(base) {
                    Ok(rel) => rel.to_path_buf(),
                    Err(_) => continue,
                };
                files.push(SourceFile { path, relative });
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
            }
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Write `bytes` to `dest`, creating parent directories as needed.
pub(crate) async fn write_output(dest: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tokio::fs::write(dest, bytes)
        .await
        .with_context(|| format!("failed to write {}", dest.display()))
}

/// Forward-slash display form of a relative path, for reload events.
pub(crate) fn event_path(relative: &Path) -> String {
    let display = relative.display().to_string();
    if std::path::MAIN_SEPARATOR == '/' {
        display
    } else {
        display.replace(std::path::MAIN_SEPARATOR, "/")
    }
}
