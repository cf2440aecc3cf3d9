//! File watcher driving incremental rebuilds in develop mode.
//!
//! Changes under `src` re-run the task for the matching asset category
//! (styles, scripts, pages). Images, fonts, and `public` files only
//! trigger a browser reload: during development they are served from
//! their source locations and get optimized by the next full build.

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info, warn};

use crate::config::PagesConfig;
use crate::tasks::{self, TaskContext, TaskKind};

/// What to do when a changed path matches a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchAction {
    Run(TaskKind),
    Reload,
}

/// A watched base directory, glob patterns relative to it, and the
/// action bound to files matching them.
pub struct WatchBinding {
    base: PathBuf,
    patterns: Vec<Pattern>,
    action: WatchAction,
}

/// Build the watch bindings for a project.
///
/// Bases are canonicalized so they line up with the absolute paths the
/// watcher backend reports. Binding order doubles as match priority.
pub fn bindings(config: &PagesConfig) -> Result<Vec<WatchBinding>> {
    let src = canonical(config.src_dir());
    let public = canonical(config.public_dir());
    let paths = &config.build.paths;

    Ok(vec![
        WatchBinding {
            base: src.clone(),
            patterns: vec![parse(&paths.styles)?],
            action: WatchAction::Run(TaskKind::Style),
        },
        WatchBinding {
            base: src.clone(),
            patterns: vec![parse(&paths.scripts)?],
            action: WatchAction::Run(TaskKind::Script),
        },
        WatchBinding {
            base: src.clone(),
            patterns: vec![parse(&paths.pages)?],
            action: WatchAction::Run(TaskKind::Page),
        },
        WatchBinding {
            base: src,
            patterns: vec![parse(&paths.images)?, parse(&paths.fonts)?],
            action: WatchAction::Reload,
        },
        WatchBinding {
            base: public,
            patterns: vec![parse("**")?],
            action: WatchAction::Reload,
        },
    ])
}

/// Watch the project and react to changes until the task is aborted.
///
/// Change events are coalesced over a short quiet window, then each
/// distinct matched task runs once per batch. A failing task logs a
/// warning and watching continues; broken saves should never kill the
/// dev server.
pub async fn watch(ctx: TaskContext) -> Result<()> {
    let bindings = bindings(&ctx.config)?;
    let (tx, mut rx) = mpsc::channel::<PathBuf>(1024);

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                for path in event.paths {
                    let _ = tx.blocking_send(path);
                }
            }
        },
        Config::default().with_poll_interval(Duration::from_millis(500)),
    )?;

    let mut watching = 0;
    for root in watch_roots(&bindings) {
        if root.is_dir() {
            watcher
                .watch(&root, RecursiveMode::Recursive)
                .with_context(|| format!("failed to watch {}", root.display()))?;
            info!("Watching {} for changes", root.display());
            watching += 1;
        }
    }
    if watching == 0 {
        warn!("Nothing to watch: no source directories exist yet");
        return Ok(());
    }

    let mut pending: HashSet<PathBuf> = HashSet::new();
    let debounce_delay = Duration::from_millis(100);

    loop {
        tokio::select! {
            Some(path) = rx.recv() => {
                debug!("File changed: {}", path.display());
                pending.insert(path);
            }

            _ = time::sleep(debounce_delay), if !pending.is_empty() => {
                let changed: Vec<PathBuf> = pending.drain().collect();
                dispatch(&ctx, &bindings, &changed).await;
            }
        }
    }
}

/// Distinct base directories across all bindings.
fn watch_roots(bindings: &[WatchBinding]) -> Vec<PathBuf> {
    let roots: BTreeSet<PathBuf> = bindings.iter().map(|b| b.base.clone()).collect();
    roots.into_iter().collect()
}

async fn dispatch(ctx: &TaskContext, bindings: &[WatchBinding], changed: &[PathBuf]) {
    let mut to_run: Vec<TaskKind> = Vec::new();
    let mut reload = false;

    for path in changed {
        match classify(bindings, path) {
            Some(WatchAction::Run(kind)) => {
                if !to_run.contains(&kind) {
                    to_run.push(kind);
                }
            }
            Some(WatchAction::Reload) => reload = true,
            None => {}
        }
    }

    for kind in to_run {
        info!("Change detected, running {}", kind);
        if let Err(e) = tasks::run_task(kind, ctx).await {
            warn!("Task {} failed: {:#}", kind, e);
        }
    }

    if reload {
        ctx.notify_reload();
    }
}

/// First matching binding wins.
///
/// `*` stays inside one path component here, just as it does during
/// source selection; `**` still spans directories.
fn classify(bindings: &[WatchBinding], path: &Path) -> Option<WatchAction> {
    let options = MatchOptions {
        require_literal_separator: true,
        ..MatchOptions::default()
    };
    for binding in bindings {
        if let Ok(rel) = path.strip_prefix(&binding.base) {
            if binding
                .patterns
                .iter()
                .any(|p| p.matches_path_with(rel, options))
            {
                return Some(binding.action);
            }
        }
    }
    None
}

fn parse(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern).with_context(|| format!("invalid watch pattern '{pattern}'"))
}

fn canonical(path: PathBuf) -> PathBuf {
    path.canonicalize().unwrap_or(path)
}
