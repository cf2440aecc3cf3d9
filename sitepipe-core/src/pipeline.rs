//! Pipeline composition: which tasks run, and in what order.
//!
//! The orderings mirror how outputs feed each other: `clean` runs before
//! anything that writes, the three compile tasks are independent of one
//! another, and bundling needs all compile output present in `temp`.
//! Images, fonts, and public files go straight to `dist` and only wait
//! for `clean`.

use anyhow::Result;
use std::sync::Arc;
use tracing::error;

use crate::config::PagesConfig;
use crate::graph::{PipelineReport, TaskGraph};
use crate::server::{self, ServerState};
use crate::tasks::{run_task, TaskContext, TaskKind};
use crate::watch;

/// Graph for `compile`: styles, scripts, and pages with no ordering
/// among them (they read and write disjoint file sets).
pub fn compile_graph() -> TaskGraph<TaskKind> {
    let mut graph = TaskGraph::new();
    graph.add_task(TaskKind::Style);
    graph.add_task(TaskKind::Script);
    graph.add_task(TaskKind::Page);
    graph
}

/// Graph for `build`: clean first, then everything; bundling waits for
/// the compile tasks.
pub fn build_graph() -> TaskGraph<TaskKind> {
    let mut graph = TaskGraph::new();
    for task in [
        TaskKind::Style,
        TaskKind::Script,
        TaskKind::Page,
        TaskKind::Image,
        TaskKind::Font,
        TaskKind::Extra,
    ] {
        graph.add_dependency(TaskKind::Clean, task);
    }
    for task in [TaskKind::Style, TaskKind::Script, TaskKind::Page] {
        graph.add_dependency(task, TaskKind::Useref);
    }
    graph
}

fn single(task: TaskKind) -> TaskGraph<TaskKind> {
    let mut graph = TaskGraph::new();
    graph.add_task(task);
    graph
}

/// Compile styles, scripts, and pages into `temp`.
pub async fn compile(ctx: &TaskContext) -> Result<PipelineReport> {
    run_graph(&compile_graph(), ctx).await
}

/// Run a full production build into `dist`.
pub async fn build(ctx: &TaskContext) -> Result<PipelineReport> {
    run_graph(&build_graph(), ctx).await
}

/// Run only the reference bundling step over existing `temp` output.
pub async fn useref(ctx: &TaskContext) -> Result<PipelineReport> {
    run_graph(&single(TaskKind::Useref), ctx).await
}

/// Remove generated output.
pub async fn clean(ctx: &TaskContext) -> Result<PipelineReport> {
    run_graph(&single(TaskKind::Clean), ctx).await
}

async fn run_graph(graph: &TaskGraph<TaskKind>, ctx: &TaskContext) -> Result<PipelineReport> {
    graph
        .run(|kind| async move { run_task(kind, ctx).await.map(|_| ()) })
        .await
}

/// Compile once, then serve with watchers (the `develop` workflow).
///
/// Compile failures on the way in abort; once the server is up, rebuild
/// failures only warn.
pub async fn develop(config: Arc<PagesConfig>, port: u16) -> Result<()> {
    let state = ServerState::new(Arc::clone(&config));
    let ctx = TaskContext::with_reload(Arc::clone(&config), state.reload_tx.clone());

    compile(&ctx).await?;
    serve_with(state, ctx, port).await
}

/// Start the dev server over whatever output already exists, without
/// recompiling first (the `serve` workflow).
pub async fn serve(config: Arc<PagesConfig>, port: u16) -> Result<()> {
    let state = ServerState::new(Arc::clone(&config));
    let ctx = TaskContext::with_reload(config, state.reload_tx.clone());
    serve_with(state, ctx, port).await
}

async fn serve_with(state: ServerState, ctx: TaskContext, port: u16) -> Result<()> {
    tokio::spawn(async move {
        if let Err(e) = watch::watch(ctx).await {
            error!("Watcher stopped: {:#}", e);
        }
    });
    server::serve(state, port).await
}
