//! Serve command - serve existing output without recompiling

use anyhow::Result;
use sitepipe_core::pipeline;

use super::load_project;

/// Run the serve command. Blocks until the process is stopped.
///
/// Serves whatever `temp`, `dist`, and `public` already contain; watchers
/// still rebuild on change, but nothing is compiled up front.
pub async fn run(path: &str, port: Option<u16>, strict: bool) -> Result<()> {
    let project = load_project(path, strict)?;
    let port = port.unwrap_or(project.config.serve.port);
    project.print_header("Serving");

    pipeline::serve(project.config, port).await
}
