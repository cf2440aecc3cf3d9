//! Develop command - compile, watch, and serve with live reload

use anyhow::Result;
use sitepipe_core::pipeline;

use super::load_project;

/// Run the develop command. Blocks until the process is stopped.
pub async fn run(path: &str, port: Option<u16>, strict: bool) -> Result<()> {
    let project = load_project(path, strict)?;
    let port = port.unwrap_or(project.config.serve.port);
    project.print_header("Watching");

    pipeline::develop(project.config, port).await
}
