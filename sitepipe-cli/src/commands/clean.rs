//! Clean command - remove generated output

use anyhow::Result;
use sitepipe_core::{pipeline, TaskContext};

use super::{load_project, print_report};

/// Run the clean command. Removing already-absent directories succeeds.
pub async fn run(path: &str) -> Result<()> {
    let project = load_project(path, false)?;
    project.print_header("Cleaning");

    let ctx = TaskContext::new(project.config);
    let report = pipeline::clean(&ctx).await?;
    print_report(&report);
    Ok(())
}
