//! Useref command - bundle annotated page references into dist/

use anyhow::Result;
use sitepipe_core::{pipeline, TaskContext};

use super::{load_project, print_report};

/// Run the useref command over existing compiled output in `temp`.
pub async fn run(path: &str, strict: bool) -> Result<()> {
    let project = load_project(path, strict)?;
    project.print_header("Bundling");

    let ctx = TaskContext::new(project.config);
    let report = pipeline::useref(&ctx).await?;
    print_report(&report);
    Ok(())
}
