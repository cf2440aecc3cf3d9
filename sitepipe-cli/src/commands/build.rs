//! Build command - run the full production pipeline into dist/

use anyhow::Result;
use sitepipe_core::{pipeline, TaskContext};

use super::{load_project, print_report};

/// Run the build command.
///
/// Cleans previous output, compiles styles, scripts, and pages, optimizes
/// images and fonts, copies public files, and bundles page references.
pub async fn run(path: &str, strict: bool) -> Result<()> {
    let project = load_project(path, strict)?;
    project.print_header("Building");

    let ctx = TaskContext::new(project.config);
    let report = pipeline::build(&ctx).await?;
    print_report(&report);
    Ok(())
}
