//! Copy public files into `dist` verbatim.
//!
//! Everything under `public` (favicons, robots.txt, CNAME files) is
//! mirrored into `dist` without transformation. A missing `public`
//! directory simply means there is nothing to copy.

use anyhow::{Context, Result};
use tracing::debug;
use walkdir::WalkDir;

use super::{TaskContext, TaskOutcome};

pub async fn run(ctx: &TaskContext) -> Result<TaskOutcome> {
    let config = &ctx.config;
    let public = config.public_dir();
    if !public.is_dir() {
        return Ok(TaskOutcome::default());
    }

    let dist = config.dist_dir();
    let mut files = 0;

    for entry in WalkDir::new(&public) {
        let entry = entry.with_context(|| format!("failed to walk {}", public.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(&public)
            .with_context(|| format!("path escapes {}", public.display()))?;

        let dest = dist.join(relative);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        tokio::fs::copy(entry.path(), &dest)
            .await
            .with_context(|| format!("failed to copy {}", entry.path().display()))?;
        debug!("Copied {}", dest.display());
        files += 1;
    }

    Ok(TaskOutcome { files })
}
