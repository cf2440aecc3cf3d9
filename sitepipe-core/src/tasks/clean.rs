//! Remove generated output directories.

use anyhow::{Context, Result};
use std::io::ErrorKind;
use tracing::debug;

use super::{TaskContext, TaskOutcome};

/// Delete `dist` and `temp`. Directories that are already gone are
/// skipped, so running clean twice in a row succeeds.
pub async fn run(ctx: &TaskContext) -> Result<TaskOutcome> {
    let mut removed = 0;
    for dir in [ctx.config.dist_dir(), ctx.config.temp_dir()] {
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!("Removed {}", dir.display());
                removed += 1;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("failed to remove {}", dir.display()));
            }
        }
    }
    Ok(TaskOutcome { files: removed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PagesConfig;
    use std::sync::Arc;

    fn context(root: &std::path::Path) -> TaskContext {
        TaskContext::new(Arc::new(PagesConfig::with_root(root)))
    }

    #[tokio::test]
    async fn test_removes_dist_and_temp_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("dist/assets")).unwrap();
        std::fs::write(dir.path().join("dist/assets/site.css"), "x").unwrap();
        std::fs::create_dir_all(dir.path().join("temp")).unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/index.html"), "keep").unwrap();

        let outcome = run(&context(dir.path())).await.unwrap();

        assert_eq!(outcome.files, 2);
        assert!(!dir.path().join("dist").exists());
        assert!(!dir.path().join("temp").exists());
        assert!(dir.path().join("src/index.html").exists());
    }

    #[tokio::test]
    async fn test_clean_twice_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("dist")).unwrap();

        let ctx = context(dir.path());
        run(&ctx).await.unwrap();
        let second = run(&ctx).await.unwrap();

        assert_eq!(second.files, 0);
    }
}
