//! Transpile scripts into `temp`.
//!
//! Transpilation runs through an external command configured as
//! `[scripts].transpiler`, which receives the source on stdin and must
//! print the result on stdout. Without a configured transpiler, scripts
//! are copied through unchanged so projects targeting modern browsers
//! work with zero setup.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{event_path, select_sources, write_output, TaskContext, TaskOutcome};

pub async fn run(ctx: &TaskContext) -> Result<TaskOutcome> {
    let config = &ctx.config;
    let sources = select_sources(&config.src_dir(), &config.build.paths.scripts)?;

    let transpiler = resolve_transpiler(config.scripts.transpiler.as_deref())?;
    let temp = config.temp_dir();
    let mut written = Vec::new();

    for file in sources {
        let source = tokio::fs::read(&file.path)
            .await
            .with_context(|| format!("failed to read {}", file.path.display()))?;

        let output = match &transpiler {
            Some((bin, args)) => transpile(bin, args, &source)
                .await
                .with_context(|| format!("failed to transpile {}", file.path.display()))?,
            None => source,
        };

        let dest = temp.join(&file.relative);
        write_output(&dest, &output).await?;
        debug!("Wrote {}", dest.display());
        written.push(event_path(&file.relative));
    }

    let outcome = TaskOutcome {
        files: written.len(),
    };
    ctx.notify_changed(written);
    Ok(outcome)
}

/// Look up the configured transpiler binary once per task run.
fn resolve_transpiler(command: Option<&[String]>) -> Result<Option<(PathBuf, Vec<String>)>> {
    let Some(argv) = command else {
        return Ok(None);
    };
    let Some((name, args)) = argv.split_first() else {
        bail!("scripts.transpiler must name a command");
    };
    let bin = which::which(name)
        .with_context(|| format!("transpiler '{name}' not found in PATH"))?;
    Ok(Some((bin, args.to_vec())))
}

async fn transpile(bin: &Path, args: &[String], source: &[u8]) -> Result<Vec<u8>> {
    let mut child = Command::new(bin)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to start {}", bin.display()))?;

    // Feed stdin from a separate task so a child that emits output while
    // we are still writing cannot deadlock on full pipes.
    let mut stdin = child.stdin.take().context("transpiler stdin unavailable")?;
    let payload = source.to_vec();
    let writer = tokio::spawn(async move {
        let _ = stdin.write_all(&payload).await;
    });

    let output = child
        .wait_with_output()
        .await
        .context("transpiler did not exit cleanly")?;
    let _ = writer.await;

    if !output.status.success() {
        bail!(
            "transpiler exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PagesConfig;
    use std::sync::Arc;

    fn context_with(root: &Path, transpiler: Option<Vec<&str>>) -> TaskContext {
        let mut config = PagesConfig::with_root(root);
        config.scripts.transpiler =
            transpiler.map(|argv| argv.into_iter().map(String::from).collect());
        TaskContext::new(Arc::new(config))
    }

    fn write_script(root: &Path, name: &str, content: &str) {
        let dir = root.join("src/assets/scripts");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[tokio::test]
    async fn test_passthrough_without_transpiler() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "main.js", "const answer = 42;\n");

        let outcome = run(&context_with(dir.path(), None)).await.unwrap();
        assert_eq!(outcome.files, 1);

        let out = std::fs::read_to_string(dir.path().join("temp/assets/scripts/main.js")).unwrap();
        assert_eq!(out, "const answer = 42;\n");
    }

    #[tokio::test]
    async fn test_external_transpiler_filters_source() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "shout.js", "var x = 1;\n");

        // tr stands in for a real transpiler: stdin through to stdout.
        let ctx = context_with(dir.path(), Some(vec!["tr", "a-z", "A-Z"]));
        run(&ctx).await.unwrap();

        let out = std::fs::read_to_string(dir.path().join("temp/assets/scripts/shout.js")).unwrap();
        assert_eq!(out, "VAR X = 1;\n");
    }

    #[tokio::test]
    async fn test_missing_transpiler_binary_errors() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "main.js", "1;\n");

        let ctx = context_with(dir.path(), Some(vec!["sitepipe-test-no-such-binary"]));
        let err = run(&ctx).await.unwrap_err();
        assert!(format!("{err:#}").contains("not found in PATH"));
    }

    #[tokio::test]
    async fn test_failing_transpiler_errors() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "main.js", "1;\n");

        let ctx = context_with(dir.path(), Some(vec!["false"]));
        let err = run(&ctx).await.unwrap_err();
        assert!(format!("{err:#}").contains("transpiler exited"));
    }
}
