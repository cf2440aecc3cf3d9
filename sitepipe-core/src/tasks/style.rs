//! Compile SCSS stylesheets into expanded CSS under `temp`.

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tracing::debug;

use super::{event_path, select_sources, write_output, TaskContext, TaskOutcome};

/// Compile every stylesheet matched by `build.paths.styles` into `temp`,
/// keeping the relative path and swapping the extension to `.css`.
///
/// Output uses the expanded style; compression happens later when pages
/// are bundled. Partials (files starting with `_`) are pulled in through
/// `@use`/`@import` and never emitted on their own.
pub async fn run(ctx: &TaskContext) -> Result<TaskOutcome> {
    let config = &ctx.config;
    let sources = select_sources(&config.src_dir(), &config.build.paths.styles)?;

    let temp = config.temp_dir();
    let mut written = Vec::new();

    for file in sources {
        if is_partial(&file.path) {
            continue;
        }
        let css = compile(&file.path)?;

        let relative = file.relative.with_extension("css");
        let dest = temp.join(&relative);
        write_output(&dest, css.as_bytes()).await?;
        debug!("Compiled {} -> {}", file.path.display(), dest.display());
        written.push(event_path(&relative));
    }

    let outcome = TaskOutcome {
        files: written.len(),
    };
    ctx.notify_changed(written);
    Ok(outcome)
}

/// Compile one stylesheet to expanded CSS.
///
/// `grass::Options` holds `!Sync` trait objects and must not live across
/// an await point, or the task future stops being `Send` and can no
/// longer be spawned by the dev server.
fn compile(path: &Path) -> Result<String> {
    let options = grass::Options::default().style(grass::OutputStyle::Expanded);
    grass::from_path(path, &options)
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("failed to compile {}", path.display()))
}

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('_'))
        .unwrap_or(false)
}
