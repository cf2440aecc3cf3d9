//! Render page templates into `temp`.
//!
//! Every HTML file under `src` is loaded into one Tera environment so
//! pages can extend layouts and include partials from subdirectories.
//! Only templates matching `build.paths.pages` are rendered and written;
//! the rest exist for inheritance. Values from `[data]` in the project
//! configuration form the render context, and the environment is rebuilt
//! on every run so edits to any template take effect immediately.

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use tera::Tera;
use tracing::debug;

use super::{event_path, select_sources, write_output, TaskContext, TaskOutcome};

pub async fn run(ctx: &TaskContext) -> Result<TaskOutcome> {
    let config = &ctx.config;
    let src = config.src_dir();
    let templates = select_sources(&src, "**/*.html")?;

    // One batch registration: Tera resolves inheritance only once every
    // template is present, and sorted order lists pages before the
    // layouts they extend.
    let mut tera = Tera::default();
    tera.add_template_files(
        templates
            .iter()
            .map(|file| (&file.path, Some(event_path(&file.relative)))),
    )
    .with_context(|| format!("failed to load templates under {}", src.display()))?;

    let context = tera::Context::from_serialize(&config.data)
        .context("failed to build template context from [data]")?;

    let pages = Pattern::new(&config.build.paths.pages).with_context(|| {
        format!("invalid pages pattern '{}'", config.build.paths.pages)
    })?;
    // `*` must not cross directory separators, or `*.html` would select
    // layouts and partials as pages.
    let match_options = MatchOptions {
        require_literal_separator: true,
        ..MatchOptions::default()
    };

    let temp = config.temp_dir();
    let mut written = Vec::new();

    for file in &templates {
        if !pages.matches_path_with(&file.relative, match_options) {
            continue;
        }
        let name = event_path(&file.relative);
        let html = tera
            .render(&name, &context)
            .with_context(|| format!("failed to render {name}"))?;

        let dest = temp.join(&file.relative);
        write_output(&dest, html.as_bytes()).await?;
        debug!("Rendered {}", dest.display());
        written.push(name);
    }

    let outcome = TaskOutcome {
        files: written.len(),
    };
    ctx.notify_changed(written);
    Ok(outcome)
}
