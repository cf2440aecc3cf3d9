//! Reference bundling for compiled pages.
//!
//! Pages in `temp` carry build annotations marking groups of stylesheet
//! or script references:
//!
//! ```html
//! <!-- build:js assets/scripts/vendor.js -->
//! <script src="/node_modules/jquery/dist/jquery.js"></script>
//! <script src="assets/scripts/main.js"></script>
//! <!-- endbuild -->
//! ```
//!
//! Each block is replaced by a single tag pointing at the bundle target,
//! the referenced files are concatenated and minified into `dist`, and
//! the page itself is minified on the way out. References resolve
//! against `temp` first and the project root second, so freshly compiled
//! assets win over checked-in ones and `/node_modules/...` references
//! still resolve.
//!
//! Bundling is deterministic: the same inputs always produce the same
//! `dist`, so pages that have already been bundled (no annotations left)
//! pass through as plain minified HTML.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use tracing::debug;

use crate::tasks::{select_sources, write_output, TaskContext, TaskOutcome};

mod minify;

static BUILD_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--\s*build:(css|js)\s+(\S+)\s*-->(.*?)<!--\s*endbuild\s*-->").unwrap()
});

static REF_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:href|src)\s*=\s*["']([^"']+)["']"#).unwrap());

/// One asset bundle produced from a build block.
struct Bundle {
    target: PathBuf,
    contents: Vec<u8>,
}

/// Bundle references in every compiled page and publish the results.
pub async fn run(ctx: &TaskContext) -> Result<TaskOutcome> {
    let config = &ctx.config;
    let temp = config.temp_dir();
    let pages = select_sources(&temp, &config.build.paths.pages)?;
    let search = [temp.clone(), config.root.clone()];
    let dist = config.dist_dir();

    let mut files = 0;
    for page in pages {
        let html = tokio::fs::read_to_string(&page.path)
            .await
            .with_context(|| format!("failed to read {}", page.path.display()))?;

        let mut bundles = Vec::new();
        let rewritten = rewrite_page(&html, &search, &mut bundles)
            .with_context(|| format!("failed to bundle {}", page.relative.display()))?;

        for bundle in bundles {
            let dest = dist.join(&bundle.target);
            write_output(&dest, &bundle.contents).await?;
            debug!("Bundled {}", dest.display());
            files += 1;
        }

        let minified = minify::html(rewritten.as_bytes());
        write_output(&dist.join(&page.relative), &minified).await?;
        files += 1;
    }
    Ok(TaskOutcome { files })
}

/// Replace every build block in `html` with its final tag, collecting
/// the bundles to write. Text outside the blocks is left untouched.
fn rewrite_page(html: &str, search: &[PathBuf], bundles: &mut Vec<Bundle>) -> Result<String> {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;

    for caps in BUILD_BLOCK.captures_iter(html) {
        let Some(whole) = caps.get(0) else { continue };
        let kind = &caps[1];
        let target = &caps[2];
        let block = &caps[3];

        let refs = collect_refs(block);
        if refs.is_empty() {
            bail!("build block for '{target}' references no files");
        }

        let mut parts = Vec::with_capacity(refs.len());
        for reference in &refs {
            let path = resolve_ref(reference, search)
                .with_context(|| format!("unresolved reference '{reference}' for '{target}'"))?;
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            parts.push(content);
        }

        let contents = match kind {
            "css" => minify::css(&parts.join("\n")),
            // A statement separator between concatenated scripts keeps
            // files that end without a semicolon from merging.
            _ => minify::js(&parts.join("\n;\n")),
        }
        .with_context(|| format!("failed to minify bundle '{target}'"))?;

        bundles.push(Bundle {
            target: PathBuf::from(target.trim_start_matches('/')),
            contents,
        });

        out.push_str(&html[last..whole.start()]);
        out.push_str(&replacement_tag(kind, target));
        last = whole.end();
    }

    out.push_str(&html[last..]);
    Ok(out)
}

fn collect_refs(block: &str) -> Vec<String> {
    REF_ATTR
        .captures_iter(block)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

fn resolve_ref(reference: &str, search: &[PathBuf]) -> Result<PathBuf> {
    if reference.contains("://") {
        bail!("remote references cannot be bundled");
    }
    let relative = reference.trim_start_matches('/');
    for base in search {
        let candidate = base.join(relative);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    bail!("not found under the search path");
}

fn replacement_tag(kind: &str, target: &str) -> String {
    match kind {
        "css" => format!(r#"<link rel="stylesheet" href="{target}">"#),
        _ => format!(r#"<script src="{target}"></script>"#),
    }
}
