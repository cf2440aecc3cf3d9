//! Copy fonts into `dist`.
//!
//! Fonts go through the same optimize-or-copy path as images: binary
//! font formats pass through unchanged, while any raster previews living
//! under the fonts directory still get re-encoded.

use anyhow::Result;

use super::{image, TaskContext, TaskOutcome};

pub async fn run(ctx: &TaskContext) -> Result<TaskOutcome> {
    image::optimize_glob(ctx, &ctx.config.build.paths.fonts).await
}
