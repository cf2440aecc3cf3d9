//! Optimize images into `dist`.
//!
//! PNG sources are re-encoded with maximum compression (lossless) and
//! JPEGs are re-encoded at publish quality. The original bytes win
//! whenever re-encoding does not actually shrink the file, so the task
//! never makes an asset bigger. Everything else (SVG, GIF, ICO) is
//! copied unchanged.

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::ImageEncoder;
use std::path::Path;
use tracing::debug;

use super::{select_sources, write_output, TaskContext, TaskOutcome};

const JPEG_QUALITY: u8 = 85;

pub async fn run(ctx: &TaskContext) -> Result<TaskOutcome> {
    optimize_glob(ctx, &ctx.config.build.paths.images).await
}

/// Shared by the image and font tasks: fonts ride the same
/// optimize-or-copy path with a different glob.
pub(crate) async fn optimize_glob(ctx: &TaskContext, pattern: &str) -> Result<TaskOutcome> {
    let config = &ctx.config;
    let sources = select_sources(&config.src_dir(), pattern)?;
    let dist = config.dist_dir();

    let mut files = 0;
    for file in sources {
        let original = tokio::fs::read(&file.path)
            .await
            .with_context(|| format!("failed to read {}", file.path.display()))?;

        let optimized = optimize(&file.path, &original)
            .with_context(|| format!("failed to optimize {}", file.path.display()))?;

        let bytes = if optimized.len() < original.len() {
            debug!(
                "Optimized {} ({} -> {} bytes)",
                file.relative.display(),
                original.len(),
                optimized.len()
            );
            optimized
        } else {
            original
        };

        write_output(&dist.join(&file.relative), &bytes).await?;
        files += 1;
    }
    Ok(TaskOutcome { files })
}

fn optimize(path: &Path, bytes: &[u8]) -> Result<Vec<u8>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => reencode_png(bytes),
        Some("jpg") | Some("jpeg") => reencode_jpeg(bytes),
        _ => Ok(bytes.to_vec()),
    }
}

fn reencode_png(bytes: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes)?;
    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
    encoder.write_image(img.as_bytes(), img.width(), img.height(), img.color())?;
    Ok(out)
}

fn reencode_jpeg(bytes: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes)?;
    // JPEG has no alpha channel.
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder.encode_image(&rgb)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PagesConfig;
    use std::sync::Arc;

    fn context(root: &Path) -> TaskContext {
        TaskContext::new(Arc::new(PagesConfig::with_root(root)))
    }

    fn images_dir(root: &Path) -> std::path::PathBuf {
        let dir = root.join("src/assets/images");
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_png_is_reencoded_and_still_decodable() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::RgbaImage::from_pixel(32, 32, image::Rgba([120, 40, 200, 255]));
        img.save(images_dir(dir.path()).join("dot.png")).unwrap();
        let original_len = std::fs::metadata(dir.path().join("src/assets/images/dot.png"))
            .unwrap()
            .len();

        let outcome = run(&context(dir.path())).await.unwrap();
        assert_eq!(outcome.files, 1);

        let out = dir.path().join("dist/assets/images/dot.png");
        let written = std::fs::metadata(&out).unwrap().len();
        assert!(written <= original_len);
        image::open(&out).unwrap();
    }

    #[tokio::test]
    async fn test_unknown_formats_copy_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let svg = "<svg xmlns=\"http://www.w3.org/2000/svg\"/>";
        std::fs::write(images_dir(dir.path()).join("logo.svg"), svg).unwrap();

        run(&context(dir.path())).await.unwrap();

        let out = std::fs::read_to_string(dir.path().join("dist/assets/images/logo.svg")).unwrap();
        assert_eq!(out, svg);
    }

    #[tokio::test]
    async fn test_corrupt_image_fails_the_task() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(images_dir(dir.path()).join("broken.png"), b"not a png").unwrap();

        let err = run(&context(dir.path())).await.unwrap_err();
        assert!(format!("{err:#}").contains("failed to optimize"));
    }
}
