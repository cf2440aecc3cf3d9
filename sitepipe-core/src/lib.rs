//! sitepipe core - a build pipeline for static front-end projects.
//!
//! The pipeline compiles SCSS, scripts, and HTML templates from `src`
//! into `temp`, optimizes images and fonts into `dist`, and bundles the
//! stylesheet/script references of each page into single minified files
//! for publishing. A development server serves the compiled output with
//! live reload driven by filesystem watchers.
//!
//! # Layout
//!
//! ```text
//! src/    source assets (styles, scripts, pages, images, fonts)
//! public/ files copied into dist verbatim
//! temp/   intermediate compiled output (develop mode serves this)
//! dist/   final optimized output
//! ```
//!
//! Entry points live in [`pipeline`]: `build`, `compile`, `useref`,
//! `clean`, `develop`, and `serve`.

pub mod bundle;
pub mod config;
pub mod graph;
pub mod pipeline;
pub mod server;
pub mod tasks;
pub mod watch;

pub use config::{ConfigSource, LoadedConfig, PagesConfig};
pub use graph::{PipelineReport, TaskGraph};
pub use tasks::{TaskContext, TaskKind};
