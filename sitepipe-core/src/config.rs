//! Project configuration loading from `pages.config.toml`.
//!
//! This module provides configuration management for sitepipe, loading settings
//! from a `pages.config.toml` file in the project root. Configuration is
//! optional - sitepipe will use sensible defaults if no config file exists, and
//! every key can be overridden individually without restating the rest.
//!
//! # Example Configuration
//!
//! ```toml
//! [build]
//! src = "src"
//! dist = "dist"
//! temp = "temp"
//! public = "public"
//!
//! [build.paths]
//! styles = "assets/styles/*.scss"
//! scripts = "assets/scripts/*.js"
//! pages = "*.html"
//! images = "assets/images/**"
//! fonts = "assets/fonts/**"
//!
//! [serve]
//! port = 2080
//!
//! [serve.routes]
//! "/node_modules" = "node_modules"
//!
//! [scripts]
//! transpiler = ["esbuild", "--loader=js", "--target=es2015"]
//!
//! [data]
//! title = "My Site"
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file looked up in the project root.
pub const CONFIG_FILE: &str = "pages.config.toml";

/// Errors raised while loading `pages.config.toml`.
///
/// In lenient mode these are logged and swallowed; in strict mode
/// (`--strict`) they abort the command so CI catches broken configs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Where a loaded configuration came from.
///
/// Callers always learn whether they are running on a project file or on
/// built-in defaults, instead of having to guess from log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// No config file was found (or it was unreadable in lenient mode).
    Defaults,
    /// Configuration was read from the given file.
    File(PathBuf),
}

/// A configuration together with its provenance.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: PagesConfig,
    pub source: ConfigSource,
}

/// Root configuration structure loaded from `pages.config.toml`.
///
/// All sections are optional. Missing keys fall back to their defaults
/// field by field, so a file containing only `[build] dist = "out"` still
/// gets the default `src`, `temp`, and glob patterns.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PagesConfig {
    /// Project root the directories below are resolved against.
    /// Not read from the file; set by [`PagesConfig::load`].
    #[serde(skip)]
    pub root: PathBuf,

    /// Directory layout and source glob patterns.
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings.
    #[serde(default)]
    pub serve: ServeConfig,

    /// Script transpilation settings.
    #[serde(default)]
    pub scripts: ScriptConfig,

    /// Arbitrary values exposed to page templates as the render context.
    #[serde(default)]
    pub data: toml::Table,
}

/// Directory layout and per-asset-type source globs.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Directory containing source assets, relative to the project root.
    #[serde(default = "default_src")]
    pub src: String,

    /// Final output directory for the production build.
    #[serde(default = "default_dist")]
    pub dist: String,

    /// Intermediate directory for compiled (but not yet bundled) assets.
    #[serde(default = "default_temp")]
    pub temp: String,

    /// Directory of files copied verbatim into `dist`.
    #[serde(default = "default_public")]
    pub public: String,

    /// Glob patterns selecting sources inside `src`.
    #[serde(default)]
    pub paths: AssetPaths,
}

/// Glob patterns (relative to `src`) for each asset category.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetPaths {
    #[serde(default = "default_styles")]
    pub styles: String,

    #[serde(default = "default_scripts")]
    pub scripts: String,

    /// Pages are top-level templates; layouts and partials in
    /// subdirectories are compiled through inheritance, not rendered
    /// standalone.
    #[serde(default = "default_pages")]
    pub pages: String,

    #[serde(default = "default_images")]
    pub images: String,

    #[serde(default = "default_fonts")]
    pub fonts: String,
}

/// Development server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServeConfig {
    /// Port the dev server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Extra URL prefixes mapped to directories under the project root.
    ///
    /// The default maps `/node_modules` so pages can reference vendor
    /// assets during development before they are bundled.
    #[serde(default = "default_routes")]
    pub routes: BTreeMap<String, String>,
}

/// Script transpilation settings.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ScriptConfig {
    /// External transpiler invoked per script file, as an argv vector.
    /// The command receives source on stdin and must print the result
    /// on stdout. When unset, scripts are copied through unchanged.
    ///
    /// # Example
    /// ```toml
    /// transpiler = ["esbuild", "--loader=js", "--target=es2015"]
    /// ```
    #[serde(default)]
    pub transpiler: Option<Vec<String>>,
}

fn default_src() -> String {
    "src".to_string()
}

fn default_dist() -> String {
    "dist".to_string()
}

fn default_temp() -> String {
    "temp".to_string()
}

fn default_public() -> String {
    "public".to_string()
}

fn default_styles() -> String {
    "assets/styles/*.scss".to_string()
}

fn default_scripts() -> String {
    "assets/scripts/*.js".to_string()
}

fn default_pages() -> String {
    "*.html".to_string()
}

fn default_images() -> String {
    "assets/images/**".to_string()
}

fn default_fonts() -> String {
    "assets/fonts/**".to_string()
}

fn default_port() -> u16 {
    2080
}

fn default_routes() -> BTreeMap<String, String> {
    let mut routes = BTreeMap::new();
    routes.insert("/node_modules".to_string(), "node_modules".to_string());
    routes
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            src: default_src(),
            dist: default_dist(),
            temp: default_temp(),
            public: default_public(),
            paths: AssetPaths::default(),
        }
    }
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            styles: default_styles(),
            scripts: default_scripts(),
            pages: default_pages(),
            images: default_images(),
            fonts: default_fonts(),
        }
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            routes: default_routes(),
        }
    }
}

impl PagesConfig {
    /// Load configuration from `pages.config.toml` in the given directory.
    ///
    /// A missing file is not an error: defaults are returned with
    /// [`ConfigSource::Defaults`]. An unreadable or malformed file is an
    /// error only when `strict` is set; otherwise it is logged as a warning
    /// and defaults are used so a typo never blocks a local build.
    pub fn load(root: &Path, strict: bool) -> Result<LoadedConfig, ConfigError> {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str::<PagesConfig>(&content) {
                    Ok(mut config) => {
                        config.root = root.to_path_buf();
                        return Ok(LoadedConfig {
                            config,
                            source: ConfigSource::File(config_path),
                        });
                    }
                    Err(e) => {
                        if strict {
                            return Err(ConfigError::Parse {
                                path: config_path,
                                source: e,
                            });
                        }
                        tracing::warn!("Failed to parse {}: {}", CONFIG_FILE, e);
                    }
                },
                Err(e) => {
                    if strict {
                        return Err(ConfigError::Read {
                            path: config_path,
                            source: e,
                        });
                    }
                    tracing::warn!("Failed to read {}: {}", CONFIG_FILE, e);
                }
            }
        }
        Ok(LoadedConfig {
            config: Self::with_root(root),
            source: ConfigSource::Defaults,
        })
    }

    /// Default configuration anchored at the given project root.
    pub fn with_root(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            ..Self::default()
        }
    }

    /// Source directory (`<root>/src` by default).
    pub fn src_dir(&self) -> PathBuf {
        self.root.join(&self.build.src)
    }

    /// Production output directory (`<root>/dist` by default).
    pub fn dist_dir(&self) -> PathBuf {
        self.root.join(&self.build.dist)
    }

    /// Intermediate compile directory (`<root>/temp` by default).
    pub fn temp_dir(&self) -> PathBuf {
        self.root.join(&self.build.temp)
    }

    /// Verbatim-copy directory (`<root>/public` by default).
    pub fn public_dir(&self) -> PathBuf {
        self.root.join(&self.build.public)
    }
}
