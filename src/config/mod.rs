//! Pass configuration for respimg
//!
//! A [`PassConfig`] holds every pass-wide setting: the input and output roots
//! handed through to the attribute generator, default sizing values applied to
//! elements that don't specify their own, format toggles, the source prefix and
//! the skip rules.
//!
//! # Construction
//!
//! In code, start from the two required roots and chain setters:
//!
//! ```rust,no_run
//! use respimg::config::PassConfig;
//!
//! let config = PassConfig::new("static", "static/g")
//!     .with_width(600)
//!     .with_src_prefix("images")
//!     .skip_if(|request| request.resource_path.ends_with(".gif"));
//! ```
//!
//! Or load it from a TOML file:
//!
//! ```toml
//! input-dir = "~/site/static"
//! output-dir = "$SITE_ROOT/static/g"
//! width = 600
//! quality = 80
//! avif = false
//! src-prefix = "images"
//! generate-images = true
//! skip = ["drafts/**", "*.svg"]
//! ```
//!
//! Directory values loaded from a file go through `shellexpand`, so `~` and
//! `$VAR` references are expanded.
//!
//! # Validation
//!
//! Both roots are required. [`PassConfig::validate`] reports a missing or empty
//! root as a [`ConfigError`]; [`ImageTransform::new`](crate::transform::ImageTransform::new)
//! calls it so a bad configuration fails before any tree is processed.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::ConfigError;
use crate::resolver::RequestDescriptor;
use crate::resolver::skip::SkipPredicate;

fn default_true() -> bool {
    true
}

/// Pass-wide settings for an image transform.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PassConfig {
    /// Root the generator reads source images from.
    #[serde(default)]
    pub input_dir: PathBuf,

    /// Root the generator writes variants into.
    #[serde(default)]
    pub output_dir: PathBuf,

    /// Width used for elements without a valid explicit `width`.
    #[serde(default)]
    pub width: Option<u32>,

    /// Quality used for elements without a valid explicit `quality`.
    #[serde(default)]
    pub quality: Option<u32>,

    /// Blur used for elements without a valid explicit `blur`.
    #[serde(default)]
    pub blur: Option<u32>,

    /// Whether WebP variants are requested.
    #[serde(default = "default_true")]
    pub webp: bool,

    /// Whether AVIF variants are requested.
    #[serde(default = "default_true")]
    pub avif: bool,

    /// Prefix prepended to every element `src` before resolution.
    #[serde(default)]
    pub src_prefix: Option<String>,

    /// Generate missing variants. When false only attributes are computed
    /// against files that already exist.
    #[serde(default)]
    pub generate_images: bool,

    /// Upper bound on concurrent generator operations.
    #[serde(default)]
    pub max_parallel: Option<usize>,

    /// Glob patterns over resolved resource paths to leave untouched.
    #[serde(default)]
    pub skip: Vec<String>,

    /// Programmatic skip predicate.
    #[serde(skip)]
    pub skip_predicate: Option<SkipPredicate>,
}

impl PassConfig {
    /// Configuration with the two required roots and every other setting at
    /// its default.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            width: None,
            quality: None,
            blur: None,
            webp: true,
            avif: true,
            src_prefix: None,
            generate_images: false,
            max_parallel: None,
            skip: Vec::new(),
            skip_predicate: None,
        }
    }

    /// Set the default width.
    #[must_use]
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Set the default quality.
    #[must_use]
    pub fn with_quality(mut self, quality: u32) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Set the default blur.
    #[must_use]
    pub fn with_blur(mut self, blur: u32) -> Self {
        self.blur = Some(blur);
        self
    }

    /// Enable or disable WebP variants.
    #[must_use]
    pub fn with_webp(mut self, enabled: bool) -> Self {
        self.webp = enabled;
        self
    }

    /// Enable or disable AVIF variants.
    #[must_use]
    pub fn with_avif(mut self, enabled: bool) -> Self {
        self.avif = enabled;
        self
    }

    /// Set the source prefix.
    #[must_use]
    pub fn with_src_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.src_prefix = Some(prefix.into());
        self
    }

    /// Generate variants instead of only computing attributes.
    #[must_use]
    pub fn with_generate_images(mut self, enabled: bool) -> Self {
        self.generate_images = enabled;
        self
    }

    /// Bound concurrent generator operations.
    #[must_use]
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = Some(max_parallel);
        self
    }

    /// Add a glob skip pattern.
    #[must_use]
    pub fn with_skip_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.skip.push(pattern.into());
        self
    }

    /// Skip every element whose resolved request satisfies `predicate`.
    #[must_use]
    pub fn skip_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RequestDescriptor) -> bool + Send + Sync + 'static,
    {
        self.skip_predicate = Some(SkipPredicate::new(predicate));
        self
    }

    /// Source prefix normalized to end with exactly one `/`.
    ///
    /// An empty prefix counts as no prefix.
    pub fn normalized_src_prefix(&self) -> Option<String> {
        let prefix = self.src_prefix.as_deref().filter(|p| !p.is_empty())?;
        Some(format!("{}/", prefix.trim_end_matches('/')))
    }

    /// Check the required roots.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingInputDir`] or [`ConfigError::MissingOutputDir`]
    /// when a root is absent or empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingInputDir);
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingOutputDir);
        }
        Ok(())
    }

    /// Parse a TOML document, expanding `~` and environment variables in the
    /// directory values and validating the result.
    ///
    /// `origin` is only used for error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML or unknown keys,
    /// [`ConfigError::PathExpansion`] for an undefined variable in a directory
    /// value, and [`ConfigError::MissingInputDir`] /
    /// [`ConfigError::MissingOutputDir`] when a root is missing.
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.input_dir = expand_dir(&config.input_dir)?;
        config.output_dir = expand_dir(&config.output_dir)?;
        config.validate()?;

        tracing::debug!(
            target: "config",
            "Loaded pass config from {} (input={}, output={})",
            origin.display(),
            config.input_dir.display(),
            config.output_dir.display()
        );
        Ok(config)
    }

    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML for this
    /// struct, references an undefined environment variable or lacks a root.
    pub async fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content =
            tokio::fs::read_to_string(path).await.map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml_str(&content, path)
    }
}

fn expand_dir(dir: &Path) -> Result<PathBuf, ConfigError> {
    let raw = dir.to_string_lossy();
    if raw.is_empty() {
        return Ok(PathBuf::new());
    }
    let expanded = shellexpand::full(&raw).map_err(|e| ConfigError::PathExpansion {
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.as_ref()))
}
