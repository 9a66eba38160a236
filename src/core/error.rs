//! Error handling for respimg
//!
//! The pass distinguishes three failure classes:
//! - [`ConfigError`] - invalid pass configuration, raised at construction before
//!   any tree is touched
//! - [`GenerationError`] - the attribute generator failed for one resource; the
//!   error is cloneable so every element sharing the failed request observes it
//! - [`PassError`] - aggregate failure returned once a pass has finished and
//!   mutated every element that did succeed
//!
//! Malformed numeric attributes on elements are not errors at all; the resolver
//! ignores them as if they were absent.

use std::error::Error as StdError;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::transform::PassReport;

/// Pass configuration is unusable.
///
/// Every variant is raised synchronously while building a
/// [`PassConfig`](crate::config::PassConfig) or an
/// [`ImageTransform`](crate::transform::ImageTransform).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The input root directory was not provided or is empty
    #[error("Input dir is required")]
    MissingInputDir,

    /// The output root directory was not provided or is empty
    #[error("Output dir is required")]
    MissingOutputDir,

    /// A `skip` entry is not a valid glob pattern
    #[error("Invalid skip pattern '{pattern}'")]
    InvalidSkipPattern {
        /// The offending pattern as written in the configuration
        pattern: String,
        /// Underlying glob compile error
        #[source]
        source: glob::PatternError,
    },

    /// A directory value references an undefined environment variable
    #[error("Failed to expand '{value}': {reason}")]
    PathExpansion {
        /// The raw configured value
        value: String,
        /// Description of the lookup failure
        reason: String,
    },

    /// The configuration file could not be read
    #[error("Failed to read pass config from {}", path.display())]
    Read {
        /// Path of the configuration file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`PassConfig`](crate::config::PassConfig)
    #[error("Failed to parse pass config from {}", path.display())]
    Parse {
        /// Path of the configuration file
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },
}

/// The attribute generator failed for a resource.
///
/// Cloning is cheap: the underlying cause is reference counted so a single
/// failure can be handed to every caller attached to the same request.
#[derive(Error, Debug, Clone)]
#[error("Failed to generate image attributes for '{resource_path}': {source}")]
pub struct GenerationError {
    /// Resolved resource path the generator was asked about
    pub resource_path: String,
    #[source]
    source: Arc<dyn StdError + Send + Sync>,
}

impl GenerationError {
    /// Wrap a generator failure for `resource_path`.
    pub fn new(resource_path: impl Into<String>, error: anyhow::Error) -> Self {
        let boxed: Box<dyn StdError + Send + Sync> = error.into();
        Self {
            resource_path: resource_path.into(),
            source: Arc::from(boxed),
        }
    }

    /// The generator's own error.
    pub fn cause(&self) -> &(dyn StdError + Send + Sync) {
        self.source.as_ref()
    }
}

/// A transform pass finished, but not every element could be processed.
///
/// The tree has still been mutated for every element that succeeded; the
/// report lists what failed.
#[derive(Error, Debug)]
pub enum PassError {
    /// One or more elements failed attribute generation
    #[error("{} of {} image elements failed attribute generation", report.failures.len(), report.candidates)]
    Generation {
        /// Complete pass report including the per-element failures
        report: Box<PassReport>,
    },
}

impl PassError {
    /// The report of the pass that produced this error.
    pub fn report(&self) -> &PassReport {
        match self {
            Self::Generation { report } => report,
        }
    }
}
