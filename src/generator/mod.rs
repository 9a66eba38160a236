//! Contract with the attribute generator.
//!
//! Producing image variants (resizing, re-encoding, rendering placeholders) is
//! done by an external library. The transform talks to it through
//! [`AttributeGenerator`]: one [`GenerationRequest`] in, one
//! [`GeneratedAttributes`] map out.
//!
//! Every request built by one [`Coordinator`](crate::coordinator::Coordinator)
//! carries the same [`WorkQueue`] handle, which generators use to bound and
//! batch their own work across the whole pass.

mod queue;

pub use queue::WorkQueue;

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::ATTR_PLACEHOLDER;

/// Input handed to [`AttributeGenerator::generate`].
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Resolved resource path, relative to `input_dir`.
    pub resource_path: String,
    /// Pass-wide work queue shared by every request.
    pub queue: WorkQueue,
    /// Source image root, passed through unmodified.
    pub input_dir: PathBuf,
    /// Variant output root, passed through unmodified.
    pub output_dir: PathBuf,
    /// Whether WebP variants are wanted.
    pub include_webp: Option<bool>,
    /// Whether AVIF variants are wanted.
    pub include_avif: Option<bool>,
    /// Widths to produce; `None` lets the generator choose. Never more than one entry.
    pub widths: Option<Vec<u32>>,
    /// Encoder quality.
    pub quality: Option<u32>,
    /// Only compute attributes against already generated files.
    pub skip_generation: bool,
    /// Don't render a placeholder.
    ///
    /// Results are shared between elements that may disagree on this, so the
    /// coordinator always asks for the placeholder and strips it per element.
    pub skip_placeholder: bool,
}

/// Attribute map produced for one resource.
///
/// Usual keys are `srcset`, `srcsetwebp`, `srcsetavif` and `placeholder`, but
/// whatever the generator returns is merged onto the element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneratedAttributes(BTreeMap<String, String>);

impl GeneratedAttributes {
    /// Empty attribute map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Attribute value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Whether a placeholder was produced.
    #[must_use]
    pub fn has_placeholder(&self) -> bool {
        self.0.contains_key(ATTR_PLACEHOLDER)
    }

    /// Copy of these attributes without the placeholder.
    #[must_use]
    pub fn without_placeholder(&self) -> Self {
        let mut attributes = self.clone();
        attributes.0.remove(ATTR_PLACEHOLDER);
        attributes
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for GeneratedAttributes {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, String>> for GeneratedAttributes {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// Produces responsive image attributes for one resource.
///
/// Implementations may do arbitrary I/O. Failures are reported through
/// `anyhow::Error`; the coordinator wraps them in
/// [`GenerationError`](crate::core::GenerationError) and never retries on its own.
///
/// Implementors can write `async fn generate(...)` directly.
pub trait AttributeGenerator: Send + Sync {
    /// Generate attributes for `request`.
    fn generate(
        &self,
        request: GenerationRequest,
    ) -> impl Future<Output = anyhow::Result<GeneratedAttributes>> + Send;
}

impl<G: AttributeGenerator> AttributeGenerator for std::sync::Arc<G> {
    fn generate(
        &self,
        request: GenerationRequest,
    ) -> impl Future<Output = anyhow::Result<GeneratedAttributes>> + Send {
        (**self).generate(request)
    }
}
