//! Recording generator stub.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;

use crate::constants::{ATTR_PLACEHOLDER, ATTR_SRCSET, ATTR_SRCSET_AVIF, ATTR_SRCSET_WEBP};
use crate::generator::{AttributeGenerator, GeneratedAttributes, GenerationRequest};

/// Placeholder value produced by [`RecordingGenerator`].
pub const STUB_PLACEHOLDER: &str = "<svg />";

/// Width reported when a request names none.
pub const STUB_DEFAULT_WIDTH: u32 = 1200;

/// Generator stub that records requests and fabricates attributes.
///
/// For a request for `a.jpg` at width `w` it returns:
/// - `srcset`: `"a.jpg {w}w"`
/// - `srcsetwebp` / `srcsetavif`: `"a.jpg.webp {w}w"` / `"a.jpg.avif {w}w"` when requested
/// - `placeholder`: [`STUB_PLACEHOLDER`] unless the request skips it
///
/// Clones share their records.
#[derive(Clone, Default)]
pub struct RecordingGenerator {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    requests: Mutex<Vec<GenerationRequest>>,
    delay: Option<Duration>,
    fail_once: Mutex<HashSet<String>>,
    fail_always: HashSet<String>,
}

impl RecordingGenerator {
    /// Stub that answers immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` inside every call, widening race windows.
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        self.map_inner(|inner| inner.delay = Some(delay))
    }

    /// Fail the first call for `resource_path`, succeed afterwards.
    #[must_use]
    pub fn failing_once(self, resource_path: &str) -> Self {
        let path = resource_path.to_string();
        self.map_inner(|inner| {
            inner.fail_once.get_mut().expect("fail_once lock poisoned").insert(path);
        })
    }

    /// Fail every call for `resource_path`.
    #[must_use]
    pub fn failing_always(self, resource_path: &str) -> Self {
        let path = resource_path.to_string();
        self.map_inner(|inner| {
            inner.fail_always.insert(path);
        })
    }

    fn map_inner(self, f: impl FnOnce(&mut Inner)) -> Self {
        let mut inner = Arc::try_unwrap(self.inner)
            .unwrap_or_else(|_| panic!("configure RecordingGenerator before cloning it"));
        f(&mut inner);
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Number of `generate` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.inner.requests.lock().expect("requests lock poisoned").len()
    }

    /// Every request received, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.inner.requests.lock().expect("requests lock poisoned").clone()
    }

    /// Number of calls for one resource path.
    #[must_use]
    pub fn calls_for(&self, resource_path: &str) -> usize {
        self.inner
            .requests
            .lock()
            .expect("requests lock poisoned")
            .iter()
            .filter(|r| r.resource_path == resource_path)
            .count()
    }

    /// Attributes this stub returns for `request`.
    #[must_use]
    pub fn attributes_for(request: &GenerationRequest) -> GeneratedAttributes {
        let path = &request.resource_path;
        let width = request
            .widths
            .as_ref()
            .and_then(|widths| widths.first().copied())
            .unwrap_or(STUB_DEFAULT_WIDTH);

        let mut attributes = GeneratedAttributes::new().with(ATTR_SRCSET, format!("{path} {width}w"));
        if request.include_webp.unwrap_or(true) {
            attributes = attributes.with(ATTR_SRCSET_WEBP, format!("{path}.webp {width}w"));
        }
        if request.include_avif.unwrap_or(true) {
            attributes = attributes.with(ATTR_SRCSET_AVIF, format!("{path}.avif {width}w"));
        }
        if !request.skip_placeholder {
            attributes = attributes.with(ATTR_PLACEHOLDER, STUB_PLACEHOLDER);
        }
        attributes
    }
}

impl AttributeGenerator for RecordingGenerator {
    async fn generate(&self, request: GenerationRequest) -> anyhow::Result<GeneratedAttributes> {
        self.inner.requests.lock().expect("requests lock poisoned").push(request.clone());

        if let Some(delay) = self.inner.delay {
            tokio::time::sleep(delay).await;
        }

        let path = &request.resource_path;
        let fail_once =
            self.inner.fail_once.lock().expect("fail_once lock poisoned").remove(path);
        if fail_once || self.inner.fail_always.contains(path) {
            bail!("cannot read source image '{path}'");
        }

        request.queue.run(async { Ok(Self::attributes_for(&request)) }).await
    }
}
