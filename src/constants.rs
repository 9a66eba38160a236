//! Global constants used throughout the respimg codebase.
//!
//! Tag names, attribute names and parallelism defaults shared by the resolver,
//! the coordinator and the tree mutator.

/// Tag name of the candidate image elements located by the pass.
pub const IMAGE_TAG: &str = "img";

/// Tag name an element is relabeled to once the pass has resolved it.
///
/// Downstream passes treat elements carrying this tag as fully processed.
pub const PROCESSED_TAG: &str = "s-image";

/// Source attribute read from (and rewritten on) candidate elements.
pub const ATTR_SRC: &str = "src";

/// Explicit width attribute.
pub const ATTR_WIDTH: &str = "width";

/// Explicit quality attribute.
pub const ATTR_QUALITY: &str = "quality";

/// Explicit blur attribute.
pub const ATTR_BLUR: &str = "blur";

/// Marker requesting eager loading; suppresses the placeholder.
pub const ATTR_IMMEDIATE: &str = "immediate";

/// Generated source set for the original format.
pub const ATTR_SRCSET: &str = "srcset";

/// Generated source set for WebP variants.
pub const ATTR_SRCSET_WEBP: &str = "srcsetwebp";

/// Generated source set for AVIF variants.
pub const ATTR_SRCSET_AVIF: &str = "srcsetavif";

/// Generated placeholder payload (typically an inline data URI).
pub const ATTR_PLACEHOLDER: &str = "placeholder";

/// Minimum number of concurrent generator operations regardless of CPU count.
pub const MIN_PARALLELISM: usize = 10;

/// Multiplier applied to CPU core count for default generator parallelism.
pub const PARALLELISM_CORE_MULTIPLIER: usize = 2;

/// Default CPU core count when detection fails.
///
/// Used as a fallback when `std::thread::available_parallelism()` returns an error.
pub const FALLBACK_CORE_COUNT: usize = 4;

/// Default number of concurrent generator operations for a work queue.
pub fn default_max_parallel() -> usize {
    let cores = std::thread::available_parallelism()
        .map(std::num::NonZero::get)
        .unwrap_or(FALLBACK_CORE_COUNT);
    (cores * PARALLELISM_CORE_MULTIPLIER).max(MIN_PARALLELISM)
}
