//! Option resolution for candidate image elements.
//!
//! [`resolve`] turns an element's attributes plus the pass-wide
//! [`PassConfig`] into an immutable [`RequestDescriptor`]. Precedence is strict:
//! a valid explicit attribute on the element always wins, then the pass
//! default, then "unset" (the generator picks its own widths/quality).
//!
//! Numeric attributes must be plain non-negative integers (`"500"`). Anything
//! else (`"100%"`, `"12.5"`, `"-3"`) is ignored exactly as if the attribute were
//! absent.
//!
//! A descriptor carries two kinds of fields. The ones that change what the
//! generator produces form the [`DedupKey`]; the rest (`blur`,
//! `skip_placeholder`, `skip_variant_generation`) only affect how a shared
//! result is presented to one element. Keeping the key a separate type means
//! adding a presentation field can never accidentally split shared work.

pub mod skip;

use crate::config::PassConfig;
use crate::constants::{ATTR_BLUR, ATTR_IMMEDIATE, ATTR_QUALITY, ATTR_SRC, ATTR_WIDTH};
use crate::tree::Properties;

/// Fully resolved request for one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// Source path with the pass prefix applied.
    pub resource_path: String,
    /// Single requested width, if any.
    pub width: Option<u32>,
    /// Requested encoder quality, if any.
    pub quality: Option<u32>,
    /// Placeholder blur; presentation only.
    pub blur: Option<u32>,
    /// Request WebP variants.
    pub include_webp: bool,
    /// Request AVIF variants.
    pub include_avif: bool,
    /// Only compute attributes against existing files.
    pub skip_variant_generation: bool,
    /// The element loads eagerly and must not receive a placeholder.
    pub skip_placeholder: bool,
}

impl RequestDescriptor {
    /// Identity of the physical computation this request needs.
    #[must_use]
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            resource_path: self.resource_path.clone(),
            width: self.width,
            quality: self.quality,
            include_webp: self.include_webp,
            include_avif: self.include_avif,
        }
    }
}

/// The subset of a request that determines the generated output.
///
/// Two descriptors with equal keys are the same unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    /// Resolved resource path.
    pub resource_path: String,
    /// Requested width.
    pub width: Option<u32>,
    /// Requested quality.
    pub quality: Option<u32>,
    /// WebP variants requested.
    pub include_webp: bool,
    /// AVIF variants requested.
    pub include_avif: bool,
}

/// Resolve an element's attributes against the pass configuration.
///
/// Returns `None` when the element has no usable `src`; such elements are
/// never processed. The element itself is only read.
#[must_use]
pub fn resolve(properties: &Properties, config: &PassConfig) -> Option<RequestDescriptor> {
    let src = properties.get(ATTR_SRC).filter(|src| !src.is_empty())?;

    let resource_path = match config.normalized_src_prefix() {
        Some(prefix) => format!("{prefix}{src}"),
        None => src.clone(),
    };

    Some(RequestDescriptor {
        resource_path,
        width: numeric_attribute(properties, ATTR_WIDTH).or(config.width),
        quality: numeric_attribute(properties, ATTR_QUALITY).or(config.quality),
        blur: numeric_attribute(properties, ATTR_BLUR).or(config.blur),
        include_webp: config.webp,
        include_avif: config.avif,
        skip_variant_generation: !config.generate_images,
        skip_placeholder: is_immediate(properties),
    })
}

/// Parse a non-negative integer attribute, ignoring malformed values.
fn numeric_attribute(properties: &Properties, name: &str) -> Option<u32> {
    let value = properties.get(name)?;
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn is_immediate(properties: &Properties) -> bool {
    properties
        .get(ATTR_IMMEDIATE)
        .is_some_and(|value| value.is_empty() || value == "true")
}
