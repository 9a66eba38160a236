//! Writing resolved attributes back onto an element.

use crate::constants::{ATTR_BLUR, ATTR_QUALITY, ATTR_SRC, ATTR_WIDTH, PROCESSED_TAG};
use crate::generator::GeneratedAttributes;
use crate::resolver::RequestDescriptor;
use crate::tree::Element;

/// Apply generated attributes to `element` and mark it processed.
///
/// - generated attributes are merged in; nothing already on the element is removed
/// - `src` is rewritten when the resolved path differs (a prefix was applied)
/// - width, quality and blur that came from pass defaults are stamped onto
///   elements left without that attribute after the merge
/// - the tag becomes [`PROCESSED_TAG`]
pub fn apply(element: &mut Element, attributes: &GeneratedAttributes, request: &RequestDescriptor) {
    for (name, value) in attributes.iter() {
        element.properties.insert(name.to_string(), value.to_string());
    }

    if element.property(ATTR_SRC) != Some(request.resource_path.as_str()) {
        element.properties.insert(ATTR_SRC.to_string(), request.resource_path.clone());
    }

    // Authored and generated values both take precedence over a default.
    for (name, value) in [
        (ATTR_WIDTH, request.width),
        (ATTR_QUALITY, request.quality),
        (ATTR_BLUR, request.blur),
    ] {
        if let Some(value) = value {
            element
                .properties
                .entry(name.to_string())
                .or_insert_with(|| value.to_string());
        }
    }

    element.tag_name = PROCESSED_TAG.to_string();
}
