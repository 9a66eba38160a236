//! Document tree model and the element matching primitive.
//!
//! The tree mirrors the JSON shape of a hast syntax tree so that trees produced
//! by an upstream HTML parser can be deserialized with `serde_json` directly:
//!
//! ```json
//! {
//!   "type": "root",
//!   "children": [
//!     { "type": "element", "tagName": "img", "properties": { "src": "a.jpg" }, "children": [] }
//!   ]
//! }
//! ```
//!
//! hast property values are not always strings (`className: ["hero"]`,
//! `width: 500`, `hidden: true`). They are read leniently into string
//! attributes: numbers are formatted, lists are joined with spaces, `true`
//! becomes an empty attribute and `false` or `null` drops the attribute.
//!
//! Markup parsing itself is not part of this crate. The transform only needs
//! [`select_elements`] to locate candidates and [`Node::element_mut`] to rewrite
//! them in place.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Element attribute map (attribute name to string value).
pub type Properties = BTreeMap<String, String>;

fn deserialize_properties<'de, D>(deserializer: D) -> Result<Properties, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(name, value)| property_text(value).map(|text| (name, text)))
        .collect())
}

/// String form of a hast property value; `None` means the attribute is absent.
fn property_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(true) => Some(String::new()),
        Value::Bool(false) | Value::Null => None,
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(property_text)
                .collect::<Vec<_>>()
                .join(" "),
        ),
        object @ Value::Object(_) => Some(object.to_string()),
    }
}

/// A node in a document tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    /// Document root.
    Root {
        /// Top-level nodes.
        #[serde(default)]
        children: Vec<Node>,
    },
    /// An element such as `<img>`.
    Element(Element),
    /// Character data.
    Text {
        /// Text content.
        value: String,
    },
    /// An HTML comment.
    Comment {
        /// Comment content.
        value: String,
    },
    /// `<!doctype html>`.
    Doctype {
        /// Document type name, only present in older hast trees.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// Markup passed through verbatim.
    Raw {
        /// Raw markup.
        value: String,
    },
}

/// An element node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Tag name, e.g. `img`.
    #[serde(rename = "tagName")]
    pub tag_name: String,
    /// Attributes.
    #[serde(default, deserialize_with = "deserialize_properties")]
    pub properties: Properties,
    /// Child nodes.
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with the given tag and no attributes.
    #[must_use]
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            ..Default::default()
        }
    }

    /// Set a single attribute.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Set children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Attribute value by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl Node {
    /// Create a root node.
    #[must_use]
    pub fn root(children: Vec<Node>) -> Self {
        Self::Root { children }
    }

    /// Create a text node.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    /// Child nodes, empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Root { children } => children,
            Self::Element(element) => &element.children,
            Self::Text { .. }
            | Self::Comment { .. }
            | Self::Doctype { .. }
            | Self::Raw { .. } => &[],
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Self::Root { children } => Some(children),
            Self::Element(element) => Some(&mut element.children),
            Self::Text { .. }
            | Self::Comment { .. }
            | Self::Doctype { .. }
            | Self::Raw { .. } => None,
        }
    }

    /// The element at `path`, if the path addresses an element.
    #[must_use]
    pub fn element(&self, path: &ElementPath) -> Option<&Element> {
        let mut node = self;
        for &index in &path.0 {
            node = node.children().get(index)?;
        }
        match node {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Mutable access to the element at `path`.
    pub fn element_mut(&mut self, path: &ElementPath) -> Option<&mut Element> {
        let mut node = self;
        for &index in &path.0 {
            node = node.children_mut()?.get_mut(index)?;
        }
        match node {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// Position of an element in a tree: child indices from the root.
///
/// Paths stay valid as long as no nodes are inserted or removed, which the
/// transform never does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementPath(Vec<usize>);

impl ElementPath {
    /// Path of the tree root itself.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Path of the `index`th child of this node.
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Child indices from the root.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for ElementPath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

/// Predicate selecting element nodes by tag name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementMatcher {
    tag_name: String,
}

impl ElementMatcher {
    /// Match elements whose tag equals `tag_name`.
    #[must_use]
    pub fn tag(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
        }
    }

    /// Whether `element` satisfies the predicate.
    #[must_use]
    pub fn matches(&self, element: &Element) -> bool {
        element.tag_name == self.tag_name
    }
}

/// Paths of every element under `root` matching `matcher`, in document order.
///
/// `root` itself is considered too. Descendants of a matching element are
/// still visited.
#[must_use]
pub fn select_elements(root: &Node, matcher: &ElementMatcher) -> Vec<ElementPath> {
    let mut found = Vec::new();
    collect(root, ElementPath::root(), matcher, &mut found);
    found
}

fn collect(node: &Node, path: ElementPath, matcher: &ElementMatcher, found: &mut Vec<ElementPath>) {
    if matches!(node, Node::Element(element) if matcher.matches(element)) {
        found.push(path.clone());
    }
    for (index, child) in node.children().iter().enumerate() {
        collect(child, path.child(index), matcher, found);
    }
}
