//! Sample trees and elements for tests.

use crate::tree::{Element, Node};

/// `<img src="...">` node.
pub fn img(src: &str) -> Node {
    image(&[("src", src)])
}

/// `<img>` node with the given attributes.
pub fn image(properties: &[(&str, &str)]) -> Node {
    properties
        .iter()
        .fold(Element::new("img"), |element, (name, value)| element.with_property(*name, *value))
        .into()
}

/// `<p>` wrapping `children`.
pub fn paragraph(children: Vec<Node>) -> Node {
    Element::new("p").with_children(children).into()
}

/// Root node with `children`.
pub fn tree(children: Vec<Node>) -> Node {
    Node::root(children)
}

/// A small blog post: a heading, a paragraph with two images and a figure
/// reusing the first image.
pub fn blog_post() -> Node {
    tree(vec![
        Element::new("h1").with_children(vec![Node::text("Layers")]).into(),
        paragraph(vec![
            image(&[("src", "images/posts/2020-03-14/test-layer-1.jpg"), ("alt", "Test layer 1")]),
            Node::text(" and "),
            image(&[("src", "images/posts/2020-03-14/test-layer-2.jpg"), ("alt", "Test layer 2")]),
        ]),
        Element::new("figure")
            .with_children(vec![image(&[
                ("src", "images/posts/2020-03-14/test-layer-1.jpg"),
                ("alt", "Test layer 1 again"),
                ("immediate", ""),
            ])])
            .into(),
    ])
}
