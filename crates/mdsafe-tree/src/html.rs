//! HTML serialization.
//!
//! Produces an HTML fragment: text is escaped, attributes are double-quoted,
//! void elements have no closing tag and raw nodes are written verbatim.

use crate::node::{Element, Node};

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Whether the tag is an HTML void element.
pub fn is_void_element(tag_name: &str) -> bool {
    VOID_ELEMENTS.contains(&tag_name)
}

pub(crate) fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Root(children) => children.iter().for_each(|child| write_node(child, out)),
        Node::Element(element) => write_element(element, out),
        Node::Text(value) => out.push_str(&escape_html(value)),
        Node::Raw(value) => out.push_str(value),
        Node::Comment(value) => {
            out.push_str("<!--");
            out.push_str(value);
            out.push_str("-->");
        }
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag_name);
    for (name, value) in element.properties.iter() {
        out.push(' ');
        out.push_str(name);
        let value = value.to_string();
        if !value.is_empty() {
            out.push_str("=\"");
            out.push_str(&escape_html(&value));
            out.push('"');
        }
    }
    out.push('>');

    if is_void_element(&element.tag_name) {
        return;
    }

    // The parser drops one newline right after these start tags.
    if matches!(element.tag_name.as_str(), "pre" | "textarea" | "listing")
        && let Some(Node::Text(text)) = element.children.first()
        && text.starts_with('\n')
    {
        out.push('\n');
    }

    for child in &element.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&element.tag_name);
    out.push('>');
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
