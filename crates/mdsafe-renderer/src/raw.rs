//! Raw HTML expansion.
//!
//! Markdown may embed HTML fragments that only make sense together (`<b>` in
//! one inline event, `</b>` in a later one). When any [`Node::Raw`] is
//! present the whole tree is serialized and re-parsed as an HTML fragment, so
//! the result contains only element, text and comment nodes.

use mdsafe_tree::{Element, Node, PropertyValue};
use scraper::{ElementRef, Html};

use crate::MAX_NESTING_DEPTH;
use crate::error::{Stage, TransformError};

/// Replace raw HTML nodes with parsed element trees.
pub(crate) fn expand_raw_html(tree: &mut Node) -> Result<(), TransformError> {
    if !tree.any(&|node| matches!(node, Node::Raw(_))) {
        return Ok(());
    }
    let children = parse_fragment(&tree.to_html(), Stage::RawHtml)?;
    *tree = Node::Root(children);
    Ok(())
}

/// Parse an HTML fragment into owned nodes.
///
/// `stage` names the caller in the error returned when the parsed markup
/// nests deeper than [`MAX_NESTING_DEPTH`].
pub(crate) fn parse_fragment(html: &str, stage: Stage) -> Result<Vec<Node>, TransformError> {
    let fragment = Html::parse_fragment(html);
    convert_children(fragment.root_element(), 1, stage)
}

fn convert_children(
    parent: ElementRef<'_>,
    depth: usize,
    stage: Stage,
) -> Result<Vec<Node>, TransformError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(TransformError::new(
            stage,
            format!("markup nesting exceeds {MAX_NESTING_DEPTH} levels"),
        ));
    }

    let mut nodes = Vec::new();
    for child in parent.children() {
        match child.value() {
            scraper::Node::Text(text) => nodes.push(Node::text(&**text)),
            scraper::Node::Comment(comment) => nodes.push(Node::Comment(comment.comment.to_string())),
            scraper::Node::Element(_) => {
                if let Some(child_elem) = ElementRef::wrap(child) {
                    nodes.push(convert_element(child_elem, depth, stage)?.into());
                }
            }
            _ => {}
        }
    }
    Ok(nodes)
}

fn convert_element(
    element: ElementRef<'_>,
    depth: usize,
    stage: Stage,
) -> Result<Element, TransformError> {
    let mut converted = Element::new(element.value().name());
    for (name, value) in element.value().attrs() {
        let value = if name == "class" {
            PropertyValue::List(value.split_ascii_whitespace().map(str::to_owned).collect())
        } else {
            PropertyValue::from(value)
        };
        converted.properties.insert(name, value);
    }
    converted.children = convert_children(element, depth + 1, stage)?;
    Ok(converted)
}
