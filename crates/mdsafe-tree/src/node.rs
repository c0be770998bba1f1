//! Tree node types.

use crate::html::write_node;
use crate::properties::{Properties, PropertyValue};

/// Node of the document tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Document root; serializes as its children only.
    Root(Vec<Node>),
    /// HTML element.
    Element(Element),
    /// Text content (escaped on serialization).
    Text(String),
    /// Opaque raw HTML, serialized verbatim.
    Raw(String),
    /// HTML comment.
    Comment(String),
}

impl Node {
    /// Create a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Children of a root or element node.
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Root(children) => children,
            Self::Element(element) => &element.children,
            Self::Text(_) | Self::Raw(_) | Self::Comment(_) => &[],
        }
    }

    /// Mutable children of a root or element node.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Self::Root(children) => Some(children),
            Self::Element(element) => Some(&mut element.children),
            Self::Text(_) | Self::Raw(_) | Self::Comment(_) => None,
        }
    }

    /// The element, if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// The mutable element, if this node is one.
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Concatenate all descendant text values in document order.
    ///
    /// Element boundaries contribute no separators, so `a<b>b</b>` yields `ab`.
    /// Raw and comment nodes contribute nothing.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out, false);
        out
    }

    /// Like [`text_content`](Self::text_content), but skips `annotation`
    /// subtrees so rendered math contributes only its displayed symbols.
    pub fn visible_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out, true);
        out
    }

    fn collect_text(&self, out: &mut String, visible_only: bool) {
        match self {
            Self::Text(value) => out.push_str(value),
            Self::Root(children) => children
                .iter()
                .for_each(|child| child.collect_text(out, visible_only)),
            Self::Element(element) if visible_only && element.tag_name == "annotation" => {}
            Self::Element(element) => element
                .children
                .iter()
                .for_each(|child| child.collect_text(out, visible_only)),
            Self::Raw(_) | Self::Comment(_) => {}
        }
    }

    /// Whether this node or any descendant satisfies the predicate.
    pub fn any(&self, predicate: &impl Fn(&Node) -> bool) -> bool {
        predicate(self) || self.children().iter().any(|child| child.any(predicate))
    }

    /// Depth of the deepest descendant (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(Node::depth).max().unwrap_or(0)
    }

    /// Serialize the node to an HTML string.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_node(self, &mut out);
        out
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// HTML element with attributes and owned children.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    /// Tag name (lowercase for HTML elements).
    pub tag_name: String,
    /// Attributes.
    pub properties: Properties,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element without attributes or children.
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            properties: Properties::new(),
            children: Vec::new(),
        }
    }

    /// Builder: set an attribute.
    #[must_use]
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.properties.insert(name, value);
        self
    }

    /// Builder: set the `class` attribute from tokens.
    #[must_use]
    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = classes.into_iter().map(Into::into).collect();
        self.properties.insert("class", tokens);
        self
    }

    /// Builder: append a child.
    #[must_use]
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Builder: append children.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    /// Heading rank (1-6) when the tag is `h1` through `h6`.
    pub fn heading_rank(&self) -> Option<u8> {
        match self.tag_name.as_bytes() {
            [b'h', rank @ b'1'..=b'6'] => Some(rank - b'0'),
            _ => None,
        }
    }

    /// Class tokens of the element.
    pub fn classes(&self) -> Vec<&str> {
        self.properties
            .get("class")
            .map(PropertyValue::tokens)
            .unwrap_or_default()
    }

    /// Whether the element carries a class token.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().contains(&class)
    }

    /// Add a class token unless it is already present.
    pub fn add_class(&mut self, class: &str) {
        let mut tokens: Vec<String> = self.classes().into_iter().map(str::to_owned).collect();
        if !tokens.iter().any(|token| token == class) {
            tokens.push(class.to_owned());
        }
        self.properties.insert("class", tokens);
    }

    /// Attribute value as a string slice.
    pub fn property_str(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(PropertyValue::as_str)
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            out.push_str(&child.text_content());
        }
        out
    }

    /// Descendant text without `annotation` subtrees.
    pub fn visible_text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            out.push_str(&child.visible_text());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_rank() {
        assert_eq!(Element::new("h1").heading_rank(), Some(1));
        assert_eq!(Element::new("h6").heading_rank(), Some(6));
        assert_eq!(Element::new("h7").heading_rank(), None);
        assert_eq!(Element::new("h").heading_rank(), None);
        assert_eq!(Element::new("hr").heading_rank(), None);
        assert_eq!(Element::new("h10").heading_rank(), None);
    }

    #[test]
    fn test_text_content_concatenates_without_separators() {
        let heading: Node = Element::new("h2")
            .with_child(Node::text("Hello "))
            .with_child(Element::new("em").with_child(Node::text("big")))
            .with_child(Element::new("code").with_child(Node::text("World")))
            .with_child(Node::Comment("hidden".to_owned()))
            .into();

        assert_eq!(heading.text_content(), "Hello bigWorld");
    }

    #[test]
    fn test_visible_text_skips_annotations() {
        let heading = Element::new("h2")
            .with_child(
                Element::new("math").with_child(
                    Element::new("semantics")
                        .with_child(Element::new("mi").with_child(Node::text("x")))
                        .with_child(
                            Element::new("annotation")
                                .with_property("encoding", "application/x-tex")
                                .with_child(Node::text("x")),
                        ),
                ),
            )
            .with_child(Node::text(" heading"));

        assert_eq!(heading.text_content(), "xx heading");
        assert_eq!(heading.visible_text(), "x heading");
    }

    #[test]
    fn test_classes() {
        let mut el = Element::new("code").with_classes(["language-rust"]);
        assert!(el.has_class("language-rust"));
        el.add_class("hljs");
        el.add_class("hljs");
        assert_eq!(el.classes(), vec!["language-rust", "hljs"]);
    }

    #[test]
    fn test_class_from_string_value() {
        let el = Element::new("li").with_property("class", "task-list-item done");
        assert!(el.has_class("done"));
    }

    #[test]
    fn test_depth() {
        let tree = Node::Root(vec![
            Element::new("div")
                .with_child(Element::new("p").with_child(Node::text("x")))
                .into(),
        ]);
        assert_eq!(tree.depth(), 4);
        assert_eq!(Node::Root(Vec::new()).depth(), 1);
    }

    #[test]
    fn test_any() {
        let tree = Node::Root(vec![Node::text("a"), Node::Raw("<b>".to_owned())]);
        assert!(tree.any(&|node| matches!(node, Node::Raw(_))));
        assert!(!tree.any(&|node| matches!(node, Node::Comment(_))));
    }
}
