//! Tree filtering against a [`Schema`].

use std::mem;

use mdsafe_tree::{Element, Node, PropertyValue};

use crate::schema::Schema;

/// Filter the tree against the schema in place.
///
/// Walks depth-first, parent before children. Disallowed elements are
/// replaced by their children, stripped elements disappear with their subtree
/// and comments are dropped unless the schema allows them. Text and raw nodes
/// pass through unchanged; raw content is not inspected, so callers must expand
/// raw HTML into elements before sanitizing untrusted input.
///
/// If `tree` itself is an element that gets removed, it is replaced by a
/// [`Node::Root`] holding whatever survived.
pub fn sanitize(tree: &mut Node, schema: &Schema) {
    let mut stack = Vec::new();
    match tree {
        Node::Root(children) => {
            *children = sanitize_children(mem::take(children), schema, &mut stack);
        }
        _ => {
            let node = mem::replace(tree, Node::Root(Vec::new()));
            let mut out = Vec::with_capacity(1);
            sanitize_into(node, schema, &mut stack, &mut out);
            *tree = match out.pop() {
                Some(single) if out.is_empty() => single,
                Some(last) => {
                    out.push(last);
                    Node::Root(out)
                }
                None => Node::Root(Vec::new()),
            };
        }
    }
}

fn sanitize_children(children: Vec<Node>, schema: &Schema, stack: &mut Vec<String>) -> Vec<Node> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        sanitize_into(child, schema, stack, &mut out);
    }
    out
}

fn sanitize_into(node: Node, schema: &Schema, stack: &mut Vec<String>, out: &mut Vec<Node>) {
    match node {
        Node::Element(element) => sanitize_element(element, schema, stack, out),
        Node::Root(children) => out.extend(sanitize_children(children, schema, stack)),
        Node::Comment(_) if !schema.allow_comments => {}
        other @ (Node::Text(_) | Node::Raw(_) | Node::Comment(_)) => out.push(other),
    }
}

fn sanitize_element(
    mut element: Element,
    schema: &Schema,
    stack: &mut Vec<String>,
    out: &mut Vec<Node>,
) {
    if schema.strip.contains(&element.tag_name) {
        return;
    }

    let children = mem::take(&mut element.children);

    // Content promotion: the children take the element's place.
    if !schema.allows_tag(&element.tag_name)
        || !schema.allows_ancestry(&element.tag_name, stack)
    {
        out.extend(sanitize_children(children, schema, stack));
        return;
    }

    filter_properties(&mut element, schema);

    stack.push(element.tag_name.clone());
    element.children = sanitize_children(children, schema, stack);
    stack.pop();

    out.push(Node::Element(element));
}

fn filter_properties(element: &mut Element, schema: &Schema) {
    let tag_name = &element.tag_name;
    element.properties.retain(|name, value| {
        schema.allows_attribute(tag_name, name) && schema.allows_protocol(name, value)
    });

    if !schema.clobber.is_empty() {
        for (name, value) in element.properties.iter_mut() {
            if schema.clobber.contains(name) {
                clobber(value, &schema.clobber_prefix);
            }
        }
    }

    if let Some(required) = schema.required.get(tag_name) {
        for (name, value) in required {
            if !element.properties.contains(name) {
                element.properties.insert(name.clone(), value.clone());
            }
        }
    }
}

fn clobber(value: &mut PropertyValue, prefix: &str) {
    match value {
        PropertyValue::String(text) => {
            if !text.starts_with(prefix) {
                text.insert_str(0, prefix);
            }
        }
        PropertyValue::List(tokens) => {
            for token in tokens.iter_mut().filter(|token| !token.starts_with(prefix)) {
                token.insert_str(0, prefix);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::schema::{WILDCARD, default_schema};

    fn el(tag: &str) -> Element {
        Element::new(tag)
    }

    fn root(children: Vec<Node>) -> Node {
        Node::Root(children)
    }

    fn sanitized(mut tree: Node) -> Node {
        sanitize(&mut tree, default_schema());
        tree
    }

    /// Every element tag is allowed and every attribute is allowed on its tag.
    fn assert_sound(node: &Node, schema: &Schema) {
        if let Node::Element(element) = node {
            assert!(
                schema.allows_tag(&element.tag_name),
                "tag {} survived",
                element.tag_name
            );
            for (name, value) in element.properties.iter() {
                assert!(
                    schema.allows_attribute(&element.tag_name, name),
                    "attribute {name} survived on {}",
                    element.tag_name
                );
                assert!(schema.allows_protocol(name, value));
            }
        }
        assert!(!matches!(node, Node::Comment(_)));
        for child in node.children() {
            assert_sound(child, schema);
        }
    }

    fn hostile_tree() -> Node {
        root(vec![
            el("script").with_child(Node::text("alert(1)")).into(),
            el("p")
                .with_property("style", "color:red")
                .with_property("onclick", "x()")
                .with_property("class", "lead")
                .with_child(Node::text("Hello "))
                .with_child(
                    el("a")
                        .with_property("href", "javascript:alert(1)")
                        .with_property("title", "t")
                        .with_child(Node::text("link")),
                )
                .into(),
            Node::Comment("secret".to_owned()),
            el("iframe")
                .with_property("src", "https://evil")
                .with_child(el("b").with_child(Node::text("inside")))
                .into(),
            el("td").with_child(Node::text("loose cell")).into(),
            el("table")
                .with_child(
                    el("tbody").with_child(
                        el("tr").with_child(
                            el("td")
                                .with_property("align", "left")
                                .with_property("bgcolor", "red")
                                .with_child(Node::text("cell")),
                        ),
                    ),
                )
                .into(),
            el("svg")
                .with_property("viewBox", "0 0 16 16")
                .with_property("onload", "x()")
                .with_child(
                    el("path")
                        .with_property("d", "M0 0")
                        .with_property("stroke-width", "2"),
                )
                .with_child(el("foreignObject").with_child(Node::text("fo")))
                .into(),
            el("input").with_property("type", "checkbox").into(),
        ])
    }

    #[test]
    fn test_protocol_stripping() {
        let tree = sanitized(root(vec![
            el("a")
                .with_property("href", "javascript:alert(1)")
                .with_child(Node::text("bad"))
                .into(),
            el("a")
                .with_property("href", "https://x")
                .with_child(Node::text("good"))
                .into(),
        ]));

        assert_eq!(tree.to_html(), r#"<a>bad</a><a href="https://x">good</a>"#);
    }

    #[test]
    fn test_unknown_tag_children_are_promoted_in_place() {
        let tree = sanitized(root(vec![
            Node::text("a"),
            el("custom")
                .with_child(Node::text("b"))
                .with_child(el("em").with_child(Node::text("c")))
                .into(),
            Node::text("d"),
        ]));

        assert_eq!(tree.to_html(), "ab<em>c</em>d");
    }

    #[test]
    fn test_script_is_unwrapped_not_rendered() {
        let tree = sanitized(root(vec![
            el("script").with_child(Node::text("alert(1)")).into(),
        ]));

        let html = tree.to_html();
        assert!(!html.contains("<script"));
        assert_eq!(html, "alert(1)");
    }

    #[test]
    fn test_strip_removes_subtree() {
        let mut schema = Schema::markdown();
        schema.strip.insert("script".to_owned());
        let mut tree = root(vec![
            el("script").with_child(Node::text("alert(1)")).into(),
            el("p").with_child(Node::text("kept")).into(),
        ]);

        sanitize(&mut tree, &schema);

        assert_eq!(tree.to_html(), "<p>kept</p>");
    }

    #[test]
    fn test_strip_applies_at_any_depth() {
        let mut schema = Schema::markdown();
        schema.strip.insert("em".to_owned());
        let mut tree = root(vec![
            el("div")
                .with_child(el("p").with_child(el("em").with_child(Node::text("gone"))))
                .into(),
        ]);

        sanitize(&mut tree, &schema);

        assert_eq!(tree.to_html(), "<div><p></p></div>");
    }

    #[test]
    fn test_disallowed_attributes_removed() {
        let tree = sanitized(root(vec![
            el("img")
                .with_property("src", "https://x/a.png")
                .with_property("alt", "")
                .with_property("onerror", "x()")
                .with_property("style", "width:1px")
                .into(),
        ]));

        assert_eq!(tree.to_html(), r#"<img src="https://x/a.png" alt>"#);
    }

    #[test]
    fn test_comments_dropped() {
        let tree = sanitized(root(vec![Node::Comment("x".to_owned()), Node::text("y")]));
        assert_eq!(tree, root(vec![Node::text("y")]));
    }

    #[test]
    fn test_comments_kept_when_allowed() {
        let mut schema = Schema::markdown();
        schema.allow_comments = true;
        let mut tree = root(vec![Node::Comment("x".to_owned())]);

        sanitize(&mut tree, &schema);

        assert_eq!(tree.to_html(), "<!--x-->");
    }

    #[test]
    fn test_table_parts_require_table_ancestor() {
        let tree = sanitized(root(vec![
            el("tr")
                .with_child(el("td").with_child(Node::text("x")))
                .into(),
        ]));
        assert_eq!(tree.to_html(), "x");

        let tree = sanitized(root(vec![
            el("table")
                .with_child(el("tr").with_child(el("td").with_child(Node::text("x"))))
                .into(),
        ]));
        assert_eq!(tree.to_html(), "<table><tr><td>x</td></tr></table>");
    }

    #[test]
    fn test_required_input_attributes_added() {
        let tree = sanitized(root(vec![
            el("input")
                .with_property("type", "checkbox")
                .with_property("checked", "")
                .into(),
        ]));

        assert_eq!(tree.to_html(), r#"<input type="checkbox" checked disabled>"#);
    }

    #[test]
    fn test_clobber_prefix() {
        let mut schema = Schema::github();
        schema.strip.clear();
        let mut tree = root(vec![
            el("h2")
                .with_property("id", "intro")
                .with_child(Node::text("Intro"))
                .into(),
        ]);

        sanitize(&mut tree, &schema);
        assert_eq!(tree.to_html(), r#"<h2 id="user-content-intro">Intro</h2>"#);

        // a second pass does not double the prefix
        sanitize(&mut tree, &schema);
        assert_eq!(tree.to_html(), r#"<h2 id="user-content-intro">Intro</h2>"#);
    }

    #[test]
    fn test_element_root_is_replaced_by_its_children() {
        let mut tree: Node = el("font").with_child(Node::text("x")).into();
        sanitize(&mut tree, default_schema());
        assert_eq!(tree, Node::text("x"));

        let mut tree: Node = el("font")
            .with_child(Node::text("x"))
            .with_child(el("b").with_child(Node::text("y")))
            .into();
        sanitize(&mut tree, default_schema());
        assert_eq!(tree.to_html(), "x<b>y</b>");
    }

    #[test]
    fn test_wildcard_attributes() {
        let mut schema = Schema::default();
        schema.tag_names.insert("p".to_owned());
        schema
            .attributes
            .insert(WILDCARD.to_owned(), ["lang".to_owned()].into_iter().collect());
        let mut tree = root(vec![
            el("p")
                .with_property("lang", "ko")
                .with_property("id", "x")
                .into(),
        ]);

        sanitize(&mut tree, &schema);

        assert_eq!(tree.to_html(), r#"<p lang="ko"></p>"#);
    }

    #[test]
    fn test_allowlist_soundness() {
        let tree = sanitized(hostile_tree());
        assert_sound(&tree, default_schema());

        let html = tree.to_html();
        assert!(!html.contains("<script"));
        assert!(!html.contains("<iframe"));
        assert!(!html.contains("javascript:"));
        assert!(!html.contains("style="));
        assert!(!html.contains("onclick"), "event handler survived: {html}");
        assert!(!html.contains("onload"), "event handler survived: {html}");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitized(hostile_tree());
        let twice = sanitized(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_mathml_and_svg_survive() {
        let tree = sanitized(root(vec![
            el("math")
                .with_property("xmlns", "http://www.w3.org/1998/Math/MathML")
                .with_child(
                    el("semantics")
                        .with_child(el("mrow").with_child(el("mi").with_child(Node::text("x"))))
                        .with_child(
                            el("annotation")
                                .with_property("encoding", "application/x-tex")
                                .with_child(Node::text("x")),
                        ),
                )
                .into(),
        ]));

        assert_eq!(
            tree.to_html(),
            r#"<math xmlns="http://www.w3.org/1998/Math/MathML"><semantics><mrow><mi>x</mi></mrow><annotation>x</annotation></semantics></math>"#
        );
    }
}
