//! Table of contents extraction.

use mdsafe_tree::Node;

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text, trimmed.
    pub text: String,
    /// Anchor ID for linking.
    pub id: String,
}

/// Collect TOC entries for headings that have both text and an id.
///
/// Read-only; entries are in document order.
pub fn extract_toc(tree: &Node) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    collect(tree, &mut entries);
    entries
}

fn collect(node: &Node, entries: &mut Vec<TocEntry>) {
    if let Some(element) = node.as_element()
        && let Some(level) = element.heading_rank()
    {
        let text = element.visible_text();
        let text = text.trim();
        let id = element
            .properties
            .get("id")
            .map(ToString::to_string)
            .unwrap_or_default();
        if !text.is_empty() && !id.trim().is_empty() {
            entries.push(TocEntry {
                level,
                text: text.to_owned(),
                id,
            });
        }
    }
    for child in node.children() {
        collect(child, entries);
    }
}

#[cfg(test)]
mod tests {
    use mdsafe_tree::Element;
    use pretty_assertions::assert_eq;

    use super::*;

    fn heading(tag: &str, id: Option<&str>, children: Vec<Node>) -> Node {
        let mut el = Element::new(tag).with_children(children);
        if let Some(id) = id {
            el.properties.insert("id", id);
        }
        el.into()
    }

    #[test]
    fn test_entries_in_document_order() {
        let tree = Node::Root(vec![
            heading("h1", Some("h-title"), vec![Node::text("Title")]),
            Element::new("section")
                .with_child(heading("h3", Some("h-deep"), vec![Node::text("Deep")]))
                .into(),
            heading("h2", Some("h-next"), vec![Node::text("Next")]),
        ]);
        let toc = extract_toc(&tree);
        assert_eq!(
            toc,
            vec![
                TocEntry { level: 1, text: "Title".to_owned(), id: "h-title".to_owned() },
                TocEntry { level: 3, text: "Deep".to_owned(), id: "h-deep".to_owned() },
                TocEntry { level: 2, text: "Next".to_owned(), id: "h-next".to_owned() },
            ]
        );
    }

    #[test]
    fn test_text_concatenates_descendants_and_trims() {
        let tree = Node::Root(vec![heading(
            "h2",
            Some("h-x"),
            vec![
                Node::text("  Use "),
                Element::new("code").with_child(Node::text("cargo")).into(),
                Node::text("  "),
            ],
        )]);
        assert_eq!(extract_toc(&tree)[0].text, "Use cargo");
    }

    #[test]
    fn test_headings_without_text_or_id_are_skipped() {
        let tree = Node::Root(vec![
            heading("h2", None, vec![Node::text("No id")]),
            heading("h2", Some("h-"), vec![Node::text("   ")]),
            heading("h2", Some("  "), vec![Node::text("Blank id")]),
            heading("p", Some("h-p"), vec![Node::text("Paragraph")]),
        ]);
        assert!(extract_toc(&tree).is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serializes_fields() {
        let entry = TocEntry { level: 2, text: "A".to_owned(), id: "h-a".to_owned() };
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            serde_json::json!({"level": 2, "text": "A", "id": "h-a"})
        );
    }
}
