//! Markdown events to document tree.
//!
//! Walks the pulldown-cmark event stream and builds an owned [`Node`] tree.
//! Embedded HTML is kept verbatim as [`Node::Raw`]; math and code are left as
//! placeholder `code` elements for the later stages.

use std::collections::HashMap;

use mdsafe_tree::{Element, Node};
use pulldown_cmark::{
    Alignment, BlockQuoteKind, CodeBlockKind, Event, HeadingLevel, LinkType, Options, Parser, Tag,
    TagEnd,
};

use crate::MAX_NESTING_DEPTH;
use crate::emoji::replace_shortcodes;
use crate::error::ParseError;

// Octicons used in alert titles (16x16)
const ICON_INFO: &str = "M0 8a8 8 0 1 1 16 0A8 8 0 0 1 0 8Zm8-6.5a6.5 6.5 0 1 0 0 13 6.5 6.5 0 0 0 0-13ZM6.5 7.75A.75.75 0 0 1 7.25 7h1a.75.75 0 0 1 .75.75v2.75h.25a.75.75 0 0 1 0 1.5h-2a.75.75 0 0 1 0-1.5h.25v-2h-.25a.75.75 0 0 1-.75-.75ZM8 6a1 1 0 1 1 0-2 1 1 0 0 1 0 2Z";
const ICON_LIGHTBULB: &str = "M8 1.5c-2.363 0-4 1.69-4 3.75 0 .984.424 1.625.984 2.304l.214.253c.223.264.47.556.673.848.284.411.537.896.621 1.49a.75.75 0 0 1-1.484.211c-.04-.282-.163-.547-.37-.847a8.456 8.456 0 0 0-.542-.68c-.084-.1-.173-.205-.268-.32C3.201 7.75 2.5 6.766 2.5 5.25 2.5 2.31 4.863 0 8 0s5.5 2.31 5.5 5.25c0 1.516-.701 2.5-1.328 3.259-.095.115-.184.22-.268.319-.207.245-.383.453-.541.681-.208.3-.33.565-.37.847a.751.751 0 0 1-1.485-.212c.084-.593.337-1.078.621-1.489.203-.292.45-.584.673-.848.075-.088.147-.173.213-.253.561-.679.985-1.32.985-2.304 0-2.06-1.637-3.75-4-3.75ZM5.75 12h4.5a.75.75 0 0 1 0 1.5h-4.5a.75.75 0 0 1 0-1.5ZM6 15.25a.75.75 0 0 1 .75-.75h2.5a.75.75 0 0 1 0 1.5h-2.5a.75.75 0 0 1-.75-.75Z";
const ICON_REPORT: &str = "M0 1.75C0 .784.784 0 1.75 0h12.5C15.216 0 16 .784 16 1.75v9.5A1.75 1.75 0 0 1 14.25 13H8.06l-2.573 2.573A1.458 1.458 0 0 1 3 14.543V13H1.75A1.75 1.75 0 0 1 0 11.25Zm1.75-.25a.25.25 0 0 0-.25.25v9.5c0 .138.112.25.25.25h2a.75.75 0 0 1 .75.75v2.19l2.72-2.72a.749.749 0 0 1 .53-.22h6.5a.25.25 0 0 0 .25-.25v-9.5a.25.25 0 0 0-.25-.25Zm7 2.25v2.5a.75.75 0 0 1-1.5 0v-2.5a.75.75 0 0 1 1.5 0ZM9 9a1 1 0 1 1-2 0 1 1 0 0 1 2 0Z";
const ICON_ALERT: &str = "M6.457 1.047c.659-1.234 2.427-1.234 3.086 0l6.082 11.378A1.75 1.75 0 0 1 14.082 15H1.918a1.75 1.75 0 0 1-1.543-2.575Zm1.763.707a.25.25 0 0 0-.44 0L1.698 13.132a.25.25 0 0 0 .22.368h12.164a.25.25 0 0 0 .22-.368Zm.53 3.996v2.5a.75.75 0 0 1-1.5 0v-2.5a.75.75 0 0 1 1.5 0ZM9 11a1 1 0 1 1-2 0 1 1 0 0 1 2 0Z";
const ICON_STOP: &str = "M4.47.22A.749.749 0 0 1 5 0h6c.199 0 .389.079.53.22l4.25 4.25c.141.14.22.331.22.53v6a.749.749 0 0 1-.22.53l-4.25 4.25A.749.749 0 0 1 11 16H5a.749.749 0 0 1-.53-.22L.22 11.53A.749.749 0 0 1 0 11V5c0-.199.079-.389.22-.53Zm.84 1.28L1.5 5.31v5.38l3.81 3.81h5.38l3.81-3.81V5.31L10.69 1.5ZM8 4a.75.75 0 0 1 .75.75v3.5a.75.75 0 0 1-1.5 0v-3.5A.75.75 0 0 1 8 4Zm0 8a1 1 0 1 1 0-2 1 1 0 0 1 0 2Z";

/// Parser extensions enabled for every document.
pub(crate) fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_GFM
        | Options::ENABLE_MATH
        | Options::ENABLE_FOOTNOTES
}

/// Parse markdown and lower it to a document tree.
pub(crate) fn lower(markdown: &str) -> Result<Node, ParseError> {
    let mut builder = TreeBuilder::default();
    for event in Parser::new_ext(markdown, parser_options()) {
        builder.process_event(event)?;
    }
    Ok(builder.finish())
}

/// Convert heading level enum to numeric value.
fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Table rendering state.
#[derive(Default)]
struct TableState {
    in_head: bool,
    has_body: bool,
    alignments: Vec<Alignment>,
    cell_index: usize,
}

impl TableState {
    fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.has_body = false;
        self.cell_index = 0;
    }

    fn start_head(&mut self) {
        self.in_head = true;
        self.cell_index = 0;
    }

    fn end_head(&mut self) {
        self.in_head = false;
    }

    fn start_row(&mut self) {
        self.cell_index = 0;
    }

    fn next_cell(&mut self) {
        self.cell_index += 1;
    }

    fn current_alignment(&self) -> Option<&'static str> {
        match self.alignments.get(self.cell_index)? {
            Alignment::None => None,
            Alignment::Left => Some("left"),
            Alignment::Center => Some("center"),
            Alignment::Right => Some("right"),
        }
    }
}

/// Footnote references and definitions seen so far.
#[derive(Default)]
struct Footnotes {
    /// Normalized labels in first-reference order.
    order: Vec<String>,
    ref_counts: HashMap<String, usize>,
    definitions: HashMap<String, Vec<Node>>,
}

impl Footnotes {
    /// Register a reference, returning its footnote number and reference count.
    fn reference(&mut self, key: &str) -> (usize, usize) {
        let count = self.ref_counts.entry(key.to_owned()).or_default();
        *count += 1;
        if *count == 1 {
            self.order.push(key.to_owned());
        }
        let count = *count;
        let number = self
            .order
            .iter()
            .position(|label| label == key)
            .map_or(self.order.len(), |index| index + 1);
        (number, count)
    }

    fn define(&mut self, key: String, children: Vec<Node>) {
        self.definitions.entry(key).or_insert(children);
    }

    /// Build the trailing footnotes section. Unreferenced definitions are dropped.
    fn into_section(mut self) -> Option<Element> {
        let mut items = Vec::new();
        for (index, key) in self.order.iter().enumerate() {
            let Some(mut children) = self.definitions.remove(key) else {
                continue;
            };
            let number = index + 1;
            let count = self.ref_counts.get(key).copied().unwrap_or(1);

            let mut backrefs = Vec::new();
            for k in 1..=count {
                let suffix = if k == 1 { String::new() } else { format!("-{k}") };
                let mut link = Element::new("a")
                    .with_property("href", format!("#user-content-fnref-{key}{suffix}"))
                    .with_property("data-footnote-backref", "")
                    .with_property("aria-label", format!("Back to reference {number}{suffix}"))
                    .with_property("class", "data-footnote-backref")
                    .with_child(Node::text("↩"));
                if k > 1 {
                    link = link.with_child(Element::new("sup").with_child(Node::text(k.to_string())));
                }
                backrefs.push(Node::text(" "));
                backrefs.push(link.into());
            }

            match children.last_mut().and_then(Node::as_element_mut) {
                Some(last) if last.tag_name == "p" => last.children.extend(backrefs),
                _ => children.extend(backrefs),
            }

            items.push(
                Element::new("li")
                    .with_property("id", format!("user-content-fn-{key}"))
                    .with_children(children)
                    .into(),
            );
        }

        if items.is_empty() {
            return None;
        }

        Some(
            Element::new("section")
                .with_property("data-footnotes", "")
                .with_property("class", "footnotes")
                .with_child(
                    Element::new("h2")
                        .with_property("class", "sr-only")
                        .with_property("id", "footnote-label")
                        .with_child(Node::text("Footnotes")),
                )
                .with_child(Element::new("ol").with_children(items)),
        )
    }
}

/// Footnote labels match case-insensitively; whitespace is not valid in ids.
fn footnote_key(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

fn alert_element(kind: BlockQuoteKind) -> Element {
    let (class, icon, title) = match kind {
        BlockQuoteKind::Note => ("note", ICON_INFO, "Note"),
        BlockQuoteKind::Tip => ("tip", ICON_LIGHTBULB, "Tip"),
        BlockQuoteKind::Important => ("important", ICON_REPORT, "Important"),
        BlockQuoteKind::Warning => ("warning", ICON_ALERT, "Warning"),
        BlockQuoteKind::Caution => ("caution", ICON_STOP, "Caution"),
    };
    let svg = Element::new("svg")
        .with_property("class", "octicon")
        .with_property("viewBox", "0 0 16 16")
        .with_property("width", "16")
        .with_property("height", "16")
        .with_property("aria-hidden", "true")
        .with_child(Element::new("path").with_property("d", icon));
    Element::new("div")
        .with_classes(["markdown-alert".to_owned(), format!("markdown-alert-{class}")])
        .with_property("dir", "auto")
        .with_child(
            Element::new("p")
                .with_property("class", "markdown-alert-title")
                .with_property("dir", "auto")
                .with_child(svg)
                .with_child(Node::text(title)),
        )
}

/// Language from fence info string (`rust title="x"` → `rust`).
fn fence_language<'a>(kind: &'a CodeBlockKind<'a>) -> Option<&'a str> {
    match kind {
        CodeBlockKind::Fenced(info) => info.split_whitespace().next(),
        CodeBlockKind::Indented => None,
    }
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<Node>,
    /// Open elements, innermost last.
    stack: Vec<Element>,
    table: TableState,
    in_code_block: bool,
    footnotes: Footnotes,
    /// Labels of open footnote definitions.
    definition_keys: Vec<String>,
}

impl TreeBuilder {
    fn process_event(&mut self, event: Event<'_>) -> Result<(), ParseError> {
        match event {
            Event::Start(tag) => self.start_tag(tag)?,
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    self.append_text(&text);
                } else {
                    self.append_text(&replace_shortcodes(&text));
                }
            }
            Event::Code(code) => {
                self.append(Element::new("code").with_child(Node::text(&*code)).into());
            }
            Event::InlineMath(source) => self.append(
                Element::new("code")
                    .with_classes(["language-math", "math-inline"])
                    .with_child(Node::text(&*source))
                    .into(),
            ),
            Event::DisplayMath(source) => self.append(
                Element::new("code")
                    .with_classes(["language-math", "math-display"])
                    .with_child(Node::text(&*source))
                    .into(),
            ),
            Event::Html(html) | Event::InlineHtml(html) => self.append(Node::Raw(html.into_string())),
            Event::SoftBreak | Event::HardBreak => {
                self.append(Element::new("br").into());
                self.append_text("\n");
            }
            Event::Rule => self.append(Element::new("hr").into()),
            Event::TaskListMarker(checked) => self.task_list_marker(checked),
            Event::FootnoteReference(label) => self.footnote_reference(&label),
        }
        Ok(())
    }

    fn start_tag(&mut self, tag: Tag<'_>) -> Result<(), ParseError> {
        let element = match tag {
            Tag::Paragraph => Element::new("p"),
            Tag::Heading { level, .. } => {
                Element::new(format!("h{}", heading_level_to_num(level)))
            }
            Tag::BlockQuote(Some(kind)) => alert_element(kind),
            Tag::BlockQuote(None) => Element::new("blockquote"),
            Tag::CodeBlock(kind) => {
                self.push(Element::new("pre"))?;
                self.in_code_block = true;
                match fence_language(&kind) {
                    Some("math") => Element::new("code").with_classes(["language-math", "math-display"]),
                    Some(lang) => Element::new("code").with_property("class", format!("language-{lang}")),
                    None => Element::new("code"),
                }
            }
            Tag::List(Some(1)) => Element::new("ol"),
            Tag::List(Some(start)) => Element::new("ol").with_property("start", start.to_string()),
            Tag::List(None) => Element::new("ul"),
            Tag::Item => Element::new("li"),
            Tag::FootnoteDefinition(label) => {
                self.definition_keys.push(footnote_key(&label));
                Element::new("li")
            }
            Tag::HtmlBlock | Tag::MetadataBlock(_) => return Ok(()),
            Tag::DefinitionList => Element::new("dl"),
            Tag::DefinitionListTitle => Element::new("dt"),
            Tag::DefinitionListDefinition => Element::new("dd"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                Element::new("table")
            }
            Tag::TableHead => {
                self.table.start_head();
                self.push(Element::new("thead"))?;
                Element::new("tr")
            }
            Tag::TableRow => {
                self.table.start_row();
                if !self.table.has_body {
                    self.table.has_body = true;
                    self.push(Element::new("tbody"))?;
                }
                Element::new("tr")
            }
            Tag::TableCell => {
                let cell = Element::new(if self.table.in_head { "th" } else { "td" });
                match self.table.current_alignment() {
                    Some(align) => cell.with_property("align", align),
                    None => cell,
                }
            }
            Tag::Emphasis => Element::new("em"),
            Tag::Strong => Element::new("strong"),
            Tag::Strikethrough => Element::new("del"),
            Tag::Superscript => Element::new("sup"),
            Tag::Subscript => Element::new("sub"),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                let href = if link_type == LinkType::Email {
                    format!("mailto:{}", &*dest_url)
                } else {
                    dest_url.into_string()
                };
                let link = Element::new("a").with_property("href", href);
                if title.is_empty() {
                    link
                } else {
                    link.with_property("title", title.into_string())
                }
            }
            // Alt text is collected from children and flattened in end_tag.
            Tag::Image {
                dest_url, title, ..
            } => {
                let image = Element::new("img").with_property("src", dest_url.into_string());
                if title.is_empty() {
                    image
                } else {
                    image.with_property("title", title.into_string())
                }
            }
        };
        self.push(element)
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.close();
                self.close();
            }
            TagEnd::TableHead => {
                self.close();
                self.close();
                self.table.end_head();
            }
            TagEnd::TableCell => {
                self.close();
                self.table.next_cell();
            }
            TagEnd::Table => {
                if self.table.has_body {
                    self.close();
                }
                self.close();
            }
            TagEnd::Image => {
                if let Some(mut image) = self.stack.pop() {
                    let alt = image.text_content();
                    let title = image.properties.remove("title");
                    image.children.clear();
                    image.properties.insert("alt", alt);
                    if let Some(title) = title {
                        image.properties.insert("title", title);
                    }
                    self.append(image.into());
                }
            }
            TagEnd::FootnoteDefinition => {
                if let (Some(definition), Some(key)) = (self.stack.pop(), self.definition_keys.pop()) {
                    self.footnotes.define(key, definition.children);
                }
            }
            _ => self.close(),
        }
    }

    fn task_list_marker(&mut self, checked: bool) {
        if let Some(pos) = self.stack.iter().rposition(|el| el.tag_name == "li") {
            self.stack[pos].add_class("task-list-item");
            if let Some(list) = pos.checked_sub(1).and_then(|i| self.stack.get_mut(i)) {
                list.add_class("contains-task-list");
            }
        }
        let mut input = Element::new("input").with_property("type", "checkbox");
        if checked {
            input = input.with_property("checked", "");
        }
        self.append(input.with_property("disabled", "").into());
        self.append_text(" ");
    }

    fn footnote_reference(&mut self, label: &str) {
        let key = footnote_key(label);
        let (number, count) = self.footnotes.reference(&key);
        let suffix = if count == 1 { String::new() } else { format!("-{count}") };
        let link = Element::new("a")
            .with_property("href", format!("#user-content-fn-{key}"))
            .with_property("id", format!("user-content-fnref-{key}{suffix}"))
            .with_property("data-footnote-ref", "")
            .with_property("aria-describedby", "footnote-label")
            .with_child(Node::text(number.to_string()));
        self.append(Element::new("sup").with_child(link).into());
    }

    fn push(&mut self, element: Element) -> Result<(), ParseError> {
        if self.stack.len() >= MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
            });
        }
        self.stack.push(element);
        Ok(())
    }

    /// Pop the innermost element and attach it to its parent.
    fn close(&mut self) {
        if let Some(element) = self.stack.pop() {
            self.append(element.into());
        }
    }

    fn children(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.root,
        }
    }

    fn append(&mut self, node: Node) {
        self.children().push(node);
    }

    /// Append text, merging with a preceding text node.
    fn append_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let children = self.children();
        if let Some(Node::Text(previous)) = children.last_mut() {
            previous.push_str(text);
        } else {
            children.push(Node::text(text));
        }
    }

    fn finish(mut self) -> Node {
        while !self.stack.is_empty() {
            self.close();
        }
        let footnotes = std::mem::take(&mut self.footnotes);
        if let Some(section) = footnotes.into_section() {
            self.root.push(section.into());
        }
        Node::Root(self.root)
    }
}
