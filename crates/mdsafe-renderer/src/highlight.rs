//! Syntax highlighting for `pre > code.language-*` blocks.

use std::sync::LazyLock;

use mdsafe_tree::{Element, Node};
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::error::{Stage, TransformError};
use crate::raw::parse_fragment;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// Highlight every fenced code block whose language is known.
///
/// Blocks without a language, with an unknown one, or marked `no-highlight`
/// are left as they are.
pub(crate) fn highlight_code(tree: &mut Node) -> Result<(), TransformError> {
    match tree.children_mut() {
        Some(children) => highlight_children(children),
        None => Ok(()),
    }
}

fn highlight_children(children: &mut [Node]) -> Result<(), TransformError> {
    for element in children.iter_mut().filter_map(Node::as_element_mut) {
        if element.tag_name == "pre" {
            for code in element
                .children
                .iter_mut()
                .filter_map(Node::as_element_mut)
                .filter(|child| child.tag_name == "code")
            {
                highlight_block(code)?;
            }
        } else {
            highlight_children(&mut element.children)?;
        }
    }
    Ok(())
}

/// Language named by a `language-*` or `lang-*` class.
fn block_language(code: &Element) -> Option<&str> {
    let classes = code.classes();
    if classes
        .iter()
        .any(|class| matches!(*class, "no-highlight" | "nohighlight"))
    {
        return None;
    }
    classes.into_iter().find_map(|class| {
        class
            .strip_prefix("language-")
            .or_else(|| class.strip_prefix("lang-"))
    })
}

fn highlight_block(code: &mut Element) -> Result<(), TransformError> {
    let Some(syntax) = block_language(code).and_then(|lang| SYNTAX_SET.find_syntax_by_token(lang))
    else {
        return Ok(());
    };

    let source = code.text_content();
    let mut generator = ClassedHTMLGenerator::new_with_class_style(
        syntax,
        &SYNTAX_SET,
        ClassStyle::SpacedPrefixed { prefix: "hljs-" },
    );
    for line in LinesWithEndings::from(&source) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .map_err(|e| TransformError::new(Stage::Highlight, e.to_string()))?;
    }

    code.children = parse_fragment(&generator.finalize(), Stage::Highlight)?;
    code.add_class("hljs");
    Ok(())
}
