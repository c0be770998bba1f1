//! Math placeholders to MathML.
//!
//! Inline math arrives as `code.math-inline`, display math as
//! `code.math-display` or `pre > code.language-math`. Each placeholder is
//! replaced by a `span.katex` (or `span.katex-display > span.katex`) holding a
//! `math` element whose `semantics` carry the TeX source as an annotation.

use latex2mathml::{DisplayStyle, latex_to_mathml};
use mdsafe_tree::{Element, Node};

use crate::error::{Stage, TransformError};
use crate::raw::parse_fragment;
use crate::tex;

const MATH_CLASSES: [&str; 3] = ["language-math", "math-inline", "math-display"];

/// Emitted by the converter in place of tokens it cannot place.
const PARSE_ERROR_MARKER: &str = "[PARSE ERROR";

/// Name of the unknown command in a converter parse error, if any.
fn undefined_command(error: &str) -> Option<&str> {
    const OPEN: &str = r#"Command(\""#;
    let start = error.find(OPEN)? + OPEN.len();
    let len = error[start..].find('\\')?;
    Some(&error[start..start + len])
}

/// Replace every math placeholder in the tree with rendered MathML.
pub(crate) fn render_math(tree: &mut Node) -> Result<(), TransformError> {
    match tree.children_mut() {
        Some(children) => render_children(children),
        None => Ok(()),
    }
}

fn render_children(children: &mut [Node]) -> Result<(), TransformError> {
    for child in children {
        let Node::Element(element) = child else {
            continue;
        };
        if let Some((source, display)) = math_source(element) {
            *child = render_formula(&source, display)?.into();
        } else {
            render_children(&mut element.children)?;
        }
    }
    Ok(())
}

fn is_math_code(element: &Element) -> bool {
    element.tag_name == "code" && MATH_CLASSES.iter().any(|class| element.has_class(class))
}

/// TeX source and display mode of a math placeholder.
fn math_source(element: &Element) -> Option<(String, bool)> {
    if is_math_code(element) {
        return Some((element.text_content(), element.has_class("math-display")));
    }
    if element.tag_name != "pre" {
        return None;
    }
    let mut code = element.children.iter().filter_map(Node::as_element);
    match (code.next(), code.next()) {
        (Some(code), None) if is_math_code(code) => Some((code.text_content(), true)),
        _ => None,
    }
}

fn render_formula(source: &str, display: bool) -> Result<Element, TransformError> {
    let source = source.trim();
    let style = if display {
        DisplayStyle::Block
    } else {
        DisplayStyle::Inline
    };
    let prepared = tex::prepare(source)
        .map_err(|e| TransformError::new(Stage::Math, format!("{e} in `{source}`")))?;
    let mathml = latex_to_mathml(&prepared, style)
        .map_err(|e| TransformError::new(Stage::Math, format!("{e} in `{source}`")))?;
    if let Some(at) = mathml.find(PARSE_ERROR_MARKER) {
        let message = match undefined_command(&mathml[at..]) {
            Some(command) => format!("unknown command `\\{command}` in `{source}`"),
            None => format!("unsupported syntax in `{source}`"),
        };
        return Err(TransformError::new(Stage::Math, message));
    }

    let mut math = parse_fragment(&mathml, Stage::Math)?
        .into_iter()
        .find_map(|node| match node {
            Node::Element(element) if element.tag_name == "math" => Some(element),
            _ => None,
        })
        .ok_or_else(|| TransformError::new(Stage::Math, format!("no MathML produced for `{source}`")))?;

    let body = std::mem::take(&mut math.children);
    math.children = vec![
        Element::new("semantics")
            .with_child(Element::new("mrow").with_children(body))
            .with_child(
                Element::new("annotation")
                    .with_property("encoding", "application/x-tex")
                    .with_child(Node::text(source)),
            )
            .into(),
    ];

    let katex = Element::new("span")
        .with_property("class", "katex")
        .with_child(math);
    if display {
        Ok(Element::new("span")
            .with_property("class", "katex-display")
            .with_child(katex))
    } else {
        Ok(katex)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn inline(source: &str) -> Node {
        Element::new("code")
            .with_classes(["language-math", "math-inline"])
            .with_child(Node::text(source))
            .into()
    }

    #[test]
    fn test_inline_math() {
        let mut tree = Node::Root(vec![Element::new("p").with_child(inline("x")).into()]);
        render_math(&mut tree).unwrap();
        let html = tree.to_html();
        assert!(html.starts_with(r#"<p><span class="katex"><math"#), "{html}");
        assert!(html.contains("<semantics><mrow>"));
        assert!(html.contains("<mi>x</mi>"));
        assert!(html.ends_with(
            r#"<annotation encoding="application/x-tex">x</annotation></semantics></math></span></p>"#
        ));
    }

    #[test]
    fn test_display_math_in_pre() {
        let mut tree = Node::Root(vec![
            Element::new("pre")
                .with_child(
                    Element::new("code")
                        .with_classes(["language-math", "math-display"])
                        .with_child(Node::text("a+b\n")),
                )
                .into(),
        ]);
        render_math(&mut tree).unwrap();
        let html = tree.to_html();
        assert!(html.starts_with(r#"<span class="katex-display"><span class="katex"><math"#));
        assert!(!html.contains("<pre>"));
        assert!(html.contains(">a+b</annotation>"));
    }

    #[test]
    fn test_math_fence_without_display_class() {
        let mut tree = Node::Root(vec![
            Element::new("pre")
                .with_child(
                    Element::new("code")
                        .with_property("class", "language-math")
                        .with_child(Node::text("y")),
                )
                .into(),
        ]);
        render_math(&mut tree).unwrap();
        assert!(tree.to_html().starts_with(r#"<span class="katex-display">"#));
    }

    #[test]
    fn test_plain_code_untouched() {
        let mut tree = Node::Root(vec![
            Element::new("pre")
                .with_child(
                    Element::new("code")
                        .with_property("class", "language-rust")
                        .with_child(Node::text("let x = 1;")),
                )
                .into(),
        ]);
        let before = tree.clone();
        render_math(&mut tree).unwrap();
        assert_eq!(tree, before);
    }

    fn render_inline(source: &str) -> Result<String, TransformError> {
        let mut tree = Node::Root(vec![inline(source)]);
        render_math(&mut tree)?;
        Ok(tree.to_html())
    }

    #[test]
    fn test_katex_aliases_render() {
        let html = render_inline(r"x \le y").unwrap();
        assert!(html.contains("<mo>≤</mo>"), "{html}");
        assert!(!html.contains("PARSE ERROR"));
        assert!(html.contains(r">x \le y</annotation>"), "{html}");

        for source in [r"\mathcal{O}(n)", r"\lvert x \rvert", r"\dfrac{1}{2}", r"\displaystyle\sum_i x_i"] {
            let html = render_inline(source).unwrap();
            assert!(!html.contains("PARSE ERROR"), "{source}: {html}");
        }
    }

    #[test]
    fn test_unknown_command_is_an_error() {
        let err = render_inline(r"\notacommand x").unwrap_err();
        assert_eq!(err.stage, Stage::Math);
        assert!(err.message.contains(r"\notacommand"), "{}", err.message);

        let err = render_inline("a & b").unwrap_err();
        assert_eq!(err.stage, Stage::Math);
        assert!(err.message.starts_with("unsupported syntax"), "{}", err.message);
    }

    #[test]
    fn test_environments_render() {
        for source in [
            r"f(x) = \begin{cases} 1 & x > 0 \\ 0 & x \le 0 \end{cases}",
            r"\begin{aligned} a &= b \\ c &= d \end{aligned}",
            r"\begin{array}{cc} a & b \\ c & d \end{array}",
            r"\begin{pmatrix} 1 & 0 \\ 0 & 1 \end{pmatrix}",
        ] {
            let html = render_inline(source).unwrap();
            assert!(html.contains("<mtable"), "{source}: {html}");
            assert!(!html.contains("PARSE ERROR"), "{source}: {html}");
        }
    }

    #[test]
    fn test_unknown_environment_is_an_error() {
        let err = render_inline(r"\begin{tikzcd} a \end{tikzcd}").unwrap_err();
        assert_eq!(err.stage, Stage::Math);
        assert!(err.message.contains("tikzcd"), "{}", err.message);
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        for depth in [100, 5000] {
            let source = format!("{}x{}", "{".repeat(depth), "}".repeat(depth));
            let err = render_inline(&source).unwrap_err();
            assert_eq!(err.stage, Stage::Math);
        }
        let err = render_inline(&r"\sqrt".repeat(5000)).unwrap_err();
        assert_eq!(err.stage, Stage::Math);
    }

    #[test]
    fn test_middle_without_delimiter_is_an_error() {
        let err = render_inline(r"\left( a \middle x \right)").unwrap_err();
        assert_eq!(err.stage, Stage::Math);
        assert!(render_inline(r"\left( a \middle| b \right)").is_ok());
    }

    #[test]
    fn test_invalid_tex_is_an_error() {
        let mut tree = Node::Root(vec![inline(r"\frac{a}{b")]);
        let err = render_math(&mut tree).unwrap_err();
        assert_eq!(err.stage, Stage::Math);
    }
}
