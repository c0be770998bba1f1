//! Allowlist schema.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use mdsafe_tree::PropertyValue;

/// Wildcard key in [`Schema::attributes`]: attributes allowed on every tag.
pub const WILDCARD: &str = "*";

const ARIA: &[&str] = &["aria-describedby", "aria-label", "aria-labelledby"];

/// Tags of the GitHub-style base schema.
const BASE_TAG_NAMES: &[&str] = &[
    "a", "b", "blockquote", "br", "code", "dd", "del", "details", "div", "dl", "dt", "em", "h1",
    "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "input", "ins", "kbd", "li", "ol", "p",
    "picture", "pre", "q", "rp", "rt", "ruby", "s", "samp", "section", "source", "span",
    "strike", "strong", "sub", "summary", "sup", "table", "tbody", "td", "tfoot", "th", "thead",
    "tr", "tt", "ul", "var",
];

/// Attributes the base schema allows on every tag.
const BASE_WILDCARD_ATTRIBUTES: &[&str] = &[
    "abbr", "accept", "accept-charset", "accesskey", "action", "align", "alt", "axis", "border",
    "cellpadding", "cellspacing", "char", "charoff", "charset", "checked", "clear", "colspan",
    "color", "cols", "compact", "coords", "datetime", "dir", "enctype", "frame", "hspace",
    "headers", "height", "hreflang", "for", "id", "ismap", "itemprop", "label", "lang",
    "maxlength", "media", "method", "multiple", "name", "nohref", "noshade", "nowrap", "open",
    "prompt", "readonly", "rev", "rowspan", "rows", "rules", "scope", "selected", "shape", "size",
    "span", "start", "summary", "tabindex", "title", "usemap", "valign", "value", "width",
];

/// Tags added for GFM, MathML and SVG output.
const EXTENDED_TAG_NAMES: &[&str] = &[
    // GFM
    "input", "details", "summary", "del", "ins", "section", "aside",
    // MathML
    "math", "semantics", "mrow", "mi", "mo", "mn", "msup", "msub", "mfrac", "munder", "mover",
    "munderover", "mtable", "mtr", "mtd", "mspace", "mtext", "annotation", "mstyle", "merror",
    "mpadded", "mphantom", "menclose", "msubsup", "msqrt", "mroot",
    // SVG
    "svg", "g", "path", "rect", "circle", "ellipse", "line", "polyline", "polygon", "text",
    "tspan", "defs", "marker", "use",
];

/// Per-tag attributes of the extended schema. Entries replace base entries for
/// the same tag.
const EXTENDED_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "title", "target", "rel"]),
    ("img", &["src", "alt", "title", "width", "height", "loading", "decoding"]),
    ("input", &["type", "disabled", "checked"]),
    ("th", &["scope", "colspan", "rowspan", "headers"]),
    ("td", &["colspan", "rowspan", "headers"]),
    ("table", &["summary"]),
    ("details", &["open"]),
    ("code", &["class"]),
    ("span", &["class"]),
    ("pre", &["class"]),
    // SVG
    ("svg", &["width", "height", "viewBox", "xmlns", "fill", "stroke", "preserveAspectRatio"]),
    ("g", &["transform", "fill", "stroke"]),
    ("path", &["d", "fill", "stroke", "stroke-width"]),
    ("rect", &["x", "y", "width", "height", "fill", "stroke"]),
    ("circle", &["cx", "cy", "r", "fill", "stroke"]),
    ("ellipse", &["cx", "cy", "rx", "ry", "fill", "stroke"]),
    ("line", &["x1", "y1", "x2", "y2", "stroke"]),
    ("text", &["x", "y", "fill", "font-size", "text-anchor"]),
    ("tspan", &["x", "y", "dx", "dy", "rotate", "textLength", "lengthAdjust"]),
    ("defs", &["id"]),
    (
        "marker",
        &["id", "viewBox", "refX", "refY", "markerUnits", "markerWidth", "markerHeight", "orient"],
    ),
    ("use", &["href"]),
    // MathML
    ("math", &["xmlns", "display"]),
    ("mrow", &["mathcolor", "mathbackground"]),
    ("mi", &["mathvariant", "mathcolor"]),
    (
        "mo",
        &["form", "fence", "separator", "lspace", "rspace", "stretchy", "symmetric", "maxsize", "minsize"],
    ),
    ("mn", &["mathvariant", "mathcolor"]),
    ("mfrac", &["linethickness", "numalign", "denomalign"]),
    ("msup", &["superscriptshift"]),
    ("msub", &["subscriptshift"]),
    ("mspace", &["width", "height", "depth"]),
    ("menclose", &["notation"]),
    ("mpadded", &["width", "height", "depth", "lspace", "rspace"]),
];

static DEFAULT_SCHEMA: LazyLock<Schema> = LazyLock::new(Schema::markdown);

/// The process-wide schema used by the markdown pipeline.
pub fn default_schema() -> &'static Schema {
    &DEFAULT_SCHEMA
}

/// Allowlist configuration for [`sanitize`](crate::sanitize).
#[derive(Clone, Debug, Default)]
pub struct Schema {
    /// Permitted tag names.
    pub tag_names: HashSet<String>,
    /// Permitted attributes per tag; the [`WILDCARD`] entry applies to all tags.
    pub attributes: HashMap<String, HashSet<String>>,
    /// Permitted URL schemes per attribute.
    pub protocols: HashMap<String, Vec<String>>,
    /// Tags removed together with their whole subtree.
    pub strip: HashSet<String>,
    /// Attributes whose values get [`clobber_prefix`](Self::clobber_prefix).
    pub clobber: HashSet<String>,
    /// Prefix applied to clobber-prone attribute values.
    pub clobber_prefix: String,
    /// Tags that are only valid below one of the listed ancestors.
    pub ancestors: HashMap<String, Vec<String>>,
    /// Attributes added to a tag when missing.
    pub required: HashMap<String, Vec<(String, PropertyValue)>>,
    /// Whether comments survive.
    pub allow_comments: bool,
}

impl Schema {
    /// GitHub-style base schema.
    ///
    /// `script` is stripped with its content, ids and names are prefixed with
    /// `user-content-` and only a conservative set of protocols is allowed.
    pub fn github() -> Self {
        let mut attributes: HashMap<String, HashSet<String>> = HashMap::new();
        let mut allow = |tag: &str, names: &[&str]| {
            attributes
                .entry(tag.to_owned())
                .or_default()
                .extend(names.iter().map(|name| (*name).to_owned()));
        };

        allow(WILDCARD, BASE_WILDCARD_ATTRIBUTES);
        allow("a", ARIA);
        allow("a", &["data-footnote-backref", "data-footnote-ref", "class", "href"]);
        allow("blockquote", &["cite"]);
        allow("code", &["class"]);
        allow("del", &["cite"]);
        allow("div", &["itemscope", "itemtype"]);
        allow("dl", ARIA);
        allow("h2", &["class"]);
        allow("img", ARIA);
        allow("img", &["longdesc", "src"]);
        allow("input", &["disabled", "type"]);
        allow("ins", &["cite"]);
        allow("li", &["class"]);
        allow("ol", ARIA);
        allow("ol", &["class"]);
        allow("q", &["cite"]);
        allow("section", &["data-footnotes", "class"]);
        allow("source", &["srcset"]);
        allow("summary", ARIA);
        allow("table", ARIA);
        allow("ul", ARIA);
        allow("ul", &["class"]);

        let table_only = vec!["table".to_owned()];
        let ancestors = ["tbody", "td", "tfoot", "th", "thead", "tr"]
            .into_iter()
            .map(|tag| (tag.to_owned(), table_only.clone()))
            .collect();

        Self {
            tag_names: to_set(BASE_TAG_NAMES),
            attributes,
            protocols: [
                ("cite", &["http", "https"][..]),
                ("href", &["http", "https", "irc", "ircs", "mailto", "xmpp"][..]),
                ("longdesc", &["http", "https"][..]),
                ("src", &["http", "https"][..]),
            ]
            .into_iter()
            .map(|(attribute, schemes)| (attribute.to_owned(), to_vec(schemes)))
            .collect(),
            strip: to_set(&["script"]),
            clobber: to_set(&["aria-describedby", "aria-labelledby", "id", "name"]),
            clobber_prefix: "user-content-".to_owned(),
            ancestors,
            required: HashMap::from([(
                "input".to_owned(),
                vec![
                    ("disabled".to_owned(), PropertyValue::from("")),
                    ("type".to_owned(), PropertyValue::from("checkbox")),
                ],
            )]),
            allow_comments: false,
        }
    }

    /// Schema for rendered markdown: the base schema extended with GFM,
    /// KaTeX MathML, highlighter and SVG markup.
    ///
    /// `class` is allowed on every tag, `style` on none. Nothing is stripped
    /// wholesale and ids are left unprefixed so heading anchors keep working.
    pub fn markdown() -> Self {
        let mut schema = Self::github();

        schema.tag_names.extend(to_set(EXTENDED_TAG_NAMES));

        schema
            .attributes
            .entry(WILDCARD.to_owned())
            .or_default()
            .extend(to_set(&["id", "class", "title", "dir", "lang"]));
        for (tag, names) in EXTENDED_ATTRIBUTES {
            schema.attributes.insert((*tag).to_owned(), to_set(names));
        }

        schema.protocols = HashMap::from([
            ("href".to_owned(), to_vec(&["http", "https", "mailto", "tel"])),
            ("src".to_owned(), to_vec(&["http", "https", "data"])),
        ]);
        schema.strip.clear();
        schema.clobber.clear();
        schema.clobber_prefix.clear();
        schema
    }

    /// Whether the tag name is in the allowlist.
    pub fn allows_tag(&self, tag_name: &str) -> bool {
        self.tag_names.contains(tag_name)
    }

    /// Whether the attribute is allowed on the tag (directly or via `*`).
    pub fn allows_attribute(&self, tag_name: &str, attribute: &str) -> bool {
        [tag_name, WILDCARD].iter().any(|key| {
            self.attributes
                .get(*key)
                .is_some_and(|names| names.contains(attribute))
        })
    }

    /// Whether the ancestor requirement of the tag is met by the open-tag stack.
    pub fn allows_ancestry(&self, tag_name: &str, stack: &[String]) -> bool {
        self.ancestors.get(tag_name).is_none_or(|required| {
            required
                .iter()
                .any(|ancestor| stack.iter().any(|open| open == ancestor))
        })
    }

    /// Whether the attribute value uses a permitted URL scheme.
    ///
    /// Attributes without a protocol entry and values without an explicit
    /// scheme (relative references) are always permitted.
    pub fn allows_protocol(&self, attribute: &str, value: &PropertyValue) -> bool {
        let Some(allowed) = self.protocols.get(attribute) else {
            return true;
        };
        if allowed.is_empty() {
            return true;
        }
        let value = value.to_string();
        match url_scheme(&value) {
            Some(scheme) => allowed
                .iter()
                .any(|protocol| protocol.eq_ignore_ascii_case(scheme)),
            None => true,
        }
    }
}

/// Explicit scheme of a URL: the text before the first `:` when that colon
/// precedes any `/`, `?` or `#`.
pub(crate) fn url_scheme(value: &str) -> Option<&str> {
    let colon = value.find(':')?;
    let scheme = &value[..colon];
    if scheme.contains(['/', '?', '#']) {
        None
    } else {
        Some(scheme)
    }
}

fn to_set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

fn to_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}
