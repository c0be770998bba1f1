//! Allowlist sanitizer for mdsafe document trees.
//!
//! The [`Schema`] enumerates which tags, attributes and URL protocols may
//! survive. [`sanitize`] filters a tree against it in place:
//!
//! - tags in `strip` are removed together with their subtree
//! - unknown tags are replaced by their (sanitized) children
//! - attributes not listed for the tag or for `*` are dropped
//! - URL attributes with a non-allowed scheme are dropped
//! - comments are dropped
//!
//! [`default_schema`] returns the process-wide schema used by the markdown
//! pipeline. It is built once on first use and never mutated afterwards.
//!
//! # Example
//!
//! ```
//! use mdsafe_sanitize::{default_schema, sanitize};
//! use mdsafe_tree::{Element, Node};
//!
//! let mut tree = Node::Root(vec![
//!     Element::new("a")
//!         .with_property("href", "javascript:alert(1)")
//!         .with_property("onclick", "steal()")
//!         .with_child(Node::text("click"))
//!         .into(),
//! ]);
//!
//! sanitize(&mut tree, default_schema());
//! assert_eq!(tree.to_html(), "<a>click</a>");
//! ```

mod sanitizer;
mod schema;

pub use sanitizer::sanitize;
pub use schema::{Schema, default_schema};
