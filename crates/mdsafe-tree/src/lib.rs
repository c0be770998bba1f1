//! Owned document tree shared by every stage of the mdsafe pipeline.
//!
//! The tree mirrors a small subset of the HTML DOM: a [`Node::Root`] holding
//! [`Node::Element`]s, text, opaque raw HTML and comments. Each node exclusively
//! owns its children, so stages walk the tree recursively and mutate it in place
//! without back-pointers.
//!
//! # Example
//!
//! ```
//! use mdsafe_tree::{Element, Node};
//!
//! let tree = Node::Root(vec![
//!     Element::new("h2")
//!         .with_property("id", "h-intro")
//!         .with_child(Node::text("Intro"))
//!         .into(),
//! ]);
//!
//! assert_eq!(tree.to_html(), r#"<h2 id="h-intro">Intro</h2>"#);
//! assert_eq!(tree.text_content(), "Intro");
//! ```

mod html;
mod node;
mod properties;

pub use html::{escape_html, is_void_element};
pub use node::{Element, Node};
pub use properties::{Properties, PropertyValue};
