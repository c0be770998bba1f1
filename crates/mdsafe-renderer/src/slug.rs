//! Heading identifier assignment.

use std::collections::{HashMap, HashSet};

use mdsafe_tree::{Element, Node};

/// Convert text to URL-safe slug.
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single dash and trims dashes from both ends. Alphanumeric is Unicode-aware,
/// so `Über uns` becomes `über-uns`.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !result.is_empty() {
                result.push('-');
            }
            pending_dash = false;
            result.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    result
}

/// Registry of ids already used in one document.
#[derive(Debug, Default)]
struct Slugger {
    taken: HashSet<String>,
    counts: HashMap<String, usize>,
}

impl Slugger {
    fn reserve(&mut self, id: &str) {
        self.taken.insert(id.to_owned());
    }

    /// Return `base`, or `base-N` with the smallest free N.
    fn unique(&mut self, base: &str) -> String {
        let mut id = base.to_owned();
        while self.taken.contains(&id) {
            let count = self.counts.entry(base.to_owned()).or_default();
            *count += 1;
            id = format!("{base}-{count}");
        }
        self.taken.insert(id.clone());
        id
    }
}

/// Give every `h1`-`h6` without an `id` a unique `prefix + slug(text)` id.
///
/// Ids already present on headings are kept and count as taken.
pub(crate) fn assign_heading_ids(tree: &mut Node, prefix: &str) {
    let mut slugger = Slugger::default();
    reserve_existing(tree, &mut slugger);
    if let Some(children) = tree.children_mut() {
        assign(children, prefix, &mut slugger);
    }
}

fn existing_id(element: &Element) -> Option<String> {
    element
        .properties
        .get("id")
        .map(ToString::to_string)
        .filter(|id| !id.is_empty())
}

fn reserve_existing(node: &Node, slugger: &mut Slugger) {
    if let Some(element) = node.as_element()
        && element.heading_rank().is_some()
        && let Some(id) = existing_id(element)
    {
        slugger.reserve(&id);
    }
    for child in node.children() {
        reserve_existing(child, slugger);
    }
}

fn assign(children: &mut [Node], prefix: &str, slugger: &mut Slugger) {
    for element in children.iter_mut().filter_map(Node::as_element_mut) {
        if element.heading_rank().is_some() && existing_id(element).is_none() {
            let base = format!("{prefix}{}", slugify(&element.visible_text()));
            if !base.is_empty() {
                let id = slugger.unique(&base);
                element.properties.insert("id", id);
            }
        }
        assign(&mut element.children, prefix, slugger);
    }
}
