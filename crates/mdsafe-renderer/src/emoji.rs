//! Emoji shortcode replacement (`:smile:` → 😄).

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static SHORTCODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":(\+1|-1|[A-Za-z0-9_-]+):").expect("shortcode pattern is valid")
});

/// Replace known gemoji shortcodes in `text`. Unknown shortcodes are kept.
pub(crate) fn replace_shortcodes(text: &str) -> Cow<'_, str> {
    if !text.contains(':') {
        return Cow::Borrowed(text);
    }
    SHORTCODE.replace_all(text, |caps: &Captures<'_>| {
        match emojis::get_by_shortcode(&caps[1]) {
            Some(emoji) => emoji.as_str().to_owned(),
            None => caps[0].to_owned(),
        }
    })
}
