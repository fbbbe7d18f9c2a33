//! Display titles derived from item directory names.
//!
//! Item directories are named like slugs (`my-cool-demo`, `gpt_notes`). When no
//! declared title exists, the directory name is turned into a display title:
//! dashes and underscores become spaces and every word starts upper-case.
//!
//! - `my-cool-demo` → "My Cool Demo"
//! - `gpt_notes` → "Gpt Notes"
//! - `v2-release.notes` → "V2 Release.Notes"

/// Convert a directory name into a human-cased title.
///
/// A "word" starts at any ASCII letter or digit that does not follow another
/// ASCII letter or digit, so punctuation other than `-`/`_` also starts a new
/// word. Non-ASCII characters are kept as-is.
pub fn title_from_slug(name: &str) -> String {
    let spaced = name.replace(['-', '_'], " ");
    let mut title = String::with_capacity(spaced.len());
    let mut prev_word_char = false;
    for c in spaced.chars() {
        let word_char = c.is_ascii_alphanumeric();
        if word_char && !prev_word_char {
            title.push(c.to_ascii_uppercase());
        } else {
            title.push(c);
        }
        prev_word_char = word_char;
    }
    title
}

/// Default description for an item without a declared one.
pub fn default_description(title: &str) -> String {
    format!("{title} Demo")
}
