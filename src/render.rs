//! Preview pages for items that have no build output of their own.
//!
//! Code snippets get a page showing one source file; markdown, chat and
//! research items get their main document rendered through a deliberately
//! small formatter. Pages are built with [maud](https://maud.lambda.xyz/),
//! so every interpolated value is escaped unless wrapped in `PreEscaped`.
//!
//! ## Inline formatter
//!
//! Not a markdown implementation. A fixed, ordered list of substitutions is
//! applied once each:
//!
//! | Input | Output |
//! |-------|--------|
//! | `### x` | `<h3>x</h3>` |
//! | `## x` | `<h2>x</h2>` |
//! | `# x` | `<h1>x</h1>` |
//! | `**x**` | `<strong>x</strong>` |
//! | `*x*` | `<em>x</em>` |
//! | `` `x` `` | `<code>x</code>` |
//!
//! Every blank-line-separated block then becomes a `<p>` element, headings
//! included. Raw HTML in the source passes through.

use crate::types::ResolvedMetadata;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use regex::Regex;
use std::sync::LazyLock;

const CODE_CSS: &str = include_str!("../static/code-preview.css");
const DOCUMENT_CSS: &str = include_str!("../static/document.css");

/// Link target for "back to the gallery".
const GALLERY_ROOT: &str = "/";

static INLINE_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?m)^### (.*)$", "<h3>${1}</h3>"),
        (r"(?m)^## (.*)$", "<h2>${1}</h2>"),
        (r"(?m)^# (.*)$", "<h1>${1}</h1>"),
        (r"\*\*(.+?)\*\*", "<strong>${1}</strong>"),
        (r"\*(.+?)\*", "<em>${1}</em>"),
        (r"`([^`]+)`", "<code>${1}</code>"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("inline rule patterns are valid"),
            replacement,
        )
    })
    .collect()
});

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("blank-line pattern is valid"));

/// Render a markdown-ish document into an HTML fragment.
pub fn render_inline_markup(source: &str) -> String {
    let mut text = source.replace("\r\n", "\n");
    for (pattern, replacement) in INLINE_RULES.iter() {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }

    BLANK_LINES
        .split(&text)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(|block| format!("<p>{block}</p>"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn base_document(title: &str, css: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(css)) }
            }
            body {
                (content)
            }
        }
    }
}

/// Preview page for a code snippet showing one source file.
pub fn code_preview_page(meta: &ResolvedMetadata, file: &str, source: &str) -> Markup {
    let content = html! {
        h1 { (meta.title) }
        p.meta { (meta.description) }
        p.meta { "File: " (file) }
        pre {
            code { (source) }
        }
        p {
            a href=(GALLERY_ROOT) { "← Back to gallery" }
        }
    };
    base_document(&meta.title, CODE_CSS, content)
}

/// Page wrapping a rendered document fragment.
pub fn document_page(meta: &ResolvedMetadata, fragment: &str) -> Markup {
    let content = html! {
        div.meta {
            a href=(GALLERY_ROOT) { "← Back to gallery" }
            " | "
            (meta.created_at.format("%Y-%m-%d").to_string())
        }
        (PreEscaped(fragment))
    };
    base_document(&meta.title, DOCUMENT_CSS, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DemoType;
    use chrono::NaiveDate;

    fn meta(title: &str) -> ResolvedMetadata {
        ResolvedMetadata {
            slug: "demo".to_string(),
            title: title.to_string(),
            description: "A <small> demo".to_string(),
            demo_type: DemoType::Markdown,
            tags: vec![],
            created_at: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            updated_at: None,
            author: None,
            thumbnail: None,
            featured: false,
            tech_stack: None,
            config: None,
            external_links: None,
        }
    }

    // =========================================================================
    // Inline formatter
    // =========================================================================

    #[test]
    fn headings_levels_one_to_three() {
        assert_eq!(render_inline_markup("# One"), "<p><h1>One</h1></p>");
        assert_eq!(render_inline_markup("## Two"), "<p><h2>Two</h2></p>");
        assert_eq!(render_inline_markup("### Three"), "<p><h3>Three</h3></p>");
    }

    #[test]
    fn deeper_headings_are_not_formatted() {
        assert_eq!(render_inline_markup("#### Four"), "<p>#### Four</p>");
    }

    #[test]
    fn bold_italic_and_code() {
        assert_eq!(
            render_inline_markup("**bold** and *it* with `x*y*z`"),
            "<p><strong>bold</strong> and <em>it</em> with <code>x<em>y</em>z</code></p>"
        );
    }

    #[test]
    fn two_bold_spans_on_one_line_stay_separate() {
        assert_eq!(
            render_inline_markup("**a** then **b**"),
            "<p><strong>a</strong> then <strong>b</strong></p>"
        );
    }

    #[test]
    fn blank_lines_split_paragraphs() {
        assert_eq!(
            render_inline_markup("first line\nsame para\n\n  \nsecond"),
            "<p>first line\nsame para</p>\n<p>second</p>"
        );
    }

    #[test]
    fn every_block_is_wrapped_including_headings() {
        assert_eq!(
            render_inline_markup("# Title\n\nbody"),
            "<p><h1>Title</h1></p>\n<p>body</p>"
        );
        assert_eq!(
            render_inline_markup("# Title\n\n## Sub\ntext"),
            "<p><h1>Title</h1></p>\n<p><h2>Sub</h2>\ntext</p>"
        );
    }

    #[test]
    fn crlf_input_is_normalized() {
        assert_eq!(
            render_inline_markup("# Title\r\n\r\nbody"),
            "<p><h1>Title</h1></p>\n<p>body</p>"
        );
    }

    #[test]
    fn empty_document_renders_nothing() {
        assert_eq!(render_inline_markup("\n\n  \n"), "");
    }

    // =========================================================================
    // Pages
    // =========================================================================

    #[test]
    fn code_preview_escapes_source_and_metadata() {
        let page = code_preview_page(&meta("Sorter"), "src/sort.py", "if a < b && c > d:\n    pass")
            .into_string();
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Sorter</title>"));
        assert!(page.contains("if a &lt; b &amp;&amp; c &gt; d:"));
        assert!(page.contains("A &lt;small&gt; demo"));
        assert!(page.contains("File: src/sort.py"));
        assert!(page.contains(r#"href="/""#));
    }

    #[test]
    fn document_page_embeds_fragment_and_date() {
        let page = document_page(&meta("Essay"), "<h1>Hello</h1>").into_string();
        assert!(page.contains("<title>Essay</title>"));
        assert!(page.contains("<h1>Hello</h1>"));
        assert!(page.contains("2024-01-15"));
    }
}
