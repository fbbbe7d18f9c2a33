//! CLI output formatting for all pipeline stages.
//!
//! Each item leads with its positional index and title (or slug), with
//! details on indented context lines, so the output reads as an inventory of
//! the content root.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Items
//! 001 markdown-essay (2 files)
//!     Source: demos/markdown-essay/
//! ```
//!
//! ## Check
//!
//! ```text
//! Demos
//! 001 Particle Simulation (web-app, featured)
//!     Slug: particle-sim
//!     Created: 2024-03-01
//!     Tags: canvas, physics
//! ```
//!
//! ## Build
//!
//! ```text
//! Building particle-sim (web-app)
//!     Done → demos/particle-sim (5230ms)
//! Building sorting-snippet (code-snippet)
//!     Failed: IO error: permission denied
//!
//! Built 1 of 2 demos, 1 failed
//!     sorting-snippet: IO error: permission denied
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::events::Event;
use crate::pipeline::RunSummary;
use crate::scan::ScannedItem;
use crate::types::ResolvedMetadata;
use std::path::Path;

/// Lines of a failed install's stderr shown in the warning.
const STDERR_TAIL: usize = 5;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Last few non-empty lines of a command's stderr, indented.
fn stderr_tail(stderr: &str, indent: &str) -> Vec<String> {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let skip = lines.len().saturating_sub(STDERR_TAIL);
    lines[skip..]
        .iter()
        .map(|l| format!("{indent}{}", l.trim_end()))
        .collect()
}

// ============================================================================
// Scan
// ============================================================================

/// Format discovered items with their file counts and source directories.
pub fn format_scan_output(items: &[ScannedItem], content_root: &Path) -> Vec<String> {
    let mut lines = vec!["Items".to_string()];
    if items.is_empty() {
        lines.push(format!("    (none found in {})", content_root.display()));
        return lines;
    }
    for (i, item) in items.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            item.name,
            plural(item.files.len(), "file")
        ));
        let source = item
            .root
            .strip_prefix(content_root)
            .unwrap_or(item.root.as_path());
        lines.push(format!(
            "    Source: {}/{}/",
            content_root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            source.display()
        ));
    }
    lines
}

pub fn print_scan_output(items: &[ScannedItem], content_root: &Path) {
    for line in format_scan_output(items, content_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format resolved metadata, one entity per item.
pub fn format_check_output(metadata: &[ResolvedMetadata]) -> Vec<String> {
    let mut lines = vec!["Demos".to_string()];
    for (i, meta) in metadata.iter().enumerate() {
        let featured = if meta.featured { ", featured" } else { "" };
        lines.push(format!(
            "{} {} ({}{})",
            format_index(i + 1),
            meta.title,
            meta.demo_type,
            featured
        ));
        lines.push(format!("    Slug: {}", meta.slug));
        lines.push(format!("    Created: {}", meta.created_at));
        if !meta.tags.is_empty() {
            lines.push(format!("    Tags: {}", meta.tags.join(", ")));
        }
        if let Some(language) = meta.config.as_ref().and_then(|c| c.language.as_deref()) {
            lines.push(format!("    Language: {language}"));
        }
    }
    lines
}

pub fn print_check_output(metadata: &[ResolvedMetadata]) {
    for line in format_check_output(metadata) {
        println!("{}", line);
    }
}

// ============================================================================
// Events
// ============================================================================

/// Format a single pipeline event as display lines.
pub fn format_event(event: &Event) -> Vec<String> {
    match event {
        Event::ItemDiscovered { slug, file_count } => {
            vec![format!("Found {} ({})", slug, plural(*file_count, "file"))]
        }
        Event::ItemSkipped { slug } => {
            vec![format!("Skipped {slug} (no content files)")]
        }
        Event::SourceRejected {
            slug,
            source,
            reason,
        } => vec![format!(
            "Warning: {slug}: ignoring {}: {reason}",
            source.label()
        )],
        Event::FieldRejected {
            slug,
            field,
            reason,
        } => vec![format!("Warning: {slug}: ignoring {field}: {reason}")],
        Event::MetadataResolved {
            slug,
            demo_type,
            source,
        } => vec![format!(
            "Resolved {slug} as {demo_type} (from {})",
            source.label()
        )],
        Event::MetadataMissing { slug } => {
            vec![format!("Warning: {slug}: no metadata, not built")]
        }
        Event::BuildStarted {
            slug, demo_type, ..
        } => vec![format!("Building {slug} ({demo_type})")],
        Event::InstallWarning { stderr, .. } => {
            let mut lines = vec!["    Warning: install failed, building anyway".to_string()];
            lines.extend(stderr_tail(stderr, "        "));
            lines
        }
        Event::BuildFinished { result, .. } => match &result.error {
            None => vec![format!(
                "    Done \u{2192} {} ({}ms)",
                result.output_path, result.duration_ms
            )],
            Some(error) => vec![format!("    Failed: {error}")],
        },
        Event::IndexWritten { path, total, tags } => vec![format!(
            "Index \u{2192} {} ({}, {})",
            path.display(),
            plural(*total, "demo"),
            plural(*tags, "tag")
        )],
        Event::GalleryBuilt { dir } => vec![format!("Gallery built: {}", dir.display())],
        Event::GallerySkipped { dir } => {
            vec![format!("Gallery skipped: {} not found", dir.display())]
        }
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Format the end-of-run summary: counts, then each failure with its error.
pub fn format_summary(summary: &RunSummary) -> Vec<String> {
    let total = summary.results.len();
    let failed: Vec<_> = summary.failures().collect();

    let mut lines = vec![if failed.is_empty() {
        format!("Built {}", plural(total, "demo"))
    } else {
        format!(
            "Built {} of {}, {} failed",
            summary.succeeded(),
            plural(total, "demo"),
            failed.len()
        )
    }];
    for result in failed {
        lines.push(format!(
            "    {}: {}",
            result.slug,
            result.error.as_deref().unwrap_or("unknown error")
        ));
    }
    lines
}

pub fn print_summary(summary: &RunSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuildResult;
    use crate::events::{MetadataSource, SourceKind};
    use crate::index;
    use crate::pipeline::GalleryOutcome;
    use crate::test_helpers::*;
    use crate::types::DemoType;
    use std::path::PathBuf;
    use std::time::Instant;

    fn result(slug: &str, error: Option<&str>) -> BuildResult {
        BuildResult {
            slug: slug.to_string(),
            success: error.is_none(),
            output_path: format!("demos/{slug}"),
            error: error.map(String::from),
            duration_ms: 42,
        }
    }

    fn summary(results: Vec<BuildResult>) -> RunSummary {
        RunSummary {
            index: index::aggregate(&[]),
            index_path: PathBuf::from("dist/index.json"),
            gallery: GalleryOutcome::Skipped,
            results,
        }
    }

    // =========================================================================
    // Scan / check
    // =========================================================================

    #[test]
    fn scan_output_lists_items_with_file_counts() {
        let items = vec![
            ScannedItem {
                name: "one".to_string(),
                root: PathBuf::from("/p/demos/one"),
                files: vec!["a.md".to_string()],
            },
            ScannedItem {
                name: "two".to_string(),
                root: PathBuf::from("/p/demos/two"),
                files: vec!["a.py".to_string(), "b.py".to_string()],
            },
        ];
        let lines = format_scan_output(&items, Path::new("/p/demos"));
        assert_eq!(
            lines,
            vec![
                "Items",
                "001 one (1 file)",
                "    Source: demos/one/",
                "002 two (2 files)",
                "    Source: demos/two/",
            ]
        );
    }

    #[test]
    fn scan_output_says_when_empty() {
        let lines = format_scan_output(&[], Path::new("demos"));
        assert_eq!(lines[1], "    (none found in demos)");
    }

    #[test]
    fn check_output_shows_type_featured_and_tags() {
        let mut meta = sample_meta("particle-sim", DemoType::WebApp);
        meta.title = "Particle Simulation".to_string();
        meta.featured = true;
        meta.tags = vec!["physics".to_string(), "canvas".to_string()];

        let lines = format_check_output(&[meta]);
        assert_eq!(lines[1], "001 Particle Simulation (web-app, featured)");
        assert_eq!(lines[2], "    Slug: particle-sim");
        assert_eq!(lines[3], "    Created: 2024-01-15");
        assert_eq!(lines[4], "    Tags: physics, canvas");
    }

    // =========================================================================
    // Events
    // =========================================================================

    #[test]
    fn format_build_events() {
        let started = Event::BuildStarted {
            slug: "app".to_string(),
            demo_type: DemoType::WebApp,
            at: Instant::now(),
        };
        assert_eq!(format_event(&started), vec!["Building app (web-app)"]);

        let done = Event::BuildFinished {
            result: result("app", None),
            at: Instant::now(),
        };
        assert_eq!(format_event(&done), vec!["    Done \u{2192} demos/app (42ms)"]);

        let failed = Event::BuildFinished {
            result: result("app", Some("boom")),
            at: Instant::now(),
        };
        assert_eq!(format_event(&failed), vec!["    Failed: boom"]);
    }

    #[test]
    fn format_install_warning_keeps_stderr_tail() {
        let stderr = (1..=8).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let lines = format_event(&Event::InstallWarning {
            slug: "app".to_string(),
            stderr,
        });
        assert_eq!(lines.len(), 1 + STDERR_TAIL);
        assert_eq!(lines[1], "        line 4");
        assert_eq!(lines[5], "        line 8");
    }

    #[test]
    fn format_resolution_events() {
        let resolved = Event::MetadataResolved {
            slug: "essay".to_string(),
            demo_type: DemoType::Markdown,
            source: MetadataSource::FrontMatter,
        };
        assert_eq!(
            format_event(&resolved),
            vec!["Resolved essay as markdown (from frontmatter)"]
        );

        let rejected = Event::SourceRejected {
            slug: "broken".to_string(),
            source: SourceKind::Sidecar,
            reason: "expected value".to_string(),
        };
        assert_eq!(
            format_event(&rejected),
            vec!["Warning: broken: ignoring demo.json: expected value"]
        );
    }

    #[test]
    fn format_index_written() {
        let event = Event::IndexWritten {
            path: PathBuf::from("dist/index.json"),
            total: 1,
            tags: 3,
        };
        assert_eq!(
            format_event(&event),
            vec!["Index \u{2192} dist/index.json (1 demo, 3 tags)"]
        );
    }

    // =========================================================================
    // Summary
    // =========================================================================

    #[test]
    fn summary_all_succeeded() {
        let lines = format_summary(&summary(vec![result("a", None), result("b", None)]));
        assert_eq!(lines, vec!["Built 2 demos"]);
    }

    #[test]
    fn summary_lists_each_failure() {
        let lines = format_summary(&summary(vec![
            result("a", Some("`pnpm build` failed (exit code 1): oops")),
            result("b", None),
            result("c", Some("no build output found (looked for dist)")),
        ]));
        assert_eq!(
            lines,
            vec![
                "Built 1 of 3 demos, 2 failed",
                "    a: `pnpm build` failed (exit code 1): oops",
                "    c: no build output found (looked for dist)",
            ]
        );
    }
}
