//! Content-root scanning.
//!
//! Stage 1 of the pipeline. Every immediate sub-directory of the content root
//! is a candidate item; its files are collected recursively into a sorted
//! manifest of relative paths.
//!
//! ```text
//! demos/                        # Content root
//! ├── particle-sim/             # Item "particle-sim"
//! │   ├── demo.json             # Sidecar config (optional)
//! │   ├── package.json
//! │   ├── index.html
//! │   ├── node_modules/         # Ignored
//! │   └── src/main.ts
//! ├── sorting-snippet/
//! │   └── sort.py
//! └── scaffold/                 # Only README.md + .gitkeep → dropped
//! ```
//!
//! ## Ignore rules
//!
//! Applied at every depth, to files and directories alike: version-control
//! and dependency-cache directories, OS metadata files, `README.md`, and any
//! name starting with `.`. Ignored directories are not descended into.
//!
//! ## Failure model
//!
//! Scanning never fails the run. A missing or unreadable content root yields
//! zero items, and an unreadable entry inside an item is skipped with a
//! warning.

use crate::events::{Event, NullReporter, Reporter};
use serde::Serialize;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IGNORED_NAMES: &[&str] = &[
    "node_modules",
    ".git",
    ".DS_Store",
    "Thumbs.db",
    ".gitkeep",
    "README.md",
];

/// One discovered content directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannedItem {
    /// Directory name, used as the slug.
    pub name: String,
    pub root: PathBuf,
    /// Paths relative to `root`, `/`-separated, sorted ascending.
    pub files: Vec<String>,
}

impl ScannedItem {
    /// True if `file_name` exists at any depth in the manifest.
    pub fn has_file(&self, file_name: &str) -> bool {
        self.files.iter().any(|f| matches_file(f, file_name))
    }

    /// True if `file_name` exists directly under the item root.
    pub fn has_root_file(&self, file_name: &str) -> bool {
        self.files.iter().any(|f| f == file_name)
    }
}

fn matches_file(rel: &str, file_name: &str) -> bool {
    rel == file_name
        || rel
            .strip_suffix(file_name)
            .is_some_and(|prefix| prefix.ends_with('/'))
}

pub fn should_ignore(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    name.starts_with('.') || IGNORED_NAMES.contains(&name.as_ref())
}

/// Scan `root` for items.
pub fn scan(root: &Path) -> Vec<ScannedItem> {
    scan_reporting(root, &NullReporter)
}

/// Scan `root` for items, reporting each discovered and skipped directory.
pub fn scan_reporting(root: &Path, reporter: &dyn Reporter) -> Vec<ScannedItem> {
    if !root.is_dir() {
        tracing::warn!(root = %root.display(), "content root missing or not a directory");
        return Vec::new();
    }

    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(root = %root.display(), %e, "content root unreadable");
            return Vec::new();
        }
    };

    let mut candidates: Vec<(String, PathBuf)> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter(|e| !should_ignore(&e.file_name()))
        .map(|e| (e.file_name().to_string_lossy().into_owned(), e.path()))
        .collect();
    candidates.sort();

    let mut items = Vec::new();
    for (name, path) in candidates {
        let files = collect_files(&path);
        if files.is_empty() {
            tracing::debug!(item = %name, "skipping directory without content files");
            reporter.report(Event::ItemSkipped { slug: name });
            continue;
        }
        reporter.report(Event::ItemDiscovered {
            slug: name.clone(),
            file_count: files.len(),
        });
        items.push(ScannedItem {
            name,
            root: path,
            files,
        });
    }

    tracing::debug!(count = items.len(), "scan complete");
    items
}

/// Collect every regular file under `dir` as a sorted, `/`-separated relative path.
fn collect_files(dir: &Path) -> Vec<String> {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !should_ignore(e.file_name()));

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(dir) {
            files.push(relative_string(rel));
        }
    }
    files.sort();
    files
}

fn relative_string(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use std::sync::mpsc;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn scan_finds_fixture_items() {
        let tmp = setup_fixtures();
        let items = scan(tmp.path());
        assert_eq!(
            item_names(&items),
            vec![
                "markdown-essay",
                "openai-chat-example",
                "particle-sim",
                "research-agents",
                "sorting-snippet",
            ]
        );
    }

    #[test]
    fn missing_root_yields_no_items() {
        let tmp = TempDir::new().unwrap();
        assert!(scan(&tmp.path().join("nope")).is_empty());
    }

    #[test]
    fn file_root_yields_no_items() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("demos");
        fs::write(&file, "not a dir").unwrap();
        assert!(scan(&file).is_empty());
    }

    #[test]
    fn files_are_sorted_and_relative() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "demo/src/b.ts", "");
        write(tmp.path(), "demo/src/a.ts", "");
        write(tmp.path(), "demo/Zeta.md", "");
        write(tmp.path(), "demo/index.html", "");

        let items = scan(tmp.path());
        assert_eq!(
            items[0].files,
            vec!["Zeta.md", "index.html", "src/a.ts", "src/b.ts"]
        );
    }

    #[test]
    fn ignored_entries_are_excluded_at_every_depth() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "demo/main.py", "");
        write(tmp.path(), "demo/README.md", "");
        write(tmp.path(), "demo/.DS_Store", "");
        write(tmp.path(), "demo/.env", "");
        write(tmp.path(), "demo/node_modules/pkg/index.js", "");
        write(tmp.path(), "demo/.git/HEAD", "");
        write(tmp.path(), "demo/nested/Thumbs.db", "");
        write(tmp.path(), "demo/nested/.gitkeep", "");
        write(tmp.path(), "demo/nested/README.md", "");
        write(tmp.path(), "demo/nested/keep.txt", "");

        let items = scan(tmp.path());
        assert_eq!(items[0].files, vec!["main.py", "nested/keep.txt"]);
    }

    #[test]
    fn hidden_and_dependency_directories_are_not_items() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), ".cache/data.json", "{}");
        write(tmp.path(), "node_modules/x/index.js", "");
        write(tmp.path(), "real/notes.md", "");

        assert_eq!(item_names(&scan(tmp.path())), vec!["real"]);
    }

    #[test]
    fn loose_files_in_root_are_not_items() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "stray.md", "");
        write(tmp.path(), "real/notes.md", "");

        assert_eq!(item_names(&scan(tmp.path())), vec!["real"]);
    }

    #[test]
    fn empty_items_are_dropped_and_reported() {
        let tmp = setup_fixtures();
        let (tx, rx) = mpsc::channel();
        let items = scan_reporting(tmp.path(), &tx);
        drop(tx);

        assert!(!item_names(&items).contains(&"scaffold"));
        let skipped: Vec<String> = rx
            .iter()
            .filter_map(|e| match e {
                Event::ItemSkipped { slug } => Some(slug),
                _ => None,
            })
            .collect();
        assert_eq!(skipped, vec!["scaffold"]);
    }

    #[test]
    fn has_file_matches_nested_names_but_not_suffixes() {
        let item = ScannedItem {
            name: "demo".to_string(),
            root: PathBuf::from("/content/demo"),
            files: vec!["app/package.json".to_string(), "my-index.html".to_string()],
        };
        assert!(item.has_file("package.json"));
        assert!(!item.has_root_file("package.json"));
        assert!(!item.has_file("index.html"));
    }
}
