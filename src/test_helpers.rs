//! Shared test utilities for the demo-museum test suite.
//!
//! Provides fixture setup and lookup helpers over scan and resolution
//! results (`ScannedItem`, `ResolvedMetadata`).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let items = scan(tmp.path());
//!
//! let essay = find_item(&items, "markdown-essay");
//! assert!(essay.has_file("index.md"));
//! ```

use chrono::NaiveDate;
use std::path::Path;
use tempfile::TempDir;

use crate::scan::ScannedItem;
use crate::types::{DemoType, ResolvedMetadata};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// A minimal resolved record, created 2024-01-15, with no optional fields.
pub fn sample_meta(slug: &str, demo_type: DemoType) -> ResolvedMetadata {
    ResolvedMetadata {
        slug: slug.to_string(),
        title: crate::naming::title_from_slug(slug),
        description: format!("{slug} description"),
        demo_type,
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
// Lookups: panic with the available names on a miss
// =========================================================================

/// Find a scanned item by name. Panics if not found.
pub fn find_item<'a>(items: &'a [ScannedItem], name: &str) -> &'a ScannedItem {
    items.iter().find(|i| i.name == name).unwrap_or_else(|| {
        let names = item_names(items);
        panic!("item '{name}' not found. Available: {names:?}")
    })
}

/// Find resolved metadata by slug. Panics if not found.
pub fn find_meta<'a>(all: &'a [ResolvedMetadata], slug: &str) -> &'a ResolvedMetadata {
    all.iter().find(|m| m.slug == slug).unwrap_or_else(|| {
        let slugs: Vec<&str> = all.iter().map(|m| m.slug.as_str()).collect();
        panic!("metadata for '{slug}' not found. Available: {slugs:?}")
    })
}

/// All item names in scan order.
pub fn item_names(items: &[ScannedItem]) -> Vec<&str> {
    items.iter().map(|i| i.name.as_str()).collect()
}
