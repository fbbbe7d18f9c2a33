//! Index aggregation.
//!
//! Stage 4 of the pipeline. All resolved records are collected into one
//! document the gallery fetches:
//!
//! ```json
//! {
//!   "demos": [ ... ],
//!   "typeStats": { "web-app": 1, "code-snippet": 0, ... },
//!   "allTags": ["ai", "physics"],
//!   "lastUpdated": "2024-06-01T12:00:00Z",
//!   "totalCount": 1
//! }
//! ```
//!
//! The index is rebuilt from scratch on every run and overwritten whole.

use crate::types::{DemoType, ResolvedMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    /// Featured items first, then newest first.
    pub demos: Vec<ResolvedMetadata>,
    /// Every type, including those with no items.
    pub type_stats: BTreeMap<DemoType, usize>,
    /// Lowercased, deduplicated, sorted.
    pub all_tags: Vec<String>,
    pub last_updated: DateTime<Utc>,
    pub total_count: usize,
}

/// Aggregate resolved records into an index stamped with the current time.
pub fn aggregate(metadata: &[ResolvedMetadata]) -> Index {
    aggregate_at(metadata, Utc::now())
}

/// [`aggregate`] with an explicit timestamp.
pub fn aggregate_at(metadata: &[ResolvedMetadata], now: DateTime<Utc>) -> Index {
    let mut demos = metadata.to_vec();
    // Stable: equal keys keep their input order.
    demos.sort_by(|a, b| {
        b.featured
            .cmp(&a.featured)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });

    let mut type_stats: BTreeMap<DemoType, usize> =
        DemoType::ALL.into_iter().map(|t| (t, 0)).collect();
    for meta in &demos {
        *type_stats.entry(meta.demo_type).or_default() += 1;
    }

    let all_tags: BTreeSet<String> = demos
        .iter()
        .flat_map(|m| &m.tags)
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    Index {
        total_count: demos.len(),
        demos,
        type_stats,
        all_tags: all_tags.into_iter().collect(),
        last_updated: now,
    }
}

/// Serialize `index` to `path` as pretty JSON, creating parent directories.
pub fn write_index(index: &Index, path: &Path) -> Result<(), IndexError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(index)?;
    fs::write(path, json)?;
    tracing::debug!(path = %path.display(), total = index.total_count, "index written");
    Ok(())
}
