//! The full build run, tying the stages together.
//!
//! ```text
//! clear output → scan → resolve → write index → gallery build → item builds → write index
//! ```
//!
//! The index is written twice. The first copy is handed to the gallery
//! application (copied into its public directory) before it builds; the
//! gallery's bundler may empty the output root, so the index is written
//! again once every item has been built.
//!
//! Only a failing gallery build (or I/O on the output root itself) fails the
//! run. Item failures are collected in [`RunSummary::results`].

use crate::builder::{self, BuildResult, BuildSettings};
use crate::config::{ConfigError, MuseumConfig};
use crate::events::{Event, Reporter};
use crate::index::{self, Index, IndexError};
use crate::metadata;
use crate::runner::{CommandRunner, CommandSpec};
use crate::scan::{self, ScannedItem};
use crate::types::ResolvedMetadata;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("Index error: {0}")]
    Index(#[from] IndexError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("refusing to clear {}: it contains {}", .output.display(), .protected.display())]
    UnsafeOutput { output: PathBuf, protected: PathBuf },
    #[error("gallery build failed ({status}): {stderr}")]
    Gallery { status: String, stderr: String },
}

/// Items and their resolved metadata, in scan order.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub items: Vec<ScannedItem>,
    pub metadata: Vec<ResolvedMetadata>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryOutcome {
    Built,
    /// The gallery directory does not exist.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub index: Index,
    pub index_path: PathBuf,
    pub gallery: GalleryOutcome,
    /// One per built item, in scan order.
    pub results: Vec<BuildResult>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &BuildResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

/// Scan the content root and resolve every item. Writes nothing.
pub fn discover(root: &Path, config: &MuseumConfig, reporter: &dyn Reporter) -> Discovery {
    let items = scan::scan_reporting(&config.content_path(root), reporter);
    let metadata = metadata::resolve_all(&items, reporter);
    Discovery { items, metadata }
}

/// Scan, resolve and write the index, without building anything.
pub fn write_index_only(
    root: &Path,
    config: &MuseumConfig,
    reporter: &dyn Reporter,
) -> Result<Index, PipelineError> {
    let discovery = discover(root, config, reporter);
    let index = index::aggregate(&discovery.metadata);
    publish_index(&index, &config.index_path(root), reporter)?;
    Ok(index)
}

/// Run the whole pipeline.
pub fn run(
    root: &Path,
    config: &MuseumConfig,
    runner: &dyn CommandRunner,
    reporter: &dyn Reporter,
) -> Result<RunSummary, PipelineError> {
    let output_root = config.output_path(root);
    let protected = [
        root.to_path_buf(),
        config.content_path(root),
        config.gallery_path(root),
    ];
    reset_output(&output_root, &protected)?;

    let discovery = discover(root, config, reporter);
    let index = index::aggregate(&discovery.metadata);
    let index_path = config.index_path(root);
    publish_index(&index, &index_path, reporter)?;

    let gallery = build_gallery(root, config, &index_path, runner, reporter)?;

    let settings = BuildSettings {
        collection: config.collection.clone(),
        web_app: config.web_app.clone(),
    };
    let results = builder::build_all(
        &discovery.items,
        &discovery.metadata,
        &output_root,
        &settings,
        runner,
        reporter,
    );

    publish_index(&index, &index_path, reporter)?;

    Ok(RunSummary {
        index,
        index_path,
        gallery,
        results,
    })
}

/// Remove and recreate the output root. Refuses when the output root is, or
/// contains, any of the `protected` paths.
fn reset_output(output_root: &Path, protected: &[PathBuf]) -> Result<(), PipelineError> {
    if output_root.exists() {
        let output = fs::canonicalize(output_root)?;
        for path in protected {
            let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.clone());
            if resolved.starts_with(&output) {
                return Err(PipelineError::UnsafeOutput {
                    output: output_root.to_path_buf(),
                    protected: path.clone(),
                });
            }
        }
        tracing::debug!(path = %output_root.display(), "clearing output root");
        fs::remove_dir_all(output_root)?;
    }
    fs::create_dir_all(output_root)?;
    Ok(())
}

fn publish_index(index: &Index, path: &Path, reporter: &dyn Reporter) -> Result<(), IndexError> {
    index::write_index(index, path)?;
    reporter.report(Event::IndexWritten {
        path: path.to_path_buf(),
        total: index.total_count,
        tags: index.all_tags.len(),
    });
    Ok(())
}

/// Copy the index into the gallery's public directory and build the gallery.
fn build_gallery(
    root: &Path,
    config: &MuseumConfig,
    index_path: &Path,
    runner: &dyn CommandRunner,
    reporter: &dyn Reporter,
) -> Result<GalleryOutcome, PipelineError> {
    let dir = config.gallery_path(root);
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "no gallery application");
        reporter.report(Event::GallerySkipped { dir });
        return Ok(GalleryOutcome::Skipped);
    }

    let public = dir.join(&config.gallery.public_dir);
    fs::create_dir_all(&public)?;
    let file_name = index_path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("index.json"));
    fs::copy(index_path, public.join(file_name))?;

    let spec = CommandSpec::from_argv(&config.gallery.build, &dir).ok_or_else(|| {
        PipelineError::Gallery {
            status: "not started".to_string(),
            stderr: "gallery.build is empty".to_string(),
        }
    })?;
    let output = runner.run(&spec).map_err(|e| PipelineError::Gallery {
        status: "not started".to_string(),
        stderr: e.to_string(),
    })?;
    if !output.success() {
        return Err(PipelineError::Gallery {
            status: output.status_text(),
            stderr: output.stderr.trim().to_string(),
        });
    }

    reporter.report(Event::GalleryBuilt { dir });
    Ok(GalleryOutcome::Built)
}
