//! Per-item build dispatch.
//!
//! Stage 3 of the pipeline. Each resolved item is turned into static output
//! under `<output>/<collection>/<slug>/` by a strategy picked from its type:
//!
//! | Type | Strategy |
//! |------|----------|
//! | `web-app` | install + build via external commands, copy the build output; plain copy without a `package.json` |
//! | `code-snippet` | copy files, add an `index.html` previewing one source file |
//! | `markdown`, `chat`, `research` | copy files, add an `index.html` rendering the main document |
//!
//! ## Failure model
//!
//! Strategies return `Result<(), BuildError>`; [`build_item`] converts any
//! error into a failed [`BuildResult`]. One item failing never stops the rest.
//!
//! ## Scheduling
//!
//! [`build_all`] processes items one at a time in scan order. External
//! builds share package-manager caches and are heavy on CPU and memory, so
//! they are never overlapped.

use crate::config::WebAppConfig;
use crate::events::{Event, Reporter};
use crate::metadata::{main_document, strip_front_matter};
use crate::render;
use crate::runner::{CommandRunner, CommandSpec};
use crate::scan::ScannedItem;
use crate::types::{DemoType, ResolvedMetadata};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use walkdir::WalkDir;

/// Extensions a code preview page can be generated for, in no particular order.
const PREVIEW_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "py", "go", "rs"];

/// Name of the generated preview page inside an item's output directory.
const PREVIEW_PAGE: &str = "index.html";

/// Package manifest whose presence switches a web app from copy to build.
const PACKAGE_MANIFEST: &str = "package.json";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to start `{command}`: {source}")]
    Spawn { command: String, source: io::Error },
    #[error("`{command}` failed ({status}): {stderr}")]
    BuildFailed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("no build output found (looked for {})", .searched.join(", "))]
    MissingOutput { searched: Vec<String> },
    #[error("{0} command is empty")]
    EmptyCommand(&'static str),
}

/// Outcome of building one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    pub slug: String,
    pub success: bool,
    /// Output directory relative to the output root, e.g. `demos/particle-sim`.
    pub output_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Settings the dispatcher needs from the project config.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    /// Output sub-directory holding every item, also the public path segment.
    pub collection: String,
    pub web_app: WebAppConfig,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            collection: "demos".to_string(),
            web_app: WebAppConfig::default(),
        }
    }
}

impl BuildSettings {
    fn base_path(&self, slug: &str) -> String {
        format!("/{}/{}/", self.collection, slug)
    }
}

/// Build every item that has resolved metadata, strictly one after another.
///
/// Items without metadata are reported and skipped. Results follow scan order.
pub fn build_all(
    items: &[ScannedItem],
    metadata: &[ResolvedMetadata],
    output_root: &Path,
    settings: &BuildSettings,
    runner: &dyn CommandRunner,
    reporter: &dyn Reporter,
) -> Vec<BuildResult> {
    let by_slug: HashMap<&str, &ResolvedMetadata> =
        metadata.iter().map(|m| (m.slug.as_str(), m)).collect();

    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let Some(meta) = by_slug.get(item.name.as_str()) else {
            tracing::warn!(item = %item.name, "no metadata, skipping build");
            reporter.report(Event::MetadataMissing {
                slug: item.name.clone(),
            });
            continue;
        };

        reporter.report(Event::BuildStarted {
            slug: meta.slug.clone(),
            demo_type: meta.demo_type,
            at: Instant::now(),
        });
        let result = build_item(item, meta, output_root, settings, runner, reporter);
        reporter.report(Event::BuildFinished {
            result: result.clone(),
            at: Instant::now(),
        });
        results.push(result);
    }
    results
}

/// Build a single item. Never fails: errors become a failed [`BuildResult`].
pub fn build_item(
    item: &ScannedItem,
    meta: &ResolvedMetadata,
    output_root: &Path,
    settings: &BuildSettings,
    runner: &dyn CommandRunner,
    reporter: &dyn Reporter,
) -> BuildResult {
    let start = Instant::now();
    let output_path = format!("{}/{}", settings.collection, meta.slug);
    let dest = output_root.join(&settings.collection).join(&meta.slug);

    let outcome = fs::create_dir_all(&dest)
        .map_err(BuildError::from)
        .and_then(|()| match meta.demo_type {
            DemoType::WebApp => build_web_app(item, meta, &dest, settings, runner, reporter),
            DemoType::CodeSnippet => build_code_snippet(item, meta, &dest),
            DemoType::Markdown | DemoType::Chat | DemoType::Research => {
                build_document(item, meta, &dest)
            }
        });
    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(()) => {
            tracing::debug!(item = %meta.slug, duration_ms, "built");
            BuildResult {
                slug: meta.slug.clone(),
                success: true,
                output_path,
                error: None,
                duration_ms,
            }
        }
        Err(e) => {
            tracing::warn!(item = %meta.slug, %e, "build failed");
            BuildResult {
                slug: meta.slug.clone(),
                success: false,
                output_path,
                error: Some(e.to_string()),
                duration_ms,
            }
        }
    }
}

// ============================================================================
// Strategies
// ============================================================================

fn build_web_app(
    item: &ScannedItem,
    meta: &ResolvedMetadata,
    dest: &Path,
    settings: &BuildSettings,
    runner: &dyn CommandRunner,
    reporter: &dyn Reporter,
) -> Result<(), BuildError> {
    if !item.has_root_file(PACKAGE_MANIFEST) {
        return copy_manifest(item, dest);
    }

    let install = CommandSpec::from_argv(&settings.web_app.install, &item.root)
        .ok_or(BuildError::EmptyCommand("install"))?;
    let install_problem = match runner.run(&install) {
        Ok(output) if output.success() => None,
        Ok(output) => Some(output.stderr),
        Err(e) => Some(e.to_string()),
    };
    if let Some(stderr) = install_problem {
        tracing::warn!(item = %meta.slug, command = %install.display(), "install failed, building anyway");
        reporter.report(Event::InstallWarning {
            slug: meta.slug.clone(),
            stderr,
        });
    }

    let build_argv: Vec<String> = match meta.config.as_ref().and_then(|c| c.build_command.as_deref()) {
        Some(custom) => custom.split_whitespace().map(String::from).collect(),
        None => settings.web_app.build.clone(),
    };
    let build = CommandSpec::from_argv(&build_argv, &item.root)
        .ok_or(BuildError::EmptyCommand("build"))?
        .env(&settings.web_app.base_path_env, settings.base_path(&meta.slug));

    let output = runner.run(&build).map_err(|source| BuildError::Spawn {
        command: build.display(),
        source,
    })?;
    if !output.success() {
        return Err(BuildError::BuildFailed {
            command: build.display(),
            status: output.status_text(),
            stderr: output.stderr.trim().to_string(),
        });
    }

    let built = settings
        .web_app
        .output_dirs
        .iter()
        .map(|d| item.root.join(d))
        .find(|p| p.is_dir())
        .ok_or_else(|| BuildError::MissingOutput {
            searched: settings.web_app.output_dirs.clone(),
        })?;
    copy_dir_contents(&built, dest)
}

fn build_code_snippet(
    item: &ScannedItem,
    meta: &ResolvedMetadata,
    dest: &Path,
) -> Result<(), BuildError> {
    copy_manifest(item, dest)?;

    let Some(file) = preview_file(item, meta) else {
        tracing::debug!(item = %meta.slug, "no previewable source file");
        return Ok(());
    };
    let source = fs::read(item.root.join(file))?;
    let page = render::code_preview_page(meta, file, &String::from_utf8_lossy(&source));
    fs::write(dest.join(PREVIEW_PAGE), page.into_string())?;
    Ok(())
}

fn build_document(
    item: &ScannedItem,
    meta: &ResolvedMetadata,
    dest: &Path,
) -> Result<(), BuildError> {
    copy_manifest(item, dest)?;

    let declared = meta
        .config
        .as_ref()
        .and_then(|c| c.main_doc.as_deref())
        .filter(|doc| item.files.iter().any(|f| f == doc));
    let Some(doc) = declared.or_else(|| main_document(&item.files)) else {
        tracing::debug!(item = %meta.slug, "no document to render");
        return Ok(());
    };
    let bytes = fs::read(item.root.join(doc))?;
    let content = String::from_utf8_lossy(&bytes);
    let fragment = render::render_inline_markup(strip_front_matter(&content));
    fs::write(
        dest.join(PREVIEW_PAGE),
        render::document_page(meta, &fragment).into_string(),
    )?;
    Ok(())
}

/// The file shown in a code preview: a declared `mainFile` present in the
/// manifest, else the first file with a previewable extension.
fn preview_file<'a>(item: &'a ScannedItem, meta: &ResolvedMetadata) -> Option<&'a str> {
    let declared = meta.config.as_ref().and_then(|c| c.main_file.as_deref());
    if let Some(main) = declared
        && let Some(found) = item.files.iter().find(|f| *f == main)
    {
        return Some(found);
    }
    item.files
        .iter()
        .find(|f| {
            Path::new(f)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| PREVIEW_EXTENSIONS.contains(&e))
        })
        .map(String::as_str)
}

// ============================================================================
// Copying
// ============================================================================

/// Copy the item's scanned files into `dest`, keeping relative paths.
fn copy_manifest(item: &ScannedItem, dest: &Path) -> Result<(), BuildError> {
    for rel in &item.files {
        let target = dest.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(item.root.join(rel), target)?;
    }
    Ok(())
}

/// Copy everything under `src` into `dest`.
fn copy_dir_contents(src: &Path, dest: &Path) -> Result<(), BuildError> {
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(io::Error::from)?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
