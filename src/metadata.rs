//! Metadata resolution for scanned items.
//!
//! Each item's metadata can come from up to two declared sources plus
//! heuristics over its file manifest:
//!
//! - **Sidecar**: a `demo.json` at the item root.
//! - **Front-matter**: a `---`-delimited YAML block at the top of the item's
//!   primary markdown document (`index.md`, `content.md` or `main.md` if
//!   present, otherwise the first non-readme document).
//! - **Inference**: type from bundler configs, manifests, directory-name
//!   keywords and file extensions; title from the directory name; creation
//!   date from the filesystem.
//!
//! ## Resolution priority
//!
//! Each field is resolved independently. The first usable value wins:
//!
//! ```text
//! sidecar → front-matter → inference → default
//! ```
//!
//! A sidecar that sets only `title` still lets the front-matter supply
//! `description`. Nested objects (`config`, `externalLinks`) are taken whole
//! from the first source that has them; they are not merged key-by-key.
//!
//! ## Failure model
//!
//! Nothing here fails an item. A malformed source is reported and treated as
//! absent; a single unusable field (an unknown `type`, a bad date) is reported
//! and falls through to the next level.

use crate::events::{Event, MetadataSource, Reporter, SourceKind};
use crate::naming::{default_description, title_from_slug};
use crate::scan::ScannedItem;
use crate::types::{DemoType, ExternalLinks, ResolvedMetadata, TypeConfig};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const SIDECAR_FILE: &str = "demo.json";

const MARKUP_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Documents preferred as the front-matter source, in order.
const PRIORITY_DOC_STEMS: &[&str] = &["index", "content", "main"];

const BUNDLER_CONFIGS: &[&str] = &["vite.config.ts", "vite.config.js", "vite.config.mjs"];

const CHAT_KEYWORDS: &[&str] = &["chat", "对话"];
const RESEARCH_KEYWORDS: &[&str] = &["research", "研究"];

/// Source-code extensions and the language each maps to, in lookup order.
pub const CODE_LANGUAGES: &[(&str, &str)] = &[
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("py", "python"),
    ("go", "go"),
    ("rs", "rust"),
    ("java", "java"),
    ("cpp", "cpp"),
    ("c", "c"),
    ("html", "html"),
    ("css", "css"),
    ("json", "json"),
    ("yaml", "yaml"),
    ("yml", "yaml"),
];

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid front-matter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A loosely-typed, partially-specified metadata record from one source.
///
/// Unknown keys are ignored. `type` and the dates stay strings here so a bad
/// value rejects only that field, not the whole source.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclaredConfig {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub demo_type: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub tags: Option<Vec<String>>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub author: Option<String>,
    pub thumbnail: Option<String>,
    pub featured: Option<bool>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub tech_stack: Option<Vec<String>>,
    pub config: Option<TypeConfig>,
    pub external_links: Option<ExternalLinks>,
}

impl DeclaredConfig {
    pub fn is_empty(&self) -> bool {
        *self == DeclaredConfig::default()
    }
}

/// Accept `tags: ai` as well as `tags: [ai, ml]`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(
        Option::<OneOrMany>::deserialize(deserializer)?.map(|v| match v {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }),
    )
}

/// Split a document into its YAML front-matter block and body.
///
/// The first line must be exactly `---`; the block ends at the next `---`
/// line. Returns `None` when the document has no complete block.
pub fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let first_end = content.find('\n')?;
    if content[..first_end].trim_end() != "---" {
        return None;
    }

    let rest = &content[first_end + 1..];
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

/// Strip a leading front-matter block, if any.
pub fn strip_front_matter(content: &str) -> &str {
    split_front_matter(content)
        .map(|(_, body)| body)
        .unwrap_or(content)
}

fn extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

pub fn is_markup(path: &str) -> bool {
    extension(path).is_some_and(|e| MARKUP_EXTENSIONS.contains(&e.as_str()))
}

pub fn is_readme(path: &str) -> bool {
    file_name(path).to_lowercase().contains("readme")
}

/// Language for a path, from [`CODE_LANGUAGES`].
pub fn language_for(path: &str) -> Option<&'static str> {
    let ext = extension(path)?;
    CODE_LANGUAGES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, lang)| *lang)
}

fn content_documents(files: &[String]) -> impl Iterator<Item = &String> {
    files.iter().filter(|f| is_markup(f) && !is_readme(f))
}

/// The document whose front-matter feeds resolution.
pub fn front_matter_document(files: &[String]) -> Option<&str> {
    let docs: Vec<&String> = content_documents(files).collect();
    for stem in PRIORITY_DOC_STEMS {
        for ext in MARKUP_EXTENSIONS {
            let candidate = format!("{stem}.{ext}");
            if let Some(doc) = docs.iter().find(|d| ***d == candidate) {
                return Some(doc.as_str());
            }
        }
    }
    docs.first().map(|d| d.as_str())
}

/// The document rendered for document-like items: the first non-readme
/// markup file, falling back to the first markup file of any name.
pub fn main_document(files: &[String]) -> Option<&str> {
    content_documents(files)
        .next()
        .or_else(|| files.iter().find(|f| is_markup(f)))
        .map(String::as_str)
}

/// Read `demo.json` from the item root. `Ok(None)` when absent.
pub fn read_sidecar(item: &ScannedItem) -> Result<Option<DeclaredConfig>, SourceError> {
    if !item.has_root_file(SIDECAR_FILE) {
        return Ok(None);
    }
    let content = fs::read_to_string(item.root.join(SIDECAR_FILE))?;
    let config: DeclaredConfig = serde_json::from_str(&content)?;
    Ok(Some(config))
}

/// Read the front-matter of the item's primary document. `Ok(None)` when
/// there is no document, no block, or an empty block.
pub fn read_front_matter(item: &ScannedItem) -> Result<Option<DeclaredConfig>, SourceError> {
    let Some(doc) = front_matter_document(&item.files) else {
        return Ok(None);
    };
    let content = fs::read_to_string(item.root.join(doc))?;
    let Some((yaml, _)) = split_front_matter(&content) else {
        return Ok(None);
    };
    if yaml.trim().is_empty() {
        return Ok(None);
    }
    let config: Option<DeclaredConfig> = serde_yaml::from_str(yaml)?;
    Ok(config.filter(|c| !c.is_empty()))
}

/// Infer the item type from its manifest and directory name.
pub fn infer_type(item: &ScannedItem) -> DemoType {
    if BUNDLER_CONFIGS.iter().any(|f| item.has_file(f)) {
        return DemoType::WebApp;
    }
    if item.has_file("package.json") && item.has_file("index.html") {
        return DemoType::WebApp;
    }

    let name = item.name.to_lowercase();
    if CHAT_KEYWORDS.iter().any(|k| name.contains(k)) {
        return DemoType::Chat;
    }
    if RESEARCH_KEYWORDS.iter().any(|k| name.contains(k)) {
        return DemoType::Research;
    }

    if content_documents(&item.files).next().is_some() {
        return DemoType::Markdown;
    }
    if item.files.iter().any(|f| language_for(f).is_some()) {
        return DemoType::CodeSnippet;
    }
    DemoType::Markdown
}

/// Language of the first manifest file with a known source extension.
pub fn infer_language(files: &[String]) -> Option<&'static str> {
    files.iter().find_map(|f| language_for(f))
}

/// Parse a declared date: `YYYY-MM-DD`, RFC 3339, or a naive timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|d| d.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|d| d.date())
        })
}

/// Creation date of the item directory, or today when the platform has none.
pub fn directory_created(path: &Path) -> NaiveDate {
    fs::metadata(path)
        .and_then(|m| m.created())
        .map(|t| DateTime::<Utc>::from(t).date_naive())
        .unwrap_or_else(|_| Utc::now().date_naive())
}

/// First non-empty trimmed value.
pub fn resolve_text(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// First source that has the field.
fn first<T>(sources: &[&DeclaredConfig], field: impl Fn(&DeclaredConfig) -> Option<T>) -> Option<T> {
    sources.iter().find_map(|s| field(s))
}

/// Trim, drop empties and duplicates, keep first-seen order.
fn normalize_list(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for v in values {
        let v = v.trim();
        if !v.is_empty() && !out.iter().any(|o| o == v) {
            out.push(v.to_string());
        }
    }
    out
}

/// Merge declared sources over inference for one item.
///
/// Pure apart from `reporter`: `created_fallback` is the inferred creation
/// date, used only when no source declares a usable one.
pub fn merge(
    item: &ScannedItem,
    sidecar: Option<&DeclaredConfig>,
    front_matter: Option<&DeclaredConfig>,
    created_fallback: NaiveDate,
    reporter: &dyn Reporter,
) -> ResolvedMetadata {
    let sources: Vec<&DeclaredConfig> = [sidecar, front_matter].into_iter().flatten().collect();
    let reject = |field: &'static str, reason: String| {
        reporter.report(Event::FieldRejected {
            slug: item.name.clone(),
            field,
            reason,
        });
    };

    let mut demo_type = None;
    for source in &sources {
        if let Some(raw) = &source.demo_type {
            match raw.parse::<DemoType>() {
                Ok(t) => {
                    demo_type = Some(t);
                    break;
                }
                Err(e) => reject("type", e.to_string()),
            }
        }
    }
    let demo_type = demo_type.unwrap_or_else(|| infer_type(item));

    let date_field = |field: &'static str, get: fn(&DeclaredConfig) -> Option<&String>| {
        for source in &sources {
            if let Some(raw) = get(source) {
                match parse_date(raw) {
                    Some(date) => return Some(date),
                    None => reject(field, format!("unparseable date '{raw}'")),
                }
            }
        }
        None
    };
    let created_at = date_field("createdAt", |s| s.created_at.as_ref()).unwrap_or(created_fallback);
    let updated_at = date_field("updatedAt", |s| s.updated_at.as_ref());

    let title = resolve_text(&sources.iter().map(|s| s.title.as_deref()).collect::<Vec<_>>())
        .unwrap_or_else(|| title_from_slug(&item.name));
    let description = resolve_text(
        &sources
            .iter()
            .map(|s| s.description.as_deref())
            .collect::<Vec<_>>(),
    )
    .unwrap_or_else(|| default_description(&title_from_slug(&item.name)));

    let mut config = first(&sources, |s| s.config.clone());
    if demo_type == DemoType::CodeSnippet
        && config.as_ref().and_then(|c| c.language.as_ref()).is_none()
    {
        if let Some(language) = infer_language(&item.files) {
            config.get_or_insert_with(TypeConfig::default).language = Some(language.to_string());
        }
    }

    ResolvedMetadata {
        slug: item.name.clone(),
        title,
        description,
        demo_type,
        tags: first(&sources, |s| s.tags.clone())
            .map(normalize_list)
            .unwrap_or_default(),
        created_at,
        updated_at,
        author: resolve_text(&sources.iter().map(|s| s.author.as_deref()).collect::<Vec<_>>()),
        thumbnail: resolve_text(
            &sources
                .iter()
                .map(|s| s.thumbnail.as_deref())
                .collect::<Vec<_>>(),
        ),
        featured: first(&sources, |s| s.featured).unwrap_or(false),
        tech_stack: first(&sources, |s| s.tech_stack.clone()).map(normalize_list),
        config,
        external_links: first(&sources, |s| s.external_links.clone()),
    }
}

fn load_source(
    item: &ScannedItem,
    kind: SourceKind,
    reporter: &dyn Reporter,
) -> Option<DeclaredConfig> {
    let loaded = match kind {
        SourceKind::Sidecar => read_sidecar(item),
        SourceKind::FrontMatter => read_front_matter(item),
    };
    match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(item = %item.name, source = kind.label(), %e, "ignoring declared config");
            reporter.report(Event::SourceRejected {
                slug: item.name.clone(),
                source: kind,
                reason: e.to_string(),
            });
            None
        }
    }
}

/// Resolve one item's metadata from its declared sources and manifest.
pub fn resolve(item: &ScannedItem, reporter: &dyn Reporter) -> ResolvedMetadata {
    let sidecar = load_source(item, SourceKind::Sidecar, reporter);
    let front_matter = load_source(item, SourceKind::FrontMatter, reporter);

    let created_fallback = directory_created(&item.root);
    let metadata = merge(
        item,
        sidecar.as_ref(),
        front_matter.as_ref(),
        created_fallback,
        reporter,
    );

    let source = if sidecar.is_some() {
        MetadataSource::Sidecar
    } else if front_matter.is_some() {
        MetadataSource::FrontMatter
    } else {
        MetadataSource::Inferred
    };
    reporter.report(Event::MetadataResolved {
        slug: metadata.slug.clone(),
        demo_type: metadata.demo_type,
        source,
    });
    metadata
}

/// Resolve every item. Items are independent, so this fans out over the
/// rayon pool; the result keeps the input order.
pub fn resolve_all(items: &[ScannedItem], reporter: &dyn Reporter) -> Vec<ResolvedMetadata> {
    items.par_iter().map(|item| resolve(item, reporter)).collect()
}
