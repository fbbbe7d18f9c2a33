//! Structured progress events emitted by the pipeline stages.
//!
//! Stages never print. They hand [`Event`]s to a [`Reporter`], and the CLI
//! decides how to render them (see [`crate::output::format_event`]). Tests pass
//! an `mpsc::Sender` and inspect what was reported.

use crate::builder::BuildResult;
use crate::types::DemoType;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::time::Instant;

/// Which declared-config source a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Sidecar,
    FrontMatter,
}

impl SourceKind {
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Sidecar => "demo.json",
            SourceKind::FrontMatter => "frontmatter",
        }
    }
}

/// The highest-precedence source that contributed to a resolved record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataSource {
    Sidecar,
    FrontMatter,
    Inferred,
}

impl MetadataSource {
    pub fn label(self) -> &'static str {
        match self {
            MetadataSource::Sidecar => "demo.json",
            MetadataSource::FrontMatter => "frontmatter",
            MetadataSource::Inferred => "inferred",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    ItemDiscovered {
        slug: String,
        file_count: usize,
    },
    /// A sub-directory without any content files.
    ItemSkipped {
        slug: String,
    },
    /// A declared-config source was present but unusable; treated as absent.
    SourceRejected {
        slug: String,
        source: SourceKind,
        reason: String,
    },
    /// A single declared field was unusable; resolution fell through for it.
    FieldRejected {
        slug: String,
        field: &'static str,
        reason: String,
    },
    MetadataResolved {
        slug: String,
        demo_type: DemoType,
        source: MetadataSource,
    },
    /// A scanned item has no resolved metadata and is left out of the build.
    MetadataMissing {
        slug: String,
    },
    BuildStarted {
        slug: String,
        demo_type: DemoType,
        at: Instant,
    },
    InstallWarning {
        slug: String,
        stderr: String,
    },
    BuildFinished {
        result: BuildResult,
        at: Instant,
    },
    IndexWritten {
        path: PathBuf,
        total: usize,
        tags: usize,
    },
    GalleryBuilt {
        dir: PathBuf,
    },
    GallerySkipped {
        dir: PathBuf,
    },
}

/// Sink for pipeline events.
///
/// `Sync` because metadata resolution reports from rayon workers.
pub trait Reporter: Sync {
    fn report(&self, event: Event);
}

impl Reporter for Sender<Event> {
    fn report(&self, event: Event) {
        // A dropped receiver only means nobody is listening.
        let _ = self.send(event);
    }
}

/// Discards every event.
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _event: Event) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn sender_forwards_events() {
        let (tx, rx) = mpsc::channel();
        tx.report(Event::ItemSkipped {
            slug: "empty".to_string(),
        });
        drop(tx);
        let events: Vec<Event> = rx.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::ItemSkipped { slug } if slug == "empty"));
    }

    #[test]
    fn sender_ignores_closed_receiver() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        tx.report(Event::MetadataMissing {
            slug: "orphan".to_string(),
        });
    }
}
