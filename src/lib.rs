//! # Demo Museum
//!
//! A build pipeline for a gallery of loosely-structured demo directories.
//! Every sub-directory of the content root is an item: a bundled web app, a
//! code snippet, a markdown write-up, a chat transcript or a research note.
//! The pipeline works out what each item is, builds it into static output,
//! and writes one `index.json` that the gallery front-end fetches.
//!
//! # Architecture: Four Stages
//!
//! ```text
//! 1. Scan      demos/          →  Vec<ScannedItem>       (directories + file manifests)
//! 2. Resolve   ScannedItem     →  ResolvedMetadata       (demo.json > front-matter > inference)
//! 3. Build     item + metadata →  dist/demos/<slug>/     (per-type strategy, one at a time)
//! 4. Index     all metadata    →  dist/index.json        (ordered, tag-indexed, type-counted)
//! ```
//!
//! Building and indexing both consume resolved metadata but not each other, so
//! `demo-museum index` can write the index without building anything.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: discovers items and their sorted file manifests, applying ignore rules |
//! | [`metadata`] | Stage 2: sidecar and front-matter sources, field-by-field precedence, type inference |
//! | [`builder`] | Stage 3: per-type build strategies, sequential `build_all` |
//! | [`index`] | Stage 4: aggregation and serialization of the index artifact |
//! | [`pipeline`] | The full run: output reset, gallery handoff, index rewrite, summary |
//! | [`runner`] | External command execution behind the `CommandRunner` trait |
//! | [`render`] | Maud preview pages and the small inline markup formatter |
//! | [`events`] | Structured progress events and the `Reporter` sink |
//! | [`config`] | `museum.toml` loading, validation and merging |
//! | [`types`] | Types serialized into the index (`DemoType`, `ResolvedMetadata`) |
//! | [`naming`] | Directory name → display title |
//! | [`output`] | CLI output formatting for every stage |
//!
//! # Design Decisions
//!
//! ## Field-Level Precedence
//!
//! An item may carry a `demo.json` sidecar, YAML front-matter in its main
//! document, both, or neither. Each field is resolved on its own:
//!
//! ```text
//! demo.json  →  front-matter  →  inference  →  default
//! ```
//!
//! so a sidecar that only pins `featured` still lets the front-matter supply the
//! title. A malformed source is reported and skipped, never fatal.
//!
//! ## Sequential Builds
//!
//! Web-app builds shell out to a package manager and bundler. Running several
//! at once fights over the shared package store and saturates the machine, so
//! [`builder::build_all`] is a plain loop. Only metadata resolution, which is
//! read-only and per-item, runs on the rayon pool.
//!
//! ## Injected Side Effects
//!
//! Stages never print and never spawn processes directly. Progress goes to a
//! [`events::Reporter`]; commands go through a [`runner::CommandRunner`]. The
//! CLI wires in an `mpsc` channel and the real process runner; tests wire in a
//! channel they inspect and a mock runner that records calls.
//!
//! ## Maud Over Template Engines
//!
//! Preview pages are generated with [Maud](https://maud.lambda.xyz/), so source
//! code shown in a snippet preview is escaped by construction.

pub mod builder;
pub mod config;
pub mod events;
pub mod index;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod runner;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
