//! Carto core library — multi-pass ingestion of a source tree into a typed
//! code knowledge graph.
//!
//! The main entry point is [`pipeline::CartoPipeline`], which runs the
//! Structure → Parsing → Import-resolution → Call-resolution passes over a
//! [`pipeline::SourceTree`] and hands back an immutable
//! [`graph::KnowledgeGraph`] plus an [`diagnostics::IngestReport`].

pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod passes;
pub mod pipeline;
pub mod progress;
pub mod registry;
pub mod types;
pub mod validate;

pub use cache::ParseCache;
pub use config::CartoConfig;
pub use error::{CartoError, Result};
pub use graph::KnowledgeGraph;
pub use pipeline::{CancelFlag, CartoPipeline, IngestOptions, IngestResult, SourceTree};
