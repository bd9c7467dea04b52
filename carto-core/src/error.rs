/// Top-level Carto error type.
///
/// All fallible operations in `carto-core` return [`Result<T, CartoError>`](Result).
/// Each variant wraps a domain-specific error enum, allowing callers to
/// match on the error source without losing type information.
///
/// Per-file and per-query failures never surface here: they are caught inside
/// the passes and converted into diagnostic entries. The pipeline itself only
/// fails on configuration errors, cancellation, and unrecoverable resource
/// exhaustion.
#[derive(thiserror::Error, Debug)]
pub enum CartoError {
    /// Error from the grammar adapter layer (tree-sitter parsing, queries).
    #[error("Graph engine error: {0}")]
    Graph(#[from] carto_graphs::GraphError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Fatal pipeline-level error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Filesystem I/O error while assembling a source tree.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors in Carto configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Fatal errors from the ingestion pipeline.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// The explicit filters left nothing to ingest.
    #[error("No files to ingest after filtering")]
    NoSourceFiles,

    /// The run was cancelled; the partial graph has been discarded.
    #[error("Ingestion cancelled")]
    Cancelled,

    /// Resource exhaustion the pipeline could not recover from after cleanup.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),
}

/// Convenience alias for `Result<T, CartoError>`.
pub type Result<T> = std::result::Result<T, CartoError>;
