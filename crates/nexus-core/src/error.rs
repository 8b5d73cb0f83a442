use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the corpus. Always fatal — a corpus that
/// fails these checks must be fixed by the operator, never auto-healed.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("project not found: {0}")]
    MissingProject(String),

    #[error("project already exists: {0}")]
    ProjectExists(String),

    #[error("duplicate context id {id} in project {project}: {first} and {second}")]
    DuplicateId {
        id: String,
        project: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("duplicate project prefix '{prefix}' used by {first} and {second}")]
    DuplicatePrefix {
        prefix: String,
        first: String,
        second: String,
    },

    #[error("invalid context id '{0}': expected PREFIX_NNN")]
    InvalidId(String),

    #[error("invalid project name '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidProjectName(String),

    #[error("malformed project manifest {path}: {reason}")]
    BadManifest { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors from plan computation. Non-retryable — the engine never guesses
/// a best-effort fix for a remap it cannot validate.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("context not found: {0}")]
    UnknownTarget(String),

    #[error("position {to} out of range for project with {len} contexts")]
    PositionOutOfRange { to: u32, len: usize },

    #[error("invalid remap: {0}")]
    InvalidRemap(String),
}

/// Errors from scanning the corpus for references to rewrite.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("unreadable file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ambiguous id match in {path}: {reason}")]
    AmbiguousMatch { path: PathBuf, reason: String },
}

/// Errors from the transactional applier. Failure before commit leaves the
/// live corpus untouched; failure during the swap is surfaced and never
/// retried.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("staging failed: {0}")]
    Staging(#[source] std::io::Error),

    #[error("staged edit did not match file {path}: expected '{expected}'")]
    StaleEdit { path: PathBuf, expected: String },

    #[error("staged tree violates invariant ({invariant}) in {path}")]
    StagedInvariant { invariant: String, path: PathBuf },

    #[error("atomic swap failed for {path}: {source}; displaced state kept at {staging}")]
    SwapFailed {
        path: PathBuf,
        staging: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Umbrella error for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
