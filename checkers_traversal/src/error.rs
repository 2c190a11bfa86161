//! Error types surfaced at the `checkers_traversal` boundary.

use thiserror::Error;

/// Why a checkpoint failed to load. Matched on by `resume_or_start`, which
/// treats every variant identically to "no checkpoint" and starts fresh.
#[derive(Error, Debug)]
pub enum InvalidCheckpoint {
    #[error("bad checkpoint magic")]
    BadMagic,

    #[error("checkpoint truncated: expected at least {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("unsupported checkpoint version {0}")]
    UnsupportedVersion(u32),

    #[error("checkpoint read failed")]
    Io(#[source] std::io::Error),
}

#[derive(Error, Debug)]
pub enum TraversalError {
    #[error("invalid checkpoint")]
    InvalidCheckpoint(#[source] InvalidCheckpoint),

    #[error("failed to write checkpoint")]
    CheckpointWriteFailure {
        #[source]
        source: std::io::Error,
    },
}
