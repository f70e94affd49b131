//! Error types for langgraph-core.
//!
//! Per-page problems (a deleted article, a payload without a wikibase item) are
//! not errors: they are recorded on the `Page` and the page is dropped from the
//! graph. Everything in this enum is a structural fault that aborts the
//! operation that observed it.

use thiserror::Error;

/// Top-level error enum for langgraph-core.
#[derive(Debug, Error)]
pub enum LangGraphError {
    /// Non-transient transport failure: bad status, undecodable body, client build error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Transient failures persisted beyond the configured retry ceiling.
    #[error("gave up fetching {target} after {attempts} attempts: {last}")]
    RetriesExhausted {
        target: String,
        attempts: u32,
        last: String,
    },

    /// Two paginated response fragments disagree on a scalar field.
    #[error("merge conflict at {path}: {left} != {right}")]
    MergeConflict {
        path: String,
        left: String,
        right: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invariant violated: {0}")]
    Invariant(String),

    /// A spawned fetch task panicked or was cancelled.
    #[error("fetch task failed: {0}")]
    Task(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("timestamp error: {0}")]
    Time(#[from] time::error::Parse),
}

impl LangGraphError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

impl From<tokio::task::JoinError> for LangGraphError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

pub type LangGraphResult<T> = Result<T, LangGraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_conflict_message_names_path() {
        let err = LangGraphError::MergeConflict {
            path: "$.query.pages.1.title".to_string(),
            left: "\"A\"".to_string(),
            right: "\"B\"".to_string(),
        };
        assert!(err.to_string().contains("$.query.pages.1.title"));
    }

    #[test]
    fn constructors_pick_variants() {
        assert!(matches!(
            LangGraphError::not_found("x"),
            LangGraphError::NotFound(_)
        ));
        assert!(matches!(
            LangGraphError::invalid_argument("x"),
            LangGraphError::InvalidArgument(_)
        ));
    }
}
