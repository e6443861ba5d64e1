//! Error types shared by every topology operation.
//!
//! Operations return [`TopologyError`] values carrying a machine-checkable
//! [`ErrorKind`] and a human-readable message. The request-routing layer
//! maps kinds to status codes through [`TopologyError::status`].

use serde::{Deserialize, Serialize};

/// Result alias used across the crate
pub type Result<T, E = TopologyError> = std::result::Result<T, E>;

/// Errors raised while loading, querying or transforming topologies
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    /// Requested network/snapshot/layer/node/term-point is absent
    #[error("Not found: {0}")]
    NotFound(String),
    /// A support reference or link endpoint failed to resolve during a merge
    #[error("Resolution failed: {0}")]
    Resolution(String),
    /// A request targets something it is not allowed to touch
    #[error("Validation failed: {0}")]
    Validation(String),
    /// Candidate synthesizer was given an unknown use case name
    #[error("Unsupported usecase: {0}")]
    UnsupportedUseCase(String),
    /// A candidate index exceeds the size of the prefix-set it edits
    #[error("Index out of range: {index} (size {size})")]
    IndexOutOfRange { index: usize, size: usize },
    /// Topology data breaks a structural invariant
    #[error("Topology data error: {0}")]
    Integrity(String),
    /// The external store failed for a reason other than a missing key
    #[error("Store error: {0}")]
    Store(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Machine-checkable classification of a [`TopologyError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Resolution,
    Validation,
    UnsupportedUseCase,
    IndexOutOfRange,
    Integrity,
    Store,
}

impl TopologyError {
    /// Kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Resolution(_) => ErrorKind::Resolution,
            Self::Validation(_) => ErrorKind::Validation,
            Self::UnsupportedUseCase(_) => ErrorKind::UnsupportedUseCase,
            Self::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Self::Integrity(_) | Self::Json(_) | Self::Yaml(_) => ErrorKind::Integrity,
            Self::Store(_) | Self::Io(_) => ErrorKind::Store,
        }
    }

    /// HTTP-style status the routing layer reports for this error
    pub fn status(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::UnsupportedUseCase => 400,
            _ => 500,
        }
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub(crate) fn resolution(what: impl Into<String>) -> Self {
        Self::Resolution(what.into())
    }

    pub(crate) fn validation(what: impl Into<String>) -> Self {
        Self::Validation(what.into())
    }

    pub(crate) fn integrity(what: impl Into<String>) -> Self {
        Self::Integrity(what.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_status() {
        let err = TopologyError::not_found("layer bgp_as");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.status(), 404);
        assert_eq!(err.to_string(), "Not found: layer bgp_as");

        let err = TopologyError::IndexOutOfRange { index: 4, size: 3 };
        assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
        assert_eq!(err.status(), 500);

        let err = TopologyError::UnsupportedUseCase("foo".to_string());
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_json_error_is_integrity() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: TopologyError = json_err.into();
        assert_eq!(err.kind(), ErrorKind::Integrity);
    }
}
