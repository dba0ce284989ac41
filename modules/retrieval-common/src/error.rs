//! The error-kind taxonomy (spec §7). `provider-reject`/`provider-failure`
//! are intentionally soft: they never propagate past a connector or the
//! extractor, becoming metrics entries instead (spec §4.6.9, §7).

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Cancelled,
    Deadline,
    Network,
    Parse,
    ProviderReject,
    ProviderFailure,
    ArtifactIo,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Deadline => "deadline",
            ErrorKind::Network => "network",
            ErrorKind::Parse => "parse",
            ErrorKind::ProviderReject => "provider-reject",
            ErrorKind::ProviderFailure => "provider-failure",
            ErrorKind::ArtifactIo => "artifact-io",
            ErrorKind::Internal => "internal",
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{kind:?}: {message}")]
pub struct RetrievalError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RetrievalError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "run cancelled")
    }

    pub fn deadline() -> Self {
        Self::new(ErrorKind::Deadline, "deadline exceeded")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn artifact_io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ArtifactIo, message)
    }
}
