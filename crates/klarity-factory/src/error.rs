//! Error types for every stage of template generation.
//!
//! Each stage owns its own enum so callers can react precisely:
//! [`ValidationError`] stops a run before any model call, [`CommentError`]
//! only drops the comment of a single section, and [`ModelError`] /
//! [`DocumentError`] abort the whole batch. [`GenerationError`] is the union
//! returned by [`Generator::run`](crate::generator::Generator::run).

use thiserror::Error;

/// A draft that cannot be sent to the model.
///
/// The variants are checked in declaration order; the first failing check
/// wins. Display strings are the warnings shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please provide a Master Context before generating.")]
    MissingMasterContext,
    #[error("Please add at least one input file.")]
    NoInputFiles,
    #[error("Please provide names for all input files.")]
    UnnamedInputFile { index: usize },
    #[error("Please provide descriptions for all input files.")]
    UndescribedInputFile { index: usize },
    #[error("Please add at least one section.")]
    NoSections,
    #[error("Please provide titles for all sections.")]
    UntitledSection { index: usize },
    #[error("Please provide goals for all sections.")]
    SectionWithoutGoal { index: usize },
}

/// Failure talking to the language model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The API rejected the credential (HTTP 401).
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// The API throttled the request (HTTP 429).
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),
    /// The request never produced an HTTP response.
    #[error("request failed: {0}")]
    Request(String),
    /// Any other non-success status.
    #[error("API HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("failed to parse response: {0}")]
    MalformedResponse(String),
    #[error("model returned no message content")]
    EmptyResponse,
}

/// A model reply that could not be turned into a comment string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommentError {
    #[error("AI returned an invalid format. Could not parse the comment data: {0}")]
    InvalidFormat(String),
}

/// Failure serializing the output document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to write document package: {0}")]
    Pack(String),
}

/// Anything that aborts a generation run.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Document(#[from] DocumentError),
}
