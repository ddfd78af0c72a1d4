//! User-facing progress and failure messages.

use klarity_factory::prelude::*;

use crate::config::API_KEY_ENV;

/// What to tell the user when a run stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub message: String,
    pub hint: Option<String>,
}

impl FailureReport {
    /// A plain error with no hint, for draft editing and file problems.
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            message: format!("Error: {message}"),
            hint: None,
        }
    }
}

/// Map a failed run onto the message shown to the user.
pub fn failure_report(error: &GenerationError) -> FailureReport {
    match error {
        GenerationError::Validation(e) => FailureReport {
            message: format!("Warning: {e}"),
            hint: None,
        },
        GenerationError::Model(ModelError::Authentication(_)) => FailureReport {
            message: format!(
                "Authentication Error: Please check your OpenAI API key in {API_KEY_ENV}."
            ),
            hint: None,
        },
        GenerationError::Model(ModelError::RateLimited(_)) => FailureReport {
            message: "Rate limit exceeded. Please wait a moment and try again.".to_string(),
            hint: None,
        },
        other => unexpected_failure(other),
    }
}

/// The generic report for anything without a dedicated message.
pub fn unexpected_failure(error: impl std::fmt::Display) -> FailureReport {
    FailureReport {
        message: format!("An error occurred: {error}"),
        hint: Some(format!(
            "Tip: Make sure your OpenAI API key is correctly set in {API_KEY_ENV}."
        )),
    }
}

/// Prints one line per section to stderr.
pub struct ProgressHandler;

impl EventHandler for ProgressHandler {
    fn on_event(&self, event: &GenerationEvent<'_>) {
        match event {
            GenerationEvent::SectionStarted {
                index,
                total,
                title,
            } => {
                eprintln!(
                    "  [{}/{total}] Generating prompt for section: '{title}'...",
                    index + 1
                );
            }
            GenerationEvent::CommentRejected { title, error, .. } => {
                eprintln!("  Error in '{title}': {error}");
            }
            GenerationEvent::Finished { usage, .. } => {
                eprintln!("  All sections processed! ({})", usage.summary());
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_errors_have_no_hint() {
        let report = FailureReport::error("draft 'x.json' already exists");
        assert_eq!(report.message, "Error: draft 'x.json' already exists");
        assert!(report.hint.is_none());
    }

    #[test]
    fn validation_is_a_warning() {
        let report = failure_report(&ValidationError::NoSections.into());
        assert_eq!(report.message, "Warning: Please add at least one section.");
        assert!(report.hint.is_none());
    }

    #[test]
    fn authentication_points_at_the_key() {
        let report = failure_report(&ModelError::Authentication("401".into()).into());
        assert!(report.message.starts_with("Authentication Error"));
        assert!(report.message.contains("OPENAI_API_KEY"));
    }

    #[test]
    fn rate_limit_asks_to_retry_later() {
        let report = failure_report(&ModelError::RateLimited("429".into()).into());
        assert_eq!(
            report.message,
            "Rate limit exceeded. Please wait a moment and try again."
        );
    }

    #[test]
    fn anything_else_gets_generic_message_and_hint() {
        let report = failure_report(&ModelError::EmptyResponse.into());
        assert!(report.message.starts_with("An error occurred: "));
        assert!(report.hint.unwrap().starts_with("Tip:"));
    }
}
