//! Progress events emitted while a template is generated.
//!
//! The [`Generator`](crate::generator::Generator) reports each step of a run
//! through an [`EventHandler`]. Handlers are purely observational; they
//! cannot change the outcome of a run.
//!
//! | Handler | Use case |
//! |---------|----------|
//! | [`NoopHandler`] | Tests, library callers that only want the result |
//! | [`LoggingHandler`] | Structured logging via `tracing` |
//! | [`FnEventHandler`] | Quick closures |
//! | [`CompositeEventHandler`] | Several handlers in order |

use tracing::{debug, info, warn};

use crate::api::{TokenUsage, UsageTracker};
use crate::error::CommentError;
use crate::model::GeneratedSectionConfig;

/// Events emitted by the generator during a run.
#[derive(Debug)]
pub enum GenerationEvent<'a> {
    /// Validation passed and the first model call is about to start.
    RunStarted {
        run_id: &'a str,
        model: &'a str,
        sections: usize,
    },
    /// A section's prompt is being sent to the model. `index` is 0-based.
    SectionStarted {
        index: usize,
        total: usize,
        title: &'a str,
    },
    /// The model reply parsed into a configuration.
    SectionGenerated {
        index: usize,
        title: &'a str,
        config: &'a GeneratedSectionConfig,
    },
    /// The model reply could not be parsed; the section gets no comment.
    CommentRejected {
        index: usize,
        title: &'a str,
        error: &'a CommentError,
    },
    /// Token usage reported for the last model call.
    TokenUsage(TokenUsage),
    /// All sections were processed and the document was assembled.
    Finished {
        file_name: &'a str,
        sections: usize,
        comments: usize,
        usage: &'a UsageTracker,
    },
}

/// Observer for [`GenerationEvent`]s.
///
/// # Example
///
/// ```ignore
/// struct Progress;
///
/// impl EventHandler for Progress {
///     fn on_event(&self, event: &GenerationEvent<'_>) {
///         if let GenerationEvent::SectionStarted { index, total, title } = event {
///             eprintln!("[{}/{total}] {title}", index + 1);
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &GenerationEvent<'_>) {
        let _ = event;
    }
}

/// Ignores every event.
pub struct NoopHandler;
impl EventHandler for NoopHandler {}

/// An event handler backed by a closure.
pub struct FnEventHandler<F>(F)
where
    F: Fn(&GenerationEvent<'_>) + Send + Sync;

impl<F> FnEventHandler<F>
where
    F: Fn(&GenerationEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventHandler for FnEventHandler<F>
where
    F: Fn(&GenerationEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &GenerationEvent<'_>) {
        (self.0)(event)
    }
}

/// Dispatches every event to each inner handler, in registration order.
#[derive(Default)]
pub struct CompositeEventHandler {
    handlers: Vec<Box<dyn EventHandler>>,
}

impl CompositeEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }
}

impl EventHandler for CompositeEventHandler {
    fn on_event(&self, event: &GenerationEvent<'_>) {
        for handler in &self.handlers {
            handler.on_event(event);
        }
    }
}

/// Logs events through `tracing`.
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &GenerationEvent<'_>) {
        match event {
            GenerationEvent::RunStarted {
                run_id,
                model,
                sections,
            } => {
                info!(%run_id, %model, "Generating {sections} section(s)");
            }
            GenerationEvent::SectionStarted {
                index,
                total,
                title,
            } => {
                info!("Generating prompt for section {}/{total}: '{title}'", index + 1);
            }
            GenerationEvent::SectionGenerated { title, config, .. } => {
                debug!(
                    "Section '{title}': type={}, sub_type={}, prompt {} chars",
                    config.kind,
                    config.sub_type,
                    config.prompt.len()
                );
            }
            GenerationEvent::CommentRejected { title, error, .. } => {
                warn!("Section '{title}' has no comment: {error}");
            }
            GenerationEvent::TokenUsage(usage) => {
                debug!(
                    "Tokens: prompt={}, completion={}",
                    usage.prompt_tokens, usage.completion_tokens
                );
            }
            GenerationEvent::Finished {
                file_name,
                sections,
                comments,
                usage,
            } => {
                info!(
                    "Assembled {file_name}: {sections} section(s), {comments} comment(s); {}",
                    usage.summary()
                );
            }
        }
    }
}
