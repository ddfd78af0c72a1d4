//! Model boundary: the [`SectionModel`] seam, the OpenAI client behind it,
//! and token usage tracking.
//!
//! - [`openai`]: chat-completions client constrained to JSON-object replies.
//!   Maps HTTP 401 and 429 onto dedicated [`ModelError`] variants.
//! - [`usage`]: run ids, per-model pricing and the cumulative
//!   [`UsageTracker`].

pub mod openai;
pub mod usage;

use std::future::Future;
use std::pin::Pin;

use crate::error::ModelError;

pub use openai::{DEFAULT_MODEL, DEFAULT_TEMPERATURE, OPENAI_BASE_URL, OpenAiClient};
pub use usage::{TokenUsage, UsageTracker, generate_run_id, pricing_for_model};

/// What a model returns for one section prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    /// The raw JSON text of the reply.
    pub content: String,
    pub usage: Option<TokenUsage>,
}

impl ModelReply {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }
}

/// Boxed future returned by [`SectionModel::complete_json`].
pub type ModelFuture<'a> = Pin<Box<dyn Future<Output = Result<ModelReply, ModelError>> + Send + 'a>>;

/// A language model that answers a prompt with a JSON object.
///
/// The generator only talks to the model through this trait, so the prompt
/// builder and comment transformer can be exercised without a network.
///
/// # Example
///
/// ```ignore
/// struct Canned;
///
/// impl SectionModel for Canned {
///     fn model_name(&self) -> &str {
///         "canned"
///     }
///
///     fn complete_json(&self, _prompt: &str) -> ModelFuture<'_> {
///         Box::pin(async { Ok(ModelReply::new(r#"{"type": "text"}"#)) })
///     }
/// }
/// ```
pub trait SectionModel: Send + Sync {
    /// Model identifier, used for logging and pricing.
    fn model_name(&self) -> &str;

    /// Send `prompt` as a single user message and return the reply text.
    fn complete_json(&self, prompt: &str) -> ModelFuture<'_>;
}
