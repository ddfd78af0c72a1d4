//! Convenience re-exports for programs that drive a generation run.
//!
//! ```ignore
//! use klarity_factory::prelude::*;
//! ```

pub use crate::api::{ModelFuture, ModelReply, OpenAiClient, SectionModel, UsageTracker};
pub use crate::error::{GenerationError, ModelError, ValidationError};
pub use crate::events::{
    CompositeEventHandler, EventHandler, FnEventHandler, GenerationEvent, LoggingHandler,
    NoopHandler,
};
pub use crate::generator::{GeneratedTemplate, Generator};
pub use crate::model::{
    FileType, InputFileDescriptor, ProcessedSection, SectionFormat, SectionSpec, TemplateDraft,
};
