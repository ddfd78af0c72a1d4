//! Template factory for Klarity Architect.
//!
//! A template is a `.docx` document whose section headings carry review
//! comments. Each comment is a five-line configuration (`type`, `sub_type`,
//! `prompt`, `include_screenshots`, `screenshot_instructions`) that Klarity
//! Architect reads to know how to fill that section. This crate writes those
//! configurations with a language model: the user describes the template's
//! purpose, its input files and, for each section, a plain-language goal; the
//! model turns each goal into a structured extraction prompt.
//!
//! # Getting started
//!
//! ```ignore
//! use klarity_factory::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut draft = TemplateDraft::starter();
//!     draft.master_context = "Process definition after a discovery call.".into();
//!
//!     let client = OpenAiClient::new(std::env::var("OPENAI_API_KEY")?)?;
//!     let template = Generator::new(&client)
//!         .with_event_handler(&LoggingHandler)
//!         .run(&draft)
//!         .await?;
//!
//!     std::fs::write(&template.file_name, &template.document)?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`model`] | [`TemplateDraft`](model::TemplateDraft), input files, sections, validation |
//! | [`prompt`] | Meta-prompt construction for one section |
//! | [`comment`] | Model reply → five-line comment string |
//! | [`document`] | `.docx` assembly with anchored comments, file naming |
//! | [`api`] | [`SectionModel`](api::SectionModel) seam, OpenAI client, token usage |
//! | [`generator`] | Sequential run over all sections |
//! | [`events`] | Progress events and handlers |
//! | [`error`] | Error types for each stage |

pub mod api;
pub mod comment;
pub mod document;
pub mod error;
pub mod events;
pub mod generator;
pub mod model;
pub mod prelude;
pub mod prompt;

pub use api::{ModelReply, OpenAiClient, SectionModel};
pub use comment::format_comment_string;
pub use document::{assemble_document, template_file_name};
pub use error::{CommentError, DocumentError, GenerationError, ModelError, ValidationError};
pub use generator::{GeneratedTemplate, Generator};
pub use model::{
    FileType, GeneratedSectionConfig, InputFileDescriptor, ProcessedSection, SectionFormat,
    SectionSpec, TemplateDraft,
};
pub use prompt::build_section_prompt;
