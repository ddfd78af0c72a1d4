//! Section-by-section template generation.
//!
//! [`Generator::run`] validates a [`TemplateDraft`], then for each section in
//! order builds the meta-prompt, awaits one model call, and converts the reply
//! into a comment string. A reply that cannot be parsed only costs that
//! section its comment. A model failure aborts the run and nothing is
//! returned. Once every section is processed the document is assembled in
//! memory.
//!
//! ```ignore
//! let client = OpenAiClient::new(api_key)?;
//! let template = Generator::new(&client)
//!     .with_event_handler(&LoggingHandler)
//!     .run(&draft)
//!     .await?;
//! std::fs::write(&template.file_name, &template.document)?;
//! ```

use tracing::{debug, warn};

use crate::api::{SectionModel, UsageTracker, generate_run_id, pricing_for_model};
use crate::document::{assemble_document, template_file_name, template_title};
use crate::error::GenerationError;
use crate::events::{EventHandler, GenerationEvent, NoopHandler};
use crate::model::{GeneratedSectionConfig, ProcessedSection, SectionSpec, TemplateDraft};
use crate::prompt::build_section_prompt;

static NOOP: NoopHandler = NoopHandler;

/// A finished template, ready to be written to disk.
#[derive(Debug, Clone)]
pub struct GeneratedTemplate {
    pub run_id: String,
    /// Title derived from the first section.
    pub title: String,
    pub file_name: String,
    /// The serialized `.docx` package.
    pub document: Vec<u8>,
    pub sections: Vec<ProcessedSection>,
    pub usage: UsageTracker,
}

impl GeneratedTemplate {
    /// Number of sections that received a comment.
    pub fn comment_count(&self) -> usize {
        self.sections
            .iter()
            .filter(|s| s.comment_string.is_some())
            .count()
    }
}

/// Runs a draft through a [`SectionModel`].
pub struct Generator<'a> {
    model: &'a dyn SectionModel,
    handler: &'a dyn EventHandler,
}

impl<'a> Generator<'a> {
    pub fn new(model: &'a dyn SectionModel) -> Self {
        Self {
            model,
            handler: &NOOP,
        }
    }

    pub fn with_event_handler(mut self, handler: &'a dyn EventHandler) -> Self {
        self.handler = handler;
        self
    }

    /// Generate every section of `draft` and assemble the document.
    pub async fn run(&self, draft: &TemplateDraft) -> Result<GeneratedTemplate, GenerationError> {
        draft.validate()?;

        let run_id = generate_run_id();
        let model_name = self.model.model_name();
        let pricing = pricing_for_model(model_name);
        let total = draft.sections.len();
        let mut usage = UsageTracker::new();
        let mut processed = Vec::with_capacity(total);

        self.handler.on_event(&GenerationEvent::RunStarted {
            run_id: &run_id,
            model: model_name,
            sections: total,
        });

        for (index, section) in draft.sections.iter().enumerate() {
            self.handler.on_event(&GenerationEvent::SectionStarted {
                index,
                total,
                title: &section.title,
            });

            let prompt = build_section_prompt(&draft.master_context, &draft.input_files, section);
            debug!(%run_id, "Section {} prompt: {} chars", index + 1, prompt.len());

            let reply = self.model.complete_json(&prompt).await?;

            if let Some(tokens) = reply.usage {
                usage.record(tokens, &pricing);
                self.handler.on_event(&GenerationEvent::TokenUsage(tokens));
            }

            let comment = self.process_reply(index, section, &reply.content);
            processed.push(ProcessedSection::new(section.title.clone(), comment));
        }

        let first_title = draft
            .sections
            .first()
            .map(|s| s.title.as_str())
            .unwrap_or_default();
        let file_name = template_file_name(first_title);
        let document = assemble_document(&processed)?;

        let template = GeneratedTemplate {
            run_id,
            title: template_title(first_title).to_string(),
            file_name,
            document,
            sections: processed,
            usage,
        };

        self.handler.on_event(&GenerationEvent::Finished {
            file_name: &template.file_name,
            sections: template.sections.len(),
            comments: template.comment_count(),
            usage: &template.usage,
        });

        Ok(template)
    }

    fn process_reply(&self, index: usize, section: &SectionSpec, reply: &str) -> Option<String> {
        match GeneratedSectionConfig::from_json(reply) {
            Ok(config) => {
                if !section
                    .format
                    .allowed_sub_types()
                    .contains(&config.sub_type.as_str())
                {
                    warn!(
                        "Section '{}' ({}) came back with sub_type '{}'",
                        section.title, section.format, config.sub_type
                    );
                }
                self.handler.on_event(&GenerationEvent::SectionGenerated {
                    index,
                    title: &section.title,
                    config: &config,
                });
                Some(config.to_comment_string())
            }
            Err(error) => {
                self.handler.on_event(&GenerationEvent::CommentRejected {
                    index,
                    title: &section.title,
                    error: &error,
                });
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ModelFuture, ModelReply, TokenUsage};
    use crate::error::{ModelError, ValidationError};
    use crate::events::FnEventHandler;
    use crate::model::{FileType, InputFileDescriptor, SectionFormat};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays canned results in order and records every prompt.
    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<ModelReply, ModelError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<ModelReply, ModelError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl SectionModel for ScriptedModel {
        fn model_name(&self) -> &str {
            "gpt-4o-mini"
        }

        fn complete_json(&self, prompt: &str) -> ModelFuture<'_> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let next = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ModelError::EmptyResponse));
            Box::pin(async move { next })
        }
    }

    fn reply(json: &str) -> Result<ModelReply, ModelError> {
        Ok(ModelReply {
            content: json.to_string(),
            usage: Some(TokenUsage {
                prompt_tokens: 1000,
                completion_tokens: 200,
            }),
        })
    }

    fn draft() -> TemplateDraft {
        let mut draft = TemplateDraft {
            master_context: "Blueprint for a dealer group implementation.".into(),
            ..TemplateDraft::starter()
        };
        draft.add_input_file(InputFileDescriptor::new(
            "Org Chart",
            FileType::Pdf,
            "Reporting lines.",
        ));
        draft.add_section(SectionSpec::new(
            "Stakeholders",
            SectionFormat::TextBulleted,
            "List the decision makers.",
        ));
        draft.add_section(SectionSpec::new(
            "Systems Inventory",
            SectionFormat::Table,
            "Tabulate every system in use.",
        ));
        draft
    }

    #[tokio::test]
    async fn unparseable_reply_drops_only_that_comment() {
        let model = ScriptedModel::new(vec![
            reply(r#"{"type": "text", "sub_type": "freeform", "prompt": "*Role:* a\n\n*Task:* b"}"#),
            reply("not json"),
            reply(r#"{"type": "table", "sub_type": "default", "prompt": "*Role:* c"}"#),
        ]);
        let template = Generator::new(&model).run(&draft()).await.unwrap();

        assert_eq!(model.calls(), 3);
        assert_eq!(template.sections.len(), 3);
        assert_eq!(template.comment_count(), 2);
        assert!(template.sections[1].comment_string.is_none());
        assert_eq!(template.sections[2].title, "Systems Inventory");
        assert!(
            template.sections[0]
                .comment_string
                .as_deref()
                .unwrap()
                .contains(r"prompt - *Role:* a\n\n*Task:* b")
        );
        assert_eq!(template.file_name, "Klarity_Template_Executive_Summary.docx");
        assert_eq!(template.title, "Executive Summary");
        assert_eq!(template.usage.calls, 3);
        assert!(!template.document.is_empty());
    }

    #[tokio::test]
    async fn prompts_follow_section_order() {
        let model = ScriptedModel::new(vec![reply("{}"), reply("{}"), reply("{}")]);
        Generator::new(&model).run(&draft()).await.unwrap();

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("Executive Summary & Key Themes"));
        assert!(prompts[1].contains("List the decision makers."));
        assert!(prompts[2].contains("Tabulate every system in use."));
        assert!(prompts.iter().all(|p| p.contains("- Org Chart (PDF): Reporting lines.")));
    }

    #[tokio::test]
    async fn validation_failure_makes_no_model_calls() {
        let model = ScriptedModel::new(vec![reply("{}")]);
        let mut draft = draft();
        draft.master_context = "   ".into();

        let err = Generator::new(&model).run(&draft).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Validation(ValidationError::MissingMasterContext)
        ));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn authentication_failure_aborts_the_batch() {
        let model = ScriptedModel::new(vec![
            reply("{}"),
            Err(ModelError::Authentication("Incorrect API key".into())),
            reply("{}"),
        ]);
        let err = Generator::new(&model).run(&draft()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Model(ModelError::Authentication(_))));
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn rate_limit_aborts_on_first_section() {
        let model = ScriptedModel::new(vec![Err(ModelError::RateLimited("429".into()))]);
        let err = Generator::new(&model).run(&draft()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Model(ModelError::RateLimited(_))));
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn events_report_progress_and_rejections() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let handler = FnEventHandler::new(move |event| {
            let line = match event {
                GenerationEvent::RunStarted { sections, .. } => format!("start {sections}"),
                GenerationEvent::SectionStarted { index, total, .. } => {
                    format!("section {}/{total}", index + 1)
                }
                GenerationEvent::SectionGenerated { index, .. } => format!("ok {index}"),
                GenerationEvent::CommentRejected { index, .. } => format!("rejected {index}"),
                GenerationEvent::TokenUsage(_) => return,
                GenerationEvent::Finished { comments, .. } => format!("done {comments}"),
            };
            sink.lock().unwrap().push(line);
        });

        let model = ScriptedModel::new(vec![reply("{}"), reply("[]"), reply("{}")]);
        Generator::new(&model)
            .with_event_handler(&handler)
            .run(&draft())
            .await
            .unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "start 3",
                "section 1/3",
                "ok 0",
                "section 2/3",
                "rejected 1",
                "section 3/3",
                "ok 2",
                "done 2",
            ]
        );
    }
}
