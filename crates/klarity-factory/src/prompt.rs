//! Meta-prompt construction.
//!
//! [`build_section_prompt`] turns the master context, the input files and a
//! single [`SectionSpec`] into the prompt sent to the model. The text is
//! assembled with [`PromptBuilder`], which joins labelled blocks with blank
//! lines and drops blocks whose body is empty.
//!
//! Nothing here escapes its inputs. The model receives user text verbatim.

use crate::model::{InputFileDescriptor, SectionSpec};

/// Builder for prompts made of `**Label:**` blocks.
///
/// ```
/// use klarity_factory::prompt::PromptBuilder;
///
/// let prompt = PromptBuilder::new("You are a careful assistant.")
///     .block("Context", "Quarterly review.")
///     .block("Empty", "")
///     .build();
///
/// assert!(prompt.contains("**Context:**\nQuarterly review."));
/// assert!(!prompt.contains("**Empty:**"));
/// ```
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    blocks: Vec<String>,
}

impl PromptBuilder {
    /// Start a prompt with an unlabelled preamble.
    pub fn new(preamble: impl Into<String>) -> Self {
        Self {
            blocks: vec![preamble.into()],
        }
    }

    /// Append a labelled block. Skipped if `body` is empty.
    pub fn block(mut self, label: &str, body: impl Into<String>) -> Self {
        let body = body.into();
        if !body.is_empty() {
            self.blocks.push(format!("**{label}:**\n{body}"));
        }
        self
    }

    /// Append a labelled block only when `condition` holds.
    pub fn block_if(self, condition: bool, label: &str, body_fn: impl FnOnce() -> String) -> Self {
        if condition {
            self.block(label, body_fn())
        } else {
            self
        }
    }

    /// Append text without a label. Skipped if empty.
    pub fn raw(mut self, content: impl Into<String>) -> Self {
        let content = content.into();
        if !content.is_empty() {
            self.blocks.push(content);
        }
        self
    }

    pub fn build(self) -> String {
        self.blocks.join("\n\n")
    }
}

const PREAMBLE: &str = "\
You are an AI assistant specialized in creating configuration prompts for a tool called Klarity Architect.
Your task is to generate the configuration for a single section of a template.";

const INSTRUCTIONS: &str = r#"Based on all the information above, you must generate a detailed, expert-level prompt that a second LLM will use to extract information from documents. This prompt MUST be self-contained and structured with **Role**, **Context**, **Task**, and **Instructions**. It should be highly specific and actionable.

**CRITICAL: You MUST follow this EXACT template format. Do not deviate from the line breaks or structure:**

TEMPLATE:
"*Role:* [Your role description here]\n\n*Context:* [Your context description here]\n\n*Task:* [Your task description here]\n\n*Instructions:*\n\n1. [First instruction]\n2. [Second instruction]\n3. [Third instruction]"

**REQUIREMENTS:**
- Use *Role:*, *Context:*, *Task:*, and *Instructions:* (with asterisks)
- You MUST use \n\n (double line breaks) between sections: after Role, after Context, after Task
- You MUST use \n\n (double line breaks) after *Instructions:* and before the first numbered item
- Use \n (single line break) for bullet points within instructions
- Number the instructions with 1., 2., 3., etc.
- Use bullet points (*) for sub-items within instructions
- Consider the available input files when crafting the Context and Instructions sections"#;

const OUTPUT_FORMAT: &str = r#"You must respond with ONLY a single, valid JSON object. Do not add any conversational text, explanations, or markdown formatting like ```json. The JSON object must have these exact keys: "type", "sub_type", "prompt", "include_screenshots", "screenshot_instructions".

Example of a perfect response:
{
    "type": "text",
    "sub_type": "freeform",
    "prompt": "*Role:* You are an expert Senior Implementation Consultant specializing in large, multi-site dealer groups and their migration between dealer management systems.\n\n*Context:* You are reviewing the provided discovery call transcript(s) with a new dealership prospect. Use the transcripts to understand the dealer's current systems, accounting structure and pain points, and what they imply for the implementation.\n\n*Task:* Draft the *Executive Summary & Key Implementation Themes* section of an internal implementation blueprint. It must be concise and strategic, written for an Engagement Manager who needs to grasp the project quickly.\n\n*Instructions:*\n\n1. *Executive Summary:* Write a brief paragraph summarizing the dealership's profile. Include:\n * The dealer group's name.\n * Their scale (number of rooftops, brands mentioned).\n * Their current system.\n * Their core operational and accounting structure.\n\n2. *Key Implementation Themes:* Identify the *3-4 most critical, overarching themes* for this implementation and give one sentence on the significance of each.\n * *Focus on Synthesis, Not Just Summary:* Combine related issues into a single strategic theme.\n * *Example theme:* `Significant Process Modernization:` if the dealer relies on manual workarounds or spreadsheets that the new platform will replace.",
    "include_screenshots": "no",
    "screenshot_instructions": "none"
}"#;

/// Render the input files as `- name (type): description` lines.
pub fn render_input_files(input_files: &[InputFileDescriptor]) -> String {
    input_files
        .iter()
        .map(|f| format!("- {} ({}): {}", f.name, f.file_type, f.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the prompt that asks the model for one section's configuration.
pub fn build_section_prompt(
    master_context: &str,
    input_files: &[InputFileDescriptor],
    section: &SectionSpec,
) -> String {
    let format = section.format.label();

    let details = format!(
        "*   **Section Title:** \"{}\"\n\
         *   **Plain Language Goal:** \"{}\"\n\
         *   **Required Output Format:** \"{format}\"",
        section.title, section.goal,
    );

    let sub_type_rule = format!(
        "In addition to the main prompt, determine the best 'sub_type' for the '{format}'.\n\
         *   If format is 'Text', the sub_type must be 'freeform' or 'bulleted'.\n\
         *   If format is 'Table', the sub_type must be 'default'."
    );

    PromptBuilder::new(PREAMBLE)
        .block("Master Template Context", format!("---\n{master_context}\n---"))
        .block_if(!input_files.is_empty(), "Available Input Files", || {
            render_input_files(input_files)
        })
        .block("Section Details to Configure", details)
        .block("Your Instructions", INSTRUCTIONS)
        .raw(sub_type_rule)
        .block("CRITICAL OUTPUT FORMAT", OUTPUT_FORMAT)
        .build()
}
