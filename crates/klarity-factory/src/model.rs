//! Data model: the template draft the user edits and the per-section values
//! produced while generating a template.
//!
//! A [`TemplateDraft`] is owned by the caller. It is never held in ambient
//! state by this crate; the generator borrows it for the duration of a run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ── Input files ────────────────────────────────────────────────────

/// Kind of source file a template will later be run against.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    Pdf,
    #[default]
    Docx,
    Xlsx,
    Mp4,
    Txt,
    Csv,
}

impl FileType {
    pub const ALL: [FileType; 6] = [
        FileType::Pdf,
        FileType::Docx,
        FileType::Xlsx,
        FileType::Mp4,
        FileType::Txt,
        FileType::Csv,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FileType::Pdf => "PDF",
            FileType::Docx => "DOCX",
            FileType::Xlsx => "XLSX",
            FileType::Mp4 => "MP4",
            FileType::Txt => "TXT",
            FileType::Csv => "CSV",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('.');
        FileType::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown file type '{s}' (expected PDF, DOCX, XLSX, MP4, TXT or CSV)"))
    }
}

/// One input file the template's prompts may draw on.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct InputFileDescriptor {
    pub name: String,
    #[serde(rename = "type", default)]
    pub file_type: FileType,
    pub description: String,
}

impl InputFileDescriptor {
    pub fn new(
        name: impl Into<String>,
        file_type: FileType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            file_type,
            description: description.into(),
        }
    }
}

// ── Sections ───────────────────────────────────────────────────────

/// Desired output format of a document section.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SectionFormat {
    #[default]
    #[serde(rename = "Text (Freeform)")]
    TextFreeform,
    #[serde(rename = "Text (Bulleted)")]
    TextBulleted,
    #[serde(rename = "Table")]
    Table,
}

impl SectionFormat {
    pub fn label(self) -> &'static str {
        match self {
            SectionFormat::TextFreeform => "Text (Freeform)",
            SectionFormat::TextBulleted => "Text (Bulleted)",
            SectionFormat::Table => "Table",
        }
    }

    /// The `sub_type` values the model is allowed to pick for this format.
    pub fn allowed_sub_types(self) -> &'static [&'static str] {
        match self {
            SectionFormat::TextFreeform | SectionFormat::TextBulleted => &["freeform", "bulleted"],
            SectionFormat::Table => &["default"],
        }
    }
}

impl fmt::Display for SectionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SectionFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "freeform" | "text" | "text (freeform)" => Ok(SectionFormat::TextFreeform),
            "bulleted" | "text (bulleted)" => Ok(SectionFormat::TextBulleted),
            "table" => Ok(SectionFormat::Table),
            _ => Err(format!(
                "unknown section format '{s}' (expected freeform, bulleted or table)"
            )),
        }
    }
}

/// One section of the output document.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct SectionSpec {
    pub title: String,
    #[serde(default)]
    pub format: SectionFormat,
    pub goal: String,
}

impl SectionSpec {
    pub fn new(title: impl Into<String>, format: SectionFormat, goal: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            format,
            goal: goal.into(),
        }
    }
}

// ── Generated values ───────────────────────────────────────────────

/// Section configuration returned by the model, with defaults applied.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct GeneratedSectionConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub sub_type: String,
    pub prompt: String,
    pub include_screenshots: String,
    pub screenshot_instructions: String,
}

impl Default for GeneratedSectionConfig {
    fn default() -> Self {
        Self {
            kind: String::new(),
            sub_type: String::new(),
            prompt: String::new(),
            include_screenshots: "no".to_string(),
            screenshot_instructions: "none".to_string(),
        }
    }
}

/// A section ready for the document: its title and, when the model reply
/// could be parsed, the serialized comment string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessedSection {
    pub title: String,
    pub comment_string: Option<String>,
}

impl ProcessedSection {
    pub fn new(title: impl Into<String>, comment_string: Option<String>) -> Self {
        Self {
            title: title.into(),
            comment_string,
        }
    }
}

// ── Draft ──────────────────────────────────────────────────────────

/// Everything the user fills in before generating a template.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct TemplateDraft {
    #[serde(default)]
    pub master_context: String,
    #[serde(default)]
    pub input_files: Vec<InputFileDescriptor>,
    #[serde(default)]
    pub sections: Vec<SectionSpec>,
}

impl TemplateDraft {
    /// A draft pre-filled with one example input file and one example
    /// section. The master context is left empty.
    pub fn starter() -> Self {
        Self {
            master_context: String::new(),
            input_files: vec![InputFileDescriptor::new(
                "Discovery Call Transcript",
                FileType::Docx,
                "Meeting notes and transcript from the initial discovery call with the client, \
                 including their current system details and requirements.",
            )],
            sections: vec![SectionSpec::new(
                "Executive Summary & Key Themes",
                SectionFormat::TextFreeform,
                "Summarize the client's profile (name, size, current system) and list the 3-4 \
                 most important, high-level implementation themes.",
            )],
        }
    }

    pub fn add_input_file(&mut self, file: InputFileDescriptor) {
        self.input_files.push(file);
    }

    /// Remove the input file at `index`. Out-of-range indices are a no-op.
    pub fn remove_input_file(&mut self, index: usize) -> Option<InputFileDescriptor> {
        (index < self.input_files.len()).then(|| self.input_files.remove(index))
    }

    pub fn add_section(&mut self, section: SectionSpec) {
        self.sections.push(section);
    }

    /// Remove the section at `index`. Out-of-range indices are a no-op.
    pub fn remove_section(&mut self, index: usize) -> Option<SectionSpec> {
        (index < self.sections.len()).then(|| self.sections.remove(index))
    }

    /// Check that every required field is filled in.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.master_context) {
            return Err(ValidationError::MissingMasterContext);
        }
        if self.input_files.is_empty() {
            return Err(ValidationError::NoInputFiles);
        }
        if let Some(index) = self.input_files.iter().position(|f| is_blank(&f.name)) {
            return Err(ValidationError::UnnamedInputFile { index });
        }
        if let Some(index) = self.input_files.iter().position(|f| is_blank(&f.description)) {
            return Err(ValidationError::UndescribedInputFile { index });
        }
        if self.sections.is_empty() {
            return Err(ValidationError::NoSections);
        }
        if let Some(index) = self.sections.iter().position(|s| is_blank(&s.title)) {
            return Err(ValidationError::UntitledSection { index });
        }
        if let Some(index) = self.sections.iter().position(|s| is_blank(&s.goal)) {
            return Err(ValidationError::SectionWithoutGoal { index });
        }
        Ok(())
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_draft() -> TemplateDraft {
        TemplateDraft {
            master_context: "Process definition after a discovery call.".into(),
            ..TemplateDraft::starter()
        }
    }

    #[test]
    fn starter_draft_needs_master_context() {
        let draft = TemplateDraft::starter();
        assert_eq!(draft.input_files.len(), 1);
        assert_eq!(draft.sections[0].title, "Executive Summary & Key Themes");
        assert_eq!(draft.validate(), Err(ValidationError::MissingMasterContext));
    }

    #[test]
    fn valid_draft_passes() {
        assert_eq!(valid_draft().validate(), Ok(()));
    }

    #[test]
    fn validation_order_is_stable() {
        let mut draft = valid_draft();
        draft.input_files[0].description = "  ".into();
        draft.sections[0].goal.clear();
        assert_eq!(
            draft.validate(),
            Err(ValidationError::UndescribedInputFile { index: 0 })
        );

        draft.input_files.clear();
        assert_eq!(draft.validate(), Err(ValidationError::NoInputFiles));
    }

    #[test]
    fn blank_section_fields_are_reported_with_index() {
        let mut draft = valid_draft();
        draft.add_section(SectionSpec::new("", SectionFormat::Table, "goal"));
        assert_eq!(
            draft.validate(),
            Err(ValidationError::UntitledSection { index: 1 })
        );

        draft.sections[1].title = "Systems".into();
        draft.sections[1].goal = "\t".into();
        assert_eq!(
            draft.validate(),
            Err(ValidationError::SectionWithoutGoal { index: 1 })
        );

        draft.sections.clear();
        assert_eq!(draft.validate(), Err(ValidationError::NoSections));
    }

    #[test]
    fn remove_out_of_range_is_noop() {
        let mut draft = valid_draft();
        assert!(draft.remove_section(5).is_none());
        assert!(draft.remove_input_file(1).is_none());
        assert_eq!(draft.sections.len(), 1);

        let removed = draft.remove_input_file(0).unwrap();
        assert_eq!(removed.name, "Discovery Call Transcript");
        assert!(draft.input_files.is_empty());
    }

    #[test]
    fn draft_json_uses_display_labels() {
        let json = serde_json::to_value(valid_draft()).unwrap();
        assert_eq!(json["input_files"][0]["type"], "DOCX");
        assert_eq!(json["sections"][0]["format"], "Text (Freeform)");

        let parsed: TemplateDraft = serde_json::from_str(
            r#"{"master_context":"m","input_files":[{"name":"a","type":"CSV","description":"d"}],
                "sections":[{"title":"t","format":"Table","goal":"g"}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.input_files[0].file_type, FileType::Csv);
        assert_eq!(parsed.sections[0].format, SectionFormat::Table);
    }

    #[test]
    fn parse_labels() {
        assert_eq!("pdf".parse::<FileType>(), Ok(FileType::Pdf));
        assert_eq!(".mp4".parse::<FileType>(), Ok(FileType::Mp4));
        assert!("doc".parse::<FileType>().is_err());
        assert_eq!("Bulleted".parse::<SectionFormat>(), Ok(SectionFormat::TextBulleted));
        assert_eq!("TABLE".parse::<SectionFormat>(), Ok(SectionFormat::Table));
        assert!("chart".parse::<SectionFormat>().is_err());
    }

    #[test]
    fn sub_type_rule_per_format() {
        assert_eq!(SectionFormat::Table.allowed_sub_types(), &["default"]);
        assert!(SectionFormat::TextBulleted.allowed_sub_types().contains(&"bulleted"));
    }
}
