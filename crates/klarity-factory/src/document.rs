//! Output document assembly.
//!
//! Every [`ProcessedSection`] becomes one level-1 heading. When the section
//! carries a comment string, a review comment is anchored around the
//! heading's run. The package is written to memory and returned as bytes.

use std::io::Cursor;

use chrono::Utc;
use docx_rs::{BreakType, Comment, Docx, Paragraph, Run, Style, StyleType};
use tracing::debug;

use crate::error::DocumentError;
use crate::model::ProcessedSection;

/// Author recorded on every generated comment.
pub const COMMENT_AUTHOR: &str = "System";

/// Paragraph style id used for section headings.
pub const HEADING_STYLE: &str = "Heading1";

/// Prefix of every generated file name.
pub const FILE_NAME_PREFIX: &str = "Klarity_Template_";
/// Extension of every generated file name, without the dot.
pub const FILE_EXTENSION: &str = "docx";

/// MIME type of the generated package.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Title of a template: the first section's title up to its first `&`.
pub fn template_title(first_section_title: &str) -> &str {
    first_section_title
        .split('&')
        .next()
        .unwrap_or_default()
        .trim()
}

/// File name for a template whose first section has the given title.
///
/// Spaces become `_`. Path separators and other characters that are not
/// allowed in file names also become `_`, so the result is always a single
/// path component.
///
/// ```
/// use klarity_factory::document::template_file_name;
///
/// assert_eq!(
///     template_file_name("Executive Summary & Key Themes"),
///     "Klarity_Template_Executive_Summary.docx"
/// );
/// ```
pub fn template_file_name(first_section_title: &str) -> String {
    let stem: String = template_title(first_section_title)
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{FILE_NAME_PREFIX}{stem}.{FILE_EXTENSION}")
}

fn heading_style() -> Style {
    Style::new(HEADING_STYLE, StyleType::Paragraph)
        .name("Heading 1")
        .size(32)
        .bold()
}

/// One comment holding every line of `text` in a single paragraph, with
/// line breaks between them. Each paragraph of a comment is written as its
/// own `<w:comment>` element, so more than one would duplicate the id.
fn comment_for(id: usize, text: &str, date: &str) -> Comment {
    let run = text.lines().enumerate().fold(Run::new(), |run, (i, line)| {
        let run = if i == 0 {
            run
        } else {
            run.add_break(BreakType::TextWrapping)
        };
        run.add_text(line)
    });
    Comment::new(id)
        .author(COMMENT_AUTHOR)
        .date(date)
        .add_paragraph(Paragraph::new().add_run(run))
}

/// Build the in-memory document model for `sections`.
///
/// `date` is stamped on every comment (ISO 8601).
pub fn build_document(sections: &[ProcessedSection], date: &str) -> Docx {
    let mut docx = Docx::new().add_style(heading_style());
    let mut next_comment_id = 1;

    for section in sections {
        let run = Run::new().add_text(&section.title);
        let heading = match &section.comment_string {
            Some(text) => {
                let id = next_comment_id;
                next_comment_id += 1;
                Paragraph::new()
                    .style(HEADING_STYLE)
                    .add_comment_start(comment_for(id, text, date))
                    .add_run(run)
                    .add_comment_end(id)
            }
            None => Paragraph::new().style(HEADING_STYLE).add_run(run),
        };
        docx = docx.add_paragraph(heading);
    }

    debug!(
        "Assembled document: {} heading(s), {} comment(s)",
        sections.len(),
        next_comment_id - 1
    );
    docx
}

/// Assemble and serialize the document for `sections`.
pub fn assemble_document(sections: &[ProcessedSection]) -> Result<Vec<u8>, DocumentError> {
    let date = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    pack(build_document(sections, &date))
}

fn pack(docx: Docx) -> Result<Vec<u8>, DocumentError> {
    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| DocumentError::Pack(e.to_string()))?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut xml = String::new();
        part.read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn file_name_uses_text_before_ampersand() {
        assert_eq!(
            template_file_name("Executive Summary & Key Themes"),
            "Klarity_Template_Executive_Summary.docx"
        );
        assert_eq!(
            template_file_name("  Current State Review "),
            "Klarity_Template_Current_State_Review.docx"
        );
        assert_eq!(template_title("A & B & C"), "A");
    }

    #[test]
    fn file_name_is_a_single_path_component() {
        assert_eq!(
            template_file_name("Q1/Q2 Review & Outlook"),
            "Klarity_Template_Q1_Q2_Review.docx"
        );
        let name = template_file_name("../../etc/x & y");
        assert_eq!(name, "Klarity_Template_.._.._etc_x.docx");
        assert_eq!(
            std::path::Path::new(&name).file_name().and_then(|n| n.to_str()),
            Some(name.as_str())
        );
        assert!(!template_file_name(r"C:\temp\a").contains('\\'));
    }

    #[test]
    fn multi_line_comment_is_written_once() {
        let five_lines = "type - text\nsub_type - freeform\nprompt - *Role:* analyst\\n\\n*Task:* list\ninclude_screenshots - no\nscreenshot_instructions - none";
        let sections = vec![
            ProcessedSection::new("Overview", Some(five_lines.to_string())),
            ProcessedSection::new("Stakeholders", None),
            ProcessedSection::new("Risks", Some(five_lines.to_string())),
        ];
        let bytes = assemble_document(&sections).unwrap();

        let comments = read_part(&bytes, "word/comments.xml");
        assert_eq!(comments.matches("<w:comment ").count(), 2);
        assert!(comments.contains("screenshot_instructions - none"));
        assert!(comments.contains(r"prompt - *Role:* analyst\n\n*Task:* list"));
    }

    #[test]
    fn one_heading_per_section_and_comments_only_when_present() {
        let sections = vec![
            ProcessedSection::new("Overview", Some("type - text\nsub_type - freeform".into())),
            ProcessedSection::new("Stakeholders", None),
            ProcessedSection::new("Risks", Some("type - table\nsub_type - default".into())),
        ];
        let bytes = assemble_document(&sections).unwrap();

        let document = read_part(&bytes, "word/document.xml");
        assert_eq!(document.matches("\"Heading1\"").count(), 3);
        assert_eq!(document.matches("<w:commentRangeStart").count(), 2);

        let overview = document.find("Overview").unwrap();
        let stakeholders = document.find("Stakeholders").unwrap();
        let risks = document.find("Risks").unwrap();
        assert!(overview < stakeholders && stakeholders < risks);

        let comments = read_part(&bytes, "word/comments.xml");
        assert!(comments.contains(COMMENT_AUTHOR));
        assert!(comments.contains("sub_type - default"));
    }

    #[test]
    fn empty_section_list_still_packs() {
        let bytes = assemble_document(&[]).unwrap();
        let document = read_part(&bytes, "word/document.xml");
        assert_eq!(document.matches("\"Heading1\"").count(), 0);
    }
}
