//! Model reply → Klarity comment string.
//!
//! Klarity Architect reads a section's configuration from a review comment
//! made of five `key - value` lines. The `prompt` value must stay on one
//! physical line, so its line breaks are written as the two characters `\n`.

use serde_json::{Map, Value};

use crate::error::CommentError;
use crate::model::GeneratedSectionConfig;

/// Normalize a generated prompt for the comment's single `prompt` line.
///
/// `**` becomes `*`, CRLF becomes LF, and every LF becomes a literal `\n`.
pub fn escape_prompt(prompt: &str) -> String {
    prompt
        .replace("**", "*")
        .replace("\r\n", "\n")
        .replace('\n', "\\n")
}

impl GeneratedSectionConfig {
    /// Parse a model reply. Missing or `null` keys take their defaults.
    pub fn from_json(reply: &str) -> Result<Self, CommentError> {
        let value: Value =
            serde_json::from_str(reply).map_err(|e| CommentError::InvalidFormat(e.to_string()))?;
        let Value::Object(map) = value else {
            return Err(CommentError::InvalidFormat(
                "expected a JSON object".to_string(),
            ));
        };

        let defaults = GeneratedSectionConfig::default();
        Ok(Self {
            kind: field(&map, "type").unwrap_or(defaults.kind),
            sub_type: field(&map, "sub_type").unwrap_or(defaults.sub_type),
            prompt: field(&map, "prompt").unwrap_or(defaults.prompt),
            include_screenshots: field(&map, "include_screenshots")
                .unwrap_or(defaults.include_screenshots),
            screenshot_instructions: field(&map, "screenshot_instructions")
                .unwrap_or(defaults.screenshot_instructions),
        })
    }

    /// Serialize into the five-line comment block.
    pub fn to_comment_string(&self) -> String {
        format!(
            "type - {}\nsub_type - {}\nprompt - {}\ninclude_screenshots - {}\nscreenshot_instructions - {}",
            self.kind,
            self.sub_type,
            escape_prompt(&self.prompt),
            self.include_screenshots,
            self.screenshot_instructions,
        )
    }
}

fn field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Turn a raw JSON reply into the comment string attached to a heading.
pub fn format_comment_string(reply: &str) -> Result<String, CommentError> {
    GeneratedSectionConfig::from_json(reply).map(|config| config.to_comment_string())
}
