//! Loading and saving the template draft as pretty-printed JSON.

use std::path::Path;

use klarity_factory::TemplateDraft;

pub fn load_draft(path: &Path) -> Result<TemplateDraft, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read draft '{}': {e}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("failed to parse draft '{}': {e}", path.display()))
}

pub fn save_draft(path: &Path, draft: &TemplateDraft) -> Result<(), String> {
    let json = serde_json::to_string_pretty(draft)
        .map_err(|e| format!("failed to serialize draft: {e}"))?;
    std::fs::write(path, json + "\n")
        .map_err(|e| format!("failed to write draft '{}': {e}", path.display()))
}

/// Convert a 1-based position typed by the user into a list index.
pub fn position_to_index(position: usize, len: usize) -> Result<usize, String> {
    if position == 0 || position > len {
        Err(format!("position {position} is out of range (1..={len})"))
    } else {
        Ok(position - 1)
    }
}
