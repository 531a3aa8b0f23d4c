//! Policy line parsing and rule-set loading

use std::path::Path;

use crate::error::ModelError;
use crate::model::Model;

/// Parse one `ptype, v0, v1, ...` line into the model.
///
/// Blank lines and `#` comments are ignored, so an adapter may pass an empty
/// line for a record that carries no values. The section is the first
/// character of the ptype (`p2` belongs to `p`).
pub fn load_policy_line(line: &str, model: &mut Model) {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return;
    }

    let mut tokens = line.split(',').map(str::trim);
    let ptype = tokens.next().unwrap_or_default();
    let Some(sec) = ptype.chars().next() else {
        return;
    };
    let rule: Vec<String> = tokens.map(str::to_string).collect();

    if !model.add_policy(&sec.to_string(), ptype, rule) {
        tracing::debug!(ptype, line, "Skipping duplicate policy line");
    }
}

/// Load every line of a policy text
pub fn load_policy_text(text: &str, model: &mut Model) {
    for line in text.lines() {
        load_policy_line(line, model);
    }
}

/// Load a CSV-style policy file, one rule per line
pub fn load_policy_file(path: impl AsRef<Path>, model: &mut Model) -> Result<(), ModelError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    load_policy_text(&content, model);
    Ok(())
}

impl Model {
    /// Build a model from policy text
    pub fn from_policy_text(text: &str) -> Self {
        let mut model = Self::new();
        load_policy_text(text, &mut model);
        model
    }
}
