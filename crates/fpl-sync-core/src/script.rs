//! Timed edit scripts for replaying a typing session against a controller.
//!
//! One step per line: `<offset-ms> <field> [value...]`. Blank lines and lines
//! starting with `#` are skipped. `level` and `preset` steps are picks that
//! commit at once; every other field is typed and debounced.

use crate::sanitize::FieldKind;
use crate::FplError;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptAction {
    Type { field: FieldKind, raw: String },
    PickLevel(String),
    PickCallsign(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStep {
    pub at: Duration,
    pub action: ScriptAction,
}

fn script_error(line: usize, reason: String) -> FplError {
    log::warn!("Rejecting replay script at line {}: {}", line, reason);
    FplError::Script { line, reason }
}

pub fn parse_script(text: &str) -> Result<Vec<ScriptStep>, FplError> {
    let mut steps: Vec<ScriptStep> = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (offset, rest) = trimmed
            .split_once(char::is_whitespace)
            .unwrap_or((trimmed, ""));
        let rest = rest.trim_start();
        if rest.is_empty() {
            return Err(script_error(line_no, "missing field name".to_string()));
        }
        let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let value = value.trim_start().to_string();

        let ms: u64 = offset
            .parse()
            .map_err(|_| script_error(line_no, format!("bad offset '{}'", offset)))?;
        let at = Duration::from_millis(ms);

        if let Some(prev) = steps.last() {
            if at < prev.at {
                return Err(script_error(
                    line_no,
                    "offsets must not go backwards".to_string(),
                ));
            }
        }

        let action = match field.to_ascii_lowercase().as_str() {
            "preset" => ScriptAction::PickCallsign(value),
            name => match FieldKind::parse(name) {
                Some(FieldKind::Level) => ScriptAction::PickLevel(value),
                Some(field) => ScriptAction::Type { field, raw: value },
                None => {
                    return Err(script_error(line_no, format!("unknown field '{}'", field)))
                }
            },
        };

        steps.push(ScriptStep { at, action });
    }

    Ok(steps)
}
