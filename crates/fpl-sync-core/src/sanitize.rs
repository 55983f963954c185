use serde::{Deserialize, Serialize};

pub const CALLSIGN_MAX_LEN: usize = 8;
pub const TIME_LEN: usize = 4;
pub const LEVEL_LEN: usize = 3;

/// The user-editable fields that mirror a clause of the flight plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Callsign,
    DepartureTime,
    Level,
    Route,
}

impl FieldKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "callsign" | "cs" => Some(FieldKind::Callsign),
            "time" | "dep_time" | "departure_time" => Some(FieldKind::DepartureTime),
            "level" | "fl" => Some(FieldKind::Level),
            "route" => Some(FieldKind::Route),
            _ => None,
        }
    }
}

/// Normalizes raw field input. An empty result means there is nothing to commit.
pub fn sanitize(kind: FieldKind, raw: &str) -> String {
    match kind {
        FieldKind::Callsign => raw
            .to_uppercase()
            .chars()
            .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            .take(CALLSIGN_MAX_LEN)
            .collect(),
        FieldKind::DepartureTime => raw
            .chars()
            .filter(|c| c.is_ascii_digit())
            .take(TIME_LEN)
            .collect(),
        FieldKind::Level => {
            let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() {
                return digits;
            }
            format!("{:0>width$}", digits, width = LEVEL_LEN)
        }
        // A line break or ')' inside the route would end the clause early and
        // strand the rest of the text outside it.
        FieldKind::Route => raw
            .chars()
            .filter(|&c| c != ')')
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect::<String>()
            .trim()
            .to_string(),
    }
}

/// A departure time only commits once all four digits are present.
pub fn is_complete_time(value: &str) -> bool {
    value.len() == TIME_LEN && value.bytes().all(|b| b.is_ascii_digit())
}

/// `F` followed by exactly three digits.
pub fn is_level_token(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == LEVEL_LEN + 1 && bytes[0] == b'F' && bytes[1..].iter().all(u8::is_ascii_digit)
}

/// Turns a level choice such as `"F370"`, `"FL370"` or `"90"` into a level token.
pub fn level_token(raw: &str) -> Option<String> {
    let digits = sanitize(FieldKind::Level, raw);
    let token = format!("F{}", digits);
    is_level_token(&token).then_some(token)
}

/// Keeps a caret position valid after the field text was replaced by its
/// sanitized form, so typing does not make the cursor jump to the end.
pub fn clamp_cursor(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}
