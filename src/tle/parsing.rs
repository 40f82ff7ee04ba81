use crate::tle::{ElementSet, FetchError};

/// Split a raw three-line response into an element set.
///
/// Blank lines are ignored and every line is trimmed. Anything after the
/// third line is dropped.
pub fn parse_element_set(text: &str) -> Result<ElementSet, FetchError> {
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    match lines.as_slice() {
        [name, line1, line2, ..] => Ok(ElementSet {
            name: name.to_string(),
            line1: line1.to_string(),
            line2: line2.to_string(),
        }),
        _ => Err(FetchError::MalformedResponse(format!(
            "expected 3 lines, got {}",
            lines.len()
        ))),
    }
}
