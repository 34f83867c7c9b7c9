use serde_json::Value;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum JsonBlockError {
    #[error("no JSON object or array found in response")]
    NotFound,
    #[error("{0}")]
    Invalid(String),
}

#[derive(Clone, Copy)]
enum ScanState {
    Structure,
    InString,
    Escape,
}

/// Parse the JSON value embedded in a model response, ignoring prose and
/// markdown fences around it. Falls back to [`repair_json`] when the block
/// is not strict JSON.
pub fn parse_json_from_response(text: &str) -> Result<Value, JsonBlockError> {
    let block = locate_json_block(text.trim()).ok_or(JsonBlockError::NotFound)?;

    match serde_json::from_str(block) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!(error = %e, "JSON parse failed, attempting repair");
            repair_json(block)
        }
    }
}

/// Find the first `[` or `{` and return the slice up to its balanced close.
///
/// Only the opening bracket kind is counted, and brackets inside string
/// literals are ignored. An unterminated structure yields an empty slice.
pub fn locate_json_block(text: &str) -> Option<&str> {
    let start = text.find(|c: char| c == '[' || c == '{')?;
    let open = text[start..].chars().next()?;
    let close = if open == '[' { ']' } else { '}' };

    let mut depth: usize = 0;
    let mut state = ScanState::Structure;

    for (offset, ch) in text[start..].char_indices() {
        state = match state {
            ScanState::Escape => ScanState::InString,
            ScanState::InString => match ch {
                '\\' => ScanState::Escape,
                '"' => ScanState::Structure,
                _ => ScanState::InString,
            },
            ScanState::Structure => {
                if ch == '"' {
                    ScanState::InString
                } else {
                    if ch == open {
                        depth += 1;
                    } else if ch == close {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            let end = start + offset + ch.len_utf8();
                            return Some(&text[start..end]);
                        }
                    }
                    ScanState::Structure
                }
            }
        };
    }

    Some(&text[start..start])
}

/// Best-effort conversion of near-JSON (trailing commas, single quotes,
/// bare keys, Python literals, comments) into a JSON value.
pub fn repair_json(candidate: &str) -> Result<Value, JsonBlockError> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return Err(JsonBlockError::Invalid(
            "no complete JSON structure to repair".to_string(),
        ));
    }

    let normalized = normalize(trimmed);
    serde_json::from_str(&normalized).map_err(|e| JsonBlockError::Invalid(e.to_string()))
}

fn normalize(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => i = copy_string(&chars, i, &mut out),
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i = (i + 2).min(chars.len());
            }
            '}' | ']' => {
                drop_trailing_comma(&mut out);
                out.push(c);
                i += 1;
            }
            c if c.is_ascii_digit() || ((c == '-' || c == '+') && next_is_digit(&chars, i)) => {
                if c != '+' {
                    out.push(c);
                }
                i += 1;
                while i < chars.len()
                    && (chars[i].is_ascii_digit() || matches!(chars[i], '.' | 'e' | 'E' | '+' | '-'))
                {
                    out.push(chars[i]);
                    i += 1;
                }
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || matches!(chars[i], '_' | '$' | '-'))
                {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if next_non_space(&chars, i) == Some(':') {
                    push_quoted(&word, &mut out);
                } else {
                    match word.as_str() {
                        "true" | "True" => out.push_str("true"),
                        "false" | "False" => out.push_str("false"),
                        "null" | "None" | "none" | "undefined" | "NaN" => out.push_str("null"),
                        _ => push_quoted(&word, &mut out),
                    }
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    out.push('"');

    while i < chars.len() {
        let ch = chars[i];
        if ch == '\\' {
            match chars.get(i + 1) {
                Some('\'') => out.push('\''),
                Some(next) => {
                    out.push('\\');
                    out.push(*next);
                }
                None => out.push_str("\\\\"),
            }
            i += 2;
            continue;
        }
        if ch == quote {
            out.push('"');
            return i + 1;
        }
        match ch {
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
        i += 1;
    }

    out.push('"');
    chars.len()
}

fn push_quoted(word: &str, out: &mut String) {
    out.push('"');
    for ch in word.chars() {
        if ch == '"' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
}

fn drop_trailing_comma(out: &mut String) {
    let kept = out.trim_end().len();
    if out[..kept].ends_with(',') {
        out.truncate(kept - 1);
    }
}

fn next_is_digit(chars: &[char], i: usize) -> bool {
    chars.get(i + 1).is_some_and(char::is_ascii_digit)
}

fn next_non_space(chars: &[char], from: usize) -> Option<char> {
    chars[from..].iter().copied().find(|c| !c.is_whitespace())
}
