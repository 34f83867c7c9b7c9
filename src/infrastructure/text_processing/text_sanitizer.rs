use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static BROKEN_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\p{L})-[ \t]*\r?\n[ \t]*(\p{Ll})").unwrap());

static WRAPPING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^```[a-zA-Z]*[ \t]*\r?\n(.*?)\r?\n?```$").unwrap());

const SOFT_HYPHEN: char = '\u{00AD}';

/// Clean one page of extracted or transcribed text.
///
/// Column alignment inside a line is kept since downstream table prompts
/// rely on it; only trailing whitespace and runs of blank lines go.
pub fn sanitize_page_text(raw: &str) -> String {
    let trimmed = raw.trim();
    let unfenced = WRAPPING_FENCE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map_or(trimmed, |m| m.as_str());

    let normalized: String = unfenced
        .nfkc()
        .filter(|&c| c != SOFT_HYPHEN && (c == '\n' || c == '\t' || !c.is_control()))
        .collect();
    let rejoined = BROKEN_WORD.replace_all(&normalized, "$1$2");

    let mut out = String::with_capacity(rejoined.len());
    let mut pending_blank = false;
    for line in rejoined.lines().map(str::trim_end) {
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if !out.is_empty() {
            out.push_str(if pending_blank { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        pending_blank = false;
    }
    out
}

/// Sanitize each page and join the non-empty ones with a blank line.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    pages
        .into_iter()
        .map(|page| sanitize_page_text(page.as_ref()))
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
