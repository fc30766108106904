//! Response sanitizing for completion outputs.
//!
//! Models often wrap SQL in markdown fences even when told not to. This
//! strips the fences and surrounding whitespace; it performs no legality
//! checks (that is the read-only guard's job).

use regex::Regex;
use std::sync::OnceLock;

/// A complete fenced block, with an optional language tag on the fence line.
///
/// A `sql`/`sqlite` tag may share its line with the query; any other tag
/// must end the fence line.
fn fenced_block() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)```(?:(?i:sqlite|sql)\b[ \t]*(?:\r?\n)?|[A-Za-z0-9_+-]*[ \t]*\r?\n)?(.*?)```")
            .expect("valid fence pattern")
    })
}

/// A stray opening or closing marker left after block extraction.
fn stray_marker() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)```(?:sqlite|sql)?").expect("valid marker pattern"))
}

/// Cleans a raw completion into candidate SQL text.
///
/// - trims surrounding whitespace
/// - if a non-empty fenced block is present, keeps only the first one
/// - removes any remaining fence markers
///
/// Repeats until nothing changes, so `sanitize_sql(sanitize_sql(x)) == sanitize_sql(x)`.
pub fn sanitize_sql(raw: &str) -> String {
    let mut current = raw.trim().to_string();
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn sanitize_once(text: &str) -> String {
    let inner = fenced_block()
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .find(|block| !block.trim().is_empty())
        .unwrap_or(text);
    stray_marker().replace_all(inner, "").trim().to_string()
}
