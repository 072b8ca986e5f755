use regex::Regex;
use std::sync::LazyLock;

use crate::models::SeriesInfo;

/// Titles this short are too generic to act as their own series name
const MIN_FALLBACK_TITLE_CHARS: usize = 4;

// Separator between a series name and what follows it: a whitespace run, or
// a hyphen/colon with optional surrounding whitespace.
const SEP: &str = r"(?:\s*[-:]\s*|\s+)";
const END: &str = r"(?:\s*[-:]\s*|\s+|$)";

static NUMBERED_SEQUEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(.*?){SEP}(?:\d+|[IVXLCDM]+){END}"))
        .expect("valid numbered pattern")
});

static SEASON_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(.*?){SEP}(?:season|part|chapter){SEP}(?:\d+|[IVXLCDM]+){END}"
    ))
    .expect("valid season pattern")
});

static FRANCHISE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(.*?){SEP}(?:the|a|an|origins|returns|rises|forever|begins){END}"
    ))
    .expect("valid franchise pattern")
});

// A numbered-sequel prefix ending in one of these words belongs to the
// season/part/chapter pattern instead ("Foo Season 2" is "Foo", not "Foo Season").
static TRAILING_SEASON_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[\s:-])(?:season|part|chapter)$").expect("valid suffix pattern")
});

static NUMERAL_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\d+|[IVXLCDM]+)\b").expect("valid numeral pattern")
});

/// Extracts the franchise name from a title
///
/// Patterns are tried in a fixed order and the first match wins:
/// numbered sequel ("Foo 2", "Foo II", "Foo: 3"), season/part/chapter
/// ("Foo Season 2"), franchise keyword ("Foo Returns"). Titles matching
/// none of them are their own series when longer than four characters.
/// An empty `series_name` means no series was detected.
pub fn detect(title: &str) -> SeriesInfo {
    let title = title.trim();

    let series_name = capture_prefix(&NUMBERED_SEQUEL, title)
        .filter(|name| !TRAILING_SEASON_WORD.is_match(name))
        .or_else(|| capture_prefix(&SEASON_PART, title))
        .or_else(|| capture_prefix(&FRANCHISE_KEYWORD, title))
        .or_else(|| {
            (title.chars().count() > MIN_FALLBACK_TITLE_CHARS).then(|| title.to_string())
        });

    match series_name {
        Some(series_name) => SeriesInfo {
            series_name,
            series_number: NUMERAL_TOKEN.find(title).map(|m| m.as_str().to_string()),
        },
        None => SeriesInfo::default(),
    }
}

fn capture_prefix(pattern: &Regex, title: &str) -> Option<String> {
    let captures = pattern.captures(title)?;
    let name = captures
        .get(1)?
        .as_str()
        .trim()
        .trim_end_matches(|c: char| c == ':' || c == '-' || c.is_whitespace());

    (!name.is_empty()).then(|| name.to_string())
}
