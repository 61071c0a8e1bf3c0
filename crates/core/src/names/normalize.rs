//! The normalization rules, applied in a fixed order.

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Matches a population indicator token such as "pop.3".
static POPULATION_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"pop\.[0-9]").unwrap());

/// Matches parenthesized text, non-greedy within one pair.
static PARENTHESIZED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").unwrap());

/// Matches square-bracketed text, non-greedy within one pair.
static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").unwrap());

/// Markers after which a name stops being a searchable taxon string.
/// Checked in order; the string is truncated before the first match.
const CUT_MARKERS: [&str; 7] = ["(", " sp.", " spp.", " sp ", " spp ", " n.", " pop."];

/// Normalize a raw submitted scientific name into a query-safe search term.
///
/// May return the empty string, which callers must treat as "not
/// searchable" and record a negative match without querying anything.
pub fn normalize(raw: &str) -> String {
    let mut name = strip_population_tokens(raw);
    name = truncate_at_markers(&name);
    name = normalize_case(&name);
    name = name.replace("subsp.", "ssp.");
    name = PARENTHESIZED.replace_all(&name, "").into_owned();
    name = BRACKETED.replace_all(&name, "").into_owned();
    collapse_whitespace(&name)
}

/// Light cleaning for display fields: trim and collapse runs of
/// whitespace without touching case or markers.
pub fn clean_text(raw: &str) -> String {
    collapse_whitespace(raw)
}

/// Drop any whitespace-delimited token carrying a "pop.<digit>" indicator.
/// The token is removed entirely, not replaced with a placeholder.
fn strip_population_tokens(name: &str) -> String {
    name.split_whitespace()
        .filter(|token| !POPULATION_TOKEN.is_match(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate the string at the first occurrence of each cut marker,
/// keeping only the prefix.
fn truncate_at_markers(name: &str) -> String {
    let mut result = name.to_string();
    for marker in CUT_MARKERS {
        if let Some(idx) = result.find(marker) {
            result.truncate(idx);
        }
    }
    result
}

/// Genus-style capitalization: if any character past the first is
/// uppercase, lowercase the whole string and uppercase the first
/// character. Strings already in canonical case pass through untouched.
fn normalize_case(name: &str) -> String {
    let has_late_upper = name.chars().skip(1).any(|c| c.is_uppercase());
    if !has_late_upper {
        return name.to_string();
    }
    let lower = name.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => lower,
    }
}

fn collapse_whitespace(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}
