//! Name normalization
//!
//! Turns human-entered metadata strings (titles, artists, albums) into stable
//! lookup keys. Keys are only ever used for indexing; display strings travel
//! separately in the `ui_*` fields of the view records.

/// Key returned when nothing survives normalization
pub const UNKNOWN_KEY: &str = "Unknown";

/// Leading article dropped from keys
const LEADING_ARTICLE: &str = "the ";

/// Spelled-out ordinals rewritten to digit form, applied in order.
///
/// "second" is intentionally absent.
const ORDINALS: &[(&str, &str)] = &[
    ("first", "1st"),
    ("third", "3rd"),
    ("fourth", "4th"),
    ("fifth", "5th"),
    ("sixth", "6th"),
    ("seventh", "7th"),
    ("eighth", "8th"),
];

/// Normalize a display string into a lookup key
///
/// Steps:
/// 1. Lower-case
/// 2. Drop a leading "the "
/// 3. Rewrite ordinal words ("first" → "1st") at start of string or after whitespace
/// 4. Replace " & " with "and"
/// 5. Keep only `[a-z0-9]`
/// 6. Fall back to [`UNKNOWN_KEY`] when the result is empty
///
/// Total function: never fails, never returns an empty string.
pub fn normalize(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let mut key = lowered
        .strip_prefix(LEADING_ARTICLE)
        .unwrap_or(&lowered)
        .to_string();

    for (word, replacement) in ORDINALS {
        key = replace_word_starts(&key, word, replacement);
    }

    let key: String = key
        .replace(" & ", "and")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();

    if key.is_empty() {
        UNKNOWN_KEY.to_string()
    } else {
        key
    }
}

/// Replace `word` wherever it begins the string or follows whitespace
fn replace_word_starts(input: &str, word: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    let mut at_boundary = true;

    while !rest.is_empty() {
        if at_boundary {
            if let Some(tail) = rest.strip_prefix(word) {
                out.push_str(replacement);
                rest = tail;
                at_boundary = false;
                continue;
            }
        }

        // Advance one char; `rest` is non-empty here
        let Some(c) = rest.chars().next() else { break };
        out.push(c);
        rest = &rest[c.len_utf8()..];
        at_boundary = c.is_whitespace();
    }

    out
}
