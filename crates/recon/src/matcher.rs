//! Approximate name matching.
//!
//! Scores follow the weighted-ratio family used by spreadsheet fuzzy lookups:
//! a plain ratio, a best-window partial ratio, and token sort / token set
//! ratios, each built on normalised Levenshtein similarity. The result is an
//! integer in `0..=100`.

use std::collections::BTreeSet;

const UNBASE_SCALE: f64 = 0.95;
const PARTIAL_SCALE: f64 = 0.90;
const LONG_PARTIAL_SCALE: f64 = 0.60;

/// Lowercase, turn anything that is not a letter, digit or underscore into a
/// space, and trim.
pub fn normalize(s: &str) -> String {
    let mapped: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .flat_map(char::to_lowercase)
        .collect();
    mapped.trim().to_string()
}

/// Similarity score of two raw strings.
pub fn score(a: &str, b: &str) -> u8 {
    score_normalized(&normalize(a), &normalize(b))
}

/// Similarity score of two strings already passed through [`normalize`].
pub fn score_normalized(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let len_ratio = len_a.max(len_b) as f64 / len_a.min(len_b) as f64;

    let base = ratio(a, b);
    let best = if len_ratio < 1.5 {
        base.max(token_sort_ratio(a, b, false) * UNBASE_SCALE)
            .max(token_set_ratio(a, b, false) * UNBASE_SCALE)
    } else {
        let partial_scale = if len_ratio > 8.0 {
            LONG_PARTIAL_SCALE
        } else {
            PARTIAL_SCALE
        };
        base.max(partial_ratio(a, b) * partial_scale)
            .max(token_sort_ratio(a, b, true) * UNBASE_SCALE * partial_scale)
            .max(token_set_ratio(a, b, true) * UNBASE_SCALE * partial_scale)
    };

    (best * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Index and score of the best candidate. Ties keep the earliest candidate.
/// `None` only when there are no candidates.
pub fn best_match<S: AsRef<str>>(query: &str, normalized_candidates: &[S]) -> Option<(usize, u8)> {
    let query = normalize(query);
    let mut best: Option<(usize, u8)> = None;
    for (idx, candidate) in normalized_candidates.iter().enumerate() {
        let s = score_normalized(&query, candidate.as_ref());
        if best.map_or(true, |(_, top)| s > top) {
            best = Some((idx, s));
            if s == 100 {
                break;
            }
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Ratios (all in 0.0..=1.0)
// ---------------------------------------------------------------------------

fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b)
}

/// Best ratio of the shorter string against every same-length window of the
/// longer one.
fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short_len = short.chars().count();
    if short_len == 0 {
        return 0.0;
    }

    // Byte offsets of every char boundary, including the end
    let bounds: Vec<usize> = long
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(long.len()))
        .collect();
    let long_len = bounds.len() - 1;

    let mut best = 0.0f64;
    for start in 0..=(long_len - short_len) {
        let window = &long[bounds[start]..bounds[start + short_len]];
        let distance = strsim::levenshtein(short, window);
        let r = 1.0 - distance as f64 / short_len as f64;
        if r > best {
            best = r;
            if best > 0.995 {
                return 1.0;
            }
        }
    }
    best
}

fn compare(a: &str, b: &str, partial: bool) -> f64 {
    if partial {
        partial_ratio(a, b)
    } else {
        ratio(a, b)
    }
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn token_sort_ratio(a: &str, b: &str, partial: bool) -> f64 {
    compare(&sorted_tokens(a), &sorted_tokens(b), partial)
}

fn token_set_ratio(a: &str, b: &str, partial: bool) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    let join = |set: Vec<&str>| set.join(" ");
    let common = join(tokens_a.intersection(&tokens_b).copied().collect());
    let only_a = join(tokens_a.difference(&tokens_b).copied().collect());
    let only_b = join(tokens_b.difference(&tokens_a).copied().collect());

    let combined_a = format!("{common} {only_a}").trim().to_string();
    let combined_b = format!("{common} {only_b}").trim().to_string();

    compare(&common, &combined_a, partial)
        .max(compare(&common, &combined_b, partial))
        .max(compare(&combined_a, &combined_b, partial))
}
