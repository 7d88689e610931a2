use log::debug;
use regex::Regex;

use crate::error::ReconError;
use crate::model::{Table, Value};
use crate::stage::Stage;

// ---------------------------------------------------------------------------
// Noise rows
// ---------------------------------------------------------------------------

/// Why a reference was classified as noise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoiseReason<'a> {
    DateLike,
    ViaInstitution,
    Denylisted(&'a str),
}

/// Drops rows whose reference is a date, a bare "via <institution>" note, or
/// contains a denylisted fragment.
#[derive(Debug, Clone)]
pub struct NoiseRowFilter {
    column: String,
    denylist: Vec<String>,
    via_prefix: Regex,
}

impl NoiseRowFilter {
    pub fn new(column: impl Into<String>, denylist: &[String]) -> Self {
        Self {
            column: column.into(),
            denylist: denylist.to_vec(),
            via_prefix: Regex::new(r"(?i)^via [a-z\s]+").expect("static regex"),
        }
    }

    pub fn classify(&self, text: &str) -> Option<NoiseReason<'_>> {
        if is_date_like(text) {
            return Some(NoiseReason::DateLike);
        }
        if self.via_prefix.is_match(text) {
            return Some(NoiseReason::ViaInstitution);
        }
        self.denylist
            .iter()
            .find(|fragment| text.contains(fragment.as_str()))
            .map(|fragment| NoiseReason::Denylisted(fragment))
    }
}

/// `d/m/y` with day in 1..=31 and month in 1..=12. The year only has to be
/// an integer, of any length.
pub fn is_date_like(text: &str) -> bool {
    let parts: Vec<&str> = text.split('/').collect();
    let [day, month, year] = parts.as_slice() else {
        return false;
    };
    let in_range = |part: &str, max: i64| part.trim().parse::<i64>().is_ok_and(|n| (1..=max).contains(&n));
    in_range(*day, 31) && in_range(*month, 12) && is_integer(*year)
}

fn is_integer(part: &str) -> bool {
    let part = part.trim();
    let digits = part.strip_prefix(['+', '-']).unwrap_or(part);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl Stage for NoiseRowFilter {
    fn name(&self) -> &'static str {
        "drop_noise"
    }

    fn apply(&self, mut table: Table) -> Result<Table, ReconError> {
        let col = table.require_column(self.name(), &self.column)?;
        table.retain(|row| {
            let text = row[col].to_text();
            match self.classify(&text) {
                Some(reason) => {
                    debug!("drop_noise: dropping '{text}' ({reason:?})");
                    false
                }
                None => true,
            }
        });
        Ok(table)
    }
}

// ---------------------------------------------------------------------------
// Annotations
// ---------------------------------------------------------------------------

/// Removes "via <institution>" notes and other parenthesised remarks from
/// reference text.
#[derive(Debug, Clone)]
pub struct AnnotationStripper {
    column: String,
    parenthesized_via: Regex,
    inline_via: Regex,
    parenthesized: Regex,
}

impl AnnotationStripper {
    pub fn new(column: impl Into<String>) -> Self {
        // Institution words start with a letter and carry no digits, so a
        // reference code after the note is left alone.
        const WORD: &str = r"\p{L}+(?:[&'.\-]\p{L}+)*\b";
        Self {
            column: column.into(),
            parenthesized_via: Regex::new(r"(?i)\s*\([^()]*\bvia\s+[^\s()][^()]*\)")
                .expect("static regex"),
            inline_via: Regex::new(&format!(r"(?i)\s*\bvia\s+{WORD}(?:\s+{WORD})*"))
                .expect("static regex"),
            parenthesized: Regex::new(r"\([^()]*\)").expect("static regex"),
        }
    }

    pub fn strip(&self, text: &str) -> String {
        let text = self.parenthesized_via.replace_all(text, "");
        let text = self.inline_via.replace_all(&text, "");
        let text = self.parenthesized.replace_all(&text, "");
        text.trim().to_string()
    }
}

impl Stage for AnnotationStripper {
    fn name(&self) -> &'static str {
        "strip_annotations"
    }

    fn apply(&self, mut table: Table) -> Result<Table, ReconError> {
        let col = table.require_column(self.name(), &self.column)?;
        for row in table.rows_mut() {
            if let Value::Text(s) = &row[col] {
                let stripped = self.strip(s);
                if stripped != *s {
                    row[col] = Value::Text(stripped);
                }
            }
        }
        Ok(table)
    }
}
