//! Keyword deny-list matching.
//!
//! Keywords are matched as whole words, case-insensitively, so identifiers such
//! as `update_count` or `created_at` do not trip the list. This is a heuristic,
//! not a parser: keywords hidden inside string literals are still reported, and
//! obfuscated SQL can slip past it.

use crate::error::{GatewayError, Result};
use regex::Regex;

/// Keywords rejected when no list is configured.
pub const DEFAULT_FORBIDDEN_KEYWORDS: &[&str] = &[
    "DELETE",
    "DROP",
    "INSERT",
    "UPDATE",
    "CREATE",
    "ALTER",
    "TRUNCATE",
    "EXEC",
    "EXECUTE",
    "INTO OUTFILE",
    "LOAD_FILE",
];

/// Compiled, ordered keyword deny-list.
#[derive(Debug, Clone)]
pub struct KeywordDenyList {
    entries: Vec<(String, Regex)>,
}

impl KeywordDenyList {
    /// Compiles the given keywords. Blank entries are ignored; multi-word
    /// keywords match across any run of whitespace.
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = Vec::new();
        for keyword in keywords {
            let words: Vec<String> = keyword
                .as_ref()
                .split_whitespace()
                .map(|w| regex::escape(&w.to_uppercase()))
                .collect();
            if words.is_empty() {
                continue;
            }

            let name = keyword
                .as_ref()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_uppercase();
            let pattern = format!(r"(?i)\b{}\b", words.join(r"\s+"));
            let regex = Regex::new(&pattern).map_err(|e| {
                GatewayError::config(format!("Invalid forbidden keyword '{name}': {e}"))
            })?;
            entries.push((name, regex));
        }
        Ok(Self { entries })
    }

    /// Returns the first keyword, in list order, that occurs as a whole word.
    pub fn first_match(&self, sql: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, regex)| regex.is_match(sql))
            .map(|(name, _)| name.as_str())
    }

    /// Keyword names in list order.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of keywords in the list.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no keyword is configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for KeywordDenyList {
    fn default() -> Self {
        Self::new(DEFAULT_FORBIDDEN_KEYWORDS).expect("default keywords are valid patterns")
    }
}
