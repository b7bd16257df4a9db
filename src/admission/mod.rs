//! Query admission filter.
//!
//! Decides whether raw SQL text may be executed. The checks run in a fixed
//! order and the first failure wins:
//!
//! 1. length bound (`TOO_LONG`)
//! 2. statement must start with `SELECT` or `WITH` (`NOT_READ_ONLY`)
//! 3. keyword deny-list, whole words only (`FORBIDDEN_KEYWORD`)
//! 4. no `;` anywhere (`MULTI_STATEMENT`)
//! 5. optional comment guard (`COMMENT_NOT_ALLOWED`)
//!
//! A missing `LIMIT` clause is not a rejection; it is flagged on the verdict so
//! the executor can append a bound. Evaluation is pure: no I/O and no logging.

mod keywords;

pub use keywords::{KeywordDenyList, DEFAULT_FORBIDDEN_KEYWORDS};

use crate::error::Result;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Default maximum SQL length in characters.
pub const DEFAULT_MAX_SQL_LENGTH: usize = 3000;

/// Why a statement was admitted or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// All checks passed.
    Accepted,
    /// Text exceeds the configured maximum length.
    TooLong,
    /// Statement does not start with `SELECT` or `WITH`.
    NotReadOnly,
    /// A deny-listed keyword occurs as a whole word.
    ForbiddenKeyword,
    /// Text contains a `;`.
    MultiStatement,
    /// Text contains a comment marker while comments are disallowed.
    CommentNotAllowed,
}

impl ReasonCode {
    /// Returns the wire name of the reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "ACCEPTED",
            Self::TooLong => "TOO_LONG",
            Self::NotReadOnly => "NOT_READ_ONLY",
            Self::ForbiddenKeyword => "FORBIDDEN_KEYWORD",
            Self::MultiStatement => "MULTI_STATEMENT",
            Self::CommentNotAllowed => "COMMENT_NOT_ALLOWED",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one SQL string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionVerdict {
    /// Whether the statement may run.
    pub allowed: bool,
    /// Reason for the decision.
    pub reason: ReasonCode,
    /// Human-readable explanation.
    pub message: String,
    /// The deny-listed keyword that matched, for `FORBIDDEN_KEYWORD`.
    pub keyword: Option<String>,
    /// True when an admitted statement has no `LIMIT` clause.
    pub missing_limit: bool,
}

impl AdmissionVerdict {
    fn accept(missing_limit: bool) -> Self {
        let message = if missing_limit {
            "Query admitted; a LIMIT clause will be applied"
        } else {
            "Query admitted"
        };
        Self {
            allowed: true,
            reason: ReasonCode::Accepted,
            message: message.to_string(),
            keyword: None,
            missing_limit,
        }
    }

    fn reject(reason: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason,
            message: message.into(),
            keyword: None,
            missing_limit: false,
        }
    }
}

/// SQL text that passed admission.
///
/// Only [`AdmissionFilter::admit`] can build one, so anything holding an
/// `AdmittedSql` has been through the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedSql {
    text: String,
    missing_limit: bool,
}

impl AdmittedSql {
    /// The admitted text, unmodified.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True when the text has no `LIMIT` clause.
    pub fn missing_limit(&self) -> bool {
        self.missing_limit
    }
}

/// Admission settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionPolicy {
    /// Maximum accepted length in characters.
    pub max_sql_length: usize,
    /// Deny-listed keywords, checked in order.
    pub forbidden_keywords: Vec<String>,
    /// Reject text containing `--`, `/*` or `*/`.
    pub reject_comments: bool,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            max_sql_length: DEFAULT_MAX_SQL_LENGTH,
            forbidden_keywords: DEFAULT_FORBIDDEN_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            reject_comments: false,
        }
    }
}

/// The admission filter. Stateless once built; safe to share across requests.
#[derive(Debug, Clone)]
pub struct AdmissionFilter {
    max_sql_length: usize,
    deny_list: KeywordDenyList,
    reject_comments: bool,
}

impl AdmissionFilter {
    /// Builds a filter, compiling the keyword list once.
    pub fn new(policy: &AdmissionPolicy) -> Result<Self> {
        Ok(Self {
            max_sql_length: policy.max_sql_length,
            deny_list: KeywordDenyList::new(&policy.forbidden_keywords)?,
            reject_comments: policy.reject_comments,
        })
    }

    /// Evaluates SQL text against every check, stopping at the first failure.
    pub fn evaluate(&self, sql: &str) -> AdmissionVerdict {
        let length = sql.chars().count();
        if length > self.max_sql_length {
            return AdmissionVerdict::reject(
                ReasonCode::TooLong,
                format!(
                    "SQL is {length} characters long; the maximum is {}",
                    self.max_sql_length
                ),
            );
        }

        let normalized = sql.trim().to_uppercase();
        if !(normalized.starts_with("SELECT") || normalized.starts_with("WITH")) {
            return AdmissionVerdict::reject(
                ReasonCode::NotReadOnly,
                "Only SELECT or WITH statements are allowed",
            );
        }

        if let Some(keyword) = self.deny_list.first_match(&normalized) {
            let mut verdict = AdmissionVerdict::reject(
                ReasonCode::ForbiddenKeyword,
                format!("Forbidden keyword: {keyword}"),
            );
            verdict.keyword = Some(keyword.to_string());
            return verdict;
        }

        if sql.contains(';') {
            return AdmissionVerdict::reject(
                ReasonCode::MultiStatement,
                "Multiple statements are not allowed (found ';')",
            );
        }

        if self.reject_comments && has_comment_marker(sql) {
            return AdmissionVerdict::reject(
                ReasonCode::CommentNotAllowed,
                "SQL comments are not allowed",
            );
        }

        AdmissionVerdict::accept(!has_limit_clause(&normalized))
    }

    /// Evaluates SQL text and, when allowed, wraps it for execution.
    pub fn admit(&self, sql: &str) -> std::result::Result<AdmittedSql, AdmissionVerdict> {
        let verdict = self.evaluate(sql);
        if verdict.allowed {
            Ok(AdmittedSql {
                text: sql.to_string(),
                missing_limit: verdict.missing_limit,
            })
        } else {
            Err(verdict)
        }
    }

    /// The compiled keyword list.
    pub fn deny_list(&self) -> &KeywordDenyList {
        &self.deny_list
    }
}

fn has_comment_marker(sql: &str) -> bool {
    sql.contains("--") || sql.contains("/*") || sql.contains("*/")
}

fn has_limit_clause(sql: &str) -> bool {
    static LIMIT: OnceLock<Regex> = OnceLock::new();
    LIMIT
        .get_or_init(|| Regex::new(r"(?i)\bLIMIT\b").expect("valid regex"))
        .is_match(sql)
}
