//! Admission filter tests through the public API.

use sqlgate::admission::{AdmissionFilter, AdmissionPolicy, ReasonCode};
use sqlgate::config::GatewayConfig;

fn filter() -> AdmissionFilter {
    AdmissionFilter::new(&AdmissionPolicy::default()).unwrap()
}

#[test]
fn test_realistic_reporting_query_is_admitted() {
    let sql = "WITH recent AS (\n  SELECT customer_id, SUM(total) AS spent\n  FROM orders\n  WHERE created_at > '2024-01-01'\n  GROUP BY customer_id\n)\nSELECT c.name, r.spent FROM customers c JOIN recent r ON r.customer_id = c.id";

    let verdict = filter().evaluate(sql);
    assert!(verdict.allowed);
    assert_eq!(verdict.reason, ReasonCode::Accepted);
    assert!(verdict.missing_limit);
}

#[test]
fn test_rejections_carry_reason_codes() {
    let cases = [
        ("DELETE FROM users", ReasonCode::NotReadOnly),
        ("SELECT * FROM users INTO OUTFILE '/tmp/x'", ReasonCode::ForbiddenKeyword),
        ("SELECT 1; SELECT 2", ReasonCode::MultiStatement),
        ("  show tables", ReasonCode::NotReadOnly),
    ];

    let filter = filter();
    for (sql, reason) in cases {
        let verdict = filter.evaluate(sql);
        assert!(!verdict.allowed, "{sql} should be rejected");
        assert_eq!(verdict.reason, reason, "wrong reason for {sql}");
    }
}

#[test]
fn test_keyword_inside_identifier_is_not_a_match() {
    let verdict = filter().evaluate("SELECT last_update, dropped_at FROM audit LIMIT 5");
    assert!(verdict.allowed);
    assert!(!verdict.missing_limit);
}

#[test]
fn test_policy_from_config_overrides() {
    let mut config = GatewayConfig::default();
    config
        .apply_overrides_from(|key| match key {
            "MAX_SQL_LENGTH" => Some("20".to_string()),
            "FORBIDDEN_KEYWORDS" => Some("SLEEP,BENCHMARK".to_string()),
            "REJECT_SQL_COMMENTS" => Some("true".to_string()),
            _ => None,
        })
        .unwrap();

    let filter = AdmissionFilter::new(&config.admission_policy()).unwrap();

    assert_eq!(
        filter.evaluate("SELECT * FROM a_rather_long_table").reason,
        ReasonCode::TooLong
    );
    let verdict = filter.evaluate("SELECT SLEEP(10)");
    assert_eq!(verdict.reason, ReasonCode::ForbiddenKeyword);
    assert_eq!(verdict.keyword.as_deref(), Some("SLEEP"));
    assert_eq!(
        filter.evaluate("SELECT 1 -- hi").reason,
        ReasonCode::CommentNotAllowed
    );
}
