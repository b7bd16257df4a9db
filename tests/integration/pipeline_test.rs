//! End-to-end pipeline tests against the mock connector.

use std::sync::Arc;
use std::time::Duration;

use sqlgate::config::GatewayConfig;
use sqlgate::db::{MockConnector, MockFailure, Row};
use sqlgate::query::{
    ExecutionOutcome, FailureKind, PipelineResult, QueryPipeline, QueryRequest,
    PERMISSION_DENIED_MESSAGE,
};

fn orders(n: i64) -> Vec<Row> {
    (1..=n)
        .map(|id| {
            Row::new()
                .with("id", id)
                .with("status", if id % 2 == 0 { "shipped" } else { "pending" })
        })
        .collect()
}

fn pipeline(connector: &MockConnector, max_result_rows: usize) -> QueryPipeline {
    let mut config = GatewayConfig::default();
    config.limits.max_result_rows = max_result_rows;
    config.limits.query_timeout_secs = 5;
    QueryPipeline::from_config(&config, Arc::new(connector.clone())).unwrap()
}

async fn run(pipeline: &QueryPipeline, sql: &str) -> PipelineResult {
    pipeline.handle(&QueryRequest::new(sql, "it000001")).await
}

#[tokio::test]
async fn test_unbounded_query_gets_limit_and_timeout() {
    let connector = MockConnector::new().with_table("orders", orders(3));
    let result = run(&pipeline(&connector, 100), "SELECT * FROM orders").await;

    let PipelineResult::Executed(ExecutionOutcome::Success(success)) = result else {
        panic!("Expected Success result");
    };
    assert_eq!(success.row_count, 3);
    assert!(!success.truncated);

    let stats = connector.stats();
    assert_eq!(stats.executed, vec!["SELECT * FROM orders\nLIMIT 100".to_string()]);
    assert_eq!(stats.execution_limits, vec![Duration::from_secs(5)]);
    assert_eq!(stats.opened, 1);
    assert_eq!(stats.closed, 1);
}

#[tokio::test]
async fn test_explicit_limit_above_cap_is_truncated() {
    let connector = MockConnector::new().with_table("orders", orders(50));
    let result = run(&pipeline(&connector, 10), "SELECT id FROM orders LIMIT 40").await;

    let PipelineResult::Executed(ExecutionOutcome::Success(success)) = result else {
        panic!("Expected Success result");
    };
    assert_eq!(success.row_count, 10);
    assert_eq!(success.rows.len(), 10);
    assert!(success.truncated);

    // The statement is sent as written when it already has a LIMIT.
    let stats = connector.stats();
    assert_eq!(stats.executed, vec!["SELECT id FROM orders LIMIT 40".to_string()]);
    assert_eq!(stats.closed, 1);
}

#[tokio::test]
async fn test_rejected_query_touches_no_session() {
    let connector = MockConnector::new().with_table("orders", orders(3));
    let result = run(&pipeline(&connector, 100), "UPDATE orders SET status = 'x'").await;

    assert!(matches!(result, PipelineResult::Rejected(_)));
    assert_eq!(connector.stats().opened, 0);
}

#[tokio::test]
async fn test_permission_denied_is_rewritten() {
    let connector = MockConnector::new().failing_with(MockFailure::Database {
        code: Some(1142),
        message: "SELECT command denied to user 'reader'@'%' for table 'salaries'".to_string(),
    });
    let result = run(&pipeline(&connector, 100), "SELECT * FROM salaries").await;

    let PipelineResult::Executed(ExecutionOutcome::Failure(failure)) = result else {
        panic!("Expected Failure result");
    };
    assert_eq!(failure.kind, FailureKind::DatabaseError);
    assert_eq!(failure.user_message, PERMISSION_DENIED_MESSAGE);
    assert!(failure.detail.contains("command denied"));
    assert_eq!(connector.stats().closed, 1);
}

#[tokio::test]
async fn test_unknown_table_reports_database_message() {
    let connector = MockConnector::new();
    let result = run(&pipeline(&connector, 100), "SELECT * FROM ghosts").await;

    let PipelineResult::Executed(ExecutionOutcome::Failure(failure)) = result else {
        panic!("Expected Failure result");
    };
    assert_eq!(failure.kind, FailureKind::DatabaseError);
    assert_eq!(failure.code, Some(1146));
    assert_eq!(failure.user_message, "Table 'mock.ghosts' doesn't exist");
}

#[tokio::test]
async fn test_sessions_are_released_on_every_path() {
    let connector = MockConnector::new().with_table("orders", orders(20));
    let pipeline = pipeline(&connector, 5);

    run(&pipeline, "SELECT * FROM orders").await;
    run(&pipeline, "SELECT * FROM orders LIMIT 10").await;
    run(&pipeline, "SELECT * FROM missing").await;
    run(&pipeline, "DROP TABLE orders").await;

    let stats = connector.stats();
    assert_eq!(stats.opened, 3);
    assert_eq!(stats.closed, 3);
}
