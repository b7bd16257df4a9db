//! Integration tests for sqlgate.

pub mod admission_test;
pub mod http_test;
pub mod mysql_test;
pub mod pipeline_test;
