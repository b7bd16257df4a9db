//! sqlgate - a read-only SQL gateway for MySQL.
//!
//! This library exposes the core modules for use by the binary and the
//! integration tests.

pub mod admission;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod query;
pub mod server;
