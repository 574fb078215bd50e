//! Integration tests for ProxDB.
//!
//! These tests exercise the database through its public API: ingestion,
//! query resolution, event delivery and partitioning.

pub mod events;
pub mod partition;
pub mod queries;

/// Route library logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
