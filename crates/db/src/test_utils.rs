//! Test utilities for database operations.
//!
//! Mock-connection helper shared by repository and service tests.

use std::sync::Arc;

use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};

/// An empty mock Postgres connection for code paths that never reach the
/// database.
#[must_use]
pub fn mock_connection() -> Arc<DatabaseConnection> {
    Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
}
