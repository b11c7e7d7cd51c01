use axum::Router;
use sea_orm::{DatabaseBackend, MockDatabase};

use crate::{routes::router, state::AppState};

/// Router over a mock connection, for exercising paths that reject input
/// before any query is issued.
pub fn test_router() -> Router {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    router(AppState::new(db))
}
