//! Core domain logic for the routinely to-do list and routine catalog.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{init_logging, logging_status};
pub use model::routine::{Purchase, Routine, RoutineTask, RoutineValidationError};
pub use model::todo_item::{TodoItem, TodoValidationError};
pub use model::user::UserProfile;
pub use repo::catalog_repo::{
    upsert_routine, CatalogError, CatalogRepository, CatalogResult, DecodeWarning, RoutineCatalog,
    SqliteCatalogRepository,
};
pub use repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
pub use repo::todo_repo::{SqliteTodoRepository, TodoRepoError, TodoRepoResult, TodoRepository};
pub use service::catalog_service::CatalogService;
pub use service::list_service::{
    filter_by_date, validate_new_item, ListEvent, ListServiceError, ListSubscription,
    TodoListService, ValidationError,
};
pub use service::schedule_service::{
    day_bounds, day_start, due_timestamp, FailedTask, MaterializeError, ScheduleService,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
