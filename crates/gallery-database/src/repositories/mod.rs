//! PostgreSQL implementations of the store traits.

pub mod file;
pub mod folder;

pub use file::FileRepository;
pub use folder::FolderRepository;

use gallery_core::error::{AppError, ErrorKind};
use gallery_entity::Scope;

/// SQL suffix restricting a query to the rows visible in `scope`.
pub(crate) fn scope_clause(scope: Scope) -> &'static str {
    match scope {
        Scope::Active => " AND deleted_at IS NULL",
        Scope::WithDeleted => "",
    }
}

/// Map an insert failure, turning unique violations into `Conflict`.
pub(crate) fn map_insert_error(err: sqlx::Error, context: &str) -> AppError {
    let unique = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if unique {
        AppError::with_source(ErrorKind::Conflict, format!("{context}: duplicate key"), err)
    } else {
        AppError::with_source(ErrorKind::Database, context.to_string(), err)
    }
}
