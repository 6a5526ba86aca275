//! Error type for `podium-store-sqlite`.

use podium_core::store::StoreError;
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] podium_core::Error),

  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("corrupt row: {0}")]
  Corrupt(String),

  #[error("ranking entry not found: {0}")]
  EntryNotFound(uuid::Uuid),

  /// An entry already exists for this athlete in this cohort.
  #[error("duplicate ranking entry for this athlete and cohort")]
  DuplicateEntry,

  /// Another writer holds the database; retry the whole invocation.
  #[error("database is busy with a concurrent write")]
  Conflict,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self {
    if let rusqlite::Error::SqliteFailure(failure, _) = &e {
      match failure.code {
        ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => return Self::Conflict,
        ErrorCode::ConstraintViolation
          if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
          return Self::DuplicateEntry;
        }
        _ => {}
      }
    }
    Self::Database(tokio_rusqlite::Error::Rusqlite(e))
  }
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(e: tokio_rusqlite::Error) -> Self {
    match e {
      tokio_rusqlite::Error::Rusqlite(e) => Self::from(e),
      // Errors raised inside a `call` closure travel as `Other`.
      tokio_rusqlite::Error::Other(boxed) => match boxed.downcast::<Error>() {
        Ok(inner) => *inner,
        Err(boxed) => Self::Database(tokio_rusqlite::Error::Other(boxed)),
      },
      other => Self::Database(other),
    }
  }
}

impl StoreError for Error {
  fn is_not_found(&self) -> bool { matches!(self, Self::EntryNotFound(_)) }

  fn is_conflict(&self) -> bool { matches!(self, Self::Conflict) }

  fn is_duplicate(&self) -> bool { matches!(self, Self::DuplicateEntry) }

  fn is_invalid_input(&self) -> bool { matches!(self, Self::Core(_)) }
}

/// Carry a store error out of a `tokio_rusqlite` closure.
pub(crate) fn in_call(e: impl Into<Error>) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e.into()))
}
