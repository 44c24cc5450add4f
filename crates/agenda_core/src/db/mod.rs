//! Agenda store bootstrap: connection setup and schema versioning.
//!
//! # Responsibility
//! - Hand out connections that are ready for the topic repository.
//! - Own the meeting/topic schema and its migration history.
//!
//! # Invariants
//! - The schema version lives in `PRAGMA user_version`; a file written by a
//!   newer build is refused rather than read with a stale schema.
//! - `topics.rank` is `BINARY`-collated, so `ORDER BY rank` agrees with
//!   `Rank` ordering byte for byte.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

/// Result alias for store bootstrap.
pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating the agenda store.
#[derive(Debug)]
pub enum DbError {
    /// SQLite refused the open, a pragma or a migration statement.
    Sqlite(rusqlite::Error),
    /// The file carries a schema version this build does not know.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "agenda store error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "agenda store schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Self::Sqlite(err) = self {
            return Some(err);
        }
        None
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
