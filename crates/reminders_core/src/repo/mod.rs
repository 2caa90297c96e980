//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per table group.
//! - Keep SQL text and rank bookkeeping inside the persistence boundary.
//!
//! # Invariants
//! - Every multi-statement write runs in one `IMMEDIATE` transaction.
//! - Reminder ranks are dense `0..n-1` per folder after every write.
//! - Repository APIs return semantic errors (`*NotFound`) in addition to DB
//!   transport errors.

use crate::db::DbError;
use crate::model::reminder::EntryId;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod folder_repo;
pub mod notification_repo;
pub mod reminder_repo;
pub mod theme_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error shared by all repositories.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    FolderNotFound(String),
    DuplicateFolder(String),
    ReminderNotFound {
        entry_id: EntryId,
        folder_name: Option<String>,
    },
    ThemeNotFound(String),
    /// Persisted data cannot be converted into a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::FolderNotFound(name) => write!(f, "folder not found: {name}"),
            Self::DuplicateFolder(name) => write!(f, "folder already exists: {name}"),
            Self::ReminderNotFound {
                entry_id,
                folder_name: Some(folder),
            } => write!(f, "reminder {entry_id} not found in folder {folder}"),
            Self::ReminderNotFound {
                entry_id,
                folder_name: None,
            } => write!(f, "reminder not found: {entry_id}"),
            Self::ThemeNotFound(name) => write!(f, "theme not found: {name}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn parse_entry_id(value: &str, column: &'static str) -> RepoResult<EntryId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn folder_exists(conn: &Connection, name: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM folders WHERE name = ?1);",
        [name],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn ensure_folder_exists(conn: &Connection, name: &str) -> RepoResult<()> {
    if !folder_exists(conn, name)? {
        return Err(RepoError::FolderNotFound(name.to_string()));
    }
    Ok(())
}
