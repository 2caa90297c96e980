//! Folder repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist folders, their icons and their sidebar order.
//!
//! # Invariants
//! - System folder ranks are re-asserted whenever custom order is rewritten.
//! - Custom folders are ranked densely from `FIRST_CUSTOM_RANK`.
//! - Deleting a folder cascades to its reminder and notification rows.

use super::{ensure_folder_exists, folder_exists, RepoError, RepoResult};
use crate::model::folder::{Folder, SystemFolder, FIRST_CUSTOM_RANK};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};

const FOLDER_SELECT_SQL: &str = "SELECT name, image_path, folder_order FROM folders";

/// Repository interface for folder persistence.
pub trait FolderRepository {
    /// Lists every folder ordered by stored rank, then name.
    fn list_folders(&self) -> RepoResult<Vec<Folder>>;
    fn get_folder(&self, name: &str) -> RepoResult<Option<Folder>>;
    /// Appends a custom folder after the last custom folder.
    fn insert_folder(&self, name: &str) -> RepoResult<Folder>;
    fn rename_folder(&self, old_name: &str, new_name: &str) -> RepoResult<()>;
    fn set_icon(&self, name: &str, icon_path: Option<&Path>) -> RepoResult<()>;
    fn delete_folder(&self, name: &str) -> RepoResult<()>;
    /// Rewrites custom folder ranks to follow `ordered_names`.
    fn rewrite_custom_order(&self, ordered_names: &[String]) -> RepoResult<()>;
}

/// SQLite-backed folder repository.
pub struct SqliteFolderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFolderRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl FolderRepository for SqliteFolderRepository<'_> {
    fn list_folders(&self) -> RepoResult<Vec<Folder>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{FOLDER_SELECT_SQL} ORDER BY folder_order ASC, name ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut folders = Vec::new();
        while let Some(row) = rows.next()? {
            folders.push(parse_folder_row(row)?);
        }
        Ok(folders)
    }

    fn get_folder(&self, name: &str) -> RepoResult<Option<Folder>> {
        let folder = self
            .conn
            .query_row(
                &format!("{FOLDER_SELECT_SQL} WHERE name = ?1;"),
                [name],
                |row| {
                    Ok((
                        row.get::<_, String>("name")?,
                        row.get::<_, String>("image_path")?,
                        row.get::<_, i64>("folder_order")?,
                    ))
                },
            )
            .optional()?;
        Ok(folder.map(|(name, image_path, rank)| Folder {
            name,
            icon_path: icon_from_db(image_path),
            rank,
        }))
    }

    fn insert_folder(&self, name: &str) -> RepoResult<Folder> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if folder_exists(&tx, name)? {
            return Err(RepoError::DuplicateFolder(name.to_string()));
        }
        let rank: i64 = tx.query_row(
            "SELECT COALESCE(MAX(folder_order) + 1, ?1)
             FROM folders
             WHERE folder_order >= ?1;",
            [FIRST_CUSTOM_RANK],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO folders (name, image_path, folder_order) VALUES (?1, '', ?2);",
            params![name, rank],
        )?;
        tx.commit()?;

        Ok(Folder {
            name: name.to_string(),
            icon_path: None,
            rank,
        })
    }

    fn rename_folder(&self, old_name: &str, new_name: &str) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_folder_exists(&tx, old_name)?;
        if folder_exists(&tx, new_name)? {
            return Err(RepoError::DuplicateFolder(new_name.to_string()));
        }
        // reminders.folder_name follows through ON UPDATE CASCADE
        tx.execute(
            "UPDATE folders SET name = ?2 WHERE name = ?1;",
            params![old_name, new_name],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn set_icon(&self, name: &str, icon_path: Option<&Path>) -> RepoResult<()> {
        let stored = icon_path
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_default();
        let changed = self.conn.execute(
            "UPDATE folders SET image_path = ?2 WHERE name = ?1;",
            params![name, stored],
        )?;
        if changed == 0 {
            return Err(RepoError::FolderNotFound(name.to_string()));
        }
        Ok(())
    }

    fn delete_folder(&self, name: &str) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute("DELETE FROM folders WHERE name = ?1;", [name])?;
        if changed == 0 {
            return Err(RepoError::FolderNotFound(name.to_string()));
        }
        let remaining = list_custom_names(&tx)?;
        write_custom_order(&tx, &remaining)?;
        tx.commit()?;
        Ok(())
    }

    fn rewrite_custom_order(&self, ordered_names: &[String]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for name in ordered_names {
            ensure_folder_exists(&tx, name)?;
        }
        write_custom_order(&tx, ordered_names)?;
        tx.commit()?;
        Ok(())
    }
}

fn list_custom_names(conn: &Connection) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM folders ORDER BY folder_order ASC, name ASC;")?;
    let mut rows = stmt.query([])?;
    let mut names = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        if SystemFolder::from_name(&name).is_none() {
            names.push(name);
        }
    }
    Ok(names)
}

fn write_custom_order(conn: &Connection, ordered_names: &[String]) -> RepoResult<()> {
    let custom = ordered_names
        .iter()
        .filter(|name| SystemFolder::from_name(name).is_none());
    for (offset, name) in custom.enumerate() {
        conn.execute(
            "UPDATE folders SET folder_order = ?2 WHERE name = ?1;",
            params![name, FIRST_CUSTOM_RANK + offset as i64],
        )?;
    }
    for system in SystemFolder::ALL {
        conn.execute(
            "UPDATE folders SET folder_order = ?2 WHERE name = ?1;",
            params![system.name(), system.rank()],
        )?;
    }
    Ok(())
}

fn parse_folder_row(row: &Row<'_>) -> RepoResult<Folder> {
    let image_path: String = row.get("image_path")?;
    Ok(Folder {
        name: row.get("name")?,
        icon_path: icon_from_db(image_path),
        rank: row.get("folder_order")?,
    })
}

fn icon_from_db(value: String) -> Option<PathBuf> {
    if value.trim().is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}
