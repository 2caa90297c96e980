//! Reminder repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist reminder rows and their per-folder ranks.
//! - Implement the multi-row operations (mirrored insert, reorder,
//!   completion) atomically.
//!
//! # Invariants
//! - Ranks are dense `0..n-1` per folder after every write.
//! - Listing is deterministic: `reminder_order ASC, id ASC`.
//! - An entry has at most one row per folder.

use super::{ensure_folder_exists, parse_entry_id, RepoError, RepoResult};
use crate::model::folder::SystemFolder;
use crate::model::reminder::{EntryId, Reminder, Urgency};
use crate::model::schedule::{format_notify_at, parse_notify_at};
use chrono::NaiveDateTime;
use log::warn;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;

const REMINDER_SELECT_SQL: &str = "SELECT
    entry_uuid,
    text,
    folder_name,
    reminder_order,
    urgency_level,
    notify_at
FROM reminders";

/// Where one row of a new entry lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub folder_name: String,
    pub notify_at: Option<NaiveDateTime>,
}

/// A new entry and every folder it is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub entry_id: EntryId,
    pub text: String,
    pub urgency: Urgency,
    /// First placement is the folder the user added to; the rest are mirrors.
    pub placements: Vec<Placement>,
}

/// Repository interface for reminder rows.
pub trait ReminderRepository {
    /// Inserts one row per placement, each appended to its folder.
    fn insert_entry(&self, entry: &NewEntry) -> RepoResult<Vec<Reminder>>;
    fn list_in_folder(&self, folder_name: &str) -> RepoResult<Vec<Reminder>>;
    fn entry_rows(&self, entry_id: EntryId) -> RepoResult<Vec<Reminder>>;
    fn get_row(&self, entry_id: EntryId, folder_name: &str) -> RepoResult<Option<Reminder>>;
    /// Moves one row to `target_index` (clamped) and rewrites the folder's ranks.
    fn move_within_folder(
        &self,
        folder_name: &str,
        entry_id: EntryId,
        target_index: usize,
    ) -> RepoResult<Vec<Reminder>>;
    /// Removes every non-Completed row and ensures exactly one Completed row.
    fn complete_entry(&self, entry_id: EntryId) -> RepoResult<Reminder>;
    fn delete_row(&self, folder_name: &str, entry_id: EntryId) -> RepoResult<()>;
    /// Deletes every row in a folder and returns the number removed.
    fn clear_folder(&self, folder_name: &str) -> RepoResult<usize>;
    /// Updates urgency on every row and keeps the Pinned mirror in sync.
    ///
    /// Raising to High adds a Pinned row; leaving High removes it. Rows the
    /// user placed in Pinned at a lower urgency stay where they are.
    fn set_urgency(&self, entry_id: EntryId, urgency: Urgency) -> RepoResult<()>;
}

/// SQLite-backed reminder repository.
pub struct SqliteReminderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReminderRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ReminderRepository for SqliteReminderRepository<'_> {
    fn insert_entry(&self, entry: &NewEntry) -> RepoResult<Vec<Reminder>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut written = Vec::with_capacity(entry.placements.len());
        let mut seen = BTreeSet::new();

        for placement in &entry.placements {
            if !seen.insert(placement.folder_name.as_str()) {
                continue;
            }
            ensure_folder_exists(&tx, &placement.folder_name)?;
            let rank = next_rank(&tx, &placement.folder_name)?;
            insert_row(
                &tx,
                entry.entry_id,
                &entry.text,
                &placement.folder_name,
                rank,
                entry.urgency,
                placement.notify_at,
            )?;
            written.push(Reminder {
                entry_id: entry.entry_id,
                text: entry.text.clone(),
                folder_name: placement.folder_name.clone(),
                rank,
                urgency: entry.urgency,
                notify_at: placement.notify_at,
            });
        }

        tx.commit()?;
        Ok(written)
    }

    fn list_in_folder(&self, folder_name: &str) -> RepoResult<Vec<Reminder>> {
        ensure_folder_exists(self.conn, folder_name)?;
        let mut stmt = self.conn.prepare(&format!(
            "{REMINDER_SELECT_SQL}
             WHERE folder_name = ?1
             ORDER BY reminder_order ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([folder_name])?;
        let mut reminders = Vec::new();
        while let Some(row) = rows.next()? {
            reminders.push(parse_reminder_row(row)?);
        }
        Ok(reminders)
    }

    fn entry_rows(&self, entry_id: EntryId) -> RepoResult<Vec<Reminder>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REMINDER_SELECT_SQL}
             WHERE entry_uuid = ?1
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([entry_id.to_string()])?;
        let mut reminders = Vec::new();
        while let Some(row) = rows.next()? {
            reminders.push(parse_reminder_row(row)?);
        }
        Ok(reminders)
    }

    fn get_row(&self, entry_id: EntryId, folder_name: &str) -> RepoResult<Option<Reminder>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REMINDER_SELECT_SQL}
             WHERE entry_uuid = ?1
               AND folder_name = ?2;"
        ))?;
        let mut rows = stmt.query(params![entry_id.to_string(), folder_name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_reminder_row(row)?));
        }
        Ok(None)
    }

    fn move_within_folder(
        &self,
        folder_name: &str,
        entry_id: EntryId,
        target_index: usize,
    ) -> RepoResult<Vec<Reminder>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut ids = list_entry_ids(&tx, folder_name)?;
        let Some(current) = ids.iter().position(|id| *id == entry_id) else {
            return Err(RepoError::ReminderNotFound {
                entry_id,
                folder_name: Some(folder_name.to_string()),
            });
        };

        ids.remove(current);
        let target = target_index.min(ids.len());
        ids.insert(target, entry_id);
        write_ranks(&tx, folder_name, &ids)?;
        tx.commit()?;

        self.list_in_folder(folder_name)
    }

    fn complete_entry(&self, entry_id: EntryId) -> RepoResult<Reminder> {
        let completed = SystemFolder::Completed.name();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let source: Option<(String, i64)> = tx
            .query_row(
                "SELECT text, urgency_level
                 FROM reminders
                 WHERE entry_uuid = ?1
                 ORDER BY folder_name = ?2 ASC, id ASC
                 LIMIT 1;",
                params![entry_id.to_string(), completed],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((text, level)) = source else {
            return Err(RepoError::ReminderNotFound {
                entry_id,
                folder_name: None,
            });
        };
        let urgency = parse_urgency(level)?;

        let affected = folders_of_entry(&tx, entry_id)?;
        tx.execute(
            "DELETE FROM reminders
             WHERE entry_uuid = ?1
               AND folder_name != ?2;",
            params![entry_id.to_string(), completed],
        )?;
        tx.execute(
            "DELETE FROM reminder_notifications WHERE entry_uuid = ?1;",
            [entry_id.to_string()],
        )?;
        for folder in affected.iter().filter(|name| name.as_str() != completed) {
            compact_ranks(&tx, folder)?;
        }

        let already_completed = affected.iter().any(|name| name == completed);
        if !already_completed {
            let rank = next_rank(&tx, completed)?;
            insert_row(&tx, entry_id, &text, completed, rank, urgency, None)?;
        }
        tx.commit()?;

        self.get_row(entry_id, completed)?
            .ok_or(RepoError::ReminderNotFound {
                entry_id,
                folder_name: Some(completed.to_string()),
            })
    }

    fn delete_row(&self, folder_name: &str, entry_id: EntryId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "DELETE FROM reminders
             WHERE entry_uuid = ?1
               AND folder_name = ?2;",
            params![entry_id.to_string(), folder_name],
        )?;
        if changed == 0 {
            return Err(RepoError::ReminderNotFound {
                entry_id,
                folder_name: Some(folder_name.to_string()),
            });
        }
        tx.execute(
            "DELETE FROM reminder_notifications
             WHERE entry_uuid = ?1
               AND folder_name = ?2;",
            params![entry_id.to_string(), folder_name],
        )?;
        compact_ranks(&tx, folder_name)?;
        tx.commit()?;
        Ok(())
    }

    fn clear_folder(&self, folder_name: &str) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_folder_exists(&tx, folder_name)?;
        let removed = tx.execute("DELETE FROM reminders WHERE folder_name = ?1;", [folder_name])?;
        tx.execute(
            "DELETE FROM reminder_notifications WHERE folder_name = ?1;",
            [folder_name],
        )?;
        tx.commit()?;
        Ok(removed)
    }

    fn set_urgency(&self, entry_id: EntryId, urgency: Urgency) -> RepoResult<()> {
        let pinned = SystemFolder::Pinned.name();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let previous_level: Option<i64> = tx
            .query_row(
                "SELECT urgency_level FROM reminders WHERE entry_uuid = ?1 ORDER BY id ASC LIMIT 1;",
                [entry_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(previous_level) = previous_level else {
            return Err(RepoError::ReminderNotFound {
                entry_id,
                folder_name: None,
            });
        };
        let previous = parse_urgency(previous_level)?;

        tx.execute(
            "UPDATE reminders SET urgency_level = ?2 WHERE entry_uuid = ?1;",
            params![entry_id.to_string(), urgency.level()],
        )?;

        let folders = folders_of_entry(&tx, entry_id)?;
        let is_pinned = folders.iter().any(|name| name == pinned);
        let is_completed = folders
            .iter()
            .any(|name| name == SystemFolder::Completed.name());

        if urgency.pins() && !is_pinned && !is_completed {
            let text: String = tx.query_row(
                "SELECT text FROM reminders WHERE entry_uuid = ?1 LIMIT 1;",
                [entry_id.to_string()],
                |row| row.get(0),
            )?;
            let rank = next_rank(&tx, pinned)?;
            insert_row(&tx, entry_id, &text, pinned, rank, urgency, None)?;
        } else if previous.pins() && !urgency.pins() && is_pinned && folders.len() > 1 {
            // only a drop from High unpins; rows added to Pinned directly stay
            tx.execute(
                "DELETE FROM reminders WHERE entry_uuid = ?1 AND folder_name = ?2;",
                params![entry_id.to_string(), pinned],
            )?;
            compact_ranks(&tx, pinned)?;
        }

        tx.commit()?;
        Ok(())
    }
}

fn insert_row(
    conn: &Connection,
    entry_id: EntryId,
    text: &str,
    folder_name: &str,
    rank: i64,
    urgency: Urgency,
    notify_at: Option<NaiveDateTime>,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO reminders (
            entry_uuid,
            text,
            folder_name,
            reminder_order,
            urgency_level,
            notify_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            entry_id.to_string(),
            text,
            folder_name,
            rank,
            urgency.level(),
            notify_at.map(format_notify_at),
        ],
    )?;
    Ok(())
}

fn next_rank(conn: &Connection, folder_name: &str) -> RepoResult<i64> {
    let next = conn.query_row(
        "SELECT COALESCE(MAX(reminder_order), -1) + 1
         FROM reminders
         WHERE folder_name = ?1;",
        [folder_name],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn list_entry_ids(conn: &Connection, folder_name: &str) -> RepoResult<Vec<EntryId>> {
    let mut stmt = conn.prepare(
        "SELECT entry_uuid
         FROM reminders
         WHERE folder_name = ?1
         ORDER BY reminder_order ASC, id ASC;",
    )?;
    let mut rows = stmt.query([folder_name])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_entry_id(&value, "reminders.entry_uuid")?);
    }
    Ok(ids)
}

fn folders_of_entry(conn: &Connection, entry_id: EntryId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT folder_name
         FROM reminders
         WHERE entry_uuid = ?1
         ORDER BY id ASC;",
    )?;
    let mut rows = stmt.query([entry_id.to_string()])?;
    let mut folders = Vec::new();
    while let Some(row) = rows.next()? {
        folders.push(row.get(0)?);
    }
    Ok(folders)
}

fn write_ranks(conn: &Connection, folder_name: &str, ordered: &[EntryId]) -> RepoResult<()> {
    for (index, id) in ordered.iter().enumerate() {
        conn.execute(
            "UPDATE reminders
             SET reminder_order = ?3
             WHERE entry_uuid = ?1
               AND folder_name = ?2;",
            params![id.to_string(), folder_name, index as i64],
        )?;
    }
    Ok(())
}

fn compact_ranks(conn: &Connection, folder_name: &str) -> RepoResult<()> {
    let ids = list_entry_ids(conn, folder_name)?;
    write_ranks(conn, folder_name, &ids)
}

fn parse_urgency(level: i64) -> RepoResult<Urgency> {
    Urgency::from_level(level).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid urgency `{level}` in reminders.urgency_level"
        ))
    })
}

fn parse_reminder_row(row: &Row<'_>) -> RepoResult<Reminder> {
    let entry_text: String = row.get("entry_uuid")?;
    let entry_id = parse_entry_id(&entry_text, "reminders.entry_uuid")?;
    let urgency = parse_urgency(row.get("urgency_level")?)?;

    // A bad timestamp must not hide the reminder itself.
    let notify_at = match row.get::<_, Option<String>>("notify_at")? {
        Some(value) => match parse_notify_at(&value) {
            Ok(at) => Some(at),
            Err(err) => {
                warn!(
                    "event=reminder_load module=repo status=warn entry={} error={}",
                    entry_id, err
                );
                None
            }
        },
        None => None,
    };

    Ok(Reminder {
        entry_id,
        text: row.get("text")?,
        folder_name: row.get("folder_name")?,
        rank: row.get("reminder_order")?,
        urgency,
        notify_at,
    })
}
