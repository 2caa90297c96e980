//! Notification time repository.
//!
//! # Responsibility
//! - Store extra notification times scheduled for one reminder row.
//! - Collect notification candidates from both the reminder rows' own
//!   `notify_at` and the `reminder_notifications` table.
//!
//! # Invariants
//! - Notification rows always belong to an existing reminder row.
//! - Raw timestamps are returned unparsed; callers decide how to treat
//!   malformed values.

use super::{parse_entry_id, RepoError, RepoResult};
use crate::model::folder::SystemFolder;
use crate::model::reminder::EntryId;
use crate::model::schedule::format_notify_at;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Params, Transaction, TransactionBehavior};

/// Matches values written by `format_notify_at`; those compare correctly as text.
const CANONICAL_NOTIFY_AT_GLOB: &str =
    "[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9] [0-9][0-9]:[0-9][0-9]";

/// One unparsed notification time attached to a reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNotification {
    pub entry_id: EntryId,
    pub text: String,
    pub folder_name: String,
    pub notify_at: String,
}

/// Repository interface for notification times.
pub trait NotificationRepository {
    /// Stores `times` for one reminder row; duplicates are ignored.
    /// Returns the number of new rows.
    fn add_notifications(
        &self,
        entry_id: EntryId,
        folder_name: &str,
        times: &[NaiveDateTime],
    ) -> RepoResult<usize>;
    /// Every notification time of reminders in `folder_name`.
    fn notifications_for_folder(&self, folder_name: &str) -> RepoResult<Vec<RawNotification>>;
    /// Notification times of reminders outside `Completed` in `(after, until]`.
    ///
    /// `until = None` leaves the window open-ended. Values not stored in the
    /// canonical `YYYY-MM-DD HH:MM` form are always returned, since SQLite
    /// cannot compare them; callers filter those after parsing.
    fn open_notifications_between(
        &self,
        after: NaiveDateTime,
        until: Option<NaiveDateTime>,
    ) -> RepoResult<Vec<RawNotification>>;
}

/// SQLite-backed notification repository.
pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn add_notifications(
        &self,
        entry_id: EntryId,
        folder_name: &str,
        times: &[NaiveDateTime],
    ) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let exists: i64 = tx.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM reminders WHERE entry_uuid = ?1 AND folder_name = ?2
            );",
            params![entry_id.to_string(), folder_name],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(RepoError::ReminderNotFound {
                entry_id,
                folder_name: Some(folder_name.to_string()),
            });
        }

        let mut inserted = 0;
        for at in times {
            inserted += tx.execute(
                "INSERT OR IGNORE INTO reminder_notifications (entry_uuid, folder_name, notify_at)
                 VALUES (?1, ?2, ?3);",
                params![entry_id.to_string(), folder_name, format_notify_at(*at)],
            )?;
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn notifications_for_folder(&self, folder_name: &str) -> RepoResult<Vec<RawNotification>> {
        query_notifications(
            self.conn,
            "SELECT r.entry_uuid, r.text, r.folder_name, r.notify_at
             FROM reminders r
             WHERE r.folder_name = ?1
               AND r.notify_at IS NOT NULL
             UNION ALL
             SELECT n.entry_uuid, r.text, n.folder_name, n.notify_at
             FROM reminder_notifications n
             INNER JOIN reminders r
                ON r.entry_uuid = n.entry_uuid AND r.folder_name = n.folder_name
             WHERE n.folder_name = ?1;",
            [folder_name],
        )
    }

    fn open_notifications_between(
        &self,
        after: NaiveDateTime,
        until: Option<NaiveDateTime>,
    ) -> RepoResult<Vec<RawNotification>> {
        query_notifications(
            self.conn,
            "SELECT r.entry_uuid, r.text, r.folder_name, r.notify_at
             FROM reminders r
             WHERE r.folder_name != ?1
               AND r.notify_at IS NOT NULL
               AND (r.notify_at NOT GLOB ?4
                    OR (r.notify_at > ?2 AND (?3 IS NULL OR r.notify_at <= ?3)))
             UNION ALL
             SELECT n.entry_uuid, r.text, n.folder_name, n.notify_at
             FROM reminder_notifications n
             INNER JOIN reminders r
                ON r.entry_uuid = n.entry_uuid AND r.folder_name = n.folder_name
             WHERE n.folder_name != ?1
               AND (n.notify_at NOT GLOB ?4
                    OR (n.notify_at > ?2 AND (?3 IS NULL OR n.notify_at <= ?3)));",
            params![
                SystemFolder::Completed.name(),
                format_notify_at(after),
                until.map(format_notify_at),
                CANONICAL_NOTIFY_AT_GLOB,
            ],
        )
    }
}

fn query_notifications(
    conn: &Connection,
    sql: &str,
    params: impl Params,
) -> RepoResult<Vec<RawNotification>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        let entry_text: String = row.get(0)?;
        result.push(RawNotification {
            entry_id: parse_entry_id(&entry_text, "reminders.entry_uuid")?,
            text: row.get(1)?,
            folder_name: row.get(2)?,
            notify_at: row.get(3)?,
        });
    }
    Ok(result)
}
