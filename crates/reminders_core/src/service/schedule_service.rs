//! Notification scheduling service.
//!
//! # Responsibility
//! - Expand a calendar pick into concrete notification times.
//! - Answer "what is due between two instants" for the delivery loop.
//!
//! # Invariants
//! - Due items are read from storage on every call; completed or deleted
//!   reminders never come back.
//! - Each `(entry, time)` pair is reported once even when the entry is
//!   mirrored into several folders.

use crate::model::reminder::EntryId;
use crate::model::schedule::{at_time_of, parse_notify_at, Recurrence};
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::reminder_repo::ReminderRepository;
use crate::repo::RepoError;
use chrono::{NaiveDate, NaiveDateTime};
use log::{info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One notification that should be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueNotification {
    pub entry_id: EntryId,
    pub text: String,
    pub at: NaiveDateTime,
}

#[derive(Debug)]
pub enum ScheduleServiceError {
    ReminderNotFound {
        entry_id: EntryId,
        folder_name: String,
    },
    Repo(RepoError),
}

impl Display for ScheduleServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReminderNotFound {
                entry_id,
                folder_name,
            } => write!(f, "reminder {entry_id} not found in folder {folder_name}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ScheduleServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::ReminderNotFound { .. } => None,
        }
    }
}

impl From<RepoError> for ScheduleServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ReminderNotFound {
                entry_id,
                folder_name: Some(folder_name),
            } => Self::ReminderNotFound {
                entry_id,
                folder_name,
            },
            other => Self::Repo(other),
        }
    }
}

pub struct ScheduleService<R: ReminderRepository, N: NotificationRepository> {
    reminders: R,
    notifications: N,
}

impl<R: ReminderRepository, N: NotificationRepository> ScheduleService<R, N> {
    pub fn new(reminders: R, notifications: N) -> Self {
        Self {
            reminders,
            notifications,
        }
    }

    /// Stores notifications for `date` and its recurrences on one reminder row.
    ///
    /// The time of day comes from the row's own `notify_at`, or 09:00.
    /// Returns every occurrence, including ones that were already stored.
    pub fn schedule(
        &self,
        entry_id: EntryId,
        folder_name: &str,
        date: NaiveDate,
        recurrence: Recurrence,
    ) -> Result<Vec<NaiveDateTime>, ScheduleServiceError> {
        let row = self.reminders.get_row(entry_id, folder_name)?.ok_or_else(|| {
            ScheduleServiceError::ReminderNotFound {
                entry_id,
                folder_name: folder_name.to_string(),
            }
        })?;

        let base = at_time_of(date, row.notify_at);
        let occurrences = recurrence.occurrences(base);
        let inserted = self
            .notifications
            .add_notifications(entry_id, folder_name, &occurrences)?;
        info!(
            "event=notification_schedule module=service status=ok entry={} recurrence={:?} stored={}",
            entry_id, recurrence, inserted
        );
        Ok(occurrences)
    }

    /// Notifications due in `(from, to]`, ordered by time.
    pub fn due(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<DueNotification>, ScheduleServiceError> {
        Ok(self
            .pending(from, Some(to))?
            .into_iter()
            .filter(|item| item.at > from && item.at <= to)
            .collect())
    }

    /// The next `limit` notifications strictly after `after`.
    pub fn upcoming(
        &self,
        after: NaiveDateTime,
        limit: usize,
    ) -> Result<Vec<DueNotification>, ScheduleServiceError> {
        Ok(self
            .pending(after, None)?
            .into_iter()
            .filter(|item| item.at > after)
            .take(limit)
            .collect())
    }

    /// Parsed and deduplicated candidates for `(after, until]`.
    ///
    /// Storage narrows the window; rows it cannot compare still pass through,
    /// so callers apply the exact bounds again.
    fn pending(
        &self,
        after: NaiveDateTime,
        until: Option<NaiveDateTime>,
    ) -> Result<Vec<DueNotification>, ScheduleServiceError> {
        let mut unique: BTreeMap<(NaiveDateTime, EntryId), String> = BTreeMap::new();
        for raw in self
            .notifications
            .open_notifications_between(after, until)?
        {
            match parse_notify_at(&raw.notify_at) {
                Ok(at) => {
                    unique.entry((at, raw.entry_id)).or_insert(raw.text);
                }
                Err(err) => warn!(
                    "event=notification_scan module=service status=warn entry={} error={}",
                    raw.entry_id, err
                ),
            }
        }
        Ok(unique
            .into_iter()
            .map(|((at, entry_id), text)| DueNotification { entry_id, text, at })
            .collect())
    }
}
