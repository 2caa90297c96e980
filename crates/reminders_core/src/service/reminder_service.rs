//! Reminder use-case service.
//!
//! # Responsibility
//! - Add reminders and fan them out into the system folders.
//! - Reorder, complete, remove and re-prioritize reminders.
//! - Assemble folder listings with every known notification time.
//!
//! # Invariants
//! - Adding to any folder other than `Non-Completed` also writes a
//!   `Non-Completed` row with its own rank.
//! - High urgency reminders are mirrored into `Pinned`.
//! - Reminders only enter `Completed` through [`ReminderService::complete`].

use crate::model::folder::SystemFolder;
use crate::model::reminder::{
    split_occurrences, EntryId, Reminder, ReminderDraft, ReminderInstance, ReminderView, Urgency,
};
use crate::model::schedule::parse_notify_at;
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::reminder_repo::{NewEntry, Placement, ReminderRepository};
use crate::repo::RepoError;
use chrono::NaiveDateTime;
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Errors from reminder service operations.
#[derive(Debug)]
pub enum ReminderServiceError {
    /// Reminder text is blank after trim.
    InvalidText,
    FolderNotFound(String),
    /// Reminders cannot be added to `Completed` directly.
    CompletedIsReadOnly,
    ReminderNotFound {
        entry_id: EntryId,
        folder_name: Option<String>,
    },
    Repo(RepoError),
}

impl Display for ReminderServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidText => write!(f, "reminder text must not be blank"),
            Self::FolderNotFound(name) => write!(f, "folder not found: {name}"),
            Self::CompletedIsReadOnly => {
                write!(f, "reminders can only enter Completed by being completed")
            }
            Self::ReminderNotFound {
                entry_id,
                folder_name: Some(folder),
            } => write!(f, "reminder {entry_id} not found in folder {folder}"),
            Self::ReminderNotFound {
                entry_id,
                folder_name: None,
            } => write!(f, "reminder not found: {entry_id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ReminderServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ReminderServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::FolderNotFound(name) => Self::FolderNotFound(name),
            RepoError::ReminderNotFound {
                entry_id,
                folder_name,
            } => Self::ReminderNotFound {
                entry_id,
                folder_name,
            },
            other => Self::Repo(other),
        }
    }
}

/// Reminder service facade.
pub struct ReminderService<R: ReminderRepository, N: NotificationRepository> {
    reminders: R,
    notifications: N,
}

impl<R: ReminderRepository, N: NotificationRepository> ReminderService<R, N> {
    pub fn new(reminders: R, notifications: N) -> Self {
        Self {
            reminders,
            notifications,
        }
    }

    /// Adds a reminder entry and its system folder mirrors.
    ///
    /// Returns every written row; the first one belongs to the target folder.
    pub fn add(&self, draft: &ReminderDraft) -> Result<Vec<Reminder>, ReminderServiceError> {
        let text = draft.text.trim();
        if text.is_empty() {
            return Err(ReminderServiceError::InvalidText);
        }
        let folder = draft.folder_name.trim();
        if folder == SystemFolder::Completed.name() {
            return Err(ReminderServiceError::CompletedIsReadOnly);
        }

        let entry = NewEntry {
            entry_id: Uuid::new_v4(),
            text: text.to_string(),
            urgency: draft.urgency,
            placements: placements_for(folder, draft),
        };
        let rows = self.reminders.insert_entry(&entry)?;
        info!(
            "event=reminder_add module=service status=ok entry={} rows={} urgency={}",
            entry.entry_id,
            rows.len(),
            entry.urgency.level()
        );
        Ok(rows)
    }

    /// Lists a folder's reminders in rank order with their notification times.
    pub fn list(&self, folder_name: &str) -> Result<Vec<ReminderView>, ReminderServiceError> {
        let folder_name = folder_name.trim();
        let reminders = self.reminders.list_in_folder(folder_name)?;
        let mut times: BTreeMap<EntryId, BTreeSet<NaiveDateTime>> = BTreeMap::new();

        for raw in self.notifications.notifications_for_folder(folder_name)? {
            match parse_notify_at(&raw.notify_at) {
                Ok(at) => {
                    times.entry(raw.entry_id).or_default().insert(at);
                }
                Err(err) => warn!(
                    "event=reminder_list module=service status=warn entry={} error={}",
                    raw.entry_id, err
                ),
            }
        }

        let show_urgency = folder_name != SystemFolder::Completed.name();
        Ok(reminders
            .into_iter()
            .map(|reminder| ReminderView {
                occurrences: times
                    .remove(&reminder.entry_id)
                    .map(|set| set.into_iter().collect())
                    .unwrap_or_default(),
                reminder,
                show_urgency,
            })
            .collect())
    }

    /// Lists a folder as display instances: past occurrences become their
    /// own labeled rows, future ones stay grouped.
    pub fn instances(
        &self,
        folder_name: &str,
        now: NaiveDateTime,
    ) -> Result<Vec<ReminderInstance>, ReminderServiceError> {
        Ok(self
            .list(folder_name)?
            .iter()
            .flat_map(|view| {
                split_occurrences(
                    view.reminder.entry_id,
                    &view.reminder.text,
                    &view.occurrences,
                    now,
                )
            })
            .collect())
    }

    /// Moves one reminder to `target_index` inside its folder.
    pub fn reorder(
        &self,
        folder_name: &str,
        entry_id: EntryId,
        target_index: usize,
    ) -> Result<Vec<Reminder>, ReminderServiceError> {
        let rows = self
            .reminders
            .move_within_folder(folder_name.trim(), entry_id, target_index)?;
        info!(
            "event=reminder_reorder module=service status=ok entry={} target={} rows={}",
            entry_id,
            target_index,
            rows.len()
        );
        Ok(rows)
    }

    /// Marks an entry complete everywhere.
    pub fn complete(&self, entry_id: EntryId) -> Result<Reminder, ReminderServiceError> {
        let row = self.reminders.complete_entry(entry_id)?;
        info!("event=reminder_complete module=service status=ok entry={entry_id}");
        Ok(row)
    }

    /// Removes one row of an entry from a single folder.
    pub fn remove(&self, folder_name: &str, entry_id: EntryId) -> Result<(), ReminderServiceError> {
        self.reminders.delete_row(folder_name.trim(), entry_id)?;
        Ok(())
    }

    /// Changes urgency on every row of an entry, pinning or unpinning it.
    pub fn set_urgency(
        &self,
        entry_id: EntryId,
        urgency: Urgency,
    ) -> Result<(), ReminderServiceError> {
        self.reminders.set_urgency(entry_id, urgency)?;
        Ok(())
    }

    /// Deletes everything in `Completed`; returns the number of rows removed.
    pub fn clear_completed(&self) -> Result<usize, ReminderServiceError> {
        let removed = self
            .reminders
            .clear_folder(SystemFolder::Completed.name())?;
        info!("event=reminder_clear_completed module=service status=ok removed={removed}");
        Ok(removed)
    }

    /// Every row of one entry across folders.
    pub fn entry(&self, entry_id: EntryId) -> Result<Vec<Reminder>, ReminderServiceError> {
        let rows = self.reminders.entry_rows(entry_id)?;
        if rows.is_empty() {
            return Err(ReminderServiceError::ReminderNotFound {
                entry_id,
                folder_name: None,
            });
        }
        Ok(rows)
    }
}

fn placements_for(folder: &str, draft: &ReminderDraft) -> Vec<Placement> {
    let mut placements = vec![Placement {
        folder_name: folder.to_string(),
        notify_at: draft.notify_at,
    }];

    if draft.recurring && folder != SystemFolder::Recurring.name() {
        placements.push(Placement {
            folder_name: SystemFolder::Recurring.name().to_string(),
            notify_at: draft.notify_at,
        });
    }
    if draft.urgency.pins() && folder != SystemFolder::Pinned.name() {
        placements.push(Placement {
            folder_name: SystemFolder::Pinned.name().to_string(),
            notify_at: None,
        });
    }
    if folder != SystemFolder::NonCompleted.name() {
        placements.push(Placement {
            folder_name: SystemFolder::NonCompleted.name().to_string(),
            notify_at: draft.notify_at,
        });
    }
    placements
}
