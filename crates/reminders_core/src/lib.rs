//! Core domain logic for the reminders app.
//! Folders, reminders, themes and notification schedules live here; front
//! ends only call into the services and [`AppState`].

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;
pub mod state;

pub use config::{AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LogOptions, LoggingError};
pub use model::folder::{Folder, SystemFolder};
pub use model::reminder::{EntryId, Reminder, ReminderDraft, ReminderView, Urgency};
pub use model::schedule::{Meridiem, Recurrence, ScheduleError};
pub use model::theme::{BuiltinTheme, Color, Theme, ThemeRoles};
pub use notify::{NotificationScheduler, Notifier, NotifierKind, NotifyError};
pub use repo::{RepoError, RepoResult};
pub use service::folder_service::FolderServiceError;
pub use service::reminder_service::ReminderServiceError;
pub use service::schedule_service::{DueNotification, ScheduleServiceError};
pub use service::theme_service::ThemeServiceError;
pub use state::{AppState, StateError, ThemeObserver};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
