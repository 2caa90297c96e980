//! Explicit application state.
//!
//! # Responsibility
//! - Own the single database connection for the process.
//! - Track the active theme and the selected folder.
//! - Push theme changes to every registered observer.
//!
//! # Invariants
//! - `theme()` always matches what `ThemeService::active` would return
//!   after the last successful theme change.
//! - `selected_folder()` names an existing folder as long as folders are
//!   renamed and deleted through `rename_folder` and `delete_folder`.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::theme::{BuiltinTheme, Theme, ThemeRoles};
use crate::repo::folder_repo::SqliteFolderRepository;
use crate::repo::notification_repo::SqliteNotificationRepository;
use crate::repo::reminder_repo::SqliteReminderRepository;
use crate::repo::theme_repo::SqliteThemeRepository;
use crate::service::folder_service::{FolderService, FolderServiceError};
use crate::service::reminder_service::ReminderService;
use crate::service::schedule_service::ScheduleService;
use crate::service::theme_service::{ThemeService, ThemeServiceError};
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type SqliteFolderService<'conn> = FolderService<SqliteFolderRepository<'conn>>;
pub type SqliteReminderService<'conn> =
    ReminderService<SqliteReminderRepository<'conn>, SqliteNotificationRepository<'conn>>;
pub type SqliteScheduleService<'conn> =
    ScheduleService<SqliteReminderRepository<'conn>, SqliteNotificationRepository<'conn>>;
pub type SqliteThemeService<'conn> = ThemeService<SqliteThemeRepository<'conn>>;

/// Receives theme colors whenever the active theme changes.
pub trait ThemeObserver {
    fn apply_theme(&self, roles: &ThemeRoles);
}

#[derive(Debug)]
pub enum StateError {
    Db(DbError),
    Theme(ThemeServiceError),
}

impl Display for StateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Theme(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Theme(err) => Some(err),
        }
    }
}

impl From<DbError> for StateError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<ThemeServiceError> for StateError {
    fn from(value: ThemeServiceError) -> Self {
        Self::Theme(value)
    }
}

pub struct AppState {
    conn: Connection,
    theme: Theme,
    selected_folder: Option<String>,
    observers: Vec<Box<dyn ThemeObserver>>,
}

impl AppState {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StateError> {
        Self::from_connection(open_db(path)?)
    }

    pub fn in_memory() -> Result<Self, StateError> {
        Self::from_connection(open_db_in_memory()?)
    }

    /// Wraps an already migrated connection and loads the active theme.
    pub fn from_connection(conn: Connection) -> Result<Self, StateError> {
        let theme = ThemeService::new(SqliteThemeRepository::new(&conn)).active()?;
        Ok(Self {
            conn,
            theme,
            selected_folder: None,
            observers: Vec::new(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn folders(&self) -> SqliteFolderService<'_> {
        FolderService::new(SqliteFolderRepository::new(&self.conn))
    }

    pub fn reminders(&self) -> SqliteReminderService<'_> {
        ReminderService::new(
            SqliteReminderRepository::new(&self.conn),
            SqliteNotificationRepository::new(&self.conn),
        )
    }

    pub fn schedule(&self) -> SqliteScheduleService<'_> {
        ScheduleService::new(
            SqliteReminderRepository::new(&self.conn),
            SqliteNotificationRepository::new(&self.conn),
        )
    }

    pub fn themes(&self) -> SqliteThemeService<'_> {
        ThemeService::new(SqliteThemeRepository::new(&self.conn))
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Registers an observer and immediately paints it with the active theme.
    pub fn register_observer(&mut self, observer: Box<dyn ThemeObserver>) {
        observer.apply_theme(&self.theme.roles());
        self.observers.push(observer);
    }

    /// Persists `name` as the selected theme and repaints observers.
    pub fn set_theme(&mut self, name: &str) -> Result<&Theme, ThemeServiceError> {
        let theme = self.themes().select(name)?;
        Ok(self.apply_theme(theme))
    }

    pub fn choose_builtin(&mut self, builtin: BuiltinTheme) -> Result<&Theme, ThemeServiceError> {
        let theme = self.themes().choose_builtin(builtin)?;
        Ok(self.apply_theme(theme))
    }

    /// Saves a custom theme, selects it and repaints observers.
    pub fn save_theme(&mut self, theme: &Theme) -> Result<&Theme, ThemeServiceError> {
        let saved = self.themes().save(theme)?;
        Ok(self.apply_theme(saved))
    }

    /// Deletes a saved theme; deleting the active one reverts to whatever
    /// storage now reports as active.
    pub fn delete_theme(&mut self, name: &str) -> Result<(), ThemeServiceError> {
        self.themes().delete(name)?;
        if self.theme.name == name.trim() {
            let active = self.themes().active()?;
            self.apply_theme(active);
        }
        Ok(())
    }

    /// Makes `theme` current in memory and notifies every observer.
    pub fn apply_theme(&mut self, theme: Theme) -> &Theme {
        let roles = theme.roles();
        for observer in &self.observers {
            observer.apply_theme(&roles);
        }
        info!(
            "event=theme_apply module=state status=ok theme={} observers={}",
            theme.name,
            self.observers.len()
        );
        self.theme = theme;
        &self.theme
    }

    pub fn selected_folder(&self) -> Option<&str> {
        self.selected_folder.as_deref()
    }

    pub fn select_folder(&mut self, name: &str) -> Result<&str, FolderServiceError> {
        let folder = self.folders().get(name)?;
        Ok(self.selected_folder.insert(folder.name).as_str())
    }

    pub fn clear_selected_folder(&mut self) {
        self.selected_folder = None;
    }

    /// Renames a folder and carries the selection over to the new name.
    pub fn rename_folder(
        &mut self,
        old_name: &str,
        new_name: &str,
    ) -> Result<(), FolderServiceError> {
        self.folders().rename(old_name, new_name)?;
        if self.selected_folder.as_deref() == Some(old_name.trim()) {
            self.selected_folder = Some(new_name.trim().to_string());
        }
        Ok(())
    }

    /// Deletes a folder and drops the selection if it pointed there.
    pub fn delete_folder(&mut self, name: &str) -> Result<(), FolderServiceError> {
        self.folders().delete(name)?;
        if self.selected_folder.as_deref() == Some(name.trim()) {
            self.selected_folder = None;
        }
        Ok(())
    }
}
