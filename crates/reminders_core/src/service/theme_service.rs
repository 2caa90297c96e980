//! Theme use-case service.
//!
//! # Invariants
//! - Dark and Light always exist and cannot be deleted.
//! - [`ThemeService::active`] never fails for lack of a selection; it
//!   falls back to [`Theme::fallback`].

use crate::model::theme::{is_protected_theme, BuiltinTheme, Theme};
use crate::repo::theme_repo::ThemeRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ThemeServiceError {
    /// Theme name is blank after trim.
    InvalidName,
    ThemeNotFound(String),
    /// Dark and Light cannot be deleted or overwritten.
    ProtectedTheme(String),
    Repo(RepoError),
}

impl Display for ThemeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "theme name must not be blank"),
            Self::ThemeNotFound(name) => write!(f, "theme not found: {name}"),
            Self::ProtectedTheme(name) => write!(f, "theme {name} is built in"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ThemeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ThemeServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ThemeNotFound(name) => Self::ThemeNotFound(name),
            other => Self::Repo(other),
        }
    }
}

pub struct ThemeService<R: ThemeRepository> {
    repo: R,
}

impl<R: ThemeRepository> ThemeService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// User-visible saved themes, newest first; Dark and Light are offered
    /// separately.
    pub fn list_saved(&self) -> Result<Vec<Theme>, ThemeServiceError> {
        Ok(self
            .repo
            .list_themes()?
            .into_iter()
            .map(|stored| stored.theme)
            .filter(|theme| !theme.is_protected())
            .collect())
    }

    pub fn active(&self) -> Result<Theme, ThemeServiceError> {
        Ok(self.repo.selected_theme()?.unwrap_or_else(Theme::fallback))
    }

    pub fn needs_first_run_choice(&self) -> Result<bool, ThemeServiceError> {
        Ok(self.repo.selected_theme()?.is_none())
    }

    pub fn choose_builtin(&self, builtin: BuiltinTheme) -> Result<Theme, ThemeServiceError> {
        let theme = builtin.theme();
        // restores the stock colors if the row was ever edited by hand
        self.repo.upsert_theme(&theme, true)?;
        info!(
            "event=theme_select module=service status=ok theme={}",
            theme.name
        );
        Ok(theme)
    }

    /// Saves a custom theme under its name and makes it active.
    pub fn save(&self, theme: &Theme) -> Result<Theme, ThemeServiceError> {
        let name = theme.name.trim();
        if name.is_empty() {
            return Err(ThemeServiceError::InvalidName);
        }
        if is_protected_theme(name) {
            return Err(ThemeServiceError::ProtectedTheme(name.to_string()));
        }
        let theme = Theme {
            name: name.to_string(),
            ..theme.clone()
        };
        self.repo.upsert_theme(&theme, true)?;
        info!("event=theme_save module=service status=ok theme={name}");
        Ok(theme)
    }

    pub fn select(&self, name: &str) -> Result<Theme, ThemeServiceError> {
        let name = name.trim();
        self.repo.select_theme(name)?;
        let stored = self
            .repo
            .get_theme(name)?
            .ok_or_else(|| ThemeServiceError::ThemeNotFound(name.to_string()))?;
        info!("event=theme_select module=service status=ok theme={name}");
        Ok(stored.theme)
    }

    pub fn delete(&self, name: &str) -> Result<(), ThemeServiceError> {
        let name = name.trim();
        if is_protected_theme(name) {
            return Err(ThemeServiceError::ProtectedTheme(name.to_string()));
        }
        self.repo.delete_theme(name)?;
        info!("event=theme_delete module=service status=ok theme={name}");
        Ok(())
    }
}
