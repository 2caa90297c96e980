//! Folder use-case service.
//!
//! # Responsibility
//! - Create, rename, delete and reorder folders.
//! - Protect the system folders.
//!
//! # Invariants
//! - System folders cannot be deleted, renamed, moved or given an icon.
//! - Listing always returns system folders first in fixed order.

use crate::model::folder::{
    is_icon_image, normalize_folder_name, sort_folders, Folder, SystemFolder,
};
use crate::repo::folder_repo::FolderRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Errors from folder service operations.
#[derive(Debug)]
pub enum FolderServiceError {
    /// Folder name is blank after trim.
    InvalidName,
    FolderNotFound(String),
    DuplicateFolder(String),
    /// Operation is not allowed on a system folder.
    ProtectedFolder(SystemFolder),
    /// Icon file does not have an image extension.
    UnsupportedIcon(PathBuf),
    Repo(RepoError),
}

impl Display for FolderServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "folder name must not be blank"),
            Self::FolderNotFound(name) => write!(f, "folder not found: {name}"),
            Self::DuplicateFolder(name) => write!(f, "folder already exists: {name}"),
            Self::ProtectedFolder(folder) => {
                write!(f, "{folder} is a permanent folder and cannot be changed")
            }
            Self::UnsupportedIcon(path) => {
                write!(f, "unsupported icon image: {}", path.display())
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FolderServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for FolderServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::FolderNotFound(name) => Self::FolderNotFound(name),
            RepoError::DuplicateFolder(name) => Self::DuplicateFolder(name),
            other => Self::Repo(other),
        }
    }
}

/// Folder service facade.
pub struct FolderService<R: FolderRepository> {
    repo: R,
}

impl<R: FolderRepository> FolderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists folders in sidebar order.
    pub fn list(&self) -> Result<Vec<Folder>, FolderServiceError> {
        let mut folders = self.repo.list_folders()?;
        sort_folders(&mut folders);
        Ok(folders)
    }

    pub fn get(&self, name: &str) -> Result<Folder, FolderServiceError> {
        self.repo
            .get_folder(name.trim())?
            .ok_or_else(|| FolderServiceError::FolderNotFound(name.trim().to_string()))
    }

    /// Creates a custom folder at the end of the custom list.
    pub fn create(&self, name: &str) -> Result<Folder, FolderServiceError> {
        let name = normalize_folder_name(name).map_err(|_| FolderServiceError::InvalidName)?;
        let folder = self.repo.insert_folder(&name)?;
        info!(
            "event=folder_create module=service status=ok rank={}",
            folder.rank
        );
        Ok(folder)
    }

    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<(), FolderServiceError> {
        let old_name = old_name.trim();
        ensure_not_system(old_name)?;
        let new_name =
            normalize_folder_name(new_name).map_err(|_| FolderServiceError::InvalidName)?;
        if old_name == new_name {
            return Ok(());
        }
        self.repo.rename_folder(old_name, &new_name)?;
        Ok(())
    }

    /// Deletes a custom folder together with its reminders.
    pub fn delete(&self, name: &str) -> Result<(), FolderServiceError> {
        let name = name.trim();
        ensure_not_system(name)?;
        self.repo.delete_folder(name)?;
        info!("event=folder_delete module=service status=ok");
        Ok(())
    }

    /// Moves a custom folder to `target_index` within the custom folders.
    ///
    /// The index is relative to the custom list (0 = directly below the
    /// system folders) and is clamped to its length.
    pub fn move_folder(
        &self,
        name: &str,
        target_index: usize,
    ) -> Result<Vec<Folder>, FolderServiceError> {
        let name = name.trim();
        ensure_not_system(name)?;

        let mut custom: Vec<String> = self
            .list()?
            .into_iter()
            .filter(|folder| !folder.is_system())
            .map(|folder| folder.name)
            .collect();
        let Some(current) = custom.iter().position(|candidate| candidate == name) else {
            return Err(FolderServiceError::FolderNotFound(name.to_string()));
        };

        let moved = custom.remove(current);
        let target = target_index.min(custom.len());
        custom.insert(target, moved);
        self.repo.rewrite_custom_order(&custom)?;
        self.list()
    }

    /// Sets or clears a custom folder's icon image.
    pub fn set_icon(&self, name: &str, icon: Option<PathBuf>) -> Result<(), FolderServiceError> {
        let name = name.trim();
        ensure_not_system(name)?;
        if let Some(path) = icon.as_deref() {
            if !is_icon_image(path) {
                return Err(FolderServiceError::UnsupportedIcon(path.to_path_buf()));
            }
        }
        self.repo.set_icon(name, icon.as_deref())?;
        Ok(())
    }
}

fn ensure_not_system(name: &str) -> Result<(), FolderServiceError> {
    match SystemFolder::from_name(name) {
        Some(system) => Err(FolderServiceError::ProtectedFolder(system)),
        None => Ok(()),
    }
}
