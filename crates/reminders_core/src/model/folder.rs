//! Folder domain model.
//!
//! # Invariants
//! - Folder names are trimmed and never blank.
//! - The four system folders always exist and occupy ranks 0..=3.
//! - Custom folder ranks start at [`FIRST_CUSTOM_RANK`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Rank given to the first user-created folder.
pub const FIRST_CUSTOM_RANK: i64 = 4;

/// Built-in icon used by custom folders without an icon of their own.
pub const DEFAULT_FOLDER_ICON: &str = "anything";

/// Non-deletable folders maintained by the application itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemFolder {
    /// Mirrors every high urgency reminder.
    Pinned,
    /// Mirrors reminders flagged as recurring.
    Recurring,
    /// Mirrors every open reminder added anywhere else.
    NonCompleted,
    /// Holds reminders after completion.
    Completed,
}

impl SystemFolder {
    /// All system folders in their fixed display order.
    pub const ALL: [SystemFolder; 4] = [
        SystemFolder::Pinned,
        SystemFolder::Recurring,
        SystemFolder::NonCompleted,
        SystemFolder::Completed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Pinned => "Pinned",
            Self::Recurring => "Recurring",
            Self::NonCompleted => "Non-Completed",
            Self::Completed => "Completed",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|folder| folder.name() == name)
    }

    /// Fixed rank of this folder in the sidebar.
    pub fn rank(self) -> i64 {
        match self {
            Self::Pinned => 0,
            Self::Recurring => 1,
            Self::NonCompleted => 2,
            Self::Completed => 3,
        }
    }

    /// Key of the built-in icon rendered for this folder.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Pinned => "pinned",
            Self::Recurring => "recurring",
            Self::NonCompleted => "incomplete",
            Self::Completed => "check",
        }
    }
}

impl Display for SystemFolder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Icon resolved for one folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderIcon {
    /// Icon shipped with the application, identified by key.
    Builtin(&'static str),
    /// User-selected image file.
    Custom(PathBuf),
}

/// Folder read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
    /// User-selected icon image. `None` when unset.
    pub icon_path: Option<PathBuf>,
    /// Display rank; system folders use their fixed rank.
    pub rank: i64,
}

impl Folder {
    pub fn system(&self) -> Option<SystemFolder> {
        SystemFolder::from_name(&self.name)
    }

    pub fn is_system(&self) -> bool {
        self.system().is_some()
    }

    /// Resolves the icon to render; system folders ignore custom paths.
    pub fn icon(&self) -> FolderIcon {
        if let Some(system) = self.system() {
            return FolderIcon::Builtin(system.icon());
        }
        match self.icon_path.as_deref() {
            Some(path) => FolderIcon::Custom(path.to_path_buf()),
            None => FolderIcon::Builtin(DEFAULT_FOLDER_ICON),
        }
    }
}

/// Error returned for folder names that cannot be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlankFolderName;

impl Display for BlankFolderName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "folder name must not be blank")
    }
}

impl std::error::Error for BlankFolderName {}

/// Trims a user supplied folder name.
pub fn normalize_folder_name(raw: &str) -> Result<String, BlankFolderName> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(BlankFolderName);
    }
    Ok(trimmed.to_string())
}

/// Sorts folders for display: system folders first in fixed order, then
/// custom folders by rank with name as tie-breaker.
pub fn sort_folders(folders: &mut [Folder]) {
    folders.sort_by(compare_folders);
}

fn compare_folders(a: &Folder, b: &Folder) -> Ordering {
    match (a.system(), b.system()) {
        (Some(x), Some(y)) => x.rank().cmp(&y.rank()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.rank.cmp(&b.rank).then_with(|| a.name.cmp(&b.name)),
    }
}

/// Accepted icon image extensions, lowercase.
pub const ICON_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Returns whether `path` has an accepted image extension.
pub fn is_icon_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| ICON_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(name: &str, rank: i64) -> Folder {
        Folder {
            name: name.to_string(),
            icon_path: None,
            rank,
        }
    }

    #[test]
    fn system_folders_sort_first_even_with_bogus_ranks() {
        let mut folders = vec![
            folder("Work", 0),
            folder("Completed", 99),
            folder("Home", 5),
            folder("Pinned", 42),
            folder("Non-Completed", 7),
            folder("Recurring", -3),
        ];
        sort_folders(&mut folders);
        let names: Vec<_> = folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["Pinned", "Recurring", "Non-Completed", "Completed", "Work", "Home"]
        );
    }

    #[test]
    fn system_folder_icons_ignore_custom_path() {
        let mut pinned = folder("Pinned", 0);
        pinned.icon_path = Some(PathBuf::from("/tmp/custom.png"));
        assert_eq!(pinned.icon(), FolderIcon::Builtin("pinned"));

        let plain = folder("Groceries", 4);
        assert_eq!(plain.icon(), FolderIcon::Builtin(DEFAULT_FOLDER_ICON));
    }

    #[test]
    fn normalize_rejects_blank_names() {
        assert_eq!(normalize_folder_name("  Trips "), Ok("Trips".to_string()));
        assert_eq!(normalize_folder_name(" \t"), Err(BlankFolderName));
    }

    #[test]
    fn icon_extension_check_is_case_insensitive() {
        assert!(is_icon_image(Path::new("a/b/Cat.PNG")));
        assert!(!is_icon_image(Path::new("notes.txt")));
        assert!(!is_icon_image(Path::new("no_extension")));
    }
}
