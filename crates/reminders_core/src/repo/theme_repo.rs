//! Theme repository contract and SQLite implementation.
//!
//! # Invariants
//! - Theme names are unique; saving an existing name replaces its colors.
//! - At most one theme row has `selected = 1`.

use super::{RepoError, RepoResult};
use crate::model::theme::{Color, Theme};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const THEME_SELECT_SQL: &str = "SELECT
    name,
    background,
    \"primary\",
    secondary,
    \"text\",
    selected
FROM themes";

/// Stored theme with its selection flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTheme {
    pub theme: Theme,
    pub selected: bool,
}

/// Repository interface for theme persistence.
pub trait ThemeRepository {
    /// Lists every theme, most recently created first.
    fn list_themes(&self) -> RepoResult<Vec<StoredTheme>>;
    fn get_theme(&self, name: &str) -> RepoResult<Option<StoredTheme>>;
    /// Inserts or replaces a theme by name, optionally selecting it.
    fn upsert_theme(&self, theme: &Theme, select: bool) -> RepoResult<()>;
    fn select_theme(&self, name: &str) -> RepoResult<()>;
    fn selected_theme(&self) -> RepoResult<Option<Theme>>;
    fn delete_theme(&self, name: &str) -> RepoResult<()>;
}

/// SQLite-backed theme repository.
pub struct SqliteThemeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteThemeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ThemeRepository for SqliteThemeRepository<'_> {
    fn list_themes(&self) -> RepoResult<Vec<StoredTheme>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{THEME_SELECT_SQL} ORDER BY id DESC;"))?;
        let mut rows = stmt.query([])?;
        let mut themes = Vec::new();
        while let Some(row) = rows.next()? {
            themes.push(parse_theme_row(row)?);
        }
        Ok(themes)
    }

    fn get_theme(&self, name: &str) -> RepoResult<Option<StoredTheme>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{THEME_SELECT_SQL} WHERE name = ?1;"))?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_theme_row(row)?));
        }
        Ok(None)
    }

    fn upsert_theme(&self, theme: &Theme, select: bool) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if select {
            tx.execute("UPDATE themes SET selected = 0 WHERE selected = 1;", [])?;
        }
        tx.execute(
            "INSERT INTO themes (name, background, \"primary\", secondary, \"text\", selected)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(name) DO UPDATE SET
                background = excluded.background,
                \"primary\" = excluded.\"primary\",
                secondary = excluded.secondary,
                \"text\" = excluded.\"text\",
                selected = MAX(themes.selected, excluded.selected);",
            params![
                theme.name,
                theme.background.to_hex(),
                theme.primary.to_hex(),
                theme.secondary.to_hex(),
                theme.text.to_hex(),
                i64::from(select),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn select_theme(&self, name: &str) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("UPDATE themes SET selected = 0 WHERE selected = 1;", [])?;
        let changed = tx.execute("UPDATE themes SET selected = 1 WHERE name = ?1;", [name])?;
        if changed == 0 {
            // dropping tx rolls back the cleared selection
            return Err(RepoError::ThemeNotFound(name.to_string()));
        }
        tx.commit()?;
        Ok(())
    }

    fn selected_theme(&self) -> RepoResult<Option<Theme>> {
        let mut stmt = self.conn.prepare(&format!(
            "{THEME_SELECT_SQL} WHERE selected = 1 ORDER BY id DESC LIMIT 1;"
        ))?;
        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_theme_row(row)?.theme));
        }
        Ok(None)
    }

    fn delete_theme(&self, name: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM themes WHERE name = ?1;", [name])?;
        if changed == 0 {
            return Err(RepoError::ThemeNotFound(name.to_string()));
        }
        Ok(())
    }
}

fn parse_theme_row(row: &Row<'_>) -> RepoResult<StoredTheme> {
    let name: String = row.get("name")?;
    let color = |column: &'static str| -> RepoResult<Color> {
        let value: String = row.get(column)?;
        Color::from_hex(&value).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid color `{value}` in themes.{column} for theme `{name}`"
            ))
        })
    };

    let theme = Theme {
        name: name.clone(),
        background: color("background")?,
        primary: color("primary")?,
        secondary: color("secondary")?,
        text: color("text")?,
    };
    let selected = match row.get::<_, i64>("selected")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid selected value `{other}` in themes.selected"
            )));
        }
    };

    Ok(StoredTheme { theme, selected })
}
