use reminders_core::db::open_db_in_memory;
use reminders_core::repo::theme_repo::{SqliteThemeRepository, ThemeRepository};
use reminders_core::service::theme_service::{ThemeService, ThemeServiceError};
use reminders_core::{AppState, BuiltinTheme, Color, Theme, ThemeObserver, ThemeRoles};
use std::cell::RefCell;
use std::rc::Rc;

fn ocean() -> Theme {
    Theme::new(
        "Ocean",
        Color::from_hex("#001f3f").unwrap(),
        Color::from_hex("#0074d9").unwrap(),
        Color::from_hex("#7fdbff").unwrap(),
        Color::WHITE,
    )
}

#[test]
fn first_run_has_no_selection_and_uses_fallback() {
    let conn = open_db_in_memory().unwrap();
    let service = ThemeService::new(SqliteThemeRepository::new(&conn));

    assert!(service.needs_first_run_choice().unwrap());
    assert_eq!(service.active().unwrap(), Theme::fallback());

    service.choose_builtin(BuiltinTheme::Light).unwrap();
    assert!(!service.needs_first_run_choice().unwrap());
    assert_eq!(service.active().unwrap(), Theme::light());
}

#[test]
fn saved_list_hides_builtins_and_puts_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let service = ThemeService::new(SqliteThemeRepository::new(&conn));

    service.save(&ocean()).unwrap();
    let names: Vec<String> = service
        .list_saved()
        .unwrap()
        .into_iter()
        .map(|theme| theme.name)
        .collect();
    assert_eq!(names, ["Ocean", "Tropical"]);
}

#[test]
fn save_selects_and_overwrites_by_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteThemeRepository::new(&conn);
    let service = ThemeService::new(SqliteThemeRepository::new(&conn));

    service.save(&ocean()).unwrap();
    let mut recolored = ocean();
    recolored.text = Color::BLACK;
    service.save(&recolored).unwrap();

    assert_eq!(service.active().unwrap(), recolored);
    let selected: Vec<String> = repo
        .list_themes()
        .unwrap()
        .into_iter()
        .filter(|stored| stored.selected)
        .map(|stored| stored.theme.name)
        .collect();
    assert_eq!(selected, ["Ocean"]);
}

#[test]
fn select_switches_the_single_selected_row() {
    let conn = open_db_in_memory().unwrap();
    let service = ThemeService::new(SqliteThemeRepository::new(&conn));

    service.choose_builtin(BuiltinTheme::Dark).unwrap();
    let selected = service.select("Tropical").unwrap();
    assert_eq!(selected, Theme::tropical());
    assert_eq!(service.active().unwrap(), Theme::tropical());

    assert!(matches!(
        service.select("Missing"),
        Err(ThemeServiceError::ThemeNotFound(name)) if name == "Missing"
    ));
    // a failed select keeps the previous choice
    assert_eq!(service.active().unwrap(), Theme::tropical());
}

#[test]
fn builtin_themes_are_protected() {
    let conn = open_db_in_memory().unwrap();
    let service = ThemeService::new(SqliteThemeRepository::new(&conn));

    for name in ["Dark", "Light"] {
        assert!(matches!(
            service.delete(name),
            Err(ThemeServiceError::ProtectedTheme(_))
        ));
    }
    let mut fake_dark = ocean();
    fake_dark.name = "Dark".to_string();
    assert!(matches!(
        service.save(&fake_dark),
        Err(ThemeServiceError::ProtectedTheme(_))
    ));

    service.delete("Tropical").unwrap();
    assert!(service.list_saved().unwrap().is_empty());
    assert!(matches!(
        service.delete("Tropical"),
        Err(ThemeServiceError::ThemeNotFound(_))
    ));
}

#[test]
fn builtin_names_are_protected_in_any_case() {
    let conn = open_db_in_memory().unwrap();
    let service = ThemeService::new(SqliteThemeRepository::new(&conn));

    let mut lookalike = ocean();
    lookalike.name = "dark".to_string();
    assert!(matches!(
        service.save(&lookalike),
        Err(ThemeServiceError::ProtectedTheme(name)) if name == "dark"
    ));
    assert!(matches!(
        service.delete("LIGHT"),
        Err(ThemeServiceError::ProtectedTheme(_))
    ));
    assert_eq!(service.list_saved().unwrap().len(), 1);
}

#[test]
fn stored_colors_round_trip_through_hex() {
    let conn = open_db_in_memory().unwrap();
    let service = ThemeService::new(SqliteThemeRepository::new(&conn));

    let theme = Theme::new(
        "Odd",
        Color::rgb(1, 2, 3),
        Color::rgb(254, 128, 127),
        Color::from_rgba(Color::rgb(17, 34, 51).to_rgba()),
        Color::from_hex("#abc").unwrap(),
    );
    service.save(&theme).unwrap();

    let stored: String = conn
        .query_row(
            "SELECT \"primary\" FROM themes WHERE name = 'Odd';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored, "#fe807f");
    assert_eq!(service.active().unwrap(), theme);
}

#[derive(Clone, Default)]
struct RecordingObserver {
    seen: Rc<RefCell<Vec<ThemeRoles>>>,
}

impl ThemeObserver for RecordingObserver {
    fn apply_theme(&self, roles: &ThemeRoles) {
        self.seen.borrow_mut().push(*roles);
    }
}

#[test]
fn app_state_propagates_theme_changes_to_observers() {
    let mut state = AppState::in_memory().unwrap();
    let observer = RecordingObserver::default();
    state.register_observer(Box::new(observer.clone()));

    assert_eq!(observer.seen.borrow().len(), 1);
    assert_eq!(
        observer.seen.borrow()[0].window_background,
        Theme::fallback().background
    );

    state.choose_builtin(BuiltinTheme::Dark).unwrap();
    state.save_theme(&ocean()).unwrap();
    assert_eq!(state.theme().name, "Ocean");

    let seen = observer.seen.borrow().clone();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[1].button, Theme::dark().primary);
    assert_eq!(seen[2].label_text, Color::WHITE);
    assert_eq!(seen[2].border, ocean().secondary);
}

#[test]
fn deleting_active_theme_falls_back() {
    let mut state = AppState::in_memory().unwrap();
    state.set_theme("Tropical").unwrap();
    state.delete_theme("Tropical").unwrap();
    assert_eq!(state.theme(), &Theme::fallback());
    assert!(state.themes().needs_first_run_choice().unwrap());
}
