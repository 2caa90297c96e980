use chrono::{NaiveDate, NaiveDateTime};
use reminders_core::service::reminder_service::ReminderServiceError;
use reminders_core::{AppState, EntryId, Recurrence, ReminderDraft, Urgency};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn setup() -> AppState {
    let state = AppState::in_memory().unwrap();
    state.folders().create("Work").unwrap();
    state.folders().create("Home").unwrap();
    state
}

fn add(state: &AppState, text: &str, folder: &str) -> EntryId {
    state
        .reminders()
        .add(&ReminderDraft::new(text, folder))
        .unwrap()[0]
        .entry_id
}

fn texts(state: &AppState, folder: &str) -> Vec<String> {
    state
        .reminders()
        .list(folder)
        .unwrap()
        .into_iter()
        .map(|view| view.reminder.text)
        .collect()
}

fn ranks(state: &AppState, folder: &str) -> Vec<i64> {
    state
        .reminders()
        .list(folder)
        .unwrap()
        .into_iter()
        .map(|view| view.reminder.rank)
        .collect()
}

#[test]
fn adding_to_custom_folder_mirrors_into_non_completed_with_own_rank() {
    let state = setup();
    add(&state, "Inbox zero", "Non-Completed");
    add(&state, "Standup notes", "Work");

    let work = state.reminders().list("Work").unwrap();
    assert_eq!(work.len(), 1);
    assert_eq!(work[0].reminder.rank, 0);

    let open = state.reminders().list("Non-Completed").unwrap();
    assert_eq!(open.len(), 2);
    assert_eq!(open[1].reminder.text, "Standup notes");
    assert_eq!(open[1].reminder.rank, 1);
    assert_eq!(open[1].reminder.entry_id, work[0].reminder.entry_id);
}

#[test]
fn adding_directly_to_non_completed_writes_one_row() {
    let state = setup();
    let entry = add(&state, "Just this", "Non-Completed");
    assert_eq!(state.reminders().entry(entry).unwrap().len(), 1);
}

#[test]
fn high_urgency_and_recurring_fan_out_to_system_folders() {
    let state = setup();
    let draft = ReminderDraft::new("Pay rent", "Home")
        .urgency(Urgency::High)
        .recurring(true)
        .notify_at(at(2026, 11, 1, 8, 0));
    let rows = state.reminders().add(&draft).unwrap();

    let folders: Vec<&str> = rows.iter().map(|row| row.folder_name.as_str()).collect();
    assert_eq!(folders, ["Home", "Recurring", "Pinned", "Non-Completed"]);
    let pinned = rows.iter().find(|row| row.folder_name == "Pinned").unwrap();
    assert_eq!(pinned.notify_at, None);
    assert!(rows.iter().all(|row| row.urgency == Urgency::High));
}

#[test]
fn add_validates_text_and_folder() {
    let state = setup();
    let service = state.reminders();

    assert!(matches!(
        service.add(&ReminderDraft::new("   ", "Work")),
        Err(ReminderServiceError::InvalidText)
    ));
    assert!(matches!(
        service.add(&ReminderDraft::new("Lost", "Nowhere")),
        Err(ReminderServiceError::FolderNotFound(name)) if name == "Nowhere"
    ));
    assert!(matches!(
        service.add(&ReminderDraft::new("Cheat", "Completed")),
        Err(ReminderServiceError::CompletedIsReadOnly)
    ));
    // a failed add leaves no partial mirror behind
    assert!(texts(&state, "Non-Completed").is_empty());
}

#[test]
fn reorder_yields_dense_ranks_in_requested_order() {
    let state = setup();
    let ids: Vec<EntryId> = ["one", "two", "three", "four"]
        .into_iter()
        .map(|text| add(&state, text, "Work"))
        .collect();

    let rows = state.reminders().reorder("Work", ids[3], 1).unwrap();
    let order: Vec<&str> = rows.iter().map(|row| row.text.as_str()).collect();
    assert_eq!(order, ["one", "four", "two", "three"]);
    assert_eq!(ranks(&state, "Work"), [0, 1, 2, 3]);

    state.reminders().reorder("Work", ids[0], 100).unwrap();
    assert_eq!(texts(&state, "Work"), ["four", "two", "three", "one"]);
    assert_eq!(ranks(&state, "Work"), [0, 1, 2, 3]);

    // the mirror keeps its own independent order
    assert_eq!(
        texts(&state, "Non-Completed"),
        ["one", "two", "three", "four"]
    );
}

#[test]
fn reorder_of_missing_entry_reports_folder() {
    let state = setup();
    let entry = add(&state, "elsewhere", "Home");
    assert!(matches!(
        state.reminders().reorder("Work", entry, 0),
        Err(ReminderServiceError::ReminderNotFound { folder_name: Some(folder), .. })
            if folder == "Work"
    ));
}

#[test]
fn complete_moves_entry_out_of_every_open_folder_exactly_once() {
    let state = setup();
    let keep = add(&state, "keep", "Work");
    let draft = ReminderDraft::new("finish report", "Work")
        .urgency(Urgency::High)
        .recurring(true);
    let entry = state.reminders().add(&draft).unwrap()[0].entry_id;
    let after = add(&state, "after", "Work");

    let completed = state.reminders().complete(entry).unwrap();
    assert_eq!(completed.folder_name, "Completed");
    assert_eq!(completed.rank, 0);

    for folder in ["Work", "Pinned", "Recurring", "Non-Completed"] {
        let listed = state.reminders().list(folder).unwrap();
        assert!(
            listed.iter().all(|view| view.reminder.entry_id != entry),
            "entry still present in {folder}"
        );
    }
    assert_eq!(texts(&state, "Work"), ["keep", "after"]);
    assert_eq!(ranks(&state, "Work"), [0, 1]);
    assert_eq!(ranks(&state, "Non-Completed"), [0, 1]);

    // completing again is a no-op, not a duplicate
    state.reminders().complete(entry).unwrap();
    let done = state.reminders().list("Completed").unwrap();
    assert_eq!(done.len(), 1);
    assert!(!done[0].show_urgency);

    let rows = state.reminders().entry(entry).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(state.reminders().entry(keep).unwrap().len(), 2);
    assert_eq!(state.reminders().entry(after).unwrap().len(), 2);
}

#[test]
fn complete_unknown_entry_is_not_found() {
    let state = setup();
    assert!(matches!(
        state.reminders().complete(uuid::Uuid::new_v4()),
        Err(ReminderServiceError::ReminderNotFound { folder_name: None, .. })
    ));
}

#[test]
fn clear_completed_empties_only_completed() {
    let state = setup();
    let first = add(&state, "first", "Work");
    let second = add(&state, "second", "Home");
    add(&state, "open", "Home");
    state.reminders().complete(first).unwrap();
    state.reminders().complete(second).unwrap();

    assert_eq!(state.reminders().clear_completed().unwrap(), 2);
    assert!(texts(&state, "Completed").is_empty());
    assert_eq!(texts(&state, "Home"), ["open"]);
}

#[test]
fn remove_deletes_one_row_and_compacts() {
    let state = setup();
    let a = add(&state, "a", "Work");
    add(&state, "b", "Work");
    add(&state, "c", "Work");

    state.reminders().remove("Work", a).unwrap();
    assert_eq!(texts(&state, "Work"), ["b", "c"]);
    assert_eq!(ranks(&state, "Work"), [0, 1]);
    assert_eq!(texts(&state, "Non-Completed"), ["a", "b", "c"]);
}

#[test]
fn urgency_changes_pin_and_unpin_the_entry() {
    let state = setup();
    let entry = add(&state, "renew passport", "Home");

    state.reminders().set_urgency(entry, Urgency::High).unwrap();
    assert_eq!(texts(&state, "Pinned"), ["renew passport"]);
    assert!(state
        .reminders()
        .entry(entry)
        .unwrap()
        .iter()
        .all(|row| row.urgency == Urgency::High));

    state.reminders().set_urgency(entry, Urgency::Medium).unwrap();
    assert!(texts(&state, "Pinned").is_empty());
    assert_eq!(state.reminders().entry(entry).unwrap().len(), 2);
}

#[test]
fn low_urgency_reminder_added_to_pinned_stays_pinned() {
    let state = setup();
    let entry = add(&state, "Quiet pin", "Pinned");
    assert_eq!(state.reminders().entry(entry).unwrap().len(), 2);

    state.reminders().set_urgency(entry, Urgency::Low).unwrap();
    state.reminders().set_urgency(entry, Urgency::Medium).unwrap();
    state.reminders().set_urgency(entry, Urgency::Low).unwrap();
    assert_eq!(texts(&state, "Pinned"), ["Quiet pin"]);
    assert_eq!(state.reminders().entry(entry).unwrap().len(), 2);

    // leaving High still unpins once the entry was promoted
    state.reminders().set_urgency(entry, Urgency::High).unwrap();
    state.reminders().set_urgency(entry, Urgency::Low).unwrap();
    assert!(texts(&state, "Pinned").is_empty());
}

#[test]
fn listing_merges_scheduled_notifications() {
    let state = setup();
    let draft = ReminderDraft::new("Gym", "Home").notify_at(at(2026, 3, 2, 18, 30));
    let entry = state.reminders().add(&draft).unwrap()[0].entry_id;

    state
        .schedule()
        .schedule(
            entry,
            "Home",
            NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
            Recurrence::Weekly,
        )
        .unwrap();

    let views = state.reminders().list("Home").unwrap();
    assert_eq!(views.len(), 1);
    let occurrences = &views[0].occurrences;
    assert_eq!(occurrences.len(), 7);
    assert_eq!(occurrences[0], at(2026, 3, 2, 18, 30));
    assert_eq!(occurrences[1], at(2026, 3, 4, 18, 30));
    assert_eq!(occurrences[6], at(2026, 4, 8, 18, 30));

    let instances = state
        .reminders()
        .instances("Home", at(2026, 3, 10, 0, 0))
        .unwrap();
    let labels: Vec<&str> = instances.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(
        labels,
        ["Gym (Mar 02, 2026)", "Gym (Mar 04, 2026)", "Gym"]
    );
    assert_eq!(instances[2].occurrences.len(), 5);
}

#[test]
fn malformed_stored_time_does_not_hide_reminder() {
    let state = setup();
    let entry = add(&state, "odd clock", "Work");
    state
        .connection()
        .execute(
            "UPDATE reminders SET notify_at = 'sometime soon' WHERE entry_uuid = ?1;",
            [entry.to_string()],
        )
        .unwrap();

    let views = state.reminders().list("Work").unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].reminder.notify_at, None);
    assert!(views[0].occurrences.is_empty());
}

#[test]
fn reminder_serializes_for_front_ends() {
    let state = setup();
    let draft = ReminderDraft::new("Export me", "Work")
        .urgency(Urgency::Medium)
        .notify_at(at(2026, 5, 6, 7, 8));
    let row = state.reminders().add(&draft).unwrap().remove(0);

    let json = serde_json::to_value(&row).unwrap();
    assert_eq!(json["text"], "Export me");
    assert_eq!(json["folder_name"], "Work");
    assert_eq!(json["rank"], 0);
    assert_eq!(json["entry_id"], row.entry_id.to_string());
}
