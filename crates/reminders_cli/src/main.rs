//! Command-line front end for `reminders_core`.
//!
//! # Responsibility
//! - Map subcommands onto core services through one `AppState`.
//! - Run the notification polling loop (`watch`).

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use reminders_core::model::reminder::ReminderInstance;
use reminders_core::model::schedule::{format_notify_at, parse_notify_at};
use reminders_core::{
    init_logging, AppConfig, AppState, BuiltinTheme, Color, EntryId, LogOptions,
    NotificationScheduler, Recurrence, ReminderDraft, Theme, Urgency,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "reminders", version, about = "Folders, reminders and desktop notifications")]
struct Cli {
    /// Config file (defaults to <config_dir>/reminders/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Database file; overrides config and REMINDERS_DB.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(subcommand, alias = "f")]
    Folders(FolderCommand),
    #[command(subcommand, alias = "r")]
    Reminders(ReminderCommand),
    #[command(subcommand, alias = "t")]
    Themes(ThemeCommand),
    /// Schedule notifications for one reminder row.
    Schedule {
        entry: EntryId,
        folder: String,
        /// Calendar date, YYYY-MM-DD.
        date: NaiveDate,
        #[arg(long, default_value = "once")]
        repeat: String,
    },
    /// Show the next notifications.
    Upcoming {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Deliver due notifications until interrupted.
    Watch {
        /// Run a single tick and exit.
        #[arg(long)]
        once: bool,
        /// Deliver notifications due after this time instead of after now.
        #[arg(long, value_parser = parse_time_arg)]
        since: Option<NaiveDateTime>,
    },
}

#[derive(Subcommand, Debug)]
enum FolderCommand {
    List,
    Add { name: String },
    Rename { old: String, new: String },
    Delete { name: String },
    /// Move a custom folder; index 0 is directly below the system folders.
    Move { name: String, index: usize },
    /// Set or clear (no path) a custom folder's icon.
    Icon { name: String, path: Option<PathBuf> },
}

#[derive(Subcommand, Debug)]
enum ReminderCommand {
    List {
        folder: String,
        /// Split past occurrences into their own rows.
        #[arg(long)]
        instances: bool,
    },
    Add {
        folder: String,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        #[arg(long, value_enum, default_value_t = UrgencyArg::Low)]
        urgency: UrgencyArg,
        /// Notification time, "YYYY-MM-DD HH:MM".
        #[arg(long, value_parser = parse_time_arg)]
        at: Option<NaiveDateTime>,
        #[arg(long)]
        recurring: bool,
    },
    Complete { entry: EntryId },
    Move { folder: String, entry: EntryId, index: usize },
    Remove { folder: String, entry: EntryId },
    Urgency {
        entry: EntryId,
        #[arg(value_enum)]
        level: UrgencyArg,
    },
    ClearCompleted,
}

#[derive(Subcommand, Debug)]
enum ThemeCommand {
    List,
    Current,
    Choose {
        #[arg(value_enum)]
        builtin: BuiltinArg,
    },
    Save {
        name: String,
        #[arg(long)]
        background: String,
        #[arg(long)]
        primary: String,
        #[arg(long)]
        secondary: String,
        #[arg(long)]
        text: String,
    },
    Select { name: String },
    Delete { name: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum UrgencyArg {
    Low,
    Medium,
    High,
}

impl From<UrgencyArg> for Urgency {
    fn from(value: UrgencyArg) -> Self {
        match value {
            UrgencyArg::Low => Urgency::Low,
            UrgencyArg::Medium => Urgency::Medium,
            UrgencyArg::High => Urgency::High,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BuiltinArg {
    Dark,
    Light,
}

impl From<BuiltinArg> for BuiltinTheme {
    fn from(value: BuiltinArg) -> Self {
        match value {
            BuiltinArg::Dark => BuiltinTheme::Dark,
            BuiltinArg::Light => BuiltinTheme::Light,
        }
    }
}

fn parse_time_arg(value: &str) -> Result<NaiveDateTime, String> {
    parse_notify_at(value).map_err(|err| err.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    start_logging(&config);

    let mut state = AppState::open(&config.database_path).with_context(|| {
        format!("opening database {}", config.database_path.display())
    })?;

    match cli.command {
        Commands::Folders(command) => run_folders(&mut state, command),
        Commands::Reminders(command) => run_reminders(&state, command),
        Commands::Themes(command) => run_themes(&mut state, command),
        Commands::Schedule {
            entry,
            folder,
            date,
            repeat,
        } => {
            let recurrence = Recurrence::parse(&repeat)?;
            let times = state.schedule().schedule(entry, &folder, date, recurrence)?;
            for at in times {
                println!("{}", format_notify_at(at));
            }
            Ok(())
        }
        Commands::Upcoming { limit } => {
            let now = Local::now().naive_local();
            for item in state.schedule().upcoming(now, limit)? {
                println!("{}  {}  {}", format_notify_at(item.at), item.entry_id, item.text);
            }
            Ok(())
        }
        Commands::Watch { once, since } => watch(&state, &config, once, since),
    }
}

fn start_logging(config: &AppConfig) {
    let log_dir = if config.log_dir.is_absolute() {
        config.log_dir.clone()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(&config.log_dir),
            Err(_) => config.log_dir.clone(),
        }
    };
    let options = LogOptions {
        duplicate_to_stderr: true,
    };
    if let Err(err) = init_logging(&config.log_level, &log_dir, options) {
        eprintln!("warning: file logging disabled: {err}");
    }
}

fn run_folders(state: &mut AppState, command: FolderCommand) -> Result<()> {
    match command {
        FolderCommand::List => {
            for folder in state.folders().list()? {
                let marker = if folder.is_system() { "*" } else { " " };
                println!("{marker} {}", folder.name);
            }
        }
        FolderCommand::Add { name } => {
            let folder = state.folders().create(&name)?;
            println!("created {}", folder.name);
        }
        FolderCommand::Rename { old, new } => state.rename_folder(&old, &new)?,
        FolderCommand::Delete { name } => state.delete_folder(&name)?,
        FolderCommand::Move { name, index } => {
            for folder in state.folders().move_folder(&name, index)? {
                println!("{}", folder.name);
            }
        }
        FolderCommand::Icon { name, path } => state.folders().set_icon(&name, path)?,
    }
    Ok(())
}

fn run_reminders(state: &AppState, command: ReminderCommand) -> Result<()> {
    let reminders = state.reminders();
    match command {
        ReminderCommand::List { folder, instances } => {
            if instances {
                let now = Local::now().naive_local();
                for instance in reminders.instances(&folder, now)? {
                    print_instance(&instance);
                }
            } else {
                for view in reminders.list(&folder)? {
                    let urgency = match view.reminder.urgency {
                        Urgency::High if view.show_urgency => "!! ",
                        Urgency::Medium if view.show_urgency => "!  ",
                        _ => "   ",
                    };
                    println!(
                        "{:>3} {} {}{}",
                        view.reminder.rank, view.reminder.entry_id, urgency, view.reminder.text
                    );
                    for at in view.occurrences {
                        println!("      at {}", format_notify_at(at));
                    }
                }
            }
        }
        ReminderCommand::Add {
            folder,
            text,
            urgency,
            at,
            recurring,
        } => {
            let mut draft = ReminderDraft::new(text.join(" "), folder)
                .urgency(urgency.into())
                .recurring(recurring);
            if let Some(at) = at {
                draft = draft.notify_at(at);
            }
            let rows = reminders.add(&draft)?;
            if let Some(first) = rows.first() {
                println!("{}", first.entry_id);
            }
        }
        ReminderCommand::Complete { entry } => {
            reminders.complete(entry)?;
        }
        ReminderCommand::Move {
            folder,
            entry,
            index,
        } => {
            for row in reminders.reorder(&folder, entry, index)? {
                println!("{:>3} {} {}", row.rank, row.entry_id, row.text);
            }
        }
        ReminderCommand::Remove { folder, entry } => reminders.remove(&folder, entry)?,
        ReminderCommand::Urgency { entry, level } => reminders.set_urgency(entry, level.into())?,
        ReminderCommand::ClearCompleted => {
            let removed = reminders.clear_completed()?;
            println!("removed {removed}");
        }
    }
    Ok(())
}

fn print_instance(instance: &ReminderInstance) {
    println!("{} {}", instance.entry_id, instance.label);
    for at in &instance.occurrences {
        println!("      at {}", format_notify_at(*at));
    }
}

fn run_themes(state: &mut AppState, command: ThemeCommand) -> Result<()> {
    match command {
        ThemeCommand::List => {
            let active = state.theme().name.clone();
            for theme in state.themes().list_saved()? {
                let marker = if theme.name == active { "*" } else { " " };
                println!("{marker} {}", theme.name);
            }
        }
        ThemeCommand::Current => {
            if state.themes().needs_first_run_choice()? {
                warn!("event=theme_current module=cli status=warn reason=no_theme_selected");
                println!("no theme selected; run `reminders themes choose dark|light`");
            }
            print_theme(state.theme());
        }
        ThemeCommand::Choose { builtin } => {
            print_theme(state.choose_builtin(builtin.into())?);
        }
        ThemeCommand::Save {
            name,
            background,
            primary,
            secondary,
            text,
        } => {
            let theme = Theme::new(
                name,
                parse_color(&background)?,
                parse_color(&primary)?,
                parse_color(&secondary)?,
                parse_color(&text)?,
            );
            print_theme(state.save_theme(&theme)?);
        }
        ThemeCommand::Select { name } => {
            print_theme(state.set_theme(&name)?);
        }
        ThemeCommand::Delete { name } => state.delete_theme(&name)?,
    }
    Ok(())
}

fn parse_color(value: &str) -> Result<Color> {
    Color::from_hex(value).with_context(|| format!("parsing color {value}"))
}

fn print_theme(theme: &Theme) {
    println!(
        "{}: background {} primary {} secondary {} text {}",
        theme.name, theme.background, theme.primary, theme.secondary, theme.text
    );
}

fn watch(
    state: &AppState,
    config: &AppConfig,
    once: bool,
    since: Option<NaiveDateTime>,
) -> Result<()> {
    let start = since.unwrap_or_else(|| Local::now().naive_local());
    let mut scheduler = NotificationScheduler::new(config.notifier.build(), start);
    let schedule = state.schedule();
    info!(
        "event=watch_start module=cli status=ok notifier={:?} interval_secs={}",
        config.notifier, config.poll_interval_secs
    );

    loop {
        let now = Local::now().naive_local();
        let report = scheduler.tick(&schedule, now)?;
        for item in &report.delivered {
            println!("{}  {}", format_notify_at(item.at), item.text);
        }
        if once {
            if report.failed > 0 {
                bail!("{} notification(s) failed to deliver", report.failed);
            }
            return Ok(());
        }
        std::thread::sleep(Duration::from_secs(config.poll_interval_secs));
    }
}
