//! Domain model for folders, reminders, themes and notification schedules.
//!
//! # Responsibility
//! - Define the value types shared by repositories, services and front ends.
//! - Keep pure rules (system folders, urgency, color math, date math) free of
//!   storage concerns so they can be unit tested directly.

pub mod folder;
pub mod reminder;
pub mod schedule;
pub mod theme;
