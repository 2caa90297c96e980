//! Core use-case services.
//!
//! # Responsibility
//! - Validate user input and enforce folder/reminder/theme rules above the
//!   repository layer.
//! - Keep front ends (CLI, GUI) decoupled from storage details.

pub mod folder_service;
pub mod reminder_service;
pub mod schedule_service;
pub mod theme_service;
