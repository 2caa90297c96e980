//! Desktop notification delivery.
//!
//! # Responsibility
//! - Define the notifier seam used by the delivery loop.
//! - Turn due notification times into delivered notifications exactly once.

pub mod notifier;
pub mod scheduler;

pub use notifier::{CommandNotifier, LogNotifier, Notifier, NotifierKind, NotifyError};
pub use scheduler::{NotificationScheduler, TickReport};
