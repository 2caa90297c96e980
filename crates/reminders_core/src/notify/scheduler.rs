//! Polling delivery loop.
//!
//! # Invariants
//! - Consecutive ticks cover disjoint `(last, now]` windows, so a due
//!   notification is handed to the notifier at most once per process.
//! - A clock that moves backwards delivers nothing until it catches up.

use super::notifier::{Notifier, NOTIFICATION_TITLE};
use crate::model::schedule::notification_body;
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::reminder_repo::ReminderRepository;
use crate::service::schedule_service::{DueNotification, ScheduleService, ScheduleServiceError};
use chrono::NaiveDateTime;
use log::{error, info};

/// Outcome of one scheduler tick.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub delivered: Vec<DueNotification>,
    pub failed: usize,
}

pub struct NotificationScheduler<N: Notifier> {
    notifier: N,
    last_tick: NaiveDateTime,
}

impl<N: Notifier> NotificationScheduler<N> {
    /// Creates a scheduler that only fires for times after `start`.
    pub fn new(notifier: N, start: NaiveDateTime) -> Self {
        Self {
            notifier,
            last_tick: start,
        }
    }

    pub fn last_tick(&self) -> NaiveDateTime {
        self.last_tick
    }

    /// Delivers everything that became due since the previous tick.
    pub fn tick<R, S>(
        &mut self,
        schedule: &ScheduleService<R, S>,
        now: NaiveDateTime,
    ) -> Result<TickReport, ScheduleServiceError>
    where
        R: ReminderRepository,
        S: NotificationRepository,
    {
        if now <= self.last_tick {
            return Ok(TickReport::default());
        }

        let due = schedule.due(self.last_tick, now)?;
        self.last_tick = now;

        let mut report = TickReport::default();
        for item in due {
            let body = notification_body(&item.text, item.at);
            match self.notifier.notify(NOTIFICATION_TITLE, &body) {
                Ok(()) => {
                    info!(
                        "event=notification_deliver module=notify status=ok entry={}",
                        item.entry_id
                    );
                    report.delivered.push(item);
                }
                Err(err) => {
                    error!(
                        "event=notification_deliver module=notify status=error entry={} error={}",
                        item.entry_id, err
                    );
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}
