//! Retention scheduling.
//!
//! Decides which tracked directories are due for cleanup at a given time.
//! Nothing here touches the filesystem.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use reorg_core::RetentionRecord;

/// A tracked directory with its state at the schedule time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledRecord {
    /// The stored record.
    pub record: RetentionRecord,
    /// Time since the last cleanup, in whole seconds.
    pub elapsed_secs: i64,
    /// Whether the threshold has been exceeded.
    pub due: bool,
}

impl ScheduledRecord {
    /// Time since the last cleanup.
    pub fn elapsed(&self) -> TimeDelta {
        TimeDelta::seconds(self.elapsed_secs)
    }
}

/// Records split into due and not-yet-due, each in store order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetentionSchedule {
    /// Reference time.
    pub now: Option<NaiveDateTime>,
    /// Records whose threshold has been exceeded.
    pub due: Vec<ScheduledRecord>,
    /// Records still inside their retention window.
    pub pending: Vec<ScheduledRecord>,
}

impl RetentionSchedule {
    /// Total number of records considered.
    pub fn len(&self) -> usize {
        self.due.len() + self.pending.len()
    }

    /// Check if no records were considered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Due records first, then pending ones.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledRecord> {
        self.due.iter().chain(self.pending.iter())
    }
}

/// Split records into due and pending at `now`.
pub fn schedule(records: Vec<RetentionRecord>, now: NaiveDateTime) -> RetentionSchedule {
    let mut result = RetentionSchedule {
        now: Some(now),
        ..Default::default()
    };

    for record in records {
        let elapsed = record.elapsed(now);
        let scheduled = ScheduledRecord {
            due: record.is_due(now),
            elapsed_secs: elapsed.num_seconds(),
            record,
        };
        if scheduled.due {
            result.due.push(scheduled);
        } else {
            result.pending.push(scheduled);
        }
    }

    tracing::debug!(
        due = result.due.len(),
        pending = result.pending.len(),
        "Retention schedule computed"
    );

    result
}

/// Format an elapsed time in human-readable form.
///
/// Negative durations (a last cleanup in the future) read as "in the future".
pub fn format_age(elapsed: TimeDelta) -> String {
    let secs = elapsed.num_seconds();
    if secs < 0 {
        "in the future".to_string()
    } else if secs < 60 {
        format!("{secs} seconds")
    } else if secs < 3600 {
        format!("{} minutes", secs / 60)
    } else if secs < 86400 {
        format!("{} hours", secs / 3600)
    } else if secs < 2592000 {
        format!("{} days", secs / 86400)
    } else if secs < 31536000 {
        format!("{} months", secs / 2592000)
    } else {
        format!("{:.1} years", secs as f64 / 31536000.0)
    }
}
