//! Deadline checkpoint math and wording.
//!
//! A milestone is alerted when the number of whole days left until its due
//! date lands exactly on one of the [`CHECKPOINTS`]. "Today" is the calendar
//! date in a single fixed reference offset; labels are English only.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

use crate::notification::NotificationKind;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Checkpoints
// ---------------------------------------------------------------------------

/// Seconds in one day.
const SECS_PER_DAY: i64 = 86_400;

/// Lead times (days before due) at which an alert fires, in descending order.
pub const CHECKPOINTS: [i64; 7] = [365, 180, 90, 30, 7, 1, 0];

/// Checkpoints at or below this many days produce a `warning` instead of `info`.
pub const WARNING_THRESHOLD_DAYS: i64 = 7;

/// A lead-time checkpoint that a milestone has reached today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checkpoint {
    days: i64,
}

impl Checkpoint {
    /// The checkpoint matching `diff_days` exactly, if any.
    ///
    /// There is no catch-up: a milestone 6 days out matches nothing even
    /// though the 7-day checkpoint was passed yesterday.
    pub fn matching(diff_days: i64) -> Option<Self> {
        CHECKPOINTS
            .contains(&diff_days)
            .then_some(Checkpoint { days: diff_days })
    }

    /// Days before due that this checkpoint represents.
    pub fn days(self) -> i64 {
        self.days
    }

    pub fn is_due_today(self) -> bool {
        self.days == 0
    }

    /// Human label for the checkpoint.
    pub fn label(self) -> &'static str {
        match self.days {
            365 => "1 Year",
            180 => "6 Months",
            90 => "3 Months",
            30 => "1 Month",
            7 => "1 Week",
            1 => "1 Day",
            _ => "TODAY",
        }
    }

    /// Notification title, e.g. `"Milestone Due 1 Week"`.
    pub fn title(self) -> String {
        format!("Milestone Due {}", self.label())
    }

    /// Notification severity for this checkpoint.
    pub fn kind(self) -> NotificationKind {
        if self.days <= WARNING_THRESHOLD_DAYS {
            NotificationKind::Warning
        } else {
            NotificationKind::Info
        }
    }

    /// Notification body naming the milestone, its project and the due date.
    pub fn message(self, milestone_title: &str, project_name: &str, due: NaiveDate) -> String {
        if self.is_due_today() {
            format!("\"{milestone_title}\" in project \"{project_name}\" is due TODAY.")
        } else {
            format!(
                "\"{milestone_title}\" in project \"{project_name}\" is due on {} ({} left).",
                format_due_date(due),
                self.label()
            )
        }
    }
}

/// Format a due date for display, e.g. `Mar 8, 2025`.
pub fn format_due_date(due: NaiveDate) -> String {
    due.format("%b %-d, %Y").to_string()
}

// ---------------------------------------------------------------------------
// Reference timezone
// ---------------------------------------------------------------------------

/// The fixed offset in which calendar days are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceZone {
    offset: FixedOffset,
}

impl ReferenceZone {
    /// UTC reference zone.
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Build a zone from an offset in minutes east of UTC.
    ///
    /// Returns `None` when the offset is outside +/- 24 hours.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(|offset| Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The calendar date of `now` in this zone.
    pub fn today(&self, now: Timestamp) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    /// The instant (UTC) at which `day` starts in this zone.
    pub fn start_of_day(&self, day: NaiveDate) -> Timestamp {
        self.midnight(day).with_timezone(&Utc)
    }

    fn midnight(&self, day: NaiveDate) -> DateTime<FixedOffset> {
        // A fixed offset has no DST gaps, so midnight always maps to one instant.
        self.offset
            .from_local_datetime(&day.and_time(NaiveTime::MIN))
            .single()
            .unwrap_or_else(|| self.offset.from_utc_datetime(&day.and_time(NaiveTime::MIN)))
    }

    /// Whole days from the start of `today` until the start of `due`.
    pub fn days_until_due(&self, today: NaiveDate, due: NaiveDate) -> i64 {
        days_between(self.midnight(today), self.midnight(due))
    }
}

impl Default for ReferenceZone {
    fn default() -> Self {
        Self::utc()
    }
}

/// Days from `from` to `to`, rounding any partial day up.
///
/// A target 0.1 days away counts as 1; a target exactly on `from` counts as 0.
pub fn days_between<Tz: TimeZone>(from: DateTime<Tz>, to: DateTime<Tz>) -> i64 {
    let secs = (to - from).num_seconds();
    let whole = secs.div_euclid(SECS_PER_DAY);
    if secs.rem_euclid(SECS_PER_DAY) > 0 {
        whole + 1
    } else {
        whole
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
