//! Per-user notification feed and the deadline alert generator.
//!
//! - [`NotificationSink`] -- the single write path into the feed, shared by
//!   the entitlement reconciler and the deadline generator.
//! - [`DeadlineNotifier`] -- scans a user's pending milestones and raises at
//!   most one alert per (milestone, checkpoint, calendar day).

pub mod deadlines;
pub mod sink;

pub use deadlines::{DeadlineNotifier, DeadlineReport};
pub use sink::{DailyAlert, Delivery, NotificationSink};
