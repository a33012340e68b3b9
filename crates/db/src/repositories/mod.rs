//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod entitlement_repo;
pub mod milestone_repo;
pub mod notification_repo;
pub mod project_repo;

pub use entitlement_repo::EntitlementRepo;
pub use milestone_repo::MilestoneRepo;
pub use notification_repo::NotificationRepo;
pub use project_repo::ProjectRepo;
