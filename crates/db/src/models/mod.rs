//! Row models and DTOs, one module per table.

pub mod entitlement;
pub mod milestone;
pub mod notification;
pub mod project;
