//! Domain logic shared by every Atrium crate.
//!
//! This crate has zero internal dependencies so the datastore, billing and
//! notification layers (and any future CLI tooling) can all build on it.

pub mod deadlines;
pub mod entitlement;
pub mod error;
pub mod notification;
pub mod signing;
pub mod types;
