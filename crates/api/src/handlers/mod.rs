//! Request handlers.
//!
//! Each submodule provides the async handler functions for one resource.
//! Handlers delegate to the components held in [`AppState`](crate::state::AppState)
//! and map errors via [`AppError`](crate::error::AppError).

pub mod billing;
pub mod entitlement;
pub mod notification;
