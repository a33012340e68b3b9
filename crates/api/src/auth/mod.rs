//! Authentication primitives.
//!
//! Sessions are issued elsewhere; this server only validates the HS256
//! access tokens it is handed. See [`jwt`].

pub mod jwt;
