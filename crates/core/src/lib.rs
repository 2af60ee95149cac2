//! Domain layer for the slotbook booking platform.
//!
//! Pure types and logic with no I/O: the error taxonomy, booking status
//! rules, and notification template rendering. The `db` and `api` crates
//! build on this.

pub mod error;
pub mod notify;
pub mod status;
pub mod types;
