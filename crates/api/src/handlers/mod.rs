pub mod auth;
pub mod notification;
pub mod record;
pub mod slot;
