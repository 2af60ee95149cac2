pub mod notification;
pub mod record;
pub mod service;
pub mod slot;
pub mod user;
