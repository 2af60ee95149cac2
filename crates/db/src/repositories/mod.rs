pub mod notification_repo;
pub mod record_repo;
pub mod service_repo;
pub mod slot_repo;
pub mod user_repo;

pub use notification_repo::NotificationRepo;
pub use record_repo::RecordRepo;
pub use service_repo::ServiceRepo;
pub use slot_repo::SlotRepo;
pub use user_repo::UserRepo;
