/// Slot, record, service, and notification primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// User accounts are keyed by UUID.
pub type UserId = uuid::Uuid;

/// The user's identifier on the external messaging channel.
pub type MessengerId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
