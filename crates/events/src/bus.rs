//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`BookingEvent`]s. It is
//! shared via `Arc<EventBus>` across the application. Events carry the full
//! rendering snapshot, captured before the transition commits, so a consumer
//! never has to re-read rows that a cascade may already have deleted.

use chrono::{DateTime, Utc};
use slotbook_core::notify::{PartyBrief, SlotBrief};
use slotbook_core::types::{DbId, MessengerId, UserId};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// BookingEvent
// ---------------------------------------------------------------------------

/// The user a notification will be delivered to, with the channel identity
/// and time zone needed for rendering and pushing.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub user_id: UserId,
    pub messenger_id: Option<MessengerId>,
    /// IANA zone name; empty means "use the default zone".
    pub timezone: String,
}

/// Snapshot shared by the record-level events.
#[derive(Debug, Clone)]
pub struct RecordContext {
    pub record_id: DbId,
    pub recipient: Recipient,
    /// The counterpart named in the notification body (client for events
    /// sent to the owner, owner for events sent to the client).
    pub counterpart: PartyBrief,
    pub slot: SlotBrief,
}

/// Snapshot for one client affected by a slot deletion, taken before the
/// delete cascaded their record away.
#[derive(Debug, Clone)]
pub struct SlotDeletedContext {
    pub record_id: DbId,
    /// Status the record held at deletion time (`confirm` or `pending`).
    pub record_status: String,
    pub recipient: Recipient,
    pub slot: SlotBrief,
}

/// A committed booking transition, published once per affected recipient.
#[derive(Debug, Clone)]
pub enum BookingEvent {
    /// A client filed a new booking; notify the slot owner.
    RecordCreated(RecordContext),
    /// The owner confirmed (`confirmed == true`) or rejected a booking;
    /// notify the client.
    RecordStatusChanged { context: RecordContext, confirmed: bool },
    /// The owner deleted a slot that had this client's live request on it.
    SlotDeleted(SlotDeletedContext),
    /// A confirmed booking starts within the reminder window.
    ReminderDue { context: RecordContext, starts_at: DateTime<Utc> },
}

impl BookingEvent {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            BookingEvent::RecordCreated(_) => "record.created",
            BookingEvent::RecordStatusChanged { confirmed: true, .. } => "record.confirmed",
            BookingEvent::RecordStatusChanged { confirmed: false, .. } => "record.rejected",
            BookingEvent::SlotDeleted(_) => "slot.deleted",
            BookingEvent::ReminderDue { .. } => "record.reminder",
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`BookingEvent`].
pub struct EventBus {
    sender: broadcast::Sender<BookingEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed messages are dropped
    /// and slow receivers observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With zero receivers the event is dropped; publication is fire-and-
    /// forget by contract, so this is not an error.
    pub fn publish(&self, event: BookingEvent) {
        tracing::debug!(event = event.name(), "Publishing booking event");
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use uuid::Uuid;

    use super::*;

    fn sample_context() -> RecordContext {
        let start = Utc::now() + TimeDelta::days(1);
        RecordContext {
            record_id: 7,
            recipient: Recipient {
                user_id: Uuid::new_v4(),
                messenger_id: Some(100200300),
                timezone: "Europe/Berlin".to_string(),
            },
            counterpart: PartyBrief {
                id: Uuid::new_v4(),
                name: "Anna Petrova".to_string(),
                phone: "+15551230000".to_string(),
            },
            slot: SlotBrief {
                slot_id: 42,
                start_time: start,
                end_time: start + TimeDelta::hours(1),
                service_id: 1,
                service_name: "Haircut".to_string(),
                service_price: 1500.0,
            },
        }
    }

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(BookingEvent::RecordCreated(sample_context()));

        let received = rx.recv().await.expect("should receive event");
        match received {
            BookingEvent::RecordCreated(ctx) => assert_eq!(ctx.record_id, 7),
            other => panic!("unexpected event: {}", other.name()),
        }
    }

    #[tokio::test]
    async fn multiple_subscribers_each_receive() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(BookingEvent::RecordStatusChanged {
            context: sample_context(),
            confirmed: true,
        });

        assert_eq!(rx1.recv().await.unwrap().name(), "record.confirmed");
        assert_eq!(rx2.recv().await.unwrap().name(), "record.confirmed");
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.publish(BookingEvent::SlotDeleted(SlotDeletedContext {
            record_id: 1,
            record_status: "pending".to_string(),
            recipient: Recipient {
                user_id: Uuid::new_v4(),
                messenger_id: None,
                timezone: String::new(),
            },
            slot: sample_context().slot,
        }));
    }
}
