//! Event-to-notification dispatch.
//!
//! [`Dispatcher`] subscribes to the booking event bus, renders one
//! notification per event, persists it, and then pushes a copy to the
//! recipient's messaging channel when they have one linked.
//!
//! The two deliveries have different contracts: the in-app row is durable
//! and its persistence failure is an error of the dispatch step; the push is
//! best-effort and its failure is logged and swallowed. Neither can affect
//! the booking transition that produced the event, which committed before
//! publication.

use std::sync::Arc;

use slotbook_core::notify::{
    render_record_created, render_record_status, render_reminder, render_slot_deleted,
    resolve_timezone, RenderedNotification,
};
use slotbook_db::models::notification::CreateNotification;
use slotbook_db::repositories::NotificationRepo;
use slotbook_db::DbPool;
use slotbook_events::{BookingEvent, Recipient};
use slotbook_messenger::{Messenger, OutboundMessage};
use tokio::sync::broadcast;

/// Consumes [`BookingEvent`]s and delivers notifications.
pub struct Dispatcher {
    pool: DbPool,
    messenger: Arc<dyn Messenger>,
}

impl Dispatcher {
    pub fn new(pool: DbPool, messenger: Arc<dyn Messenger>) -> Self {
        Self { pool, messenger }
    }

    /// Run the dispatch loop.
    ///
    /// Exits when the channel closes (the [`EventBus`](slotbook_events::EventBus)
    /// was dropped). A failed dispatch is logged and the loop moves on; one
    /// undeliverable event must not stall the stream behind it.
    pub async fn run(self, mut receiver: broadcast::Receiver<BookingEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let name = event.name();
                    if let Err(e) = self.dispatch(event).await {
                        tracing::error!(error = %e, event = name, "Failed to dispatch event");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification dispatcher lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification dispatcher shutting down");
                    break;
                }
            }
        }
    }

    /// Render, persist, push. Returns `Err` only for the durable leg.
    async fn dispatch(&self, event: BookingEvent) -> Result<(), sqlx::Error> {
        let (rendered, recipient) = render(event);

        let created = NotificationRepo::create(
            &self.pool,
            &CreateNotification {
                user_id: rendered.recipient,
                kind: rendered.kind.to_string(),
                title: rendered.title.clone(),
                body: rendered.body.clone(),
                metadata: Some(rendered.metadata.to_json()),
                expires_at: rendered.expires_at,
            },
        )
        .await?;
        tracing::info!(
            notification_id = created.id,
            user_id = %created.user_id,
            kind = %created.kind,
            "Notification persisted"
        );

        if let Some(messenger_id) = recipient.messenger_id {
            let message = OutboundMessage {
                title: rendered.title,
                body: rendered.body,
            };
            if let Err(e) = self.messenger.send(messenger_id, &message).await {
                tracing::warn!(
                    user_id = %recipient.user_id,
                    error = %e,
                    "Messenger push failed, in-app copy already stored"
                );
            }
        }

        Ok(())
    }
}

/// Map an event to a rendered notification, resolving the recipient's zone.
fn render(event: BookingEvent) -> (RenderedNotification, Recipient) {
    match event {
        BookingEvent::RecordCreated(ctx) => {
            let tz = resolve_timezone(&ctx.recipient.timezone);
            (
                render_record_created(
                    ctx.recipient.user_id,
                    ctx.record_id,
                    &ctx.counterpart,
                    &ctx.slot,
                    tz,
                ),
                ctx.recipient,
            )
        }
        BookingEvent::RecordStatusChanged { context, confirmed } => {
            let tz = resolve_timezone(&context.recipient.timezone);
            (
                render_record_status(
                    context.recipient.user_id,
                    context.record_id,
                    confirmed,
                    &context.counterpart,
                    &context.slot,
                    tz,
                ),
                context.recipient,
            )
        }
        BookingEvent::SlotDeleted(ctx) => {
            let tz = resolve_timezone(&ctx.recipient.timezone);
            (
                render_slot_deleted(
                    ctx.recipient.user_id,
                    ctx.record_id,
                    &ctx.record_status,
                    &ctx.slot,
                    tz,
                ),
                ctx.recipient,
            )
        }
        BookingEvent::ReminderDue { context, .. } => {
            let tz = resolve_timezone(&context.recipient.timezone);
            (
                render_reminder(
                    context.recipient.user_id,
                    context.record_id,
                    &context.counterpart,
                    &context.slot,
                    tz,
                ),
                context.recipient,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use slotbook_core::notify::{
        NotificationMeta, PartyBrief, SlotBrief, KIND_RECORD_CONFIRMED, KIND_SLOT_DELETED,
    };
    use slotbook_events::RecordContext;
    use uuid::Uuid;

    use super::*;

    fn sample_context(timezone: &str) -> RecordContext {
        RecordContext {
            record_id: 5,
            recipient: Recipient {
                user_id: Uuid::new_v4(),
                messenger_id: Some(777),
                timezone: timezone.to_string(),
            },
            counterpart: PartyBrief {
                id: Uuid::new_v4(),
                name: "Boris Ivanov".to_string(),
                phone: "+15559870000".to_string(),
            },
            slot: SlotBrief {
                slot_id: 42,
                start_time: chrono::Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap(),
                end_time: chrono::Utc.with_ymd_and_hms(2026, 3, 14, 13, 0, 0).unwrap(),
                service_id: 7,
                service_name: "Haircut".to_string(),
                service_price: 1500.0,
            },
        }
    }

    #[test]
    fn test_status_event_renders_in_recipient_zone() {
        let ctx = sample_context("Europe/Berlin");
        let recipient_id = ctx.recipient.user_id;

        let (rendered, recipient) = render(BookingEvent::RecordStatusChanged {
            context: ctx,
            confirmed: true,
        });

        assert_eq!(rendered.kind, KIND_RECORD_CONFIRMED);
        assert_eq!(rendered.recipient, recipient_id);
        assert_eq!(recipient.messenger_id, Some(777));
        // 12:00 UTC is 13:00 in Berlin in March.
        assert!(rendered.body.contains("13:00"), "body: {}", rendered.body);
    }

    #[test]
    fn test_slot_deleted_event_carries_prior_status() {
        let base = sample_context("");
        let (rendered, _) = render(BookingEvent::SlotDeleted(
            slotbook_events::SlotDeletedContext {
                record_id: base.record_id,
                record_status: "confirm".to_string(),
                recipient: base.recipient,
                slot: base.slot,
            },
        ));

        assert_eq!(rendered.kind, KIND_SLOT_DELETED);
        match rendered.metadata {
            NotificationMeta::SlotDeleted { status, .. } => assert_eq!(status, "confirm"),
            other => panic!("unexpected metadata: {other:?}"),
        }
    }
}
