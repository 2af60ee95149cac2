//! One-hour booking reminders.
//!
//! Every minute, scan for confirmed records whose slot starts roughly one
//! hour from now and emit a `ReminderDue` event for each -- once. The window
//! is two minutes wide so a delayed tick cannot skip over a record, and an
//! in-process set deduplicates records the widened window sees twice.
//! The scan is read-only over booking state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use slotbook_core::types::{DbId, Timestamp};
use slotbook_db::repositories::RecordRepo;
use slotbook_events::{BookingEvent, EventBus};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::handlers::record::context_for_client;

/// How often the scan runs.
const SCAN_INTERVAL: Duration = Duration::from_secs(60);

/// Window edges around "one hour from now".
const WINDOW_FROM_MINS: i64 = 59;
const WINDOW_TO_MINS: i64 = 61;

/// Run the reminder scan loop until `cancel` is triggered.
pub async fn run(pool: PgPool, event_bus: Arc<EventBus>, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = SCAN_INTERVAL.as_secs(),
        "Reminder scan started"
    );

    // record id -> slot start; entries are dropped once the slot has started,
    // which bounds the map without any extra bookkeeping.
    let mut already_sent: HashMap<DbId, Timestamp> = HashMap::new();
    let mut interval = tokio::time::interval(SCAN_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Reminder scan stopping");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = scan_once(&pool, &event_bus, &mut already_sent).await {
                    tracing::error!(error = %e, "Reminder scan failed");
                }
            }
        }
    }
}

async fn scan_once(
    pool: &PgPool,
    event_bus: &EventBus,
    already_sent: &mut HashMap<DbId, Timestamp>,
) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    already_sent.retain(|_, start| *start > now);

    let from = now + TimeDelta::minutes(WINDOW_FROM_MINS);
    let to = now + TimeDelta::minutes(WINDOW_TO_MINS);

    for detail in RecordRepo::find_confirmed_starting_between(pool, from, to).await? {
        if already_sent.contains_key(&detail.id) {
            continue;
        }
        already_sent.insert(detail.id, detail.slot_start);

        tracing::info!(record_id = detail.id, starts_at = %detail.slot_start, "Reminder due");
        event_bus.publish(BookingEvent::ReminderDue {
            context: context_for_client(&detail),
            starts_at: detail.slot_start,
        });
    }

    Ok(())
}
