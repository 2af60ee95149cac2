//! Integration tests for the booking state machine invariants.
//!
//! Exercises the record repository against a real database:
//! - duplicate booking rejection (pre-check and unique index)
//! - confirm cascade (siblings rejected, slot marked booked)
//! - un-confirm recompute (booked flag drops when no confirm remains)
//! - delete recompute
//! - the global booked-flag and at-most-one-confirm invariants across a
//!   sequence of transitions

use chrono::{TimeDelta, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use slotbook_core::status::{STATUS_CONFIRM, STATUS_PENDING, STATUS_REJECT};
use slotbook_db::models::record::CreateRecord;
use slotbook_db::models::service::CreateService;
use slotbook_db::models::slot::CreateSlot;
use slotbook_db::models::user::CreateUser;
use slotbook_db::repositories::{RecordRepo, ServiceRepo, SlotRepo, UserRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_user(pool: &PgPool, phone: &str, name: &str) -> slotbook_db::models::user::User {
    let input = CreateUser {
        phone: phone.to_string(),
        first_name: name.to_string(),
        surname: "Test".to_string(),
        messenger_id: None,
        timezone: String::new(),
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

/// Create an owner, a service, and a slot starting one day out.
/// Returns `(owner_id, slot_id)`.
async fn create_slot(pool: &PgPool, phone: &str) -> (Uuid, i64) {
    let owner = create_user(pool, phone, "Owner").await;
    let service = ServiceRepo::create(
        pool,
        &CreateService {
            owner_id: owner.id,
            name: "Haircut".to_string(),
            description: String::new(),
            price: 1500.0,
            duration_mins: 60,
        },
    )
    .await
    .expect("service creation should succeed");

    let start = Utc::now() + TimeDelta::days(1);
    let slot = SlotRepo::create(
        pool,
        &CreateSlot {
            owner_id: owner.id,
            service_id: service.id,
            start_time: start,
            end_time: start + TimeDelta::hours(1),
        },
    )
    .await
    .expect("slot creation should succeed");

    (owner.id, slot.id)
}

async fn book(pool: &PgPool, slot_id: i64, client_id: Uuid) -> slotbook_db::models::record::Record {
    RecordRepo::create(
        pool,
        &CreateRecord {
            slot_id,
            client_id,
        },
    )
    .await
    .expect("record creation should succeed")
}

async fn slot_is_booked(pool: &PgPool, slot_id: i64) -> bool {
    SlotRepo::find_by_id(pool, slot_id)
        .await
        .expect("slot lookup should succeed")
        .expect("slot should exist")
        .is_booked
}

async fn confirm_count(pool: &PgPool, slot_id: i64) -> usize {
    RecordRepo::find_by_slot(pool, slot_id, Some(STATUS_CONFIRM))
        .await
        .expect("slot records query should succeed")
        .len()
}

/// The booked-flag invariant, checked directly against the store.
async fn assert_booked_flag_invariant(pool: &PgPool, slot_id: i64) {
    let has_confirm = SlotRepo::has_confirmed_record(pool, slot_id)
        .await
        .expect("aggregate should succeed");
    assert_eq!(
        slot_is_booked(pool, slot_id).await,
        has_confirm,
        "is_booked must equal the existence of a confirmed record"
    );
}

// ---------------------------------------------------------------------------
// Creation / duplicates
// ---------------------------------------------------------------------------

/// New records start pending and do not mark the slot booked.
#[sqlx::test]
async fn test_create_starts_pending(pool: PgPool) {
    let (_, slot_id) = create_slot(&pool, "+70000000001").await;
    let client = create_user(&pool, "+70000000002", "Client").await;

    let record = book(&pool, slot_id, client.id).await;

    assert_eq!(record.status, STATUS_PENDING);
    assert!(!slot_is_booked(&pool, slot_id).await);
}

/// A second record for the same (slot, client) pair hits the unique index.
#[sqlx::test]
async fn test_duplicate_booking_rejected(pool: PgPool) {
    let (_, slot_id) = create_slot(&pool, "+70000000003").await;
    let client = create_user(&pool, "+70000000004", "Client").await;

    book(&pool, slot_id, client.id).await;

    assert!(RecordRepo::exists(&pool, slot_id, client.id)
        .await
        .expect("exists should succeed"));

    let result = RecordRepo::create(
        &pool,
        &CreateRecord {
            slot_id,
            client_id: client.id,
        },
    )
    .await;

    match result {
        Err(sqlx::Error::Database(e)) => assert!(e.is_unique_violation()),
        other => panic!("expected unique violation, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Confirm cascade
// ---------------------------------------------------------------------------

/// Confirming one record rejects every other live record on the slot and
/// marks the slot booked.
#[sqlx::test]
async fn test_confirm_cascade(pool: PgPool) {
    let (_, slot_id) = create_slot(&pool, "+70000000005").await;
    let c1 = create_user(&pool, "+70000000006", "First").await;
    let c2 = create_user(&pool, "+70000000007", "Second").await;

    let r1 = book(&pool, slot_id, c1.id).await;
    let r2 = book(&pool, slot_id, c2.id).await;

    let prev = RecordRepo::set_status(&pool, r1.id, STATUS_CONFIRM)
        .await
        .expect("set_status should succeed")
        .expect("record should exist");
    assert_eq!(prev.status, STATUS_PENDING);

    let r1 = RecordRepo::find_by_id(&pool, r1.id).await.unwrap().unwrap();
    let r2 = RecordRepo::find_by_id(&pool, r2.id).await.unwrap().unwrap();
    assert_eq!(r1.status, STATUS_CONFIRM);
    assert_eq!(r2.status, STATUS_REJECT);
    assert!(slot_is_booked(&pool, slot_id).await);
    assert_booked_flag_invariant(&pool, slot_id).await;
}

/// Confirming a second record displaces the first; the confirm count never
/// exceeds one.
#[sqlx::test]
async fn test_at_most_one_confirm(pool: PgPool) {
    let (_, slot_id) = create_slot(&pool, "+70000000008").await;
    let c1 = create_user(&pool, "+70000000009", "First").await;
    let c2 = create_user(&pool, "+70000000010", "Second").await;

    let r1 = book(&pool, slot_id, c1.id).await;
    let r2 = book(&pool, slot_id, c2.id).await;

    RecordRepo::set_status(&pool, r1.id, STATUS_CONFIRM).await.unwrap();
    assert_eq!(confirm_count(&pool, slot_id).await, 1);

    // Re-open the second request and confirm it instead. The permissive
    // state machine allows reject -> confirm; the cascade must still hold.
    RecordRepo::set_status(&pool, r2.id, STATUS_CONFIRM).await.unwrap();
    assert_eq!(confirm_count(&pool, slot_id).await, 1);

    let r1 = RecordRepo::find_by_id(&pool, r1.id).await.unwrap().unwrap();
    let r2 = RecordRepo::find_by_id(&pool, r2.id).await.unwrap().unwrap();
    assert_eq!(r1.status, STATUS_REJECT);
    assert_eq!(r2.status, STATUS_CONFIRM);
    assert!(slot_is_booked(&pool, slot_id).await);
    assert_booked_flag_invariant(&pool, slot_id).await;
}

// ---------------------------------------------------------------------------
// Un-confirm recompute
// ---------------------------------------------------------------------------

/// Rejecting the confirmed record clears the booked flag.
#[sqlx::test]
async fn test_unconfirm_recomputes_booked_flag(pool: PgPool) {
    let (_, slot_id) = create_slot(&pool, "+70000000011").await;
    let client = create_user(&pool, "+70000000012", "Client").await;

    let record = book(&pool, slot_id, client.id).await;
    RecordRepo::set_status(&pool, record.id, STATUS_CONFIRM).await.unwrap();
    assert!(slot_is_booked(&pool, slot_id).await);

    RecordRepo::set_status(&pool, record.id, STATUS_REJECT).await.unwrap();

    assert!(!slot_is_booked(&pool, slot_id).await);
    assert_booked_flag_invariant(&pool, slot_id).await;
}

/// Moving a pending record between non-confirm statuses never touches the flag.
#[sqlx::test]
async fn test_non_confirm_transitions_leave_flag(pool: PgPool) {
    let (_, slot_id) = create_slot(&pool, "+70000000013").await;
    let client = create_user(&pool, "+70000000014", "Client").await;

    let record = book(&pool, slot_id, client.id).await;
    RecordRepo::set_status(&pool, record.id, STATUS_REJECT).await.unwrap();
    RecordRepo::set_status(&pool, record.id, STATUS_PENDING).await.unwrap();

    assert!(!slot_is_booked(&pool, slot_id).await);
    assert_booked_flag_invariant(&pool, slot_id).await;
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

/// Deleting the confirmed record clears the booked flag in the same
/// transaction.
#[sqlx::test]
async fn test_delete_confirmed_record_recomputes(pool: PgPool) {
    let (_, slot_id) = create_slot(&pool, "+70000000015").await;
    let client = create_user(&pool, "+70000000016", "Client").await;

    let record = book(&pool, slot_id, client.id).await;
    RecordRepo::set_status(&pool, record.id, STATUS_CONFIRM).await.unwrap();

    let deleted = RecordRepo::delete(&pool, record.id)
        .await
        .expect("delete should succeed")
        .expect("record should exist");
    assert_eq!(deleted.status, STATUS_CONFIRM);

    assert!(!slot_is_booked(&pool, slot_id).await);
    assert!(RecordRepo::find_by_id(&pool, record.id).await.unwrap().is_none());
}

/// Deleting a missing record reports `None` rather than an error.
#[sqlx::test]
async fn test_delete_missing_record(pool: PgPool) {
    assert!(RecordRepo::delete(&pool, 424242).await.unwrap().is_none());
    assert!(RecordRepo::set_status(&pool, 424242, STATUS_CONFIRM)
        .await
        .unwrap()
        .is_none());
}

/// Deleting a slot cascades its records away.
#[sqlx::test]
async fn test_slot_delete_cascades_records(pool: PgPool) {
    let (owner_id, slot_id) = create_slot(&pool, "+70000000017").await;
    let client = create_user(&pool, "+70000000018", "Client").await;
    let record = book(&pool, slot_id, client.id).await;

    // Ownership-scoped lookup sees the slot for its owner only.
    assert!(SlotRepo::find_by_id_and_owner(&pool, slot_id, owner_id)
        .await
        .unwrap()
        .is_some());
    assert!(SlotRepo::find_by_id_and_owner(&pool, slot_id, client.id)
        .await
        .unwrap()
        .is_none());

    assert!(SlotRepo::delete(&pool, slot_id).await.unwrap());

    assert!(RecordRepo::find_by_id(&pool, record.id).await.unwrap().is_none());
    assert!(SlotRepo::find_by_id(&pool, slot_id).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Reminder scan query
// ---------------------------------------------------------------------------

/// Only confirmed records inside the window are returned, with detail columns.
#[sqlx::test]
async fn test_confirmed_starting_between(pool: PgPool) {
    let (_, slot_id) = create_slot(&pool, "+70000000019").await;
    let client = create_user(&pool, "+70000000020", "Client").await;
    let record = book(&pool, slot_id, client.id).await;

    let from = Utc::now();
    let to = Utc::now() + TimeDelta::days(2);

    // Pending records are not reminded.
    let rows = RecordRepo::find_confirmed_starting_between(&pool, from, to)
        .await
        .unwrap();
    assert!(rows.is_empty());

    RecordRepo::set_status(&pool, record.id, STATUS_CONFIRM).await.unwrap();

    let rows = RecordRepo::find_confirmed_starting_between(&pool, from, to)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, record.id);
    assert_eq!(rows[0].service_name, "Haircut");
    assert_eq!(rows[0].client_full_name(), "Client Test");
}
