//! Integration tests for the slot lock, overlap checks, blocked intervals,
//! break rules and settings rows.

use bookwell_core::appointment::AppointmentStatus;
use bookwell_core::break_rules::RepeatKind;
use bookwell_core::interval::Interval;
use bookwell_core::settings::CalendarSettings;
use bookwell_core::slot_key::slot_lock_key;
use bookwell_core::types::Timestamp;
use bookwell_db::models::appointment::CreateAppointment;
use bookwell_db::models::blocked_interval::CreateBlockedInterval;
use bookwell_db::models::break_rule::CreateBreakRule;
use bookwell_db::models::client::UpsertClient;
use bookwell_db::models::service::CreateService;
use bookwell_db::repositories::{
    AppointmentRepo, BlockedIntervalRepo, BreakRuleRepo, ClientRepo, ServiceRepo, SettingsRepo,
};
use bookwell_db::reservation::{acquire_xact_lock, busy_intervals, check_slot, SlotCheck};
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn at(h: u32, m: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2030, 3, 4, h, m, 0).unwrap()
}

fn span(start: Timestamp, minutes: i64) -> Interval {
    Interval::starting_at(start, minutes).unwrap()
}

async fn book(pool: &PgPool, start: Timestamp) -> i64 {
    let client = ClientRepo::upsert(
        pool,
        &UpsertClient {
            external_ref: format!("client-{}", start.timestamp()),
            display_name: None,
            phone: None,
        },
    )
    .await
    .unwrap();
    let service = ServiceRepo::create(
        pool,
        &CreateService {
            name: "Consultation".to_string(),
            duration_min: 60,
            buffer_min: None,
            price_cents: None,
            sort_order: None,
        },
    )
    .await
    .unwrap();
    AppointmentRepo::insert(
        pool,
        &CreateAppointment {
            client_id: client.id,
            service_ids: vec![service.id],
            start_at: start,
            end_at: start + Duration::minutes(60),
            status: AppointmentStatus::Booked,
            hold_expires_at: None,
            price_override_cents: None,
            client_comment: None,
            admin_comment: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn block(pool: &PgPool, interval: Interval) -> i64 {
    BlockedIntervalRepo::insert(
        pool,
        &CreateBlockedInterval {
            start_at: interval.start,
            end_at: interval.end,
            reason: "Lunch".to_string(),
            created_by: Some("operator".to_string()),
            break_rule_id: None,
        },
    )
    .await
    .unwrap()
    .id
}

// ---------------------------------------------------------------------------
// Overlap checks
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn check_slot_reports_taken_then_blocked(pool: PgPool) {
    let appt_id = book(&pool, at(14, 0)).await;
    block(&pool, span(at(16, 0), 30)).await;

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(
        check_slot(&mut *conn, span(at(14, 30), 60), None).await.unwrap(),
        SlotCheck::Taken
    );
    assert_eq!(
        check_slot(&mut *conn, span(at(15, 30), 60), None).await.unwrap(),
        SlotCheck::Blocked
    );
    assert_eq!(
        check_slot(&mut *conn, span(at(15, 0), 60), None).await.unwrap(),
        SlotCheck::Free
    );
    // Moving an appointment onto itself is not a conflict.
    assert_eq!(
        check_slot(&mut *conn, span(at(14, 30), 60), Some(appt_id)).await.unwrap(),
        SlotCheck::Free
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn busy_intervals_merge_appointments_and_blocks(pool: PgPool) {
    book(&pool, at(14, 0)).await;
    block(&pool, span(at(10, 0), 30)).await;
    // Outside the window.
    block(&pool, span(at(23, 0), 30)).await;

    let busy = busy_intervals(&pool, Interval::new(at(9, 0), at(21, 0)).unwrap())
        .await
        .unwrap();
    assert_eq!(busy, vec![span(at(10, 0), 30), span(at(14, 0), 60)]);
}

#[sqlx::test(migrations = "./migrations")]
async fn slot_lock_is_held_until_commit(pool: PgPool) {
    let key = slot_lock_key(at(14, 0), 1);
    let mut tx = pool.begin().await.unwrap();
    acquire_xact_lock(&mut *tx, key).await.unwrap();

    let held_elsewhere: bool = sqlx::query_scalar("SELECT pg_try_advisory_xact_lock($1)")
        .bind(key)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(!held_elsewhere);

    tx.commit().await.unwrap();
    let free_now: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1)")
        .bind(key)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(free_now);
}

// ---------------------------------------------------------------------------
// Blocked intervals
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn blocked_range_includes_touching_end(pool: PgPool) {
    let id = block(&pool, span(at(10, 0), 30)).await;
    let listed = BlockedIntervalRepo::list_in_range(&pool, Interval::new(at(10, 30), at(12, 0)).unwrap())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    assert!(BlockedIntervalRepo::delete(&pool, id).await.unwrap());
    assert!(!BlockedIntervalRepo::delete(&pool, id).await.unwrap());
}

// ---------------------------------------------------------------------------
// Break rules
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn high_water_mark_only_moves_forward(pool: PgPool) {
    let rule = BreakRuleRepo::create(
        &pool,
        &CreateBreakRule {
            repeat: RepeatKind::Daily,
            start_time: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            duration_min: 30,
            reason: Some("Lunch".to_string()),
            weekday: Some(0),
            start_date: NaiveDate::from_ymd_opt(2030, 3, 4).unwrap(),
            created_by: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(rule.schedule().unwrap().repeat, RepeatKind::Daily);

    let d10 = NaiveDate::from_ymd_opt(2030, 3, 10).unwrap();
    let d8 = NaiveDate::from_ymd_opt(2030, 3, 8).unwrap();
    assert!(BreakRuleRepo::advance_generated(&pool, rule.id, d10).await.unwrap());
    assert!(!BreakRuleRepo::advance_generated(&pool, rule.id, d8).await.unwrap());
    assert!(!BreakRuleRepo::advance_generated(&pool, rule.id, d10).await.unwrap());

    let stored = BreakRuleRepo::find_by_id(&pool, rule.id).await.unwrap().unwrap();
    assert_eq!(stored.last_generated_date, Some(d10));
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn seeding_keeps_existing_values(pool: PgPool) {
    SettingsRepo::upsert(&pool, "slot_step_min", "15").await.unwrap();

    let defaults = CalendarSettings::default().to_entries();
    let inserted = SettingsRepo::seed_missing(&pool, &defaults).await.unwrap();
    assert_eq!(inserted as usize, defaults.len() - 1);

    let rows = SettingsRepo::list(&pool).await.unwrap();
    let step = rows.iter().find(|r| r.key == "slot_step_min").unwrap();
    assert_eq!(step.value, "15");

    let parsed = CalendarSettings::from_entries(
        rows.into_iter().map(|r| (r.key, r.value)),
        chrono_tz::UTC,
    )
    .unwrap();
    assert_eq!(parsed.slot_step_min, 15);

    // Second seed inserts nothing.
    assert_eq!(SettingsRepo::seed_missing(&pool, &defaults).await.unwrap(), 0);
}
