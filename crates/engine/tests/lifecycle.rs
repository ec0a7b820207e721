//! Integration tests for status transitions and the time-driven sweeps.

mod common;

use assert_matches::assert_matches;
use bookwell_core::appointment::{AppointmentStatus, CancelOutcome, ReservationKind};
use bookwell_core::error::CoreError;
use bookwell_db::models::appointment::VisitTotals;
use bookwell_db::repositories::AppointmentRepo;
use bookwell_engine::notices::{
    APPOINTMENT_CONFIRMED, APPOINTMENT_REJECTED, CANCELED_BY_CLIENT, CANCELED_BY_OPERATOR,
    HOLD_EXPIRED, VISIT_CONFIRMATION_REQUESTED,
};
use bookwell_engine::EngineError;
use bookwell_events::Recipient;
use chrono::NaiveDate;
use common::{at, client, consultation, harness, is_for_client, request};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Hold expiry
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn hold_survives_until_ttl_then_expires_once(pool: PgPool) {
    let h = harness(pool.clone()).await;
    let svc = consultation(&pool).await;
    let c = client(&pool, "client-1").await;
    let req = request(c, vec![svc], at(4, 14, 0), ReservationKind::Hold);
    let hold = h.engine.reserve(&h.settings, &req).await.unwrap();

    h.clock.set(at(4, 8, 29));
    assert_eq!(h.engine.expire_holds(&h.settings).await.unwrap(), 0);
    let still = AppointmentRepo::find_by_id(&pool, hold.id).await.unwrap().unwrap();
    assert_eq!(still.status().unwrap(), AppointmentStatus::Hold);

    h.clock.set(at(4, 8, 31));
    assert_eq!(h.engine.expire_holds(&h.settings).await.unwrap(), 1);
    let expired = AppointmentRepo::find_by_id(&pool, hold.id).await.unwrap().unwrap();
    assert_eq!(expired.status().unwrap(), AppointmentStatus::Rejected);
    assert!(expired.hold_expires_at.is_none());
    assert_eq!(h.sink.count(HOLD_EXPIRED), 1);
    assert!(is_for_client(&h.sink.last().unwrap(), c));

    // A second sweep finds nothing and sends nothing.
    assert_eq!(h.engine.expire_holds(&h.settings).await.unwrap(), 0);
    assert_eq!(h.sink.count(HOLD_EXPIRED), 1);

    // The slot is free again.
    assert!(h.engine.reserve(&h.settings, &req).await.is_ok());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn concurrent_sweeps_expire_each_hold_once(pool: PgPool) {
    let h = harness(pool.clone()).await;
    let svc = consultation(&pool).await;
    let c = client(&pool, "client-1").await;
    for hour in 10..15 {
        h.engine
            .reserve(&h.settings, &request(c, vec![svc], at(4, hour, 0), ReservationKind::Hold))
            .await
            .unwrap();
    }

    h.clock.set(at(4, 8, 31));
    let (a, b) = tokio::join!(
        h.engine.expire_holds(&h.settings),
        h.engine.expire_holds(&h.settings)
    );
    assert_eq!(a.unwrap() + b.unwrap(), 5);
    assert_eq!(h.sink.count(HOLD_EXPIRED), 5);
    assert!(h.engine.list_pending_holds().await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Confirm / reject
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn confirm_applies_to_holds_only(pool: PgPool) {
    let h = harness(pool.clone()).await;
    let svc = consultation(&pool).await;
    let c = client(&pool, "client-1").await;
    let hold = h
        .engine
        .reserve(&h.settings, &request(c, vec![svc], at(4, 14, 0), ReservationKind::Hold))
        .await
        .unwrap();

    let booked = h.engine.confirm(&h.settings, hold.id).await.unwrap().unwrap();
    assert_eq!(booked.status().unwrap(), AppointmentStatus::Booked);
    assert!(booked.hold_expires_at.is_none());
    assert_eq!(h.sink.count(APPOINTMENT_CONFIRMED), 1);

    // Confirmed holds no longer expire.
    h.clock.set(at(4, 9, 0));
    assert_eq!(h.engine.expire_holds(&h.settings).await.unwrap(), 0);

    assert!(h.engine.confirm(&h.settings, hold.id).await.unwrap().is_none());
    assert!(h.engine.reject(&h.settings, hold.id, None).await.unwrap().is_none());
    assert_eq!(h.sink.count(APPOINTMENT_CONFIRMED), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn reject_records_reason(pool: PgPool) {
    let h = harness(pool.clone()).await;
    let svc = consultation(&pool).await;
    let c = client(&pool, "client-1").await;
    let hold = h
        .engine
        .reserve(&h.settings, &request(c, vec![svc], at(4, 14, 0), ReservationKind::Hold))
        .await
        .unwrap();

    let rejected = h
        .engine
        .reject(&h.settings, hold.id, Some("on holiday"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rejected.status().unwrap(), AppointmentStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("on holiday"));

    let n = h.sink.last().unwrap();
    assert_eq!(n.kind, APPOINTMENT_REJECTED);
    assert!(n.text.ends_with("on holiday"));
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn client_cancel_respects_cutoff(pool: PgPool) {
    let h = harness(pool.clone()).await;
    let svc = consultation(&pool).await;
    let owner = client(&pool, "owner").await;
    let stranger = client(&pool, "stranger").await;
    let appt = h
        .engine
        .reserve(&h.settings, &request(owner, vec![svc], at(4, 14, 0), ReservationKind::Booked))
        .await
        .unwrap();

    // Cutoff is two hours: 12:00 is the last allowed instant.
    h.clock.set(at(4, 12, 1));
    assert_eq!(
        h.engine.cancel_by_client(&h.settings, appt.id, owner).await.unwrap(),
        CancelOutcome::TooLate
    );

    h.clock.set(at(4, 11, 59));
    assert_eq!(
        h.engine.cancel_by_client(&h.settings, appt.id, stranger).await.unwrap(),
        CancelOutcome::NotAllowed
    );
    assert_eq!(
        h.engine.cancel_by_client(&h.settings, appt.id, owner).await.unwrap(),
        CancelOutcome::Canceled
    );
    assert_eq!(
        h.engine.cancel_by_client(&h.settings, appt.id, owner).await.unwrap(),
        CancelOutcome::NotAllowed
    );

    let n = h.sink.last().unwrap();
    assert_eq!(n.kind, CANCELED_BY_CLIENT);
    assert_eq!(n.recipient, Recipient::Operators);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn client_cannot_cancel_a_hold(pool: PgPool) {
    let h = harness(pool.clone()).await;
    let svc = consultation(&pool).await;
    let c = client(&pool, "client-1").await;
    let hold = h
        .engine
        .reserve(&h.settings, &request(c, vec![svc], at(4, 14, 0), ReservationKind::Hold))
        .await
        .unwrap();

    assert_eq!(
        h.engine.cancel_by_client(&h.settings, hold.id, c).await.unwrap(),
        CancelOutcome::NotAllowed
    );
    assert_eq!(
        h.engine.cancel_by_client(&h.settings, 9999, c).await.unwrap(),
        CancelOutcome::NotAllowed
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn operator_cancel_ignores_cutoff(pool: PgPool) {
    let h = harness(pool.clone()).await;
    let svc = consultation(&pool).await;
    let c = client(&pool, "client-1").await;
    let appt = h
        .engine
        .reserve(&h.settings, &request(c, vec![svc], at(4, 14, 0), ReservationKind::Booked))
        .await
        .unwrap();

    h.clock.set(at(4, 13, 30));
    let canceled = h
        .engine
        .cancel_by_operator(&h.settings, appt.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(canceled.status().unwrap(), AppointmentStatus::Canceled);
    assert!(h.engine.cancel_by_operator(&h.settings, appt.id).await.unwrap().is_none());
    assert_eq!(h.sink.count(CANCELED_BY_OPERATOR), 1);
    assert!(is_for_client(&h.sink.last().unwrap(), c));
}

// ---------------------------------------------------------------------------
// Completion and visits
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn completion_sweep_asks_operators_once(pool: PgPool) {
    let h = harness(pool.clone()).await;
    let svc = consultation(&pool).await;
    let c = client(&pool, "client-1").await;
    let appt = h
        .engine
        .reserve(&h.settings, &request(c, vec![svc], at(4, 14, 0), ReservationKind::Booked))
        .await
        .unwrap();

    h.clock.set(at(4, 14, 59));
    assert_eq!(h.engine.complete_finished(&h.settings).await.unwrap(), 0);

    h.clock.set(at(4, 15, 30));
    assert_eq!(h.engine.complete_finished(&h.settings).await.unwrap(), 1);
    assert_eq!(h.engine.complete_finished(&h.settings).await.unwrap(), 0);
    assert_eq!(h.sink.count(VISIT_CONFIRMATION_REQUESTED), 1);

    let done = AppointmentRepo::find_by_id(&pool, appt.id).await.unwrap().unwrap();
    assert_eq!(done.status().unwrap(), AppointmentStatus::Completed);
    assert!(!done.visit_confirmed);

    let confirmed = h.engine.confirm_visit(appt.id, None).await.unwrap().unwrap();
    assert!(confirmed.visit_confirmed);

    let history = h.engine.list_history_for_client(c, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].appointment.id, appt.id);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn visit_confirmation_completes_and_feeds_summary(pool: PgPool) {
    let h = harness(pool.clone()).await;
    let svc = consultation(&pool).await;
    let c = client(&pool, "client-1").await;
    let past = h
        .engine
        .reserve(&h.settings, &request(c, vec![svc], at(4, 14, 0), ReservationKind::Booked))
        .await
        .unwrap();
    let future = h
        .engine
        .reserve(&h.settings, &request(c, vec![svc], at(5, 10, 0), ReservationKind::Booked))
        .await
        .unwrap();

    h.clock.set(at(4, 16, 0));
    assert!(h.engine.confirm_visit(future.id, None).await.unwrap().is_none());
    assert_matches!(
        h.engine.confirm_visit(past.id, Some(-1)).await,
        Err(EngineError::Core(CoreError::Validation(_)))
    );

    let visited = h.engine.confirm_visit(past.id, Some(5000)).await.unwrap().unwrap();
    assert_eq!(visited.status().unwrap(), AppointmentStatus::Completed);
    assert!(visited.visit_confirmed);
    assert_eq!(visited.price_override_cents, Some(5000));

    let day = NaiveDate::from_ymd_opt(2030, 3, 4).unwrap();
    let summary = h
        .engine
        .visit_summary(h.settings.day_bounds(day).unwrap())
        .await
        .unwrap();
    assert_eq!(
        summary,
        VisitTotals {
            visit_count: 1,
            total_price_cents: 5000,
            total_minutes: 60,
        }
    );
}
