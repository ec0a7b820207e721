#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use bookwell_core::appointment::ReservationKind;
use bookwell_core::clock::ManualClock;
use bookwell_core::settings::CalendarSettings;
use bookwell_core::types::{DbId, Timestamp};
use bookwell_db::models::client::UpsertClient;
use bookwell_db::models::service::CreateService;
use bookwell_db::repositories::{ClientRepo, ServiceRepo};
use bookwell_engine::{BookingEngine, ReservationRequest};
use bookwell_events::{Notification, NotificationSink, Recipient};
use chrono::{TimeZone, Utc};
use sqlx::PgPool;

/// Sink that keeps every notification for inspection.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn all(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.all().iter().filter(|n| n.kind == kind).count()
    }

    pub fn last(&self) -> Option<Notification> {
        self.all().last().cloned()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}

/// An engine on a pinned clock with a recording sink.
pub struct Harness {
    pub engine: BookingEngine,
    pub clock: Arc<ManualClock>,
    pub sink: Arc<RecordingSink>,
    pub settings: CalendarSettings,
}

/// 2030-03-04 is a Monday.
pub fn at(day: u32, h: u32, m: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2030, 3, day, h, m, 0).unwrap()
}

/// Defaults in UTC with a 30 minute hold TTL.
pub fn test_settings() -> CalendarSettings {
    CalendarSettings {
        hold_ttl_min: 30,
        timezone: chrono_tz::UTC,
        ..CalendarSettings::default()
    }
}

/// Engine pinned to Monday 2030-03-04 08:00 UTC, with the settings table
/// seeded from [`test_settings`].
pub async fn harness(pool: PgPool) -> Harness {
    let clock = Arc::new(ManualClock::new(at(4, 8, 0)));
    let sink = Arc::new(RecordingSink::default());
    let engine = BookingEngine::new(pool, clock.clone(), sink.clone(), chrono_tz::UTC);
    let settings = test_settings();
    engine.seed_settings(&settings).await.unwrap();
    Harness {
        engine,
        clock,
        sink,
        settings,
    }
}

pub async fn client(pool: &PgPool, external_ref: &str) -> DbId {
    ClientRepo::upsert(
        pool,
        &UpsertClient {
            external_ref: external_ref.to_string(),
            display_name: None,
            phone: None,
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn service(pool: &PgPool, name: &str, duration: i32, buffer: i32, price: i64) -> DbId {
    ServiceRepo::create(
        pool,
        &CreateService {
            name: name.to_string(),
            duration_min: duration,
            buffer_min: Some(buffer),
            price_cents: Some(price),
            sort_order: None,
        },
    )
    .await
    .unwrap()
    .id
}

/// 40 minutes plus a 10 minute buffer: a one hour span with the global
/// buffer.
pub async fn consultation(pool: &PgPool) -> DbId {
    service(pool, "Consultation", 40, 10, 4500).await
}

pub fn request(
    client_id: DbId,
    service_ids: Vec<DbId>,
    start_at: Timestamp,
    kind: ReservationKind,
) -> ReservationRequest {
    ReservationRequest {
        client_id,
        service_ids,
        start_at,
        kind,
        price_override_cents: None,
        client_comment: None,
        admin_comment: None,
    }
}

pub fn is_for_client(n: &Notification, client_id: DbId) -> bool {
    n.recipient == Recipient::Client(client_id)
}
