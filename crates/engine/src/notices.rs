//! Notifications produced by engine transitions.
//!
//! One builder per transition. Texts carry local times in the calendar's
//! timezone; the payload carries the machine-readable fields a front end
//! needs to render buttons.

use bookwell_core::reminders::ReminderKind;
use bookwell_core::settings::CalendarSettings;
use bookwell_core::types::Timestamp;
use bookwell_db::models::appointment::{Appointment, AppointmentDetail};
use bookwell_events::{Notification, Recipient};
use serde_json::json;

pub const HOLD_CREATED: &str = "hold.created";
pub const HOLD_EXPIRED: &str = "hold.expired";
pub const APPOINTMENT_BOOKED: &str = "appointment.booked";
pub const APPOINTMENT_CONFIRMED: &str = "appointment.confirmed";
pub const APPOINTMENT_REJECTED: &str = "appointment.rejected";
pub const CANCELED_BY_CLIENT: &str = "appointment.canceled_by_client";
pub const CANCELED_BY_OPERATOR: &str = "appointment.canceled_by_operator";
pub const RESCHEDULE_PROPOSED: &str = "reschedule.proposed";
pub const RESCHEDULE_APPROVED: &str = "reschedule.approved";
pub const RESCHEDULE_REJECTED: &str = "reschedule.rejected";
pub const RESCHEDULED: &str = "appointment.rescheduled";
pub const VISIT_CONFIRMATION_REQUESTED: &str = "visit.confirmation_requested";
pub const REMINDER: &str = "appointment.reminder";

fn local(settings: &CalendarSettings, at: Timestamp) -> String {
    at.with_timezone(&settings.timezone)
        .format("%d.%m.%Y %H:%M")
        .to_string()
}

fn to_client(kind: &str, appt: &Appointment, text: String) -> Notification {
    Notification::new(kind, Recipient::Client(appt.client_id), text).for_appointment(appt.id)
}

fn to_operators(kind: &str, appt: &Appointment, text: String) -> Notification {
    Notification::new(kind, Recipient::Operators, text).for_appointment(appt.id)
}

pub fn hold_created(settings: &CalendarSettings, appt: &Appointment) -> Notification {
    to_operators(
        HOLD_CREATED,
        appt,
        format!("New booking request for {}", local(settings, appt.start_at)),
    )
    .with_payload(json!({
        "start_at": appt.start_at,
        "hold_expires_at": appt.hold_expires_at,
        "client_comment": appt.client_comment,
    }))
}

pub fn booked(settings: &CalendarSettings, appt: &Appointment) -> Notification {
    to_client(
        APPOINTMENT_BOOKED,
        appt,
        format!("You are booked for {}", local(settings, appt.start_at)),
    )
}

pub fn confirmed(settings: &CalendarSettings, appt: &Appointment) -> Notification {
    to_client(
        APPOINTMENT_CONFIRMED,
        appt,
        format!("Your appointment on {} is confirmed", local(settings, appt.start_at)),
    )
    .with_payload(json!({ "start_at": appt.start_at }))
}

pub fn rejected(settings: &CalendarSettings, appt: &Appointment) -> Notification {
    let mut text = format!(
        "Your request for {} was declined",
        local(settings, appt.start_at)
    );
    if let Some(reason) = appt.rejection_reason.as_deref().filter(|r| !r.is_empty()) {
        text.push_str(&format!(": {reason}"));
    }
    to_client(APPOINTMENT_REJECTED, appt, text)
}

pub fn hold_expired(settings: &CalendarSettings, appt: &Appointment) -> Notification {
    to_client(
        HOLD_EXPIRED,
        appt,
        format!(
            "Your request for {} was not confirmed in time and has been released",
            local(settings, appt.start_at)
        ),
    )
}

pub fn canceled_by_client(settings: &CalendarSettings, appt: &Appointment) -> Notification {
    to_operators(
        CANCELED_BY_CLIENT,
        appt,
        format!("Client canceled the appointment on {}", local(settings, appt.start_at)),
    )
}

pub fn canceled_by_operator(settings: &CalendarSettings, appt: &Appointment) -> Notification {
    to_client(
        CANCELED_BY_OPERATOR,
        appt,
        format!("Your appointment on {} was canceled", local(settings, appt.start_at)),
    )
}

pub fn reschedule_proposed(settings: &CalendarSettings, appt: &Appointment) -> Notification {
    let proposed = appt.proposed_start_at.unwrap_or(appt.start_at);
    to_operators(
        RESCHEDULE_PROPOSED,
        appt,
        format!(
            "Client asks to move {} to {}",
            local(settings, appt.start_at),
            local(settings, proposed)
        ),
    )
    .with_payload(json!({
        "start_at": appt.start_at,
        "proposed_start_at": appt.proposed_start_at,
    }))
}

pub fn reschedule_approved(settings: &CalendarSettings, appt: &Appointment) -> Notification {
    to_client(
        RESCHEDULE_APPROVED,
        appt,
        format!("Your appointment was moved to {}", local(settings, appt.start_at)),
    )
}

pub fn reschedule_rejected(settings: &CalendarSettings, appt: &Appointment) -> Notification {
    to_client(
        RESCHEDULE_REJECTED,
        appt,
        format!(
            "Your appointment stays on {}",
            local(settings, appt.start_at)
        ),
    )
}

pub fn rescheduled(settings: &CalendarSettings, appt: &Appointment) -> Notification {
    to_client(
        RESCHEDULED,
        appt,
        format!("Your appointment was rescheduled to {}", local(settings, appt.start_at)),
    )
}

pub fn visit_confirmation_requested(settings: &CalendarSettings, appt: &Appointment) -> Notification {
    to_operators(
        VISIT_CONFIRMATION_REQUESTED,
        appt,
        format!(
            "Confirm the visit on {} and its final price",
            local(settings, appt.start_at)
        ),
    )
    .with_payload(json!({ "price_override_cents": appt.price_override_cents }))
}

/// `allow_change` tells the client whether they may still cancel or move.
pub fn reminder(
    settings: &CalendarSettings,
    detail: &AppointmentDetail,
    kind: ReminderKind,
    allow_change: bool,
) -> Notification {
    let appt = &detail.appointment;
    let mut text = format!(
        "Reminder: {} on {}",
        detail.service_name,
        local(settings, appt.start_at)
    );
    if !allow_change {
        text.push_str(". It can no longer be canceled or moved");
    }
    to_client(REMINDER, appt, text).with_payload(json!({
        "reminder": kind,
        "allow_change": allow_change,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookwell_core::appointment::AppointmentStatus;
    use chrono::{Duration, TimeZone, Utc};

    fn appointment() -> Appointment {
        let start = Utc.with_ymd_and_hms(2030, 3, 4, 14, 0, 0).unwrap();
        Appointment {
            id: 9,
            client_id: 4,
            service_id: 1,
            service_ids: vec![1],
            start_at: start,
            end_at: start + Duration::minutes(60),
            status_id: AppointmentStatus::Booked.id(),
            hold_expires_at: None,
            proposed_start_at: None,
            price_override_cents: None,
            visit_confirmed: false,
            reminder_first_sent: false,
            reminder_second_sent: false,
            client_comment: None,
            admin_comment: None,
            rejection_reason: Some("fully booked".into()),
            created_at: start,
            updated_at: start,
        }
    }

    fn settings() -> CalendarSettings {
        CalendarSettings {
            timezone: chrono_tz::UTC,
            ..CalendarSettings::default()
        }
    }

    #[test]
    fn client_notices_address_the_client() {
        let n = confirmed(&settings(), &appointment());
        assert_eq!(n.kind, APPOINTMENT_CONFIRMED);
        assert_eq!(n.recipient, Recipient::Client(4));
        assert_eq!(n.appointment_id, Some(9));
        assert!(n.text.contains("04.03.2030 14:00"));
    }

    #[test]
    fn rejection_carries_reason() {
        let n = rejected(&settings(), &appointment());
        assert!(n.text.ends_with(": fully booked"));
    }

    #[test]
    fn proposals_go_to_operators() {
        let mut appt = appointment();
        appt.proposed_start_at = Some(appt.start_at + Duration::hours(2));
        let n = reschedule_proposed(&settings(), &appt);
        assert_eq!(n.recipient, Recipient::Operators);
        assert!(n.text.contains("16:00"));
    }

    #[test]
    fn times_use_calendar_timezone() {
        let amsterdam = CalendarSettings::default();
        let n = booked(&amsterdam, &appointment());
        // CET is UTC+1 in early March.
        assert!(n.text.contains("15:00"));
    }
}
