//! Blocked intervals and break rules.

use bookwell_core::break_rules::{validate_rule, RepeatKind, DEFAULT_BREAK_REASON};
use bookwell_core::error::CoreError;
use bookwell_core::interval::Interval;
use bookwell_core::settings::{weekday_index, CalendarSettings};
use bookwell_core::slot_key::BREAK_EXPANSION_LOCK_ID;
use bookwell_core::types::DbId;
use bookwell_db::models::blocked_interval::{BlockedInterval, CreateBlockedInterval};
use bookwell_db::models::break_rule::{BreakRule, CreateBreakRule};
use bookwell_db::repositories::{BlockedIntervalRepo, BreakRuleRepo};
use bookwell_db::reservation::{acquire_xact_lock, check_slot, SlotCheck};
use chrono::Duration;
use serde::Serialize;

use super::BookingEngine;
use crate::error::{ensure_free, EngineResult};

/// Outcome of one expansion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExpansionReport {
    pub created: u64,
    /// Dates whose occurrence overlapped an appointment or another block.
    pub skipped: u64,
}

impl BookingEngine {
    /// Block a range of time. Fails with a conflict when it overlaps an
    /// active appointment or an existing block.
    pub async fn create_blocked_interval(
        &self,
        input: &CreateBlockedInterval,
    ) -> EngineResult<BlockedInterval> {
        let interval = Interval::new(input.start_at, input.end_at)?;

        let mut tx = self.pool.begin().await?;
        ensure_free(check_slot(&mut *tx, interval, None).await?)?;
        let blocked = BlockedIntervalRepo::insert(&mut *tx, input).await?;
        tx.commit().await?;

        tracing::info!(
            blocked_interval_id = blocked.id,
            start_at = %blocked.start_at,
            end_at = %blocked.end_at,
            "Blocked interval created"
        );
        Ok(blocked)
    }

    /// Returns `false` when the block did not exist.
    pub async fn delete_blocked_interval(&self, id: DbId) -> EngineResult<bool> {
        let deleted = BlockedIntervalRepo::delete(&self.pool, id).await?;
        if deleted {
            tracing::info!(blocked_interval_id = id, "Blocked interval deleted");
        }
        Ok(deleted)
    }

    /// Store a break rule. It takes effect at the next expansion.
    ///
    /// A weekly rule repeats on the weekday of its start date; an explicit
    /// weekday must agree with it.
    pub async fn create_break_rule(&self, input: &CreateBreakRule) -> EngineResult<BreakRule> {
        validate_rule(i64::from(input.duration_min))?;
        if let Some(weekday) = input.weekday {
            if !(0..=6).contains(&weekday) {
                return Err(CoreError::Validation(format!(
                    "Weekday must be between 0 and 6, got {weekday}"
                ))
                .into());
            }
        }

        let mut input = input.clone();
        if input.repeat == RepeatKind::Weekly {
            let anchor = i16::from(weekday_index(input.start_date));
            match input.weekday {
                Some(weekday) if weekday != anchor => {
                    return Err(CoreError::Validation(format!(
                        "Weekly break weekday {weekday} does not match start date {} (weekday {anchor})",
                        input.start_date
                    ))
                    .into());
                }
                _ => input.weekday = Some(anchor),
            }
        }

        let rule = BreakRuleRepo::create(&self.pool, &input).await?;
        tracing::info!(break_rule_id = rule.id, repeat = %rule.repeat, "Break rule created");
        Ok(rule)
    }

    /// Delete a rule together with the blocks it generated from now on.
    /// Past blocks stay as history.
    pub async fn delete_break_rule(&self, id: DbId) -> EngineResult<bool> {
        let mut tx = self.pool.begin().await?;
        let removed_blocks =
            BlockedIntervalRepo::delete_generated_from(&mut *tx, id, self.now()).await?;
        let deleted = BreakRuleRepo::delete(&mut *tx, id).await?;
        tx.commit().await?;

        if deleted {
            tracing::info!(break_rule_id = id, removed_blocks, "Break rule deleted");
        }
        Ok(deleted)
    }

    /// Materialise every recurring rule through `today + horizon_days`.
    ///
    /// Serialised by a global advisory lock. Dates already covered by a
    /// rule's high-water mark are not revisited, so a second run with the
    /// same horizon creates nothing.
    pub async fn expand_break_rules(
        &self,
        settings: &CalendarSettings,
        horizon_days: u32,
    ) -> EngineResult<ExpansionReport> {
        let through = settings.today(self.now()) + Duration::days(i64::from(horizon_days));
        let mut report = ExpansionReport::default();

        let mut tx = self.pool.begin().await?;
        acquire_xact_lock(&mut *tx, BREAK_EXPANSION_LOCK_ID).await?;

        for rule in BreakRuleRepo::list(&mut *tx).await? {
            let schedule = rule.schedule()?;
            let dates = schedule.due_dates(through, &settings.work_days);
            let Some(last) = dates.last().copied() else {
                continue;
            };
            let reason = rule
                .reason
                .clone()
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_BREAK_REASON.to_string());

            for day in dates {
                let interval = schedule.occurrence(settings, day)?;
                match check_slot(&mut *tx, interval, None).await? {
                    SlotCheck::Free => {
                        BlockedIntervalRepo::insert(
                            &mut *tx,
                            &CreateBlockedInterval {
                                start_at: interval.start,
                                end_at: interval.end,
                                reason: reason.clone(),
                                created_by: rule.created_by.clone(),
                                break_rule_id: Some(rule.id),
                            },
                        )
                        .await?;
                        report.created += 1;
                    }
                    conflict => {
                        tracing::debug!(
                            break_rule_id = rule.id,
                            %day,
                            ?conflict,
                            "Break occurrence skipped"
                        );
                        report.skipped += 1;
                    }
                }
            }
            BreakRuleRepo::advance_generated(&mut *tx, rule.id, last).await?;
        }
        tx.commit().await?;

        if report.created > 0 || report.skipped > 0 {
            tracing::info!(
                created = report.created,
                skipped = report.skipped,
                %through,
                "Break rules expanded"
            );
        }
        Ok(report)
    }
}
