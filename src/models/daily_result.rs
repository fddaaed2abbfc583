//! The verified result of one employee-day.
//!
//! This module contains [`DailyResult`] and the structures recorded alongside
//! it: capping entries, the day context and the audit trail.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::booking::BookingPair;
use super::clock::Minutes;
use super::codes::{ErrorCode, WarningCode, push_unique};
use super::schedule::HolidayCategory;

/// Calendar facts about the evaluated day supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayContext {
    /// Holiday category if the day is a public holiday.
    #[serde(default)]
    pub holiday: Option<HolidayCategory>,
}

impl DayContext {
    /// A regular working day.
    pub fn workday() -> Self {
        Self { holiday: None }
    }

    /// A public holiday of the given category.
    pub fn holiday(category: HolidayCategory) -> Self {
        Self {
            holiday: Some(category),
        }
    }

    /// Returns true for public holidays.
    pub fn is_holiday(&self) -> bool {
        self.holiday.is_some()
    }
}

/// Where excluded minutes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CappingSource {
    /// Work before the evaluation window start.
    EarlyArrival,
    /// Work after the evaluation window end.
    LateDeparture,
    /// Net time above the schedule's ceiling.
    MaxNetTime,
}

/// One batch of minutes excluded from credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CappingItem {
    /// Minutes excluded.
    pub minutes: Minutes,
    /// The rule that excluded them.
    pub source: CappingSource,
    /// Human-readable explanation.
    pub reason: String,
}

/// All capping entries for a day and their total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CappingResult {
    /// Individual entries, in the order they were applied.
    pub items: Vec<CappingItem>,
    /// Sum of all entries.
    pub total: Minutes,
}

impl CappingResult {
    /// Adds an entry; zero-minute entries are dropped.
    pub fn push(&mut self, item: CappingItem) {
        if item.minutes > 0 {
            self.total += item.minutes;
            self.items.push(item);
        }
    }

    /// Minutes excluded by a single source.
    pub fn minutes_for(&self, source: CappingSource) -> Minutes {
        self.items
            .iter()
            .filter(|item| item.source == source)
            .map(|item| item.minutes)
            .sum()
    }
}

/// A single step in the audit trail recording a calculation decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// Identifier of the rule that was applied.
    pub rule_id: String,
    /// Human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Explanation of the decision.
    pub reasoning: String,
}

/// Appends audit steps with consecutive numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditTrail {
    steps: Vec<AuditStep>,
}

impl AuditTrail {
    /// Records a step.
    pub fn record(
        &mut self,
        rule_id: &str,
        rule_name: &str,
        input: serde_json::Value,
        output: serde_json::Value,
        reasoning: impl Into<String>,
    ) {
        let step_number = self.steps.len() as u32 + 1;
        self.steps.push(AuditStep {
            step_number,
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            input,
            output,
            reasoning: reasoning.into(),
        });
    }

    /// Returns the recorded steps.
    pub fn into_steps(self) -> Vec<AuditStep> {
        self.steps
    }
}

/// Overall state of a calculated day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    /// Nothing to report.
    Ok,
    /// Warnings only.
    Warning,
    /// At least one error code; needs correction.
    Error,
}

/// The verified result of one employee-day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyResult {
    /// The employee the day belongs to.
    pub employee_id: Uuid,
    /// The evaluated date.
    pub date: NaiveDate,
    /// Code of the schedule the day was evaluated against.
    pub schedule_code: String,
    /// Sum of work pair durations.
    pub gross_minutes: Minutes,
    /// Credited minutes after breaks and capping.
    pub net_minutes: Minutes,
    /// Target minutes of the schedule.
    pub target_minutes: Minutes,
    /// Net minutes above target.
    pub overtime_minutes: Minutes,
    /// Target minutes not reached.
    pub undertime_minutes: Minutes,
    /// Booked plus deducted break minutes.
    pub break_minutes: Minutes,
    /// First arrival of the day.
    pub first_arrival: Option<Minutes>,
    /// Last departure of the day.
    pub last_departure: Option<Minutes>,
    /// Number of bookings supplied.
    pub booking_count: usize,
    /// Calculated time per booking, for the caller to write back.
    pub calculated_times: BTreeMap<Uuid, Minutes>,
    /// Pairs credited to this day.
    pub pairs: Vec<BookingPair>,
    /// Pair segments that belong to the previous or next day.
    pub carried_pairs: Vec<BookingPair>,
    /// Arrivals without a departure.
    pub unpaired_arrivals: Vec<Uuid>,
    /// Departures without an arrival.
    pub unpaired_departures: Vec<Uuid>,
    /// Minutes excluded from credit, by source.
    pub capping: CappingResult,
    /// Business-rule violations.
    pub error_codes: Vec<ErrorCode>,
    /// Non-blocking findings.
    pub warnings: Vec<WarningCode>,
    /// Overall status derived from the codes.
    pub status: DayStatus,
    /// Audit trail of the pipeline.
    pub audit_steps: Vec<AuditStep>,
}

impl DailyResult {
    /// Seeds an empty result with the target and booking count.
    pub fn new(
        employee_id: Uuid,
        date: NaiveDate,
        schedule_code: impl Into<String>,
        target_minutes: Minutes,
        booking_count: usize,
    ) -> Self {
        Self {
            employee_id,
            date,
            schedule_code: schedule_code.into(),
            gross_minutes: 0,
            net_minutes: 0,
            target_minutes,
            overtime_minutes: 0,
            undertime_minutes: 0,
            break_minutes: 0,
            first_arrival: None,
            last_departure: None,
            booking_count,
            calculated_times: BTreeMap::new(),
            pairs: Vec::new(),
            carried_pairs: Vec::new(),
            unpaired_arrivals: Vec::new(),
            unpaired_departures: Vec::new(),
            capping: CappingResult::default(),
            error_codes: Vec::new(),
            warnings: Vec::new(),
            status: DayStatus::Ok,
            audit_steps: Vec::new(),
        }
    }

    /// Records an error code once.
    pub fn add_error(&mut self, code: ErrorCode) {
        push_unique(&mut self.error_codes, code);
    }

    /// Records a warning code once.
    pub fn add_warning(&mut self, code: WarningCode) {
        push_unique(&mut self.warnings, code);
    }

    /// Returns true if any error code was recorded.
    pub fn has_error(&self) -> bool {
        !self.error_codes.is_empty()
    }

    /// Sets overtime and undertime from net and target.
    pub fn settle_balance(&mut self) {
        self.overtime_minutes = (self.net_minutes - self.target_minutes).max(0);
        self.undertime_minutes = (self.target_minutes - self.net_minutes).max(0);
    }

    /// Derives the status from the recorded codes.
    pub fn finalize_status(&mut self) {
        self.status = if self.has_error() {
            DayStatus::Error
        } else if !self.warnings.is_empty() {
            DayStatus::Warning
        } else {
            DayStatus::Ok
        };
    }

    /// Signed balance of the day (overtime minus undertime).
    pub fn balance(&self) -> Minutes {
        self.overtime_minutes - self.undertime_minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> DailyResult {
        DailyResult::new(
            Uuid::nil(),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            "FIX",
            480,
            2,
        )
    }

    #[test]
    fn test_new_result_seeds_target_and_booking_count() {
        let result = result();
        assert_eq!(result.target_minutes, 480);
        assert_eq!(result.booking_count, 2);
        assert_eq!(result.status, DayStatus::Ok);
    }

    #[test]
    fn test_settle_balance_overtime() {
        let mut result = result();
        result.net_minutes = 510;
        result.settle_balance();
        assert_eq!(result.overtime_minutes, 30);
        assert_eq!(result.undertime_minutes, 0);
        assert_eq!(result.balance(), 30);
    }

    #[test]
    fn test_settle_balance_undertime() {
        let mut result = result();
        result.net_minutes = 400;
        result.settle_balance();
        assert_eq!(result.overtime_minutes, 0);
        assert_eq!(result.undertime_minutes, 80);
        assert_eq!(result.balance(), -80);
    }

    #[test]
    fn test_status_prefers_errors_over_warnings() {
        let mut result = result();
        result.add_warning(WarningCode::CrossMidnight);
        result.finalize_status();
        assert_eq!(result.status, DayStatus::Warning);

        result.add_error(ErrorCode::MissingDeparture);
        result.add_error(ErrorCode::MissingDeparture);
        result.finalize_status();
        assert_eq!(result.status, DayStatus::Error);
        assert_eq!(result.error_codes.len(), 1);
    }

    #[test]
    fn test_capping_result_drops_zero_entries() {
        let mut capping = CappingResult::default();
        capping.push(CappingItem {
            minutes: 0,
            source: CappingSource::EarlyArrival,
            reason: "nothing".to_string(),
        });
        capping.push(CappingItem {
            minutes: 15,
            source: CappingSource::LateDeparture,
            reason: "late".to_string(),
        });
        assert_eq!(capping.items.len(), 1);
        assert_eq!(capping.total, 15);
        assert_eq!(capping.minutes_for(CappingSource::LateDeparture), 15);
        assert_eq!(capping.minutes_for(CappingSource::EarlyArrival), 0);
    }

    #[test]
    fn test_audit_trail_numbers_steps() {
        let mut trail = AuditTrail::default();
        trail.record("a", "A", serde_json::json!({}), serde_json::json!({}), "first");
        trail.record("b", "B", serde_json::json!({}), serde_json::json!({}), "second");
        let steps = trail.into_steps();
        assert_eq!(steps[0].step_number, 1);
        assert_eq!(steps[1].step_number, 2);
        assert_eq!(steps[1].rule_id, "b");
    }

    #[test]
    fn test_daily_result_serialization() {
        let mut result = result();
        result.add_error(ErrorCode::NoBookings);
        result.finalize_status();
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"error_codes\":[\"NO_BOOKINGS\"]"));
        assert!(json.contains("\"status\":\"error\""));
        assert!(json.contains("\"date\":\"2026-03-02\""));
    }
}
