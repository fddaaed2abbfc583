//! The daily calculation pipeline.
//!
//! [`calculate_daily_result`] evaluates one employee-day in a fixed order:
//!
//! 1. validate the bookings and the assigned schedule;
//! 2. credit days without bookings per holiday credit or no-booking behaviour;
//! 3. normalize booking times and detect the effective schedule, normalizing
//!    again if detection switched schedules;
//! 4. pair bookings and flag unpaired ones;
//! 5. flag arrival, departure and core-time violations;
//! 6. deduct breaks, apply capping and the net-time ceiling;
//! 7. flag minimum work time and settle overtime against the target.
//!
//! Business-rule findings are recorded as codes on the result. Only malformed
//! input or configuration returns an error.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditTrail, BookingCategory, BookingEvent, BookingPair, DailyResult, DayContext, ErrorCode,
    NoBookingBehavior, ScheduleCatalog, ScheduleConfig, WarningCode, validate_minutes,
};

use super::breaks::calculate_break_deduction;
use super::capping::{aggregate_capping, calculate_max_net_time_capping, calculate_window_capping};
use super::pairing::{pair_bookings, relative_minutes};
use super::shift_detection::{ShiftMatch, detect_shift};
use super::tolerance::normalize_bookings;

/// Everything needed to evaluate one employee-day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayInput {
    /// The employee.
    pub employee_id: Uuid,
    /// The evaluated date.
    pub date: NaiveDate,
    /// Bookings dated on the day, plus neighbouring-day bookings of shifts crossing midnight.
    pub bookings: Vec<BookingEvent>,
    /// The schedule assigned to the day.
    pub schedule: ScheduleConfig,
    /// Holiday information for the day.
    #[serde(default)]
    pub day: DayContext,
}

fn validate_bookings(input: &DayInput) -> EngineResult<()> {
    let mut seen = BTreeSet::new();
    for booking in &input.bookings {
        if booking.employee_id != input.employee_id {
            return Err(EngineError::InvalidBooking {
                booking_id: booking.id,
                message: format!(
                    "belongs to employee {}, not {}",
                    booking.employee_id, input.employee_id
                ),
            });
        }
        if !seen.insert(booking.id) {
            return Err(EngineError::InvalidBooking {
                booking_id: booking.id,
                message: "duplicate booking id".to_string(),
            });
        }
        let time = validate_minutes(booking.id, booking.edited_time())?;
        relative_minutes(booking, time, input.date)?;
    }
    Ok(())
}

/// Calculates the daily result for one employee-day.
///
/// `catalog` resolves the assigned schedule's alternatives for shift
/// detection.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use uuid::Uuid;
/// use worktime_engine::calculation::{DayInput, calculate_daily_result};
/// use worktime_engine::models::{
///     BookingCategory, BookingEvent, DayContext, DayStatus, Direction, ScheduleCatalog,
///     ScheduleConfig, ScheduleType,
/// };
///
/// let employee = Uuid::new_v4();
/// let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let input = DayInput {
///     employee_id: employee,
///     date,
///     bookings: vec![
///         BookingEvent::new(employee, date, Direction::Arrival, BookingCategory::Work, 480).unwrap(),
///         BookingEvent::new(employee, date, Direction::Departure, BookingCategory::Work, 1020).unwrap(),
///     ],
///     schedule: ScheduleConfig::new("FLEX", ScheduleType::Flextime, 480),
///     day: DayContext::workday(),
/// };
///
/// let result = calculate_daily_result(&input, &ScheduleCatalog::default()).unwrap();
/// assert_eq!(result.gross_minutes, 540);
/// assert_eq!(result.overtime_minutes, 60);
/// assert_eq!(result.status, DayStatus::Ok);
/// ```
pub fn calculate_daily_result(input: &DayInput, catalog: &ScheduleCatalog) -> EngineResult<DailyResult> {
    validate_bookings(input)?;
    input.schedule.validate()?;

    let date = input.date;
    let bookings = &input.bookings;
    let mut trail = AuditTrail::default();

    if !bookings.iter().any(|b| b.date == date) {
        return Ok(credit_day_without_bookings(input, trail));
    }

    let preliminary = normalize_bookings(bookings, &input.schedule, date)?;
    let detection = detect_shift(
        &input.schedule,
        catalog,
        preliminary.first_arrival,
        preliminary.last_departure,
    )?;
    let schedule = detection.schedule;
    trail.record(
        "shift_detection",
        "Shift Detection",
        json!({
            "assigned": input.schedule.code,
            "first_arrival": preliminary.first_arrival,
            "last_departure": preliminary.last_departure,
        }),
        json!({ "schedule": schedule.code, "matched": detection.matched }),
        match &detection.matched {
            ShiftMatch::NotConfigured => "No detection windows configured, assigned schedule used".to_string(),
            ShiftMatch::Assigned => "Assigned schedule's detection windows matched".to_string(),
            ShiftMatch::Alternative { index, code } => {
                format!("Alternative {} ({}) matched the booked times", index + 1, code)
            }
            ShiftMatch::NoMatch => "No schedule matched, assigned schedule kept".to_string(),
        },
    );

    let normalization = if schedule.code == input.schedule.code {
        preliminary
    } else {
        normalize_bookings(bookings, schedule, date)?
    };
    trail.record(
        "normalization",
        "Tolerance and Rounding",
        json!({ "bookings": bookings.len(), "schedule": schedule.code }),
        json!({
            "adjusted": normalization.adjusted,
            "first_arrival": normalization.first_arrival,
            "last_departure": normalization.last_departure,
        }),
        format!("{} booking times adjusted", normalization.adjusted),
    );

    let mut result = DailyResult::new(
        input.employee_id,
        date,
        schedule.code.clone(),
        schedule.target_minutes,
        bookings.len(),
    );
    for warning in detection.warnings {
        result.add_warning(warning);
    }
    result.first_arrival = normalization.first_arrival;
    result.last_departure = normalization.last_departure;

    let pairing = pair_bookings(
        bookings,
        &normalization.calculated_times,
        date,
        schedule.day_change_behavior,
    )?;
    result.calculated_times = normalization.calculated_times;
    for warning in &pairing.warnings {
        result.add_warning(*warning);
    }
    if !pairing.unpaired_arrivals.is_empty() {
        result.add_error(ErrorCode::MissingDeparture);
    }
    if !pairing.unpaired_departures.is_empty() {
        result.add_error(ErrorCode::MissingArrival);
    }
    trail.record(
        "pairing",
        "Booking Pairing",
        json!({ "day_change_behavior": schedule.day_change_behavior }),
        json!({
            "pairs": pairing.pairs.len(),
            "carried_pairs": pairing.carried_pairs.len(),
            "unpaired_arrivals": pairing.unpaired_arrivals.len(),
            "unpaired_departures": pairing.unpaired_departures.len(),
        }),
        format!(
            "{} pairs credited today, {} carried to a neighbouring day",
            pairing.pairs.len(),
            pairing.carried_pairs.len()
        ),
    );

    flag_time_windows(&mut result, schedule);

    let work_pairs: Vec<BookingPair> = pairing.pairs_of(BookingCategory::Work).cloned().collect();
    let break_pairs: Vec<BookingPair> = pairing.pairs_of(BookingCategory::Break).cloned().collect();
    result.gross_minutes = work_pairs.iter().map(|p| p.duration).sum();

    let breaks = calculate_break_deduction(
        &work_pairs,
        &break_pairs,
        result.gross_minutes,
        &schedule.breaks,
    );
    result.break_minutes = breaks.total_minutes;
    for warning in &breaks.warnings {
        result.add_warning(*warning);
    }
    trail.record(
        "break_deduction",
        "Break Deduction",
        json!({ "gross_minutes": result.gross_minutes, "rules": schedule.breaks.len() }),
        json!({
            "recorded_minutes": breaks.recorded_minutes,
            "deducted_minutes": breaks.deducted_minutes,
            "total_minutes": breaks.total_minutes,
        }),
        format!(
            "{} minutes booked as break, {} deducted by rules",
            breaks.recorded_minutes, breaks.deducted_minutes
        ),
    );

    let window_capping = calculate_window_capping(&work_pairs, schedule);
    let uncapped = (result.gross_minutes - breaks.total_minutes - window_capping.total).max(0);
    let (net, max_item) = calculate_max_net_time_capping(uncapped, schedule.max_net_minutes);
    if max_item.is_some() {
        result.add_warning(WarningCode::MaxTimeReached);
    }
    result.net_minutes = net;
    result.capping = aggregate_capping(window_capping.items.into_iter().chain(max_item));
    trail.record(
        "capping",
        "Capping",
        json!({
            "gross_minutes": result.gross_minutes,
            "break_minutes": result.break_minutes,
            "max_net_minutes": schedule.max_net_minutes,
        }),
        json!({ "capped_minutes": result.capping.total, "net_minutes": result.net_minutes }),
        format!("{} minutes excluded from credit", result.capping.total),
    );

    if let Some(min) = schedule.min_net_minutes {
        if result.net_minutes < min {
            result.add_error(ErrorCode::BelowMinWorkTime);
        }
    }

    result.settle_balance();
    trail.record(
        "balance",
        "Overtime and Undertime",
        json!({ "net_minutes": result.net_minutes, "target_minutes": result.target_minutes }),
        json!({
            "overtime_minutes": result.overtime_minutes,
            "undertime_minutes": result.undertime_minutes,
        }),
        format!(
            "Net {} against target {}",
            result.net_minutes, result.target_minutes
        ),
    );

    result.pairs = pairing.pairs;
    result.carried_pairs = pairing.carried_pairs;
    result.unpaired_arrivals = pairing.unpaired_arrivals;
    result.unpaired_departures = pairing.unpaired_departures;
    result.audit_steps = trail.into_steps();
    result.finalize_status();

    if result.has_error() {
        warn!(
            employee_id = %input.employee_id,
            date = %date,
            errors = ?result.error_codes,
            "Daily result needs correction"
        );
    }
    debug!(
        employee_id = %input.employee_id,
        date = %date,
        schedule = %result.schedule_code,
        net = result.net_minutes,
        target = result.target_minutes,
        "Calculated daily result"
    );

    Ok(result)
}

fn flag_time_windows(result: &mut DailyResult, schedule: &ScheduleConfig) {
    if let (Some(window), Some(first)) = (schedule.arrival_window, result.first_arrival) {
        if first < window.start {
            result.add_error(ErrorCode::EarlyArrival);
        } else if first > window.end {
            result.add_error(ErrorCode::LateArrival);
        }
    }
    if let (Some(window), Some(last)) = (schedule.departure_window, result.last_departure) {
        if last < window.start {
            result.add_error(ErrorCode::EarlyDeparture);
        } else if last > window.end {
            result.add_error(ErrorCode::LateDeparture);
        }
    }
    if schedule.is_flextime() {
        if let Some(core) = schedule.core_window {
            if result.first_arrival.is_some_and(|first| first > core.start) {
                result.add_error(ErrorCode::MissedCoreStart);
            }
            if result.last_departure.is_some_and(|last| last < core.end) {
                result.add_error(ErrorCode::MissedCoreEnd);
            }
        }
    }
}

fn credit_day_without_bookings(input: &DayInput, mut trail: AuditTrail) -> DailyResult {
    let schedule = &input.schedule;
    let mut result = DailyResult::new(
        input.employee_id,
        input.date,
        schedule.code.clone(),
        schedule.target_minutes,
        input.bookings.len(),
    );

    let reasoning = if let Some(category) = input.day.holiday {
        result.net_minutes = schedule
            .holiday_credits
            .get(&category)
            .copied()
            .unwrap_or(schedule.target_minutes);
        result.add_warning(WarningCode::HolidayCredited);
        result.settle_balance();
        format!(
            "Holiday category {} credited with {} minutes",
            category, result.net_minutes
        )
    } else {
        match schedule.no_booking_behavior {
            NoBookingBehavior::Error if schedule.target_minutes == 0 => {
                "No bookings and no target, nothing to credit".to_string()
            }
            NoBookingBehavior::Error => {
                result.add_error(ErrorCode::NoBookings);
                "No bookings on a day with target time".to_string()
            }
            NoBookingBehavior::DeductTarget => {
                result.settle_balance();
                format!("Target of {} minutes booked as undertime", schedule.target_minutes)
            }
            NoBookingBehavior::VocationalSchool => {
                result.net_minutes = schedule.target_minutes;
                result.add_warning(WarningCode::VocationalSchoolDay);
                result.settle_balance();
                "Target credited as vocational school day".to_string()
            }
            NoBookingBehavior::AdoptTarget => {
                result.net_minutes = schedule.target_minutes;
                result.settle_balance();
                "Target adopted as worked time".to_string()
            }
            NoBookingBehavior::TargetWithOrder => {
                result.net_minutes = schedule.target_minutes;
                result.add_warning(WarningCode::TargetCreditedToOrder);
                result.settle_balance();
                "Target credited to the default order".to_string()
            }
        }
    };

    trail.record(
        "no_bookings",
        "Day Without Bookings",
        json!({
            "holiday": input.day.holiday,
            "no_booking_behavior": schedule.no_booking_behavior,
            "target_minutes": schedule.target_minutes,
        }),
        json!({
            "net_minutes": result.net_minutes,
            "undertime_minutes": result.undertime_minutes,
        }),
        reasoning,
    );
    result.audit_steps = trail.into_steps();
    result.finalize_status();

    debug!(
        employee_id = %input.employee_id,
        date = %input.date,
        net = result.net_minutes,
        "Credited day without bookings"
    );

    result
}

/// Writes the calculated times of `result` back onto the bookings.
///
/// Bookings not covered by the result are left unchanged.
pub fn write_back_calculated_times(
    bookings: &mut [BookingEvent],
    result: &DailyResult,
) -> EngineResult<()> {
    for booking in bookings.iter_mut() {
        if let Some(&minutes) = result.calculated_times.get(&booking.id) {
            booking.set_calculated_time(minutes)?;
        }
    }
    Ok(())
}
