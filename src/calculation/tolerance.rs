//! Tolerance and rounding of booking times.
//!
//! Normalization turns each booking's edited time into its calculated time.
//! Tolerance snaps the first arrival and last departure of the day onto the
//! configured window edges; rounding then moves times onto interval
//! boundaries. Break bookings and bookings dated on a neighbouring day keep
//! their edited time.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{
    BookingCategory, BookingEvent, Direction, LAST_MINUTE_OF_DAY, Minutes, RoundingConfig,
    RoundingMode, ScheduleConfig, TimeWindow, Tolerance, validate_minutes,
};

/// Calculated times for a day's bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationResult {
    /// Calculated time per booking.
    pub calculated_times: BTreeMap<Uuid, Minutes>,
    /// Calculated time of the first work arrival on the day.
    pub first_arrival: Option<Minutes>,
    /// Calculated time of the last work departure on the day.
    pub last_departure: Option<Minutes>,
    /// Number of bookings whose calculated time differs from the edited time.
    pub adjusted: usize,
}

/// Snaps an arrival onto the arrival window if it lies within tolerance.
///
/// `minus_enabled` allows the early band; fixed schedules only enable it
/// with variable work time.
///
/// # Example
///
/// ```
/// use worktime_engine::calculation::apply_arrival_tolerance;
/// use worktime_engine::models::{TimeWindow, Tolerance};
///
/// let window = TimeWindow::new(480, 480);
/// let tolerance = Tolerance { arrival_plus: 5, arrival_minus: 5, ..Tolerance::default() };
///
/// assert_eq!(apply_arrival_tolerance(483, window, &tolerance, false), 480);
/// assert_eq!(apply_arrival_tolerance(486, window, &tolerance, false), 486);
/// assert_eq!(apply_arrival_tolerance(476, window, &tolerance, false), 476);
/// assert_eq!(apply_arrival_tolerance(476, window, &tolerance, true), 480);
/// ```
pub fn apply_arrival_tolerance(
    actual: Minutes,
    window: TimeWindow,
    tolerance: &Tolerance,
    minus_enabled: bool,
) -> Minutes {
    if actual < window.start {
        if minus_enabled && window.start - actual <= tolerance.arrival_minus {
            return window.start;
        }
    } else if actual > window.end && actual - window.end <= tolerance.arrival_plus {
        return window.end;
    }
    actual
}

/// Snaps a departure onto the departure window if it lies within tolerance.
pub fn apply_departure_tolerance(
    actual: Minutes,
    window: TimeWindow,
    tolerance: &Tolerance,
) -> Minutes {
    if actual < window.start {
        if window.start - actual <= tolerance.departure_minus {
            return window.start;
        }
    } else if actual > window.end && actual - window.end <= tolerance.departure_plus {
        return window.end;
    }
    actual
}

/// Rounds a time per the configuration, clamped into the day.
///
/// # Example
///
/// ```
/// use worktime_engine::calculation::round_time;
/// use worktime_engine::models::{RoundingConfig, RoundingMode};
///
/// let up = RoundingConfig { mode: RoundingMode::Up, interval: 15, ..RoundingConfig::default() };
/// assert_eq!(round_time(481, &up), 495);
/// assert_eq!(round_time(480, &up), 480);
/// ```
pub fn round_time(minutes: Minutes, config: &RoundingConfig) -> Minutes {
    let interval = config.interval;
    let rounded = match config.mode {
        RoundingMode::None => minutes,
        RoundingMode::Up | RoundingMode::Down | RoundingMode::Nearest if interval <= 0 => minutes,
        RoundingMode::Up => {
            let rest = minutes.rem_euclid(interval);
            if rest == 0 {
                minutes
            } else {
                minutes - rest + interval
            }
        }
        RoundingMode::Down => minutes - minutes.rem_euclid(interval),
        RoundingMode::Nearest => {
            let rest = minutes.rem_euclid(interval);
            if rest * 2 >= interval {
                minutes - rest + interval
            } else {
                minutes - rest
            }
        }
        RoundingMode::Add => minutes + config.value,
        RoundingMode::Subtract => minutes - config.value,
    };
    rounded.clamp(0, LAST_MINUTE_OF_DAY)
}

fn same_day_work(
    bookings: &[BookingEvent],
    date: NaiveDate,
    direction: Direction,
) -> impl Iterator<Item = &BookingEvent> {
    bookings.iter().filter(move |b| {
        b.date == date && b.category == BookingCategory::Work && b.direction == direction
    })
}

/// Computes the calculated time of every booking under `schedule`.
///
/// Returns an error if a booking's edited time lies outside the day.
pub fn normalize_bookings(
    bookings: &[BookingEvent],
    schedule: &ScheduleConfig,
    date: NaiveDate,
) -> EngineResult<NormalizationResult> {
    let mut calculated_times = BTreeMap::new();
    for booking in bookings {
        calculated_times.insert(booking.id, validate_minutes(booking.id, booking.edited_time())?);
    }

    let first_arrival_id = same_day_work(bookings, date, Direction::Arrival)
        .min_by_key(|b| (b.edited_time(), b.id))
        .map(|b| b.id);
    let last_departure_id = same_day_work(bookings, date, Direction::Departure)
        .max_by_key(|b| (b.edited_time(), b.id))
        .map(|b| b.id);

    let minus_enabled = schedule.is_flextime() || schedule.variable_work_time;

    for booking in same_day_work(bookings, date, Direction::Arrival) {
        let is_first = Some(booking.id) == first_arrival_id;
        if !is_first && !schedule.arrival_rounding.apply_to_all {
            continue;
        }
        let mut time = booking.edited_time();
        if is_first {
            if let Some(window) = schedule.arrival_window {
                time = apply_arrival_tolerance(time, window, &schedule.tolerance, minus_enabled);
            }
        }
        time = round_time(time, &schedule.arrival_rounding);
        calculated_times.insert(booking.id, time);
    }

    for booking in same_day_work(bookings, date, Direction::Departure) {
        let is_last = Some(booking.id) == last_departure_id;
        if !is_last && !schedule.departure_rounding.apply_to_all {
            continue;
        }
        let mut time = booking.edited_time();
        if is_last {
            if let Some(window) = schedule.departure_window {
                time = apply_departure_tolerance(time, window, &schedule.tolerance);
            }
        }
        time = round_time(time, &schedule.departure_rounding);
        calculated_times.insert(booking.id, time);
    }

    let adjusted = bookings
        .iter()
        .filter(|b| calculated_times.get(&b.id) != Some(&b.edited_time()))
        .count();

    let first_arrival = first_arrival_id.and_then(|id| calculated_times.get(&id).copied());
    let last_departure = last_departure_id.and_then(|id| calculated_times.get(&id).copied());

    debug!(
        schedule = %schedule.code,
        date = %date,
        adjusted,
        ?first_arrival,
        ?last_departure,
        "Normalized booking times"
    );

    Ok(NormalizationResult {
        calculated_times,
        first_arrival,
        last_departure,
        adjusted,
    })
}
