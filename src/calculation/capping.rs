//! Capping: minutes worked but excluded from credit.
//!
//! Three independent sources are recognised: work before the evaluation
//! window, work after it, and net time above the schedule's ceiling. Capping
//! reduces credited time only; the booked pairs are left untouched.

use tracing::debug;

use crate::models::{
    BookingPair, CappingItem, CappingResult, CappingSource, Minutes, ScheduleConfig, format_clock,
};

/// Work minutes before `limit`.
fn minutes_before(pairs: &[BookingPair], limit: Minutes) -> Minutes {
    pairs
        .iter()
        .filter_map(|p| p.end().map(|end| (end.min(limit) - p.start()).max(0)))
        .sum()
}

/// Work minutes after `limit`.
fn minutes_after(pairs: &[BookingPair], limit: Minutes) -> Minutes {
    pairs
        .iter()
        .filter_map(|p| p.end().map(|end| (end - p.start().max(limit)).max(0)))
        .sum()
}

/// Start of the evaluation window, extended by the early tolerance under variable work time.
pub fn evaluation_window_start(schedule: &ScheduleConfig) -> Option<Minutes> {
    schedule.arrival_window.map(|window| {
        if schedule.variable_work_time {
            window.start - schedule.tolerance.arrival_minus
        } else {
            window.start
        }
    })
}

/// End of the evaluation window including the late departure tolerance.
pub fn evaluation_window_end(schedule: &ScheduleConfig) -> Option<Minutes> {
    schedule
        .departure_window
        .map(|window| window.end + schedule.tolerance.departure_plus)
}

/// Early-arrival and late-departure capping for the credited work pairs.
///
/// # Example
///
/// ```
/// use uuid::Uuid;
/// use worktime_engine::calculation::calculate_window_capping;
/// use worktime_engine::models::{
///     BookingCategory, BookingPair, CappingSource, PairBoundary, ScheduleConfig, ScheduleType,
///     TimeWindow,
/// };
///
/// let schedule = ScheduleConfig {
///     arrival_window: Some(TimeWindow::new(420, 540)),
///     departure_window: Some(TimeWindow::new(900, 1140)),
///     ..ScheduleConfig::new("FLEX", ScheduleType::Flextime, 480)
/// };
/// let work = vec![BookingPair::closed(
///     PairBoundary::booked(Uuid::new_v4(), 390),
///     PairBoundary::booked(Uuid::new_v4(), 1170),
///     BookingCategory::Work,
/// )];
///
/// let capping = calculate_window_capping(&work, &schedule);
/// assert_eq!(capping.minutes_for(CappingSource::EarlyArrival), 30);
/// assert_eq!(capping.minutes_for(CappingSource::LateDeparture), 30);
/// assert_eq!(capping.total, 60);
/// ```
pub fn calculate_window_capping(work_pairs: &[BookingPair], schedule: &ScheduleConfig) -> CappingResult {
    let mut result = CappingResult::default();
    let start = evaluation_window_start(schedule);

    if let Some(start) = start {
        let minutes = minutes_before(work_pairs, start);
        result.push(CappingItem {
            minutes,
            source: CappingSource::EarlyArrival,
            reason: format!(
                "{} minutes worked before evaluation window start {}",
                minutes,
                format_clock(start)
            ),
        });
    }

    if let Some(end) = evaluation_window_end(schedule) {
        let limit = start.map_or(end, |start| end.max(start));
        let minutes = minutes_after(work_pairs, limit);
        result.push(CappingItem {
            minutes,
            source: CappingSource::LateDeparture,
            reason: format!(
                "{} minutes worked after evaluation window end {}",
                minutes,
                format_clock(limit)
            ),
        });
    }

    debug!(
        schedule = %schedule.code,
        total = result.total,
        "Calculated window capping"
    );

    result
}

/// Caps net time at the schedule maximum.
///
/// Returns the credited net minutes and the capping entry for the excess.
///
/// # Example
///
/// ```
/// use worktime_engine::calculation::calculate_max_net_time_capping;
///
/// let (net, item) = calculate_max_net_time_capping(640, Some(600));
/// assert_eq!(net, 600);
/// assert_eq!(item.unwrap().minutes, 40);
///
/// let (net, item) = calculate_max_net_time_capping(540, Some(600));
/// assert_eq!(net, 540);
/// assert!(item.is_none());
/// ```
pub fn calculate_max_net_time_capping(
    net_minutes: Minutes,
    max_net_minutes: Option<Minutes>,
) -> (Minutes, Option<CappingItem>) {
    match max_net_minutes {
        Some(max) if net_minutes > max => (
            max,
            Some(CappingItem {
                minutes: net_minutes - max,
                source: CappingSource::MaxNetTime,
                reason: format!("net time {} exceeds maximum {}", net_minutes, max),
            }),
        ),
        _ => (net_minutes, None),
    }
}

/// Combines capping entries into one result, dropping zero entries.
pub fn aggregate_capping(items: impl IntoIterator<Item = CappingItem>) -> CappingResult {
    let mut result = CappingResult::default();
    for item in items {
        result.push(item);
    }
    result
}
