//! Property tests for the calculation pipeline.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use proptest::prelude::*;
use uuid::Uuid;

use worktime_engine::calculation::{
    DayInput, aggregate_month, apply_arrival_tolerance, calculate_break_deduction,
    calculate_daily_result, pair_bookings,
};
use worktime_engine::models::{
    BookingCategory, BookingEvent, BookingPair, BreakKind, BreakRule, CreditType, DailyResult,
    DayChangeBehavior, DayContext, Direction, Minutes, MonthlyConfig, PairBoundary,
    ScheduleCatalog, ScheduleConfig, ScheduleType, TimeWindow, Tolerance,
};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 12).unwrap()
}

fn employee() -> Uuid {
    Uuid::from_u128(42)
}

fn schedule() -> ScheduleConfig {
    ScheduleConfig {
        arrival_window: Some(TimeWindow::new(420, 540)),
        departure_window: Some(TimeWindow::new(900, 1080)),
        tolerance: Tolerance {
            arrival_plus: 5,
            arrival_minus: 5,
            departure_plus: 5,
            departure_minus: 5,
        },
        breaks: vec![
            BreakRule {
                kind: BreakKind::Fixed,
                window: Some(TimeWindow::new(720, 750)),
                after_work_minutes: None,
                duration: 30,
                proportional: false,
                paid: false,
            },
            BreakRule {
                kind: BreakKind::Minimum,
                window: None,
                after_work_minutes: Some(360),
                duration: 45,
                proportional: true,
                paid: false,
            },
        ],
        max_net_minutes: Some(600),
        ..ScheduleConfig::new("FLEX", ScheduleType::Flextime, 480)
    }
}

prop_compose! {
    /// An even number of distinct same-day times, alternating arrival and departure.
    fn arb_stamps()(
        times in proptest::collection::btree_set(0..1440i32, 2..12),
    ) -> Vec<Minutes> {
        let mut times: Vec<Minutes> = times.into_iter().collect();
        if times.len() % 2 == 1 {
            times.pop();
        }
        times
    }
}

fn bookings_for(times: &[Minutes]) -> Vec<BookingEvent> {
    times
        .iter()
        .enumerate()
        .map(|(i, &t)| {
            let direction = if i % 2 == 0 {
                Direction::Arrival
            } else {
                Direction::Departure
            };
            BookingEvent::with_id(
                Uuid::from_u128(i as u128 + 1),
                employee(),
                date(),
                direction,
                BookingCategory::Work,
                t,
            )
            .unwrap()
        })
        .collect()
}

fn work_pair(start: Minutes, end: Minutes) -> BookingPair {
    BookingPair::closed(
        PairBoundary::synthesized(start),
        PairBoundary::synthesized(end),
        BookingCategory::Work,
    )
}

fn day_result(day: u32, overtime: Minutes, undertime: Minutes) -> DailyResult {
    let date = NaiveDate::from_ymd_opt(2026, 5, day).unwrap();
    let mut result = DailyResult::new(employee(), date, "FLEX", 480, 2);
    result.overtime_minutes = overtime;
    result.undertime_minutes = undertime;
    result
}

fn arb_credit_type() -> impl Strategy<Value = CreditType> {
    prop_oneof![
        Just(CreditType::None),
        Just(CreditType::FullCarryover),
        Just(CreditType::ThresholdCarryover),
        Just(CreditType::ZeroFloor),
    ]
}

proptest! {
    #[test]
    fn test_daily_result_is_idempotent(times in arb_stamps()) {
        let input = DayInput {
            employee_id: employee(),
            date: date(),
            bookings: bookings_for(&times),
            schedule: schedule(),
            day: DayContext::workday(),
        };
        let catalog = ScheduleCatalog::default();

        let first = calculate_daily_result(&input, &catalog).unwrap();
        let second = calculate_daily_result(&input, &catalog).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_pairing_conserves_time(times in arb_stamps()) {
        let bookings = bookings_for(&times);
        let calculated: BTreeMap<Uuid, Minutes> =
            bookings.iter().map(|b| (b.id, b.edited_time())).collect();

        let result = pair_bookings(&bookings, &calculated, date(), DayChangeBehavior::None).unwrap();

        prop_assert_eq!(result.pairs.len(), times.len() / 2);
        let paired: Minutes = result.pairs.iter().map(|p| p.duration).sum();
        let gaps: Minutes = result
            .pairs
            .windows(2)
            .map(|w| w[1].start() - w[0].end().unwrap())
            .sum();
        prop_assert_eq!(paired + gaps, times[times.len() - 1] - times[0]);
    }

    #[test]
    fn test_arrival_tolerance_boundary(actual in 0..1440i32, plus in 0..60i32) {
        let window = TimeWindow::new(480, 510);
        let tolerance = Tolerance { arrival_plus: plus, ..Tolerance::default() };

        let adjusted = apply_arrival_tolerance(actual, window, &tolerance, false);

        if actual > window.end && actual <= window.end + plus {
            prop_assert_eq!(adjusted, window.end);
        } else {
            prop_assert_eq!(adjusted, actual);
        }
    }

    #[test]
    fn test_breaks_never_exceed_gross(
        start in 0..1200i32,
        length in 0..240i32,
        second in 0..600i32,
    ) {
        let pairs = vec![work_pair(start, start + length), work_pair(start + length, start + length + second)];
        let gross: Minutes = pairs.iter().map(|p| p.duration).sum();

        let result = calculate_break_deduction(&pairs, &[], gross, &schedule().breaks);

        prop_assert!(result.total_minutes <= gross);
        prop_assert!(result.total_minutes >= 0);
    }

    #[test]
    fn test_net_bounded_by_gross_minus_breaks(times in arb_stamps()) {
        let input = DayInput {
            employee_id: employee(),
            date: date(),
            bookings: bookings_for(&times),
            schedule: schedule(),
            day: DayContext::workday(),
        };

        let result = calculate_daily_result(&input, &ScheduleCatalog::default()).unwrap();

        prop_assert!(result.capping.total <= result.gross_minutes);
        prop_assert!(result.net_minutes >= 0);
        prop_assert!(result.net_minutes <= result.gross_minutes - result.break_minutes);
        prop_assert!(result.net_minutes <= 600);
    }

    #[test]
    fn test_monthly_balance_within_caps(
        credit_type in arb_credit_type(),
        previous in -3000..3000i32,
        deltas in proptest::collection::vec(-300..300i32, 1..20),
        cap in 0..2000i32,
        threshold in 0..500i32,
    ) {
        let days: Vec<DailyResult> = deltas
            .iter()
            .enumerate()
            .map(|(i, &d)| day_result(i as u32 + 1, d.max(0), (-d).max(0)))
            .collect();
        let config = MonthlyConfig {
            credit_type,
            threshold,
            max_positive_balance: Some(cap),
            max_negative_balance: Some(cap),
            ..MonthlyConfig::default()
        };

        let result = aggregate_month(employee(), 2026, 5, &days, previous, &config).unwrap();

        prop_assert!(result.flextime_after.abs() <= cap);
        prop_assert_eq!(result.flextime_change, result.flextime_after - previous);
        match credit_type {
            CreditType::None => prop_assert_eq!(result.flextime_after, 0),
            CreditType::ZeroFloor => prop_assert!(result.flextime_after >= 0),
            _ => {}
        }
    }
}
