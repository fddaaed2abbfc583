//! Surcharge calculation for work inside configured time windows.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineResult;
use crate::models::{
    BookingCategory, BookingPair, DayContext, MINUTES_PER_DAY, Minutes, SurchargeMode,
    SurchargeRule, TimeWindow,
};

use super::overlap::overlap;

/// Overlap with the window on the evaluated day and on both neighbouring days.
fn day_window_overlap(start: Minutes, end: Minutes, window: TimeWindow) -> Minutes {
    [-MINUTES_PER_DAY, 0, MINUTES_PER_DAY]
        .into_iter()
        .map(|offset| overlap(start, end, window.start + offset, window.end + offset))
        .sum()
}

/// A credit produced by one rule for one pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeLine {
    /// Account credited.
    pub account: String,
    /// Start of the pair, relative to the evaluated day.
    pub pair_start: Minutes,
    /// Minutes of the pair inside the rule window.
    pub overlap_minutes: Minutes,
    /// Credited amount.
    pub amount: Decimal,
}

/// Surcharge credits of one day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeResult {
    /// Individual credits.
    pub lines: Vec<SurchargeLine>,
    /// Total credit per account.
    pub credits: BTreeMap<String, Decimal>,
}

impl SurchargeResult {
    /// Total credited to one account.
    pub fn credit_for(&self, account: &str) -> Decimal {
        self.credits.get(account).copied().unwrap_or(Decimal::ZERO)
    }
}

/// Credits surcharge accounts for the day's credited work pairs.
///
/// Every rule is validated first; a wrapping or empty window is an error.
/// Break pairs and open pairs earn nothing. Rule windows are times of day, so
/// the part of a pair that runs into the next day is matched against the next
/// day's window.
///
/// # Example
///
/// ```
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
/// use worktime_engine::calculation::calculate_surcharges;
/// use worktime_engine::models::{
///     BookingCategory, BookingPair, DayContext, PairBoundary, SurchargeMode, SurchargeRule,
///     TimeWindow,
/// };
///
/// let pairs = vec![BookingPair::closed(
///     PairBoundary::booked(Uuid::new_v4(), 1260),
///     PairBoundary::synthesized(1440),
///     BookingCategory::Work,
/// )];
/// let rules = vec![SurchargeRule::new(
///     "NIGHT",
///     TimeWindow::new(1320, 1440),
///     SurchargeMode::PerMinute,
///     Decimal::ONE,
/// )];
///
/// let result = calculate_surcharges(&pairs, &rules, &DayContext::workday()).unwrap();
/// assert_eq!(result.credit_for("NIGHT"), Decimal::from(120));
/// ```
pub fn calculate_surcharges(
    pairs: &[BookingPair],
    rules: &[SurchargeRule],
    day: &DayContext,
) -> EngineResult<SurchargeResult> {
    for rule in rules {
        rule.validate()?;
    }

    let mut result = SurchargeResult::default();

    for rule in rules.iter().filter(|r| r.applies_to(day)) {
        for pair in pairs.iter().filter(|p| p.category == BookingCategory::Work) {
            let Some(end) = pair.end() else {
                continue;
            };
            let minutes = day_window_overlap(pair.start(), end, rule.window);
            if minutes == 0 {
                continue;
            }

            let amount = match rule.mode {
                SurchargeMode::Fixed => rule.value,
                SurchargeMode::PerMinute => Decimal::from(minutes) * rule.value,
                SurchargeMode::Percentage => {
                    Decimal::from(pair.duration) * rule.value / Decimal::ONE_HUNDRED
                }
            };

            *result
                .credits
                .entry(rule.account.clone())
                .or_insert(Decimal::ZERO) += amount;
            result.lines.push(SurchargeLine {
                account: rule.account.clone(),
                pair_start: pair.start(),
                overlap_minutes: minutes,
                amount,
            });
        }
    }

    debug!(
        lines = result.lines.len(),
        accounts = result.credits.len(),
        "Calculated surcharges"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::models::{PairBoundary, TimeWindow};
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn pair(start: Minutes, end: Minutes, category: BookingCategory) -> BookingPair {
        BookingPair::closed(
            PairBoundary::booked(Uuid::new_v4(), start),
            PairBoundary::booked(Uuid::new_v4(), end),
            category,
        )
    }

    fn rule(account: &str, start: Minutes, end: Minutes, mode: SurchargeMode, value: &str) -> SurchargeRule {
        SurchargeRule::new(account, TimeWindow::new(start, end), mode, dec(value))
    }

    #[test]
    fn test_per_minute_credit() {
        let pairs = vec![pair(1200, 1440, BookingCategory::Work)];
        let rules = vec![rule("NIGHT", 1320, 1440, SurchargeMode::PerMinute, "0.25")];
        let result = calculate_surcharges(&pairs, &rules, &DayContext::workday()).unwrap();
        assert_eq!(result.credit_for("NIGHT"), dec("30"));
        assert_eq!(result.lines[0].overlap_minutes, 120);
    }

    #[test]
    fn test_fixed_credit_per_overlapping_pair() {
        let pairs = vec![
            pair(300, 400, BookingCategory::Work),
            pair(420, 600, BookingCategory::Work),
            pair(700, 900, BookingCategory::Work),
        ];
        let rules = vec![rule("EARLY", 0, 480, SurchargeMode::Fixed, "5")];
        let result = calculate_surcharges(&pairs, &rules, &DayContext::workday()).unwrap();
        assert_eq!(result.credit_for("EARLY"), dec("10"));
        assert_eq!(result.lines.len(), 2);
    }

    #[test]
    fn test_percentage_uses_pair_duration() {
        let pairs = vec![pair(900, 1380, BookingCategory::Work)];
        let rules = vec![rule("EVENING", 1200, 1440, SurchargeMode::Percentage, "25")];
        let result = calculate_surcharges(&pairs, &rules, &DayContext::workday()).unwrap();
        assert_eq!(result.credit_for("EVENING"), dec("120"));
    }

    #[test]
    fn test_break_pairs_earn_nothing() {
        let pairs = vec![pair(1320, 1380, BookingCategory::Break)];
        let rules = vec![rule("NIGHT", 1320, 1440, SurchargeMode::PerMinute, "1")];
        let result = calculate_surcharges(&pairs, &rules, &DayContext::workday()).unwrap();
        assert!(result.credits.is_empty());
    }

    #[test]
    fn test_holiday_rule_skipped_on_workday() {
        let pairs = vec![pair(480, 990, BookingCategory::Work)];
        let holiday_rule = SurchargeRule {
            applies_on_holidays: true,
            applies_on_workdays: false,
            ..rule("HOLIDAY", 0, 1440, SurchargeMode::PerMinute, "1")
        };
        let rules = vec![holiday_rule];

        let workday = calculate_surcharges(&pairs, &rules, &DayContext::workday()).unwrap();
        assert_eq!(workday.credit_for("HOLIDAY"), Decimal::ZERO);

        let holiday = calculate_surcharges(&pairs, &rules, &DayContext::holiday(1)).unwrap();
        assert_eq!(holiday.credit_for("HOLIDAY"), dec("510"));
    }

    #[test]
    fn test_wrapping_rule_is_rejected_before_computing() {
        let pairs = vec![pair(1320, 1440, BookingCategory::Work)];
        let rules = vec![rule("NIGHT", 1320, 360, SurchargeMode::PerMinute, "1")];
        assert!(matches!(
            calculate_surcharges(&pairs, &rules, &DayContext::workday()),
            Err(EngineError::InvalidSurchargeRule { .. })
        ));
    }

    #[test]
    fn test_overnight_rules_cover_both_ends_of_day() {
        let pairs = vec![
            pair(0, 360, BookingCategory::Work),
            pair(1320, 1440, BookingCategory::Work),
        ];
        let rules = SurchargeRule::overnight("NIGHT", 1320, 360, SurchargeMode::PerMinute, dec("1"))
            .unwrap();
        let result = calculate_surcharges(&pairs, &rules, &DayContext::workday()).unwrap();
        assert_eq!(result.credit_for("NIGHT"), dec("480"));
    }

    #[test]
    fn test_pair_past_midnight_matches_next_day_window() {
        let pairs = vec![pair(1320, 1800, BookingCategory::Work)];
        let rules = SurchargeRule::overnight("NIGHT", 1320, 360, SurchargeMode::PerMinute, dec("0.25"))
            .unwrap();
        let result = calculate_surcharges(&pairs, &rules, &DayContext::workday()).unwrap();
        assert_eq!(result.credit_for("NIGHT"), dec("120"));
        assert_eq!(result.lines.len(), 2);
    }
}
