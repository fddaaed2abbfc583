//! Break deduction.
//!
//! Booked breaks always count as break time. Schedule break rules then
//! deduct additional minutes:
//!
//! - **fixed**: work overlapping the break window, less any booked break
//!   already inside that window;
//! - **variable**: the full duration once, unless a break was booked;
//! - **minimum**: tops up booked and deducted breaks to the required length
//!   once gross time exceeds the threshold.
//!
//! Paid rules never reduce net time.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{BookingPair, BreakKind, BreakRule, Minutes, WarningCode, push_unique};

use super::overlap::overlap;

/// Minutes deducted by one break rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakDeduction {
    /// Position of the rule in the schedule.
    pub rule_index: usize,
    /// Rule type.
    pub kind: BreakKind,
    /// Minutes deducted.
    pub minutes: Minutes,
}

/// Break time of one day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakDeductionResult {
    /// Minutes of booked break pairs.
    pub recorded_minutes: Minutes,
    /// Minutes deducted by rules.
    pub deducted_minutes: Minutes,
    /// Recorded plus deducted, never more than gross.
    pub total_minutes: Minutes,
    /// Deductions per rule.
    pub items: Vec<BreakDeduction>,
    /// Warnings raised by the rules.
    pub warnings: Vec<WarningCode>,
}

fn window_overlap(pairs: &[BookingPair], start: Minutes, end: Minutes) -> Minutes {
    pairs
        .iter()
        .filter_map(|p| p.end().map(|e| overlap(p.start(), e, start, end)))
        .sum()
}

/// Computes break minutes for the day.
///
/// # Example
///
/// ```
/// use uuid::Uuid;
/// use worktime_engine::calculation::calculate_break_deduction;
/// use worktime_engine::models::{BookingCategory, BookingPair, BreakKind, BreakRule, PairBoundary};
///
/// let work = vec![BookingPair::closed(
///     PairBoundary::booked(Uuid::new_v4(), 480),
///     PairBoundary::booked(Uuid::new_v4(), 1020),
///     BookingCategory::Work,
/// )];
/// let rules = vec![BreakRule {
///     kind: BreakKind::Minimum,
///     window: None,
///     after_work_minutes: Some(360),
///     duration: 30,
///     proportional: false,
///     paid: false,
/// }];
///
/// let result = calculate_break_deduction(&work, &[], 540, &rules);
/// assert_eq!(result.total_minutes, 30);
/// ```
pub fn calculate_break_deduction(
    work_pairs: &[BookingPair],
    break_pairs: &[BookingPair],
    gross_minutes: Minutes,
    rules: &[BreakRule],
) -> BreakDeductionResult {
    let mut result = BreakDeductionResult {
        recorded_minutes: break_pairs.iter().map(|p| p.duration).sum(),
        ..BreakDeductionResult::default()
    };
    let has_manual_break = result.recorded_minutes > 0;

    for (rule_index, rule) in rules.iter().enumerate() {
        if rule.paid {
            continue;
        }

        let minutes = match rule.kind {
            BreakKind::Fixed => match rule.window {
                Some(window) => {
                    let worked = window_overlap(work_pairs, window.start, window.end);
                    let booked = window_overlap(break_pairs, window.start, window.end);
                    (worked - booked).max(0)
                }
                None => 0,
            },
            BreakKind::Variable => {
                let reached = rule
                    .after_work_minutes
                    .is_none_or(|threshold| gross_minutes >= threshold);
                if has_manual_break {
                    push_unique(&mut result.warnings, WarningCode::ManualBreak);
                    0
                } else if reached {
                    rule.duration
                } else {
                    0
                }
            }
            BreakKind::Minimum => {
                let threshold = rule.after_work_minutes.unwrap_or(0);
                if gross_minutes > threshold {
                    let required = if rule.proportional {
                        rule.duration.min(gross_minutes - threshold)
                    } else {
                        rule.duration
                    };
                    if !has_manual_break {
                        push_unique(&mut result.warnings, WarningCode::NoBreakRecorded);
                    }
                    (required - result.recorded_minutes - result.deducted_minutes).max(0)
                } else {
                    0
                }
            }
        };

        if minutes > 0 {
            result.deducted_minutes += minutes;
            result.items.push(BreakDeduction {
                rule_index,
                kind: rule.kind,
                minutes,
            });
            push_unique(&mut result.warnings, WarningCode::AutoBreakApplied);
        }
    }

    let available = (gross_minutes - result.recorded_minutes).max(0);
    if result.deducted_minutes > available {
        result.deducted_minutes = available;
    }
    result.total_minutes = (result.recorded_minutes + result.deducted_minutes).min(gross_minutes.max(0));

    debug!(
        recorded = result.recorded_minutes,
        deducted = result.deducted_minutes,
        total = result.total_minutes,
        "Calculated break deduction"
    );

    result
}
