//! Monthly aggregation and flextime carryover.
//!
//! A month's daily results are summed and the signed delta (overtime minus
//! undertime) is credited to the running flextime balance according to the
//! configured [`CreditType`]. Caps are applied in a fixed order: threshold,
//! per-month credit cap, zero floor, then the balance caps.

use chrono::Datelike;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AppliedCap, CapKind, CreditType, DailyResult, Minutes, MonthlyConfig, MonthlyResult,
    MonthlyTotals, WarningCode, push_unique,
};

fn validate_days(employee_id: Uuid, year: i32, month: u32, days: &[DailyResult]) -> EngineResult<()> {
    if !(1..=12).contains(&month) {
        return Err(EngineError::CalculationError {
            message: format!("month must be between 1 and 12, got {}", month),
        });
    }
    let mut previous = None;
    for day in days {
        if day.employee_id != employee_id {
            return Err(EngineError::CalculationError {
                message: format!(
                    "daily result of {} belongs to employee {}, not {}",
                    day.date, day.employee_id, employee_id
                ),
            });
        }
        if day.date.year() != year || day.date.month() != month {
            return Err(EngineError::OutOfOrder {
                message: format!("{} is not in {}-{:02}", day.date, year, month),
            });
        }
        if let Some(previous) = previous {
            if day.date <= previous {
                return Err(EngineError::OutOfOrder {
                    message: format!("{} does not follow {}", day.date, previous),
                });
            }
        }
        previous = Some(day.date);
    }
    Ok(())
}

fn sum_days(days: &[DailyResult]) -> MonthlyTotals {
    days.iter().fold(MonthlyTotals::default(), |mut totals, day| {
        totals.gross_minutes += day.gross_minutes;
        totals.net_minutes += day.net_minutes;
        totals.target_minutes += day.target_minutes;
        totals.break_minutes += day.break_minutes;
        totals.overtime_minutes += day.overtime_minutes;
        totals.undertime_minutes += day.undertime_minutes;
        totals
    })
}

/// Aggregates one month of daily results and carries the flextime balance.
///
/// `days` must belong to `employee_id`, lie in the given month and be in
/// strictly ascending date order.
///
/// # Example
///
/// ```
/// use worktime_engine::calculation::aggregate_month;
/// use worktime_engine::models::{CreditType, MonthlyConfig};
/// use uuid::Uuid;
///
/// let config = MonthlyConfig {
///     credit_type: CreditType::FullCarryover,
///     max_positive_balance: Some(600),
///     ..MonthlyConfig::default()
/// };
///
/// let result = aggregate_month(Uuid::new_v4(), 2026, 3, &[], 700, &config).unwrap();
/// assert_eq!(result.flextime_after, 600);
/// ```
pub fn aggregate_month(
    employee_id: Uuid,
    year: i32,
    month: u32,
    days: &[DailyResult],
    previous_balance: Minutes,
    config: &MonthlyConfig,
) -> EngineResult<MonthlyResult> {
    config.validate()?;
    validate_days(employee_id, year, month, days)?;

    let totals = sum_days(days);
    let error_days = days.iter().filter(|d| d.has_error()).count();
    let mut warnings = Vec::new();
    let mut applied_caps = Vec::new();

    if error_days > 0 {
        push_unique(&mut warnings, WarningCode::DaysWithErrors);
    }

    let delta = totals.delta();
    let flextime_after = if config.credit_type == CreditType::None {
        push_unique(&mut warnings, WarningCode::NoCarryover);
        0
    } else {
        let mut credited = delta;

        if config.credit_type == CreditType::ThresholdCarryover && delta > 0 {
            let forfeited = delta.min(config.threshold);
            credited = delta - forfeited;
            if credited == 0 {
                push_unique(&mut warnings, WarningCode::BelowThreshold);
            }
            if forfeited > 0 {
                applied_caps.push(AppliedCap {
                    kind: CapKind::Threshold,
                    limit: config.threshold,
                    forfeited,
                });
            }
        }

        if let Some(cap) = config.max_monthly_credit {
            if credited > cap {
                applied_caps.push(AppliedCap {
                    kind: CapKind::MonthlyCredit,
                    limit: cap,
                    forfeited: credited - cap,
                });
                push_unique(&mut warnings, WarningCode::MonthlyCapReached);
                credited = cap;
            }
        }

        let mut balance = previous_balance + credited;

        if config.credit_type == CreditType::ZeroFloor && balance < 0 {
            applied_caps.push(AppliedCap {
                kind: CapKind::ZeroFloor,
                limit: 0,
                forfeited: balance,
            });
            balance = 0;
        }

        if let Some(max) = config.max_positive_balance {
            if balance > max {
                applied_caps.push(AppliedCap {
                    kind: CapKind::PositiveBalance,
                    limit: max,
                    forfeited: balance - max,
                });
                push_unique(&mut warnings, WarningCode::FlextimeCapped);
                balance = max;
            }
        }
        if let Some(max) = config.max_negative_balance {
            if balance < -max {
                applied_caps.push(AppliedCap {
                    kind: CapKind::NegativeBalance,
                    limit: max,
                    forfeited: balance + max,
                });
                push_unique(&mut warnings, WarningCode::FlextimeCapped);
                balance = -max;
            }
        }

        balance
    };

    if !applied_caps.is_empty() {
        warn!(
            employee_id = %employee_id,
            year,
            month,
            caps = applied_caps.len(),
            "Flextime caps applied"
        );
    }

    let result = MonthlyResult {
        employee_id,
        year,
        month,
        days: days.len(),
        error_days,
        totals,
        flextime_before: previous_balance,
        flextime_change: flextime_after - previous_balance,
        flextime_after,
        credit_type: config.credit_type,
        applied_caps,
        warnings,
    };

    info!(
        employee_id = %employee_id,
        year,
        month,
        delta,
        flextime_after = result.flextime_after,
        "Aggregated month"
    );

    Ok(result)
}

/// Clamps a balance at the annual negative floor when a new year starts.
///
/// # Example
///
/// ```
/// use worktime_engine::calculation::apply_annual_rollover;
/// use worktime_engine::models::MonthlyConfig;
///
/// let config = MonthlyConfig { annual_negative_floor: Some(600), ..MonthlyConfig::default() };
/// let (balance, cap) = apply_annual_rollover(-900, &config);
/// assert_eq!(balance, -600);
/// assert_eq!(cap.unwrap().forfeited, -300);
/// assert_eq!(apply_annual_rollover(120, &config).0, 120);
/// ```
pub fn apply_annual_rollover(balance: Minutes, config: &MonthlyConfig) -> (Minutes, Option<AppliedCap>) {
    match config.annual_negative_floor {
        Some(floor) if balance < -floor => (
            -floor,
            Some(AppliedCap {
                kind: CapKind::AnnualFloor,
                limit: floor,
                forfeited: balance + floor,
            }),
        ),
        _ => (balance, None),
    }
}
