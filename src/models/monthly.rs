//! Monthly evaluation configuration and results.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::clock::Minutes;
use super::codes::WarningCode;

/// How the monthly flextime delta is credited to the running balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditType {
    /// No balance is kept; the month's delta is discarded.
    None,
    /// The full delta is added to the balance.
    #[default]
    FullCarryover,
    /// Positive deltas count only above the threshold; negative ones in full.
    ThresholdCarryover,
    /// Full carryover, but the balance never drops below zero.
    ZeroFloor,
}

/// Monthly credit rules for one employee group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthlyConfig {
    /// The credit type.
    pub credit_type: CreditType,
    /// Overtime minutes that must be exceeded under threshold carryover.
    pub threshold: Minutes,
    /// Most positive minutes credited in a single month.
    pub max_monthly_credit: Option<Minutes>,
    /// Ceiling of the flextime balance.
    pub max_positive_balance: Option<Minutes>,
    /// Magnitude of the lowest allowed flextime balance.
    pub max_negative_balance: Option<Minutes>,
    /// Magnitude of the floor applied at the annual rollover.
    pub annual_negative_floor: Option<Minutes>,
}

impl MonthlyConfig {
    /// Checks that thresholds and caps are not negative.
    pub fn validate(&self) -> EngineResult<()> {
        let checks = [
            ("threshold", Some(self.threshold)),
            ("max_monthly_credit", self.max_monthly_credit),
            ("max_positive_balance", self.max_positive_balance),
            ("max_negative_balance", self.max_negative_balance),
            ("annual_negative_floor", self.annual_negative_floor),
        ];
        for (field, value) in checks {
            if let Some(value) = value {
                if value < 0 {
                    return Err(EngineError::InvalidConfig {
                        field: format!("monthly.{}", field),
                        message: format!("must not be negative, got {}", value),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Which cap altered the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapKind {
    /// Per-month credit cap.
    MonthlyCredit,
    /// Positive balance ceiling.
    PositiveBalance,
    /// Negative balance floor.
    NegativeBalance,
    /// Overtime below the carryover threshold.
    Threshold,
    /// Balance clamped at zero.
    ZeroFloor,
    /// Floor applied at the annual rollover.
    AnnualFloor,
}

/// A cap applied during the monthly evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCap {
    /// The cap.
    pub kind: CapKind,
    /// The configured limit.
    pub limit: Minutes,
    /// Minutes removed from (positive) or added to (negative) the balance.
    pub forfeited: Minutes,
}

/// Summed daily values for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    /// Sum of gross minutes.
    pub gross_minutes: Minutes,
    /// Sum of net minutes.
    pub net_minutes: Minutes,
    /// Sum of target minutes.
    pub target_minutes: Minutes,
    /// Sum of break minutes.
    pub break_minutes: Minutes,
    /// Sum of overtime minutes.
    pub overtime_minutes: Minutes,
    /// Sum of undertime minutes.
    pub undertime_minutes: Minutes,
}

impl MonthlyTotals {
    /// Overtime minus undertime.
    pub fn delta(&self) -> Minutes {
        self.overtime_minutes - self.undertime_minutes
    }
}

/// The evaluated month of one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyResult {
    /// The employee.
    pub employee_id: Uuid,
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
    /// Number of daily results aggregated.
    pub days: usize,
    /// Number of days still carrying error codes.
    pub error_days: usize,
    /// Summed daily values.
    pub totals: MonthlyTotals,
    /// Flextime balance at the start of the month.
    pub flextime_before: Minutes,
    /// Change credited to the balance this month.
    pub flextime_change: Minutes,
    /// Flextime balance at the end of the month.
    pub flextime_after: Minutes,
    /// Credit type the month was evaluated with.
    pub credit_type: CreditType,
    /// Caps that altered the balance, in application order.
    pub applied_caps: Vec<AppliedCap>,
    /// Warnings raised by the evaluation.
    pub warnings: Vec<WarningCode>,
}
