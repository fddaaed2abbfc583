//! Vacation balances, entitlement configuration and capping rules.
//!
//! All day counts are [`Decimal`] so half days stay exact.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// Vacation balance of one employee for one year.
///
/// `available()` never drops below zero through [`VacationYearBalance::take`];
/// taking more requires a manual adjustment first.
///
/// # Example
///
/// ```
/// use worktime_engine::models::VacationYearBalance;
/// use rust_decimal::Decimal;
///
/// let mut balance = VacationYearBalance::new(2026);
/// balance.entitlement = Decimal::from(30);
/// balance.carryover_in = Decimal::from(2);
///
/// balance.take(Decimal::from(12)).unwrap();
/// assert_eq!(balance.total(), Decimal::from(32));
/// assert_eq!(balance.available(), Decimal::from(20));
///
/// assert!(balance.take(Decimal::from(21)).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationYearBalance {
    /// Calendar year of the balance.
    pub year: i32,
    /// Entitlement earned in the year.
    pub entitlement: Decimal,
    /// Days carried over from the previous year.
    pub carryover_in: Decimal,
    /// Manual corrections, positive or negative.
    pub adjustments: Decimal,
    /// Days already taken.
    pub taken: Decimal,
}

impl VacationYearBalance {
    /// An empty balance for the year.
    pub fn new(year: i32) -> Self {
        Self {
            year,
            entitlement: Decimal::ZERO,
            carryover_in: Decimal::ZERO,
            adjustments: Decimal::ZERO,
            taken: Decimal::ZERO,
        }
    }

    /// Entitlement plus carryover plus adjustments.
    pub fn total(&self) -> Decimal {
        self.entitlement + self.carryover_in + self.adjustments
    }

    /// Days still available.
    pub fn available(&self) -> Decimal {
        self.total() - self.taken
    }

    /// Books taken days.
    pub fn take(&mut self, days: Decimal) -> EngineResult<()> {
        if days < Decimal::ZERO {
            return Err(EngineError::CalculationError {
                message: format!("cannot take a negative number of days ({})", days),
            });
        }
        let available = self.available();
        if days > available {
            return Err(EngineError::InsufficientVacation {
                year: self.year,
                requested: days,
                available,
            });
        }
        self.taken += days;
        Ok(())
    }

    /// Records a manual correction.
    pub fn adjust(&mut self, days: Decimal) {
        self.adjustments += days;
    }
}

/// The period entitlement is earned over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacationBasis {
    /// January to December.
    #[default]
    CalendarYear,
    /// Twelve months from the hire anniversary.
    HireAnniversary,
}

/// How the computed entitlement is rounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementRounding {
    /// Two decimal places.
    #[default]
    None,
    /// To the nearest half day; quarter days round up.
    HalfDay,
    /// To the nearest full day; half days round up.
    FullDay,
}

/// Tariff-level vacation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationConfig {
    /// Entitlement basis.
    #[serde(default)]
    pub basis: VacationBasis,
    /// Annual days for a full-time employee employed the whole year.
    pub base_days: Decimal,
    /// Weekly hours of a full-time employee.
    pub full_time_weekly_hours: Decimal,
    /// Rounding of the final entitlement.
    #[serde(default)]
    pub rounding: EntitlementRounding,
    /// Default capping group of the tariff.
    #[serde(default)]
    pub capping_group: Option<String>,
}

impl VacationConfig {
    /// Checks for non-positive hours and negative base days.
    pub fn validate(&self) -> EngineResult<()> {
        if self.base_days < Decimal::ZERO {
            return Err(EngineError::InvalidConfig {
                field: "vacation.base_days".to_string(),
                message: format!("must not be negative, got {}", self.base_days),
            });
        }
        if self.full_time_weekly_hours <= Decimal::ZERO {
            return Err(EngineError::InvalidConfig {
                field: "vacation.full_time_weekly_hours".to_string(),
                message: format!("must be positive, got {}", self.full_time_weekly_hours),
            });
        }
        Ok(())
    }
}

/// Employee attributes used by the vacation calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationEmployee {
    /// Employee identifier.
    pub id: Uuid,
    /// First day of employment.
    pub hire_date: NaiveDate,
    /// Last day of employment, if leaving.
    #[serde(default)]
    pub exit_date: Option<NaiveDate>,
    /// Date of birth, for age bonuses.
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    /// Contracted weekly hours.
    pub weekly_hours: Decimal,
    /// Severely disabled status.
    #[serde(default)]
    pub disabled: bool,
    /// Individual capping group overriding the tariff default.
    #[serde(default)]
    pub capping_group: Option<String>,
}

/// A range of years mapped to bonus days; `to` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusBracket {
    /// Lowest value in the bracket.
    pub from: u32,
    /// First value past the bracket; open-ended when absent.
    #[serde(default)]
    pub to: Option<u32>,
    /// Days added when the value falls in the bracket.
    pub bonus_days: Decimal,
}

impl BonusBracket {
    /// Returns true if `value` lies in the bracket.
    pub fn contains(&self, value: u32) -> bool {
        value >= self.from && self.to.is_none_or(|to| value < to)
    }
}

/// The employee attribute a bonus is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "attribute", rename_all = "snake_case")]
pub enum BonusRule {
    /// Age in completed years at the start of the basis period.
    Age {
        /// Lookup table.
        brackets: Vec<BonusBracket>,
    },
    /// Completed years of service at the start of the basis period.
    Tenure {
        /// Lookup table.
        brackets: Vec<BonusBracket>,
    },
    /// Severe disability.
    Disability {
        /// Days added for disabled employees.
        bonus_days: Decimal,
    },
}

/// A named bonus table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialCalculation {
    /// Display name.
    pub name: String,
    /// The rule.
    #[serde(flatten)]
    pub rule: BonusRule,
}

/// When a capping rule takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CappingScope {
    /// Caps the balance before it is carried into the next year.
    YearEnd,
    /// Forfeits unused carryover once the cutoff date passes.
    MidYear,
}

/// A month and day without a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutoffDate {
    /// Month (1-12).
    pub month: u32,
    /// Day of month.
    pub day: u32,
}

impl CutoffDate {
    /// The cutoff in a concrete year; `02-29` falls back to `02-28` outside leap years.
    pub fn in_year(&self, year: i32) -> EngineResult<NaiveDate> {
        let day = if self.month == 2 && self.day == 29 && NaiveDate::from_ymd_opt(year, 2, 29).is_none() {
            28
        } else {
            self.day
        };
        NaiveDate::from_ymd_opt(year, self.month, day).ok_or_else(|| {
            EngineError::InvalidConfig {
                field: "cutoff".to_string(),
                message: format!("{:02}-{:02} is not a valid date in {}", self.month, self.day, year),
            }
        })
    }
}

/// A single vacation capping rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CappingRule {
    /// Rule identifier, referenced by exceptions.
    pub id: String,
    /// Year-end or mid-year.
    pub scope: CappingScope,
    /// Cutoff date for mid-year rules.
    #[serde(default)]
    pub cutoff: Option<CutoffDate>,
    /// Most days carried (year-end) or kept after the cutoff (mid-year).
    pub max_carryover: Decimal,
}

/// Capping rules assigned together to a tariff or employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CappingRuleGroup {
    /// Group name.
    pub name: String,
    /// Rules of the group.
    pub rules: Vec<CappingRule>,
}

impl CappingRuleGroup {
    /// Checks cutoffs and caps.
    pub fn validate(&self) -> EngineResult<()> {
        for rule in &self.rules {
            let field = format!("capping_groups.{}.{}", self.name, rule.id);
            if rule.max_carryover < Decimal::ZERO {
                return Err(EngineError::InvalidConfig {
                    field,
                    message: "max_carryover must not be negative".to_string(),
                });
            }
            match (rule.scope, rule.cutoff) {
                (CappingScope::MidYear, None) => {
                    return Err(EngineError::InvalidConfig {
                        field,
                        message: "mid-year rules require a cutoff date".to_string(),
                    });
                }
                (_, Some(cutoff)) => {
                    cutoff.in_year(2024)?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// How an employee is exempt from a capping rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Exemption {
    /// The rule is skipped entirely.
    Full,
    /// The employee keeps a fixed number of days regardless of the cap.
    Partial {
        /// Days retained.
        retain_days: Decimal,
    },
}

/// An employee-specific exemption from one capping rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeException {
    /// The exempt employee.
    pub employee_id: Uuid,
    /// The rule the exemption applies to.
    pub rule_id: String,
    /// Exemption kind.
    pub exemption: Exemption,
}

/// Vacation reference data shared by every yearly calculation of a tariff.
///
/// Loaded from `vacation.yaml` and passed as an explicit argument to the
/// vacation calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationReferenceData {
    /// Entitlement configuration.
    pub config: VacationConfig,
    /// Bonus tables.
    #[serde(default)]
    pub special_calculations: Vec<SpecialCalculation>,
    /// Capping rule groups.
    #[serde(default)]
    pub capping_groups: Vec<CappingRuleGroup>,
    /// Employee exemptions from capping rules.
    #[serde(default)]
    pub exceptions: Vec<EmployeeException>,
}

impl VacationReferenceData {
    /// Validates the configuration and every capping group.
    pub fn validate(&self) -> EngineResult<()> {
        self.config.validate()?;
        let mut names = std::collections::BTreeSet::new();
        for group in &self.capping_groups {
            if !names.insert(group.name.as_str()) {
                return Err(EngineError::InvalidConfig {
                    field: "capping_groups".to_string(),
                    message: format!("duplicate group '{}'", group.name),
                });
            }
            group.validate()?;
        }
        if let Some(name) = &self.config.capping_group {
            if !names.contains(name.as_str()) {
                return Err(EngineError::CappingGroupNotFound { name: name.clone() });
            }
        }
        Ok(())
    }
}
