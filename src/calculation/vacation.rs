//! Vacation entitlement, year-end carryover and mid-year forfeiture.
//!
//! The yearly pipeline runs per employee in ascending year order:
//!
//! 1. Entitlement for the basis period, prorated and bonus-adjusted
//! 2. Carryover of the prior year's available days, capped by year-end rules
//! 3. Manual adjustments
//! 4. Forfeiture of unused carryover once a mid-year cutoff has passed
//! 5. Taken days

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditTrail, BonusRule, CappingRule, CappingRuleGroup, CappingScope, EmployeeException,
    EntitlementRounding, Exemption, SpecialCalculation, VacationBasis, VacationConfig,
    VacationEmployee, VacationReferenceData, VacationYearBalance,
};

/// A bonus granted by one special calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusLine {
    /// Name of the special calculation.
    pub name: String,
    /// Days granted.
    pub days: Decimal,
}

/// Entitlement of one employee for one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementResult {
    /// The employee.
    pub employee_id: Uuid,
    /// The year the entitlement is booked to.
    pub year: i32,
    /// First day of the basis period.
    pub basis_start: NaiveDate,
    /// Last day of the basis period.
    pub basis_end: NaiveDate,
    /// Full months employed in the basis period (0-12).
    pub months_employed: u32,
    /// Employee weekly hours over full-time weekly hours.
    pub part_time_factor: Decimal,
    /// Base days after proration and the part-time factor, unrounded.
    pub base_entitlement: Decimal,
    /// Bonuses granted.
    pub bonuses: Vec<BonusLine>,
    /// Sum of the bonuses.
    pub bonus_days: Decimal,
    /// Final rounded entitlement.
    pub entitlement: Decimal,
}

/// Days carried from one year into the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryoverResult {
    /// The employee.
    pub employee_id: Uuid,
    /// Year the days are carried out of.
    pub from_year: i32,
    /// Available days at the end of `from_year`.
    pub available: Decimal,
    /// Days carried into the following year.
    pub carryover: Decimal,
    /// Days lost to the cap.
    pub forfeited: Decimal,
    /// The rule that limited the carryover, if any.
    pub applied_rule: Option<String>,
}

/// Outcome of mid-year forfeiture on a balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForfeitureResult {
    /// Year of the balance.
    pub year: i32,
    /// Carryover before forfeiture.
    pub carryover_before: Decimal,
    /// Days taken up to the cutoff.
    pub taken_by_cutoff: Decimal,
    /// Days forfeited.
    pub forfeited: Decimal,
    /// Carryover after forfeiture.
    pub carryover_after: Decimal,
    /// The rule that caused the forfeiture, if any.
    pub rule_id: Option<String>,
    /// The balance with the reduced carryover.
    pub balance: VacationYearBalance,
}

/// Movements of one vacation year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationYearInput {
    /// Year to calculate.
    pub year: i32,
    /// Days taken in the year.
    #[serde(default)]
    pub taken: Decimal,
    /// Manual corrections.
    #[serde(default)]
    pub adjustments: Decimal,
    /// Days of `taken` that fell on or before the mid-year cutoff.
    #[serde(default)]
    pub taken_by_cutoff: Decimal,
    /// Date forfeiture is evaluated at; 31 December of `year` when absent.
    #[serde(default)]
    pub evaluation_date: Option<NaiveDate>,
}

impl VacationYearInput {
    /// A year with no movements.
    pub fn new(year: i32) -> Self {
        Self {
            year,
            taken: Decimal::ZERO,
            adjustments: Decimal::ZERO,
            taken_by_cutoff: Decimal::ZERO,
            evaluation_date: None,
        }
    }
}

/// Result of one vacation year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationYearResult {
    /// Final balance of the year.
    pub balance: VacationYearBalance,
    /// Entitlement breakdown.
    pub entitlement: EntitlementResult,
    /// Carryover from the prior year, when there was one.
    pub carryover: Option<CarryoverResult>,
    /// Mid-year forfeiture, when a capping group applies.
    pub forfeiture: Option<ForfeitureResult>,
    /// Audit trail.
    pub audit_steps: Vec<AuditStep>,
}

fn calculation_error(message: String) -> EngineError {
    EngineError::CalculationError { message }
}

/// The same month and day in another year; 29 February becomes 28 February.
fn anniversary_in(date: NaiveDate, year: i32) -> EngineResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
        .ok_or_else(|| calculation_error(format!("no anniversary of {} in {}", date, year)))
}

fn add_months(date: NaiveDate, months: u32) -> EngineResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| calculation_error(format!("date overflow adding {} months to {}", months, date)))
}

fn completed_years(from: NaiveDate, at: NaiveDate) -> u32 {
    let mut years = at.year() - from.year();
    if (at.month(), at.day()) < (from.month(), from.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

fn round_entitlement(days: Decimal, rounding: EntitlementRounding) -> Decimal {
    match rounding {
        EntitlementRounding::None => days.round_dp(2),
        EntitlementRounding::HalfDay => {
            (days * Decimal::TWO).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                / Decimal::TWO
        }
        EntitlementRounding::FullDay => {
            days.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        }
    }
}

fn exemption_for(
    exceptions: &[EmployeeException],
    employee_id: Uuid,
    rule_id: &str,
) -> Option<Exemption> {
    exceptions
        .iter()
        .find(|e| e.employee_id == employee_id && e.rule_id == rule_id)
        .map(|e| e.exemption)
}

/// The lowest effective cap among `rules`, honouring exemptions.
fn lowest_cap<'a>(
    rules: impl Iterator<Item = &'a CappingRule>,
    employee_id: Uuid,
    exceptions: &[EmployeeException],
) -> Option<(Decimal, &'a str)> {
    rules
        .filter_map(|rule| {
            let cap = match exemption_for(exceptions, employee_id, &rule.id) {
                Some(Exemption::Full) => return None,
                Some(Exemption::Partial { retain_days }) => retain_days,
                None => rule.max_carryover,
            };
            Some((cap, rule.id.as_str()))
        })
        .min_by(|a, b| a.0.cmp(&b.0))
}

/// Calculates the entitlement of `employee` for `year`.
///
/// A month of the basis period counts when the employee was employed for the
/// whole month. The prorated base days are scaled by the part-time factor and
/// the special-calculation bonuses are added on top; an employee with no
/// counted month earns no bonus.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
/// use worktime_engine::calculation::calculate_entitlement;
/// use worktime_engine::models::{
///     EntitlementRounding, VacationBasis, VacationConfig, VacationEmployee,
/// };
///
/// let config = VacationConfig {
///     basis: VacationBasis::CalendarYear,
///     base_days: Decimal::from(30),
///     full_time_weekly_hours: Decimal::from(40),
///     rounding: EntitlementRounding::HalfDay,
///     capping_group: None,
/// };
/// let employee = VacationEmployee {
///     id: Uuid::new_v4(),
///     hire_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
///     exit_date: None,
///     birth_date: None,
///     weekly_hours: Decimal::from(20),
///     disabled: false,
///     capping_group: None,
/// };
///
/// let result = calculate_entitlement(&employee, 2026, &config, &[]).unwrap();
/// assert_eq!(result.months_employed, 6);
/// assert_eq!(result.entitlement, Decimal::new(75, 1));
/// ```
pub fn calculate_entitlement(
    employee: &VacationEmployee,
    year: i32,
    config: &VacationConfig,
    special_calculations: &[SpecialCalculation],
) -> EngineResult<EntitlementResult> {
    config.validate()?;
    if employee.weekly_hours < Decimal::ZERO {
        return Err(EngineError::InvalidConfig {
            field: "weekly_hours".to_string(),
            message: format!("must not be negative, got {}", employee.weekly_hours),
        });
    }

    let basis_start = match config.basis {
        VacationBasis::CalendarYear => NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| calculation_error(format!("year {} out of range", year)))?,
        VacationBasis::HireAnniversary => anniversary_in(employee.hire_date, year)?,
    };
    let basis_end = add_months(basis_start, 12)?
        .pred_opt()
        .ok_or_else(|| calculation_error(format!("year {} out of range", year)))?;

    let mut months_employed = 0u32;
    for month in 0..12 {
        let month_start = add_months(basis_start, month)?;
        let month_end = add_months(basis_start, month + 1)?
            .pred_opt()
            .ok_or_else(|| calculation_error(format!("year {} out of range", year)))?;
        let hired = employee.hire_date <= month_start;
        let still_employed = employee.exit_date.is_none_or(|exit| exit >= month_end);
        if hired && still_employed {
            months_employed += 1;
        }
    }

    let part_time_factor = employee.weekly_hours / config.full_time_weekly_hours;
    let base_entitlement = config.base_days * Decimal::from(months_employed) / Decimal::from(12)
        * part_time_factor;

    let mut bonuses = Vec::new();
    if months_employed > 0 {
        for special in special_calculations {
            let days = match &special.rule {
                BonusRule::Age { brackets } => employee.birth_date.and_then(|birth| {
                    let age = completed_years(birth, basis_start);
                    brackets.iter().find(|b| b.contains(age)).map(|b| b.bonus_days)
                }),
                BonusRule::Tenure { brackets } => {
                    let tenure = completed_years(employee.hire_date, basis_start);
                    brackets.iter().find(|b| b.contains(tenure)).map(|b| b.bonus_days)
                }
                BonusRule::Disability { bonus_days } => employee.disabled.then_some(*bonus_days),
            };
            if let Some(days) = days.filter(|d| !d.is_zero()) {
                bonuses.push(BonusLine {
                    name: special.name.clone(),
                    days,
                });
            }
        }
    }
    let bonus_days: Decimal = bonuses.iter().map(|b| b.days).sum();
    let entitlement = round_entitlement(base_entitlement + bonus_days, config.rounding);

    debug!(
        employee_id = %employee.id,
        year,
        months_employed,
        %entitlement,
        "Calculated vacation entitlement"
    );

    Ok(EntitlementResult {
        employee_id: employee.id,
        year,
        basis_start,
        basis_end,
        months_employed,
        part_time_factor,
        base_entitlement,
        bonuses,
        bonus_days,
        entitlement,
    })
}

/// Caps the available days of `prior` before they are carried into the next year.
///
/// The lowest year-end cap of the group wins. A full exemption skips a rule and
/// a partial exemption replaces its cap with the retained day count. A
/// negative balance is carried unchanged.
///
/// # Example
///
/// ```
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
/// use worktime_engine::calculation::calculate_year_end_carryover;
/// use worktime_engine::models::{CappingRule, CappingRuleGroup, CappingScope, VacationYearBalance};
///
/// let mut prior = VacationYearBalance::new(2025);
/// prior.entitlement = Decimal::from(8);
/// let group = CappingRuleGroup {
///     name: "standard".to_string(),
///     rules: vec![CappingRule {
///         id: "year_end".to_string(),
///         scope: CappingScope::YearEnd,
///         cutoff: None,
///         max_carryover: Decimal::from(5),
///     }],
/// };
///
/// let result = calculate_year_end_carryover(&prior, Uuid::new_v4(), Some(&group), &[]);
/// assert_eq!(result.carryover, Decimal::from(5));
/// assert_eq!(result.forfeited, Decimal::from(3));
/// ```
pub fn calculate_year_end_carryover(
    prior: &VacationYearBalance,
    employee_id: Uuid,
    group: Option<&CappingRuleGroup>,
    exceptions: &[EmployeeException],
) -> CarryoverResult {
    let available = prior.available();
    let mut result = CarryoverResult {
        employee_id,
        from_year: prior.year,
        available,
        carryover: available,
        forfeited: Decimal::ZERO,
        applied_rule: None,
    };
    if available <= Decimal::ZERO {
        return result;
    }

    let year_end_rules = group
        .into_iter()
        .flat_map(|g| g.rules.iter())
        .filter(|r| r.scope == CappingScope::YearEnd);
    if let Some((cap, rule_id)) = lowest_cap(year_end_rules, employee_id, exceptions) {
        if cap < available {
            result.carryover = cap;
            result.forfeited = available - cap;
            result.applied_rule = Some(rule_id.to_string());
        }
    }

    result
}

/// Forfeits unused carryover of `balance` whose mid-year cutoff lies before
/// `evaluation_date`.
///
/// Days taken up to the cutoff consume the carryover first. Whatever remains
/// above the rule's cap is forfeited, never more than the balance has
/// available.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
/// use worktime_engine::calculation::apply_mid_year_forfeiture;
/// use worktime_engine::models::{
///     CappingRule, CappingRuleGroup, CappingScope, CutoffDate, VacationYearBalance,
/// };
///
/// let mut balance = VacationYearBalance::new(2026);
/// balance.entitlement = Decimal::from(30);
/// balance.carryover_in = Decimal::from(3);
/// let group = CappingRuleGroup {
///     name: "standard".to_string(),
///     rules: vec![CappingRule {
///         id: "march".to_string(),
///         scope: CappingScope::MidYear,
///         cutoff: Some(CutoffDate { month: 3, day: 31 }),
///         max_carryover: Decimal::ZERO,
///     }],
/// };
///
/// let result = apply_mid_year_forfeiture(
///     &balance,
///     Uuid::new_v4(),
///     Some(&group),
///     &[],
///     NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
///     Decimal::ZERO,
/// )
/// .unwrap();
/// assert_eq!(result.carryover_after, Decimal::ZERO);
/// assert_eq!(result.forfeited, Decimal::from(3));
/// ```
pub fn apply_mid_year_forfeiture(
    balance: &VacationYearBalance,
    employee_id: Uuid,
    group: Option<&CappingRuleGroup>,
    exceptions: &[EmployeeException],
    evaluation_date: NaiveDate,
    taken_by_cutoff: Decimal,
) -> EngineResult<ForfeitureResult> {
    if taken_by_cutoff < Decimal::ZERO {
        return Err(calculation_error(format!(
            "days taken by cutoff must not be negative, got {}",
            taken_by_cutoff
        )));
    }

    let mut passed = Vec::new();
    for rule in group
        .into_iter()
        .flat_map(|g| g.rules.iter())
        .filter(|r| r.scope == CappingScope::MidYear)
    {
        let Some(cutoff) = rule.cutoff else {
            continue;
        };
        if evaluation_date > cutoff.in_year(balance.year)? {
            passed.push(rule);
        }
    }

    let carryover_before = balance.carryover_in;
    let mut result = ForfeitureResult {
        year: balance.year,
        carryover_before,
        taken_by_cutoff,
        forfeited: Decimal::ZERO,
        carryover_after: carryover_before,
        rule_id: None,
        balance: balance.clone(),
    };

    if let Some((keep, rule_id)) = lowest_cap(passed.into_iter(), employee_id, exceptions) {
        let remaining = (carryover_before - taken_by_cutoff).max(Decimal::ZERO);
        let forfeited = (remaining - keep)
            .max(Decimal::ZERO)
            .min(balance.available().max(Decimal::ZERO));
        if forfeited > Decimal::ZERO {
            result.forfeited = forfeited;
            result.carryover_after = carryover_before - forfeited;
            result.rule_id = Some(rule_id.to_string());
            result.balance.carryover_in = result.carryover_after;
        }
    }

    Ok(result)
}

/// Resolves the capping group of an employee.
///
/// The employee's own group overrides the tariff default. A named group
/// missing from `groups` is an error.
pub fn resolve_capping_group<'a>(
    groups: &'a [CappingRuleGroup],
    tariff_group: Option<&str>,
    employee_group: Option<&str>,
) -> EngineResult<Option<&'a CappingRuleGroup>> {
    let Some(name) = employee_group.or(tariff_group) else {
        return Ok(None);
    };
    groups
        .iter()
        .find(|g| g.name == name)
        .map(Some)
        .ok_or_else(|| EngineError::CappingGroupNotFound {
            name: name.to_string(),
        })
}

/// Calculates one vacation year from the prior year's final balance.
///
/// `prior`, when present, must be the balance of `input.year - 1`.
pub fn calculate_vacation_year(
    employee: &VacationEmployee,
    prior: Option<&VacationYearBalance>,
    input: &VacationYearInput,
    reference: &VacationReferenceData,
) -> EngineResult<VacationYearResult> {
    let year = input.year;
    if let Some(prior) = prior {
        if prior.year + 1 != year {
            return Err(EngineError::OutOfOrder {
                message: format!(
                    "vacation year {} cannot follow {}; years must be consecutive",
                    year, prior.year
                ),
            });
        }
    }
    if input.taken_by_cutoff > input.taken {
        return Err(calculation_error(format!(
            "days taken by cutoff ({}) exceed days taken ({})",
            input.taken_by_cutoff, input.taken
        )));
    }

    let mut trail = AuditTrail::default();

    let entitlement = calculate_entitlement(
        employee,
        year,
        &reference.config,
        &reference.special_calculations,
    )?;
    trail.record(
        "entitlement",
        "Vacation Entitlement",
        json!({
            "basis": reference.config.basis,
            "base_days": reference.config.base_days,
            "weekly_hours": employee.weekly_hours,
        }),
        json!({
            "months_employed": entitlement.months_employed,
            "bonus_days": entitlement.bonus_days,
            "entitlement": entitlement.entitlement,
        }),
        format!(
            "{} of 12 months employed, part-time factor {}",
            entitlement.months_employed, entitlement.part_time_factor
        ),
    );

    let group = resolve_capping_group(
        &reference.capping_groups,
        reference.config.capping_group.as_deref(),
        employee.capping_group.as_deref(),
    )?;

    let carryover = prior.map(|prior| {
        calculate_year_end_carryover(prior, employee.id, group, &reference.exceptions)
    });
    if let Some(carryover) = &carryover {
        trail.record(
            "year_end_carryover",
            "Year-End Carryover",
            json!({ "from_year": carryover.from_year, "available": carryover.available }),
            json!({ "carryover": carryover.carryover, "forfeited": carryover.forfeited }),
            match &carryover.applied_rule {
                Some(rule) => format!("Capped by rule '{}'", rule),
                None => "Carried in full".to_string(),
            },
        );
    }

    let mut balance = VacationYearBalance::new(year);
    balance.entitlement = entitlement.entitlement;
    balance.carryover_in = carryover.as_ref().map_or(Decimal::ZERO, |c| c.carryover);
    balance.adjust(input.adjustments);

    let evaluation_date = match input.evaluation_date {
        Some(date) => date,
        None => NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| calculation_error(format!("year {} out of range", year)))?,
    };
    let forfeiture = match group {
        Some(group) => {
            let forfeiture = apply_mid_year_forfeiture(
                &balance,
                employee.id,
                Some(group),
                &reference.exceptions,
                evaluation_date,
                input.taken_by_cutoff,
            )?;
            trail.record(
                "mid_year_forfeiture",
                "Mid-Year Forfeiture",
                json!({
                    "evaluation_date": evaluation_date,
                    "carryover": forfeiture.carryover_before,
                    "taken_by_cutoff": forfeiture.taken_by_cutoff,
                }),
                json!({
                    "forfeited": forfeiture.forfeited,
                    "carryover": forfeiture.carryover_after,
                }),
                match &forfeiture.rule_id {
                    Some(rule) => format!("Unused carryover forfeited by rule '{}'", rule),
                    None => "No cutoff passed".to_string(),
                },
            );
            balance = forfeiture.balance.clone();
            Some(forfeiture)
        }
        None => None,
    };

    balance.take(input.taken)?;
    trail.record(
        "taken",
        "Days Taken",
        json!({ "taken": input.taken }),
        json!({ "total": balance.total(), "available": balance.available() }),
        "Taken days booked against the balance",
    );

    info!(
        employee_id = %employee.id,
        year,
        entitlement = %balance.entitlement,
        carryover = %balance.carryover_in,
        available = %balance.available(),
        "Calculated vacation year"
    );

    Ok(VacationYearResult {
        balance,
        entitlement,
        carryover,
        forfeiture,
        audit_steps: trail.into_steps(),
    })
}

/// Calculates consecutive vacation years, carrying each final balance forward.
///
/// `opening` is the balance of the year before the first input. Inputs must be
/// consecutive ascending years.
pub fn calculate_vacation_years(
    employee: &VacationEmployee,
    opening: Option<VacationYearBalance>,
    inputs: &[VacationYearInput],
    reference: &VacationReferenceData,
) -> EngineResult<Vec<VacationYearResult>> {
    let mut prior = opening;
    let mut results = Vec::with_capacity(inputs.len());
    for input in inputs {
        let result = calculate_vacation_year(employee, prior.as_ref(), input, reference)?;
        prior = Some(result.balance.clone());
        results.push(result);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BonusBracket, CutoffDate};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn config() -> VacationConfig {
        VacationConfig {
            basis: VacationBasis::CalendarYear,
            base_days: dec("30"),
            full_time_weekly_hours: dec("40"),
            rounding: EntitlementRounding::None,
            capping_group: None,
        }
    }

    fn employee() -> VacationEmployee {
        VacationEmployee {
            id: Uuid::new_v4(),
            hire_date: date(2015, 1, 1),
            exit_date: None,
            birth_date: Some(date(1970, 6, 15)),
            weekly_hours: dec("40"),
            disabled: false,
            capping_group: None,
        }
    }

    fn balance(year: i32, entitlement: &str, carryover: &str, taken: &str) -> VacationYearBalance {
        VacationYearBalance {
            year,
            entitlement: dec(entitlement),
            carryover_in: dec(carryover),
            adjustments: Decimal::ZERO,
            taken: dec(taken),
        }
    }

    fn year_end_group(cap: &str) -> CappingRuleGroup {
        CappingRuleGroup {
            name: "standard".to_string(),
            rules: vec![CappingRule {
                id: "year_end".to_string(),
                scope: CappingScope::YearEnd,
                cutoff: None,
                max_carryover: dec(cap),
            }],
        }
    }

    fn march_group(keep: &str) -> CappingRuleGroup {
        CappingRuleGroup {
            name: "march".to_string(),
            rules: vec![CappingRule {
                id: "march".to_string(),
                scope: CappingScope::MidYear,
                cutoff: Some(CutoffDate { month: 3, day: 31 }),
                max_carryover: dec(keep),
            }],
        }
    }

    fn reference(groups: Vec<CappingRuleGroup>, default_group: Option<&str>) -> VacationReferenceData {
        VacationReferenceData {
            config: VacationConfig {
                capping_group: default_group.map(str::to_string),
                ..config()
            },
            special_calculations: Vec::new(),
            capping_groups: groups,
            exceptions: Vec::new(),
        }
    }

    // ==========================================================================
    // Entitlement
    // ==========================================================================

    #[test]
    fn test_full_year_full_time_entitlement() {
        let result = calculate_entitlement(&employee(), 2026, &config(), &[]).unwrap();
        assert_eq!(result.months_employed, 12);
        assert_eq!(result.entitlement, dec("30"));
        assert_eq!(result.basis_start, date(2026, 1, 1));
        assert_eq!(result.basis_end, date(2026, 12, 31));
    }

    #[test]
    fn test_mid_month_hire_counts_from_next_month() {
        let employee = VacationEmployee {
            hire_date: date(2026, 3, 15),
            ..employee()
        };
        let result = calculate_entitlement(&employee, 2026, &config(), &[]).unwrap();
        assert_eq!(result.months_employed, 9);
        assert_eq!(result.entitlement, dec("22.5"));
    }

    #[test]
    fn test_exit_date_prorates_entitlement() {
        let employee = VacationEmployee {
            exit_date: Some(date(2026, 6, 30)),
            ..employee()
        };
        let result = calculate_entitlement(&employee, 2026, &config(), &[]).unwrap();
        assert_eq!(result.months_employed, 6);
        assert_eq!(result.entitlement, dec("15"));
    }

    #[test]
    fn test_part_time_factor_scales_base_days() {
        let employee = VacationEmployee {
            weekly_hours: dec("30"),
            ..employee()
        };
        let result = calculate_entitlement(&employee, 2026, &config(), &[]).unwrap();
        assert_eq!(result.part_time_factor, dec("0.75"));
        assert_eq!(result.entitlement, dec("22.5"));
    }

    #[test]
    fn test_hire_anniversary_basis() {
        let config = VacationConfig {
            basis: VacationBasis::HireAnniversary,
            ..config()
        };
        let employee = VacationEmployee {
            hire_date: date(2020, 4, 1),
            ..employee()
        };
        let result = calculate_entitlement(&employee, 2026, &config, &[]).unwrap();
        assert_eq!(result.basis_start, date(2026, 4, 1));
        assert_eq!(result.basis_end, date(2027, 3, 31));
        assert_eq!(result.months_employed, 12);
    }

    #[test]
    fn test_bonuses_from_special_calculations() {
        let specials = vec![
            SpecialCalculation {
                name: "Age".to_string(),
                rule: BonusRule::Age {
                    brackets: vec![
                        BonusBracket { from: 50, to: Some(55), bonus_days: dec("1") },
                        BonusBracket { from: 55, to: None, bonus_days: dec("2") },
                    ],
                },
            },
            SpecialCalculation {
                name: "Tenure".to_string(),
                rule: BonusRule::Tenure {
                    brackets: vec![BonusBracket { from: 10, to: None, bonus_days: dec("1") }],
                },
            },
            SpecialCalculation {
                name: "Disability".to_string(),
                rule: BonusRule::Disability { bonus_days: dec("5") },
            },
        ];
        // Age on 2026-01-01 is 55, tenure 11 years, not disabled
        let result = calculate_entitlement(&employee(), 2026, &config(), &specials).unwrap();
        assert_eq!(result.bonus_days, dec("3"));
        assert_eq!(result.bonuses.len(), 2);
        assert_eq!(result.entitlement, dec("33"));

        let disabled = VacationEmployee {
            disabled: true,
            ..employee()
        };
        let result = calculate_entitlement(&disabled, 2026, &config(), &specials).unwrap();
        assert_eq!(result.bonus_days, dec("8"));
    }

    #[test]
    fn test_age_is_completed_years_at_basis_start() {
        let specials = vec![SpecialCalculation {
            name: "Age".to_string(),
            rule: BonusRule::Age {
                brackets: vec![BonusBracket { from: 56, to: None, bonus_days: dec("1") }],
            },
        }];
        // Turns 56 in June 2026, so not yet at the start of the year
        let result = calculate_entitlement(&employee(), 2026, &config(), &specials).unwrap();
        assert_eq!(result.bonus_days, Decimal::ZERO);
    }

    #[test]
    fn test_entitlement_rounding() {
        let employee = VacationEmployee {
            hire_date: date(2026, 2, 1),
            ..employee()
        };
        // 30 * 11 / 12 = 27.5
        let half = VacationConfig {
            rounding: EntitlementRounding::HalfDay,
            ..config()
        };
        let full = VacationConfig {
            rounding: EntitlementRounding::FullDay,
            ..config()
        };
        assert_eq!(calculate_entitlement(&employee, 2026, &half, &[]).unwrap().entitlement, dec("27.5"));
        assert_eq!(calculate_entitlement(&employee, 2026, &full, &[]).unwrap().entitlement, dec("28"));

        let employee = VacationEmployee {
            weekly_hours: dec("25"),
            ..employee
        };
        // 27.5 * 0.625 = 17.1875
        assert_eq!(calculate_entitlement(&employee, 2026, &half, &[]).unwrap().entitlement, dec("17"));
        assert_eq!(calculate_entitlement(&employee, 2026, &config(), &[]).unwrap().entitlement, dec("17.19"));
    }

    #[test]
    fn test_not_yet_hired_earns_nothing() {
        let employee = VacationEmployee {
            hire_date: date(2027, 1, 1),
            ..employee()
        };
        let specials = vec![SpecialCalculation {
            name: "Disability".to_string(),
            rule: BonusRule::Disability { bonus_days: dec("5") },
        }];
        let employee = VacationEmployee {
            disabled: true,
            ..employee
        };
        let result = calculate_entitlement(&employee, 2026, &config(), &specials).unwrap();
        assert_eq!(result.months_employed, 0);
        assert_eq!(result.entitlement, Decimal::ZERO);
    }

    // ==========================================================================
    // Carryover and forfeiture
    // ==========================================================================

    #[test]
    fn test_year_end_cap_limits_carryover() {
        let prior = balance(2025, "30", "0", "22");
        let group = year_end_group("5");
        let result = calculate_year_end_carryover(&prior, Uuid::new_v4(), Some(&group), &[]);
        assert_eq!(result.available, dec("8"));
        assert_eq!(result.carryover, dec("5"));
        assert_eq!(result.forfeited, dec("3"));
        assert_eq!(result.applied_rule.as_deref(), Some("year_end"));
    }

    #[test]
    fn test_no_rule_carries_everything() {
        let prior = balance(2025, "30", "0", "22");
        let result = calculate_year_end_carryover(&prior, Uuid::new_v4(), None, &[]);
        assert_eq!(result.carryover, dec("8"));
        assert_eq!(result.forfeited, Decimal::ZERO);
        assert_eq!(result.applied_rule, None);
    }

    #[test]
    fn test_zero_cap_forfeits_everything() {
        let prior = balance(2025, "30", "0", "22");
        let group = year_end_group("0");
        let result = calculate_year_end_carryover(&prior, Uuid::new_v4(), Some(&group), &[]);
        assert_eq!(result.carryover, Decimal::ZERO);
        assert_eq!(result.forfeited, dec("8"));
    }

    #[test]
    fn test_exemptions_on_year_end_rule() {
        let prior = balance(2025, "30", "0", "22");
        let group = year_end_group("0");
        let employee_id = Uuid::new_v4();

        let full = vec![EmployeeException {
            employee_id,
            rule_id: "year_end".to_string(),
            exemption: Exemption::Full,
        }];
        let result = calculate_year_end_carryover(&prior, employee_id, Some(&group), &full);
        assert_eq!(result.carryover, dec("8"));

        let partial = vec![EmployeeException {
            employee_id,
            rule_id: "year_end".to_string(),
            exemption: Exemption::Partial { retain_days: dec("4") },
        }];
        let result = calculate_year_end_carryover(&prior, employee_id, Some(&group), &partial);
        assert_eq!(result.carryover, dec("4"));

        // Someone else's exemption does not apply
        let result = calculate_year_end_carryover(&prior, Uuid::new_v4(), Some(&group), &partial);
        assert_eq!(result.carryover, Decimal::ZERO);
    }

    #[test]
    fn test_negative_balance_carried_unchanged() {
        let prior = balance(2025, "10", "0", "12");
        let group = year_end_group("5");
        let result = calculate_year_end_carryover(&prior, Uuid::new_v4(), Some(&group), &[]);
        assert_eq!(result.carryover, dec("-2"));
        assert_eq!(result.forfeited, Decimal::ZERO);
    }

    #[test]
    fn test_carryover_forfeited_after_cutoff() {
        let current = balance(2026, "30", "3", "0");
        let group = march_group("0");
        let result = apply_mid_year_forfeiture(
            &current,
            Uuid::new_v4(),
            Some(&group),
            &[],
            date(2026, 4, 1),
            Decimal::ZERO,
        )
        .unwrap();
        assert_eq!(result.forfeited, dec("3"));
        assert_eq!(result.carryover_after, Decimal::ZERO);
        assert_eq!(result.balance.carryover_in, Decimal::ZERO);
        assert_eq!(result.balance.available(), dec("30"));
    }

    #[test]
    fn test_carryover_kept_on_cutoff_date() {
        let current = balance(2026, "30", "3", "0");
        let group = march_group("0");
        let result = apply_mid_year_forfeiture(
            &current,
            Uuid::new_v4(),
            Some(&group),
            &[],
            date(2026, 3, 31),
            Decimal::ZERO,
        )
        .unwrap();
        assert_eq!(result.forfeited, Decimal::ZERO);
        assert_eq!(result.carryover_after, dec("3"));
    }

    #[test]
    fn test_days_taken_before_cutoff_consume_carryover() {
        let current = balance(2026, "30", "3", "2");
        let group = march_group("0");
        let result = apply_mid_year_forfeiture(
            &current,
            Uuid::new_v4(),
            Some(&group),
            &[],
            date(2026, 4, 1),
            dec("2"),
        )
        .unwrap();
        assert_eq!(result.forfeited, dec("1"));
        assert_eq!(result.carryover_after, dec("2"));
    }

    #[test]
    fn test_partial_exemption_retains_days_after_cutoff() {
        let current = balance(2026, "30", "6", "0");
        let group = march_group("0");
        let employee_id = Uuid::new_v4();
        let exceptions = vec![EmployeeException {
            employee_id,
            rule_id: "march".to_string(),
            exemption: Exemption::Partial { retain_days: dec("2") },
        }];
        let result = apply_mid_year_forfeiture(
            &current,
            employee_id,
            Some(&group),
            &exceptions,
            date(2026, 4, 1),
            Decimal::ZERO,
        )
        .unwrap();
        assert_eq!(result.forfeited, dec("4"));
        assert_eq!(result.carryover_after, dec("2"));
    }

    #[test]
    fn test_year_end_rules_ignored_by_forfeiture() {
        let current = balance(2026, "30", "3", "0");
        let group = year_end_group("0");
        let result = apply_mid_year_forfeiture(
            &current,
            Uuid::new_v4(),
            Some(&group),
            &[],
            date(2026, 12, 31),
            Decimal::ZERO,
        )
        .unwrap();
        assert_eq!(result.forfeited, Decimal::ZERO);
    }

    // ==========================================================================
    // Group resolution and yearly pipeline
    // ==========================================================================

    #[test]
    fn test_employee_group_overrides_tariff_default() {
        let groups = vec![year_end_group("5"), march_group("0")];
        let resolved = resolve_capping_group(&groups, Some("standard"), Some("march")).unwrap();
        assert_eq!(resolved.map(|g| g.name.as_str()), Some("march"));

        let resolved = resolve_capping_group(&groups, Some("standard"), None).unwrap();
        assert_eq!(resolved.map(|g| g.name.as_str()), Some("standard"));

        assert_eq!(resolve_capping_group(&groups, None, None).unwrap(), None);
    }

    #[test]
    fn test_unknown_group_is_error() {
        let groups = vec![year_end_group("5")];
        match resolve_capping_group(&groups, None, Some("gone")) {
            Err(EngineError::CappingGroupNotFound { name }) => assert_eq!(name, "gone"),
            other => panic!("Expected CappingGroupNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_vacation_years_carry_balance_forward() {
        let employee = employee();
        let reference = reference(vec![year_end_group("5")], Some("standard"));
        let inputs = vec![
            VacationYearInput {
                taken: dec("22"),
                ..VacationYearInput::new(2025)
            },
            VacationYearInput {
                taken: dec("10"),
                ..VacationYearInput::new(2026)
            },
        ];

        let results = calculate_vacation_years(&employee, None, &inputs, &reference).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].balance.available(), dec("8"));
        assert!(results[0].carryover.is_none());

        let second = &results[1];
        assert_eq!(second.balance.carryover_in, dec("5"));
        assert_eq!(second.balance.available(), dec("25"));
        let rule_ids: Vec<_> = second.audit_steps.iter().map(|s| s.rule_id.as_str()).collect();
        assert_eq!(
            rule_ids,
            vec!["entitlement", "year_end_carryover", "mid_year_forfeiture", "taken"]
        );
    }

    #[test]
    fn test_mid_year_forfeiture_in_yearly_pipeline() {
        let employee = employee();
        let reference = reference(vec![march_group("0")], Some("march"));
        let opening = balance(2025, "30", "0", "27");
        let input = VacationYearInput {
            taken: dec("5"),
            taken_by_cutoff: dec("1"),
            evaluation_date: Some(date(2026, 4, 1)),
            ..VacationYearInput::new(2026)
        };

        let result = calculate_vacation_year(&employee, Some(&opening), &input, &reference).unwrap();
        assert_eq!(result.carryover.as_ref().unwrap().carryover, dec("3"));
        assert_eq!(result.forfeiture.as_ref().unwrap().forfeited, dec("2"));
        assert_eq!(result.balance.carryover_in, dec("1"));
        assert_eq!(result.balance.available(), dec("26"));
    }

    #[test]
    fn test_years_must_be_consecutive() {
        let employee = employee();
        let reference = reference(Vec::new(), None);
        let inputs = vec![VacationYearInput::new(2025), VacationYearInput::new(2027)];
        assert!(matches!(
            calculate_vacation_years(&employee, None, &inputs, &reference),
            Err(EngineError::OutOfOrder { .. })
        ));

        let inputs = vec![VacationYearInput::new(2025), VacationYearInput::new(2025)];
        assert!(matches!(
            calculate_vacation_years(&employee, None, &inputs, &reference),
            Err(EngineError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_taking_more_than_available_fails() {
        let employee = employee();
        let reference = reference(Vec::new(), None);
        let input = VacationYearInput {
            taken: dec("31"),
            ..VacationYearInput::new(2026)
        };
        assert!(matches!(
            calculate_vacation_year(&employee, None, &input, &reference),
            Err(EngineError::InsufficientVacation { .. })
        ));

        let adjusted = VacationYearInput {
            adjustments: dec("1"),
            ..input
        };
        let result = calculate_vacation_year(&employee, None, &adjusted, &reference).unwrap();
        assert_eq!(result.balance.available(), Decimal::ZERO);
    }
}
