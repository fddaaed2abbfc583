//! Surcharge rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::clock::{MINUTES_PER_DAY, Minutes};
use super::daily_result::DayContext;
use super::schedule::{HolidayCategory, TimeWindow};

/// How overlapping minutes are turned into a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurchargeMode {
    /// `value` once per overlapping pair.
    Fixed,
    /// Overlap minutes multiplied by `value`.
    PerMinute,
    /// Pair duration multiplied by `value` percent.
    Percentage,
}

/// Credits a bonus account for work inside a time window.
///
/// The window is half-open (`[start, end)`) and never wraps past midnight;
/// use [`SurchargeRule::overnight`] for windows such as 22:00 to 06:00.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeRule {
    /// Account credited by the rule.
    pub account: String,
    /// The time window, start inclusive and end exclusive.
    pub window: TimeWindow,
    /// Applies on public holidays.
    #[serde(default)]
    pub applies_on_holidays: bool,
    /// Applies on regular working days.
    #[serde(default = "default_true")]
    pub applies_on_workdays: bool,
    /// Restricts holiday application to these categories; empty means all.
    #[serde(default)]
    pub holiday_categories: Vec<HolidayCategory>,
    /// Conversion mode.
    pub mode: SurchargeMode,
    /// Amount, rate or percentage depending on the mode.
    pub value: Decimal,
}

fn default_true() -> bool {
    true
}

impl SurchargeRule {
    /// Creates a workday rule.
    pub fn new(
        account: impl Into<String>,
        window: TimeWindow,
        mode: SurchargeMode,
        value: Decimal,
    ) -> Self {
        Self {
            account: account.into(),
            window,
            applies_on_holidays: false,
            applies_on_workdays: true,
            holiday_categories: Vec::new(),
            mode,
            value,
        }
    }

    /// Splits a window that wraps midnight into two rules.
    ///
    /// # Example
    ///
    /// ```
    /// use worktime_engine::models::{SurchargeMode, SurchargeRule};
    /// use rust_decimal::Decimal;
    ///
    /// let rules = SurchargeRule::overnight("NIGHT", 1320, 360, SurchargeMode::PerMinute, Decimal::ONE)
    ///     .unwrap();
    /// assert_eq!(rules[0].window.start, 1320);
    /// assert_eq!(rules[0].window.end, 1440);
    /// assert_eq!(rules[1].window.start, 0);
    /// assert_eq!(rules[1].window.end, 360);
    /// ```
    pub fn overnight(
        account: impl Into<String>,
        start: Minutes,
        end: Minutes,
        mode: SurchargeMode,
        value: Decimal,
    ) -> EngineResult<[SurchargeRule; 2]> {
        let account = account.into();
        if start <= end {
            return Err(EngineError::InvalidSurchargeRule {
                account,
                message: format!(
                    "overnight window must wrap midnight, got {}..{}",
                    start, end
                ),
            });
        }
        let evening = Self::new(
            account.clone(),
            TimeWindow::new(start, MINUTES_PER_DAY),
            mode,
            value,
        );
        let morning = Self::new(account, TimeWindow::new(0, end), mode, value);
        evening.validate()?;
        morning.validate()?;
        Ok([evening, morning])
    }

    /// Rejects empty, inverted or out-of-day windows.
    pub fn validate(&self) -> EngineResult<()> {
        let window = self.window;
        if window.start < 0 || window.end > MINUTES_PER_DAY {
            return Err(EngineError::InvalidSurchargeRule {
                account: self.account.clone(),
                message: format!(
                    "window {}..{} lies outside the day (0..=1440)",
                    window.start, window.end
                ),
            });
        }
        if window.start >= window.end {
            return Err(EngineError::InvalidSurchargeRule {
                account: self.account.clone(),
                message: format!(
                    "window start {} must be before end {}; split overnight windows in two",
                    window.start, window.end
                ),
            });
        }
        if self.account.trim().is_empty() {
            return Err(EngineError::InvalidSurchargeRule {
                account: self.account.clone(),
                message: "account must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Returns true if the rule applies on the given day.
    pub fn applies_to(&self, day: &DayContext) -> bool {
        match day.holiday {
            Some(category) => {
                self.applies_on_holidays
                    && (self.holiday_categories.is_empty()
                        || self.holiday_categories.contains(&category))
            }
            None => self.applies_on_workdays,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn night() -> SurchargeRule {
        SurchargeRule::new(
            "NIGHT",
            TimeWindow::new(1320, 1440),
            SurchargeMode::PerMinute,
            Decimal::ONE,
        )
    }

    #[test]
    fn test_valid_rule_passes() {
        assert!(night().validate().is_ok());
    }

    #[test]
    fn test_wrapping_window_is_rejected() {
        let rule = SurchargeRule {
            window: TimeWindow::new(1320, 360),
            ..night()
        };
        match rule.validate() {
            Err(EngineError::InvalidSurchargeRule { account, .. }) => assert_eq!(account, "NIGHT"),
            other => panic!("Expected InvalidSurchargeRule, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_window_is_rejected() {
        let rule = SurchargeRule {
            window: TimeWindow::new(600, 600),
            ..night()
        };
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_overnight_requires_wrapping_window() {
        assert!(
            SurchargeRule::overnight("NIGHT", 360, 1320, SurchargeMode::Fixed, Decimal::ONE)
                .is_err()
        );
    }

    #[test]
    fn test_holiday_filter() {
        let rule = SurchargeRule {
            applies_on_holidays: true,
            applies_on_workdays: false,
            holiday_categories: vec![1],
            ..night()
        };
        assert!(rule.applies_to(&DayContext::holiday(1)));
        assert!(!rule.applies_to(&DayContext::holiday(2)));
        assert!(!rule.applies_to(&DayContext::workday()));
    }

    #[test]
    fn test_workday_default_from_yaml() {
        let yaml = r#"
account: NIGHT
window: { start: "22:00", end: "24:00" }
mode: per_minute
value: "0.25"
"#;
        let rule: SurchargeRule = serde_yaml::from_str(yaml).unwrap();
        assert!(rule.applies_on_workdays);
        assert!(!rule.applies_on_holidays);
        assert_eq!(rule.window, TimeWindow::new(1320, 1440));
        assert_eq!(rule.value, Decimal::new(25, 2));
    }
}
