//! Schedule (day plan) configuration.
//!
//! A [`ScheduleConfig`] describes how one working day is evaluated: the
//! arrival and departure windows, tolerance and rounding policy, break rules,
//! net-time limits and what to do when nothing was booked.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::clock::{MINUTES_PER_DAY, Minutes, serde_minutes};

/// Holiday category as configured in the holiday calendar (e.g. 1 = full, 2 = half).
pub type HolidayCategory = u8;

/// Maximum number of alternative schedules consulted by shift detection.
pub const MAX_ALTERNATIVE_SCHEDULES: usize = 6;

/// An inclusive span of minutes within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// First minute of the window.
    #[serde(with = "serde_minutes")]
    pub start: Minutes,
    /// Last minute of the window.
    #[serde(with = "serde_minutes")]
    pub end: Minutes,
}

impl TimeWindow {
    /// Creates a window from two minute values.
    pub const fn new(start: Minutes, end: Minutes) -> Self {
        Self { start, end }
    }

    /// Returns true if `minutes` lies within the window, edges included.
    pub fn contains(&self, minutes: Minutes) -> bool {
        self.start <= minutes && minutes <= self.end
    }

    /// Length of the window in minutes.
    pub fn len(&self) -> Minutes {
        (self.end - self.start).max(0)
    }

    /// Returns true if the window spans no time.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate(&self, field: &str) -> EngineResult<()> {
        if self.start < 0 || self.end > MINUTES_PER_DAY {
            return Err(EngineError::InvalidConfig {
                field: field.to_string(),
                message: format!(
                    "window {}..{} lies outside the day (0..=1440)",
                    self.start, self.end
                ),
            });
        }
        if self.start > self.end {
            return Err(EngineError::InvalidConfig {
                field: field.to_string(),
                message: format!("window start {} is after end {}", self.start, self.end),
            });
        }
        Ok(())
    }
}

/// Fixed or flexible working hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    /// Rigid arrival and departure times.
    Fixed,
    /// A flexible band around core hours.
    Flextime,
}

/// Grace bands around the arrival and departure windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Minutes after the arrival window that still snap to its end.
    pub arrival_plus: Minutes,
    /// Minutes before the arrival window that still snap to its start.
    pub arrival_minus: Minutes,
    /// Minutes after the departure window that still snap to its end.
    pub departure_plus: Minutes,
    /// Minutes before the departure window that still snap to its start.
    pub departure_minus: Minutes,
}

/// How a booking time is rounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Leave the time unchanged.
    #[default]
    None,
    /// Round up to the next interval boundary.
    Up,
    /// Round down to the previous interval boundary.
    Down,
    /// Round to the closest interval boundary (halves round up).
    Nearest,
    /// Add a fixed number of minutes.
    Add,
    /// Subtract a fixed number of minutes.
    Subtract,
}

/// Rounding policy for one booking direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundingConfig {
    /// The rounding mode.
    pub mode: RoundingMode,
    /// Interval in minutes for `up`, `down` and `nearest`.
    pub interval: Minutes,
    /// Minutes for `add` and `subtract`.
    pub value: Minutes,
    /// Round every booking of this direction, not only the first arrival / last departure.
    pub apply_to_all: bool,
}

/// The type of a break rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakKind {
    /// Deducted wherever work overlaps the break window.
    Fixed,
    /// Deducted once unless a break was booked manually.
    Variable,
    /// Enforced once work exceeds a threshold.
    Minimum,
}

/// A single break rule of a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakRule {
    /// The rule type.
    pub kind: BreakKind,
    /// Break window for fixed breaks.
    #[serde(default)]
    pub window: Option<TimeWindow>,
    /// Gross work minutes that must be exceeded before the rule applies.
    #[serde(default)]
    pub after_work_minutes: Option<Minutes>,
    /// Length of the break in minutes.
    pub duration: Minutes,
    /// Deduct only the minutes worked past the threshold, up to `duration`.
    #[serde(default)]
    pub proportional: bool,
    /// Paid breaks do not reduce net time.
    #[serde(default)]
    pub paid: bool,
}

/// What to credit on a day without any bookings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoBookingBehavior {
    /// Flag the day as erroneous for manual correction.
    #[default]
    Error,
    /// Book the full target as undertime.
    DeductTarget,
    /// Credit the target as a vocational school day.
    VocationalSchool,
    /// Credit the target as worked.
    AdoptTarget,
    /// Credit the target and attribute it to the employee's default order.
    TargetWithOrder,
}

/// How shifts crossing midnight are attributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayChangeBehavior {
    /// Split at midnight; each part counts on its own day.
    #[default]
    None,
    /// The whole shift counts on the day of arrival.
    EvaluateAtArrival,
    /// The whole shift counts on the day of departure.
    EvaluateAtDeparture,
    /// Split at midnight and close open days automatically.
    AutoComplete,
}

/// Windows used to recognise which schedule a day was actually worked on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionWindows {
    /// Window the first arrival must fall in.
    pub arrival: Option<TimeWindow>,
    /// Window the last departure must fall in.
    pub departure: Option<TimeWindow>,
}

impl DetectionWindows {
    /// Returns true if at least one window is configured.
    pub fn is_configured(&self) -> bool {
        self.arrival.is_some() || self.departure.is_some()
    }

    /// Returns true if every configured window contains its time.
    pub fn matches(&self, first_arrival: Option<Minutes>, last_departure: Option<Minutes>) -> bool {
        if !self.is_configured() {
            return false;
        }
        let arrival_ok = match (self.arrival, first_arrival) {
            (Some(window), Some(time)) => window.contains(time),
            (Some(_), None) => false,
            (None, _) => true,
        };
        let departure_ok = match (self.departure, last_departure) {
            (Some(window), Some(time)) => window.contains(time),
            (Some(_), None) => false,
            (None, _) => true,
        };
        arrival_ok && departure_ok
    }
}

/// The configuration a working day is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Unique schedule code.
    pub code: String,
    /// Fixed or flextime.
    pub schedule_type: ScheduleType,
    /// Allowed arrival window; its start is also the evaluation window start.
    #[serde(default)]
    pub arrival_window: Option<TimeWindow>,
    /// Allowed departure window; its end is also the evaluation window end.
    #[serde(default)]
    pub departure_window: Option<TimeWindow>,
    /// Core hours for flextime schedules.
    #[serde(default)]
    pub core_window: Option<TimeWindow>,
    /// Target working minutes for the day.
    pub target_minutes: Minutes,
    /// Grace bands around the windows.
    #[serde(default)]
    pub tolerance: Tolerance,
    /// Allows early arrival tolerance and early capping extension on fixed schedules.
    #[serde(default)]
    pub variable_work_time: bool,
    /// Rounding of arrival bookings.
    #[serde(default)]
    pub arrival_rounding: RoundingConfig,
    /// Rounding of departure bookings.
    #[serde(default)]
    pub departure_rounding: RoundingConfig,
    /// Break rules, applied in order.
    #[serde(default)]
    pub breaks: Vec<BreakRule>,
    /// Minimum net minutes; less is flagged.
    #[serde(default)]
    pub min_net_minutes: Option<Minutes>,
    /// Maximum creditable net minutes; more is capped.
    #[serde(default)]
    pub max_net_minutes: Option<Minutes>,
    /// Minutes credited on holidays without bookings, by holiday category.
    #[serde(default)]
    pub holiday_credits: BTreeMap<HolidayCategory, Minutes>,
    /// Behaviour on days without bookings.
    #[serde(default)]
    pub no_booking_behavior: NoBookingBehavior,
    /// Behaviour for shifts crossing midnight.
    #[serde(default)]
    pub day_change_behavior: DayChangeBehavior,
    /// Windows used by shift detection.
    #[serde(default)]
    pub detection: DetectionWindows,
    /// Ordered codes of alternative schedules for shift detection.
    #[serde(default)]
    pub alternatives: Vec<String>,
}

impl ScheduleConfig {
    /// Creates a schedule with no windows, rules or alternatives.
    pub fn new(code: impl Into<String>, schedule_type: ScheduleType, target_minutes: Minutes) -> Self {
        Self {
            code: code.into(),
            schedule_type,
            arrival_window: None,
            departure_window: None,
            core_window: None,
            target_minutes,
            tolerance: Tolerance::default(),
            variable_work_time: false,
            arrival_rounding: RoundingConfig::default(),
            departure_rounding: RoundingConfig::default(),
            breaks: Vec::new(),
            min_net_minutes: None,
            max_net_minutes: None,
            holiday_credits: BTreeMap::new(),
            no_booking_behavior: NoBookingBehavior::default(),
            day_change_behavior: DayChangeBehavior::default(),
            detection: DetectionWindows::default(),
            alternatives: Vec::new(),
        }
    }

    /// Returns true for flextime schedules.
    pub fn is_flextime(&self) -> bool {
        self.schedule_type == ScheduleType::Flextime
    }

    /// Checks the schedule for internally inconsistent values.
    pub fn validate(&self) -> EngineResult<()> {
        let field = |name: &str| format!("{}.{}", self.code, name);
        let invalid = |name: &str, message: String| EngineError::InvalidConfig {
            field: field(name),
            message,
        };

        if self.code.trim().is_empty() {
            return Err(EngineError::InvalidConfig {
                field: "code".to_string(),
                message: "schedule code must not be empty".to_string(),
            });
        }
        if self.target_minutes < 0 {
            return Err(invalid(
                "target_minutes",
                format!("must not be negative, got {}", self.target_minutes),
            ));
        }

        for (name, window) in [
            ("arrival_window", self.arrival_window),
            ("departure_window", self.departure_window),
            ("core_window", self.core_window),
            ("detection.arrival", self.detection.arrival),
            ("detection.departure", self.detection.departure),
        ] {
            if let Some(window) = window {
                window.validate(&field(name))?;
            }
        }

        let tolerance = self.tolerance;
        if [
            tolerance.arrival_plus,
            tolerance.arrival_minus,
            tolerance.departure_plus,
            tolerance.departure_minus,
        ]
        .iter()
        .any(|&t| t < 0)
        {
            return Err(invalid("tolerance", "values must not be negative".to_string()));
        }

        for (name, rounding) in [
            ("arrival_rounding", &self.arrival_rounding),
            ("departure_rounding", &self.departure_rounding),
        ] {
            let needs_interval = matches!(
                rounding.mode,
                RoundingMode::Up | RoundingMode::Down | RoundingMode::Nearest
            );
            if needs_interval && rounding.interval <= 0 {
                return Err(invalid(
                    name,
                    format!("{:?} rounding requires a positive interval", rounding.mode),
                ));
            }
            if rounding.value < 0 {
                return Err(invalid(name, "value must not be negative".to_string()));
            }
        }

        for (index, rule) in self.breaks.iter().enumerate() {
            let name = format!("breaks[{}]", index);
            if rule.duration < 0 {
                return Err(invalid(name.as_str(), "duration must not be negative".to_string()));
            }
            match rule.kind {
                BreakKind::Fixed => match rule.window {
                    Some(window) => window.validate(&field(name.as_str()))?,
                    None => {
                        return Err(invalid(name.as_str(), "fixed breaks require a window".to_string()));
                    }
                },
                BreakKind::Minimum if rule.after_work_minutes.is_none() => {
                    return Err(invalid(
                        name.as_str(),
                        "minimum breaks require after_work_minutes".to_string(),
                    ));
                }
                _ => {}
            }
        }

        if let (Some(min), Some(max)) = (self.min_net_minutes, self.max_net_minutes) {
            if min > max {
                return Err(invalid(
                    "min_net_minutes",
                    format!("minimum {} exceeds maximum {}", min, max),
                ));
            }
        }

        if self.alternatives.len() > MAX_ALTERNATIVE_SCHEDULES {
            return Err(invalid(
                "alternatives",
                format!(
                    "at most {} alternative schedules are allowed, got {}",
                    MAX_ALTERNATIVE_SCHEDULES,
                    self.alternatives.len()
                ),
            ));
        }
        if self.alternatives.iter().any(|code| code == &self.code) {
            return Err(invalid(
                "alternatives",
                "a schedule cannot list itself as an alternative".to_string(),
            ));
        }

        Ok(())
    }
}

/// A read-only set of schedules addressable by code.
///
/// Shift detection resolves alternative schedule codes through the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleCatalog {
    schedules: BTreeMap<String, ScheduleConfig>,
}

impl ScheduleCatalog {
    /// Builds a catalog, validating every schedule and every alternative reference.
    pub fn new(schedules: Vec<ScheduleConfig>) -> EngineResult<Self> {
        let mut map = BTreeMap::new();
        for schedule in schedules {
            schedule.validate()?;
            if map.contains_key(&schedule.code) {
                return Err(EngineError::InvalidConfig {
                    field: schedule.code.clone(),
                    message: "duplicate schedule code".to_string(),
                });
            }
            map.insert(schedule.code.clone(), schedule);
        }

        for schedule in map.values() {
            for code in &schedule.alternatives {
                if !map.contains_key(code) {
                    return Err(EngineError::ScheduleNotFound { code: code.clone() });
                }
            }
        }

        Ok(Self { schedules: map })
    }

    /// Looks up a schedule by code.
    pub fn get(&self, code: &str) -> EngineResult<&ScheduleConfig> {
        self.schedules
            .get(code)
            .ok_or_else(|| EngineError::ScheduleNotFound {
                code: code.to_string(),
            })
    }

    /// Iterates schedules in code order.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduleConfig> {
        self.schedules.values()
    }

    /// Number of schedules in the catalog.
    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    /// Returns true if the catalog holds no schedules.
    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }
}
