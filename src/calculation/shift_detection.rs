//! Shift detection: resolving the schedule a day was actually worked on.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::EngineResult;
use crate::models::{Minutes, ScheduleCatalog, ScheduleConfig, WarningCode};

/// How the effective schedule was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShiftMatch {
    /// The assigned schedule has no detection windows.
    NotConfigured,
    /// The assigned schedule's detection windows matched.
    Assigned,
    /// An alternative schedule matched.
    Alternative {
        /// Position in the assigned schedule's alternatives.
        index: usize,
        /// Code of the matched schedule.
        code: String,
    },
    /// Nothing matched; the assigned schedule is kept.
    NoMatch,
}

/// The schedule a day is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftDetection<'a> {
    /// The effective schedule.
    pub schedule: &'a ScheduleConfig,
    /// How it was chosen.
    pub matched: ShiftMatch,
    /// Warnings raised by detection.
    pub warnings: Vec<WarningCode>,
}

/// Resolves the effective schedule from the day's first arrival and last departure.
///
/// The assigned schedule is kept when it has no detection windows or when
/// they match; otherwise the alternatives are tried in order and the first
/// match wins. An alternative missing from `catalog` is an error even if an
/// earlier one matched.
///
/// # Example
///
/// ```
/// use worktime_engine::calculation::{ShiftMatch, detect_shift};
/// use worktime_engine::models::{
///     DetectionWindows, ScheduleCatalog, ScheduleConfig, ScheduleType, TimeWindow,
/// };
///
/// let early = ScheduleConfig {
///     detection: DetectionWindows { arrival: Some(TimeWindow::new(300, 420)), departure: None },
///     alternatives: vec!["LATE".to_string()],
///     ..ScheduleConfig::new("EARLY", ScheduleType::Fixed, 480)
/// };
/// let late = ScheduleConfig {
///     detection: DetectionWindows { arrival: Some(TimeWindow::new(780, 900)), departure: None },
///     ..ScheduleConfig::new("LATE", ScheduleType::Fixed, 480)
/// };
/// let catalog = ScheduleCatalog::new(vec![early.clone(), late]).unwrap();
///
/// let detection = detect_shift(&early, &catalog, Some(840), Some(1320)).unwrap();
/// assert_eq!(detection.schedule.code, "LATE");
/// assert!(matches!(detection.matched, ShiftMatch::Alternative { index: 0, .. }));
/// ```
pub fn detect_shift<'a>(
    assigned: &'a ScheduleConfig,
    catalog: &'a ScheduleCatalog,
    first_arrival: Option<Minutes>,
    last_departure: Option<Minutes>,
) -> EngineResult<ShiftDetection<'a>> {
    let alternatives = assigned
        .alternatives
        .iter()
        .map(|code| catalog.get(code))
        .collect::<EngineResult<Vec<_>>>()?;

    if !assigned.detection.is_configured() {
        return Ok(ShiftDetection {
            schedule: assigned,
            matched: ShiftMatch::NotConfigured,
            warnings: Vec::new(),
        });
    }

    if assigned.detection.matches(first_arrival, last_departure) {
        debug!(schedule = %assigned.code, "Assigned schedule matched");
        return Ok(ShiftDetection {
            schedule: assigned,
            matched: ShiftMatch::Assigned,
            warnings: Vec::new(),
        });
    }

    for (index, alternative) in alternatives.into_iter().enumerate() {
        if alternative.detection.matches(first_arrival, last_departure) {
            debug!(
                assigned = %assigned.code,
                detected = %alternative.code,
                index,
                "Alternative schedule matched"
            );
            return Ok(ShiftDetection {
                schedule: alternative,
                matched: ShiftMatch::Alternative {
                    index,
                    code: alternative.code.clone(),
                },
                warnings: vec![WarningCode::ShiftDetected],
            });
        }
    }

    warn!(
        schedule = %assigned.code,
        ?first_arrival,
        ?last_departure,
        "No matching shift, keeping assigned schedule"
    );
    Ok(ShiftDetection {
        schedule: assigned,
        matched: ShiftMatch::NoMatch,
        warnings: vec![WarningCode::NoMatchingShift],
    })
}
