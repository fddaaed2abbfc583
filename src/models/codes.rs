//! Error and warning codes recorded inside calculation results.
//!
//! These are business-rule findings, not failures: the result carrying them is
//! still produced and persisted so that manual correction can pick it up.

use serde::{Deserialize, Serialize};

/// A business-rule violation that needs correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No bookings on a day that requires them.
    NoBookings,
    /// A departure without a matching arrival.
    MissingArrival,
    /// An arrival without a matching departure.
    MissingDeparture,
    /// First arrival before the arrival window.
    EarlyArrival,
    /// First arrival after the arrival window.
    LateArrival,
    /// Last departure before the departure window.
    EarlyDeparture,
    /// Last departure after the departure window.
    LateDeparture,
    /// Arrived after core hours started.
    MissedCoreStart,
    /// Left before core hours ended.
    MissedCoreEnd,
    /// Net time below the schedule's minimum.
    BelowMinWorkTime,
}

impl ErrorCode {
    /// The code as stored by collaborators.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NoBookings => "NO_BOOKINGS",
            ErrorCode::MissingArrival => "MISSING_ARRIVAL",
            ErrorCode::MissingDeparture => "MISSING_DEPARTURE",
            ErrorCode::EarlyArrival => "EARLY_ARRIVAL",
            ErrorCode::LateArrival => "LATE_ARRIVAL",
            ErrorCode::EarlyDeparture => "EARLY_DEPARTURE",
            ErrorCode::LateDeparture => "LATE_DEPARTURE",
            ErrorCode::MissedCoreStart => "MISSED_CORE_START",
            ErrorCode::MissedCoreEnd => "MISSED_CORE_END",
            ErrorCode::BelowMinWorkTime => "BELOW_MIN_WORK_TIME",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A condition worth reporting that does not invalidate the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    /// A shift crossed midnight.
    CrossMidnight,
    /// An open day was closed at midnight automatically.
    AutoCompleted,
    /// A pairing reference pointed at an incompatible booking and was ignored.
    IgnoredPairReference,
    /// Net time was capped at the schedule's maximum.
    MaxTimeReached,
    /// A manual break booking suppressed the variable break.
    ManualBreak,
    /// A minimum break was enforced without any booked break.
    NoBreakRecorded,
    /// A break rule deducted time automatically.
    AutoBreakApplied,
    /// Shift detection found no matching schedule.
    NoMatchingShift,
    /// Shift detection switched to an alternative schedule.
    ShiftDetected,
    /// Target credited as a vocational school day.
    VocationalSchoolDay,
    /// Target credited to the default order.
    TargetCreditedToOrder,
    /// Holiday credit applied.
    HolidayCredited,
    /// The monthly credit cap forfeited overtime.
    MonthlyCapReached,
    /// The flextime balance hit a balance cap.
    FlextimeCapped,
    /// Overtime stayed below the carryover threshold.
    BelowThreshold,
    /// The credit type carries no balance.
    NoCarryover,
    /// At least one day of the month still carries error codes.
    DaysWithErrors,
}

impl WarningCode {
    /// The code as stored by collaborators.
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::CrossMidnight => "CROSS_MIDNIGHT",
            WarningCode::AutoCompleted => "AUTO_COMPLETED",
            WarningCode::IgnoredPairReference => "IGNORED_PAIR_REFERENCE",
            WarningCode::MaxTimeReached => "MAX_TIME_REACHED",
            WarningCode::ManualBreak => "MANUAL_BREAK",
            WarningCode::NoBreakRecorded => "NO_BREAK_RECORDED",
            WarningCode::AutoBreakApplied => "AUTO_BREAK_APPLIED",
            WarningCode::NoMatchingShift => "NO_MATCHING_SHIFT",
            WarningCode::ShiftDetected => "SHIFT_DETECTED",
            WarningCode::VocationalSchoolDay => "VOCATIONAL_SCHOOL_DAY",
            WarningCode::TargetCreditedToOrder => "TARGET_CREDITED_TO_ORDER",
            WarningCode::HolidayCredited => "HOLIDAY_CREDITED",
            WarningCode::MonthlyCapReached => "MONTHLY_CAP_REACHED",
            WarningCode::FlextimeCapped => "FLEXTIME_CAPPED",
            WarningCode::BelowThreshold => "BELOW_THRESHOLD",
            WarningCode::NoCarryover => "NO_CARRYOVER",
            WarningCode::DaysWithErrors => "DAYS_WITH_ERRORS",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pushes a code unless it is already present.
pub(crate) fn push_unique<T: PartialEq>(codes: &mut Vec<T>, code: T) {
    if !codes.contains(&code) {
        codes.push(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serialization_matches_as_str() {
        for code in [
            ErrorCode::NoBookings,
            ErrorCode::MissingDeparture,
            ErrorCode::MissedCoreStart,
            ErrorCode::BelowMinWorkTime,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_warning_code_serialization_matches_as_str() {
        for code in [
            WarningCode::CrossMidnight,
            WarningCode::NoMatchingShift,
            WarningCode::FlextimeCapped,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_push_unique_skips_duplicates() {
        let mut codes = vec![WarningCode::CrossMidnight];
        push_unique(&mut codes, WarningCode::CrossMidnight);
        push_unique(&mut codes, WarningCode::ManualBreak);
        assert_eq!(codes, vec![WarningCode::CrossMidnight, WarningCode::ManualBreak]);
    }
}
