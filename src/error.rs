//! Error types for the working-time engine.
//!
//! Only malformed input and configuration surface as [`EngineError`]. Business
//! rule conditions (missing bookings, core-time violations, caps) never do;
//! they are recorded as codes inside the returned results.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for the working-time engine.
///
/// An error aborts the computation of a single unit (one employee-day,
/// month or vacation year). Callers skip persisting that unit and carry on
/// with the rest of their batch.
///
/// # Example
///
/// ```
/// use worktime_engine::error::EngineError;
///
/// let error = EngineError::ScheduleNotFound {
///     code: "NIGHT".to_string(),
/// };
/// assert_eq!(error.to_string(), "Schedule not found: NIGHT");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A configuration value is missing or inconsistent.
    #[error("Invalid configuration '{field}': {message}")]
    InvalidConfig {
        /// The configuration field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A schedule code was not found in the schedule catalog.
    #[error("Schedule not found: {code}")]
    ScheduleNotFound {
        /// The schedule code that was not found.
        code: String,
    },

    /// A booking carried a time outside the valid minute range.
    #[error("Invalid time {minutes} on booking {booking_id}: expected 0..=1439")]
    InvalidTime {
        /// The booking carrying the invalid time.
        booking_id: Uuid,
        /// The offending minute value.
        minutes: i32,
    },

    /// A booking was inconsistent with the day being calculated.
    #[error("Invalid booking {booking_id}: {message}")]
    InvalidBooking {
        /// The ID of the invalid booking.
        booking_id: Uuid,
        /// A description of what made the booking invalid.
        message: String,
    },

    /// A surcharge rule was rejected at configuration time.
    #[error("Invalid surcharge rule for account '{account}': {message}")]
    InvalidSurchargeRule {
        /// The target account of the rejected rule.
        account: String,
        /// A description of why the rule was rejected.
        message: String,
    },

    /// Inputs that carry a balance forward were not in ascending order.
    #[error("Out of order input: {message}")]
    OutOfOrder {
        /// A description of the ordering violation.
        message: String,
    },

    /// A capping rule group referenced by a tariff or employee does not exist.
    #[error("Capping rule group not found: {name}")]
    CappingGroupNotFound {
        /// The name of the missing group.
        name: String,
    },

    /// Taking vacation would drive the available balance negative.
    #[error("Insufficient vacation in {year}: requested {requested} days, {available} available")]
    InsufficientVacation {
        /// The vacation year.
        year: i32,
        /// The number of days requested.
        requested: Decimal,
        /// The number of days still available.
        available: Decimal,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/schedules.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/schedules.yaml"
        );
    }

    #[test]
    fn test_invalid_time_displays_booking_and_value() {
        let error = EngineError::InvalidTime {
            booking_id: Uuid::nil(),
            minutes: 1500,
        };
        assert_eq!(
            error.to_string(),
            "Invalid time 1500 on booking 00000000-0000-0000-0000-000000000000: expected 0..=1439"
        );
    }

    #[test]
    fn test_invalid_config_displays_field_and_message() {
        let error = EngineError::InvalidConfig {
            field: "FLEX.alternatives".to_string(),
            message: "at most 6 alternative schedules are allowed".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration 'FLEX.alternatives': at most 6 alternative schedules are allowed"
        );
    }

    #[test]
    fn test_invalid_surcharge_rule_displays_account() {
        let error = EngineError::InvalidSurchargeRule {
            account: "night".to_string(),
            message: "window start 1320 is not before end 360".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid surcharge rule for account 'night': window start 1320 is not before end 360"
        );
    }

    #[test]
    fn test_insufficient_vacation_displays_amounts() {
        let error = EngineError::InsufficientVacation {
            year: 2025,
            requested: Decimal::from_str("3.5").unwrap(),
            available: Decimal::from(2),
        };
        assert_eq!(
            error.to_string(),
            "Insufficient vacation in 2025: requested 3.5 days, 2 available"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_group_not_found() -> EngineResult<()> {
            Err(EngineError::CappingGroupNotFound {
                name: "standard".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_group_not_found()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
