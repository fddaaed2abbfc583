//! Core data models for the working-time engine.
//!
//! This module contains the booking, schedule and result types used
//! throughout the engine, together with the monthly and vacation models.

mod booking;
mod clock;
mod codes;
mod daily_result;
mod monthly;
mod schedule;
mod surcharge;
mod vacation;

pub(crate) use codes::push_unique;

pub use booking::{
    BookingCategory, BookingEvent, BookingPair, Direction, PairBoundary, validate_minutes,
};
pub use clock::{LAST_MINUTE_OF_DAY, MINUTES_PER_DAY, Minutes, format_clock, parse_clock};
pub use codes::{ErrorCode, WarningCode};
pub use daily_result::{
    AuditStep, AuditTrail, CappingItem, CappingResult, CappingSource, DailyResult, DayContext,
    DayStatus,
};
pub use monthly::{AppliedCap, CapKind, CreditType, MonthlyConfig, MonthlyResult, MonthlyTotals};
pub use schedule::{
    BreakKind, BreakRule, DayChangeBehavior, DetectionWindows, HolidayCategory,
    MAX_ALTERNATIVE_SCHEDULES, NoBookingBehavior, RoundingConfig, RoundingMode, ScheduleCatalog,
    ScheduleConfig, ScheduleType, TimeWindow, Tolerance,
};
pub use surcharge::{SurchargeMode, SurchargeRule};
pub use vacation::{
    BonusBracket, BonusRule, CappingRule, CappingRuleGroup, CappingScope, CutoffDate,
    EmployeeException, EntitlementRounding, Exemption, SpecialCalculation, VacationBasis,
    VacationConfig, VacationEmployee, VacationReferenceData, VacationYearBalance,
};
