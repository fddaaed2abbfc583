//! Calculation logic for the working-time engine.
//!
//! The daily pipeline (`calculate_daily_result`) runs shift detection,
//! tolerance and rounding, booking pairing, break deduction and capping in
//! sequence. Surcharges are calculated separately from the same pairs. Daily
//! results are aggregated per month with flextime carryover, and vacation is
//! an independent yearly pipeline.

mod breaks;
mod capping;
mod daily;
mod monthly;
mod overlap;
mod pairing;
mod shift_detection;
mod surcharge;
mod tolerance;
mod vacation;

pub use breaks::{BreakDeduction, BreakDeductionResult, calculate_break_deduction};
pub use capping::{
    aggregate_capping, calculate_max_net_time_capping, calculate_window_capping,
    evaluation_window_end, evaluation_window_start,
};
pub use daily::{DayInput, calculate_daily_result, write_back_calculated_times};
pub use monthly::{aggregate_month, apply_annual_rollover};
pub use overlap::overlap;
pub use pairing::{PairingResult, pair_bookings, relative_minutes};
pub use shift_detection::{ShiftDetection, ShiftMatch, detect_shift};
pub use surcharge::{SurchargeLine, SurchargeResult, calculate_surcharges};
pub use tolerance::{
    NormalizationResult, apply_arrival_tolerance, apply_departure_tolerance, normalize_bookings,
    round_time,
};
pub use vacation::{
    BonusLine, CarryoverResult, EntitlementResult, ForfeitureResult, VacationYearInput,
    VacationYearResult, apply_mid_year_forfeiture, calculate_entitlement,
    calculate_vacation_year, calculate_vacation_years, calculate_year_end_carryover,
    resolve_capping_group,
};
