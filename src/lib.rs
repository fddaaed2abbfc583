//! Working-Time Calculation Engine
//!
//! This crate turns raw clock-in and clock-out bookings plus a schedule
//! configuration into verified daily results, aggregates daily results into
//! monthly flextime balances, and computes annual vacation entitlement,
//! carryover and forfeiture.
//!
//! Every calculation is a pure function of its arguments. Configuration is
//! loaded once through [`config::ConfigLoader`] and passed in explicitly.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
