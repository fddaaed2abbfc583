//! Configuration loading and management for the working-time engine.
//!
//! This module loads a tariff's schedules, surcharge rules, monthly carryover
//! settings and vacation reference data from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use worktime_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/standard").unwrap();
//! println!("Loaded configuration: {}", config.engine().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{EngineConfig, EngineMetadata, SchedulesFile, SurchargesFile};
