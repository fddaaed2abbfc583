//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! configurations from YAML files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    CappingRuleGroup, MonthlyConfig, ScheduleCatalog, ScheduleConfig, SurchargeRule,
    VacationReferenceData,
};

use super::types::{EngineConfig, EngineMetadata, SchedulesFile, SurchargesFile};

/// Loads and provides access to engine configuration.
///
/// The `ConfigLoader` reads YAML configuration files from a directory,
/// validates them and provides methods to query schedules and rules.
///
/// # Directory Structure
///
/// ```text
/// config/standard/
/// ├── engine.yaml       # Configuration metadata
/// ├── schedules.yaml    # Schedule catalog
/// ├── surcharges.yaml   # Surcharge rules
/// ├── monthly.yaml      # Flextime carryover
/// └── vacation.yaml     # Entitlement, bonuses, capping groups, exceptions
/// ```
///
/// # Example
///
/// ```no_run
/// use worktime_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/standard").unwrap();
///
/// let schedule = loader.get_schedule("DAY").unwrap();
/// println!("Target: {} minutes", schedule.target_minutes);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config/standard")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - Any schedule, surcharge rule or capping group is inconsistent
    ///
    /// # Example
    ///
    /// ```no_run
    /// use worktime_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::load("./config/standard")?;
    /// # Ok::<(), worktime_engine::error::EngineError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let metadata = Self::load_yaml::<EngineMetadata>(&path.join("engine.yaml"))?;
        let schedules = Self::load_yaml::<SchedulesFile>(&path.join("schedules.yaml"))?;
        let surcharges = Self::load_yaml::<SurchargesFile>(&path.join("surcharges.yaml"))?;
        let monthly = Self::load_yaml::<MonthlyConfig>(&path.join("monthly.yaml"))?;
        let vacation = Self::load_yaml::<VacationReferenceData>(&path.join("vacation.yaml"))?;

        let config = EngineConfig::new(
            metadata,
            schedules.schedules,
            surcharges.surcharges,
            monthly,
            vacation,
        )?;

        debug!(
            path = %path.display(),
            name = %config.engine().name,
            schedules = config.schedules().len(),
            surcharges = config.surcharges().len(),
            "Loaded engine configuration"
        );

        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the configuration metadata.
    pub fn engine(&self) -> &EngineMetadata {
        self.config.engine()
    }

    /// Gets a schedule by its code.
    ///
    /// Returns `ScheduleNotFound` for an unknown code.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use worktime_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::load("./config/standard")?;
    /// let schedule = loader.get_schedule("FLEX")?;
    /// println!("Core time: {:?}", schedule.core_window);
    /// # Ok::<(), worktime_engine::error::EngineError>(())
    /// ```
    pub fn get_schedule(&self, code: &str) -> EngineResult<&ScheduleConfig> {
        self.config.schedules().get(code)
    }

    /// Returns the schedule catalog used for shift detection.
    pub fn catalog(&self) -> &ScheduleCatalog {
        self.config.schedules()
    }

    /// Returns the surcharge rules.
    pub fn surcharges(&self) -> &[SurchargeRule] {
        self.config.surcharges()
    }

    /// Returns the monthly carryover configuration.
    pub fn monthly(&self) -> &MonthlyConfig {
        self.config.monthly()
    }

    /// Returns the vacation reference data.
    pub fn vacation(&self) -> &VacationReferenceData {
        self.config.vacation()
    }

    /// Gets a capping group by name.
    pub fn capping_group(&self, name: &str) -> EngineResult<&CappingRuleGroup> {
        self.config.capping_group(name)
    }
}
