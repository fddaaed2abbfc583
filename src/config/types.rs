//! Configuration types for the working-time engine.
//!
//! This module contains the file structures that are deserialized from the
//! YAML configuration files and the validated [`EngineConfig`] aggregate.

use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    CappingRuleGroup, MonthlyConfig, ScheduleCatalog, ScheduleConfig, SurchargeRule,
    VacationReferenceData,
};

/// Metadata about the configuration set.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineMetadata {
    /// Human-readable name of the tariff or configuration set.
    pub name: String,
    /// Version of the configuration set.
    pub version: String,
    /// Optional free-text description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Structure of `schedules.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulesFile {
    /// All schedules of the tariff, alternatives included.
    pub schedules: Vec<ScheduleConfig>,
}

/// Structure of `surcharges.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SurchargesFile {
    /// Surcharge rules; a window wrapping midnight is written as two rules.
    #[serde(default)]
    pub surcharges: Vec<SurchargeRule>,
}

/// The complete engine configuration loaded from YAML files.
///
/// Everything held here has been validated; the accessors hand out
/// read-only views for the calculation functions.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    metadata: EngineMetadata,
    schedules: ScheduleCatalog,
    surcharges: Vec<SurchargeRule>,
    monthly: MonthlyConfig,
    vacation: VacationReferenceData,
}

impl EngineConfig {
    /// Creates a new EngineConfig from its parts, validating each one.
    pub fn new(
        metadata: EngineMetadata,
        schedules: Vec<ScheduleConfig>,
        surcharges: Vec<SurchargeRule>,
        monthly: MonthlyConfig,
        vacation: VacationReferenceData,
    ) -> EngineResult<Self> {
        let schedules = ScheduleCatalog::new(schedules)?;
        for rule in &surcharges {
            rule.validate()?;
        }
        monthly.validate()?;
        vacation.validate()?;

        Ok(Self {
            metadata,
            schedules,
            surcharges,
            monthly,
            vacation,
        })
    }

    /// Returns the configuration metadata.
    pub fn engine(&self) -> &EngineMetadata {
        &self.metadata
    }

    /// Returns the schedule catalog.
    pub fn schedules(&self) -> &ScheduleCatalog {
        &self.schedules
    }

    /// Returns the surcharge rules.
    pub fn surcharges(&self) -> &[SurchargeRule] {
        &self.surcharges
    }

    /// Returns the monthly carryover configuration.
    pub fn monthly(&self) -> &MonthlyConfig {
        &self.monthly
    }

    /// Returns the vacation reference data.
    pub fn vacation(&self) -> &VacationReferenceData {
        &self.vacation
    }

    /// Looks up a capping group by name.
    pub fn capping_group(&self, name: &str) -> EngineResult<&CappingRuleGroup> {
        self.vacation
            .capping_groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| EngineError::CappingGroupNotFound {
                name: name.to_string(),
            })
    }
}
