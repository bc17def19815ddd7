//! Auxiliary resources pushed around the main import.
//!
//! The default lists ship as JSON under `data/` and are compiled into the
//! binary. Either list can be replaced by a file named in `[import]`.

use std::collections::HashSet;

use crate::config::ImportSettings;
use crate::error::{Result, SeedError};
use crate::loader::{load_resources, parse_resources};
use crate::resource::Resource;

const BUILTIN_DEPENDENCIES: &str = include_str!("../data/dependencies.json");
const BUILTIN_PATIENT_DEPENDENTS: &str = include_str!("../data/patient_dependents.json");

#[derive(Debug, Clone, Default)]
pub struct SeedCatalog {
    /// Practitioners, organizations, activity definitions and groups that the
    /// mock data references. Pushed before anything else.
    pub dependencies: Vec<Resource>,
    /// Resources referencing a specific patient. Pushed once the trigger type
    /// has been imported.
    pub patient_dependents: Vec<Resource>,
}

impl SeedCatalog {
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            dependencies: parse_builtin(BUILTIN_DEPENDENCIES)?,
            patient_dependents: parse_builtin(BUILTIN_PATIENT_DEPENDENTS)?,
        })
    }

    pub fn from_settings(settings: &ImportSettings) -> Result<Self> {
        let dependencies = match &settings.dependencies_file {
            Some(path) => load_resources(path),
            None => parse_builtin(BUILTIN_DEPENDENCIES)?,
        };
        let patient_dependents = match &settings.patient_dependents_file {
            Some(path) => load_resources(path),
            None => parse_builtin(BUILTIN_PATIENT_DEPENDENTS)?,
        };
        Ok(Self {
            dependencies,
            patient_dependents,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Types referenced by patient-dependent resources that will not exist on
    /// the server when those resources are pushed: neither seeded as a
    /// dependency nor imported at or before `trigger` in `order`.
    pub fn unresolved_patient_references(&self, order: &[String], trigger: &str) -> Vec<String> {
        let mut available: HashSet<&str> = self
            .dependencies
            .iter()
            .filter_map(Resource::resource_type)
            .collect();
        for rt in order {
            available.insert(rt.as_str());
            if rt == trigger {
                break;
            }
        }

        let mut missing: Vec<String> = Vec::new();
        for resource in &self.patient_dependents {
            for rt in resource.referenced_types() {
                if !available.contains(rt) && !missing.iter().any(|m| m == rt) {
                    missing.push(rt.to_string());
                }
            }
        }
        missing
    }
}

fn parse_builtin(content: &str) -> Result<Vec<Resource>> {
    parse_resources(content).map_err(SeedError::Config)
}
