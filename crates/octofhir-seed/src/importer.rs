//! Dependency-ordered batch import.
//!
//! A run walks a fixed list of resource types, loads `{type}.json` from the
//! data directory and upserts every resource with `PUT {base}/{type}/{id}`.
//! Outcomes are terminal: nothing is retried, every failure is counted and
//! the run moves on.

use std::fmt;
use std::path::Path;

use crate::catalog::SeedCatalog;
use crate::client::FhirClient;
use crate::config::ImportSettings;
use crate::error::{Result, SeedError};
use crate::loader::load_resources;
use crate::outcome::UpsertOutcome;
use crate::output;
use crate::resource::Resource;
use crate::seeder::{self, SeedReport};

/// Where a run currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportPhase {
    NotStarted,
    ConnectivityChecked,
    DependenciesSeeded,
    Importing(String),
    PatientDependentsSeeded,
    Completed,
    Aborted,
}

impl fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::ConnectivityChecked => write!(f, "connectivity checked"),
            Self::DependenciesSeeded => write!(f, "dependencies seeded"),
            Self::Importing(rt) => write!(f, "importing {rt}"),
            Self::PatientDependentsSeeded => write!(f, "patient dependents seeded"),
            Self::Completed => write!(f, "completed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// Counters for one run. Only ever incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub success: usize,
    pub failed: usize,
    /// Resource types whose file was absent.
    pub skipped: usize,
    /// `success + failed` over all imported files.
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeStatus {
    Imported,
    /// File present but yielded no resources.
    Empty,
    /// File absent.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeReport {
    pub resource_type: String,
    pub success: usize,
    pub failed: usize,
    pub status: TypeStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileResult {
    pub success: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub stats: ImportStats,
    pub types: Vec<TypeReport>,
    pub dependencies: SeedReport,
    /// `None` when the trigger type never produced a success.
    pub patient_dependents: Option<SeedReport>,
}

impl ImportSummary {
    pub fn is_success(&self) -> bool {
        self.stats.failed == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }
}

pub struct Importer {
    client: FhirClient,
    settings: ImportSettings,
    catalog: SeedCatalog,
    stats: ImportStats,
    phase: ImportPhase,
}

impl Importer {
    pub fn new(client: FhirClient, settings: ImportSettings, catalog: SeedCatalog) -> Self {
        Self {
            client,
            settings,
            catalog,
            stats: ImportStats::default(),
            phase: ImportPhase::NotStarted,
        }
    }

    pub fn phase(&self) -> &ImportPhase {
        &self.phase
    }

    pub fn stats(&self) -> ImportStats {
        self.stats
    }

    fn enter(&mut self, phase: ImportPhase) {
        tracing::debug!(from = %self.phase, to = %phase, "import phase");
        self.phase = phase;
    }

    /// Run the whole import. `Err` means the run was aborted: the server did
    /// not answer the metadata check, or the data directory is missing.
    pub async fn run(&mut self) -> Result<ImportSummary> {
        output::print_banner("FHIR Resource Import Tool");

        if let Err(e) = self.client.check_connection().await {
            self.enter(ImportPhase::Aborted);
            return Err(e);
        }
        output::print_success(&format!(
            "Successfully connected to FHIR server: {}",
            self.client.base_url()
        ));
        self.enter(ImportPhase::ConnectivityChecked);

        let unresolved = self
            .catalog
            .unresolved_patient_references(&self.settings.order, &self.settings.patient_trigger);
        if !unresolved.is_empty() {
            tracing::warn!(
                types = ?unresolved,
                trigger = %self.settings.patient_trigger,
                "patient-dependent resources reference types imported after the trigger"
            );
        }

        let dependencies = seeder::seed_dependencies(&self.client, &self.catalog.dependencies).await;
        self.enter(ImportPhase::DependenciesSeeded);

        let data_dir = self.settings.data_dir.clone();
        if !data_dir.is_dir() {
            self.enter(ImportPhase::Aborted);
            return Err(SeedError::DataDirMissing(data_dir));
        }

        println!("\nStarting resource import...");

        let mut types = Vec::with_capacity(self.settings.order.len());
        let mut patient_dependents = None;
        let order = self.settings.order.clone();
        for resource_type in order {
            self.enter(ImportPhase::Importing(resource_type.clone()));
            let path = data_dir.join(format!("{resource_type}.json"));

            if !path.is_file() {
                println!();
                output::print_warning(&format!(
                    "File does not exist, skipping: {}",
                    path.display()
                ));
                self.stats.skipped += 1;
                types.push(TypeReport {
                    resource_type,
                    success: 0,
                    failed: 0,
                    status: TypeStatus::Skipped,
                });
                continue;
            }

            let result = self.import_file(&path).await;
            self.stats.success += result.success;
            self.stats.failed += result.failed;
            self.stats.total += result.success + result.failed;

            let is_trigger = resource_type == self.settings.patient_trigger;
            types.push(TypeReport {
                resource_type,
                success: result.success,
                failed: result.failed,
                status: if result.success + result.failed == 0 {
                    TypeStatus::Empty
                } else {
                    TypeStatus::Imported
                },
            });

            if is_trigger && result.success > 0 && patient_dependents.is_none() {
                let report =
                    seeder::seed_patient_dependents(&self.client, &self.catalog.patient_dependents)
                        .await;
                patient_dependents = Some(report);
                self.enter(ImportPhase::PatientDependentsSeeded);
            }
        }

        self.enter(ImportPhase::Completed);
        Ok(ImportSummary {
            stats: self.stats,
            types,
            dependencies,
            patient_dependents,
        })
    }

    /// Import every resource found in one file.
    pub async fn import_file(&self, path: &Path) -> FileResult {
        let mut result = FileResult::default();

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        println!("\nProcessing file: {name}");

        let resources = load_resources(path);
        if resources.is_empty() {
            output::print_item_warning("No valid resources found in file");
            return result;
        }
        println!("  Found {} resources", resources.len());

        for resource in &resources {
            if self.import_resource(resource).await.is_success() {
                result.success += 1;
            } else {
                result.failed += 1;
            }
        }
        result
    }

    /// Upsert one resource and print what happened to it.
    pub async fn import_resource(&self, resource: &Resource) -> UpsertOutcome {
        let outcome = self.client.upsert(resource).await;
        let reference = resource.reference().unwrap_or_default();
        for line in outcome.describe(&reference) {
            if outcome.is_success() {
                output::print_item_success(&line);
            } else {
                output::print_item_failure(&line);
            }
        }
        outcome
    }
}
