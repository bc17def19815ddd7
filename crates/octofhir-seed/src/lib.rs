//! Seeding tools for a FHIR server.
//!
//! Two flows live here: the dependency-ordered batch importer that pushes mock
//! data with `PUT` upserts, and the search-parameter registrar that installs a
//! custom `SearchParameter` and asks the server to reindex.

pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod importer;
pub mod loader;
pub mod observability;
pub mod outcome;
pub mod output;
pub mod registrar;
pub mod resource;
pub mod seeder;

pub use catalog::SeedCatalog;
pub use client::FhirClient;
pub use config::SeedConfig;
pub use error::{Result, SeedError};
pub use importer::{ImportPhase, ImportStats, ImportSummary, Importer};
pub use registrar::{RegistrationReport, SearchParameterRegistrar};
pub use resource::Resource;
