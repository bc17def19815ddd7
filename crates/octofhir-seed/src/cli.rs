use std::path::PathBuf;

use clap::Parser;

use crate::config::SeedConfig;

#[derive(Parser)]
#[command(name = "octofhir-import")]
#[command(about = "Import mock FHIR resources into a server in dependency order")]
#[command(version)]
pub struct ImportCli {
    /// FHIR base URL (overrides config and OCTOFHIR_SEED_URL env var)
    #[arg(short, long, env = "OCTOFHIR_SEED_URL")]
    pub server: Option<String>,

    /// Directory holding {ResourceType}.json files
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Config file (defaults to ./octofhir-seed.toml, then ~/.octofhir/seed.toml)
    #[arg(short, long, env = "OCTOFHIR_SEED_CONFIG")]
    pub config: Option<String>,
}

impl ImportCli {
    /// Flags win over file and environment configuration.
    pub fn apply(&self, cfg: &mut SeedConfig) {
        if let Some(server) = &self.server {
            cfg.server.base_url = server.clone();
        }
        if let Some(dir) = &self.data_dir {
            cfg.import.data_dir = dir.clone();
        }
    }
}

#[derive(Parser)]
#[command(name = "octofhir-register-searchparam")]
#[command(about = "Register the DocumentReference:content search parameter and reindex")]
#[command(version)]
pub struct RegisterCli {
    /// FHIR base URL (overrides config and OCTOFHIR_SEED_URL env var)
    #[arg(env = "OCTOFHIR_SEED_URL")]
    pub server: Option<String>,

    /// Config file (defaults to ./octofhir-seed.toml, then ~/.octofhir/seed.toml)
    #[arg(short, long, env = "OCTOFHIR_SEED_CONFIG")]
    pub config: Option<String>,
}

impl RegisterCli {
    pub fn apply(&self, cfg: &mut SeedConfig) {
        if let Some(server) = &self.server {
            cfg.server.base_url = server.clone();
        }
    }
}
