use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://localhost:19090/fhir";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SeedConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub import: ImportSettings,
    #[serde(default)]
    pub registrar: RegistrarSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SeedConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        let url = url::Url::parse(&self.server.base_url)
            .map_err(|e| format!("server.base_url is not a valid URL: {e}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err("server.base_url must use http or https".into());
        }
        if self.server.connect_timeout_ms == 0
            || self.server.request_timeout_ms == 0
            || self.server.reindex_timeout_ms == 0
        {
            return Err("server timeouts must be > 0".into());
        }
        // Import validations
        if self.import.order.is_empty() {
            return Err("import.order must not be empty".into());
        }
        for (i, rt) in self.import.order.iter().enumerate() {
            if rt.trim().is_empty() {
                return Err("import.order entries must not be empty".into());
            }
            if self.import.order[..i].contains(rt) {
                return Err(format!("import.order lists {rt} more than once"));
            }
        }
        if !self.import.order.contains(&self.import.patient_trigger) {
            return Err(format!(
                "import.patient_trigger ({}) must appear in import.order",
                self.import.patient_trigger
            ));
        }
        // Registrar validation
        if self.registrar.verify_attempts == 0 {
            return Err("registrar.verify_attempts must be >= 1".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// FHIR base URL, including the `/fhir` path segment if the server has one.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Metadata connectivity check.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Upserts and metadata verification.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_reindex_timeout_ms")]
    pub reindex_timeout_ms: u64,
}

impl ServerSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
    pub fn reindex_timeout(&self) -> Duration {
        Duration::from_millis(self.reindex_timeout_ms)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_connect_timeout_ms() -> u64 {
    5_000
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_reindex_timeout_ms() -> u64 {
    30_000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            reindex_timeout_ms: default_reindex_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSettings {
    /// Directory holding `{ResourceType}.json` files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Resource types in dependency order. Referenced types come first.
    #[serde(default = "default_import_order")]
    pub order: Vec<String>,
    /// Type after which the patient-dependent resources are pushed.
    #[serde(default = "default_patient_trigger")]
    pub patient_trigger: String,
    /// Replaces the built-in dependency resources when set.
    #[serde(default)]
    pub dependencies_file: Option<PathBuf>,
    /// Replaces the built-in patient-dependent resources when set.
    #[serde(default)]
    pub patient_dependents_file: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("mock")
}
fn default_import_order() -> Vec<String> {
    // CarePathPlan is a local file name, not a FHIR resource type.
    ["Patient", "DocumentReference", "CarePathPlan", "ServiceRequest", "Task"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_patient_trigger() -> String {
    "Patient".into()
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            order: default_import_order(),
            patient_trigger: default_patient_trigger(),
            dependencies_file: None,
            patient_dependents_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrarSettings {
    /// Replaces the built-in SearchParameter definition when set.
    #[serde(default)]
    pub definition_file: Option<PathBuf>,
    /// Wait before the first metadata check. Doubles between attempts.
    #[serde(default = "default_reindex_delay_ms")]
    pub reindex_delay_ms: u64,
    #[serde(default = "default_verify_attempts")]
    pub verify_attempts: u32,
}

impl RegistrarSettings {
    pub fn reindex_delay(&self) -> Duration {
        Duration::from_millis(self.reindex_delay_ms)
    }
}

fn default_reindex_delay_ms() -> u64 {
    3_000
}
fn default_verify_attempts() -> u32 {
    1
}

impl Default for RegistrarSettings {
    fn default() -> Self {
        Self {
            definition_file: None,
            reindex_delay_ms: default_reindex_delay_ms(),
            verify_attempts: default_verify_attempts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::SeedConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    const DEFAULT_FILE: &str = "octofhir-seed.toml";

    /// Layered load: serde defaults, then the TOML file, then
    /// `OCTOFHIR_SEED__SECTION__KEY` environment overrides.
    ///
    /// With no explicit path, `./octofhir-seed.toml` is tried first and then
    /// `~/.octofhir/seed.toml`. A missing file is not an error.
    pub fn load_config(path: Option<&str>) -> Result<SeedConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if !pathbuf.exists() {
                    return Err(format!("config file not found: {p}"));
                }
                builder = builder.add_source(File::from(pathbuf));
            }
            None => {
                if let Some(default_path) = default_path() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        builder = builder.add_source(
            Environment::with_prefix("OCTOFHIR_SEED")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: SeedConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }

    fn default_path() -> Option<PathBuf> {
        let local = PathBuf::from(DEFAULT_FILE);
        if local.exists() {
            return Some(local);
        }
        let home = dirs::home_dir()?.join(".octofhir").join("seed.toml");
        home.exists().then_some(home)
    }
}
