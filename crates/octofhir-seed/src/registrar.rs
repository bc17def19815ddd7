//! Custom SearchParameter registration.
//!
//! Upserts the definition, asks the server to `$reindex`, waits and then checks
//! whether the CapabilityStatement advertises the new include. Only the upsert
//! decides success; reindex and verification are informational.

use std::time::Duration;

use serde_json::{Value, json};

use crate::client::FhirClient;
use crate::config::RegistrarSettings;
use crate::error::{Result, SeedError};
use crate::loader::{load_resources, parse_resources};
use crate::outcome::truncate;
use crate::output;
use crate::resource::Resource;

const BUILTIN_DEFINITION: &str = include_str!("../data/search_parameter.json");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReindexStatus {
    /// 200, 201 or 202.
    Accepted(u16),
    Rejected { status: u16, body: String },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// `searchInclude` lists the parameter.
    Visible,
    /// The resource entry exists but does not list the parameter yet.
    NotVisible { includes: Vec<String> },
    /// No capability entry for the parameter's base resource type.
    ResourceNotListed,
    /// Metadata could not be fetched or parsed.
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationReport {
    /// Status of the SearchParameter upsert (always 200 or 201).
    pub status: u16,
    pub reindex: ReindexStatus,
    pub verification: Verification,
    /// Metadata checks performed.
    pub attempts: u32,
}

pub struct SearchParameterRegistrar {
    client: FhirClient,
    definition: Resource,
    id: String,
    url: String,
    base: String,
    code: String,
    delay: Duration,
    attempts: u32,
}

impl SearchParameterRegistrar {
    pub fn new(
        client: FhirClient,
        definition: Resource,
        settings: &RegistrarSettings,
    ) -> Result<Self> {
        if definition.resource_type() != Some("SearchParameter") {
            return Err(SeedError::InvalidDefinition(
                "resourceType must be SearchParameter".into(),
            ));
        }
        let field = |name: &str| {
            definition
                .as_value()
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| SeedError::InvalidDefinition(format!("missing {name}")))
        };
        let id = definition
            .id()
            .map(str::to_string)
            .ok_or_else(|| SeedError::InvalidDefinition("missing id".into()))?;
        let url = field("url")?;
        let code = field("code")?;
        let base = definition
            .as_value()
            .get("base")
            .and_then(Value::as_array)
            .and_then(|b| b.first())
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SeedError::InvalidDefinition("missing base".into()))?;

        Ok(Self {
            client,
            definition,
            id,
            url,
            base,
            code,
            delay: settings.reindex_delay(),
            attempts: settings.verify_attempts.max(1),
        })
    }

    /// The `DocumentReference-content` parameter shipped with the crate.
    pub fn builtin_definition() -> Result<Resource> {
        single_definition(parse_resources(BUILTIN_DEFINITION).map_err(SeedError::Config)?)
    }

    pub fn definition_from_settings(settings: &RegistrarSettings) -> Result<Resource> {
        match &settings.definition_file {
            Some(path) => single_definition(load_resources(path)),
            None => Self::builtin_definition(),
        }
    }

    /// `{base}:{code}`, the form listed in `searchInclude`.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.base, self.code)
    }

    pub fn reindex_parameters(&self) -> Value {
        json!({
            "resourceType": "Parameters",
            "parameter": [
                { "name": "url", "valueString": self.url }
            ]
        })
    }

    pub async fn register(&self) -> Result<RegistrationReport> {
        let qualified = self.qualified_name();
        output::print_banner("Registering Custom Search Parameter");
        println!("FHIR Server: {}", self.client.base_url());
        println!("Search Parameter: {qualified}");
        println!();

        println!("Creating search parameter...");
        let created = self
            .client
            .put(&format!("SearchParameter/{}", self.id), &self.definition)
            .await?;
        if !matches!(created.status, 200 | 201) {
            return Err(SeedError::SearchParameterRejected {
                status: created.status,
                body: created.body,
            });
        }
        output::print_success("Search parameter created successfully");
        println!("  Response: {}", created.status);

        println!("\nTriggering reindex for {}...", self.base);
        let reindex = match self.client.reindex(&self.reindex_parameters()).await {
            Ok(raw) if matches!(raw.status, 200 | 201 | 202) => {
                output::print_success("Reindex triggered successfully");
                ReindexStatus::Accepted(raw.status)
            }
            Ok(raw) => {
                output::print_warning(&format!("Reindex may have failed: {}", raw.status));
                let body = truncate(&raw.body, 200).to_string();
                println!("  Response: {body}");
                ReindexStatus::Rejected {
                    status: raw.status,
                    body,
                }
            }
            Err(e) => {
                output::print_warning(&format!("Reindex may have failed: {e}"));
                ReindexStatus::Failed(e.to_string())
            }
        };

        let (verification, attempts) = self.verify(&qualified).await;
        match &verification {
            Verification::Visible => {
                output::print_success(&format!("{qualified} found in searchInclude!"));
            }
            Verification::NotVisible { includes } => {
                output::print_warning(&format!("{qualified} NOT in searchInclude yet"));
                let preview: Vec<&str> = includes.iter().take(5).map(String::as_str).collect();
                println!("  Current includes: {preview:?}...");
            }
            Verification::ResourceNotListed => {
                output::print_warning(&format!(
                    "{} is not listed in the server CapabilityStatement",
                    self.base
                ));
            }
            Verification::Unavailable(reason) => {
                output::print_warning(&format!("Could not verify metadata: {reason}"));
            }
        }

        println!();
        output::print_banner("Registration Complete!");
        println!("\nYou can now search using:");
        println!(
            "  GET {}/{}?{}=<search-term>",
            self.client.base_url(),
            self.base,
            self.code
        );
        println!();

        Ok(RegistrationReport {
            status: created.status,
            reindex,
            verification,
            attempts,
        })
    }

    /// Poll metadata until the include shows up or attempts run out. The wait
    /// doubles after each miss.
    async fn verify(&self, qualified: &str) -> (Verification, u32) {
        let mut delay = self.delay;
        let mut verification = Verification::Unavailable("not checked".into());
        let mut attempts = 0;
        while attempts < self.attempts {
            println!("\nWaiting for reindex to process...");
            tokio::time::sleep(delay).await;
            attempts += 1;

            println!("\nVerifying searchInclude in metadata...");
            verification = match self.client.metadata().await {
                Ok(raw) if raw.status == 200 => match raw.json() {
                    Some(cs) => check_search_include(&cs, &self.base, qualified),
                    None => Verification::Unavailable("metadata is not JSON".into()),
                },
                Ok(raw) => Verification::Unavailable(format!("HTTP {}", raw.status)),
                Err(e) => Verification::Unavailable(e.to_string()),
            };
            tracing::debug!(attempt = attempts, ?verification, "searchInclude check");
            if verification == Verification::Visible {
                break;
            }
            delay = delay.saturating_mul(2);
        }
        (verification, attempts)
    }
}

/// Look up `resource_type` in the first `rest` entry of a CapabilityStatement
/// and check its `searchInclude` list.
pub fn check_search_include(
    capability: &Value,
    resource_type: &str,
    qualified: &str,
) -> Verification {
    let resources = capability
        .get("rest")
        .and_then(Value::as_array)
        .and_then(|rest| rest.first())
        .and_then(|r| r.get("resource"))
        .and_then(Value::as_array);
    let Some(entry) = resources.and_then(|list| {
        list.iter()
            .find(|r| r.get("type").and_then(Value::as_str) == Some(resource_type))
    }) else {
        return Verification::ResourceNotListed;
    };

    let includes: Vec<String> = entry
        .get("searchInclude")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if includes.iter().any(|i| i == qualified) {
        Verification::Visible
    } else {
        Verification::NotVisible { includes }
    }
}

fn single_definition(mut resources: Vec<Resource>) -> Result<Resource> {
    if resources.len() != 1 {
        return Err(SeedError::InvalidDefinition(format!(
            "expected exactly one SearchParameter, found {}",
            resources.len()
        )));
    }
    Ok(resources.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerSettings;

    fn registrar(definition: Resource) -> Result<SearchParameterRegistrar> {
        let client = FhirClient::new(&ServerSettings::default());
        SearchParameterRegistrar::new(client, definition, &RegistrarSettings::default())
    }

    #[test]
    fn builtin_definition_is_document_reference_content() {
        let def = SearchParameterRegistrar::builtin_definition().expect("builtin");
        let reg = registrar(def).expect("valid definition");
        assert_eq!(reg.qualified_name(), "DocumentReference:content");
        assert_eq!(
            reg.reindex_parameters(),
            json!({
                "resourceType": "Parameters",
                "parameter": [{
                    "name": "url",
                    "valueString": "http://hapi-fhir.au/SearchParameter/DocumentReference-content"
                }]
            })
        );
    }

    #[test]
    fn definition_must_be_a_search_parameter() {
        let patient = Resource::new(json!({"resourceType": "Patient", "id": "p1"}));
        assert!(matches!(registrar(patient), Err(SeedError::InvalidDefinition(_))));

        let no_base = Resource::new(json!({
            "resourceType": "SearchParameter",
            "id": "sp",
            "url": "http://example.org/sp",
            "code": "x"
        }));
        assert!(matches!(registrar(no_base), Err(SeedError::InvalidDefinition(_))));
    }

    #[test]
    fn search_include_lookup() {
        let cs = json!({
            "resourceType": "CapabilityStatement",
            "rest": [{
                "mode": "server",
                "resource": [
                    {"type": "Patient", "searchInclude": ["*"]},
                    {"type": "DocumentReference", "searchInclude": ["*", "DocumentReference:subject"]}
                ]
            }]
        });
        assert_eq!(
            check_search_include(&cs, "DocumentReference", "DocumentReference:content"),
            Verification::NotVisible {
                includes: vec!["*".into(), "DocumentReference:subject".into()]
            }
        );
        assert_eq!(
            check_search_include(&cs, "DocumentReference", "DocumentReference:subject"),
            Verification::Visible
        );
        assert_eq!(
            check_search_include(&cs, "Binary", "Binary:x"),
            Verification::ResourceNotListed
        );
        assert_eq!(
            check_search_include(&json!({}), "DocumentReference", "DocumentReference:content"),
            Verification::ResourceNotListed
        );
    }
}
