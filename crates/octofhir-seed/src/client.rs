use std::time::Duration;

use serde_json::Value;

use crate::config::ServerSettings;
use crate::error::{Result, SeedError};
use crate::outcome::UpsertOutcome;
use crate::resource::Resource;

const FHIR_JSON: &str = "application/fhir+json";

/// Raw status and body of a response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Thin FHIR REST client. One `reqwest::Client` is reused for every call of
/// a run; each call class carries its own timeout.
pub struct FhirClient {
    http: reqwest::Client,
    base_url: String,
    connect_timeout: Duration,
    request_timeout: Duration,
    reindex_timeout: Duration,
}

impl FhirClient {
    pub fn new(settings: &ServerSettings) -> Self {
        Self::with_base_url(&settings.base_url, settings)
    }

    pub fn with_base_url(base_url: &str, settings: &ServerSettings) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            connect_timeout: settings.connect_timeout(),
            request_timeout: settings.request_timeout(),
            reindex_timeout: settings.reindex_timeout(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn fhir_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http.request(method, url).header("Accept", FHIR_JSON)
    }

    /// Connectivity gate: `GET {base}/metadata` must answer 200.
    pub async fn check_connection(&self) -> Result<()> {
        let url = self.fhir_url("metadata");
        tracing::debug!(%url, "checking server connection");
        let resp = self
            .request(reqwest::Method::GET, &url)
            .timeout(self.connect_timeout)
            .send()
            .await
            .map_err(SeedError::ServerUnreachable)?;
        let status = resp.status().as_u16();
        if status != 200 {
            return Err(SeedError::ServerUnavailable { status });
        }
        Ok(())
    }

    /// Fetch the CapabilityStatement with the ordinary request timeout.
    pub async fn metadata(&self) -> Result<RawResponse> {
        let url = self.fhir_url("metadata");
        let resp = self
            .request(reqwest::Method::GET, &url)
            .timeout(self.request_timeout)
            .send()
            .await?;
        Ok(read_response(resp).await)
    }

    /// `PUT {base}/{type}/{id}`. Never fails: every result, transport errors
    /// included, is folded into an [`UpsertOutcome`].
    pub async fn upsert(&self, resource: &Resource) -> UpsertOutcome {
        let Some(reference) = resource.reference() else {
            return UpsertOutcome::MissingIdentity;
        };
        match self.put(&reference, resource).await {
            Ok(raw) => {
                tracing::debug!(%reference, status = raw.status, "upsert finished");
                UpsertOutcome::classify(raw.status, &raw.body)
            }
            Err(e) => {
                tracing::debug!(%reference, error = %e, "upsert failed");
                UpsertOutcome::Network(e.to_string())
            }
        }
    }

    /// `PUT {base}/{path}` returning the raw response.
    pub async fn put(&self, path: &str, resource: &Resource) -> Result<RawResponse> {
        let url = self.fhir_url(path);
        let resp = self
            .request(reqwest::Method::PUT, &url)
            .header("Content-Type", FHIR_JSON)
            .timeout(self.request_timeout)
            .json(resource.as_value())
            .send()
            .await?;
        Ok(read_response(resp).await)
    }

    /// `POST {base}/$reindex` with a `Parameters` body.
    pub async fn reindex(&self, parameters: &Value) -> Result<RawResponse> {
        let url = self.fhir_url("$reindex");
        let resp = self
            .request(reqwest::Method::POST, &url)
            .header("Content-Type", FHIR_JSON)
            .timeout(self.reindex_timeout)
            .json(parameters)
            .send()
            .await?;
        Ok(read_response(resp).await)
    }
}

async fn read_response(resp: reqwest::Response) -> RawResponse {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    RawResponse { status, body }
}
