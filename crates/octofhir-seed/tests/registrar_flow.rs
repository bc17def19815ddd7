use octofhir_seed::config::{RegistrarSettings, ServerSettings};
use octofhir_seed::registrar::{ReindexStatus, Verification};
use octofhir_seed::{FhirClient, SearchParameterRegistrar, SeedError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SP_URL: &str = "http://hapi-fhir.au/SearchParameter/DocumentReference-content";

fn registrar(server: &MockServer, verify_attempts: u32) -> SearchParameterRegistrar {
    let server_settings = ServerSettings {
        base_url: format!("{}/fhir", server.uri()),
        ..ServerSettings::default()
    };
    let settings = RegistrarSettings {
        reindex_delay_ms: 0,
        verify_attempts,
        ..RegistrarSettings::default()
    };
    let definition = SearchParameterRegistrar::builtin_definition().expect("builtin definition");
    SearchParameterRegistrar::new(FhirClient::new(&server_settings), definition, &settings)
        .expect("valid definition")
}

fn capability(includes: &[&str]) -> serde_json::Value {
    json!({
        "resourceType": "CapabilityStatement",
        "rest": [{
            "mode": "server",
            "resource": [
                {"type": "Patient", "searchInclude": ["*"]},
                {"type": "DocumentReference", "searchInclude": includes}
            ]
        }]
    })
}

async fn mount_upsert(server: &MockServer, status: u16) {
    Mock::given(method("PUT"))
        .and(path("/fhir/SearchParameter/DocumentReference-content"))
        .and(header("Content-Type", "application/fhir+json"))
        .and(body_partial_json(json!({
            "resourceType": "SearchParameter",
            "code": "content",
            "base": ["DocumentReference"]
        })))
        .respond_with(ResponseTemplate::new(status))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_reindex(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/fhir/$reindex"))
        .and(body_partial_json(json!({
            "resourceType": "Parameters",
            "parameter": [{"name": "url", "valueString": SP_URL}]
        })))
        .respond_with(ResponseTemplate::new(status).set_body_string("reindex response"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn registers_and_sees_include() {
    let server = MockServer::start().await;
    mount_upsert(&server, 201).await;
    mount_reindex(&server, 202).await;
    Mock::given(method("GET"))
        .and(path("/fhir/metadata"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(capability(&["*", "DocumentReference:content"])),
        )
        .mount(&server)
        .await;

    let report = registrar(&server, 1).register().await.expect("registration");
    assert_eq!(report.status, 201);
    assert_eq!(report.reindex, ReindexStatus::Accepted(202));
    assert_eq!(report.verification, Verification::Visible);
    assert_eq!(report.attempts, 1);
}

#[tokio::test]
async fn rejected_definition_fails_registration() {
    let server = MockServer::start().await;
    mount_upsert(&server, 400).await;
    Mock::given(method("POST"))
        .and(path("/fhir/$reindex"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = registrar(&server, 1).register().await.expect_err("must fail");
    assert!(matches!(err, SeedError::SearchParameterRejected { status: 400, .. }));
}

#[tokio::test]
async fn reindex_and_verification_problems_are_not_fatal() {
    let server = MockServer::start().await;
    mount_upsert(&server, 200).await;
    mount_reindex(&server, 500).await;
    Mock::given(method("GET"))
        .and(path("/fhir/metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(capability(&["*"])))
        .mount(&server)
        .await;

    let report = registrar(&server, 1).register().await.expect("registration");
    assert_eq!(
        report.reindex,
        ReindexStatus::Rejected {
            status: 500,
            body: "reindex response".into()
        }
    );
    assert_eq!(
        report.verification,
        Verification::NotVisible {
            includes: vec!["*".into()]
        }
    );
}

#[tokio::test]
async fn polls_until_include_appears() {
    let server = MockServer::start().await;
    mount_upsert(&server, 200).await;
    mount_reindex(&server, 200).await;
    Mock::given(method("GET"))
        .and(path("/fhir/metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(capability(&["*"])))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fhir/metadata"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(capability(&["DocumentReference:content"])),
        )
        .mount(&server)
        .await;

    let report = registrar(&server, 3).register().await.expect("registration");
    assert_eq!(report.verification, Verification::Visible);
    assert_eq!(report.attempts, 2);
}

#[tokio::test]
async fn metadata_outage_is_reported_not_raised() {
    let server = MockServer::start().await;
    mount_upsert(&server, 201).await;
    mount_reindex(&server, 202).await;
    Mock::given(method("GET"))
        .and(path("/fhir/metadata"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let report = registrar(&server, 2).register().await.expect("registration");
    assert_eq!(report.verification, Verification::Unavailable("HTTP 503".into()));
    assert_eq!(report.attempts, 2);
}
