//! Best-effort upserts of the auxiliary resource lists.
//!
//! Each resource is attempted on its own and nothing is rolled back. Failures
//! never stop the caller.

use crate::client::FhirClient;
use crate::outcome::{RejectionDetail, UpsertOutcome};
use crate::output;
use crate::resource::Resource;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub success: usize,
    pub failed: usize,
    /// `Type/id (reason)` for every failed resource.
    pub failures: Vec<String>,
}

impl SeedReport {
    pub fn attempted(&self) -> usize {
        self.success + self.failed
    }
}

/// Upsert the dependency resources, reporting each failure and a summary.
pub async fn seed_dependencies(client: &FhirClient, resources: &[Resource]) -> SeedReport {
    println!();
    output::print_banner("Creating dependency resources (if missing)");

    let mut report = SeedReport::default();
    for resource in resources {
        let outcome = client.upsert(resource).await;
        if outcome.is_success() {
            report.success += 1;
            continue;
        }

        report.failed += 1;
        let reference = resource
            .reference()
            .unwrap_or_else(|| "<unidentified resource>".to_string());
        report.failures.push(format!("{reference} ({})", outcome.reason()));
        match &outcome {
            UpsertOutcome::Rejected {
                detail: RejectionDetail::Issues(issues),
                ..
            } => {
                for issue in issues {
                    output::print_item_failure(&format!("{reference}: {}", issue.diagnostics));
                }
            }
            UpsertOutcome::Rejected {
                detail: RejectionDetail::Unstructured(_),
                ..
            } => {
                // Listed in the summary only.
            }
            UpsertOutcome::Network(err) => {
                output::print_item_failure(&format!("{reference}: {err}"));
            }
            other => {
                output::print_item_failure(&format!("{reference}: {}", other.reason()));
            }
        }
    }

    println!(
        "Dependency resource creation completed: Success {}, Failed {}",
        report.success, report.failed
    );
    if report.failed > 0 {
        println!();
        output::print_warning("Warning: Some dependency resources failed to create:");
        for failure in &report.failures {
            println!("  - {failure}");
        }
        println!("\nContinuing with main data import, reference errors may occur...");
    }
    println!("{}", output::rule());
    report
}

/// Upsert the patient-dependent resources. Failures are swallowed; only the
/// number created is shown.
pub async fn seed_patient_dependents(client: &FhirClient, resources: &[Resource]) -> SeedReport {
    println!("\nCreating Patient-dependent resources...");

    let mut report = SeedReport::default();
    for resource in resources {
        let outcome = client.upsert(resource).await;
        if outcome.is_success() {
            report.success += 1;
        } else {
            tracing::debug!(
                reference = resource.reference().as_deref().unwrap_or("-"),
                reason = %outcome.reason(),
                "patient-dependent resource not created"
            );
            report.failed += 1;
            if let Some(reference) = resource.reference() {
                report.failures.push(format!("{reference} ({})", outcome.reason()));
            }
        }
    }

    if report.success > 0 {
        println!("Created: {} Patient-dependent resources", report.success);
    }
    report
}
