//! Classification of upsert responses.

use serde::Deserialize;

/// One entry of an `OperationOutcome.issue` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub diagnostics: String,
}

#[derive(Deserialize)]
struct IssueBody {
    issue: Option<Vec<Issue>>,
}

/// What a rejected upsert's body told us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionDetail {
    /// The body carried an `issue` array.
    Issues(Vec<Issue>),
    /// JSON body without an `issue` array.
    Unstructured(String),
    /// Body was not JSON at all.
    Unparseable(String),
}

impl RejectionDetail {
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<IssueBody>(body) {
            Ok(IssueBody { issue: Some(issues) }) => Self::Issues(issues),
            Ok(IssueBody { issue: None }) => Self::Unstructured(truncate(body, 300).to_string()),
            Err(_) => Self::Unparseable(truncate(body, 300).to_string()),
        }
    }
}

/// Terminal result of one upsert. Nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// HTTP 200 or 201.
    Stored { status: u16 },
    /// HTTP 400 or 422.
    Rejected { status: u16, detail: RejectionDetail },
    /// Any other status; `body` is truncated to 200 characters.
    Failed { status: u16, body: String },
    /// Transport error, including timeouts.
    Network(String),
    /// The resource lacks `resourceType` or `id`; no request was made.
    MissingIdentity,
}

impl UpsertOutcome {
    pub fn classify(status: u16, body: &str) -> Self {
        match status {
            200 | 201 => Self::Stored { status },
            400 | 422 => Self::Rejected {
                status,
                detail: RejectionDetail::from_body(body),
            },
            _ => Self::Failed {
                status,
                body: truncate(body, 200).to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }

    /// Human readable lines describing the outcome for `reference`
    /// (`Type/id`). Successful outcomes produce a single confirmation line.
    pub fn describe(&self, reference: &str) -> Vec<String> {
        match self {
            Self::Stored { .. } => vec![format!("{reference} imported successfully")],
            Self::Rejected { status, detail } => match detail {
                RejectionDetail::Issues(issues) => issues
                    .iter()
                    .map(|i| {
                        format!(
                            "{reference} validation failed [{}]: {}",
                            i.severity, i.diagnostics
                        )
                    })
                    .collect(),
                RejectionDetail::Unstructured(body) => {
                    vec![format!("{reference} validation failed: {body}")]
                }
                RejectionDetail::Unparseable(body) => {
                    vec![format!("{reference} validation failed (HTTP {status}): {body}")]
                }
            },
            Self::Failed { status, body } => {
                vec![format!("{reference} import failed (HTTP {status}): {body}")]
            }
            Self::Network(err) => vec![format!("{reference} network error: {err}")],
            Self::MissingIdentity => {
                vec!["Resource missing required fields (resourceType or id)".to_string()]
            }
        }
    }

    /// Short reason used in the dependency failure list.
    pub fn reason(&self) -> String {
        match self {
            Self::Stored { status }
            | Self::Rejected { status, .. }
            | Self::Failed { status, .. } => format!("HTTP {status}"),
            Self::Network(err) => err.clone(),
            Self::MissingIdentity => "missing resourceType or id".to_string(),
        }
    }
}

/// Cut `s` to at most `max` characters on a char boundary.
pub fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
