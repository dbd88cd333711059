use crate::runner::state::{RunSummary, SuiteReport};
use serde::{Deserialize, Serialize};

/// Run results as persisted to disk and consumed by report generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    pub run_id: String,
    pub suites: Vec<SuiteReport>,
    pub summary: RunSummary,
    pub generated_at: String,
}
