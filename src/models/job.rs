use serde::{Deserialize, Serialize};

/// Handle returned by the backend when a job is submitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobHandle {
    pub state_url: String,
}

/// Snapshot of a submitted job. Superseded by every poll.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
}
