//! Parser output types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::flow::{ExecutionStatus, FlowNode};

/// Aggregate execution data for one tree node, keyed by node id in
/// [`TraceParseResult::execution_map`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecution {
    pub status: ExecutionStatus,
    /// How many times the node was visited, counting merged retries.
    pub visit_count: u32,
    /// Indices into the flat step list for every visit.
    pub step_indices: Vec<usize>,
}

/// One entry of the flat step list, in traversal order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSummary {
    pub node_id: String,
    pub journey_id: String,
    pub order: i64,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    /// Wall-clock time until the next step opened; `None` for the last step
    /// of a session.
    pub duration_ms: Option<i64>,
    pub status: ExecutionStatus,
}

/// One authentication session observed within a correlation id. A second
/// or later session means the user restarted the journey mid-flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub index: u32,
    pub started_at: DateTime<Utc>,
    pub log_id: String,
    pub correlation_id: String,
}

/// Full output of one parse run.
///
/// `success` is false exactly when `errors` is non-empty. The tree and maps
/// are always populated (possibly empty) so consumers can render a partial
/// trace alongside the errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceParseResult {
    pub flow_tree: FlowNode,
    pub steps: Vec<StepSummary>,
    pub execution_map: BTreeMap<String, NodeExecution>,
    pub main_journey_id: String,
    pub success: bool,
    pub errors: Vec<String>,
    pub final_statebag: BTreeMap<String, String>,
    pub final_claims: BTreeMap<String, String>,
    pub sessions: Vec<SessionInfo>,
}
