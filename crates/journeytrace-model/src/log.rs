//! Input log envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clip::Clip;

/// One diagnostic log as retrieved from the diagnostics backend: a group of
/// clips recorded during a single engine request.
///
/// Intra-log clip order is authoritative. Inter-log order is established by
/// `timestamp` (log-level granularity only); the parser sorts with a stable
/// tie-break on input position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceLogInput {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub policy_id: String,
    pub correlation_id: String,
    #[serde(default)]
    pub clips: Vec<Clip>,
}
