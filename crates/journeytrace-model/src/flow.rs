//! The reconstructed execution tree.
//!
//! A parse produces exactly one [`FlowNodeKind::Root`] node. Sub-journey
//! nodes nest arbitrarily deep below it; step nodes branch into technical
//! profiles, claims transformations, provider selections, display controls,
//! and final token issuance. The tree is a strict hierarchy: every node is
//! exclusively owned by its parent.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Node kinds in the execution tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowNodeKind {
    Root,
    SubJourney,
    Step,
    TechnicalProfile,
    ClaimsTransformation,
    HomeRealmDiscovery,
    DisplayControl,
    SendClaims,
}

/// Resolved execution status of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Error,
    #[default]
    Unknown,
}

/// Outcome a step settled on when it was finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepResult {
    Success,
    Redirect,
    Error,
    Pending,
}

/// Whether an error was surfaced by a handler (recoverable, the user may
/// retry) or raised as a fatal engine exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepErrorKind {
    Handled,
    Fatal,
}

/// An error attached to a step node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepError {
    pub kind: StepErrorKind,
    #[serde(rename = "hResult")]
    pub hresult: Option<String>,
    pub message: String,
}

/// Point-in-time context captured when a node is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeContext {
    pub timestamp: DateTime<Utc>,
    /// Position in the global clip traversal order.
    pub sequence_number: u64,
    pub log_id: String,
    /// Event instance of the log the node was created from.
    pub event_type: String,
    pub statebag_snapshot: BTreeMap<String, String>,
    pub claims_snapshot: BTreeMap<String, String>,
}

/// Kind-specific payload of a flow node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodePayload {
    Root,
    SubJourney {
        journey_id: String,
    },
    Step {
        journey_id: String,
        /// Short name of the handler that settled this step, when known.
        handler: Option<String>,
        /// True when the step rendered UI or redirected the user agent.
        interactive: bool,
        result: Option<StepResult>,
        statebag: BTreeMap<String, String>,
        claims: BTreeMap<String, String>,
    },
    TechnicalProfile {
        profile_id: String,
        provider: Option<String>,
        protocol: Option<String>,
    },
    ClaimsTransformation {
        transformation_id: String,
    },
    HomeRealmDiscovery {
        /// Available (not yet chosen) provider options.
        options: Vec<String>,
    },
    DisplayControl {
        control_id: String,
        action: Option<String>,
    },
    SendClaims {
        token_claims: BTreeMap<String, String>,
    },
}

impl NodePayload {
    pub fn kind(&self) -> FlowNodeKind {
        match self {
            NodePayload::Root => FlowNodeKind::Root,
            NodePayload::SubJourney { .. } => FlowNodeKind::SubJourney,
            NodePayload::Step { .. } => FlowNodeKind::Step,
            NodePayload::TechnicalProfile { .. } => FlowNodeKind::TechnicalProfile,
            NodePayload::ClaimsTransformation { .. } => FlowNodeKind::ClaimsTransformation,
            NodePayload::HomeRealmDiscovery { .. } => FlowNodeKind::HomeRealmDiscovery,
            NodePayload::DisplayControl { .. } => FlowNodeKind::DisplayControl,
            NodePayload::SendClaims { .. } => FlowNodeKind::SendClaims,
        }
    }
}

/// One node of the execution tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowNode {
    pub id: String,
    pub name: String,
    pub kind: FlowNodeKind,
    /// Orchestration step active when the node was created.
    pub order: i64,
    /// High-water mark of orchestration steps observed under this node.
    pub last_step: i64,
    pub payload: NodePayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<NodeContext>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<StepError>,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FlowNode>,
}

impl FlowNode {
    /// New node with an id derived from its identity fields. `occurrence`
    /// disambiguates retried interactions that share every other field.
    pub fn new(
        journey_id: &str,
        name: impl Into<String>,
        order: i64,
        occurrence: u32,
        payload: NodePayload,
    ) -> FlowNode {
        let name = name.into();
        let kind = payload.kind();
        FlowNode {
            id: node_digest(journey_id, kind, &name, order, occurrence),
            name,
            kind,
            order,
            last_step: order,
            payload,
            context: None,
            errors: Vec::new(),
            status: ExecutionStatus::Unknown,
            children: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: NodeContext) -> FlowNode {
        self.context = Some(context);
        self
    }

    pub fn is_step(&self) -> bool {
        self.kind == FlowNodeKind::Step
    }

    /// Depth-first lookup by node id.
    pub fn find(&self, id: &str) -> Option<&FlowNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Total node count of the subtree rooted here, including this node.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(FlowNode::subtree_len)
            .sum::<usize>()
    }
}

/// Deterministic 16-hex-char node id over the node's identity fields.
/// Identical parses of identical input produce identical ids.
pub fn node_digest(
    journey_id: &str,
    kind: FlowNodeKind,
    name: &str,
    order: i64,
    occurrence: u32,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(journey_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(format!("{kind:?}").as_bytes());
    hasher.update([0u8]);
    hasher.update(name.as_bytes());
    hasher.update([0u8]);
    hasher.update(order.to_be_bytes());
    hasher.update(occurrence.to_be_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_stable_and_occurrence_sensitive() {
        let a = node_digest("journey", FlowNodeKind::Step, "Step 3", 3, 0);
        let b = node_digest("journey", FlowNodeKind::Step, "Step 3", 3, 0);
        let c = node_digest("journey", FlowNodeKind::Step, "Step 3", 3, 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn find_walks_the_whole_subtree() {
        let mut root = FlowNode::new("main", "Trace", 0, 0, NodePayload::Root);
        let mut step = FlowNode::new(
            "main",
            "Step 1",
            1,
            0,
            NodePayload::Step {
                journey_id: "main".to_string(),
                handler: None,
                interactive: false,
                result: None,
                statebag: BTreeMap::new(),
                claims: BTreeMap::new(),
            },
        );
        let profile = FlowNode::new(
            "main",
            "AAD-UserRead",
            1,
            0,
            NodePayload::TechnicalProfile {
                profile_id: "AAD-UserRead".to_string(),
                provider: None,
                protocol: None,
            },
        );
        let profile_id = profile.id.clone();
        step.children.push(profile);
        root.children.push(step);

        assert!(root.find(&profile_id).is_some());
        assert_eq!(root.subtree_len(), 3);
    }
}
