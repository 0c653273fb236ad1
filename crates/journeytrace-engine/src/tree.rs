//! Execution tree builder.
//!
//! Owns the root [`FlowNode`] for the whole parse, the chain of currently
//! open sub-journey nodes, and the per-node execution map. Step attachment,
//! retry merging, and the session-boundary nesting reset all go through
//! here; nothing else mutates the tree.

use std::collections::BTreeMap;

use journeytrace_model::flow::{ExecutionStatus, FlowNode, FlowNodeKind, NodePayload};
use journeytrace_model::result::NodeExecution;

#[derive(Debug)]
pub struct FlowTreeBuilder {
    root: FlowNode,
    /// Node ids of the open sub-journey chain, outermost first. Steps
    /// attach under the innermost open sub-journey, or the root.
    open_path: Vec<String>,
    execution: BTreeMap<String, NodeExecution>,
}

impl FlowTreeBuilder {
    pub fn new(main_journey_id: &str) -> FlowTreeBuilder {
        FlowTreeBuilder {
            root: FlowNode::new(main_journey_id, main_journey_id, 0, 0, NodePayload::Root),
            open_path: Vec::new(),
            execution: BTreeMap::new(),
        }
    }

    /// The node new children attach under: the innermost open sub-journey,
    /// or the root. Falls back to the root if the chain is stale.
    fn container_mut(&mut self) -> &mut FlowNode {
        let mut node = &mut self.root;
        for id in &self.open_path {
            match node.children.iter().position(|child| &child.id == id) {
                Some(index) => node = &mut node.children[index],
                None => break,
            }
        }
        node
    }

    /// Attach a finalized step (or standalone error step) and return its id.
    pub fn attach_step(&mut self, node: FlowNode) -> String {
        let id = node.id.clone();
        self.container_mut().children.push(node);
        id
    }

    /// Attach a sub-journey node and make it the open container.
    pub fn open_sub_journey(&mut self, node: FlowNode) -> String {
        let id = node.id.clone();
        self.container_mut().children.push(node);
        self.open_path.push(id.clone());
        id
    }

    /// Close the innermost open sub-journey. Returns false when no
    /// sub-journey is open.
    pub fn close_sub_journey(&mut self) -> bool {
        self.open_path.pop().is_some()
    }

    /// Drop all open sub-journey nesting. Already-attached nodes stay in
    /// the tree. Called at session boundaries.
    pub fn reset_nesting(&mut self) {
        self.open_path.clear();
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut FlowNode> {
        find_mut(&mut self.root, id)
    }

    /// Record the high-water orchestration step on every open container.
    pub fn update_last_step(&mut self, step: i64) {
        self.root.last_step = self.root.last_step.max(step);
        let mut node = &mut self.root;
        for id in &self.open_path {
            match node.children.iter().position(|child| &child.id == id) {
                Some(index) => {
                    node = &mut node.children[index];
                    node.last_step = node.last_step.max(step);
                }
                None => break,
            }
        }
    }

    /// Merge a re-observed step occurrence into an already-finalized node:
    /// later snapshots win, errors accumulate, children union per kind.
    pub fn merge_into_step(&mut self, id: &str, incoming: FlowNode) {
        if let Some(existing) = self.node_mut(id) {
            merge_step(existing, incoming);
        }
    }

    /// Record one visit of a node in the execution map. Error status is
    /// sticky across visits.
    pub fn record_visit(&mut self, id: &str, step_index: Option<usize>, status: ExecutionStatus) {
        let entry = self.execution.entry(id.to_string()).or_default();
        entry.visit_count += 1;
        if let Some(index) = step_index {
            entry.step_indices.push(index);
        }
        entry.status = combine_status(entry.status, status);
    }

    /// Finish the tree: resolve container statuses bottom-up and hand the
    /// tree and execution map to the caller.
    pub fn finish(mut self) -> (FlowNode, BTreeMap<String, NodeExecution>) {
        resolve_container_status(&mut self.root);
        for node_id in collect_container_ids(&self.root) {
            let status = self
                .root
                .find(&node_id)
                .map(|n| n.status)
                .unwrap_or_default();
            let entry = self.execution.entry(node_id).or_default();
            entry.status = combine_status(entry.status, status);
        }
        (self.root, self.execution)
    }
}

fn find_mut<'a>(node: &'a mut FlowNode, id: &str) -> Option<&'a mut FlowNode> {
    if node.id == id {
        return Some(node);
    }
    node.children
        .iter_mut()
        .find_map(|child| find_mut(child, id))
}

fn combine_status(current: ExecutionStatus, incoming: ExecutionStatus) -> ExecutionStatus {
    match (current, incoming) {
        (ExecutionStatus::Error, _) | (_, ExecutionStatus::Error) => ExecutionStatus::Error,
        (ExecutionStatus::Success, _) | (_, ExecutionStatus::Success) => ExecutionStatus::Success,
        _ => ExecutionStatus::Unknown,
    }
}

/// A root or sub-journey node is errored when any descendant errored,
/// successful when it has any resolved descendant, unknown otherwise.
fn resolve_container_status(node: &mut FlowNode) {
    for child in &mut node.children {
        resolve_container_status(child);
    }
    if matches!(node.kind, FlowNodeKind::Root | FlowNodeKind::SubJourney) {
        let mut status = ExecutionStatus::Unknown;
        for child in &node.children {
            status = combine_status(status, child.status);
        }
        node.status = status;
    }
}

fn collect_container_ids(node: &FlowNode) -> Vec<String> {
    let mut ids = Vec::new();
    if matches!(node.kind, FlowNodeKind::Root | FlowNodeKind::SubJourney) {
        ids.push(node.id.clone());
    }
    for child in &node.children {
        ids.extend(collect_container_ids(child));
    }
    ids
}

fn merge_step(existing: &mut FlowNode, incoming: FlowNode) {
    let FlowNode {
        payload,
        children,
        errors,
        status,
        last_step,
        context,
        ..
    } = incoming;

    existing.last_step = existing.last_step.max(last_step);
    for error in errors {
        if !existing.errors.contains(&error) {
            existing.errors.push(error);
        }
    }
    existing.status = combine_status(existing.status, status);
    if existing.context.is_none() {
        existing.context = context;
    }

    if let (
        NodePayload::Step {
            statebag: existing_statebag,
            claims: existing_claims,
            result: existing_result,
            handler: existing_handler,
            interactive: existing_interactive,
            ..
        },
        NodePayload::Step {
            statebag,
            claims,
            result,
            handler,
            interactive,
            ..
        },
    ) = (&mut existing.payload, payload)
    {
        // Later fragments carry the fuller picture of the same interaction.
        *existing_statebag = statebag;
        *existing_claims = claims;
        if result.is_some() {
            *existing_result = result;
        }
        if handler.is_some() {
            *existing_handler = handler;
        }
        *existing_interactive |= interactive;
    }

    for child in children {
        merge_child(&mut existing.children, child);
    }
}

/// Union rules for step children: technical profiles merge by profile name
/// preferring the richer provider/protocol metadata, provider selections
/// union their option lists, everything else appends.
pub fn merge_child(children: &mut Vec<FlowNode>, incoming: FlowNode) {
    match incoming.kind {
        FlowNodeKind::TechnicalProfile => {
            let found = children
                .iter_mut()
                .find(|c| c.kind == FlowNodeKind::TechnicalProfile && c.name == incoming.name);
            match found {
                Some(existing) => {
                    let FlowNode {
                        payload,
                        children: grandchildren,
                        status,
                        ..
                    } = incoming;
                    if let (
                        NodePayload::TechnicalProfile {
                            provider: existing_provider,
                            protocol: existing_protocol,
                            ..
                        },
                        NodePayload::TechnicalProfile {
                            provider, protocol, ..
                        },
                    ) = (&mut existing.payload, payload)
                    {
                        if existing_provider.is_none() {
                            *existing_provider = provider;
                        }
                        if existing_protocol.is_none() {
                            *existing_protocol = protocol;
                        }
                    }
                    existing.status = combine_status(existing.status, status);
                    for grandchild in grandchildren {
                        merge_child(&mut existing.children, grandchild);
                    }
                }
                None => children.push(incoming),
            }
        }
        FlowNodeKind::HomeRealmDiscovery => {
            let found = children
                .iter_mut()
                .find(|c| c.kind == FlowNodeKind::HomeRealmDiscovery && c.name == incoming.name);
            match found {
                Some(existing) => {
                    if let (
                        NodePayload::HomeRealmDiscovery {
                            options: existing_options,
                        },
                        NodePayload::HomeRealmDiscovery { options },
                    ) = (&mut existing.payload, incoming.payload)
                    {
                        for option in options {
                            if !existing_options.contains(&option) {
                                existing_options.push(option);
                            }
                        }
                    }
                }
                None => children.push(incoming),
            }
        }
        _ => children.push(incoming),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn step_node(name: &str, order: i64) -> FlowNode {
        FlowNode::new(
            "main",
            name,
            order,
            0,
            NodePayload::Step {
                journey_id: "main".to_string(),
                handler: None,
                interactive: false,
                result: None,
                statebag: BTreeMap::new(),
                claims: BTreeMap::new(),
            },
        )
    }

    fn profile_node(id: &str, provider: Option<&str>) -> FlowNode {
        FlowNode::new(
            "main",
            id,
            0,
            0,
            NodePayload::TechnicalProfile {
                profile_id: id.to_string(),
                provider: provider.map(str::to_string),
                protocol: None,
            },
        )
    }

    #[test]
    fn steps_attach_under_the_open_sub_journey() {
        let mut tree = FlowTreeBuilder::new("main");
        tree.attach_step(step_node("Step 1", 1));
        let sub = FlowNode::new(
            "PasswordReset",
            "PasswordReset",
            1,
            0,
            NodePayload::SubJourney {
                journey_id: "PasswordReset".to_string(),
            },
        );
        tree.open_sub_journey(sub);
        tree.attach_step(FlowNode::new(
            "PasswordReset",
            "Step 1",
            1,
            0,
            NodePayload::Step {
                journey_id: "PasswordReset".to_string(),
                handler: None,
                interactive: false,
                result: None,
                statebag: BTreeMap::new(),
                claims: BTreeMap::new(),
            },
        ));
        tree.close_sub_journey();
        tree.attach_step(step_node("Step 2", 2));

        let (root, _) = tree.finish();
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.children[1].kind, FlowNodeKind::SubJourney);
        assert_eq!(root.children[1].children.len(), 1);
    }

    #[test]
    fn merge_unions_technical_profiles_and_prefers_richer_metadata() {
        let mut tree = FlowTreeBuilder::new("main");
        let mut first = step_node("Step 2", 2);
        first.children.push(profile_node("AAD-UserRead", None));
        let id = tree.attach_step(first);

        let mut second = step_node("Step 2", 2);
        second
            .children
            .push(profile_node("AAD-UserRead", Some("AzureActiveDirectory")));
        second.children.push(profile_node("REST-Validate", None));
        tree.merge_into_step(&id, second);

        let (root, _) = tree.finish();
        let step = &root.children[0];
        assert_eq!(step.children.len(), 2);
        match &step.children[0].payload {
            NodePayload::TechnicalProfile { provider, .. } => {
                assert_eq!(provider.as_deref(), Some("AzureActiveDirectory"));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn reset_nesting_reattaches_to_the_root() {
        let mut tree = FlowTreeBuilder::new("main");
        tree.open_sub_journey(FlowNode::new(
            "MFA",
            "MFA",
            1,
            0,
            NodePayload::SubJourney {
                journey_id: "MFA".to_string(),
            },
        ));
        tree.reset_nesting();
        tree.attach_step(step_node("Step 1", 1));

        let (root, _) = tree.finish();
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[1].kind, FlowNodeKind::Step);
    }

    #[test]
    fn visit_status_is_error_sticky() {
        let mut tree = FlowTreeBuilder::new("main");
        let id = tree.attach_step(step_node("Step 1", 1));
        tree.record_visit(&id, Some(0), ExecutionStatus::Error);
        tree.record_visit(&id, Some(1), ExecutionStatus::Success);

        let (_, execution) = tree.finish();
        let entry = &execution[&id];
        assert_eq!(entry.visit_count, 2);
        assert_eq!(entry.status, ExecutionStatus::Error);
        assert_eq!(entry.step_indices, vec![0, 1]);
    }
}
