//! Step lifecycle manager.
//!
//! Consumes [`InterpretResult`]s sequentially and owns step creation,
//! finalization, sub-journey push/pop ordering, and retry/duplicate
//! merging. Implicit two-state machine: Idle (no active step) and
//! Accumulating (a step is open, collecting updates and buffered
//! children); finalize returns to Idle.
//!
//! Ordering on a step-advance: finalize the current step in its *pre-pop*
//! context, apply the requested pops, sync the journey counter, clear
//! transient statebag keeping claims, apply the new updates, open the new
//! step in the *post-pop* context.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use journeytrace_model::clip::ExceptionContent;
use journeytrace_model::flow::{
    ExecutionStatus, FlowNode, FlowNodeKind, NodeContext, NodePayload, StepError, StepErrorKind,
    StepResult,
};
use journeytrace_model::keys::ORCHESTRATION_STEP_KEY;
use journeytrace_model::result::StepSummary;

use crate::config::ParserConfig;
use crate::interpret::{InterpretResult, short_handler_name};
use crate::journey::{JourneyContext, JourneyStack};
use crate::statebag::Statebag;
use crate::tree::FlowTreeBuilder;

/// Traversal metadata of the clip group currently being applied.
#[derive(Debug, Clone)]
pub struct ClipMeta {
    pub timestamp: DateTime<Utc>,
    pub sequence: u64,
    pub log_id: String,
    pub event_type: String,
}

/// The step currently accumulating. Children are buffered with a flag
/// marking provider-selection options, which a concrete claims exchange may
/// later discard.
struct ActiveStep {
    journey_id: String,
    order: i64,
    handler: Option<String>,
    interactive: bool,
    result: Option<StepResult>,
    errors: Vec<StepError>,
    children: Vec<(FlowNode, bool)>,
    created: ClipMeta,
    last_seen: DateTime<Utc>,
}

struct FinalizedRef {
    node_id: String,
    finalized_at: DateTime<Utc>,
}

pub struct StepLifecycle {
    config: ParserConfig,
    statebag: Statebag,
    journey: JourneyStack,
    tree: FlowTreeBuilder,
    active: Option<ActiveStep>,
    /// Children produced before any step opened; attached to the next step.
    orphans: Vec<FlowNode>,
    /// Deduplication index: `(journey id, step order)` → last finalized
    /// occurrence.
    finalized: BTreeMap<(String, i64), FinalizedRef>,
    /// Occurrence counters for distinct (non-merged) retry nodes.
    occurrences: BTreeMap<(String, i64), u32>,
    sub_journey_counts: BTreeMap<String, u32>,
    exception_count: u32,
    steps: Vec<StepSummary>,
    errors: Vec<String>,
}

impl StepLifecycle {
    pub fn new(config: ParserConfig, main_journey_id: &str) -> StepLifecycle {
        StepLifecycle {
            config,
            statebag: Statebag::new(),
            journey: JourneyStack::new(main_journey_id, main_journey_id),
            tree: FlowTreeBuilder::new(main_journey_id),
            active: None,
            orphans: Vec::new(),
            finalized: BTreeMap::new(),
            occurrences: BTreeMap::new(),
            sub_journey_counts: BTreeMap::new(),
            exception_count: 0,
            steps: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn journey(&self) -> &JourneyStack {
        &self.journey
    }

    pub fn statebag(&self) -> &Statebag {
        &self.statebag
    }

    pub fn has_active_step(&self) -> bool {
        self.active.is_some()
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Apply one interpreted handler result.
    pub fn apply(&mut self, result: InterpretResult, meta: &ClipMeta) {
        if let Some(push) = result.push_sub_journey.clone() {
            // The step carrying the dispatch signal is not part of the
            // output tree.
            self.active = None;
            self.statebag.apply_updates(&result.statebag_updates);
            self.statebag.apply_claims_updates(&result.claims_updates);
            self.open_sub_journey(&push.journey_id, &push.journey_name, meta);
            return;
        }

        if result.create_step {
            self.finalize_active();
            self.apply_pops(result.pop_sub_journey);
            let new_counter: Option<i64> = result
                .statebag_updates
                .get(ORCHESTRATION_STEP_KEY)
                .and_then(|value| value.parse().ok());
            if let Some(counter) = new_counter {
                self.journey.update_orch_step(counter);
                self.tree.update_last_step(counter);
            }
            self.statebag.clear_statebag_keep_claims();
            self.statebag.apply_updates(&result.statebag_updates);
            self.statebag.apply_claims_updates(&result.claims_updates);
            self.open_step(meta);
            self.absorb(result, meta);
            return;
        }

        self.statebag.apply_updates(&result.statebag_updates);
        self.statebag.apply_claims_updates(&result.claims_updates);
        if let Some(counter) = result
            .statebag_updates
            .get(ORCHESTRATION_STEP_KEY)
            .and_then(|value| value.parse().ok())
        {
            self.journey.update_orch_step(counter);
        }

        let finalize = result.finalize_step;
        let pops = result.pop_sub_journey;
        self.absorb(result, meta);
        if finalize {
            self.finalize_active();
        }
        // Rule-1 pops arrive with finalize and happen after it.
        self.apply_pops(pops);
    }

    /// Mark the accumulating step errored (fatal exception path).
    pub fn mark_active_errored(&mut self, error: StepError) {
        if let Some(step) = &mut self.active {
            step.result = Some(StepResult::Error);
            step.errors.push(error);
        }
    }

    /// Emit a standalone error step directly on the tree, bypassing the
    /// normal lifecycle: a fatal exception has no further clips to
    /// interpret in its log.
    pub fn push_fatal_error_step(&mut self, exception: &ExceptionContent, meta: &ClipMeta) {
        let journey_id = self.journey.current().journey_id.clone();
        let order = self.journey.current().last_orchestration_step;
        let occurrence = self.exception_count;
        self.exception_count += 1;

        let mut node = FlowNode::new(
            &journey_id,
            "Exception",
            order,
            occurrence,
            NodePayload::Step {
                journey_id: journey_id.clone(),
                handler: Some("Exception".to_string()),
                interactive: false,
                result: Some(StepResult::Error),
                statebag: self.statebag.statebag_snapshot(),
                claims: self.statebag.claims_snapshot(),
            },
        )
        .with_context(self.node_context(meta));
        node.status = ExecutionStatus::Error;
        node.errors.push(StepError {
            kind: StepErrorKind::Fatal,
            hresult: exception.hresult.clone(),
            message: exception.message.clone(),
        });

        let node_id = self.tree.attach_step(node);
        let index = self.steps.len();
        self.tree
            .record_visit(&node_id, Some(index), ExecutionStatus::Error);
        self.steps.push(StepSummary {
            node_id,
            journey_id,
            order,
            name: "Exception".to_string(),
            timestamp: meta.timestamp,
            duration_ms: None,
            status: ExecutionStatus::Error,
        });
    }

    /// Full reset at a session boundary: the in-flight step is finalized
    /// first, then statebag, journey nesting, and deduplication state all
    /// clear. Already-finalized output stays in the tree.
    pub fn session_reset(&mut self) {
        self.finalize_active();
        self.statebag.reset();
        self.journey.reset();
        self.tree.reset_nesting();
        self.finalized.clear();
        self.occurrences.clear();
        self.orphans.clear();
    }

    /// Close the accumulating step, if any: snapshot state onto it and
    /// attach it to the tree, merging into a recent occurrence of the same
    /// `(journey, order)` identity when within the merge window.
    pub fn finalize_active(&mut self) {
        let Some(step) = self.active.take() else {
            return;
        };
        // Steps are only meaningful once real orchestration has begun;
        // an errored step before that is an early validation failure and
        // is kept.
        if step.order <= 0 && step.errors.is_empty() {
            return;
        }

        let ActiveStep {
            journey_id,
            order,
            handler,
            interactive,
            result,
            errors,
            children,
            created,
            last_seen,
        } = step;

        let status = if errors.is_empty() && result != Some(StepResult::Error) {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Error
        };
        let children: Vec<FlowNode> = children.into_iter().map(|(node, _)| node).collect();
        let key = (journey_id.clone(), order);

        let merge_target = self.finalized.get(&key).and_then(|previous| {
            let gap = (last_seen - previous.finalized_at).num_milliseconds().abs();
            (gap <= self.config.step_merge_window_ms).then(|| previous.node_id.clone())
        });

        let build = |occurrence: u32, lifecycle: &StepLifecycle| -> FlowNode {
            let mut node = FlowNode::new(
                &journey_id,
                format!("Step {order}"),
                order,
                occurrence,
                NodePayload::Step {
                    journey_id: journey_id.clone(),
                    handler: handler.clone(),
                    interactive,
                    result,
                    statebag: lifecycle.statebag.statebag_snapshot(),
                    claims: lifecycle.statebag.claims_snapshot(),
                },
            )
            .with_context(NodeContext {
                timestamp: created.timestamp,
                sequence_number: created.sequence,
                log_id: created.log_id.clone(),
                event_type: created.event_type.clone(),
                statebag_snapshot: lifecycle.statebag.statebag_snapshot(),
                claims_snapshot: lifecycle.statebag.claims_snapshot(),
            });
            node.status = status;
            node.errors = errors.clone();
            node
        };

        match merge_target {
            Some(node_id) => {
                let mut incoming = build(0, self);
                incoming.children = children;
                self.tree.merge_into_step(&node_id, incoming);
                let index = self.steps.len();
                self.tree.record_visit(&node_id, Some(index), status);
                self.steps.push(StepSummary {
                    node_id,
                    journey_id,
                    order,
                    name: format!("Step {order}"),
                    timestamp: created.timestamp,
                    duration_ms: None,
                    status,
                });
                if let Some(previous) = self.finalized.get_mut(&key) {
                    previous.finalized_at = last_seen;
                }
            }
            None => {
                let occurrence = {
                    let counter = self.occurrences.entry(key.clone()).or_insert(0);
                    let occurrence = *counter;
                    *counter += 1;
                    occurrence
                };
                let mut node = build(occurrence, self);
                node.children = children;
                let node_id = self.tree.attach_step(node);
                self.tree.update_last_step(order);
                let index = self.steps.len();
                self.tree.record_visit(&node_id, Some(index), status);
                self.steps.push(StepSummary {
                    node_id: node_id.clone(),
                    journey_id,
                    order,
                    name: format!("Step {order}"),
                    timestamp: created.timestamp,
                    duration_ms: None,
                    status,
                });
                self.finalized.insert(
                    key,
                    FinalizedRef {
                        node_id,
                        finalized_at: last_seen,
                    },
                );
            }
        }
    }

    /// Hand back everything the parser needs, finalizing any in-flight
    /// step first (end of input is a step boundary).
    pub fn into_parts(mut self) -> LifecycleParts {
        self.finalize_active();
        let final_statebag = self.statebag.statebag_snapshot();
        let final_claims = self.statebag.claims_snapshot();
        let (tree, execution) = self.tree.finish();
        LifecycleParts {
            tree,
            execution,
            steps: self.steps,
            errors: self.errors,
            final_statebag,
            final_claims,
        }
    }

    fn open_step(&mut self, meta: &ClipMeta) {
        let context = self.journey.current();
        let journey_id = context.journey_id.clone();
        let order = context.last_orchestration_step;
        let mut children: Vec<(FlowNode, bool)> = Vec::new();
        for orphan in self.orphans.drain(..) {
            let pending = orphan.kind == FlowNodeKind::HomeRealmDiscovery;
            children.push((orphan, pending));
        }
        self.active = Some(ActiveStep {
            journey_id,
            order,
            handler: None,
            interactive: false,
            result: None,
            errors: Vec::new(),
            children,
            created: meta.clone(),
            last_seen: meta.timestamp,
        });
    }

    fn open_sub_journey(&mut self, journey_id: &str, journey_name: &str, meta: &ClipMeta) {
        let occurrence = {
            let counter = self
                .sub_journey_counts
                .entry(journey_id.to_string())
                .or_insert(0);
            let occurrence = *counter;
            *counter += 1;
            occurrence
        };
        let order = self.journey.current().last_orchestration_step;
        let node = FlowNode::new(
            journey_id,
            journey_name,
            order,
            occurrence,
            NodePayload::SubJourney {
                journey_id: journey_id.to_string(),
            },
        )
        .with_context(self.node_context(meta));
        self.tree.open_sub_journey(node);
        // The orchestration counter is global: the child context starts
        // from the parent's current value, not from zero.
        let mut context = JourneyContext::new(journey_id, journey_name);
        context.last_orchestration_step = order;
        self.journey.push(context);
    }

    /// Fold the non-structural fields of a result into the active step.
    fn absorb(&mut self, result: InterpretResult, meta: &ClipMeta) {
        let InterpretResult {
            error,
            error_hresult,
            step_result,
            action_handler,
            interactive,
            discard_pending_options,
            flow_children,
            step_errors,
            ..
        } = result;

        let Some(step) = &mut self.active else {
            // No step is open; children wait for the next one.
            self.orphans.extend(flow_children);
            return;
        };

        step.last_seen = meta.timestamp;
        if discard_pending_options {
            step.children.retain(|(_, pending)| !pending);
        }
        for child in flow_children {
            let pending = child.kind == FlowNodeKind::HomeRealmDiscovery;
            step.children.push((child, pending));
        }
        if let Some(handler) = action_handler {
            step.handler = Some(display_handler(&handler));
        }
        if interactive {
            step.interactive = true;
        }
        if let Some(result) = step_result {
            step.result = Some(result);
        }
        let had_step_errors = !step_errors.is_empty();
        step.errors.extend(step_errors);
        if !had_step_errors {
            if let Some(message) = error {
                step.errors.push(StepError {
                    kind: StepErrorKind::Handled,
                    hresult: error_hresult,
                    message,
                });
            }
        }
    }

    fn apply_pops(&mut self, count: usize) {
        for _ in 0..count {
            match self.journey.pop() {
                Ok(_) => {
                    self.tree.close_sub_journey();
                }
                Err(err) => {
                    self.errors.push(err.to_string());
                    break;
                }
            }
        }
    }

    fn node_context(&self, meta: &ClipMeta) -> NodeContext {
        NodeContext {
            timestamp: meta.timestamp,
            sequence_number: meta.sequence,
            log_id: meta.log_id.clone(),
            event_type: meta.event_type.clone(),
            statebag_snapshot: self.statebag.statebag_snapshot(),
            claims_snapshot: self.statebag.claims_snapshot(),
        }
    }
}

/// Qualified handler names shorten to their last segment; anything else
/// (content definition ids, provider annotations) stays as-is.
fn display_handler(handler: &str) -> String {
    if handler.ends_with("Handler") {
        short_handler_name(handler).to_string()
    } else {
        handler.to_string()
    }
}

pub struct LifecycleParts {
    pub tree: FlowNode,
    pub execution: BTreeMap<String, journeytrace_model::result::NodeExecution>,
    pub steps: Vec<StepSummary>,
    pub errors: Vec<String>,
    pub final_statebag: BTreeMap<String, String>,
    pub final_claims: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::SubJourneyPush;
    use chrono::TimeZone;

    fn meta(at_ms: i64) -> ClipMeta {
        ClipMeta {
            timestamp: Utc.timestamp_millis_opt(at_ms).single().expect("timestamp"),
            sequence: at_ms as u64,
            log_id: "log-1".to_string(),
            event_type: "Event:AUTH".to_string(),
        }
    }

    fn advance(counter: i64) -> InterpretResult {
        let mut result = InterpretResult::default();
        result.create_step = true;
        result.statebag_updates.insert(
            ORCHESTRATION_STEP_KEY.to_string(),
            counter.to_string(),
        );
        result
    }

    #[test]
    fn advance_finalizes_the_previous_step() {
        let mut lifecycle = StepLifecycle::new(ParserConfig::default(), "main");
        lifecycle.apply(advance(1), &meta(0));
        lifecycle.apply(advance(2), &meta(5000));

        let parts = lifecycle.into_parts();
        assert_eq!(parts.steps.len(), 2);
        assert_eq!(parts.tree.children.len(), 2);
        assert_eq!(parts.steps[0].order, 1);
        assert_eq!(parts.steps[1].order, 2);
    }

    #[test]
    fn same_identity_within_window_merges_into_one_node() {
        let mut lifecycle = StepLifecycle::new(ParserConfig::default(), "main");
        lifecycle.apply(advance(1), &meta(0));
        // Close and re-open the same step 400 ms later (two log fragments
        // of one interaction).
        let mut finalize = InterpretResult::default();
        finalize.finalize_step = true;
        lifecycle.apply(finalize, &meta(400));
        lifecycle.apply(advance(1), &meta(800));

        let parts = lifecycle.into_parts();
        assert_eq!(parts.tree.children.len(), 1, "one merged node");
        assert_eq!(parts.steps.len(), 2, "both visits in the flat list");
        let node_id = &parts.tree.children[0].id;
        assert_eq!(parts.execution[node_id].visit_count, 2);
    }

    #[test]
    fn same_identity_beyond_window_is_a_distinct_retry_node() {
        let mut lifecycle = StepLifecycle::new(ParserConfig::default(), "main");
        lifecycle.apply(advance(1), &meta(0));
        let mut finalize = InterpretResult::default();
        finalize.finalize_step = true;
        lifecycle.apply(finalize, &meta(100));
        lifecycle.apply(advance(1), &meta(30_000));

        let parts = lifecycle.into_parts();
        assert_eq!(parts.tree.children.len(), 2);
        assert_ne!(parts.tree.children[0].id, parts.tree.children[1].id);
    }

    #[test]
    fn push_discards_the_carrying_step() {
        let mut lifecycle = StepLifecycle::new(ParserConfig::default(), "main");
        lifecycle.apply(advance(1), &meta(0));
        let mut push = InterpretResult::default();
        push.push_sub_journey = Some(SubJourneyPush {
            journey_id: "PasswordReset".to_string(),
            journey_name: "PasswordReset".to_string(),
        });
        lifecycle.apply(push, &meta(100));
        lifecycle.apply(advance(2), &meta(200));

        let parts = lifecycle.into_parts();
        // The dispatch step vanished; the tree holds the sub-journey with
        // its inner step.
        assert_eq!(parts.tree.children.len(), 1);
        let sub = &parts.tree.children[0];
        assert_eq!(sub.kind, FlowNodeKind::SubJourney);
        assert_eq!(sub.name, "PasswordReset");
        assert_eq!(sub.children.len(), 1);
        assert_eq!(sub.children[0].kind, FlowNodeKind::Step);
    }

    #[test]
    fn zero_order_steps_are_discarded_unless_errored() {
        let mut lifecycle = StepLifecycle::new(ParserConfig::default(), "main");
        let mut bare = InterpretResult::default();
        bare.create_step = true;
        lifecycle.apply(bare, &meta(0));
        let mut finalize = InterpretResult::default();
        finalize.finalize_step = true;
        lifecycle.apply(finalize, &meta(10));

        let mut errored = InterpretResult::default();
        errored.create_step = true;
        errored.error = Some("access denied before orchestration".to_string());
        lifecycle.apply(errored, &meta(20));

        let parts = lifecycle.into_parts();
        assert_eq!(parts.tree.children.len(), 1);
        assert_eq!(parts.tree.children[0].status, ExecutionStatus::Error);
    }

    #[test]
    fn excess_pops_surface_as_errors() {
        let mut lifecycle = StepLifecycle::new(ParserConfig::default(), "main");
        let mut result = InterpretResult::default();
        result.finalize_step = true;
        result.pop_sub_journey = 2;
        lifecycle.apply(result, &meta(0));

        let parts = lifecycle.into_parts();
        assert_eq!(parts.errors.len(), 1);
        assert!(parts.errors[0].contains("pop past root"));
    }
}
