//! Interpreter contract: the seam between clip shapes and trace semantics.
//!
//! Each interpreter maps one handler family's result clips into a
//! normalized [`InterpretResult`] describing state changes and tree
//! mutations, independent of tree mechanics. Interpretation is pure
//! extraction; the only retained state anywhere is the orchestration
//! interpreter's retry timestamps, cleared by `reset`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use journeytrace_model::clip::{HandlerResultContent, TransitionContent};
use journeytrace_model::flow::{FlowNode, StepError, StepResult};
use journeytrace_model::keys::CLAIMS_BUNDLE_KEY;
use journeytrace_model::record::RecordValue;

use crate::error::InterpretError;
use crate::journey::JourneyStack;
use crate::statebag::Statebag;

/// Everything an interpreter may read while interpreting one handler
/// result. Borrowed views only; interpreters never mutate shared state.
pub struct InterpretContext<'a> {
    /// Fully-qualified handler name, resolved from the preceding Action or
    /// Predicate clip.
    pub handler: &'a str,
    pub result: &'a HandlerResultContent,
    pub timestamp: DateTime<Utc>,
    pub log_id: &'a str,
    /// Event instance of the containing log.
    pub event_type: &'a str,
    /// Outcome of the preceding predicate, when the handler was a gate.
    pub predicate_outcome: Option<&'a str>,
    /// Most recent transition hint in this log.
    pub transition: Option<&'a TransitionContent>,
    pub journey: &'a JourneyStack,
    pub statebag: &'a Statebag,
    /// Whether a step is currently accumulating.
    pub has_active_step: bool,
}

impl InterpretContext<'_> {
    /// The handler's recorder record, or an empty record.
    pub fn record(&self) -> &RecordValue {
        static EMPTY: RecordValue = RecordValue::Record(Vec::new());
        self.result.recorder_record.as_ref().unwrap_or(&EMPTY)
    }

    /// Journey id of the active context.
    pub fn journey_id(&self) -> &str {
        &self.journey.current().journey_id
    }

    /// Orchestration counter of the active context.
    pub fn current_step(&self) -> i64 {
        self.journey.current().last_orchestration_step
    }
}

/// A sub-journey dispatch extracted from a handler result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubJourneyPush {
    pub journey_id: String,
    pub journey_name: String,
}

/// Normalized outcome of interpreting one handler result.
#[derive(Debug, Clone)]
pub struct InterpretResult {
    pub success: bool,
    /// Open a new step (finalizing the current one first).
    pub create_step: bool,
    /// Close the current step without opening a new one.
    pub finalize_step: bool,
    pub statebag_updates: BTreeMap<String, String>,
    pub claims_updates: BTreeMap<String, String>,
    pub push_sub_journey: Option<SubJourneyPush>,
    /// Contexts to pop; applied after finalization.
    pub pop_sub_journey: usize,
    /// Step-level error message (becomes a Handled step error).
    pub error: Option<String>,
    pub error_hresult: Option<String>,
    pub step_result: Option<StepResult>,
    /// Handler to record on the step, short name preferred.
    pub action_handler: Option<String>,
    /// The step rendered UI or redirected the user agent.
    pub interactive: bool,
    /// A concrete claims exchange superseded any buffered provider-selection
    /// children for the current step.
    pub discard_pending_options: bool,
    /// Tree children to attach: to the new step for step-creating results,
    /// to the current step otherwise.
    pub flow_children: Vec<FlowNode>,
    pub step_errors: Vec<StepError>,
}

impl Default for InterpretResult {
    fn default() -> Self {
        InterpretResult {
            success: true,
            create_step: false,
            finalize_step: false,
            statebag_updates: BTreeMap::new(),
            claims_updates: BTreeMap::new(),
            push_sub_journey: None,
            pop_sub_journey: 0,
            error: None,
            error_hresult: None,
            step_result: None,
            action_handler: None,
            interactive: false,
            discard_pending_options: false,
            flow_children: Vec::new(),
            step_errors: Vec::new(),
        }
    }
}

impl InterpretResult {
    /// Result carrying only the generic statebag/claims extraction for a
    /// handler result. The starting point of every interpreter.
    pub fn updates_from(content: &HandlerResultContent) -> InterpretResult {
        let (statebag_updates, claims_updates) = extract_state_updates(content);
        InterpretResult {
            statebag_updates,
            claims_updates,
            ..InterpretResult::default()
        }
    }
}

/// One interpreter per logical handler family.
pub trait ClipInterpreter {
    /// Fully-qualified handler names this interpreter owns.
    fn handler_names(&self) -> &'static [&'static str];

    fn can_handle(&self, name: &str) -> bool {
        self.handler_names().contains(&name)
    }

    fn interpret(&mut self, ctx: &InterpretContext<'_>) -> Result<InterpretResult, InterpretError>;

    /// Clear retained state (retry timestamps). Called before each parse.
    fn reset(&mut self) {}
}

/// Split a handler result's statebag into the two namespaces: entries under
/// the claims bundle key go to claims, everything else to statebag. Values
/// arrive either as plain text or as `{v: ...}` records; both normalize to
/// strings.
pub fn extract_state_updates(
    content: &HandlerResultContent,
) -> (BTreeMap<String, String>, BTreeMap<String, String>) {
    let mut statebag = BTreeMap::new();
    let mut claims = BTreeMap::new();
    for (key, value) in &content.statebag {
        if key == CLAIMS_BUNDLE_KEY {
            for (claim_key, claim_value) in value.entries() {
                claims.insert(claim_key.clone(), scalar_text(claim_value));
            }
            continue;
        }
        statebag.insert(key.clone(), statebag_entry_text(value));
    }
    (statebag, claims)
}

fn statebag_entry_text(value: &RecordValue) -> String {
    if let Some(text) = value.as_text() {
        return text.to_string();
    }
    if let Some(inner) = value.text_of("v") {
        return inner.to_string();
    }
    scalar_text(value)
}

fn scalar_text(value: &RecordValue) -> String {
    match value.as_text() {
        Some(text) => text.to_string(),
        None => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Last segment of a fully-qualified handler name.
pub fn short_handler_name(handler: &str) -> &str {
    handler.rsplit('.').next().unwrap_or(handler)
}
