//! Clip model: one atomic diagnostic log fragment.
//!
//! Clips arrive grouped into logs (see [`crate::log::TraceLogInput`]). The
//! engine serializes each clip as `{"kind": ..., "content": ...}` with the
//! content shape determined by the kind. Within one log, clip order is the
//! engine's real execution order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::RecordValue;

/// The six clip kinds the orchestration engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClipKind {
    Headers,
    Transition,
    Predicate,
    Action,
    HandlerResult,
    Exception,
}

impl ClipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipKind::Headers => "Headers",
            ClipKind::Transition => "Transition",
            ClipKind::Predicate => "Predicate",
            ClipKind::Action => "Action",
            ClipKind::HandlerResult => "HandlerResult",
            ClipKind::Exception => "Exception",
        }
    }
}

/// One atomic log fragment with kind-discriminated content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content")]
pub enum Clip {
    /// Request headers: correlation, tenant, policy, event instance.
    Headers(HeadersContent),
    /// State machine transition hint.
    Transition(TransitionContent),
    /// Fully-qualified name of an upcoming gate/decision handler.
    Predicate(String),
    /// Fully-qualified name of an upcoming imperative handler.
    Action(String),
    /// Outcome of the most recently announced handler.
    HandlerResult(HandlerResultContent),
    /// Fatal engine exception; terminal for the log segment.
    Exception(ExceptionContent),
}

impl Clip {
    pub fn kind(&self) -> ClipKind {
        match self {
            Clip::Headers(_) => ClipKind::Headers,
            Clip::Transition(_) => ClipKind::Transition,
            Clip::Predicate(_) => ClipKind::Predicate,
            Clip::Action(_) => ClipKind::Action,
            Clip::HandlerResult(_) => ClipKind::HandlerResult,
            Clip::Exception(_) => ClipKind::Exception,
        }
    }
}

/// Content of a Headers clip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeadersContent {
    pub correlation_id: String,
    pub tenant_id: String,
    pub policy_id: String,
    /// `Event:AUTH`, `Event:API`, or an unsupported instance the parser
    /// filters out.
    pub event_instance: String,
}

/// Content of a Transition clip. Informational only in the tree-based
/// model; interpreters may read it as a hint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransitionContent {
    pub event_name: String,
    pub state_name: String,
}

/// Content of a HandlerResult clip: statebag mutations plus the handler's
/// recorder record (a loosely-typed nested key/value tree).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HandlerResultContent {
    /// Overall handler outcome, when the engine reports one.
    pub result: Option<bool>,
    /// Outcome of a predicate handler: `"True"` / `"False"`.
    pub predicate_result: Option<String>,
    /// Statebag entries as of this handler firing. Values are either plain
    /// text or small records (`{v: ...}` and the claims bundle).
    pub statebag: BTreeMap<String, RecordValue>,
    /// Handler-specific structured output.
    pub recorder_record: Option<RecordValue>,
    /// Non-fatal exception the handler surfaced (validation failures).
    pub exception: Option<ExceptionContent>,
}

/// Content of an Exception clip, or a handler-surfaced exception inside a
/// HandlerResult.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExceptionContent {
    pub kind: String,
    #[serde(rename = "hResult")]
    pub hresult: Option<String>,
    pub message: String,
    pub data: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clip_round_trips_through_adjacent_tagging() {
        let json = json!({
            "kind": "Headers",
            "content": {
                "correlationId": "corr-1",
                "tenantId": "contoso.onmicrosoft.com",
                "policyId": "B2C_1A_signup_signin",
                "eventInstance": "Event:AUTH",
            }
        });

        let clip: Clip = serde_json::from_value(json).expect("headers clip should parse");
        assert_eq!(clip.kind(), ClipKind::Headers);
        match &clip {
            Clip::Headers(headers) => assert_eq!(headers.event_instance, "Event:AUTH"),
            other => panic!("unexpected clip: {other:?}"),
        }
    }

    #[test]
    fn handler_result_statebag_values_parse_as_records() {
        let json = json!({
            "kind": "HandlerResult",
            "content": {
                "result": true,
                "statebag": {
                    "ORCH_CS": {"v": "3"},
                    "Complex-CLMS": {"email": "user@contoso.com"},
                },
                "recorderRecord": {
                    "Values": [{"Key": "InitiatingClaimsExchange", "Value": {
                        "Values": [{"Key": "TechnicalProfileId", "Value": "AAD-UserRead"}]
                    }}]
                }
            }
        });

        let clip: Clip = serde_json::from_value(json).expect("handler result should parse");
        let Clip::HandlerResult(content) = clip else {
            panic!("expected handler result");
        };
        assert_eq!(content.result, Some(true));
        assert_eq!(
            content.statebag.get("ORCH_CS").and_then(|v| v.text_of("v")),
            Some("3")
        );
        let record = content.recorder_record.expect("recorder record present");
        assert_eq!(
            record.text_at(&["InitiatingClaimsExchange", "TechnicalProfileId"]),
            Some("AAD-UserRead")
        );
    }

    #[test]
    fn predicate_and_action_content_is_a_handler_name() {
        let clip: Clip = serde_json::from_value(json!({
            "kind": "Action",
            "content": "Web.TPEngine.StateMachineHandlers.ExecuteCurrentStepHandler",
        }))
        .expect("action clip should parse");
        match clip {
            Clip::Action(name) => {
                assert!(name.ends_with("ExecuteCurrentStepHandler"));
            }
            other => panic!("unexpected clip: {other:?}"),
        }
    }
}
