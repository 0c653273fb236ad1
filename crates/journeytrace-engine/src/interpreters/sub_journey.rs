//! Sub-journey dispatch and exit.
//!
//! The enqueue handler records the target journey in one of several
//! equivalent shapes: a plain string, or a record with id-like fields. The
//! exit handler closes the current sub-journey explicitly (most completions
//! are instead inferred by the orchestration rules).

use journeytrace_model::record::RecordValue;

use crate::error::InterpretError;
use crate::interpret::{ClipInterpreter, InterpretContext, InterpretResult, SubJourneyPush};
use crate::interpreters::{handler_names, record_keys};

pub struct SubJourneyInterpreter;

/// Resolve the dispatched journey id and friendly name from the record's
/// equivalent shapes.
fn resolve_dispatch(record: &RecordValue) -> Option<SubJourneyPush> {
    if let Some(value) = record.get(record_keys::ENQUEUED_JOURNEY) {
        if let Some(id) = value.as_text() {
            if !id.is_empty() {
                return Some(SubJourneyPush {
                    journey_id: id.to_string(),
                    journey_name: id.to_string(),
                });
            }
        }
    }
    let invocation = record.get(record_keys::SUB_JOURNEY_INVOCATION)?;
    let id = invocation
        .text_of(record_keys::SUB_JOURNEY_ID)
        .or_else(|| invocation.text_of("Id"))
        .or_else(|| invocation.text_of("JourneyId"))?;
    let name = invocation
        .text_of(record_keys::JOURNEY_FRIENDLY_NAME)
        .unwrap_or(id);
    Some(SubJourneyPush {
        journey_id: id.to_string(),
        journey_name: name.to_string(),
    })
}

impl ClipInterpreter for SubJourneyInterpreter {
    fn handler_names(&self) -> &'static [&'static str] {
        &[
            handler_names::ENQUEUE_NEW_JOURNEY,
            handler_names::EXIT_SUB_JOURNEY,
        ]
    }

    fn interpret(&mut self, ctx: &InterpretContext<'_>) -> Result<InterpretResult, InterpretError> {
        let mut result = InterpretResult::updates_from(ctx.result);
        result.action_handler = Some(ctx.handler.to_string());

        match ctx.handler {
            handler_names::ENQUEUE_NEW_JOURNEY => {
                let push =
                    resolve_dispatch(ctx.record()).ok_or(InterpretError::MissingField {
                        handler: "EnqueueNewJourney",
                        field: record_keys::SUB_JOURNEY_ID,
                    })?;
                result.push_sub_journey = Some(push);
            }
            handler_names::EXIT_SUB_JOURNEY => {
                result.finalize_step = true;
                result.pop_sub_journey = 1;
            }
            _ => {}
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(json: serde_json::Value) -> RecordValue {
        RecordValue::from_json(&json)
    }

    #[test]
    fn plain_string_shape_resolves() {
        let push = resolve_dispatch(&record(json!({
            "Values": [{"Key": "EnqueuedJourney", "Value": "PasswordReset"}]
        })))
        .expect("dispatch");
        assert_eq!(push.journey_id, "PasswordReset");
        assert_eq!(push.journey_name, "PasswordReset");
    }

    #[test]
    fn record_shape_resolves_with_friendly_name() {
        let push = resolve_dispatch(&record(json!({
            "Values": [{"Key": "SubJourneyInvocation", "Value": {"Values": [
                {"Key": "SubJourneyId", "Value": "PhoneVerify"},
                {"Key": "FriendlyName", "Value": "Verify your phone"},
            ]}}]
        })))
        .expect("dispatch");
        assert_eq!(push.journey_id, "PhoneVerify");
        assert_eq!(push.journey_name, "Verify your phone");
    }

    #[test]
    fn id_field_fallbacks_apply_in_order() {
        let push = resolve_dispatch(&record(json!({
            "Values": [{"Key": "SubJourneyInvocation", "Value": {"Values": [
                {"Key": "Id", "Value": "MfaSubJourney"},
            ]}}]
        })))
        .expect("dispatch");
        assert_eq!(push.journey_id, "MfaSubJourney");
    }

    #[test]
    fn missing_id_is_an_interpret_error() {
        assert!(resolve_dispatch(&record(json!({"Values": []}))).is_none());
    }
}
