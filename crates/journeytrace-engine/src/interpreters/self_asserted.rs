//! Self-asserted interpreter: the three phases of a user-input form.
//!
//! Redirect shows the form, validation checks the submission, action
//! finalizes the step. A validation failure surfaces as a Handled step
//! error with the original message and error code and does NOT finalize —
//! the user may retry the form.

use journeytrace_model::flow::{StepError, StepErrorKind, StepResult};

use crate::error::InterpretError;
use crate::interpret::{ClipInterpreter, InterpretContext, InterpretResult};
use crate::interpreters::{handler_names, record_keys};

pub struct SelfAssertedInterpreter;

impl ClipInterpreter for SelfAssertedInterpreter {
    fn handler_names(&self) -> &'static [&'static str] {
        &[
            handler_names::SELF_ASSERTED_REDIRECT,
            handler_names::SELF_ASSERTED_VALIDATION,
            handler_names::SELF_ASSERTED_ACTION,
        ]
    }

    fn interpret(&mut self, ctx: &InterpretContext<'_>) -> Result<InterpretResult, InterpretError> {
        let mut result = InterpretResult::updates_from(ctx.result);
        result.action_handler = Some(ctx.handler.to_string());

        match ctx.handler {
            handler_names::SELF_ASSERTED_REDIRECT => {
                result.interactive = true;
            }
            handler_names::SELF_ASSERTED_VALIDATION => {
                if let Some(failure) = validation_failure(ctx) {
                    result.success = false;
                    result.step_errors.push(failure);
                }
            }
            handler_names::SELF_ASSERTED_ACTION => {
                result.step_result = Some(StepResult::Success);
                result.finalize_step = true;
            }
            _ => {}
        }
        Ok(result)
    }
}

/// A validation failure from either the handler-level exception or the
/// recorder record's exception entry.
fn validation_failure(ctx: &InterpretContext<'_>) -> Option<StepError> {
    if let Some(exception) = &ctx.result.exception {
        return Some(StepError {
            kind: StepErrorKind::Handled,
            hresult: exception.hresult.clone(),
            message: exception.message.clone(),
        });
    }
    let record = ctx.record();
    let exception = record.get(record_keys::EXCEPTION)?;
    Some(StepError {
        kind: StepErrorKind::Handled,
        hresult: exception
            .text_of(record_keys::EXCEPTION_HRESULT)
            .map(str::to_string),
        message: exception
            .text_of(record_keys::EXCEPTION_MESSAGE)
            .unwrap_or_default()
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journey::JourneyStack;
    use crate::statebag::Statebag;
    use chrono::{TimeZone, Utc};
    use journeytrace_model::clip::HandlerResultContent;
    use serde_json::json;

    fn interpret(handler: &str, content: &HandlerResultContent) -> InterpretResult {
        let journey = JourneyStack::new("main", "main");
        let statebag = Statebag::new();
        SelfAssertedInterpreter
            .interpret(&InterpretContext {
                handler,
                result: content,
                timestamp: Utc.timestamp_millis_opt(0).single().expect("timestamp"),
                log_id: "log-1",
                event_type: "Event:API",
                predicate_outcome: None,
                transition: None,
                journey: &journey,
                statebag: &statebag,
                has_active_step: true,
            })
            .expect("interpret")
    }

    #[test]
    fn validation_failure_is_a_handled_error_without_finalize() {
        let content: HandlerResultContent = serde_json::from_value(json!({
            "result": false,
            "exception": {
                "kind": "ValidationException",
                "hResult": "0x80131500",
                "message": "A user with the specified credential could not be found.",
            }
        }))
        .expect("content");

        let result = interpret(handler_names::SELF_ASSERTED_VALIDATION, &content);
        assert!(!result.success);
        assert!(!result.finalize_step);
        assert_eq!(result.step_errors.len(), 1);
        let error = &result.step_errors[0];
        assert_eq!(error.kind, StepErrorKind::Handled);
        assert_eq!(
            error.message,
            "A user with the specified credential could not be found."
        );
        assert_eq!(error.hresult.as_deref(), Some("0x80131500"));
    }

    #[test]
    fn successful_validation_adds_no_errors() {
        let content = HandlerResultContent::default();
        let result = interpret(handler_names::SELF_ASSERTED_VALIDATION, &content);
        assert!(result.success);
        assert!(result.step_errors.is_empty());
    }

    #[test]
    fn redirect_shows_the_form_and_action_finalizes() {
        let content = HandlerResultContent::default();

        let redirect = interpret(handler_names::SELF_ASSERTED_REDIRECT, &content);
        assert!(redirect.interactive);
        assert!(!redirect.finalize_step);

        let action = interpret(handler_names::SELF_ASSERTED_ACTION, &content);
        assert!(action.finalize_step);
        assert_eq!(action.step_result, Some(StepResult::Success));
    }
}
