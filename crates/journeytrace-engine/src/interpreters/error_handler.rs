//! Error handler interpreter: handled engine errors and validation
//! failures surfaced through the error-handling state machine path.
//!
//! When no step is accumulating yet (an early failure before orchestration
//! began), the error demands a standalone step so it appears in the tree.

use journeytrace_model::flow::{StepError, StepErrorKind, StepResult};

use crate::error::InterpretError;
use crate::interpret::{ClipInterpreter, InterpretContext, InterpretResult};
use crate::interpreters::{handler_names, record_keys};

pub struct ErrorHandlerInterpreter;

impl ClipInterpreter for ErrorHandlerInterpreter {
    fn handler_names(&self) -> &'static [&'static str] {
        &[handler_names::HANDLE_ERROR]
    }

    fn interpret(&mut self, ctx: &InterpretContext<'_>) -> Result<InterpretResult, InterpretError> {
        let mut result = InterpretResult::updates_from(ctx.result);
        result.action_handler = Some(ctx.handler.to_string());
        result.success = false;
        result.step_result = Some(StepResult::Error);

        let (message, hresult) = match &ctx.result.exception {
            Some(exception) => (exception.message.clone(), exception.hresult.clone()),
            None => {
                let record = ctx.record();
                match record.get(record_keys::EXCEPTION) {
                    Some(exception) => (
                        exception
                            .text_of(record_keys::EXCEPTION_MESSAGE)
                            .unwrap_or_default()
                            .to_string(),
                        exception
                            .text_of(record_keys::EXCEPTION_HRESULT)
                            .map(str::to_string),
                    ),
                    None => ("unspecified engine error".to_string(), None),
                }
            }
        };

        result.error = Some(message);
        result.error_hresult = hresult.clone();
        if let Some(error) = &result.error {
            result.step_errors.push(StepError {
                kind: StepErrorKind::Handled,
                hresult,
                message: error.clone(),
            });
        }

        if !ctx.has_active_step {
            // Early failure before any orchestration step opened.
            result.create_step = true;
        }
        Ok(result)
    }
}
