//! Backend REST API call interpreter.

use crate::error::InterpretError;
use crate::interpret::{ClipInterpreter, InterpretContext, InterpretResult};
use crate::interpreters::{handler_names, record_keys, technical_profile_node};

pub struct RestApiCallInterpreter;

impl ClipInterpreter for RestApiCallInterpreter {
    fn handler_names(&self) -> &'static [&'static str] {
        &[handler_names::REST_API_CALL]
    }

    fn interpret(&mut self, ctx: &InterpretContext<'_>) -> Result<InterpretResult, InterpretError> {
        let mut result = InterpretResult::updates_from(ctx.result);
        result.action_handler = Some(ctx.handler.to_string());

        let record = ctx.record();
        if let Some(call) = record.get(record_keys::REST_API_CALL) {
            if let Some(profile_id) = call.text_of(record_keys::TECHNICAL_PROFILE_ID) {
                result.flow_children.push(technical_profile_node(
                    ctx,
                    profile_id,
                    Some("RestfulProvider".to_string()),
                    call.text_of(record_keys::PROTOCOL_TYPE).map(str::to_string),
                ));
            }
        }
        Ok(result)
    }
}
