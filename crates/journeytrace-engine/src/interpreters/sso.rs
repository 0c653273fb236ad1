//! SSO session interpreter: statebag/claims extraction plus the session
//! provider annotation. Never affects step-advance logic.

use crate::error::InterpretError;
use crate::interpret::{ClipInterpreter, InterpretContext, InterpretResult, short_handler_name};
use crate::interpreters::{handler_names, record_keys};

pub struct SsoSessionInterpreter;

impl ClipInterpreter for SsoSessionInterpreter {
    fn handler_names(&self) -> &'static [&'static str] {
        &[handler_names::SSO_SESSION]
    }

    fn interpret(&mut self, ctx: &InterpretContext<'_>) -> Result<InterpretResult, InterpretError> {
        let mut result = InterpretResult::updates_from(ctx.result);

        let record = ctx.record();
        let annotation = record.get(record_keys::SSO_SESSION).map(|session| {
            let provider = session.text_of(record_keys::PROVIDER).unwrap_or("SSO");
            let action = session.text_of(record_keys::ACTION).unwrap_or("Read");
            format!("{provider}:{action}")
        });
        result.action_handler =
            Some(annotation.unwrap_or_else(|| short_handler_name(ctx.handler).to_string()));
        Ok(result)
    }
}
