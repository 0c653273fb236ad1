//! UI settings interpreter: marks the active step interactive and captures
//! the rendered content definition.

use crate::error::InterpretError;
use crate::interpret::{ClipInterpreter, InterpretContext, InterpretResult};
use crate::interpreters::{handler_names, record_keys};

pub struct UiSettingsInterpreter;

impl ClipInterpreter for UiSettingsInterpreter {
    fn handler_names(&self) -> &'static [&'static str] {
        &[handler_names::SEND_UI_SETTINGS]
    }

    fn interpret(&mut self, ctx: &InterpretContext<'_>) -> Result<InterpretResult, InterpretError> {
        let mut result = InterpretResult::updates_from(ctx.result);
        result.interactive = true;

        let content_definition = ctx
            .record()
            .get(record_keys::UI_SETTINGS)
            .and_then(|settings| settings.text_of(record_keys::CONTENT_DEFINITION_ID))
            .map(str::to_string);
        result.action_handler = content_definition.or(Some(ctx.handler.to_string()));
        Ok(result)
    }
}
