//! Default pass-through interpreter.
//!
//! Serves handler names with no registered interpreter when fallback is
//! enabled: extracts statebag and claims updates generically and produces
//! no tree children.

use crate::error::InterpretError;
use crate::interpret::{ClipInterpreter, InterpretContext, InterpretResult};

pub struct DefaultInterpreter;

impl DefaultInterpreter {
    pub fn new() -> DefaultInterpreter {
        DefaultInterpreter
    }
}

impl Default for DefaultInterpreter {
    fn default() -> Self {
        DefaultInterpreter::new()
    }
}

impl ClipInterpreter for DefaultInterpreter {
    fn handler_names(&self) -> &'static [&'static str] {
        &[]
    }

    fn can_handle(&self, _name: &str) -> bool {
        true
    }

    fn interpret(&mut self, ctx: &InterpretContext<'_>) -> Result<InterpretResult, InterpretError> {
        Ok(InterpretResult::updates_from(ctx.result))
    }
}
