//! Interpreter registry.
//!
//! An explicit value owned by the parser and threaded into the pipeline —
//! not a process-wide singleton. One registry serves one parse at a time;
//! `reset_all` runs at the top of every parse to clear interpreter-retained
//! state.

use std::collections::BTreeMap;

use crate::config::ParserConfig;
use crate::error::RegistryError;
use crate::interpret::ClipInterpreter;
use crate::interpreters;
use crate::interpreters::default::DefaultInterpreter;

pub struct InterpreterRegistry {
    interpreters: Vec<Box<dyn ClipInterpreter>>,
    by_name: BTreeMap<&'static str, usize>,
    fallback: Option<DefaultInterpreter>,
}

impl InterpreterRegistry {
    pub fn new(fallback_enabled: bool) -> InterpreterRegistry {
        InterpreterRegistry {
            interpreters: Vec::new(),
            by_name: BTreeMap::new(),
            fallback: fallback_enabled.then(DefaultInterpreter::new),
        }
    }

    /// Registry populated with every known interpreter family.
    pub fn with_defaults(config: &ParserConfig) -> InterpreterRegistry {
        let mut registry = InterpreterRegistry::new(config.fallback_interpreter);
        for interpreter in interpreters::all(config) {
            registry
                .register(interpreter)
                .expect("default interpreter set has no duplicate handler names");
        }
        registry
    }

    /// Index an interpreter by each of its declared handler names. A name
    /// already owned by another interpreter is a configuration error.
    pub fn register(&mut self, interpreter: Box<dyn ClipInterpreter>) -> Result<(), RegistryError> {
        for name in interpreter.handler_names() {
            if self.by_name.contains_key(name) {
                return Err(RegistryError::DuplicateHandler {
                    handler: (*name).to_string(),
                });
            }
        }
        let index = self.interpreters.len();
        for name in interpreter.handler_names() {
            self.by_name.insert(name, index);
        }
        self.interpreters.push(interpreter);
        Ok(())
    }

    /// The interpreter for a handler name, or the pass-through fallback
    /// when one is enabled.
    pub fn interpreter_for(&mut self, name: &str) -> Option<&mut dyn ClipInterpreter> {
        if let Some(index) = self.by_name.get(name) {
            return Some(self.interpreters[*index].as_mut());
        }
        self.fallback
            .as_mut()
            .map(|fallback| fallback as &mut dyn ClipInterpreter)
    }

    /// Clear retained state on every interpreter. Called at the start of
    /// each parse run.
    pub fn reset_all(&mut self) {
        for interpreter in &mut self.interpreters {
            interpreter.reset();
        }
        if let Some(fallback) = &mut self.fallback {
            fallback.reset();
        }
    }
}
