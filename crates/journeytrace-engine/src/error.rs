//! Error types for the trace reconstruction engine.
//!
//! Every error here is recovered inside `parse` and surfaced as a string in
//! `TraceParseResult::errors`; the parse function itself is total.

/// Errors raised by journey stack operations.
#[derive(Debug, thiserror::Error)]
pub enum JourneyStackError {
    /// More pops were requested than the stack's depth. This indicates an
    /// incorrect pop-count computation upstream and is reported instead of
    /// silently clamped.
    #[error("journey stack pop past root (journey {journey_id}, depth 1)")]
    PopPastRoot { journey_id: String },
}

/// Errors raised while assembling the interpreter registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Two interpreters declared the same handler name. Registration order
    /// must not silently decide which one wins.
    #[error("handler {handler} registered twice")]
    DuplicateHandler { handler: String },
}

/// Errors raised by an interpreter while reading a handler-result clip.
#[derive(Debug, thiserror::Error)]
pub enum InterpretError {
    #[error("{handler}: missing {field} in recorder record")]
    MissingField {
        handler: &'static str,
        field: &'static str,
    },

    #[error("{handler}: malformed recorder record: {detail}")]
    MalformedRecord {
        handler: &'static str,
        detail: String,
    },
}
