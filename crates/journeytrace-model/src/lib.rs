//! # JourneyTrace Model
//!
//! Typed data model for journey trace reconstruction:
//!
//! - [`Clip`]: one atomic diagnostic log fragment emitted by the
//!   identity-orchestration engine (headers, transitions, predicates,
//!   actions, handler results, exceptions).
//! - [`RecordValue`]: the loosely-typed nested key/value tree carried inside
//!   handler-result clips, with named extractor helpers.
//! - [`FlowNode`]: the reconstructed execution tree (root → sub-journeys →
//!   steps → technical profiles / transformations / UI interactions).
//! - [`TraceParseResult`]: the full parser output (tree, flat step list,
//!   execution map, final state snapshots, sessions, errors).
//!
//! This crate is pure data: no parsing logic, no I/O. The engine crate owns
//! all interpretation.

pub mod clip;
pub mod flow;
pub mod keys;
pub mod log;
pub mod record;
pub mod result;

pub use clip::{
    Clip, ClipKind, ExceptionContent, HandlerResultContent, HeadersContent, TransitionContent,
};
pub use flow::{
    ExecutionStatus, FlowNode, FlowNodeKind, NodeContext, NodePayload, StepError, StepErrorKind,
    StepResult, node_digest,
};
pub use log::TraceLogInput;
pub use record::RecordValue;
pub use result::{NodeExecution, SessionInfo, StepSummary, TraceParseResult};
