//! # Journeytrace Engine
//!
//! Reconstructs the execution trace of an identity orchestration journey
//! from its diagnostic logs: which orchestration steps ran, in what order,
//! which sub-journeys and technical profiles they invoked, and what state
//! each carried.
//!
//! ## Architecture
//!
//! ```text
//! TraceParser            ← Façade: logs in, TraceParseResult out
//!     │
//! ClipPipeline           ← Per-log clip traversal, announcement pairing
//!     │
//! InterpreterRegistry    ← Handler name → ClipInterpreter dispatch
//!     │
//! ClipInterpreter        ← One per handler family; pure extraction
//!     │
//! StepLifecycle          ← Step open/merge/finalize, journey stack, pops
//!     │
//! FlowTreeBuilder        ← Nested output tree + execution aggregates
//! ```
//!
//! Interpretation is stateless extraction (the orchestration interpreter's
//! retry timestamps excepted); all mutation flows through the lifecycle.

pub mod config;
pub mod error;
pub mod interpret;
pub mod interpreters;
pub mod journey;
pub mod lifecycle;
pub mod parser;
pub mod pipeline;
pub mod pop_rules;
pub mod registry;
pub mod statebag;
pub mod tree;

pub use config::ParserConfig;
pub use error::{InterpretError, JourneyStackError, RegistryError};
pub use interpret::{ClipInterpreter, InterpretContext, InterpretResult, SubJourneyPush};
pub use journey::{JourneyContext, JourneyStack};
pub use lifecycle::{ClipMeta, StepLifecycle};
pub use parser::TraceParser;
pub use pipeline::ClipPipeline;
pub use pop_rules::resolve_pops;
pub use registry::InterpreterRegistry;
pub use statebag::Statebag;
pub use tree::FlowTreeBuilder;
