//! Trace parser façade: logs in, [`TraceParseResult`] out.
//!
//! A parser owns its interpreter registry and resets it at the top of every
//! `parse`, so one instance serves one parse at a time; use separate
//! parsers for concurrent work.

use chrono::{DateTime, Utc};

use journeytrace_model::clip::Clip;
use journeytrace_model::keys::SUPPORTED_EVENT_INSTANCES;
use journeytrace_model::log::TraceLogInput;
use journeytrace_model::result::TraceParseResult;

use crate::config::ParserConfig;
use crate::pipeline::ClipPipeline;
use crate::registry::InterpreterRegistry;

pub struct TraceParser {
    config: ParserConfig,
    registry: InterpreterRegistry,
}

impl TraceParser {
    pub fn new(config: ParserConfig) -> TraceParser {
        let registry = InterpreterRegistry::with_defaults(&config);
        TraceParser { config, registry }
    }

    /// Parser with a caller-assembled registry (custom or reduced
    /// interpreter sets).
    pub fn with_registry(config: ParserConfig, registry: InterpreterRegistry) -> TraceParser {
        TraceParser { config, registry }
    }

    /// Reconstruct one correlation id's execution trace from its logs.
    ///
    /// Logs whose headers carry an unsupported event instance (admin
    /// operations, unrelated traffic) are filtered out first. The rest are
    /// ordered by timestamp with a stable tie-break on input position, then
    /// driven through the clip pipeline.
    pub fn parse(&mut self, logs: &[TraceLogInput]) -> TraceParseResult {
        self.registry.reset_all();

        let mut parsable: Vec<&TraceLogInput> =
            logs.iter().filter(|log| is_parsable(log)).collect();
        if parsable.is_empty() {
            let main_journey_id = logs
                .first()
                .map(|log| log.policy_id.clone())
                .unwrap_or_default();
            let pipeline = ClipPipeline::new(self.config.clone(), &main_journey_id);
            let (parts, sessions) = pipeline.finish();
            return TraceParseResult {
                flow_tree: parts.tree,
                steps: parts.steps,
                execution_map: parts.execution,
                main_journey_id,
                success: false,
                errors: vec!["no parsable logs in input".to_string()],
                final_statebag: parts.final_statebag,
                final_claims: parts.final_claims,
                sessions,
            };
        }
        parsable.sort_by_key(|log| log.timestamp);

        let main_journey_id = parsable[0].policy_id.clone();
        let mut pipeline = ClipPipeline::new(self.config.clone(), &main_journey_id);
        for log in &parsable {
            pipeline.process_log(&mut self.registry, log);
        }

        let (parts, sessions) = pipeline.finish();
        let mut steps = parts.steps;
        let boundaries: Vec<DateTime<Utc>> = sessions
            .iter()
            .skip(1)
            .map(|session| session.started_at)
            .collect();
        for index in 0..steps.len() {
            let Some(next) = steps.get(index + 1).map(|step| step.timestamp) else {
                continue;
            };
            let current = steps[index].timestamp;
            // The gap to the next step is meaningless across a session
            // boundary.
            let crosses_boundary = boundaries
                .iter()
                .any(|boundary| *boundary > current && *boundary <= next);
            if !crosses_boundary {
                steps[index].duration_ms = Some((next - current).num_milliseconds());
            }
        }

        let errors = parts.errors;
        TraceParseResult {
            flow_tree: parts.tree,
            steps,
            execution_map: parts.execution,
            main_journey_id,
            success: errors.is_empty(),
            errors,
            final_statebag: parts.final_statebag,
            final_claims: parts.final_claims,
            sessions,
        }
    }
}

/// A log is parsable when any of its Headers clips carries a supported
/// event instance.
fn is_parsable(log: &TraceLogInput) -> bool {
    log.clips.iter().any(|clip| match clip {
        Clip::Headers(headers) => {
            SUPPORTED_EVENT_INSTANCES.contains(&headers.event_instance.as_str())
        }
        _ => false,
    })
}
