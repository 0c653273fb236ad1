//! Orchestration interpreter: the step-advance detector.
//!
//! Reads the orchestration counter out of the handler result's statebag and
//! decides between no-op, step advance, and the three inferred sub-journey
//! completion rules:
//!
//! 1. handler fired with no counter update while nested → the sub-journey
//!    ran out of steps: finalize and pop once;
//! 2. counter gap while nested → pop down to the ancestor the counter
//!    continues (see [`crate::pop_rules`]);
//! 3. counter decrease while nested → pop while the counter is behind the
//!    ancestor.
//!
//! A retry is detected when consecutive firings carry the same counter
//! value separated by more than the configured threshold; the second firing
//! then opens a fresh step instead of continuing the first.

use chrono::{DateTime, Utc};

use journeytrace_model::keys::ORCHESTRATION_STEP_KEY;

use crate::error::InterpretError;
use crate::interpret::{ClipInterpreter, InterpretContext, InterpretResult};
use crate::interpreters::handler_names;
use crate::pop_rules::resolve_pops;

pub struct OrchestrationInterpreter {
    retry_threshold_ms: i64,
    /// Counter value and timestamp of the previous firing.
    last_seen: Option<(i64, DateTime<Utc>)>,
}

impl OrchestrationInterpreter {
    pub fn new(retry_threshold_ms: i64) -> OrchestrationInterpreter {
        OrchestrationInterpreter {
            retry_threshold_ms,
            last_seen: None,
        }
    }

    fn is_retry(&self, counter: i64, now: DateTime<Utc>) -> bool {
        match self.last_seen {
            Some((last_counter, last_at)) => {
                last_counter == counter
                    && (now - last_at).num_milliseconds() > self.retry_threshold_ms
            }
            None => false,
        }
    }
}

impl ClipInterpreter for OrchestrationInterpreter {
    fn handler_names(&self) -> &'static [&'static str] {
        &[
            handler_names::EXECUTE_CURRENT_STEP,
            handler_names::MOVE_TO_NEXT_STEP,
        ]
    }

    fn interpret(&mut self, ctx: &InterpretContext<'_>) -> Result<InterpretResult, InterpretError> {
        let mut result = InterpretResult::updates_from(ctx.result);
        result.action_handler = Some(ctx.handler.to_string());

        let new_counter: Option<i64> = result
            .statebag_updates
            .get(ORCHESTRATION_STEP_KEY)
            .and_then(|value| value.parse().ok());

        let Some(new_counter) = new_counter else {
            // Rule 1: no counter update while nested means the sub-journey
            // completed.
            if ctx.journey.is_in_sub_journey() {
                result.finalize_step = true;
                result.pop_sub_journey = 1;
            }
            return Ok(result);
        };

        let retry = self.is_retry(new_counter, ctx.timestamp);
        self.last_seen = Some((new_counter, ctx.timestamp));

        if retry {
            // Same counter, long gap: the user retried the interaction.
            result.create_step = true;
            return Ok(result);
        }

        let diff = new_counter - ctx.current_step();
        if diff == 0 {
            // Same step. With a step still accumulating this is a no-op;
            // without one, an earlier fragment already finalized it and it
            // must re-open (the lifecycle merges or branches by timing).
            if !ctx.has_active_step {
                result.create_step = true;
            }
            return Ok(result);
        }

        result.create_step = true;
        result.pop_sub_journey = resolve_pops(ctx.journey.full_stack(), new_counter);
        Ok(result)
    }

    fn reset(&mut self) {
        self.last_seen = None;
    }
}
