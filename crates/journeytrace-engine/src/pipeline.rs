//! Clip pipeline: drives one log's clips, in order, through the
//! interpreter registry and into the step lifecycle.
//!
//! Announcement clips (Action, Predicate) name the handler whose
//! HandlerResult follows; the pipeline pairs them up. Headers clips carry
//! session semantics, Transition clips are hints, Exception clips are
//! terminal for their log.

use journeytrace_model::clip::{Clip, TransitionContent};
use journeytrace_model::flow::{StepError, StepErrorKind};
use journeytrace_model::keys::EVENT_AUTH;
use journeytrace_model::log::TraceLogInput;
use journeytrace_model::result::SessionInfo;

use crate::config::ParserConfig;
use crate::interpret::{InterpretContext, InterpretResult};
use crate::lifecycle::{ClipMeta, LifecycleParts, StepLifecycle};
use crate::registry::InterpreterRegistry;

pub struct ClipPipeline {
    lifecycle: StepLifecycle,
    sessions: Vec<SessionInfo>,
    auth_headers_seen: u32,
    sequence: u64,
}

/// Per-log pairing state. Announcements do not cross log boundaries.
#[derive(Default)]
struct LogContext {
    event_type: String,
    last_action: Option<String>,
    last_predicate: Option<String>,
    predicate_outcome: Option<String>,
    transition: Option<TransitionContent>,
}

impl ClipPipeline {
    pub fn new(config: ParserConfig, main_journey_id: &str) -> ClipPipeline {
        ClipPipeline {
            lifecycle: StepLifecycle::new(config, main_journey_id),
            sessions: Vec::new(),
            auth_headers_seen: 0,
            sequence: 0,
        }
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.lifecycle.record_error(message);
    }

    /// Process one log's clips in their recorded order.
    pub fn process_log(&mut self, registry: &mut InterpreterRegistry, log: &TraceLogInput) {
        let mut ctx = LogContext::default();
        for clip in &log.clips {
            let sequence = self.sequence;
            self.sequence += 1;
            let meta = ClipMeta {
                timestamp: log.timestamp,
                sequence,
                log_id: log.id.clone(),
                event_type: ctx.event_type.clone(),
            };
            match clip {
                Clip::Headers(headers) => {
                    ctx.event_type = headers.event_instance.clone();
                    if headers.event_instance == EVENT_AUTH {
                        self.auth_headers_seen += 1;
                        if self.auth_headers_seen > 1 {
                            // A fresh authentication start mid-stream is a
                            // new session.
                            self.lifecycle.session_reset();
                        }
                        self.sessions.push(SessionInfo {
                            index: self.sessions.len() as u32,
                            started_at: log.timestamp,
                            log_id: log.id.clone(),
                            correlation_id: headers.correlation_id.clone(),
                        });
                    }
                }
                Clip::Transition(transition) => {
                    ctx.transition = Some(transition.clone());
                }
                Clip::Predicate(name) => {
                    ctx.last_predicate = Some(name.clone());
                    ctx.last_action = None;
                    ctx.predicate_outcome = None;
                }
                Clip::Action(name) => {
                    ctx.last_action = Some(name.clone());
                    ctx.last_predicate = None;
                }
                Clip::HandlerResult(content) => {
                    // The announcement slot is read, not consumed: only the
                    // opposite announcement kind clears it, so several
                    // handler results may pair with one announcement.
                    let was_predicate = ctx.last_action.is_none();
                    let Some(handler) = ctx
                        .last_action
                        .clone()
                        .or_else(|| ctx.last_predicate.clone())
                    else {
                        self.lifecycle.record_error(format!(
                            "log {}: handler result with no preceding announcement",
                            log.id
                        ));
                        continue;
                    };

                    let Some(interpreter) = registry.interpreter_for(&handler) else {
                        // Strict mode: unknown handlers are skipped whole.
                        continue;
                    };
                    let interpreted = interpreter.interpret(&InterpretContext {
                        handler: &handler,
                        result: content,
                        timestamp: meta.timestamp,
                        log_id: &meta.log_id,
                        event_type: &meta.event_type,
                        predicate_outcome: ctx.predicate_outcome.as_deref(),
                        transition: ctx.transition.as_ref(),
                        journey: self.lifecycle.journey(),
                        statebag: self.lifecycle.statebag(),
                        has_active_step: self.lifecycle.has_active_step(),
                    });
                    let result = match interpreted {
                        Ok(result) => result,
                        Err(err) => {
                            // Interpretation failures degrade to the generic
                            // state extraction so the statebag stays coherent.
                            self.lifecycle
                                .record_error(format!("log {}: {err}", log.id));
                            InterpretResult::updates_from(content)
                        }
                    };
                    if was_predicate {
                        ctx.predicate_outcome = content.predicate_result.clone();
                    }
                    self.lifecycle.apply(result, &meta);
                }
                Clip::Exception(exception) => {
                    self.lifecycle.record_error(format!(
                        "log {}: engine exception: {}",
                        log.id, exception.message
                    ));
                    if self.lifecycle.has_active_step() {
                        self.lifecycle.mark_active_errored(StepError {
                            kind: StepErrorKind::Fatal,
                            hresult: exception.hresult.clone(),
                            message: exception.message.clone(),
                        });
                        self.lifecycle.finalize_active();
                    }
                    // The exception always gets its own node on the tree,
                    // in addition to erroring whatever step it interrupted.
                    self.lifecycle.push_fatal_error_step(exception, &meta);
                }
            }
        }
    }

    pub fn finish(self) -> (LifecycleParts, Vec<SessionInfo>) {
        (self.lifecycle.into_parts(), self.sessions)
    }
}
