//! Claims exchange interpreter.
//!
//! Covers the five claims-exchange handler phases: initiating, redirect to
//! an external provider, submit on return, provider selection, and the
//! generic backend protocol action. The invoked technical-profile id is
//! resolved from three fallback locations in priority order: the initiating
//! record, the nested backend record, then the triggered-profile statebag
//! key.

use journeytrace_model::flow::{FlowNode, NodePayload, StepResult};
use journeytrace_model::keys::TRIGGERED_PROFILE_KEY;

use crate::error::InterpretError;
use crate::interpret::{ClipInterpreter, InterpretContext, InterpretResult};
use crate::interpreters::{handler_names, record_keys, technical_profile_node};

pub struct ClaimsExchangeInterpreter;

impl ClaimsExchangeInterpreter {
    /// Technical-profile id with its provider/protocol metadata, when the
    /// result names one.
    fn resolve_profile(ctx: &InterpretContext<'_>) -> Option<FlowNode> {
        let record = ctx.record();

        if let Some(initiating) = record.get(record_keys::INITIATING_CLAIMS_EXCHANGE) {
            if let Some(profile_id) = initiating.text_of(record_keys::TECHNICAL_PROFILE_ID) {
                return Some(technical_profile_node(
                    ctx,
                    profile_id,
                    initiating
                        .text_of(record_keys::PROTOCOL_PROVIDER_TYPE)
                        .map(str::to_string),
                    initiating
                        .text_of(record_keys::PROTOCOL_TYPE)
                        .map(str::to_string),
                ));
            }
        }

        if let Some(backend) = record.find_first(record_keys::BACKEND_CLAIMS_EXCHANGE) {
            if let Some(profile_id) = backend.text_of(record_keys::TECHNICAL_PROFILE_ID) {
                return Some(technical_profile_node(
                    ctx,
                    profile_id,
                    backend.text_of(record_keys::PROVIDER).map(str::to_string),
                    backend
                        .text_of(record_keys::PROTOCOL_TYPE)
                        .map(str::to_string),
                ));
            }
        }

        let triggered = ctx.statebag.get(TRIGGERED_PROFILE_KEY)?;
        Some(technical_profile_node(ctx, triggered, None, None))
    }

    /// Providers offered by a selection result, as provider-selection
    /// children.
    fn selection_children(ctx: &InterpretContext<'_>) -> Vec<FlowNode> {
        let record = ctx.record();
        let Some(selected) = record.get(record_keys::SELECTED_CLAIMS_EXCHANGE) else {
            return Vec::new();
        };
        let options: Vec<String> = match selected.as_text() {
            Some(single) => vec![single.to_string()],
            None => selected
                .entries()
                .iter()
                .filter(|(key, _)| key == record_keys::OPTION)
                .filter_map(|(_, value)| value.as_text().map(str::to_string))
                .collect(),
        };
        if options.is_empty() {
            return Vec::new();
        }
        vec![FlowNode::new(
            ctx.journey_id(),
            "ProviderSelection",
            ctx.current_step(),
            0,
            NodePayload::HomeRealmDiscovery { options },
        )]
    }
}

impl ClipInterpreter for ClaimsExchangeInterpreter {
    fn handler_names(&self) -> &'static [&'static str] {
        &[
            handler_names::INITIATING_CLAIMS_EXCHANGE,
            handler_names::CLAIMS_EXCHANGE_REDIRECT,
            handler_names::CLAIMS_EXCHANGE_SUBMIT,
            handler_names::CLAIMS_EXCHANGE_SELECT,
            handler_names::CLAIMS_EXCHANGE_PROTOCOL,
        ]
    }

    fn interpret(&mut self, ctx: &InterpretContext<'_>) -> Result<InterpretResult, InterpretError> {
        let mut result = InterpretResult::updates_from(ctx.result);
        result.action_handler = Some(ctx.handler.to_string());

        match ctx.handler {
            handler_names::CLAIMS_EXCHANGE_REDIRECT => {
                // Redirect to an external provider: the step is interactive
                // and stays open until the user returns.
                result.interactive = true;
                result.step_result = Some(StepResult::Redirect);
                if let Some(profile) = Self::resolve_profile(ctx) {
                    result.discard_pending_options = true;
                    result.flow_children.push(profile);
                }
            }
            handler_names::CLAIMS_EXCHANGE_SUBMIT => {
                // Return from the external provider closes the interaction.
                result.step_result = Some(StepResult::Success);
                result.finalize_step = true;
            }
            handler_names::CLAIMS_EXCHANGE_SELECT => {
                result.flow_children.extend(Self::selection_children(ctx));
            }
            handler_names::INITIATING_CLAIMS_EXCHANGE | handler_names::CLAIMS_EXCHANGE_PROTOCOL => {
                let profile =
                    Self::resolve_profile(ctx).ok_or(InterpretError::MissingField {
                        handler: "ClaimsExchange",
                        field: record_keys::TECHNICAL_PROFILE_ID,
                    })?;
                // The concrete exchange supersedes any buffered provider
                // options for this step.
                result.discard_pending_options = true;
                result.flow_children.push(profile);
            }
            _ => {}
        }

        Ok(result)
    }
}
