//! Home realm discovery interpreter.
//!
//! Extracts only the *available* provider options. The eventual choice is
//! resolved later by the claims exchange interpreter reading a different
//! statebag key; attaching a technical profile here would leak options into
//! subsequent unrelated steps.

use journeytrace_model::flow::{FlowNode, NodePayload};

use crate::error::InterpretError;
use crate::interpret::{ClipInterpreter, InterpretContext, InterpretResult};
use crate::interpreters::{handler_names, record_keys};

pub struct HomeRealmDiscoveryInterpreter;

impl ClipInterpreter for HomeRealmDiscoveryInterpreter {
    fn handler_names(&self) -> &'static [&'static str] {
        &[handler_names::HOME_REALM_DISCOVERY]
    }

    fn interpret(&mut self, ctx: &InterpretContext<'_>) -> Result<InterpretResult, InterpretError> {
        let mut result = InterpretResult::updates_from(ctx.result);
        result.action_handler = Some(ctx.handler.to_string());
        result.interactive = true;

        let record = ctx.record();
        let Some(discovery) = record.get(record_keys::HOME_REALM_DISCOVERY) else {
            return Ok(result);
        };

        let options: Vec<String> = discovery
            .entries()
            .iter()
            .filter(|(key, _)| key == record_keys::OPTION)
            .filter_map(|(_, value)| value.as_text().map(str::to_string))
            .chain(
                discovery
                    .items()
                    .iter()
                    .filter_map(|value| value.as_text().map(str::to_string)),
            )
            .collect();

        if !options.is_empty() {
            result.flow_children.push(FlowNode::new(
                ctx.journey_id(),
                "HomeRealmDiscovery",
                ctx.current_step(),
                0,
                NodePayload::HomeRealmDiscovery { options },
            ));
        }
        Ok(result)
    }
}
