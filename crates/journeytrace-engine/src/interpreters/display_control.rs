//! Display control interpreter.
//!
//! A display control (CAPTCHA, OTP widget) runs its own sub-actions, each
//! backed by a technical profile. One tree node per distinct control id,
//! with the invoked profiles as children in input order.

use journeytrace_model::flow::{FlowNode, NodePayload};

use crate::error::InterpretError;
use crate::interpret::{ClipInterpreter, InterpretContext, InterpretResult};
use crate::interpreters::{handler_names, record_keys, technical_profile_node};

pub struct DisplayControlInterpreter;

impl ClipInterpreter for DisplayControlInterpreter {
    fn handler_names(&self) -> &'static [&'static str] {
        &[handler_names::SEND_DISPLAY_CONTROL_ACTION]
    }

    fn interpret(&mut self, ctx: &InterpretContext<'_>) -> Result<InterpretResult, InterpretError> {
        let mut result = InterpretResult::updates_from(ctx.result);
        result.action_handler = Some(ctx.handler.to_string());
        result.interactive = true;

        let record = ctx.record();
        let mut controls: Vec<FlowNode> = Vec::new();
        for (key, action) in record.entries() {
            if key != record_keys::DISPLAY_CONTROL_ACTION {
                continue;
            }
            let control_id = action
                .text_of(record_keys::DISPLAY_CONTROL_ID)
                .unwrap_or("DisplayControl");
            let action_name = action.text_of(record_keys::ACTION).map(str::to_string);

            let control = match controls.iter_mut().find(|c| c.name == control_id) {
                Some(existing) => existing,
                None => {
                    controls.push(FlowNode::new(
                        ctx.journey_id(),
                        control_id,
                        ctx.current_step(),
                        0,
                        NodePayload::DisplayControl {
                            control_id: control_id.to_string(),
                            action: action_name.clone(),
                        },
                    ));
                    controls.last_mut().expect("just pushed")
                }
            };
            if let Some(profile_id) = action.text_of(record_keys::TECHNICAL_PROFILE_ID) {
                control
                    .children
                    .push(technical_profile_node(ctx, profile_id, None, None));
            }
        }

        result.flow_children.extend(controls);
        Ok(result)
    }
}
