//! Claims transformation interpreter: one tree child per invoked
//! transformation.

use journeytrace_model::flow::{FlowNode, NodePayload};

use crate::error::InterpretError;
use crate::interpret::{ClipInterpreter, InterpretContext, InterpretResult};
use crate::interpreters::{handler_names, record_keys};

pub struct ClaimsTransformationInterpreter;

impl ClipInterpreter for ClaimsTransformationInterpreter {
    fn handler_names(&self) -> &'static [&'static str] {
        &[handler_names::CLAIMS_TRANSFORMATION]
    }

    fn interpret(&mut self, ctx: &InterpretContext<'_>) -> Result<InterpretResult, InterpretError> {
        let mut result = InterpretResult::updates_from(ctx.result);
        result.action_handler = Some(ctx.handler.to_string());

        // The record carries either repeated ClaimsTransformation entries
        // or one entry holding a list.
        let record = ctx.record();
        let mut ids: Vec<String> = Vec::new();
        for (key, value) in record.entries() {
            if key != record_keys::CLAIMS_TRANSFORMATION {
                continue;
            }
            if let Some(id) = value.as_text() {
                ids.push(id.to_string());
            } else if let Some(id) = value.text_of(record_keys::TRANSFORMATION_ID) {
                ids.push(id.to_string());
            } else {
                for item in value.items() {
                    if let Some(id) = item
                        .as_text()
                        .or_else(|| item.text_of(record_keys::TRANSFORMATION_ID))
                    {
                        ids.push(id.to_string());
                    }
                }
            }
        }

        for id in ids {
            result.flow_children.push(FlowNode::new(
                ctx.journey_id(),
                &id,
                ctx.current_step(),
                0,
                NodePayload::ClaimsTransformation {
                    transformation_id: id.clone(),
                },
            ));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journey::JourneyStack;
    use crate::statebag::Statebag;
    use chrono::{TimeZone, Utc};
    use journeytrace_model::clip::HandlerResultContent;
    use journeytrace_model::flow::FlowNodeKind;
    use serde_json::json;

    #[test]
    fn repeated_entries_become_ordered_children() {
        let content: HandlerResultContent = serde_json::from_value(json!({
            "recorderRecord": {"Values": [
                {"Key": "ClaimsTransformation", "Value": {"Values": [
                    {"Key": "Id", "Value": "CreateDisplayName"},
                ]}},
                {"Key": "ClaimsTransformation", "Value": "CopyEmail"},
            ]}
        }))
        .expect("content");
        let journey = JourneyStack::new("main", "main");
        let statebag = Statebag::new();

        let result = ClaimsTransformationInterpreter
            .interpret(&InterpretContext {
                handler: handler_names::CLAIMS_TRANSFORMATION,
                result: &content,
                timestamp: Utc.timestamp_millis_opt(0).single().expect("timestamp"),
                log_id: "log-1",
                event_type: "Event:AUTH",
                predicate_outcome: None,
                transition: None,
                journey: &journey,
                statebag: &statebag,
                has_active_step: true,
            })
            .expect("interpret");

        assert_eq!(result.flow_children.len(), 2);
        assert!(
            result
                .flow_children
                .iter()
                .all(|c| c.kind == FlowNodeKind::ClaimsTransformation)
        );
        assert_eq!(result.flow_children[0].name, "CreateDisplayName");
        assert_eq!(result.flow_children[1].name, "CopyEmail");
    }
}
