//! Journey completion: the final token issuance.

use journeytrace_model::flow::{FlowNode, NodePayload, StepResult};

use crate::error::InterpretError;
use crate::interpret::{ClipInterpreter, InterpretContext, InterpretResult};
use crate::interpreters::handler_names;

pub struct JourneyCompletionInterpreter;

impl ClipInterpreter for JourneyCompletionInterpreter {
    fn handler_names(&self) -> &'static [&'static str] {
        &[handler_names::SEND_CLAIMS]
    }

    fn interpret(&mut self, ctx: &InterpretContext<'_>) -> Result<InterpretResult, InterpretError> {
        let mut result = InterpretResult::updates_from(ctx.result);
        result.action_handler = Some(ctx.handler.to_string());

        // The token carries every claim accumulated so far plus this
        // result's own claim updates.
        let mut token_claims = ctx.statebag.claims_snapshot();
        for (key, value) in &result.claims_updates {
            token_claims.insert(key.clone(), value.clone());
        }

        result.flow_children.push(FlowNode::new(
            ctx.journey_id(),
            "SendClaims",
            ctx.current_step(),
            0,
            NodePayload::SendClaims { token_claims },
        ));
        result.step_result = Some(StepResult::Success);
        result.finalize_step = true;
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
    use std::collections::BTreeMap;

    #[test]
    fn completion_issues_the_accumulated_claims() {
        let content: HandlerResultContent = serde_json::from_value(json!({
            "statebag": {"Complex-CLMS": {"displayName": "Jo User"}}
        }))
        .expect("content");
        let journey = JourneyStack::new("main", "main");
        let mut statebag = Statebag::new();
        statebag.apply_claims_updates(
            &[("email".to_string(), "user@contoso.com".to_string())]
                .into_iter()
                .collect::<BTreeMap<_, _>>(),
        );

        let result = JourneyCompletionInterpreter
            .interpret(&InterpretContext {
                handler: handler_names::SEND_CLAIMS,
                result: &content,
                timestamp: Utc.timestamp_millis_opt(0).single().expect("timestamp"),
                log_id: "log-1",
                event_type: "Event:API",
                predicate_outcome: None,
                transition: None,
                journey: &journey,
                statebag: &statebag,
                has_active_step: true,
            })
            .expect("interpret");

        assert!(result.finalize_step);
        assert_eq!(result.step_result, Some(StepResult::Success));
        let node = &result.flow_children[0];
        assert_eq!(node.kind, FlowNodeKind::SendClaims);
        match &node.payload {
            NodePayload::SendClaims { token_claims } => {
                assert_eq!(
                    token_claims.get("email").map(String::as_str),
                    Some("user@contoso.com")
                );
                assert_eq!(
                    token_claims.get("displayName").map(String::as_str),
                    Some("Jo User")
                );
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }
}
