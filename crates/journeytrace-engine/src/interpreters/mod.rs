//! Handler-family interpreters.
//!
//! One interpreter per logical handler family. Each one is pure extraction
//! from the handler result's recorder record into an [`InterpretResult`];
//! none mutates shared state, except the orchestration interpreter's
//! retained retry timestamp (cleared by `reset`).

pub mod api_call;
pub mod claims_exchange;
pub mod claims_transformation;
pub mod completion;
pub mod default;
pub mod display_control;
pub mod error_handler;
pub mod home_realm;
pub mod orchestration;
pub mod self_asserted;
pub mod sso;
pub mod sub_journey;
pub mod ui_settings;

use journeytrace_model::flow::{FlowNode, NodePayload};

use crate::config::ParserConfig;
use crate::interpret::{ClipInterpreter, InterpretContext};

/// Fully-qualified handler names emitted by the orchestration engine.
pub mod handler_names {
    pub const EXECUTE_CURRENT_STEP: &str =
        "Web.TPEngine.StateMachineHandlers.ExecuteCurrentStepHandler";
    pub const MOVE_TO_NEXT_STEP: &str =
        "Web.TPEngine.StateMachineHandlers.MoveToNextOrchestrationStepHandler";

    pub const INITIATING_CLAIMS_EXCHANGE: &str =
        "Web.TPEngine.StateMachineHandlers.InitiatingClaimsExchangeHandler";
    pub const CLAIMS_EXCHANGE_REDIRECT: &str =
        "Web.TPEngine.StateMachineHandlers.ClaimsExchangeRedirectHandler";
    pub const CLAIMS_EXCHANGE_SUBMIT: &str =
        "Web.TPEngine.StateMachineHandlers.ClaimsExchangeSubmitHandler";
    pub const CLAIMS_EXCHANGE_SELECT: &str =
        "Web.TPEngine.StateMachineHandlers.ClaimsExchangeSelectHandler";
    pub const CLAIMS_EXCHANGE_PROTOCOL: &str =
        "Web.TPEngine.StateMachineHandlers.ClaimsExchangeProtocolHandler";

    pub const HOME_REALM_DISCOVERY: &str =
        "Web.TPEngine.StateMachineHandlers.HomeRealmDiscoveryHandler";

    pub const SELF_ASSERTED_REDIRECT: &str =
        "Web.TPEngine.StateMachineHandlers.SelfAssertedRedirectHandler";
    pub const SELF_ASSERTED_VALIDATION: &str =
        "Web.TPEngine.StateMachineHandlers.SelfAssertedValidationHandler";
    pub const SELF_ASSERTED_ACTION: &str =
        "Web.TPEngine.StateMachineHandlers.SelfAssertedActionHandler";

    pub const ENQUEUE_NEW_JOURNEY: &str =
        "Web.TPEngine.StateMachineHandlers.EnqueueNewJourneyHandler";
    pub const EXIT_SUB_JOURNEY: &str = "Web.TPEngine.StateMachineHandlers.ExitSubJourneyHandler";

    pub const CLAIMS_TRANSFORMATION: &str =
        "Web.TPEngine.StateMachineHandlers.ClaimsTransformationHandler";

    pub const REST_API_CALL: &str = "Web.TPEngine.StateMachineHandlers.RestApiCallHandler";

    pub const SSO_SESSION: &str = "Web.TPEngine.SSO.SsoSessionHandler";

    pub const SEND_UI_SETTINGS: &str =
        "Web.TPEngine.StateMachineHandlers.SendUserInterfaceSettingsHandler";

    pub const SEND_DISPLAY_CONTROL_ACTION: &str =
        "Web.TPEngine.StateMachineHandlers.SendDisplayControlActionResponseHandler";

    pub const SEND_CLAIMS: &str = "Web.TPEngine.StateMachineHandlers.SendClaimsHandler";

    pub const HANDLE_ERROR: &str = "Web.TPEngine.StateMachineHandlers.HandleErrorHandler";
}

/// Recorder record keys the interpreters extract from.
pub mod record_keys {
    pub const INITIATING_CLAIMS_EXCHANGE: &str = "InitiatingClaimsExchange";
    pub const BACKEND_CLAIMS_EXCHANGE: &str = "BackendClaimsExchange";
    pub const TECHNICAL_PROFILE_ID: &str = "TechnicalProfileId";
    pub const PROTOCOL_PROVIDER_TYPE: &str = "ProtocolProviderType";
    pub const PROTOCOL_TYPE: &str = "ProtocolType";
    pub const SELECTED_CLAIMS_EXCHANGE: &str = "SelectedClaimsExchange";
    pub const HOME_REALM_DISCOVERY: &str = "HomeRealmDiscovery";
    pub const OPTION: &str = "Option";
    pub const SUB_JOURNEY_INVOCATION: &str = "SubJourneyInvocation";
    pub const ENQUEUED_JOURNEY: &str = "EnqueuedJourney";
    pub const SUB_JOURNEY_ID: &str = "SubJourneyId";
    pub const JOURNEY_FRIENDLY_NAME: &str = "FriendlyName";
    pub const CLAIMS_TRANSFORMATION: &str = "ClaimsTransformation";
    pub const TRANSFORMATION_ID: &str = "Id";
    pub const REST_API_CALL: &str = "RestApiCall";
    pub const SSO_SESSION: &str = "SsoSession";
    pub const PROVIDER: &str = "Provider";
    pub const ACTION: &str = "Action";
    pub const UI_SETTINGS: &str = "UserInterfaceSettings";
    pub const CONTENT_DEFINITION_ID: &str = "ContentDefinitionId";
    pub const DISPLAY_CONTROL_ACTION: &str = "DisplayControlAction";
    pub const DISPLAY_CONTROL_ID: &str = "DisplayControlId";
    pub const EXCEPTION: &str = "Exception";
    pub const EXCEPTION_MESSAGE: &str = "Message";
    pub const EXCEPTION_HRESULT: &str = "HResult";
}

/// The full default interpreter set, in registration order.
pub fn all(config: &ParserConfig) -> Vec<Box<dyn ClipInterpreter>> {
    vec![
        Box::new(orchestration::OrchestrationInterpreter::new(
            config.retry_threshold_ms,
        )),
        Box::new(claims_exchange::ClaimsExchangeInterpreter),
        Box::new(home_realm::HomeRealmDiscoveryInterpreter),
        Box::new(self_asserted::SelfAssertedInterpreter),
        Box::new(sub_journey::SubJourneyInterpreter),
        Box::new(claims_transformation::ClaimsTransformationInterpreter),
        Box::new(api_call::RestApiCallInterpreter),
        Box::new(sso::SsoSessionInterpreter),
        Box::new(ui_settings::UiSettingsInterpreter),
        Box::new(display_control::DisplayControlInterpreter),
        Box::new(completion::JourneyCompletionInterpreter),
        Box::new(error_handler::ErrorHandlerInterpreter),
    ]
}

/// Technical-profile child node in the active journey context.
pub(crate) fn technical_profile_node(
    ctx: &InterpretContext<'_>,
    profile_id: &str,
    provider: Option<String>,
    protocol: Option<String>,
) -> FlowNode {
    FlowNode::new(
        ctx.journey_id(),
        profile_id,
        ctx.current_step(),
        0,
        NodePayload::TechnicalProfile {
            profile_id: profile_id.to_string(),
            provider,
            protocol,
        },
    )
}
