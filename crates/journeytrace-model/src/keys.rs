//! Well-known statebag keys and event-instance names emitted by the
//! orchestration engine.

/// Statebag key holding the global orchestration step counter.
pub const ORCHESTRATION_STEP_KEY: &str = "ORCH_CS";

/// Statebag key carrying the user claims bundle. Entries under this key are
/// routed into the claims namespace and never into transient statebag.
pub const CLAIMS_BUNDLE_KEY: &str = "Complex-CLMS";

/// Statebag key naming the currently-triggered technical profile.
pub const TRIGGERED_PROFILE_KEY: &str = "TPID";

/// Statebag key holding the engine's current state-machine state.
pub const MACHINE_STATE_KEY: &str = "MACHSTATE";

/// Statebag keys that survive a step boundary. Everything else is cleared
/// when a new step opens; claims are never cleared by a step boundary.
pub const RETAINED_STATEBAG_KEYS: &[&str] = &[ORCHESTRATION_STEP_KEY, MACHINE_STATE_KEY];

/// Header event instance marking the start of an authentication journey.
/// A second or later occurrence within one correlation id is a session
/// boundary.
pub const EVENT_AUTH: &str = "Event:AUTH";

/// Header event instance for mid-journey API callbacks (form posts, provider
/// returns).
pub const EVENT_API: &str = "Event:API";

/// Event instances the parser accepts. Logs whose headers carry anything
/// else are filtered out before parsing.
pub const SUPPORTED_EVENT_INSTANCES: &[&str] = &[EVENT_AUTH, EVENT_API];
