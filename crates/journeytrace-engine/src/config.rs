//! Parser configuration.

/// Tunable constants of the parser.
///
/// The two timing windows encode observed emission latency of the source
/// engine's diagnostics backend, not universal truths; both default to the
/// values the source engine was measured against.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Two finalizations of the same `(journey, step)` identity within this
    /// window are treated as one physical interaction observed across
    /// multiple log fragments and merged into one tree node.
    pub step_merge_window_ms: i64,
    /// Two orchestration firings with the same counter value separated by
    /// more than this window are treated as a user retry rather than a
    /// continuation.
    pub retry_threshold_ms: i64,
    /// When true, handler names with no registered interpreter fall back to
    /// a pass-through interpreter that extracts statebag and claims updates
    /// generically. When false, unknown handlers are skipped.
    pub fallback_interpreter: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            step_merge_window_ms: 1000,
            retry_threshold_ms: 1000,
            fallback_interpreter: true,
        }
    }
}
