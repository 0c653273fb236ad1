use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "journeytrace",
    about = "Reconstruct identity-journey execution traces from orchestration diagnostic logs",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconstruct the execution trace of one correlation id
    Parse {
        /// Path to a JSON file holding an array of diagnostic logs
        logs: String,

        /// Output the full parse result as JSON
        #[arg(long)]
        json: bool,

        /// Window (ms) within which re-observed steps merge into one node
        #[arg(long, default_value_t = 1000)]
        merge_window_ms: i64,

        /// Gap (ms) beyond which a same-step re-firing counts as a retry
        #[arg(long, default_value_t = 1000)]
        retry_threshold_ms: i64,

        /// Skip handler results with no registered interpreter instead of
        /// extracting their state generically
        #[arg(long)]
        strict: bool,

        /// Exit 0 even when the reconstructed trace carries errors
        #[arg(long)]
        allow_partial: bool,
    },

    /// Summarize clip kinds and handlers per log, without reconstruction
    Inspect {
        /// Path to a JSON file holding an array of diagnostic logs
        logs: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
