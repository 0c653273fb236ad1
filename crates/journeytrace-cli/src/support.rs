//! Shared command helpers.

use std::path::{Path, PathBuf};
use std::process::exit;

use journeytrace_model::log::TraceLogInput;

/// Load and deserialize the logs file, exiting with a diagnostic on any
/// failure. Commands treat an unreadable input as fatal.
pub fn load_logs_or_exit(path: &str) -> (Vec<TraceLogInput>, PathBuf) {
    let path = Path::new(path).to_path_buf();
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) => {
            eprintln!("error: cannot read {}: {err}", path.display());
            exit(2);
        }
    };
    match serde_json::from_str::<Vec<TraceLogInput>>(&raw) {
        Ok(logs) => (logs, path),
        Err(err) => {
            eprintln!("error: cannot parse {}: {err}", path.display());
            exit(2);
        }
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => {
            eprintln!("error: cannot serialize output: {err}");
            exit(2);
        }
    }
}
