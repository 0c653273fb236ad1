use std::collections::BTreeMap;

use journeytrace_model::clip::Clip;
use serde_json::json;

use crate::support::{load_logs_or_exit, print_json};

pub fn run(logs_path: String, json_output: bool) {
    let (logs, path) = load_logs_or_exit(&logs_path);

    let summaries: Vec<serde_json::Value> = logs
        .iter()
        .map(|log| {
            let mut kind_counts: BTreeMap<&'static str, usize> = BTreeMap::new();
            let mut handlers: Vec<&str> = Vec::new();
            let mut event_instances: Vec<&str> = Vec::new();
            for clip in &log.clips {
                *kind_counts.entry(clip.kind().as_str()).or_default() += 1;
                match clip {
                    Clip::Action(name) | Clip::Predicate(name) => handlers.push(name),
                    Clip::Headers(headers) => event_instances.push(&headers.event_instance),
                    _ => {}
                }
            }
            json!({
                "id": log.id,
                "timestamp": log.timestamp,
                "policyId": log.policy_id,
                "eventInstances": event_instances,
                "clipKinds": kind_counts,
                "handlers": handlers,
            })
        })
        .collect();

    if json_output {
        print_json(&json!({
            "path": path.display().to_string(),
            "logCount": logs.len(),
            "logs": summaries,
        }));
    } else {
        println!("journeytrace inspect {}", path.display());
        println!("  Logs: {}", logs.len());
        for summary in &summaries {
            println!();
            println!(
                "  {} @ {}",
                summary["id"].as_str().unwrap_or("?"),
                summary["timestamp"].as_str().unwrap_or("?")
            );
            if let Some(kinds) = summary["clipKinds"].as_object() {
                for (kind, count) in kinds {
                    println!("    {kind}: {count}");
                }
            }
            if let Some(handlers) = summary["handlers"].as_array() {
                for handler in handlers {
                    if let Some(name) = handler.as_str() {
                        println!("    -> {name}");
                    }
                }
            }
        }
    }
}
