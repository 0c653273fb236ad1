use std::process::exit;

use journeytrace_engine::{ParserConfig, TraceParser};
use journeytrace_model::flow::{ExecutionStatus, FlowNode};

use crate::support::{load_logs_or_exit, print_json};

pub struct Args {
    pub logs: String,
    pub json: bool,
    pub merge_window_ms: i64,
    pub retry_threshold_ms: i64,
    pub strict: bool,
    pub allow_partial: bool,
}

pub fn run(args: Args) {
    let (logs, path) = load_logs_or_exit(&args.logs);

    let config = ParserConfig {
        step_merge_window_ms: args.merge_window_ms,
        retry_threshold_ms: args.retry_threshold_ms,
        fallback_interpreter: !args.strict,
    };
    let mut parser = TraceParser::new(config);
    let result = parser.parse(&logs);

    if args.json {
        print_json(&result);
    } else {
        println!("journeytrace parse {}", path.display());
        println!("  Journey: {}", result.main_journey_id);
        println!("  Logs: {}", logs.len());
        println!("  Sessions: {}", result.sessions.len());
        println!("  Steps: {}", result.steps.len());
        println!();
        for step in &result.steps {
            let duration = match step.duration_ms {
                Some(ms) => format!("{ms} ms"),
                None => "-".to_string(),
            };
            println!(
                "  [{}] {:<12} {:<10} {}",
                step.order,
                step.name,
                status_label(step.status),
                duration
            );
        }
        println!();
        render_tree(&result.flow_tree, 1);
        if !result.errors.is_empty() {
            println!();
            println!("  Errors:");
            for error in &result.errors {
                println!("    - {error}");
            }
        }
    }

    if !result.success && !args.allow_partial {
        exit(1);
    }
}

fn status_label(status: ExecutionStatus) -> &'static str {
    match status {
        ExecutionStatus::Success => "ok",
        ExecutionStatus::Error => "error",
        ExecutionStatus::Unknown => "unknown",
    }
}

fn render_tree(node: &FlowNode, depth: usize) {
    println!(
        "{}{:?} {} ({})",
        "  ".repeat(depth),
        node.kind,
        node.name,
        status_label(node.status)
    );
    for child in &node.children {
        render_tree(child, depth + 1);
    }
}
