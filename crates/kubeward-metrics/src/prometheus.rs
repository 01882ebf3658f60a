//! Prometheus text exposition format.
//!
//! Renders a counter snapshot into the text format for scraping by a
//! Prometheus server or compatible agent.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::recorder::CounterSnapshot;

pub const CHECKS: &str = "remediator_check_total";
pub const RESTARTS: &str = "remediator_restart_total";
pub const FAILURES: &str = "remediator_failure_total";

/// Render all counters. Labeled families use the `job` label.
pub fn render_prometheus(snapshot: &CounterSnapshot) -> String {
    let mut out = String::new();

    out.push_str("# HELP remediator_check_total Total checks performed.\n");
    out.push_str("# TYPE remediator_check_total counter\n");
    let _ = writeln!(out, "{CHECKS} {}", snapshot.checks);

    out.push_str("# HELP remediator_restart_total Total successful remediations.\n");
    out.push_str("# TYPE remediator_restart_total counter\n");
    render_labeled(&mut out, RESTARTS, &snapshot.restarts);

    out.push_str("# HELP remediator_failure_total Total failed remediations.\n");
    out.push_str("# TYPE remediator_failure_total counter\n");
    render_labeled(&mut out, FAILURES, &snapshot.failures);

    out
}

fn render_labeled(out: &mut String, name: &str, values: &BTreeMap<String, u64>) {
    for (job, value) in values {
        let _ = writeln!(out, "{name}{{job=\"{}\"}} {value}", escape_label(job));
    }
}

/// Escape a label value per the exposition format.
fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
