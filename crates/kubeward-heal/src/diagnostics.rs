//! Diagnostic reporter for a timed-out readiness gate.
//!
//! Output is for operators reading CI logs; nothing here feeds back into
//! a decision. The unhealthy dump goes through the same filter and
//! readiness tests as the polling loop.

use std::fmt::Write;

use kubeward_core::{HealthSample, PollOutcome, TargetFilter};

/// Per-target dump of everything still unhealthy in `sample`.
pub fn render_report(sample: &HealthSample, filter: &TargetFilter) -> String {
    let filtered = filter.apply(sample);
    let mut out = String::new();

    match &filtered {
        HealthSample::Inventory(targets) => {
            for t in targets.iter().filter(|t| !t.is_healthy()) {
                let _ = writeln!(out, "- Namespace: {}", t.namespace);
                let _ = writeln!(out, "  Pod:       {}", t.identifier);
                let _ = writeln!(out, "  Phase:     {}", t.phase);
                let _ = writeln!(out, "  Ready:     {:?}", t.container_readiness);
                out.push_str("---\n");
            }
        }
        HealthSample::Jobs(jobs) => {
            for j in jobs.iter().filter(|j| !j.is_up()) {
                let _ = writeln!(out, "- Job:    {}", j.job);
                let _ = writeln!(out, "  Health: {}", j.health);
                out.push_str("---\n");
            }
        }
    }

    out
}

/// The full, unfiltered sample as an aligned table.
pub fn render_table(sample: &HealthSample) -> String {
    let rows: Vec<Vec<String>> = match sample {
        HealthSample::Inventory(targets) => {
            let mut rows = vec![header(&["NAMESPACE", "NAME", "READY", "STATUS", "OWNER"])];
            rows.extend(targets.iter().map(|t| {
                let owner = t
                    .owners
                    .first()
                    .map(|o| format!("{}/{}", o.kind, o.name))
                    .unwrap_or_else(|| "<none>".to_string());
                vec![
                    t.namespace.clone(),
                    t.identifier.clone(),
                    t.ready_summary(),
                    t.phase.to_string(),
                    owner,
                ]
            }));
            rows
        }
        HealthSample::Jobs(jobs) => {
            let mut rows = vec![header(&["JOB", "HEALTH"])];
            rows.extend(jobs.iter().map(|j| vec![j.job.clone(), j.health.clone()]));
            rows
        }
    };

    align(&rows)
}

/// Full operator-facing dump for a `TimedOut` outcome; `None` on convergence.
pub fn render_timeout(outcome: &PollOutcome, filter: &TargetFilter) -> Option<String> {
    let PollOutcome::TimedOut {
        attempts,
        unhealthy,
        last_sample,
    } = outcome
    else {
        return None;
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Targets failed to become ready after {attempts} attempts ({} unhealthy).",
        unhealthy.len()
    );

    match last_sample {
        Some(sample) => {
            out.push_str("\nFinal status:\n");
            out.push_str(&render_table(sample));
            out.push_str("\nUnready targets:\n");
            out.push_str(&render_report(sample, filter));
        }
        None => out.push_str("\nNo sample was ever obtained from the source.\n"),
    }

    Some(out)
}

fn header(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

fn align(rows: &[Vec<String>]) -> String {
    let cols = rows.first().map(Vec::len).unwrap_or(0);
    let widths: Vec<usize> = (0..cols)
        .map(|c| rows.iter().map(|r| r[c].len()).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for row in rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect();
        out.push_str(line.join("   ").trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubeward_core::{JobHealth, OwnerRef, Phase, Target, UnhealthySet};

    fn sample() -> HealthSample {
        let mut ok = Target::new("default", "api-0", Phase::Running);
        ok.container_readiness = vec![true];
        ok.owners.push(OwnerRef {
            kind: "ReplicaSet".to_string(),
            name: "api".to_string(),
        });

        let mut bad = Target::new("default", "worker-0", Phase::Pending);
        bad.container_readiness = vec![false, true];

        let shim = Target::new("kube-system", "svclb-traefik-1", Phase::Pending);

        HealthSample::Inventory(vec![ok, bad, shim])
    }

    #[test]
    fn report_lists_only_unhealthy_unexcluded() {
        let report = render_report(&sample(), &TargetFilter::default());
        assert!(report.contains("Pod:       worker-0"));
        assert!(report.contains("Phase:     Pending"));
        assert!(report.contains("Ready:     [false, true]"));
        assert!(!report.contains("api-0"));
        assert!(!report.contains("svclb"));
    }

    #[test]
    fn same_name_in_another_namespace_is_not_dumped() {
        let mut healthy = Target::new("staging", "api-0", Phase::Running);
        healthy.container_readiness = vec![true];
        let mut broken = Target::new("prod", "api-0", Phase::Failed);
        broken.container_readiness = vec![false];

        let report = render_report(
            &HealthSample::Inventory(vec![healthy, broken]),
            &TargetFilter::default(),
        );
        assert!(report.contains("Namespace: prod"));
        assert!(!report.contains("staging"));
        assert_eq!(report.matches("---").count(), 1);
    }

    #[test]
    fn table_includes_everything() {
        let table = render_table(&sample());
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("NAMESPACE"));
        assert!(table.contains("svclb-traefik-1"));
        assert!(table.contains("ReplicaSet/api"));
        assert!(table.contains("1/2"));
    }

    #[test]
    fn table_columns_line_up() {
        let table = render_table(&sample());
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[0].find("NAME "), lines[1].find("api-0"));
    }

    #[test]
    fn jobs_report() {
        let sample = HealthSample::Jobs(vec![
            JobHealth::new("todo-app", "down"),
            JobHealth::new("metrics-app", "up"),
        ]);
        let report = render_report(&sample, &TargetFilter::default());
        assert!(report.contains("Job:    todo-app"));
        assert!(!report.contains("metrics-app"));
        assert!(render_table(&sample).starts_with("JOB"));
    }

    #[test]
    fn timeout_without_sample() {
        let outcome = PollOutcome::TimedOut {
            attempts: 3,
            unhealthy: UnhealthySet::new(),
            last_sample: None,
        };
        let dump = render_timeout(&outcome, &TargetFilter::default()).unwrap();
        assert!(dump.contains("after 3 attempts"));
        assert!(dump.contains("No sample"));
    }

    #[test]
    fn converged_has_no_dump() {
        let outcome = PollOutcome::Converged { attempts: 1 };
        assert!(render_timeout(&outcome, &TargetFilter::default()).is_none());
    }
}
