use std::time::{Duration, Instant};

use jam_core::{AppId, JamError};
use log::debug;

use crate::{FailurePolicy, OperationReport, Outcome};

/// Per-outcome counts for one batch of identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub installed: usize,
    pub updated: usize,
    pub skipped: usize,
    pub removed: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Installed => self.installed += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Removed => self.removed += 1,
        }
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn render(&self, elapsed: Duration) -> String {
        let parts = [
            ("installed", self.installed),
            ("updated", self.updated),
            ("skipped", self.skipped),
            ("removed", self.removed),
            ("failed", self.failed),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(verb, count)| {
            let noun = if count == 1 {
                "application"
            } else {
                "applications"
            };
            format!("{verb} {count} {noun}")
        })
        .collect::<Vec<_>>();

        let body = if parts.is_empty() {
            "nothing to do".to_string()
        } else {
            parts.join(", ")
        };
        format!(
            "{} in {}",
            capitalize_first(&body),
            format_elapsed(elapsed)
        )
    }
}

pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{}.{:03}s", elapsed.as_secs(), elapsed.subsec_millis())
}

fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Result of running one operation over a list of identifiers.
#[derive(Debug)]
pub struct BatchRun {
    pub summary: BatchSummary,
    pub elapsed: Duration,
    /// Identifiers left unattempted after a fail-fast stop.
    pub unattempted: usize,
}

impl BatchRun {
    pub fn render_summary(&self) -> String {
        self.summary.render(self.elapsed)
    }
}

/// Runs `op` for each identifier in order. `observer` sees every result as it
/// arrives; failures are counted and, under `FailurePolicy::FailFast`, stop
/// the batch.
pub fn run_batch<Op, Obs>(
    apps: &[AppId],
    policy: FailurePolicy,
    mut op: Op,
    mut observer: Obs,
) -> BatchRun
where
    Op: FnMut(&AppId) -> Result<OperationReport, JamError>,
    Obs: FnMut(&AppId, &Result<OperationReport, JamError>),
{
    let started = Instant::now();
    let mut summary = BatchSummary::default();
    let mut unattempted = 0;

    for (position, app) in apps.iter().enumerate() {
        let result = op(app);
        observer(app, &result);
        match &result {
            Ok(report) => summary.record(report.outcome),
            Err(err) => {
                summary.record_failure();
                if policy == FailurePolicy::FailFast {
                    unattempted = apps.len() - position - 1;
                    debug!("{app}: {err}; stopping with {unattempted} identifier(s) left");
                    break;
                }
            }
        }
    }

    BatchRun {
        summary,
        elapsed: started.elapsed(),
        unattempted,
    }
}
