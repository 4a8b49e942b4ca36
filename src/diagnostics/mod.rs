//! The per-run diagnostics accumulator: warnings, abandoned-path counter, assertion
//! violations, and branch/path counters, per `SPEC_FULL.md` §10/§11. Non-fatal
//! path-local conditions are absorbed here rather than propagated as `Result::Err`,
//! per §7's propagation policy.

use colored::Colorize;

use crate::cfg::AssertionKind;

/// One confirmed assertion violation: a satisfying assignment under which the path
/// condition holds and the asserted predicate is false. `model` is the counterexample
/// plugged back through the store into `signal -> concrete value` pairs, per §6's
/// output shape, rather than the solver's raw `symbol -> value` dump.
#[derive(Debug, Clone)]
pub struct Violation {
    pub kind: AssertionKind,
    pub instance: String,
    pub cycle: usize,
    pub predicate: String,
    pub model: Vec<(String, String)>,
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    pub warnings: Vec<String>,
    pub abandoned_paths: u64,
    pub paths_explored: u64,
    pub branches_encountered: u64,
    pub violations: Vec<Violation>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.warnings.push(message);
    }

    pub fn record_branch(&mut self) {
        self.branches_encountered += 1;
    }

    pub fn record_path_explored(&mut self) {
        self.paths_explored += 1;
    }

    pub fn record_abandoned(&mut self) {
        self.abandoned_paths += 1;
        self.paths_explored += 1;
    }

    pub fn record_violation(&mut self, violation: Violation) {
        tracing::error!(
            instance = %violation.instance,
            cycle = violation.cycle,
            kind = ?violation.kind,
            "assertion violation"
        );
        self.violations.push(violation);
    }

    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Human-facing completion summary, colorized the way the teacher colorizes CLI
    /// output: bold red for violations/errors, yellow for warnings, plain otherwise.
    pub fn report(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "paths explored: {} ({} abandoned), branches encountered: {}\n",
            self.paths_explored, self.abandoned_paths, self.branches_encountered
        ));
        for w in &self.warnings {
            out.push_str(&format!("{}: {}\n", "warning".yellow().bold(), w));
        }
        if self.violations.is_empty() {
            out.push_str("no assertion violations found\n");
        } else {
            out.push_str(&format!(
                "{}: {} assertion violation(s) found\n",
                "violation".red().bold(),
                self.violations.len()
            ));
            for v in &self.violations {
                let model = if v.model.is_empty() {
                    "(no model)".to_string()
                } else {
                    v.model.iter().map(|(name, value)| format!("{name} = {value}")).collect::<Vec<_>>().join(", ")
                };
                out.push_str(&format!("  [{:?}] {}@cycle {}: {} {}\n", v.kind, v.instance, v.cycle, v.predicate, model));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_every_recorded_violation() {
        let mut diag = Diagnostics::new();
        diag.record_violation(Violation {
            kind: AssertionKind::Assert,
            instance: "top".into(),
            cycle: 0,
            predicate: "count < 4".into(),
            model: vec![("count".to_string(), "4".to_string())],
        });
        assert!(diag.has_violations());
        let report = diag.report();
        assert!(report.contains("count < 4"));
    }

    #[test]
    fn abandoned_path_counts_toward_paths_explored() {
        let mut diag = Diagnostics::new();
        diag.record_abandoned();
        diag.record_abandoned();
        assert_eq!(diag.abandoned_paths, 2);
        assert_eq!(diag.paths_explored, 2);
    }
}
