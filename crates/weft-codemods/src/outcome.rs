//! Operation outcomes and the sink that receives them.
//!
//! Every engine operation terminates in exactly one [`OperationOutcome`] and
//! hands it to an [`OutcomeReporter`] before returning. Installer output is
//! streamed through the same reporter when verbose installation is enabled.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Tracing target for outcome events.
const OUTCOME_TARGET: &str = "weft_codemods::outcome";

/// Terminal state of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// The operation completed.
    Applied,
    /// The operation had nothing to do.
    Skipped(String),
    /// The operation failed.
    Failed(String),
}

/// One reported result: what was attempted and how it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    status: OutcomeStatus,
    action: String,
}

impl OperationOutcome {
    /// Outcome of `action` ending in `status`.
    #[must_use]
    pub fn new(action: impl Into<String>, status: OutcomeStatus) -> Self {
        Self {
            status,
            action: action.into(),
        }
    }

    /// Outcome of a completed operation.
    #[must_use]
    pub fn applied(action: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Applied,
            action: action.into(),
        }
    }

    /// Outcome of an operation that had nothing to do.
    #[must_use]
    pub fn skipped(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Skipped(reason.into()),
            action: action.into(),
        }
    }

    /// Outcome of a failed operation.
    #[must_use]
    pub fn failed(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Failed(reason.into()),
            action: action.into(),
        }
    }

    /// Terminal state.
    #[must_use]
    pub const fn status(&self) -> &OutcomeStatus {
        &self.status
    }

    /// Description of the attempted action, e.g. `update start/env.ts file`.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Returns whether the operation completed.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self.status, OutcomeStatus::Applied)
    }
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            OutcomeStatus::Applied => write!(f, "DONE:    {}", self.action),
            OutcomeStatus::Skipped(reason) => write!(f, "SKIPPED: {} ({reason})", self.action),
            OutcomeStatus::Failed(reason) => write!(f, "FAILED:  {} ({reason})", self.action),
        }
    }
}

/// Action text for an edited file.
pub(crate) fn update_action(relative_path: &str) -> String {
    format!("update {relative_path} file")
}

/// Action text for a package installation.
pub(crate) fn install_action<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let names = names.into_iter().collect::<Vec<_>>().join(", ");
    if names.is_empty() {
        String::from("install packages")
    } else {
        format!("install packages {names}")
    }
}

/// Sink receiving operation outcomes.
pub trait OutcomeReporter: Send + Sync {
    /// Invoked exactly once per operation.
    fn report(&self, outcome: &OperationOutcome);

    /// Invoked for each line the package manager prints in verbose mode.
    fn install_output(&self, line: &str);
}

impl<T> OutcomeReporter for Arc<T>
where
    T: OutcomeReporter + ?Sized,
{
    fn report(&self, outcome: &OperationOutcome) {
        (**self).report(outcome);
    }

    fn install_output(&self, line: &str) {
        (**self).install_output(line);
    }
}

/// Default reporter that records outcomes using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl TracingReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl OutcomeReporter for TracingReporter {
    fn report(&self, outcome: &OperationOutcome) {
        match outcome.status() {
            OutcomeStatus::Applied => tracing::info!(
                target: OUTCOME_TARGET,
                event = "applied",
                action = outcome.action(),
                "{outcome}"
            ),
            OutcomeStatus::Skipped(reason) => tracing::info!(
                target: OUTCOME_TARGET,
                event = "skipped",
                action = outcome.action(),
                reason = reason.as_str(),
                "{outcome}"
            ),
            OutcomeStatus::Failed(reason) => tracing::error!(
                target: OUTCOME_TARGET,
                event = "failed",
                action = outcome.action(),
                reason = reason.as_str(),
                "{outcome}"
            ),
        }
    }

    fn install_output(&self, line: &str) {
        tracing::info!(target: OUTCOME_TARGET, event = "install_output", "{line}");
    }
}

/// Reporter that keeps every outcome and install line in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    outcomes: Mutex<Vec<OperationOutcome>>,
    install_lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    /// Captures a copy of the recorded outcomes.
    #[must_use]
    pub fn outcomes(&self) -> Vec<OperationOutcome> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded outcomes rendered as report lines.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.outcomes().iter().map(ToString::to_string).collect()
    }

    /// Captures a copy of the streamed install lines.
    #[must_use]
    pub fn install_lines(&self) -> Vec<String> {
        self.install_lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl OutcomeReporter for RecordingReporter {
    fn report(&self, outcome: &OperationOutcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outcome.clone());
    }

    fn install_output(&self, line: &str) {
        self.install_lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(OperationOutcome::applied("update .env file"), "DONE:    update .env file")]
    #[case(
        OperationOutcome::skipped("update app/policies/main.ts file", "no policies given"),
        "SKIPPED: update app/policies/main.ts file (no policies given)"
    )]
    #[case(
        OperationOutcome::failed("install packages x", "exit 1"),
        "FAILED:  install packages x (exit 1)"
    )]
    fn renders_report_lines(#[case] outcome: OperationOutcome, #[case] expected: &str) {
        assert_eq!(outcome.to_string(), expected);
    }

    #[test]
    fn shared_recorder_sees_reports() {
        let recorder = Arc::new(RecordingReporter::default());
        let reporter: Arc<dyn OutcomeReporter> = Arc::new(Arc::clone(&recorder));
        reporter.report(&OperationOutcome::applied(update_action("start/kernel.ts")));
        reporter.install_output("added 1 package");
        assert_eq!(recorder.messages(), vec!["DONE:    update start/kernel.ts file"]);
        assert_eq!(recorder.install_lines(), vec!["added 1 package"]);
    }

    #[test]
    fn install_action_lists_names() {
        assert_eq!(
            install_action(["@japa/runner", "@japa/assert"]),
            "install packages @japa/runner, @japa/assert"
        );
    }
}
