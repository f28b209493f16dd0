//! Outcome of an ordered shutdown.

use std::fmt;

use crate::error::DaemonError;

/// Result of one shutdown step.
#[derive(Debug)]
pub struct StepOutcome {
    pub step: String,
    pub result: Result<String, DaemonError>,
}

impl StepOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Every step that ran, in order, with its detail or failure.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    steps: Vec<StepOutcome>,
    drained_calls: usize,
}

impl ShutdownReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_ok(&mut self, step: impl Into<String>, detail: impl Into<String>) {
        self.steps.push(StepOutcome {
            step: step.into(),
            result: Ok(detail.into()),
        });
    }

    pub fn record(&mut self, step: impl Into<String>, result: Result<(), DaemonError>) {
        self.steps.push(StepOutcome {
            step: step.into(),
            result: result.map(|()| "stopped".to_string()),
        });
    }

    pub fn set_drained_calls(&mut self, count: usize) {
        self.drained_calls = count;
    }

    /// Calls failed with a shutdown error. In-flight calls are not a failure.
    pub fn drained_calls(&self) -> usize {
        self.drained_calls
    }

    pub fn steps(&self) -> &[StepOutcome] {
        &self.steps
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.step.as_str()).collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &DaemonError)> {
        self.steps
            .iter()
            .filter_map(|s| s.result.as_ref().err().map(|e| (s.step.as_str(), e)))
    }

    /// True when every step succeeded.
    pub fn is_clean(&self) -> bool {
        self.steps.iter().all(StepOutcome::is_ok)
    }
}

impl fmt::Display for ShutdownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.failures().count();
        writeln!(
            f,
            "Shutdown {} ({} steps, {} failed, {} calls drained)",
            if failed == 0 { "complete" } else { "incomplete" },
            self.steps.len(),
            failed,
            self.drained_calls
        )?;
        for step in &self.steps {
            match &step.result {
                Ok(detail) => writeln!(f, "  ok    {}: {}", step.step, detail)?,
                Err(e) => writeln!(f, "  FAIL  {}: {}", step.step, e)?,
            }
        }
        Ok(())
    }
}
