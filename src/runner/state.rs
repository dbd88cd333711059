use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Step execution status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Passed,
    Failed { error: String },
}

/// State for a single audited step
#[derive(Debug, Clone)]
pub struct StepState {
    pub index: usize,
    pub name: String,
    pub status: StepStatus,
    /// Page URL captured when the step failed
    pub url: Option<String>,
    pub screenshot_path: Option<String>,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    pub duration_ms: Option<u64>,
}

impl StepState {
    pub fn new(index: usize, name: &str) -> Self {
        Self {
            index,
            name: name.to_string(),
            status: StepStatus::Pending,
            url: None,
            screenshot_path: None,
            started_at: None,
            finished_at: None,
            duration_ms: None,
        }
    }

    pub fn start(&mut self) {
        self.status = StepStatus::Running;
        self.started_at = Some(Instant::now());
    }

    pub fn pass(&mut self) {
        self.finish(StepStatus::Passed);
    }

    pub fn fail(&mut self, error: String, url: Option<String>) {
        self.url = url;
        self.finish(StepStatus::Failed { error });
    }

    fn finish(&mut self, status: StepStatus) {
        self.status = status;
        self.finished_at = Some(Instant::now());
        if let Some(start) = self.started_at {
            self.duration_ms = Some(start.elapsed().as_millis() as u64);
        }
    }

    /// Serialize state for reporting (without Instant which isn't serializable)
    pub fn to_report(&self) -> StepReport {
        StepReport {
            index: self.index,
            name: self.name.clone(),
            status: self.status.clone(),
            url: self.url.clone(),
            screenshot_path: self.screenshot_path.clone(),
            duration_ms: self.duration_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub index: usize,
    pub name: String,
    pub status: StepStatus,
    pub url: Option<String>,
    pub screenshot_path: Option<String>,
    pub duration_ms: Option<u64>,
}

/// Suite execution status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SuiteStatus {
    Pending,
    Running,
    Passed,
    Failed,
    PartiallyPassed { passed: u32, failed: u32 },
    Skipped { reason: String },
}

/// State for one suite run against one project.
///
/// Steps are registered as they execute; a suite that aborts early simply
/// carries fewer steps.
#[derive(Debug, Clone)]
pub struct SuiteState {
    pub project_name: String,
    pub suite_name: String,
    pub status: SuiteStatus,
    pub steps: Vec<StepState>,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    pub total_duration_ms: Option<u64>,
    pub error: Option<String>,
}

impl SuiteState {
    pub fn new(project_name: &str, suite_name: &str) -> Self {
        Self {
            project_name: project_name.to_string(),
            suite_name: suite_name.to_string(),
            status: SuiteStatus::Pending,
            steps: Vec::new(),
            started_at: None,
            finished_at: None,
            total_duration_ms: None,
            error: None,
        }
    }

    pub fn start(&mut self) {
        self.status = SuiteStatus::Running;
        self.started_at = Some(Instant::now());
    }

    /// Registers and starts a new step, returning its index.
    pub fn begin_step(&mut self, name: &str) -> usize {
        let index = self.steps.len();
        let mut step = StepState::new(index, name);
        step.start();
        self.steps.push(step);
        index
    }

    pub fn step_mut(&mut self, index: usize) -> Option<&mut StepState> {
        self.steps.get_mut(index)
    }

    pub fn skip(&mut self, reason: &str) {
        self.status = SuiteStatus::Skipped {
            reason: reason.to_string(),
        };
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Instant::now());
        if let Some(start) = self.started_at {
            self.total_duration_ms = Some(start.elapsed().as_millis() as u64);
        }

        let (passed, failed) = self
            .steps
            .iter()
            .fold((0, 0), |(p, f), step| match step.status {
                StepStatus::Passed => (p + 1, f),
                StepStatus::Failed { .. } => (p, f + 1),
                _ => (p, f),
            });

        self.status = if failed > 0 {
            if passed == 0 {
                SuiteStatus::Failed
            } else {
                SuiteStatus::PartiallyPassed { passed, failed }
            }
        } else if self.error.is_some() {
            // Errors outside any step (suite-level aborts) still fail the suite
            SuiteStatus::Failed
        } else {
            SuiteStatus::Passed
        };
    }

    pub fn failed_steps(&self) -> u32 {
        self.steps
            .iter()
            .filter(|s| matches!(s.status, StepStatus::Failed { .. }))
            .count() as u32
    }

    /// Serialize state for reporting
    pub fn to_report(&self) -> SuiteReport {
        SuiteReport {
            project_name: self.project_name.clone(),
            suite_name: self.suite_name.clone(),
            status: self.status.clone(),
            steps: self.steps.iter().map(|s| s.to_report()).collect(),
            total_duration_ms: self.total_duration_ms,
            error: self.error.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteReport {
    pub project_name: String,
    pub suite_name: String,
    pub status: SuiteStatus,
    pub steps: Vec<StepReport>,
    pub total_duration_ms: Option<u64>,
    pub error: Option<String>,
}

/// State of a whole run across projects
#[derive(Debug, Clone)]
pub struct RunState {
    pub run_id: String,
    pub suites: Vec<SuiteState>,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
}

impl RunState {
    pub fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            suites: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    pub fn add_suite(&mut self, suite: SuiteState) {
        self.suites.push(suite);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Instant::now());
    }

    pub fn summary(&self) -> RunSummary {
        let mut total_steps = 0;
        let mut passed = 0;
        let mut failed = 0;
        let mut skipped_suites = 0;

        for suite in &self.suites {
            if matches!(suite.status, SuiteStatus::Skipped { .. }) {
                skipped_suites += 1;
            }
            for step in &suite.steps {
                total_steps += 1;
                match step.status {
                    StepStatus::Passed => passed += 1,
                    StepStatus::Failed { .. } => failed += 1,
                    _ => {}
                }
            }
        }

        let mut projects: Vec<&str> = self
            .suites
            .iter()
            .map(|s| s.project_name.as_str())
            .collect();
        projects.sort_unstable();
        projects.dedup();

        let total_duration_ms = self.started_at.map(|start| {
            self.finished_at
                .unwrap_or_else(Instant::now)
                .duration_since(start)
                .as_millis() as u64
        });

        RunSummary {
            run_id: self.run_id.clone(),
            total_projects: projects.len() as u32,
            total_suites: self.suites.len() as u32,
            total_steps,
            passed,
            failed,
            skipped_suites,
            total_duration_ms,
        }
    }

    /// Serialize state for reporting
    pub fn to_report(&self) -> RunReport {
        RunReport {
            run_id: self.run_id.clone(),
            suites: self.suites.iter().map(|s| s.to_report()).collect(),
            summary: self.summary(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: String,
    pub total_projects: u32,
    pub total_suites: u32,
    pub total_steps: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped_suites: u32,
    pub total_duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: String,
    pub suites: Vec<SuiteReport>,
    pub summary: RunSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suite_with_steps(outcomes: &[bool]) -> SuiteState {
        let mut suite = SuiteState::new("slotarena", "filters");
        suite.start();
        for (i, &passes) in outcomes.iter().enumerate() {
            let index = suite.begin_step(&format!("step {}", i));
            let step = suite.step_mut(index).unwrap();
            if passes {
                step.pass();
            } else {
                step.fail("element not found".to_string(), None);
            }
        }
        suite
    }

    #[test]
    fn test_finish_marks_clean_suite_passed() {
        let mut suite = suite_with_steps(&[true, true, true]);
        suite.finish();
        assert_eq!(suite.status, SuiteStatus::Passed);
        assert_eq!(suite.failed_steps(), 0);
    }

    #[test]
    fn test_finish_rolls_mixed_steps_into_partially_passed() {
        let mut suite = suite_with_steps(&[true, false, true]);
        suite.finish();
        assert_eq!(
            suite.status,
            SuiteStatus::PartiallyPassed {
                passed: 2,
                failed: 1
            }
        );
        assert_eq!(suite.failed_steps(), 1);
    }

    #[test]
    fn test_finish_marks_suite_failed_when_no_step_passed() {
        let mut suite = suite_with_steps(&[false, false]);
        suite.finish();
        assert_eq!(suite.status, SuiteStatus::Failed);
    }

    #[test]
    fn test_finish_fails_suite_on_error_without_failed_steps() {
        let mut suite = suite_with_steps(&[true, true]);
        suite.error = Some("browser session crashed".to_string());
        suite.finish();
        assert_eq!(suite.status, SuiteStatus::Failed);
    }
}
