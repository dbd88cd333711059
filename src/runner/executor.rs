use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use super::events::{EventEmitter, RunEvent};
use super::state::{SuiteState, SuiteStatus};
use crate::audit::{safe_component, FailureLog};
use crate::browser::BrowserSession;
use crate::project::ProjectConfig;
use crate::suites::Suite;
use crate::utils::RunDefaults;

/// Sentinel URL recorded when the page URL cannot be read during failure
/// capture.
const BLANK_PAGE: &str = "about:blank";

/// Runs one named action. On success the value passes through unchanged;
/// on error exactly one row lands in the failure log (page URL captured
/// best-effort by `capture_url`) and the original error is re-thrown.
///
/// Returns the captured URL alongside, for the step state. The log is a
/// side-channel: an append failure is only warned about and never replaces
/// the action's error.
async fn run_audited<T, F, U>(
    failures: &FailureLog,
    step_name: &str,
    details: &str,
    capture_url: U,
    action: F,
) -> (Result<T>, Option<String>)
where
    F: Future<Output = Result<T>>,
    U: Future<Output = String>,
{
    match action.await {
        Ok(value) => (Ok(value), None),
        Err(error) => {
            let url = capture_url.await;
            let message = format!("{:#}", error);
            if let Err(log_err) = failures.append(step_name, details, &url, &message) {
                log::warn!("Could not append to failure log: {}", log_err);
            }
            (Err(error), Some(url))
        }
    }
}

/// Per-project execution harness: owns the browser session, the failure
/// log and the state of the suite currently running.
pub struct SuiteRunner {
    session: Arc<BrowserSession>,
    project: Arc<ProjectConfig>,
    defaults: RunDefaults,
    failures: FailureLog,
    emitter: EventEmitter,
    state: SuiteState,
    base_dir: PathBuf,
    snapshot: bool,
}

impl SuiteRunner {
    pub fn new(
        session: Arc<BrowserSession>,
        project: Arc<ProjectConfig>,
        failures: FailureLog,
        emitter: EventEmitter,
        base_dir: PathBuf,
        snapshot: bool,
    ) -> Self {
        let state = SuiteState::new(&project.name, "");
        Self {
            session,
            project,
            defaults: RunDefaults::default(),
            failures,
            emitter,
            state,
            base_dir,
            snapshot,
        }
    }

    pub fn session(&self) -> Arc<BrowserSession> {
        self.session.clone()
    }

    pub fn project(&self) -> Arc<ProjectConfig> {
        self.project.clone()
    }

    pub fn defaults(&self) -> &RunDefaults {
        &self.defaults
    }

    /// Coordinated console output while spinners are live.
    pub fn log(&self, message: impl Into<String>) {
        self.emitter.emit(RunEvent::Log {
            project: self.project.name.clone(),
            message: message.into(),
        });
    }

    /// Audited step: console marker, failure-CSV row and re-throw on
    /// error; the action's value passes through on success.
    pub async fn step<T, F>(&mut self, name: &str, action: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let index = self.state.begin_step(name);
        self.emitter.emit(RunEvent::StepStarted {
            project: self.project.name.clone(),
            index,
            name: name.to_string(),
        });

        let details = format!("suite: {}", self.state.suite_name);
        let session = self.session.clone();
        let capture_url = async move {
            session
                .current_url()
                .await
                .unwrap_or_else(|_| BLANK_PAGE.to_string())
        };

        let (outcome, url) = run_audited(&self.failures, name, &details, capture_url, action).await;

        match &outcome {
            Ok(_) => {
                if let Some(step) = self.state.step_mut(index) {
                    step.pass();
                }
                let duration_ms = self
                    .state
                    .steps
                    .get(index)
                    .and_then(|s| s.duration_ms)
                    .unwrap_or(0);
                self.emitter.emit(RunEvent::StepPassed {
                    project: self.project.name.clone(),
                    index,
                    duration_ms,
                });
            }
            Err(error) => {
                let message = format!("{:#}", error);
                let screenshot = self.capture_artifact(index).await;
                if let Some(step) = self.state.step_mut(index) {
                    step.fail(message.clone(), url);
                    step.screenshot_path = screenshot;
                }
                let duration_ms = self
                    .state
                    .steps
                    .get(index)
                    .and_then(|s| s.duration_ms)
                    .unwrap_or(0);
                self.emitter.emit(RunEvent::StepFailed {
                    project: self.project.name.clone(),
                    index,
                    error: message,
                    duration_ms,
                });
            }
        }

        outcome
    }

    /// Runs the given suites in order. A failed suite aborts the rest
    /// unless `continue_on_failure`, in which case the session is steered
    /// back to the homepage first so the next suite starts from known
    /// ground.
    pub async fn run_all(
        &mut self,
        suites: &[Box<dyn Suite>],
        continue_on_failure: bool,
    ) -> Vec<SuiteState> {
        let mut finished: Vec<SuiteState> = Vec::new();
        let mut aborted = false;

        for suite in suites {
            if aborted {
                let mut state = SuiteState::new(&self.project.name, suite.name());
                state.skip("previous suite failed");
                self.emitter.emit(RunEvent::SuiteSkipped {
                    project: self.project.name.clone(),
                    suite: suite.name().to_string(),
                    reason: "previous suite failed".to_string(),
                });
                finished.push(state);
                continue;
            }

            if !suite.supports(&self.project) {
                let reason = "not supported by this project";
                let mut state = SuiteState::new(&self.project.name, suite.name());
                state.skip(reason);
                self.emitter.emit(RunEvent::SuiteSkipped {
                    project: self.project.name.clone(),
                    suite: suite.name().to_string(),
                    reason: reason.to_string(),
                });
                finished.push(state);
                continue;
            }

            self.state = SuiteState::new(&self.project.name, suite.name());
            self.state.start();
            self.emitter.emit(RunEvent::SuiteStarted {
                project: self.project.name.clone(),
                suite: suite.name().to_string(),
            });

            let result = suite.run(self).await;
            if let Err(ref error) = result {
                self.state.error = Some(format!("{:#}", error));
            }

            self.state.finish();
            self.emitter.emit(RunEvent::SuiteFinished {
                project: self.project.name.clone(),
                suite: suite.name().to_string(),
                status: self.state.status.clone(),
                duration_ms: self.state.total_duration_ms,
            });

            let placeholder = SuiteState::new(&self.project.name, "");
            finished.push(std::mem::replace(&mut self.state, placeholder));

            if result.is_err() {
                if continue_on_failure {
                    self.recover_to_home().await;
                } else {
                    aborted = true;
                }
            }
        }

        finished
    }

    /// Navigation-level recovery: best effort, message-only logging.
    async fn recover_to_home(&self) {
        let home = self.project.base_url.clone();
        match self.session.goto(&home).await {
            Ok(()) => {
                self.emitter.emit(RunEvent::Recovered {
                    project: self.project.name.clone(),
                    message: format!("Recovered to {}", home),
                });
            }
            Err(error) => {
                self.emitter.emit(RunEvent::Log {
                    project: self.project.name.clone(),
                    message: format!("Recovery navigation failed: {}", error),
                });
            }
        }
    }

    async fn capture_artifact(&self, step_index: usize) -> Option<String> {
        if !self.snapshot {
            return None;
        }

        let id = Uuid::new_v4().to_string();
        let filename = format!(
            "{}_{}_{}_{}.png",
            safe_component(&self.project.name),
            safe_component(&self.state.suite_name),
            step_index,
            &id[..8]
        );
        let path = self.base_dir.join("artifact-history").join(filename);

        match self.session.screenshot(&path).await {
            Ok(()) => {
                self.log(format!("Screenshot: {}", path.display()));
                Some(path.display().to_string())
            }
            Err(error) => {
                log::debug!("Could not capture failure screenshot: {}", error);
                None
            }
        }
    }
}

/// Suite statuses that should fail the process exit code.
pub fn any_failures(suites: &[SuiteState]) -> bool {
    suites.iter().any(|s| {
        matches!(
            s.status,
            SuiteStatus::Failed | SuiteStatus::PartiallyPassed { .. }
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_audited_failure_appends_one_row_and_rethrows() {
        let dir = tempdir().unwrap();
        let failures = FailureLog::create(dir.path(), "slotarena").unwrap();

        let action = async { Err::<(), _>(anyhow!("dropdown never opened")) };
        let capture = async { "https://www.slotarena.com/slots/".to_string() };

        let (outcome, url) =
            run_audited(&failures, "open provider dropdown", "suite: filters", capture, action)
                .await;

        let err = outcome.unwrap_err();
        assert_eq!(err.to_string(), "dropdown never opened");
        assert_eq!(url.as_deref(), Some("https://www.slotarena.com/slots/"));

        let content = std::fs::read_to_string(failures.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("\"open provider dropdown\""));
        assert!(lines[1].contains("\"dropdown never opened\""));
    }

    #[tokio::test]
    async fn test_audited_success_passes_value_through_untouched() {
        let dir = tempdir().unwrap();
        let failures = FailureLog::create(dir.path(), "slotarena").unwrap();

        let action = async { Ok(41 + 1) };
        let capture = async { BLANK_PAGE.to_string() };

        let (outcome, url) =
            run_audited(&failures, "count results", "suite: filters", capture, action).await;

        assert_eq!(outcome.unwrap(), 42);
        assert!(url.is_none());

        let content = std::fs::read_to_string(failures.path()).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_audited_url_capture_failure_uses_blank_sentinel() {
        let dir = tempdir().unwrap();
        let failures = FailureLog::create(dir.path(), "spinoria").unwrap();

        let action = async { Err::<(), _>(anyhow!("boom")) };
        let capture = async { BLANK_PAGE.to_string() };

        let (_, url) = run_audited(&failures, "launch demo", "suite: demo", capture, action).await;

        assert_eq!(url.as_deref(), Some(BLANK_PAGE));
        let content = std::fs::read_to_string(failures.path()).unwrap();
        assert!(content.contains("\"about:blank\""));
    }
}
