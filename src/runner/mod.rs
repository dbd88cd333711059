pub mod events;
pub mod executor;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use uuid::Uuid;

pub use events::*;
pub use executor::SuiteRunner;
pub use state::*;

use crate::audit::FailureLog;
use crate::browser::{BrowserSession, SessionConfig};
use crate::project::ProjectConfig;
use crate::report;
use crate::suites;

/// Options for a full run, resolved from the CLI.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub session: SessionConfig,
    /// Where reports go
    pub output: PathBuf,
    /// Where `failures/` and `artifact-history/` are created
    pub base_dir: PathBuf,
    pub continue_on_failure: bool,
    pub parallel: bool,
    pub snapshot: bool,
    pub report: bool,
    /// Run only suites with these names (all when empty)
    pub suite_names: Vec<String>,
}

/// Runs the selected projects. Returns true when no suite failed and
/// every project session came up.
pub async fn run_projects(projects: Vec<ProjectConfig>, options: RunOptions) -> Result<bool> {
    if projects.is_empty() {
        anyhow::bail!("No projects selected");
    }
    // Fail on an unknown suite name before any browser launches.
    suites::for_run(&options.suite_names)?;

    let run_id = Uuid::new_v4().to_string();
    let (emitter, receiver) = EventEmitter::new();
    let listener = tokio::spawn(ConsoleEventListener::listen(receiver));

    let mut run_state = RunState::new(&run_id);
    run_state.start();
    emitter.emit(RunEvent::RunStarted {
        run_id: run_id.clone(),
        projects: projects.iter().map(|p| p.name.clone()).collect(),
    });

    let mut session_errors = 0u32;

    if options.parallel && projects.len() > 1 {
        let mut handles = Vec::new();
        for project in projects {
            let emitter = emitter.clone();
            let options = options.clone();
            handles.push(tokio::spawn(async move {
                let name = project.name.clone();
                (name, run_one_project(project, emitter, &options).await)
            }));
        }

        for handle in handles {
            let (name, outcome) = handle.await?;
            match outcome {
                Ok(states) => {
                    for state in states {
                        run_state.add_suite(state);
                    }
                }
                Err(error) => {
                    session_errors += 1;
                    emitter.emit(RunEvent::Log {
                        project: name,
                        message: format!("Project run failed: {:#}", error),
                    });
                }
            }
        }
    } else {
        for project in projects {
            let name = project.name.clone();
            match run_one_project(project, emitter.clone(), &options).await {
                Ok(states) => {
                    for state in states {
                        run_state.add_suite(state);
                    }
                }
                Err(error) => {
                    session_errors += 1;
                    emitter.emit(RunEvent::Log {
                        project: name,
                        message: format!("Project run failed: {:#}", error),
                    });
                }
            }
        }
    }

    run_state.finish();
    let summary = run_state.summary();
    emitter.emit(RunEvent::RunFinished {
        summary: summary.clone(),
    });

    // Closing the channel ends the listener once it has drained.
    drop(emitter);
    let _ = listener.await;

    if options.report {
        report::write_reports(&options.output, &run_state.to_report())
            .context("Failed to write reports")?;
    }

    Ok(!executor::any_failures(&run_state.suites) && session_errors == 0)
}

/// One project: its own browser session, failure log and suite sequence.
async fn run_one_project(
    project: ProjectConfig,
    emitter: EventEmitter,
    options: &RunOptions,
) -> Result<Vec<SuiteState>> {
    emitter.emit(RunEvent::ProjectStarted {
        project: project.name.clone(),
        base_url: project.base_url.clone(),
    });

    let failures = FailureLog::create(&options.base_dir, &project.name)?;
    emitter.emit(RunEvent::Log {
        project: project.name.clone(),
        message: format!("Failure log: {}", failures.path().display()),
    });
    let session = Arc::new(
        BrowserSession::launch(options.session.clone())
            .await
            .with_context(|| format!("Failed to launch browser for {}", project.name))?,
    );

    let suites = suites::for_run(&options.suite_names)?;
    let project = Arc::new(project);
    let mut runner = SuiteRunner::new(
        session,
        project.clone(),
        failures,
        emitter.clone(),
        options.base_dir.clone(),
        options.snapshot,
    );

    let states = runner.run_all(&suites, options.continue_on_failure).await;

    let failed_steps: u32 = states.iter().map(|s| s.failed_steps()).sum();
    emitter.emit(RunEvent::ProjectFinished {
        project: project.name.clone(),
        failed_steps,
    });

    Ok(states)
}
