use super::state::{RunSummary, SuiteStatus};
use tokio::sync::broadcast;

/// Run execution events for real-time console updates
#[derive(Debug, Clone)]
pub enum RunEvent {
    // Run events
    RunStarted {
        run_id: String,
        projects: Vec<String>,
    },
    RunFinished {
        summary: RunSummary,
    },

    // Project events
    ProjectStarted {
        project: String,
        base_url: String,
    },
    ProjectFinished {
        project: String,
        failed_steps: u32,
    },

    // Suite events
    SuiteStarted {
        project: String,
        suite: String,
    },
    SuiteFinished {
        project: String,
        suite: String,
        status: SuiteStatus,
        duration_ms: Option<u64>,
    },
    SuiteSkipped {
        project: String,
        suite: String,
        reason: String,
    },

    // Step events
    StepStarted {
        project: String,
        index: usize,
        name: String,
    },
    StepPassed {
        project: String,
        index: usize,
        duration_ms: u64,
    },
    StepFailed {
        project: String,
        index: usize,
        error: String,
        duration_ms: u64,
    },

    // Recovery notice after a navigation-level error
    Recovered {
        project: String,
        message: String,
    },

    // Log event for coordinated output
    Log {
        project: String,
        message: String,
    },
}

/// Event emitter for broadcasting run events
#[derive(Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<RunEvent>,
}

impl EventEmitter {
    pub fn new() -> (Self, broadcast::Receiver<RunEvent>) {
        let (sender, receiver) = broadcast::channel(100);
        (Self { sender }, receiver)
    }

    pub fn emit(&self, event: RunEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }
}

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::time::Duration as StdDuration;

/// Console event listener for printing real-time updates.
///
/// Projects may run in parallel, so the active step spinner and its text
/// are keyed by project name.
pub struct ConsoleEventListener;

impl ConsoleEventListener {
    pub async fn listen(mut receiver: broadcast::Receiver<RunEvent>) {
        use colored::Colorize;
        use indicatif::ProgressDrawTarget;
        use std::io::IsTerminal;

        // Hidden draw target when piped, to avoid escape codes in logs
        let multi = if std::io::stdout().is_terminal() {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };

        let mut spinners: HashMap<String, ProgressBar> = HashMap::new();
        let mut step_texts: HashMap<String, String> = HashMap::new();

        while let Ok(event) = receiver.recv().await {
            match event {
                RunEvent::RunStarted { run_id, projects } => {
                    multi
                        .println(format!(
                            "\n{} Run started: {} ({})",
                            "▶".green().bold(),
                            run_id.cyan(),
                            projects.join(", ")
                        ))
                        .ok();
                }

                RunEvent::RunFinished { summary } => {
                    for (_, pb) in spinners.drain() {
                        pb.finish();
                    }

                    // Let the last spinner frames flush before the summary
                    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

                    println!("\n{} Run finished", "■".blue().bold());
                    println!("  Projects: {}", summary.total_projects);
                    println!(
                        "  Suites: {} ({} skipped)",
                        summary.total_suites, summary.skipped_suites
                    );
                    println!(
                        "  Steps: {} total, {} passed, {} failed",
                        summary.total_steps,
                        summary.passed.to_string().green(),
                        summary.failed.to_string().red()
                    );
                    if let Some(duration) = summary.total_duration_ms {
                        println!("  Duration: {}ms", duration);
                    }
                }

                RunEvent::ProjectStarted { project, base_url } => {
                    multi
                        .println(format!(
                            "\n{} Project: {} ({})",
                            "→".blue(),
                            project.white().bold(),
                            base_url.dimmed()
                        ))
                        .ok();
                }

                RunEvent::ProjectFinished {
                    project,
                    failed_steps,
                } => {
                    let marker = if failed_steps == 0 {
                        "✓".green()
                    } else {
                        "✗".red()
                    };
                    multi
                        .println(format!(
                            "{} Project {} finished ({} failed steps)",
                            marker, project, failed_steps
                        ))
                        .ok();
                }

                RunEvent::SuiteStarted { project, suite } => {
                    multi
                        .println(format!(
                            "\n  {} [{}] Suite: {}",
                            "→".blue(),
                            project.dimmed(),
                            suite.white().bold()
                        ))
                        .ok();
                }

                RunEvent::SuiteFinished {
                    project,
                    suite,
                    status,
                    duration_ms,
                } => {
                    if let Some(pb) = spinners.remove(&project) {
                        pb.finish();
                    }

                    let status_str = match status {
                        SuiteStatus::Passed => "PASSED".green().bold(),
                        SuiteStatus::Failed => "FAILED".red().bold(),
                        SuiteStatus::PartiallyPassed { passed, failed } => {
                            format!("PARTIAL ({}/{} passed)", passed, passed + failed)
                                .yellow()
                                .bold()
                        }
                        _ => "UNKNOWN".white().bold(),
                    };
                    let duration = duration_ms
                        .map(|d| format!(" in {}ms", d))
                        .unwrap_or_default();
                    multi
                        .println(format!(
                            "  {} Suite {} [{}]{}",
                            "←".blue(),
                            suite,
                            status_str,
                            duration
                        ))
                        .ok();
                }

                RunEvent::SuiteSkipped {
                    project,
                    suite,
                    reason,
                } => {
                    multi
                        .println(format!(
                            "  {} [{}] Suite {} ({})",
                            "○".yellow(),
                            project.dimmed(),
                            suite,
                            reason.dimmed()
                        ))
                        .ok();
                }

                RunEvent::StepStarted {
                    project,
                    index,
                    name,
                } => {
                    let pb = multi.add(ProgressBar::new_spinner());
                    let style = ProgressStyle::default_spinner()
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                        .template("    {spinner} {msg}")
                        .unwrap();
                    pb.set_style(style);

                    let body = format!("[{}] {}... ", index + 1, name.dimmed());
                    pb.set_message(body.clone());
                    pb.enable_steady_tick(StdDuration::from_millis(100));

                    if let Some(old) = spinners.insert(project.clone(), pb) {
                        old.finish_and_clear();
                    }
                    step_texts.insert(project, body);
                }

                RunEvent::StepPassed {
                    project,
                    duration_ms,
                    ..
                } => {
                    let text = step_texts.remove(&project).unwrap_or_default();
                    let done_msg = format!("    {} {}({}ms)", "✓".green(), text, duration_ms);

                    if let Some(pb) = spinners.remove(&project) {
                        pb.finish_and_clear();
                        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
                    }
                    println!("{}", done_msg);
                }

                RunEvent::StepFailed {
                    project,
                    error,
                    duration_ms,
                    ..
                } => {
                    let text = step_texts.remove(&project).unwrap_or_default();

                    if let Some(pb) = spinners.remove(&project) {
                        let style = ProgressStyle::default_spinner()
                            .template("    {msg}")
                            .unwrap();
                        pb.set_style(style);
                        pb.finish_with_message(format!(
                            "{} {}({}ms)",
                            "✗".red(),
                            text,
                            duration_ms
                        ));
                    } else {
                        println!("    {} {}({}ms)", "✗".red(), text, duration_ms);
                    }
                    multi
                        .println(format!("      {}", error.red().dimmed()))
                        .ok();
                }

                RunEvent::Recovered { project, message } => {
                    multi
                        .println(format!(
                            "  {} [{}] {}",
                            "↻".yellow(),
                            project.dimmed(),
                            message.yellow()
                        ))
                        .ok();
                }

                RunEvent::Log { project, message } => {
                    multi
                        .println(format!("      [{}] {}", project.dimmed(), message))
                        .ok();
                }
            }
        }
    }
}
