use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use pitboss::{browser, project, report, runner, suites};

#[derive(Parser)]
#[command(name = "pitboss")]
#[command(version = "0.1.2")]
#[command(about = "End-to-end smoke testing CLI for casino game sites", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run test suites against one or more projects
    Run {
        /// Project name(s) to run (all registered projects if not provided)
        #[arg(short, long, value_delimiter = ',')]
        project: Vec<String>,

        /// Suite name(s) to run (all suites if not provided)
        #[arg(long, value_delimiter = ',')]
        suite: Vec<String>,

        /// Directory with additional project YAML files
        #[arg(long)]
        projects_dir: Option<PathBuf>,

        /// Browser engine (chromium, firefox, webkit)
        #[arg(short, long, default_value = "chromium")]
        browser: String,

        /// Run with a visible browser window
        #[arg(long, default_value = "false")]
        headed: bool,

        /// Run projects in parallel, one browser session each
        #[arg(long, default_value = "false")]
        parallel: bool,

        /// Output directory for reports
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Continue on failure
        #[arg(long, default_value = "false")]
        continue_on_failure: bool,

        /// Enable screenshot capture on failures
        #[arg(long, short = 's', default_value = "false")]
        snapshot: bool,

        /// Generate reports (JSON, JUnit)
        #[arg(long, default_value = "false")]
        report: bool,
    },

    /// List registered projects
    Projects {
        /// Directory with additional project YAML files
        #[arg(long)]
        projects_dir: Option<PathBuf>,
    },

    /// List available test suites
    Suites,

    /// Generate report from test results
    Report {
        /// Path to test results JSON
        results: PathBuf,

        /// Output format (json, junit)
        #[arg(short, long, default_value = "junit")]
        format: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            project,
            suite,
            projects_dir,
            browser: browser_name,
            headed,
            parallel,
            output,
            continue_on_failure,
            snapshot,
            report,
        } => {
            let registry = project::load_projects(projects_dir.as_deref())?;
            let selected = project::resolve_projects(registry, &project)?;

            let mut session = browser::SessionConfig::default();
            session.browser = browser::BrowserKind::parse(&browser_name)?;
            if headed {
                session.headless = false;
            }

            println!(
                "{} Running checks against {} project(s)",
                "▶".green().bold(),
                selected.len()
            );
            println!(
                "  Projects: {}",
                selected
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
                    .cyan()
            );
            if !suite.is_empty() {
                println!("  Suites: {}", suite.join(", ").yellow());
            }
            println!("  Browser: {}", browser_name.cyan());
            if parallel {
                println!("  Parallel: {}", "Enabled".yellow());
            }
            println!("  Output: {}", output.display().to_string().cyan());
            if snapshot {
                println!("  Snapshots: {}", "Enabled".green());
            }
            if report {
                println!("  Reports: {}", "Enabled".green());
            }

            let options = runner::RunOptions {
                session,
                output,
                base_dir: std::env::current_dir()?,
                continue_on_failure,
                parallel,
                snapshot,
                report,
                suite_names: suite,
            };

            let all_green = runner::run_projects(selected, options).await?;
            if !all_green {
                std::process::exit(1);
            }
        }

        Commands::Projects { projects_dir } => {
            let projects = project::load_projects(projects_dir.as_deref())?;
            println!(
                "{} {} registered project(s)",
                "📋".to_string().blue(),
                projects.len()
            );
            let suites = suites::all_suites();
            for p in &projects {
                let supported: Vec<&str> = suites
                    .iter()
                    .filter(|s| s.supports(p))
                    .map(|s| s.name())
                    .collect();
                let demo = match p.demo_launch {
                    project::DemoLaunchMode::Popup => "popup",
                    project::DemoLaunchMode::NewTab => "new tab",
                };
                println!("  {} {}", "•".cyan(), p.name.bold());
                println!("      url: {}", p.base_url);
                println!("      demo: {}", demo);
                println!("      suites: {}", supported.join(", "));
            }
        }

        Commands::Suites => {
            let suites = suites::all_suites();
            println!(
                "{} {} available suite(s)",
                "📋".to_string().blue(),
                suites.len()
            );
            for suite in &suites {
                println!("  {} {}", "•".cyan(), suite.name());
            }
        }

        Commands::Report {
            results,
            format,
            output,
        } => {
            println!(
                "{} Generating {} report from: {}",
                "📊".to_string().blue(),
                format.cyan(),
                results.display()
            );
            report::generate_report(&results, &format, output.as_deref()).await?;
        }
    }

    Ok(())
}
