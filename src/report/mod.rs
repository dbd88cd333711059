pub mod junit;
pub mod types;

use std::path::Path;

use anyhow::Result;

use crate::runner::state::RunReport;

/// Renders results as pretty JSON, written to `output` or dumped to stdout.
/// Shared by the post-run writer and the offline `report` subcommand.
fn emit_json(results: &types::TestResults, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            println!("JSON report saved to: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Writes `test-results.json` and `junit.xml` for a finished run.
pub fn write_reports(output_dir: &Path, report: &RunReport) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;

    let results = types::TestResults {
        run_id: report.run_id.clone(),
        suites: report.suites.clone(),
        summary: report.summary.clone(),
        generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    };

    emit_json(&results, Some(&output_dir.join("test-results.json")))?;
    junit::write_report(&results, output_dir)?;
    Ok(())
}

/// Generate report from saved test results
pub async fn generate_report(
    results_path: &Path,
    format: &str,
    output: Option<&Path>,
) -> Result<()> {
    let results = std::fs::read_to_string(results_path)?;
    let test_results: types::TestResults = serde_json::from_str(&results)?;

    match format {
        "json" => emit_json(&test_results, output),
        "junit" => {
            let xml = junit::generate_junit_xml(&test_results)?;
            if let Some(path) = output {
                std::fs::write(path, xml)?;
                println!("JUnit report saved to: {}", path.display());
            } else {
                println!("{}", xml);
            }
            Ok(())
        }
        _ => anyhow::bail!("Unknown format: {}", format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::state::{RunSummary, SuiteReport, SuiteStatus};

    fn sample_results() -> types::TestResults {
        types::TestResults {
            run_id: "run-9f2c".to_string(),
            suites: vec![SuiteReport {
                project_name: "slotarena".to_string(),
                suite_name: "filters".to_string(),
                status: SuiteStatus::Passed,
                steps: vec![],
                total_duration_ms: Some(1200),
                error: None,
            }],
            summary: RunSummary {
                run_id: "run-9f2c".to_string(),
                total_projects: 1,
                total_suites: 1,
                total_steps: 0,
                passed: 0,
                failed: 0,
                skipped_suites: 0,
                total_duration_ms: Some(1200),
            },
            generated_at: "2024-01-01 12:00:00".to_string(),
        }
    }

    #[test]
    fn test_write_reports_emits_json_and_junit() {
        let dir = tempfile::tempdir().unwrap();
        let results = sample_results();
        let report = RunReport {
            run_id: results.run_id.clone(),
            suites: results.suites.clone(),
            summary: results.summary.clone(),
        };

        write_reports(dir.path(), &report).unwrap();

        let json_path = dir.path().join("test-results.json");
        assert!(dir.path().join("junit.xml").exists());

        let written: types::TestResults =
            serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
        assert_eq!(written.run_id, "run-9f2c");
        assert_eq!(written.suites.len(), 1);
    }

    #[tokio::test]
    async fn test_generate_report_round_trips_saved_results() {
        let dir = tempfile::tempdir().unwrap();
        let saved = dir.path().join("test-results.json");
        std::fs::write(&saved, serde_json::to_string(&sample_results()).unwrap()).unwrap();

        let out = dir.path().join("regenerated.json");
        generate_report(&saved, "json", Some(&out)).await.unwrap();

        let regenerated: types::TestResults =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(regenerated.run_id, "run-9f2c");
        assert_eq!(regenerated.suites[0].suite_name, "filters");
    }

    #[tokio::test]
    async fn test_generate_report_rejects_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let saved = dir.path().join("test-results.json");
        std::fs::write(&saved, serde_json::to_string(&sample_results()).unwrap()).unwrap();

        let err = generate_report(&saved, "html", None)
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("Unknown format: html"));
    }
}
