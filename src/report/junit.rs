use super::types::TestResults;
use crate::runner::state::{SuiteReport, SuiteStatus};
use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

/// Generate JUnit XML report string from run results
///
/// Suites are grouped into one `<testsuite>` per project; each site suite
/// becomes a `<testcase>`. Step detail stays in the JSON report.
pub fn generate_junit_xml(results: &TestResults) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let total_tests = results.suites.len();
    let failures = results
        .suites
        .iter()
        .filter(|s| is_failure(&s.status))
        .count();
    let skipped = results
        .suites
        .iter()
        .filter(|s| matches!(s.status, SuiteStatus::Skipped { .. }))
        .count();
    let total_duration: u64 = results
        .suites
        .iter()
        .map(|s| s.total_duration_ms.unwrap_or(0))
        .sum();

    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", "pitboss-run"));
    suites_start.push_attribute(("tests", total_tests.to_string().as_str()));
    suites_start.push_attribute(("failures", failures.to_string().as_str()));
    suites_start.push_attribute(("skipped", skipped.to_string().as_str()));
    suites_start.push_attribute((
        "time",
        (total_duration as f64 / 1000.0).to_string().as_str(),
    ));
    writer.write_event(Event::Start(suites_start))?;

    // Group by project, in first-seen order
    let mut projects: Vec<&str> = Vec::new();
    for suite in &results.suites {
        if !projects.contains(&suite.project_name.as_str()) {
            projects.push(suite.project_name.as_str());
        }
    }

    for project in projects {
        let suites: Vec<&SuiteReport> = results
            .suites
            .iter()
            .filter(|s| s.project_name == project)
            .collect();
        write_project_suite(&mut writer, project, &suites, results)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let result = writer.into_inner().into_inner();
    let xml = String::from_utf8(result)?;
    Ok(xml)
}

fn is_failure(status: &SuiteStatus) -> bool {
    matches!(
        status,
        SuiteStatus::Failed | SuiteStatus::PartiallyPassed { .. }
    )
}

fn write_project_suite<W: std::io::Write>(
    writer: &mut Writer<W>,
    project: &str,
    suites: &[&SuiteReport],
    results: &TestResults,
) -> Result<()> {
    let failures = suites.iter().filter(|s| is_failure(&s.status)).count();
    let skipped = suites
        .iter()
        .filter(|s| matches!(s.status, SuiteStatus::Skipped { .. }))
        .count();
    let duration: u64 = suites.iter().map(|s| s.total_duration_ms.unwrap_or(0)).sum();

    let mut suite_start = BytesStart::new("testsuite");
    suite_start.push_attribute(("name", project));
    suite_start.push_attribute(("tests", suites.len().to_string().as_str()));
    suite_start.push_attribute(("failures", failures.to_string().as_str()));
    suite_start.push_attribute(("skipped", skipped.to_string().as_str()));
    suite_start.push_attribute(("id", results.run_id.as_str()));
    suite_start.push_attribute(("time", (duration as f64 / 1000.0).to_string().as_str()));
    suite_start.push_attribute(("timestamp", results.generated_at.as_str()));
    writer.write_event(Event::Start(suite_start))?;

    for suite in suites {
        write_test_case(writer, suite)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    Ok(())
}

fn write_test_case<W: std::io::Write>(writer: &mut Writer<W>, suite: &SuiteReport) -> Result<()> {
    let mut case_start = BytesStart::new("testcase");
    case_start.push_attribute(("name", suite.suite_name.as_str()));
    case_start.push_attribute(("classname", suite.project_name.as_str()));
    case_start.push_attribute((
        "time",
        (suite.total_duration_ms.unwrap_or(0) as f64 / 1000.0)
            .to_string()
            .as_str(),
    ));
    writer.write_event(Event::Start(case_start))?;

    match &suite.status {
        SuiteStatus::Failed | SuiteStatus::PartiallyPassed { .. } => {
            let message = failure_message(suite);
            let mut fail_start = BytesStart::new("failure");
            fail_start.push_attribute(("message", message.as_str()));
            fail_start.push_attribute(("type", "AssertionError"));
            writer.write_event(Event::Start(fail_start))?;
            writer.write_event(Event::Text(BytesText::new(&message)))?;
            writer.write_event(Event::End(BytesEnd::new("failure")))?;
        }
        SuiteStatus::Skipped { reason } => {
            let mut skip_start = BytesStart::new("skipped");
            skip_start.push_attribute(("message", reason.as_str()));
            writer.write_event(Event::Empty(skip_start))?;
        }
        _ => {}
    }

    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}

/// Suite-level error if recorded, else the first failed step's error.
fn failure_message(suite: &SuiteReport) -> String {
    if let Some(error) = &suite.error {
        return error.clone();
    }
    suite
        .steps
        .iter()
        .find_map(|step| match &step.status {
            crate::runner::state::StepStatus::Failed { error } => Some(error.clone()),
            _ => None,
        })
        .unwrap_or_else(|| "Unknown error".to_string())
}

/// Write report to file
pub fn write_report(results: &TestResults, output_dir: &Path) -> Result<()> {
    let xml = generate_junit_xml(results)?;
    let path = output_dir.join("junit.xml");
    std::fs::write(&path, xml)?;
    println!("JUnit report saved to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::state::{RunSummary, StepReport, StepStatus};

    fn step(index: usize, name: &str, status: StepStatus) -> StepReport {
        StepReport {
            index,
            name: name.to_string(),
            status,
            url: None,
            screenshot_path: None,
            duration_ms: Some(100),
        }
    }

    #[test]
    fn test_generate_junit_xml() {
        let results = TestResults {
            run_id: "run-1234".to_string(),
            suites: vec![
                SuiteReport {
                    project_name: "slotarena".to_string(),
                    suite_name: "filters".to_string(),
                    status: SuiteStatus::Passed,
                    steps: vec![step(0, "open game list", StepStatus::Passed)],
                    total_duration_ms: Some(1500),
                    error: None,
                },
                SuiteReport {
                    project_name: "slotarena".to_string(),
                    suite_name: "demo".to_string(),
                    status: SuiteStatus::Failed,
                    steps: vec![step(
                        0,
                        "reveal demo button",
                        StepStatus::Failed {
                            error: "Demo CTA never became interactable: .demo-btn".to_string(),
                        },
                    )],
                    total_duration_ms: Some(2000),
                    error: Some("Demo CTA never became interactable: .demo-btn".to_string()),
                },
                SuiteReport {
                    project_name: "spinoria".to_string(),
                    suite_name: "legal".to_string(),
                    status: SuiteStatus::Skipped {
                        reason: "not supported by this project".to_string(),
                    },
                    steps: vec![],
                    total_duration_ms: None,
                    error: None,
                },
            ],
            summary: RunSummary {
                run_id: "run-1234".to_string(),
                total_projects: 2,
                total_suites: 3,
                total_steps: 2,
                passed: 1,
                failed: 1,
                skipped_suites: 1,
                total_duration_ms: Some(3500),
            },
            generated_at: "2024-01-01 12:00:00".to_string(),
        };

        let xml = generate_junit_xml(&results).expect("Failed to generate XML");

        assert!(xml.contains(r#"<testsuites name="pitboss-run""#));
        assert!(xml.contains(r#"tests="3""#));
        assert!(xml.contains(r#"failures="1""#));
        assert!(xml.contains(r#"<testsuite name="slotarena""#));
        assert!(xml.contains(r#"<testsuite name="spinoria""#));
        assert!(xml.contains(r#"<testcase name="filters""#));
        assert!(xml.contains(r#"message="Demo CTA never became interactable: .demo-btn""#));
        assert!(xml.contains(r#"<skipped message="not supported by this project"/>"#));
    }

    #[test]
    fn test_failure_message_falls_back_to_first_failed_step() {
        let suite = SuiteReport {
            project_name: "slotarena".to_string(),
            suite_name: "search".to_string(),
            status: SuiteStatus::PartiallyPassed {
                passed: 1,
                failed: 1,
            },
            steps: vec![
                step(0, "open game list", StepStatus::Passed),
                step(
                    1,
                    "search for 'Book of'",
                    StepStatus::Failed {
                        error: "Timed out after 20000ms waiting for: .game-card".to_string(),
                    },
                ),
            ],
            total_duration_ms: Some(900),
            error: None,
        };

        assert_eq!(
            failure_message(&suite),
            "Timed out after 20000ms waiting for: .game-card"
        );
    }
}
