use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use csv::{QuoteStyle, WriterBuilder};

/// Column header of every failure file. Written once at creation, unquoted.
const HEADER: &str = "Project,Step,Details,URL,Error Message";

/// Append-only CSV log of failed steps.
///
/// One file per project and run (`failures/<project>_<timestamp>.csv`),
/// created fresh at run start. The file is a diagnostic side-channel for
/// human triage; nothing in the tool reads it back.
pub struct FailureLog {
    project: String,
    path: PathBuf,
}

impl FailureLog {
    /// Creates the `failures/` directory under `base_dir` if needed and
    /// starts a new timestamped file for `project` with the header row.
    pub fn create(base_dir: &Path, project: &str) -> Result<Self> {
        let dir = base_dir.join("failures");
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create failures directory: {}", dir.display()))?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("{}_{}.csv", safe_component(project), timestamp));
        fs::write(&path, format!("{}\n", HEADER))
            .with_context(|| format!("Failed to create failure log: {}", path.display()))?;

        Ok(Self {
            project: project.to_string(),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one failure row. Every field is quote-wrapped with internal
    /// quotes doubled; newlines inside fields are collapsed to spaces so a
    /// row never spans lines.
    pub fn append(&self, step: &str, details: &str, url: &str, error: &str) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open failure log: {}", self.path.display()))?;

        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .has_headers(false)
            .from_writer(file);

        writer.write_record([
            flatten(&self.project),
            flatten(step),
            flatten(details),
            flatten(url),
            flatten(error),
        ])?;
        writer.flush()?;
        Ok(())
    }
}

/// Collapses line breaks to spaces so multi-line error messages stay on
/// one CSV row.
fn flatten(field: &str) -> String {
    field
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
}

/// Keeps project and suite names filesystem-safe for artifact filenames.
pub(crate) fn safe_component(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_writes_header() {
        let dir = tempdir().unwrap();
        let log = FailureLog::create(dir.path(), "slotarena").unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content, "Project,Step,Details,URL,Error Message\n");

        let name = log.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("slotarena_"));
        assert!(name.ends_with(".csv"));
    }

    #[test]
    fn test_append_quotes_and_doubles() {
        let dir = tempdir().unwrap();
        let log = FailureLog::create(dir.path(), "slotarena").unwrap();

        log.append(
            "open provider dropdown",
            "He said, \"hi\"",
            "https://example.com/games/",
            "timeout after 20000ms",
        )
        .unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        let row = content.lines().nth(1).unwrap();
        assert!(row.contains("\"He said, \"\"hi\"\"\""));
        assert!(row.starts_with("\"slotarena\""));

        // Parses back to a single field per column.
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(record.len(), 5);
        assert_eq!(&record[2], "He said, \"hi\"");
    }

    #[test]
    fn test_append_collapses_newlines() {
        let dir = tempdir().unwrap();
        let log = FailureLog::create(dir.path(), "spinoria").unwrap();

        log.append(
            "click demo",
            "details",
            "https://example.com/",
            "line one\nline two\r\nline three",
        )
        .unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("line one line two line three"));
    }

    #[test]
    fn test_one_row_per_append() {
        let dir = tempdir().unwrap();
        let log = FailureLog::create(dir.path(), "spinoria").unwrap();

        log.append("step a", "d", "https://example.com/", "boom").unwrap();
        log.append("step b", "d", "https://example.com/", "bang").unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_safe_component_sanitizes() {
        assert_eq!(safe_component("spinoria mobile/web"), "spinoria_mobile_web");
    }
}
