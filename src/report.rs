//! Batch report output
//!
//! The final report is written once, atomically. Completed entries are also
//! appended to a JSON Lines progress log as they happen so an interrupted run
//! keeps its work.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub file_name: String,
    pub file_path: String,
    pub ai_result: Value,
    pub markdown: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub provider: String,
    pub entries: Vec<ReportEntry>,
}

impl BatchReport {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            generated_at: Utc::now(),
            provider: provider.into(),
            entries: Vec::new(),
        }
    }

    /// All markdown blocks, in entry order
    pub fn markdown(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.markdown.trim_end())
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
            + "\n"
    }
}

/// Write JSON via a temp file and rename, so readers never see half a report.
pub fn write_report_json<T: Serialize>(path: &Path, report: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(report)?;
    write_atomic(path, &content)
}

pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report directory '{}'", parent.display()))?;
    }
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, content)
        .with_context(|| format!("Failed to write '{}'", tmp_path.display()))?;
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err).with_context(|| format!("Failed to write report '{}'", path.display()));
    }
    Ok(())
}

/// Sibling temp file, unique per target: `report.json` -> `report.json.tmp`
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressLine {
    recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    entry: ReportEntry,
}

/// Append-only record of completed entries for one batch
pub struct ProgressLog {
    path: PathBuf,
    file: File,
}

impl ProgressLog {
    /// Open the log, truncating it unless `keep_existing` is set.
    pub fn open(path: &Path, keep_existing: bool) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create progress directory '{}'", parent.display())
            })?;
        }
        let mut options = OpenOptions::new();
        options.create(true);
        if keep_existing {
            options.read(true).append(true);
        } else {
            options.write(true).truncate(true);
        }
        let mut file = options
            .open(path)
            .with_context(|| format!("Failed to open progress log '{}'", path.display()))?;
        if keep_existing {
            end_torn_line(&mut file)
                .with_context(|| format!("Failed to repair progress log '{}'", path.display()))?;
        }
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn append(&mut self, entry: &ReportEntry) -> Result<()> {
        let line = serde_json::to_string(&ProgressLine {
            recorded_at: Utc::now(),
            entry: entry.clone(),
        })?;
        writeln!(self.file, "{}", line)
            .and_then(|_| self.file.sync_data())
            .with_context(|| format!("Failed to append to '{}'", self.path.display()))
    }

    /// Entries recorded by earlier runs. A torn final line is skipped.
    pub fn read_entries(path: &Path) -> Result<Vec<ReportEntry>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read progress log '{}'", path.display()))
            }
        };
        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str::<ProgressLine>(line).ok())
            .map(|line| line.entry)
            .collect())
    }
}

/// A crash mid-append leaves a line without its newline; close it off so the
/// next entry starts on a line of its own.
fn end_torn_line(file: &mut File) -> std::io::Result<()> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(());
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        file.write_all(b"\n")?;
    }
    Ok(())
}
