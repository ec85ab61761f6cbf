//! Serial retry loop over previously failed test files
//!
//! One provider call is in flight at a time, and consecutive calls are
//! separated by a fixed delay to stay under free-tier per-minute quotas.

use crate::config::RunSettings;
use crate::llm::{analyze_with_deadline, truncate_str, Analyzer};
use crate::prompt::{build_user_prompt, SYSTEM_PROMPT};
use crate::render::render_markdown;
use crate::report::{write_atomic, write_report_json, BatchReport, ProgressLog, ReportEntry};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Logged provider errors are cut to this length.
const ERROR_LOG_MAX_CHARS: usize = 160;

/// Outcome of one invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Entries carried over from the progress log without a new call
    pub resumed: usize,
    pub report_path: Option<PathBuf>,
}

impl RunSummary {
    /// Share of files that now have an analysis, as a percentage
    pub fn recovery_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.succeeded + self.resumed) as f64 * 100.0 / self.total as f64
    }
}

/// Read the failed-tests list. `None` when the file does not exist.
pub fn load_failed_list(path: &Path) -> Result<Option<Vec<PathBuf>>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("Failed to read failed-tests list '{}'", path.display()))
        }
    };
    Ok(Some(
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect(),
    ))
}

pub struct BatchRunner<A> {
    analyzer: A,
    provider_name: String,
    batch_index: u32,
    settings: RunSettings,
}

impl<A: Analyzer> BatchRunner<A> {
    pub fn new(
        analyzer: A,
        provider_name: impl Into<String>,
        batch_index: u32,
        settings: RunSettings,
    ) -> Self {
        Self {
            analyzer,
            provider_name: provider_name.into(),
            batch_index,
            settings,
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let Some(references) = load_failed_list(&self.settings.failed_list)? else {
            info!(
                "No failed-tests list at {}; nothing to retry",
                self.settings.failed_list.display()
            );
            return Ok(RunSummary::default());
        };

        let progress_path = self.settings.progress_path(self.batch_index);
        let done: HashMap<String, ReportEntry> = if self.settings.resume {
            ProgressLog::read_entries(&progress_path)?
                .into_iter()
                .map(|entry| (entry.file_path.clone(), entry))
                .collect()
        } else {
            HashMap::new()
        };
        let mut progress = ProgressLog::open(&progress_path, self.settings.resume)?;

        // Pair each reference with its logged entry, if a previous run finished it.
        // Repeated paths all reuse the same logged entry.
        let plan: Vec<(&PathBuf, Option<ReportEntry>)> = references
            .iter()
            .map(|r| (r, done.get(&path_key(r)).cloned()))
            .collect();
        let pending = plan.iter().filter(|(_, logged)| logged.is_none()).count();
        info!(
            "Retrying {} file(s) with {} ({} already done)",
            pending,
            self.provider_name,
            references.len() - pending
        );

        let mut report = BatchReport::new(&self.provider_name);
        let mut summary = RunSummary {
            total: references.len(),
            ..RunSummary::default()
        };
        let mut still_failing = Vec::new();
        let mut calls_made = 0;

        for (idx, (reference, logged)) in plan.into_iter().enumerate() {
            let file_path = path_key(reference);
            if let Some(entry) = logged {
                debug!("Skipping {} (found in progress log)", file_path);
                report.entries.push(entry);
                summary.resumed += 1;
                continue;
            }

            let file_name = reference
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_path.clone());
            info!("[{}/{}] Analyzing {}", idx + 1, references.len(), file_name);

            let template = fs::read_to_string(&self.settings.template).with_context(|| {
                format!(
                    "Failed to read prompt template '{}'",
                    self.settings.template.display()
                )
            })?;
            let source = fs::read_to_string(reference)
                .with_context(|| format!("Failed to read test file '{}'", file_path))?;
            let user_prompt = build_user_prompt(&template, &file_name, &source);

            let result = analyze_with_deadline(
                &self.analyzer,
                SYSTEM_PROMPT,
                &user_prompt,
                self.settings.request_timeout,
            )
            .await;
            calls_made += 1;

            match result {
                Ok(analysis) => {
                    let markdown = render_markdown(Some(&analysis)).unwrap_or_default();
                    let entry = ReportEntry {
                        file_name: file_name.clone(),
                        file_path,
                        ai_result: analysis,
                        markdown,
                    };
                    progress.append(&entry)?;
                    report.entries.push(entry);
                    summary.succeeded += 1;
                    info!("  + {} documented", file_name);
                }
                Err(err) => {
                    summary.failed += 1;
                    still_failing.push(file_path);
                    let message = err.to_string();
                    warn!(
                        "  - {} failed: {}",
                        file_name,
                        truncate_str(&message, ERROR_LOG_MAX_CHARS)
                    );
                }
            }

            if calls_made < pending {
                info!(
                    "  Waiting {}s before next request...",
                    self.settings.delay.as_secs()
                );
                tokio::time::sleep(self.settings.delay).await;
            }
        }

        let report_path = self.settings.report_path(self.batch_index);
        write_report_json(&report_path, &report)?;
        write_atomic(
            &self.settings.markdown_path(self.batch_index),
            &report.markdown(),
        )?;
        self.write_remaining(&still_failing)?;

        summary.report_path = Some(report_path);
        info!(
            "Done: {} succeeded, {} failed, {} resumed ({:.1}% recovered)",
            summary.succeeded,
            summary.failed,
            summary.resumed,
            summary.recovery_rate()
        );
        if let Some(path) = &summary.report_path {
            info!("Report written to {}", path.display());
        }
        Ok(summary)
    }

    fn write_remaining(&self, still_failing: &[String]) -> Result<()> {
        let path = self.settings.remaining_path(self.batch_index);
        if still_failing.is_empty() {
            if path.exists() {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove '{}'", path.display()))?;
            }
            return Ok(());
        }
        write_atomic(&path, &(still_failing.join("\n") + "\n"))?;
        info!(
            "{} file(s) still failing; re-queue with --failed-list {}",
            still_failing.len(),
            path.display()
        );
        Ok(())
    }
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
