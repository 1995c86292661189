//! Scan engine.
//!
//! Drives one scan cycle end to end:
//! 1. Incremental read of the monitored log (rotation aware)
//! 2. Candidate extraction per category
//! 3. Remote diagnosis of at most `MAX_CANDIDATES_PER_CATEGORY` candidates
//!    per category
//! 4. Store append and notifications for confirmed issues
//! 5. Store-updated notification
//!
//! A cycle never returns an error. Failures are logged and reported as
//! `ScanOutcome::Failed`; the cursor keeps whatever position the read step
//! reached.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::analysis::analyzer::RemoteAnalyzer;
use crate::analysis::client::OpenAiBackend;
use crate::config::AssistantConfig;
use crate::error::ConfigError;
use crate::extraction::extractor::extract_candidates;
use crate::extraction::metadata::extract_metadata;
use crate::extraction::patterns::Category;
use crate::storage::models::{Issue, IssueMetadata};
use crate::storage::store::IssueStore;

use super::context::ScanContext;
use super::cursor::{ReadOutcome, ScanCursor};
use super::notify::{AssistantEvent, NotificationSink, Notice};

/// Remote calls allowed per category in one cycle.
pub const MAX_CANDIDATES_PER_CATEGORY: usize = 5;

/// Snippet characters shown for the most recent issue in a summary.
pub const SUMMARY_SNIPPET_CHARS: usize = 200;

/// Counters for a cycle that processed new data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub scan_id: String,
    pub bytes_read: u64,
    pub rotated: bool,
    /// Candidates found across all categories, before the per-category cap.
    pub candidates: usize,
    pub analyzed: usize,
    pub issues_added: usize,
    pub issues_total: usize,
}

/// What one `scan()` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    MissingFile,
    NoNewData,
    Completed(ScanReport),
    Failed(String),
}

/// Most recent issue, shaped for status display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastIssue {
    pub issue_type: Category,
    pub title: String,
    pub suggested_fix: String,
    pub confidence: u8,
    pub detected_at: DateTime<Utc>,
    pub issue_details: String,
    pub log_snippet: String,
    pub metadata: IssueMetadata,
}

impl LastIssue {
    fn from_issue(issue: &Issue) -> Self {
        Self {
            issue_type: issue.category,
            title: issue.category.title(),
            suggested_fix: issue.suggested_fix.clone(),
            confidence: issue.confidence,
            detected_at: issue.detected_at,
            issue_details: issue.details.clone(),
            log_snippet: issue.display_snippet(SUMMARY_SNIPPET_CHARS),
            metadata: issue.metadata.clone(),
        }
    }
}

/// Store status for the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreSummary {
    pub issues_count: usize,
    pub issues_by_type: BTreeMap<Category, usize>,
    pub last_scan: Option<DateTime<Utc>>,
    pub last_issue: Option<LastIssue>,
}

pub struct ScanEngine {
    log_path: PathBuf,
    analyzer: RemoteAnalyzer,
    sink: Arc<dyn NotificationSink>,
    cursor: ScanCursor,
    store: IssueStore,
    last_scan: RwLock<Option<DateTime<Utc>>>,
    /// Held for one full cycle; overlapping scans wait their turn.
    cycle: tokio::sync::Mutex<()>,
}

impl ScanEngine {
    pub fn new(
        log_path: impl Into<PathBuf>,
        analyzer: RemoteAnalyzer,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            log_path: log_path.into(),
            analyzer,
            sink,
            cursor: ScanCursor::new(),
            store: IssueStore::new(),
            last_scan: RwLock::new(None),
            cycle: tokio::sync::Mutex::new(()),
        }
    }

    /// Engine talking to the configured OpenAI-compatible service.
    pub fn from_config(
        config: &AssistantConfig,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let backend = OpenAiBackend::new(
            &config.api_key,
            &config.api_base,
            config.request_timeout(),
        )?;
        let analyzer = RemoteAnalyzer::new(Arc::new(backend), &config.model_name);
        Ok(Self::new(config.log_path.clone(), analyzer, sink))
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn analyzer(&self) -> &RemoteAnalyzer {
        &self.analyzer
    }

    pub fn cursor(&self) -> u64 {
        self.cursor.position()
    }

    pub fn last_scan(&self) -> Option<DateTime<Utc>> {
        *self.last_scan.read()
    }

    /// Skip existing log content: place the cursor at the end of the file.
    ///
    /// Returns the cursor position, or `None` when the file is missing.
    pub fn initialize(&self) -> Option<u64> {
        match self.cursor.seek_to_end(&self.log_path) {
            Ok(Some(position)) => {
                log::info!(
                    "SCAN_ENGINE_INIT path={} position={}",
                    self.log_path.display(),
                    position
                );
                Some(position)
            }
            Ok(None) => {
                log::error!("LOG_FILE_MISSING path={}", self.log_path.display());
                None
            }
            Err(e) => {
                log::error!(
                    "SCAN_ENGINE_INIT_FAILED path={} error={}",
                    self.log_path.display(),
                    e
                );
                None
            }
        }
    }

    /// Run one scan cycle.
    pub async fn scan(&self) -> ScanOutcome {
        let _cycle = self.cycle.lock().await;

        let ctx = ScanContext::new();
        let log_ctx = ctx.log_context();
        *self.last_scan.write() = Some(ctx.started_at);

        log::debug!("{} SCAN_START cursor={}", log_ctx, self.cursor.position());

        match self.run_cycle(&ctx).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("{} SCAN_FAILED error={:#}", log_ctx, e);
                ScanOutcome::Failed(format!("{:#}", e))
            }
        }
    }

    /// Manual trigger.
    pub async fn analyze_logs(&self) -> ScanOutcome {
        self.scan().await
    }

    async fn run_cycle(&self, ctx: &ScanContext) -> anyhow::Result<ScanOutcome> {
        let log_ctx = ctx.log_context();

        let read = self
            .cursor
            .read_new(&self.log_path)
            .with_context(|| format!("reading {}", self.log_path.display()))?;

        let (text, bytes_read, rotated) = match read {
            ReadOutcome::Missing => {
                log::error!("{} LOG_FILE_MISSING path={}", log_ctx, self.log_path.display());
                return Ok(ScanOutcome::MissingFile);
            }
            ReadOutcome::Unchanged => {
                log::debug!("{} NO_NEW_DATA cursor={}", log_ctx, self.cursor.position());
                return Ok(ScanOutcome::NoNewData);
            }
            ReadOutcome::NewData {
                text,
                bytes,
                rotated,
            } => (text, bytes, rotated),
        };

        if rotated {
            log::info!("{} LOG_ROTATION_DETECTED", log_ctx);
        }
        log::debug!("{} LOG_READ bytes={}", log_ctx, bytes_read);

        let candidates = extract_candidates(&text);
        let candidate_count: usize = candidates.values().map(Vec::len).sum();

        if candidate_count > 0 {
            log::info!(
                "{} CANDIDATES_FOUND count={} categories={}",
                log_ctx,
                candidate_count,
                candidates.len()
            );
        }

        let mut analyzed = 0;
        let mut issues_added = 0;

        for (category, snippets) in &candidates {
            let cat_ctx = ctx.category_context(*category);
            log::debug!("{} CATEGORY_PROCESS candidates={}", cat_ctx, snippets.len());

            for (n, snippet) in snippets.iter().take(MAX_CANDIDATES_PER_CATEGORY).enumerate() {
                let cand_ctx = cat_ctx.for_candidate(n + 1);
                let metadata = extract_metadata(snippet, *category);
                analyzed += 1;

                let diagnosis = match self
                    .analyzer
                    .analyze(snippet, *category, Some(&metadata), &cand_ctx)
                    .await
                {
                    Some(d) if d.is_actionable() => d,
                    _ => continue,
                };

                let issue = Issue {
                    category: *category,
                    log_snippet: snippet.clone(),
                    suggested_fix: diagnosis.suggested_fix,
                    details: diagnosis.details,
                    confidence: diagnosis.confidence,
                    detected_at: Utc::now(),
                    metadata,
                };

                let count = self.store.append(issue.clone());
                issues_added += 1;

                log::info!(
                    "{} ISSUE_DETECTED confidence={} issues_total={}",
                    cand_ctx,
                    issue.confidence,
                    count
                );

                self.sink.notify(AssistantEvent::issue_detected(&issue));
                self.sink
                    .notify(AssistantEvent::PersistentNotice(Notice::for_issue(&issue, count)));
            }
        }

        let issues_total = self.store.len();
        self.sink.notify(AssistantEvent::StoreUpdated {
            issues_count: issues_total,
        });

        log::info!(
            "{} SCAN_COMPLETE bytes={} candidates={} analyzed={} issues_added={} elapsed_ms={}",
            log_ctx,
            bytes_read,
            candidate_count,
            analyzed,
            issues_added,
            ctx.elapsed_ms()
        );

        Ok(ScanOutcome::Completed(ScanReport {
            scan_id: ctx.scan_id.clone(),
            bytes_read,
            rotated,
            candidates: candidate_count,
            analyzed,
            issues_added,
            issues_total,
        }))
    }

    /// Stored issues; see `IssueStore::query`.
    pub fn get_issues(&self, limit: Option<usize>, category: Option<Category>) -> Vec<Issue> {
        self.store.query(limit, category)
    }

    /// Host-facing query with loose arguments.
    ///
    /// A `limit` of zero or less means no limit and an empty `issue_type`
    /// means no filter. An unknown `issue_type` matches nothing.
    pub fn get_issues_by_name(&self, limit: Option<i64>, issue_type: Option<&str>) -> Vec<Issue> {
        let limit = limit.filter(|n| *n > 0).map(|n| n as usize);

        let category = match issue_type.map(str::trim).filter(|t| !t.is_empty()) {
            None => None,
            Some(name) => match Category::from_str(name) {
                Ok(category) => Some(category),
                Err(e) => {
                    log::debug!("ISSUE_QUERY_UNKNOWN_TYPE error={}", e);
                    return Vec::new();
                }
            },
        };

        self.get_issues(limit, category)
    }

    pub fn issues_count(&self) -> usize {
        self.store.len()
    }

    pub fn clear_issues(&self) {
        let dropped = self.store.clear();
        log::info!("ISSUES_CLEARED dropped={}", dropped);
        self.sink
            .notify(AssistantEvent::StoreUpdated { issues_count: 0 });
    }

    pub fn summary(&self) -> StoreSummary {
        StoreSummary {
            issues_count: self.store.len(),
            issues_by_type: self.store.counts_by_category(),
            last_scan: self.last_scan(),
            last_issue: self.store.last().as_ref().map(LastIssue::from_issue),
        }
    }
}
