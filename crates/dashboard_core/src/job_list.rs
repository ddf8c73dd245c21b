//! Sortable job list for one workflow node, with a selection that drives a
//! detail fetch.
//!
//! Every fetch carries a [`RequestSeq`]. Responses are applied only when they
//! answer the most recently issued request of their kind, so a slow response
//! for an older sort order or an older context never overwrites a newer one.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use dashboard_logging::{dash_debug, dash_warn};

use crate::error::ViewError;

/// Monotonic request number attached to every issued fetch.
pub type RequestSeq = u64;

/// The node whose jobs are listed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListContext {
    pub dispatch_id: String,
    pub node_id: u64,
}

impl ListContext {
    pub fn new(dispatch_id: impl Into<String>, node_id: u64) -> Self {
        Self {
            dispatch_id: dispatch_id.into(),
            node_id,
        }
    }
}

impl fmt::Display for ListContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dispatch_id, self.node_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    JobId,
    StartTime,
    Executor,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::JobId, SortKey::StartTime, SortKey::Executor];

    /// Wire name of the column.
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::JobId => "job_id",
            SortKey::StartTime => "start_time",
            SortKey::Executor => "executor",
        }
    }

    /// Column header text.
    pub fn label(self) -> &'static str {
        match self {
            SortKey::JobId => "Job Id / Status",
            SortKey::StartTime => "Start Time",
            SortKey::Executor => "Executor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub sort_key: SortKey,
    pub direction: SortDirection,
    pub offset: u32,
}

impl Default for ListQuery {
    /// Newest jobs first.
    fn default() -> Self {
        Self {
            sort_key: SortKey::StartTime,
            direction: SortDirection::Desc,
            offset: 0,
        }
    }
}

impl ListQuery {
    /// Query after a click on the `key` column header.
    pub fn sorted_by(self, key: SortKey) -> Self {
        let direction = if key == self.sort_key {
            self.direction.toggled()
        } else {
            SortDirection::Asc
        };
        Self {
            sort_key: key,
            direction,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
    /// Any status this client does not know about, kept verbatim.
    Other(String),
}

impl JobStatus {
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "QUEUED" => JobStatus::Queued,
            "RUNNING" => JobStatus::Running,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            "CANCELLED" => JobStatus::Cancelled,
            _ => JobStatus::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Cancelled => "CANCELLED",
            JobStatus::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRow {
    pub job_id: String,
    pub start_time: DateTime<Utc>,
    pub executor: String,
    pub status: JobStatus,
}

/// Overview of one job, shown in the detail panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDetail {
    pub job_id: String,
    pub name: Option<String>,
    pub status: Option<JobStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Pending,
    Fulfilled,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionState {
    current: Option<String>,
    default: Option<String>,
}

impl SelectionState {
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn default_id(&self) -> Option<&str> {
        self.default.as_deref()
    }
}

/// A list fetch to issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub seq: RequestSeq,
    pub context: ListContext,
    pub query: ListQuery,
}

/// A detail fetch to issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub seq: RequestSeq,
    pub context: ListContext,
    pub job_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Answer to a superseded request; nothing changed.
    Stale,
    Applied {
        /// Detail fetch for the default selection, on the first load of a context.
        detail: Option<DetailRequest>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct DetailState {
    status: FetchStatus,
    detail: Option<JobDetail>,
    error: Option<ViewError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobListView {
    context: Option<ListContext>,
    query: ListQuery,
    rows: Vec<JobRow>,
    status: FetchStatus,
    error: Option<ViewError>,
    selection: SelectionState,
    checked: BTreeSet<String>,
    detail: DetailState,
    awaiting_default: bool,
    next_seq: RequestSeq,
    latest_list: RequestSeq,
    latest_detail: RequestSeq,
}

impl JobListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> Option<&ListContext> {
        self.context.as_ref()
    }

    pub fn query(&self) -> ListQuery {
        self.query
    }

    pub fn rows(&self) -> &[JobRow] {
        &self.rows
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn error(&self) -> Option<&ViewError> {
        self.error.as_ref()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn checked(&self) -> &BTreeSet<String> {
        &self.checked
    }

    pub fn detail(&self) -> Option<&JobDetail> {
        self.detail.detail.as_ref()
    }

    pub fn detail_status(&self) -> FetchStatus {
        self.detail.status
    }

    pub fn detail_error(&self) -> Option<&ViewError> {
        self.detail.error.as_ref()
    }

    pub fn is_fetching(&self) -> bool {
        self.status == FetchStatus::Pending
    }

    /// True once the context failed to resolve; only [`JobListView::open`] recovers.
    pub fn is_not_found(&self) -> bool {
        matches!(self.error, Some(ViewError::NotFound(_)))
    }

    /// A settled, successful load that returned nothing.
    pub fn has_no_results(&self) -> bool {
        self.status == FetchStatus::Fulfilled && self.rows.is_empty()
    }

    /// Starts a fresh list for `context` with the default query.
    pub fn open(&mut self, context: ListContext) -> LoadRequest {
        if self.context.as_ref() != Some(&context) {
            dash_debug!("job list context changed to {}", context);
        }
        self.reset();
        self.context = Some(context.clone());
        self.awaiting_default = true;
        self.issue_load(context)
    }

    /// Drops the context and everything loaded for it.
    pub fn close(&mut self) {
        self.reset();
    }

    /// Header click: toggles direction on the active column, otherwise sorts
    /// the new column ascending. Always restarts from the first page.
    pub fn set_sort(&mut self, key: SortKey) -> Option<LoadRequest> {
        if self.is_not_found() {
            return None;
        }
        let context = self.context.clone()?;
        self.query = self.query.sorted_by(key);
        self.checked.clear();
        Some(self.issue_load(context))
    }

    /// Re-issues the current query after a failed fetch.
    pub fn retry(&mut self) -> Option<LoadRequest> {
        if self.is_not_found() || self.is_fetching() {
            return None;
        }
        let context = self.context.clone()?;
        Some(self.issue_load(context))
    }

    /// Makes `job_id` the current row. A detail fetch is issued only when the
    /// selection actually changes.
    pub fn select_row(&mut self, job_id: &str) -> Option<DetailRequest> {
        if self.is_not_found() {
            return None;
        }
        if !self.rows.iter().any(|row| row.job_id == job_id) {
            dash_warn!("ignoring selection of unknown job {}", job_id);
            return None;
        }
        if self.selection.current.as_deref() == Some(job_id) {
            return None;
        }
        self.selection.current = Some(job_id.to_string());
        self.issue_detail(job_id.to_string())
    }

    /// Flips a row in the check selection.
    pub fn toggle_row(&mut self, job_id: &str) -> bool {
        if !self.rows.iter().any(|row| row.job_id == job_id) {
            return false;
        }
        if !self.checked.remove(job_id) {
            self.checked.insert(job_id.to_string());
        }
        true
    }

    pub fn apply_loaded(
        &mut self,
        seq: RequestSeq,
        result: Result<Vec<JobRow>, ViewError>,
    ) -> LoadOutcome {
        if self.context.is_none() || seq != self.latest_list {
            dash_debug!(
                "discarding job list response seq={} (latest={})",
                seq,
                self.latest_list
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(rows) => {
                self.rows = rows;
                self.status = FetchStatus::Fulfilled;
                self.error = None;
                let rows = &self.rows;
                self.checked
                    .retain(|id| rows.iter().any(|row| &row.job_id == id));

                let mut detail = None;
                if self.awaiting_default {
                    self.awaiting_default = false;
                    let first = self.rows.first().map(|row| row.job_id.clone());
                    self.selection.default = first.clone();
                    self.selection.current = first.clone();
                    if let Some(job_id) = first {
                        detail = self.issue_detail(job_id);
                    }
                }
                LoadOutcome::Applied { detail }
            }
            Err(err) => {
                dash_warn!("job list fetch failed: {}", err);
                self.rows.clear();
                self.checked.clear();
                self.status = FetchStatus::Rejected;
                self.error = Some(err);
                LoadOutcome::Applied { detail: None }
            }
        }
    }

    /// Returns false when the response was superseded.
    pub fn apply_detail(&mut self, seq: RequestSeq, result: Result<JobDetail, ViewError>) -> bool {
        if seq != self.latest_detail || self.detail.status != FetchStatus::Pending {
            dash_debug!(
                "discarding job detail response seq={} (latest={})",
                seq,
                self.latest_detail
            );
            return false;
        }
        match result {
            Ok(detail) => {
                self.detail.status = FetchStatus::Fulfilled;
                self.detail.detail = Some(detail);
                self.detail.error = None;
            }
            Err(err) => {
                dash_warn!("job detail fetch failed: {}", err);
                self.detail.status = FetchStatus::Rejected;
                self.detail.error = Some(err);
            }
        }
        true
    }

    fn issue_load(&mut self, context: ListContext) -> LoadRequest {
        let seq = self.bump_seq();
        self.latest_list = seq;
        self.status = FetchStatus::Pending;
        self.error = None;
        LoadRequest {
            seq,
            context,
            query: self.query,
        }
    }

    fn issue_detail(&mut self, job_id: String) -> Option<DetailRequest> {
        let context = self.context.clone()?;
        let seq = self.bump_seq();
        self.latest_detail = seq;
        self.detail.status = FetchStatus::Pending;
        self.detail.error = None;
        Some(DetailRequest {
            seq,
            context,
            job_id,
        })
    }

    fn bump_seq(&mut self) -> RequestSeq {
        self.next_seq += 1;
        self.next_seq
    }

    fn reset(&mut self) {
        // The counter survives so answers for an old context stay stale.
        let next_seq = self.next_seq;
        *self = Self {
            next_seq,
            ..Self::default()
        };
    }
}
