use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use dashboard_core::{
    persist_payload, Effect, JobDetail, JobRow, JobStatus, ListQuery, Msg, Partition,
    SettingsDocument, ShellEvent, ViewError,
};
use dashboard_engine::{ApiError, EngineEvent, EngineHandle, JobOverview, JobSummary, ListParams};
use dashboard_logging::{dash_debug, dash_info, dash_warn};

/// Requests for whatever hosts the dashboard views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    Notify(ShellEvent),
    /// Ask the user to save or drop edits before moving to `key`.
    ConfirmUnsavedChanges { partition: Partition, key: String },
}

/// Executes core effects on the engine and feeds engine answers back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
    host_tx: mpsc::Sender<HostRequest>,
}

impl EffectRunner {
    pub fn new(
        engine: EngineHandle,
        msg_tx: mpsc::Sender<Msg>,
        host_tx: mpsc::Sender<HostRequest>,
    ) -> Self {
        let runner = Self { engine, host_tx };
        runner.spawn_event_loop(msg_tx);
        runner
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchJobs {
                    seq,
                    context,
                    query,
                } => {
                    dash_debug!(
                        "FetchJobs seq={} context={} sort={} {}",
                        seq,
                        context,
                        query.sort_key.as_str(),
                        query.direction.as_str()
                    );
                    self.engine
                        .fetch_jobs(seq, context.dispatch_id, context.node_id, list_params(query));
                }
                Effect::FetchJobDetail {
                    seq,
                    context,
                    job_id,
                } => {
                    self.engine
                        .fetch_job_detail(seq, context.dispatch_id, context.node_id, job_id);
                }
                Effect::FetchSettings { seq } => self.engine.fetch_settings(seq),
                Effect::PersistSettings {
                    seq,
                    partition,
                    key,
                    value,
                } => {
                    dash_info!("PersistSettings seq={} {}.{}", seq, partition, key);
                    self.engine
                        .persist_settings(seq, persist_payload(partition, &key, &value));
                }
                Effect::ConfirmUnsavedChanges { partition, key } => {
                    self.send_host(HostRequest::ConfirmUnsavedChanges { partition, key });
                }
                Effect::Notify(event) => self.send_host(HostRequest::Notify(event)),
            }
        }
    }

    fn send_host(&self, request: HostRequest) {
        if self.host_tx.send(request).is_err() {
            dash_debug!("no host listening; request dropped");
        }
    }

    fn spawn_event_loop(&self, msg_tx: mpsc::Sender<Msg>) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            if let Some(event) = engine.try_recv() {
                if msg_tx.send(engine_msg(event)).is_err() {
                    break;
                }
            } else {
                thread::sleep(Duration::from_millis(20));
            }
        });
    }
}

pub(crate) fn list_params(query: ListQuery) -> ListParams {
    ListParams {
        sort_by: query.sort_key.as_str().to_string(),
        direction: query.direction.as_str().to_string(),
        offset: query.offset,
    }
}

pub(crate) fn engine_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::JobsFetched { seq, result } => Msg::JobsLoaded {
            seq,
            result: result
                .map(|rows| rows.into_iter().map(job_row).collect())
                .map_err(fetch_error),
        },
        EngineEvent::JobDetailFetched {
            seq,
            job_id,
            result,
        } => Msg::JobDetailLoaded {
            seq,
            result: result
                .map(|overview| job_detail(job_id, overview))
                .map_err(fetch_error),
        },
        EngineEvent::SettingsFetched { seq, result } => Msg::SettingsLoaded {
            seq,
            result: result
                .map_err(fetch_error)
                .and_then(|document| SettingsDocument::from_json(&document)),
        },
        EngineEvent::SettingsPersisted { seq, result } => Msg::SettingsSaved {
            seq,
            result: result.map_err(|err| {
                dash_warn!("settings save seq={} failed: {}", seq, err);
                ViewError::PersistFailed(err.to_string())
            }),
        },
    }
}

fn fetch_error(err: ApiError) -> ViewError {
    if err.is_not_found() {
        ViewError::NotFound(err.message)
    } else {
        ViewError::FetchFailed(err.to_string())
    }
}

fn job_row(summary: JobSummary) -> JobRow {
    JobRow {
        job_id: summary.job_id,
        start_time: summary.start_time,
        executor: summary.executor,
        status: JobStatus::from_raw(&summary.status),
    }
}

fn job_detail(job_id: String, overview: JobOverview) -> JobDetail {
    JobDetail {
        job_id,
        name: overview.job_name,
        status: overview.status.as_deref().map(JobStatus::from_raw),
    }
}
