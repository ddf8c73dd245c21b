use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use dashboard_logging::{dash_debug, dash_error};

use crate::client::{Backend, ClientSettings, ReqwestBackend};
use crate::{ApiError, EngineEvent, ListParams, RequestSeq};

enum EngineCommand {
    FetchJobs {
        seq: RequestSeq,
        dispatch_id: String,
        node_id: u64,
        params: ListParams,
    },
    FetchJobDetail {
        seq: RequestSeq,
        dispatch_id: String,
        node_id: u64,
        job_id: String,
    },
    FetchSettings {
        seq: RequestSeq,
    },
    PersistSettings {
        seq: RequestSeq,
        body: serde_json::Value,
    },
}

/// Runs backend calls on a worker thread. Every command answers with exactly
/// one [`EngineEvent`] carrying the command's sequence number, in completion
/// order.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let backend = ReqwestBackend::new(settings)?;
        Ok(Self::with_backend(Arc::new(backend)))
    }

    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    dash_error!("could not start the engine runtime: {}", err);
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                let backend = backend.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    let event = handle_command(backend.as_ref(), command).await;
                    let _ = event_tx.send(event);
                });
            }
            // Let in-flight calls finish before the runtime is dropped.
            runtime.shutdown_timeout(Duration::from_secs(1));
        });

        Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        }
    }

    pub fn fetch_jobs(
        &self,
        seq: RequestSeq,
        dispatch_id: impl Into<String>,
        node_id: u64,
        params: ListParams,
    ) {
        self.send(EngineCommand::FetchJobs {
            seq,
            dispatch_id: dispatch_id.into(),
            node_id,
            params,
        });
    }

    pub fn fetch_job_detail(
        &self,
        seq: RequestSeq,
        dispatch_id: impl Into<String>,
        node_id: u64,
        job_id: impl Into<String>,
    ) {
        self.send(EngineCommand::FetchJobDetail {
            seq,
            dispatch_id: dispatch_id.into(),
            node_id,
            job_id: job_id.into(),
        });
    }

    pub fn fetch_settings(&self, seq: RequestSeq) {
        self.send(EngineCommand::FetchSettings { seq });
    }

    pub fn persist_settings(&self, seq: RequestSeq, body: serde_json::Value) {
        self.send(EngineCommand::PersistSettings { seq, body });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    /// Blocks up to `timeout`. Clones share one queue, so only one of them
    /// should be waiting.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            dash_error!("engine worker has stopped; command dropped");
        }
    }
}

async fn handle_command(backend: &dyn Backend, command: EngineCommand) -> EngineEvent {
    match command {
        EngineCommand::FetchJobs {
            seq,
            dispatch_id,
            node_id,
            params,
        } => {
            dash_debug!("seq={} listing jobs of {}/{}", seq, dispatch_id, node_id);
            let result = backend.list_jobs(&dispatch_id, node_id, &params).await;
            EngineEvent::JobsFetched { seq, result }
        }
        EngineCommand::FetchJobDetail {
            seq,
            dispatch_id,
            node_id,
            job_id,
        } => {
            dash_debug!("seq={} loading job {}", seq, job_id);
            let result = backend.job_overview(&dispatch_id, node_id, &job_id).await;
            EngineEvent::JobDetailFetched {
                seq,
                job_id,
                result,
            }
        }
        EngineCommand::FetchSettings { seq } => {
            let result = backend.fetch_settings().await;
            EngineEvent::SettingsFetched { seq, result }
        }
        EngineCommand::PersistSettings { seq, body } => {
            let result = backend.persist_settings(&body).await;
            EngineEvent::SettingsPersisted { seq, result }
        }
    }
}
