use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Context;
use dashboard_core::{update, AppState, FetchStatus, Msg};
use dashboard_engine::EngineHandle;
use dashboard_logging::{dash_info, dash_trace, dash_warn};

use super::config::AppConfig;
use super::effects::{EffectRunner, HostRequest};
use super::render;

const POLL_INTERVAL: Duration = Duration::from_millis(75);
const SETTLE_DEADLINE: Duration = Duration::from_secs(15);

/// Loads the configuration, opens the configured views and logs what they
/// show once every outstanding request has been answered.
pub fn run_app() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    let log_dir = std::env::current_dir().context("resolving the working directory")?;
    dashboard_logging::initialize(config.log_destination, config.level_filter()?, &log_dir);
    dash_info!("dashboard client for {}", config.base_url);

    let engine =
        EngineHandle::new(config.client_settings()).context("starting the backend client")?;
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let (host_tx, host_rx) = mpsc::channel::<HostRequest>();
    let runner = EffectRunner::new(engine, msg_tx, host_tx);

    let mut session = Session::new(runner, msg_rx, host_rx);
    session.dispatch(Msg::SettingsOpened);
    if let Some(context) = config.startup_context()? {
        session.dispatch(Msg::JobListOpened(context));
    }

    if !session.pump_until_settled(Instant::now() + SETTLE_DEADLINE) {
        dash_warn!("gave up waiting for the backend after {:?}", SETTLE_DEADLINE);
    }
    for line in render::render(&session.state.view()) {
        dash_info!("{}", line);
    }
    Ok(())
}

struct Session {
    state: AppState,
    runner: EffectRunner,
    msg_rx: mpsc::Receiver<Msg>,
    host_rx: mpsc::Receiver<HostRequest>,
}

impl Session {
    fn new(
        runner: EffectRunner,
        msg_rx: mpsc::Receiver<Msg>,
        host_rx: mpsc::Receiver<HostRequest>,
    ) -> Self {
        Self {
            state: AppState::new(),
            runner,
            msg_rx,
            host_rx,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            for line in render::render(&state.view()) {
                dash_trace!("{}", line);
            }
        }
        self.state = state;
        self.runner.enqueue(effects);
    }

    /// Returns false when `deadline` passed with requests still outstanding.
    fn pump_until_settled(&mut self, deadline: Instant) -> bool {
        loop {
            // Headless: nobody answers prompts, so requests are only logged.
            while let Ok(request) = self.host_rx.try_recv() {
                match request {
                    HostRequest::Notify(event) => dash_info!("shell event: {:?}", event),
                    HostRequest::ConfirmUnsavedChanges { partition, key } => {
                        dash_warn!("unsaved changes prompt for {}.{} left unanswered", partition, key)
                    }
                }
            }
            if is_settled(&self.state) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            match self.msg_rx.recv_timeout(POLL_INTERVAL) {
                Ok(msg) => self.dispatch(msg),
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => return false,
            }
        }
    }
}

fn is_settled(state: &AppState) -> bool {
    let jobs = state.jobs();
    let settings = state.settings();
    !jobs.is_fetching()
        && jobs.detail_status() != FetchStatus::Pending
        && settings.status() != FetchStatus::Pending
        && !settings.is_saving()
}
