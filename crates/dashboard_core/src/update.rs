use dashboard_logging::dash_warn;

use crate::{
    AppState, DetailRequest, Effect, EditorError, LoadOutcome, LoadRequest, Msg, PersistOutcome,
    PersistRequest, SelectOutcome, ShellEvent,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let selected_before = state.jobs().selection().current().map(str::to_string);
    let editing_before = state.settings().is_dirty();

    let mut effects = match msg {
        Msg::JobListOpened(context) => {
            let request = state.jobs_mut().open(context);
            state.mark_dirty();
            vec![fetch_jobs(request)]
        }
        Msg::JobListClosed => {
            state.jobs_mut().close();
            state.mark_dirty();
            Vec::new()
        }
        Msg::SortClicked(key) => match state.jobs_mut().set_sort(key) {
            Some(request) => {
                state.mark_dirty();
                vec![
                    Effect::Notify(ShellEvent::SortChanged {
                        key: request.query.sort_key,
                        direction: request.query.direction,
                    }),
                    fetch_jobs(request),
                ]
            }
            None => Vec::new(),
        },
        Msg::RowClicked(job_id) => match state.jobs_mut().select_row(&job_id) {
            Some(request) => {
                state.mark_dirty();
                vec![fetch_detail(request)]
            }
            None => Vec::new(),
        },
        Msg::RowChecked(job_id) => {
            if state.jobs_mut().toggle_row(&job_id) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::JobListRetryClicked => match state.jobs_mut().retry() {
            Some(request) => {
                state.mark_dirty();
                vec![fetch_jobs(request)]
            }
            None => Vec::new(),
        },
        Msg::JobsLoaded { seq, result } => match state.jobs_mut().apply_loaded(seq, result) {
            LoadOutcome::Stale => Vec::new(),
            LoadOutcome::Applied { detail } => {
                state.mark_dirty();
                detail.into_iter().map(fetch_detail).collect()
            }
        },
        Msg::JobDetailLoaded { seq, result } => {
            if state.jobs_mut().apply_detail(seq, result) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SettingsOpened => {
            let seq = state.settings_mut().request_settings();
            state.mark_dirty();
            vec![Effect::FetchSettings { seq }]
        }
        Msg::SettingsLoaded { seq, result } => {
            if state.settings_mut().apply_settings(seq, result) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SettingsKeySelected { partition, key } => {
            match state.settings_mut().select_key(partition, &key) {
                Ok(SelectOutcome::NeedsResolution) => {
                    state.mark_dirty();
                    vec![Effect::ConfirmUnsavedChanges { partition, key }]
                }
                Ok(SelectOutcome::Loaded | SelectOutcome::Unchanged) => {
                    state.mark_dirty();
                    Vec::new()
                }
                Err(err) => rejected(err),
            }
        }
        Msg::SettingEdited { path, value } => match state.settings_mut().set_scalar(&path, &value) {
            Ok(()) => {
                state.mark_dirty();
                Vec::new()
            }
            Err(err) => rejected(err),
        },
        Msg::SettingsCancelClicked => match state.settings_mut().cancel() {
            Ok(()) => {
                state.mark_dirty();
                Vec::new()
            }
            Err(err) => rejected(err),
        },
        Msg::SettingsSaveClicked => match state.settings_mut().submit() {
            Ok(request) => {
                state.mark_dirty();
                vec![persist(request)]
            }
            Err(err) => rejected(err),
        },
        Msg::UnsavedChangesResolved(resolution) => {
            let result = state.settings_mut().resolve(resolution);
            state.mark_dirty();
            match result {
                Ok(Some(request)) => vec![persist(request)],
                Ok(None) => Vec::new(),
                Err(err) => rejected(err),
            }
        }
        Msg::SettingsSaved { seq, result } => match state.settings_mut().apply_persisted(seq, result)
        {
            PersistOutcome::Stale => Vec::new(),
            PersistOutcome::Saved | PersistOutcome::Failed => {
                state.mark_dirty();
                Vec::new()
            }
        },
        Msg::SettingsSearchChanged { partition, query } => {
            state.settings_mut().search(partition, &query);
            state.mark_dirty();
            Vec::new()
        }
        Msg::SettingsSearchCleared => {
            state.settings_mut().clear_search();
            state.mark_dirty();
            Vec::new()
        }
        Msg::NoticeDismissed => {
            if state.settings_mut().dismiss_notice() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    let selected_after = state.jobs().selection().current();
    if selected_after != selected_before.as_deref() {
        if let Some(job_id) = selected_after {
            effects.push(Effect::Notify(ShellEvent::SelectionChanged(
                job_id.to_string(),
            )));
        }
    }
    let editing_after = state.settings().is_dirty();
    if editing_after != editing_before {
        effects.push(Effect::Notify(ShellEvent::SettingsDirtyChanged(
            editing_after,
        )));
    }

    (state, effects)
}

fn fetch_jobs(request: LoadRequest) -> Effect {
    Effect::FetchJobs {
        seq: request.seq,
        context: request.context,
        query: request.query,
    }
}

fn fetch_detail(request: DetailRequest) -> Effect {
    Effect::FetchJobDetail {
        seq: request.seq,
        context: request.context,
        job_id: request.job_id,
    }
}

fn persist(request: PersistRequest) -> Effect {
    Effect::PersistSettings {
        seq: request.seq,
        partition: request.partition,
        key: request.key,
        value: request.value,
    }
}

fn rejected(err: EditorError) -> Vec<Effect> {
    dash_warn!("settings action rejected: {}", err);
    Vec::new()
}
