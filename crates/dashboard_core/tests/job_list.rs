use std::sync::Once;

use chrono::{TimeZone, Utc};
use dashboard_core::{
    update, AppState, Effect, JobDetail, JobRow, JobStatus, ListContext, ListQuery, Msg,
    RequestSeq, ShellEvent, SortDirection, SortKey, ViewError,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(dashboard_logging::initialize_for_tests);
}

fn context() -> ListContext {
    ListContext::new("78525234-72ec-42dc-94a0-f4751707f9cd", 0)
}

fn row(job_id: &str, minute: u32, executor: &str) -> JobRow {
    JobRow {
        job_id: job_id.to_string(),
        start_time: Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap(),
        executor: executor.to_string(),
        status: JobStatus::Completed,
    }
}

fn list_fetch(effects: &[Effect]) -> Option<(RequestSeq, ListQuery)> {
    effects.iter().find_map(|effect| match effect {
        Effect::FetchJobs { seq, query, .. } => Some((*seq, *query)),
        _ => None,
    })
}

fn detail_fetches(effects: &[Effect]) -> Vec<(RequestSeq, String)> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::FetchJobDetail { seq, job_id, .. } => Some((*seq, job_id.clone())),
            _ => None,
        })
        .collect()
}

/// Opens the drawer and answers the first fetch with `rows`.
fn opened_with(rows: Vec<JobRow>) -> (AppState, Vec<Effect>) {
    let (state, effects) = update(AppState::new(), Msg::JobListOpened(context()));
    let (seq, _) = list_fetch(&effects).expect("initial fetch");
    update(
        state,
        Msg::JobsLoaded {
            seq,
            result: Ok(rows),
        },
    )
}

#[test]
fn opening_fetches_newest_first() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::JobListOpened(context()));

    let (_, query) = list_fetch(&effects).expect("fetch effect");
    assert_eq!(
        query,
        ListQuery {
            sort_key: SortKey::StartTime,
            direction: SortDirection::Desc,
            offset: 0,
        }
    );
    assert!(state.jobs().is_fetching());
    assert!(state.view().jobs.show_skeleton);
    assert!(!state.view().jobs.no_results);
}

#[test]
fn first_load_selects_first_row_and_fetches_its_detail_once() {
    init_logging();
    let (state, effects) = opened_with(vec![row("job-a", 1, "dask"), row("job-b", 2, "local")]);

    assert_eq!(state.jobs().selection().current(), Some("job-a"));
    assert_eq!(state.jobs().selection().default_id(), Some("job-a"));
    let details = detail_fetches(&effects);
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].1, "job-a");
    assert!(effects.contains(&Effect::Notify(ShellEvent::SelectionChanged(
        "job-a".to_string()
    ))));
}

#[test]
fn empty_load_shows_no_results_without_detail_fetch() {
    init_logging();
    let (state, effects) = opened_with(Vec::new());

    assert!(detail_fetches(&effects).is_empty());
    assert_eq!(state.jobs().selection().current(), None);
    let view = state.view().jobs;
    assert!(view.no_results);
    assert!(!view.show_skeleton);
    assert_eq!(view.detail, None);
}

#[test]
fn sorting_a_new_column_starts_ascending_on_page_zero() {
    init_logging();
    let (state, _) = opened_with(vec![row("job-a", 1, "dask")]);

    let (state, effects) = update(state, Msg::SortClicked(SortKey::Executor));
    let (_, query) = list_fetch(&effects).expect("refetch");
    assert_eq!(query.sort_key, SortKey::Executor);
    assert_eq!(query.direction, SortDirection::Asc);
    assert_eq!(query.offset, 0);
    assert!(effects.contains(&Effect::Notify(ShellEvent::SortChanged {
        key: SortKey::Executor,
        direction: SortDirection::Asc,
    })));

    let (state, effects) = update(state, Msg::SortClicked(SortKey::Executor));
    assert_eq!(list_fetch(&effects).unwrap().1.direction, SortDirection::Desc);

    let (_, effects) = update(state, Msg::SortClicked(SortKey::Executor));
    assert_eq!(list_fetch(&effects).unwrap().1.direction, SortDirection::Asc);
}

#[test]
fn sorting_the_active_column_toggles_direction() {
    init_logging();
    let (state, _) = opened_with(vec![row("job-a", 1, "dask")]);

    // The initial query already sorts by start time, descending.
    let (_, effects) = update(state, Msg::SortClicked(SortKey::StartTime));
    let (_, query) = list_fetch(&effects).unwrap();
    assert_eq!(query.sort_key, SortKey::StartTime);
    assert_eq!(query.direction, SortDirection::Asc);
}

#[test]
fn sorting_clears_checked_rows_but_keeps_selection() {
    init_logging();
    let (state, _) = opened_with(vec![row("job-a", 1, "dask"), row("job-b", 2, "local")]);
    let (state, _) = update(state, Msg::RowChecked("job-b".to_string()));
    assert!(state.jobs().checked().contains("job-b"));

    let (state, _) = update(state, Msg::SortClicked(SortKey::JobId));
    assert!(state.jobs().checked().is_empty());
    assert_eq!(state.jobs().selection().current(), Some("job-a"));
}

#[test]
fn reloads_after_sorting_do_not_reissue_the_default_detail() {
    init_logging();
    let (state, _) = opened_with(vec![row("job-a", 1, "dask"), row("job-b", 2, "local")]);
    let (state, effects) = update(state, Msg::SortClicked(SortKey::JobId));
    let (seq, _) = list_fetch(&effects).unwrap();

    let (state, effects) = update(
        state,
        Msg::JobsLoaded {
            seq,
            result: Ok(vec![row("job-b", 2, "local"), row("job-a", 1, "dask")]),
        },
    );
    assert!(detail_fetches(&effects).is_empty());
    assert_eq!(state.jobs().selection().current(), Some("job-a"));
    assert_eq!(state.jobs().rows()[0].job_id, "job-b");
}

#[test]
fn selecting_the_same_row_twice_fetches_detail_once() {
    init_logging();
    let (state, _) = opened_with(vec![row("job-a", 1, "dask"), row("job-b", 2, "local")]);

    let (state, effects) = update(state, Msg::RowClicked("job-b".to_string()));
    assert_eq!(detail_fetches(&effects).len(), 1);
    assert!(effects.contains(&Effect::Notify(ShellEvent::SelectionChanged(
        "job-b".to_string()
    ))));

    let (state, effects) = update(state, Msg::RowClicked("job-b".to_string()));
    assert!(effects.is_empty());
    assert_eq!(state.jobs().selection().current(), Some("job-b"));
}

#[test]
fn selecting_an_unknown_row_is_ignored() {
    init_logging();
    let (state, _) = opened_with(vec![row("job-a", 1, "dask")]);

    let (state, effects) = update(state, Msg::RowClicked("job-z".to_string()));
    assert!(effects.is_empty());
    assert_eq!(state.jobs().selection().current(), Some("job-a"));
}

#[test]
fn superseded_list_response_is_discarded() {
    init_logging();
    let (state, _) = opened_with(vec![row("job-a", 1, "dask")]);
    let (state, effects) = update(state, Msg::SortClicked(SortKey::JobId));
    let (first_seq, _) = list_fetch(&effects).unwrap();
    let (state, effects) = update(state, Msg::SortClicked(SortKey::Executor));
    let (second_seq, _) = list_fetch(&effects).unwrap();

    let (state, _) = update(
        state,
        Msg::JobsLoaded {
            seq: second_seq,
            result: Ok(vec![row("by-executor", 3, "dask")]),
        },
    );
    let (state, effects) = update(
        state,
        Msg::JobsLoaded {
            seq: first_seq,
            result: Ok(vec![row("by-id", 4, "local")]),
        },
    );

    assert!(effects.is_empty());
    let ids: Vec<_> = state.jobs().rows().iter().map(|r| r.job_id.as_str()).collect();
    assert_eq!(ids, vec!["by-executor"]);
}

#[test]
fn older_response_arriving_first_is_still_discarded() {
    init_logging();
    let (state, _) = opened_with(vec![row("job-a", 1, "dask")]);
    let (state, effects) = update(state, Msg::SortClicked(SortKey::JobId));
    let (first_seq, _) = list_fetch(&effects).unwrap();
    let (state, effects) = update(state, Msg::SortClicked(SortKey::Executor));
    let (second_seq, _) = list_fetch(&effects).unwrap();

    let (state, _) = update(
        state,
        Msg::JobsLoaded {
            seq: first_seq,
            result: Ok(vec![row("by-id", 4, "local")]),
        },
    );
    assert!(state.jobs().is_fetching());

    let (state, _) = update(
        state,
        Msg::JobsLoaded {
            seq: second_seq,
            result: Ok(vec![row("by-executor", 3, "dask")]),
        },
    );
    assert_eq!(state.jobs().rows()[0].job_id, "by-executor");
    assert!(!state.jobs().is_fetching());
}

#[test]
fn response_for_a_previous_context_is_discarded() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::JobListOpened(context()));
    let (old_seq, _) = list_fetch(&effects).unwrap();
    let (state, effects) = update(state, Msg::JobListOpened(ListContext::new("other", 3)));
    let (new_seq, _) = list_fetch(&effects).unwrap();

    let (state, effects) = update(
        state,
        Msg::JobsLoaded {
            seq: old_seq,
            result: Ok(vec![row("stale", 1, "dask")]),
        },
    );
    assert!(effects.is_empty());
    assert!(state.jobs().rows().is_empty());

    let (state, effects) = update(
        state,
        Msg::JobsLoaded {
            seq: new_seq,
            result: Ok(vec![row("fresh", 1, "dask")]),
        },
    );
    assert_eq!(detail_fetches(&effects), vec![(new_seq + 1, "fresh".to_string())]);
    assert_eq!(state.jobs().selection().default_id(), Some("fresh"));
}

#[test]
fn only_latest_detail_response_is_shown() {
    init_logging();
    let (state, effects) = opened_with(vec![row("job-a", 1, "dask"), row("job-b", 2, "local")]);
    let (seq_a, _) = detail_fetches(&effects)[0].clone();
    let (state, effects) = update(state, Msg::RowClicked("job-b".to_string()));
    let (seq_b, _) = detail_fetches(&effects)[0].clone();

    let (state, _) = update(
        state,
        Msg::JobDetailLoaded {
            seq: seq_b,
            result: Ok(JobDetail {
                job_id: "job-b".to_string(),
                name: Some("circuit_b".to_string()),
                status: Some(JobStatus::Running),
            }),
        },
    );
    let (state, _) = update(
        state,
        Msg::JobDetailLoaded {
            seq: seq_a,
            result: Ok(JobDetail {
                job_id: "job-a".to_string(),
                name: Some("circuit_a".to_string()),
                status: Some(JobStatus::Completed),
            }),
        },
    );

    let detail = state.view().jobs.detail.expect("detail panel");
    assert_eq!(detail.job_id, "job-b");
    assert_eq!(detail.title.as_deref(), Some("circuit_b"));
    assert_eq!(detail.status, Some(JobStatus::Running));
    assert!(!detail.is_fetching);
}

#[test]
fn not_found_is_terminal_until_reopened() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::JobListOpened(context()));
    let (seq, _) = list_fetch(&effects).unwrap();
    let (state, _) = update(
        state,
        Msg::JobsLoaded {
            seq,
            result: Err(ViewError::NotFound("node 0".to_string())),
        },
    );
    assert!(state.view().jobs.not_found);

    let (state, effects) = update(state, Msg::SortClicked(SortKey::JobId));
    assert!(effects.is_empty());
    let (state, effects) = update(state, Msg::JobListRetryClicked);
    assert!(effects.is_empty());

    let (state, effects) = update(state, Msg::JobListOpened(ListContext::new("other", 1)));
    assert!(list_fetch(&effects).is_some());
    assert!(!state.view().jobs.not_found);
}

#[test]
fn failed_fetch_can_be_retried() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::JobListOpened(context()));
    let (seq, _) = list_fetch(&effects).unwrap();
    let (state, _) = update(
        state,
        Msg::JobsLoaded {
            seq,
            result: Err(ViewError::FetchFailed("connection refused".to_string())),
        },
    );
    let view = state.view().jobs;
    assert!(view.error.is_some());
    assert!(!view.no_results);

    let (state, effects) = update(state, Msg::JobListRetryClicked);
    let (retry_seq, query) = list_fetch(&effects).expect("retry fetch");
    assert_eq!(query, ListQuery::default());

    // The default selection is still established by the first good load.
    let (state, effects) = update(
        state,
        Msg::JobsLoaded {
            seq: retry_seq,
            result: Ok(vec![row("job-a", 1, "dask")]),
        },
    );
    assert_eq!(detail_fetches(&effects).len(), 1);
    assert_eq!(state.jobs().selection().current(), Some("job-a"));
}

#[test]
fn closing_drops_everything() {
    init_logging();
    let (state, _) = opened_with(vec![row("job-a", 1, "dask")]);
    let (state, effects) = update(state, Msg::JobListClosed);

    assert!(effects.is_empty());
    assert!(state.jobs().rows().is_empty());
    assert_eq!(state.jobs().selection().current(), None);
    assert!(!state.view().jobs.open);
}

#[test]
fn headers_show_active_column_direction() {
    init_logging();
    let (state, _) = opened_with(vec![row("job-a", 1, "dask")]);
    let headers = state.view().jobs.headers;

    let active: Vec<_> = headers.iter().filter(|h| h.active).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].key, SortKey::StartTime);
    assert_eq!(active[0].direction, SortDirection::Desc);
    assert!(headers
        .iter()
        .filter(|h| !h.active)
        .all(|h| h.direction == SortDirection::Asc));
}
