use chrono::{DateTime, Utc};
use dashboard_core::{
    AppViewModel, FieldInput, JobListViewModel, JobRowView, SettingsFormView, SettingsViewModel,
    SortDirection,
};

const START_TIME_FORMAT: &str = "%b %d, %H:%M:%S";
const JOB_ID_WIDTH: usize = 24;

/// Plain-text rendering of the view model, one line per entry.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    if view.jobs.open {
        render_jobs(&view.jobs, &mut lines);
    }
    render_settings(&view.settings, &mut lines);
    lines
}

fn render_jobs(jobs: &JobListViewModel, lines: &mut Vec<String>) {
    if jobs.not_found {
        lines.push("Jobs: not found".to_string());
        return;
    }
    let headers: Vec<String> = jobs
        .headers
        .iter()
        .map(|header| {
            let arrow = match header.direction {
                SortDirection::Asc => '^',
                SortDirection::Desc => 'v',
            };
            if header.active {
                format!("{} {arrow}", header.label)
            } else {
                header.label.to_string()
            }
        })
        .collect();
    lines.push(format!("Jobs | {}", headers.join(" | ")));

    if jobs.show_skeleton {
        lines.push("  loading...".to_string());
    } else if jobs.no_results {
        lines.push("  No results found".to_string());
    } else if let Some(error) = &jobs.error {
        lines.push(format!("  {error}"));
    }
    lines.extend(jobs.rows.iter().map(format_job_row));

    if let Some(detail) = &jobs.detail {
        let title = detail.title.as_deref().unwrap_or(&detail.job_id);
        let state = match (&detail.error, detail.is_fetching, &detail.status) {
            (Some(error), _, _) => error.clone(),
            (None, true, _) => "loading".to_string(),
            (None, false, Some(status)) => status.as_str().to_string(),
            (None, false, None) => String::new(),
        };
        lines.push(format!("Job {title}: {state}"));
    }
}

fn format_job_row(row: &JobRowView) -> String {
    let marker = match (row.selected, row.checked) {
        (true, true) => "*x",
        (true, false) => "* ",
        (false, true) => " x",
        (false, false) => "  ",
    };
    format!(
        "{marker} {id:<width$} {status:<10} {start} {executor}",
        id = truncate_middle(&row.job_id, JOB_ID_WIDTH),
        width = JOB_ID_WIDTH,
        status = row.status.as_str(),
        start = format_start_time(row.start_time),
        executor = row.executor,
    )
}

pub(crate) fn format_start_time(start: DateTime<Utc>) -> String {
    start.format(START_TIME_FORMAT).to_string()
}

/// Keeps both ends of long ids: `abcdef...uvwxyz`.
pub(crate) fn truncate_middle(text: &str, max: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max || max < 5 {
        return text.to_string();
    }
    let keep = max - 3;
    let head = keep.div_ceil(2);
    let tail = keep - head;
    let mut out: String = chars[..head].iter().collect();
    out.push_str("...");
    out.extend(&chars[chars.len() - tail..]);
    out
}

fn render_settings(settings: &SettingsViewModel, lines: &mut Vec<String>) {
    if settings.loading {
        lines.push("Settings: loading...".to_string());
        return;
    }
    if let Some(error) = &settings.error {
        lines.push(format!("Settings: {error}"));
    }
    for partition in &settings.partitions {
        let entries: Vec<String> = partition
            .entries
            .iter()
            .map(|entry| {
                let mut label = if entry.selected {
                    format!("[{}]", entry.label)
                } else {
                    entry.label.clone()
                };
                if !entry.submenu.is_empty() {
                    let submenu: Vec<&str> =
                        entry.submenu.iter().map(|sub| sub.label.as_str()).collect();
                    label.push_str(&format!(" ({})", submenu.join(", ")));
                }
                label
            })
            .collect();
        lines.push(format!("{}: {}", partition.title, entries.join(", ")));
    }
    if let Some(form) = &settings.form {
        render_form(form, lines);
    }
    if let Some(confirm) = &settings.confirm {
        lines.push(format!(
            "Unsaved changes: save before opening {}?",
            confirm.label
        ));
    }
    if let Some(notice) = &settings.notice {
        lines.push(notice.clone());
    }
}

fn render_form(form: &SettingsFormView, lines: &mut Vec<String>) {
    let mut flags = Vec::new();
    if form.read_only {
        flags.push("read-only");
    }
    if form.dirty {
        flags.push("modified");
    }
    if form.saving {
        flags.push("saving");
    }
    if flags.is_empty() {
        lines.push(form.title.clone());
    } else {
        lines.push(format!("{} ({})", form.title, flags.join(", ")));
    }

    let mut group: Option<&str> = None;
    for field in &form.fields {
        if field.group.as_deref() != group {
            group = field.group.as_deref();
            if let Some(heading) = group {
                lines.push(format!("  {heading}"));
            }
        }
        let indent = if group.is_some() { "    " } else { "  " };
        let value = match &field.input {
            FieldInput::Choice(true) => "(x) true  ( ) false".to_string(),
            FieldInput::Choice(false) => "( ) true  (x) false".to_string(),
            FieldInput::Text(text) => text.clone(),
        };
        lines.push(format!("{indent}{}: {value}", field.label));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dashboard_core::{update, AppState, JobRow, JobStatus, ListContext, Msg};
    use pretty_assertions::assert_eq;

    #[test]
    fn long_ids_keep_both_ends() {
        assert_eq!(truncate_middle("short", 24), "short");
        assert_eq!(truncate_middle("abcdefghijklmnop", 9), "abc...nop");
        assert_eq!(truncate_middle("abcdefghijklmnop", 10), "abcd...nop");
    }

    #[test]
    fn start_times_are_compact() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();
        assert_eq!(format_start_time(start), "Mar 01, 09:05:07");
    }

    #[test]
    fn job_list_shows_sort_and_selection() {
        let (state, effects) = update(AppState::new(), Msg::JobListOpened(ListContext::new("d", 0)));
        let Some(dashboard_core::Effect::FetchJobs { seq, .. }) = effects.first() else {
            panic!("expected a fetch");
        };
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();
        let (state, _) = update(
            state,
            Msg::JobsLoaded {
                seq: *seq,
                result: Ok(vec![JobRow {
                    job_id: "job-a".to_string(),
                    start_time: start,
                    executor: "dask".to_string(),
                    status: JobStatus::Completed,
                }]),
            },
        );

        let lines = render(&state.view());
        assert_eq!(lines[0], "Jobs | Job Id / Status | Start Time v | Executor");
        assert!(lines[1].starts_with("*  job-a"));
        assert!(lines[1].ends_with("Mar 01, 09:05:07 dask"));
        assert_eq!(lines[2], "Job job-a: loading");
    }

    #[test]
    fn empty_list_says_so() {
        let (state, effects) = update(AppState::new(), Msg::JobListOpened(ListContext::new("d", 0)));
        let Some(dashboard_core::Effect::FetchJobs { seq, .. }) = effects.first() else {
            panic!("expected a fetch");
        };
        let (state, _) = update(
            state,
            Msg::JobsLoaded {
                seq: *seq,
                result: Ok(Vec::new()),
            },
        );

        assert!(render(&state.view()).contains(&"  No results found".to_string()));
    }
}
