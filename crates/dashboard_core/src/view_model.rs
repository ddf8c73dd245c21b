use chrono::{DateTime, Utc};

use crate::labels::{field_label, partition_title, section_label, submenu_label};
use crate::{
    FetchStatus, JobListView, JobStatus, Partition, SettingPath, SettingValue, SettingsEditor,
    SortDirection, SortKey,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub jobs: JobListViewModel,
    pub settings: SettingsViewModel,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobListViewModel {
    pub open: bool,
    pub headers: Vec<ColumnHeaderView>,
    pub rows: Vec<JobRowView>,
    pub is_fetching: bool,
    /// Placeholder rows while the first page is loading.
    pub show_skeleton: bool,
    pub no_results: bool,
    /// The node could not be found; the whole drawer shows that instead.
    pub not_found: bool,
    pub error: Option<String>,
    pub detail: Option<JobDetailView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHeaderView {
    pub key: SortKey,
    pub label: &'static str,
    pub active: bool,
    /// Arrow shown on the header; inactive columns show ascending.
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub job_id: String,
    pub start_time: DateTime<Utc>,
    pub executor: String,
    pub status: JobStatus,
    pub selected: bool,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDetailView {
    pub job_id: String,
    pub title: Option<String>,
    pub status: Option<JobStatus>,
    pub is_fetching: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsViewModel {
    pub loading: bool,
    pub error: Option<String>,
    pub partitions: Vec<PartitionView>,
    pub form: Option<SettingsFormView>,
    pub notice: Option<String>,
    /// Pending "save or discard?" prompt.
    pub confirm: Option<ConfirmView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionView {
    pub partition: Partition,
    pub title: String,
    pub search: String,
    pub entries: Vec<MenuEntryView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntryView {
    pub key: String,
    pub label: String,
    pub selected: bool,
    pub submenu: Vec<SubMenuView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubMenuView {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsFormView {
    pub partition: Partition,
    pub key: String,
    pub title: String,
    pub read_only: bool,
    pub dirty: bool,
    pub saving: bool,
    pub can_submit: bool,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    /// Address for `Msg::SettingEdited`. Kept structured so keys that
    /// contain dots stay addressable.
    pub path: SettingPath,
    /// Heading of the nested section the field sits in.
    pub group: Option<String>,
    pub label: String,
    pub input: FieldInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    Choice(bool),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmView {
    pub partition: Partition,
    pub key: String,
    pub label: String,
}

pub(crate) fn job_list_view(list: &JobListView) -> JobListViewModel {
    let query = list.query();
    let current = list.selection().current();
    let headers = SortKey::ALL
        .into_iter()
        .map(|key| {
            let active = key == query.sort_key;
            ColumnHeaderView {
                key,
                label: key.label(),
                active,
                direction: if active {
                    query.direction
                } else {
                    SortDirection::Asc
                },
            }
        })
        .collect();
    let rows = list
        .rows()
        .iter()
        .map(|row| JobRowView {
            job_id: row.job_id.clone(),
            start_time: row.start_time,
            executor: row.executor.clone(),
            status: row.status.clone(),
            selected: current == Some(row.job_id.as_str()),
            checked: list.checked().contains(&row.job_id),
        })
        .collect();
    let detail = current.map(|job_id| {
        let loaded = list.detail().filter(|detail| detail.job_id == job_id);
        JobDetailView {
            job_id: job_id.to_string(),
            title: loaded.and_then(|detail| detail.name.clone()),
            status: loaded.and_then(|detail| detail.status.clone()),
            is_fetching: list.detail_status() == FetchStatus::Pending,
            error: list.detail_error().map(ToString::to_string),
        }
    });

    JobListViewModel {
        open: list.context().is_some(),
        headers,
        rows,
        is_fetching: list.is_fetching(),
        show_skeleton: list.is_fetching() && list.rows().is_empty(),
        no_results: list.has_no_results(),
        not_found: list.is_not_found(),
        error: list.error().map(ToString::to_string),
        detail,
    }
}

pub(crate) fn settings_view(editor: &SettingsEditor) -> SettingsViewModel {
    let selected = editor
        .buffer()
        .map(|buffer| (buffer.partition(), buffer.key()));
    let partitions = match editor.document() {
        Some(document) => Partition::ALL
            .into_iter()
            .map(|partition| {
                let tree = document.partition(partition);
                let entries = editor
                    .visible_keys(partition)
                    .into_iter()
                    .map(|key| MenuEntryView {
                        label: section_label(&key),
                        selected: selected == Some((partition, key.as_str())),
                        submenu: tree
                            .subsections(&key)
                            .into_iter()
                            .map(|name| SubMenuView {
                                key: name.to_string(),
                                label: submenu_label(name),
                            })
                            .collect(),
                        key,
                    })
                    .collect();
                PartitionView {
                    partition,
                    title: partition_title(partition.as_str()),
                    search: editor.filter(partition).to_string(),
                    entries,
                }
            })
            .collect(),
        None => Vec::new(),
    };

    let form = editor.buffer().map(|buffer| SettingsFormView {
        partition: buffer.partition(),
        key: buffer.key().to_string(),
        title: section_label(buffer.key()),
        read_only: buffer.partition().is_read_only(),
        dirty: buffer.is_dirty(),
        saving: editor.is_saving(),
        can_submit: editor.can_submit(),
        fields: form_fields(buffer.key(), buffer.value()),
    });

    SettingsViewModel {
        loading: editor.status() == FetchStatus::Pending && editor.document().is_none(),
        error: editor.error().map(ToString::to_string),
        partitions,
        form,
        notice: editor.notice().map(|notice| notice.message().to_string()),
        confirm: editor.parked().map(|(partition, key)| ConfirmView {
            partition,
            key: key.to_string(),
            label: section_label(key),
        }),
    }
}

/// One field per scalar, up to two levels deep. The input kind follows the
/// value's own tag, so sibling fields are decided independently.
fn form_fields(key: &str, value: &SettingValue) -> Vec<FieldView> {
    let Some(tree) = value.as_section() else {
        return scalar_field(SettingPath::Root, None, key, value)
            .into_iter()
            .collect();
    };

    let mut fields = Vec::new();
    for (name, value) in tree.iter() {
        match value.as_section() {
            None => fields.extend(scalar_field(
                SettingPath::Key(name.to_string()),
                None,
                name,
                value,
            )),
            Some(section) => {
                let group = section_label(name);
                for (child, value) in section.iter() {
                    fields.extend(scalar_field(
                        SettingPath::Nested(name.to_string(), child.to_string()),
                        Some(group.clone()),
                        child,
                        value,
                    ));
                }
            }
        }
    }
    fields
}

fn scalar_field(
    path: SettingPath,
    group: Option<String>,
    name: &str,
    value: &SettingValue,
) -> Option<FieldView> {
    let (label, input) = match value {
        SettingValue::Flag(flag) => (section_label(name), FieldInput::Choice(*flag)),
        SettingValue::Text(text) => (field_label(name), FieldInput::Text(text.clone())),
        SettingValue::Section(_) => return None,
    };
    Some(FieldView {
        path,
        group,
        label,
        input,
    })
}
