//! Dashboard core: pure state machine and view-model helpers for the job
//! drawer and the settings page.
mod effect;
mod error;
mod job_list;
pub mod labels;
mod msg;
mod settings;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, ShellEvent};
pub use error::{EditorError, ViewError};
pub use job_list::{
    DetailRequest, FetchStatus, JobDetail, JobListView, JobRow, JobStatus, ListContext, ListQuery,
    LoadOutcome, LoadRequest, RequestSeq, SelectionState, SortDirection, SortKey,
};
pub use msg::Msg;
pub use settings::{
    persist_payload, EditBuffer, Notice, Partition, PersistOutcome, PersistRequest, Resolution,
    SelectOutcome, SettingPath, SettingValue, SettingsDocument, SettingsEditor, SettingsTree,
};
pub use state::AppState;
pub use update::update;
pub use view_model::{
    AppViewModel, ColumnHeaderView, ConfirmView, FieldInput, FieldView, JobDetailView,
    JobListViewModel, JobRowView, MenuEntryView, PartitionView, SettingsFormView,
    SettingsViewModel, SubMenuView,
};
