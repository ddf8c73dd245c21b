use crate::{ListContext, ListQuery, Partition, RequestSeq, SettingValue, SortDirection, SortKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchJobs {
        seq: RequestSeq,
        context: ListContext,
        query: ListQuery,
    },
    FetchJobDetail {
        seq: RequestSeq,
        context: ListContext,
        job_id: String,
    },
    FetchSettings {
        seq: RequestSeq,
    },
    PersistSettings {
        seq: RequestSeq,
        partition: Partition,
        key: String,
        value: SettingValue,
    },
    /// Ask the user whether to save or drop edits before switching to `key`.
    ConfirmUnsavedChanges { partition: Partition, key: String },
    /// Event for the surrounding shell.
    Notify(ShellEvent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    SelectionChanged(String),
    SortChanged {
        key: SortKey,
        direction: SortDirection,
    },
    /// Lets the shell block navigation away from unsaved settings.
    SettingsDirtyChanged(bool),
}
