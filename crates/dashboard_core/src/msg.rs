use crate::{
    JobDetail, JobRow, ListContext, Partition, RequestSeq, Resolution, SettingPath, SettingsDocument,
    SortKey, ViewError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Job drawer opened for a workflow node.
    JobListOpened(ListContext),
    /// Job drawer closed.
    JobListClosed,
    /// User clicked a sortable column header.
    SortClicked(SortKey),
    /// User clicked a job row.
    RowClicked(String),
    /// User ticked or unticked a job row.
    RowChecked(String),
    /// User asked to reload a list that failed to load.
    JobListRetryClicked,
    /// Backend answer for a job list fetch.
    JobsLoaded {
        seq: RequestSeq,
        result: Result<Vec<JobRow>, ViewError>,
    },
    /// Backend answer for a job detail fetch.
    JobDetailLoaded {
        seq: RequestSeq,
        result: Result<JobDetail, ViewError>,
    },
    /// Settings page shown (or reloaded).
    SettingsOpened,
    /// Backend answer for the settings fetch.
    SettingsLoaded {
        seq: RequestSeq,
        result: Result<SettingsDocument, ViewError>,
    },
    /// User picked a top-level settings key.
    SettingsKeySelected { partition: Partition, key: String },
    /// User changed a value in the settings form.
    SettingEdited { path: SettingPath, value: String },
    /// User clicked Cancel on the settings form.
    SettingsCancelClicked,
    /// User clicked Save on the settings form.
    SettingsSaveClicked,
    /// User answered the unsaved-changes prompt.
    UnsavedChangesResolved(Resolution),
    /// Backend answer for a settings save.
    SettingsSaved {
        seq: RequestSeq,
        result: Result<(), ViewError>,
    },
    /// User typed in the settings search box.
    SettingsSearchChanged { partition: Partition, query: String },
    /// User cleared the settings search box.
    SettingsSearchCleared,
    /// User closed the notification.
    NoticeDismissed,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
