use thiserror::Error;

use crate::settings::Partition;

/// Failure of an asynchronous operation, as seen by a view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    /// The context identifier could not be resolved. Terminal for the view.
    #[error("not found: {0}")]
    NotFound(String),
    /// Transient fetch failure; retried by re-issuing the triggering action.
    #[error("fetch failed: {0}")]
    FetchFailed(String),
    /// The backend refused or failed to store an edit.
    #[error("persist failed: {0}")]
    PersistFailed(String),
}

/// Editor operation rejected without touching state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("settings have not been loaded")]
    Unloaded,
    #[error("no settings key is selected")]
    NoSelection,
    #[error("unknown key {key:?} in the {partition} settings")]
    UnknownKey { partition: Partition, key: String },
    #[error("invalid settings path {0:?}")]
    InvalidPath(String),
    #[error("{0:?} is a section, not a value")]
    NotScalar(String),
    #[error("{path:?} only accepts \"true\" or \"false\", got {value:?}")]
    NotBoolean { path: String, value: String },
    #[error("the {0} settings are read-only")]
    ReadOnly(Partition),
    #[error("a save is already in progress")]
    PersistInFlight,
}
