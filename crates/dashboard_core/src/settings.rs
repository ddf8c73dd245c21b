//! Settings page state: the committed settings document, one edit buffer,
//! per-partition key search, and the save lifecycle.
//!
//! Values are classified once when the document arrives (see
//! [`SettingValue::from_json`]). The document shape is fixed by the backend:
//! edits replace scalar values and never add or remove keys.

use std::collections::BTreeMap;
use std::fmt;

use dashboard_logging::{dash_debug, dash_info, dash_warn};
use serde_json::{Map, Value};

use crate::error::{EditorError, ViewError};
use crate::job_list::{FetchStatus, RequestSeq};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Partition {
    Client,
    Server,
}

impl Partition {
    pub const ALL: [Partition; 2] = [Partition::Client, Partition::Server];

    pub fn as_str(self) -> &'static str {
        match self {
            Partition::Client => "client",
            Partition::Server => "server",
        }
    }

    /// Server settings can be browsed but not edited from the dashboard.
    pub fn is_read_only(self) -> bool {
        matches!(self, Partition::Server)
    }

    fn index(self) -> usize {
        match self {
            Partition::Client => 0,
            Partition::Server => 1,
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Text(String),
    /// Edited as an exclusive true/false choice.
    Flag(bool),
    Section(SettingsTree),
}

impl SettingValue {
    /// Classifies a backend value. The strings `"true"` and `"false"` become
    /// flags, objects become sections, other scalars become text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(map) => SettingValue::Section(SettingsTree::from_json_object(map)),
            Value::Bool(flag) => SettingValue::Flag(*flag),
            Value::String(text) => SettingValue::from_text(text.clone()),
            Value::Null => SettingValue::Text(String::new()),
            other => SettingValue::Text(other.to_string()),
        }
    }

    pub fn from_text(text: String) -> Self {
        match text.as_str() {
            "true" => SettingValue::Flag(true),
            "false" => SettingValue::Flag(false),
            _ => SettingValue::Text(text),
        }
    }

    /// Flags travel as the strings `"true"`/`"false"`.
    pub fn to_json(&self) -> Value {
        match self {
            SettingValue::Text(text) => Value::String(text.clone()),
            SettingValue::Flag(flag) => Value::String(flag.to_string()),
            SettingValue::Section(tree) => tree.to_json(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, SettingValue::Section(_))
    }

    pub fn as_section(&self) -> Option<&SettingsTree> {
        match self {
            SettingValue::Section(tree) => Some(tree),
            _ => None,
        }
    }

    fn as_section_mut(&mut self) -> Option<&mut SettingsTree> {
        match self {
            SettingValue::Section(tree) => Some(tree),
            _ => None,
        }
    }

    /// Re-runs classification on text values, e.g. after a save turned a text
    /// field into `"true"`.
    fn reclassified(&self) -> Self {
        match self {
            SettingValue::Text(text) => SettingValue::from_text(text.clone()),
            SettingValue::Flag(flag) => SettingValue::Flag(*flag),
            SettingValue::Section(tree) => SettingValue::Section(
                tree.iter()
                    .map(|(key, value)| (key.to_string(), value.reclassified()))
                    .collect(),
            ),
        }
    }
}

/// Keys are kept sorted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsTree {
    entries: BTreeMap<String, SettingValue>,
}

impl SettingsTree {
    pub fn from_json_object(map: &Map<String, Value>) -> Self {
        map.iter()
            .map(|(key, value)| (key.clone(), SettingValue::from_json(value)))
            .collect()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.entries.get(key)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut SettingValue> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys containing `needle` (case-sensitive, raw key). Empty matches all.
    pub fn matching_keys(&self, needle: &str) -> Vec<&str> {
        self.keys().filter(|key| key.contains(needle)).collect()
    }

    /// Names of the nested sections directly under `key`.
    pub fn subsections(&self, key: &str) -> Vec<&str> {
        self.get(key)
            .and_then(SettingValue::as_section)
            .map(|section| {
                section
                    .iter()
                    .filter(|(_, value)| !value.is_scalar())
                    .map(|(name, _)| name)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replaces an existing key. Unknown keys are left out.
    fn replace(&mut self, key: &str, value: SettingValue) -> bool {
        match self.entries.get_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl FromIterator<(String, SettingValue)> for SettingsTree {
    fn from_iter<I: IntoIterator<Item = (String, SettingValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Both partitions as last fetched or saved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsDocument {
    client: SettingsTree,
    server: SettingsTree,
}

impl SettingsDocument {
    pub fn new(client: SettingsTree, server: SettingsTree) -> Self {
        Self { client, server }
    }

    /// Expects `{"client": {...}, "server": {...}}`.
    pub fn from_json(value: &Value) -> Result<Self, ViewError> {
        let object = value
            .as_object()
            .ok_or_else(|| ViewError::FetchFailed("settings payload is not an object".into()))?;
        let read = |partition: Partition| -> Result<SettingsTree, ViewError> {
            object
                .get(partition.as_str())
                .and_then(Value::as_object)
                .map(SettingsTree::from_json_object)
                .ok_or_else(|| {
                    ViewError::FetchFailed(format!("settings payload lacks the {partition} section"))
                })
        };
        Ok(Self {
            client: read(Partition::Client)?,
            server: read(Partition::Server)?,
        })
    }

    pub fn partition(&self, partition: Partition) -> &SettingsTree {
        match partition {
            Partition::Client => &self.client,
            Partition::Server => &self.server,
        }
    }

    fn partition_mut(&mut self, partition: Partition) -> &mut SettingsTree {
        match partition {
            Partition::Client => &mut self.client,
            Partition::Server => &mut self.server,
        }
    }
}

/// Location of a value inside an edit buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingPath {
    /// The buffer itself, when the selected key holds a plain value.
    Root,
    Key(String),
    Nested(String, String),
}

impl SettingPath {
    /// Parses dot-path text: `""`, `"key"` or `"parent.child"`. Keys that
    /// contain dots can only be addressed with the variants directly.
    pub fn parse(raw: &str) -> Result<Self, EditorError> {
        if raw.is_empty() {
            return Ok(SettingPath::Root);
        }
        let parts: Vec<&str> = raw.split('.').collect();
        match parts.as_slice() {
            [key] => Ok(SettingPath::Key((*key).to_string())),
            [parent, child] if !parent.is_empty() && !child.is_empty() => Ok(SettingPath::Nested(
                (*parent).to_string(),
                (*child).to_string(),
            )),
            _ => Err(EditorError::InvalidPath(raw.to_string())),
        }
    }
}

impl fmt::Display for SettingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingPath::Root => Ok(()),
            SettingPath::Key(key) => f.write_str(key),
            SettingPath::Nested(parent, child) => write!(f, "{parent}.{child}"),
        }
    }
}

/// Working copy of the value under one selected `(partition, key)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    partition: Partition,
    key: String,
    value: SettingValue,
    snapshot: SettingValue,
    dirty: bool,
}

impl EditBuffer {
    fn load(partition: Partition, key: &str, committed: &SettingValue) -> Self {
        Self {
            partition,
            key: key.to_string(),
            value: committed.clone(),
            snapshot: committed.clone(),
            dirty: false,
        }
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &SettingValue {
        &self.value
    }

    pub fn snapshot(&self) -> &SettingValue {
        &self.snapshot
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn is_bound_to(&self, partition: Partition, key: &str) -> bool {
        self.partition == partition && self.key == key
    }

    fn set_scalar(&mut self, path: &SettingPath, raw: &str) -> Result<(), EditorError> {
        let not_found = || EditorError::InvalidPath(path.to_string());
        let target = match path {
            SettingPath::Root => &mut self.value,
            SettingPath::Key(key) => self
                .value
                .as_section_mut()
                .and_then(|tree| tree.get_mut(key))
                .ok_or_else(not_found)?,
            SettingPath::Nested(parent, child) => self
                .value
                .as_section_mut()
                .and_then(|tree| tree.get_mut(parent))
                .and_then(SettingValue::as_section_mut)
                .and_then(|tree| tree.get_mut(child))
                .ok_or_else(not_found)?,
        };

        match target {
            SettingValue::Section(_) => return Err(EditorError::NotScalar(path.to_string())),
            SettingValue::Flag(flag) => {
                *flag = match raw {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(EditorError::NotBoolean {
                            path: path.to_string(),
                            value: raw.to_string(),
                        })
                    }
                };
            }
            SettingValue::Text(text) => *text = raw.to_string(),
        }
        self.dirty = true;
        Ok(())
    }

    fn restore(&mut self) {
        self.value = self.snapshot.clone();
        self.dirty = false;
    }
}

/// How to leave a dirty buffer when another key was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Save the buffer, then switch once the save succeeds.
    Persist,
    /// Drop the edits and switch now.
    Discard,
    /// Keep editing the current key.
    Stay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// A fresh buffer was loaded.
    Loaded,
    /// The key was already selected.
    Unchanged,
    /// The buffer is dirty; the selection waits for a [`Resolution`].
    NeedsResolution,
}

/// Save to issue: `{partition: {key: value}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistRequest {
    pub seq: RequestSeq,
    pub partition: Partition,
    pub key: String,
    pub value: SettingValue,
}

impl PersistRequest {
    pub fn payload(&self) -> Value {
        persist_payload(self.partition, &self.key, &self.value)
    }
}

/// Body of a settings save: `{partition: {key: value}}`.
pub fn persist_payload(partition: Partition, key: &str, value: &SettingValue) -> Value {
    let mut entry = Map::new();
    entry.insert(key.to_string(), value.to_json());
    let mut body = Map::new();
    body.insert(partition.as_str().to_string(), Value::Object(entry));
    Value::Object(body)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Stale,
    Saved,
    Failed,
}

/// Transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Saved,
    SaveFailed(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Saved => "Settings updated successfully",
            Notice::SaveFailed(_) => "Something went wrong and the settings could not be updated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingPersist {
    seq: RequestSeq,
    partition: Partition,
    key: String,
    value: SettingValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsEditor {
    document: Option<SettingsDocument>,
    status: FetchStatus,
    error: Option<ViewError>,
    filters: [String; 2],
    buffer: Option<EditBuffer>,
    in_flight: Option<PendingPersist>,
    parked: Option<(Partition, String)>,
    notice: Option<Notice>,
    next_seq: RequestSeq,
    latest_fetch: RequestSeq,
}

impl SettingsEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> Option<&SettingsDocument> {
        self.document.as_ref()
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn error(&self) -> Option<&ViewError> {
        self.error.as_ref()
    }

    pub fn buffer(&self) -> Option<&EditBuffer> {
        self.buffer.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Selection waiting for the user to resolve unsaved changes.
    pub fn parked(&self) -> Option<(Partition, &str)> {
        self.parked
            .as_ref()
            .map(|(partition, key)| (*partition, key.as_str()))
    }

    pub fn filter(&self, partition: Partition) -> &str {
        &self.filters[partition.index()]
    }

    pub fn is_dirty(&self) -> bool {
        self.buffer.as_ref().is_some_and(EditBuffer::is_dirty)
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    /// False while a save is pending, so the control is disabled rather than
    /// ignored.
    pub fn can_submit(&self) -> bool {
        self.buffer
            .as_ref()
            .is_some_and(|buffer| !buffer.partition.is_read_only())
            && self.in_flight.is_none()
    }

    /// Navigation away from the settings page is blocked while dirty.
    pub fn can_leave(&self) -> bool {
        !self.is_dirty()
    }

    pub fn request_settings(&mut self) -> RequestSeq {
        let seq = self.bump_seq();
        self.latest_fetch = seq;
        self.status = FetchStatus::Pending;
        self.error = None;
        seq
    }

    /// Replaces the whole document. Any buffer is dropped and the first
    /// client key is selected.
    pub fn apply_settings(
        &mut self,
        seq: RequestSeq,
        result: Result<SettingsDocument, ViewError>,
    ) -> bool {
        if seq != self.latest_fetch {
            dash_debug!(
                "discarding settings response seq={} (latest={})",
                seq,
                self.latest_fetch
            );
            return false;
        }
        match result {
            Ok(document) => {
                if self.is_dirty() {
                    dash_warn!("settings reloaded; unsaved edits were dropped");
                }
                self.buffer = None;
                self.parked = None;
                self.status = FetchStatus::Fulfilled;
                self.error = None;
                let first = document
                    .partition(Partition::Client)
                    .keys()
                    .next()
                    .map(str::to_string);
                self.document = Some(document);
                if let Some(key) = first {
                    self.load_buffer(Partition::Client, &key);
                }
            }
            Err(err) => {
                dash_warn!("settings fetch failed: {}", err);
                self.status = FetchStatus::Rejected;
                self.error = Some(err);
            }
        }
        true
    }

    pub fn select_key(
        &mut self,
        partition: Partition,
        key: &str,
    ) -> Result<SelectOutcome, EditorError> {
        let document = self.document.as_ref().ok_or(EditorError::Unloaded)?;
        if !document.partition(partition).contains_key(key) {
            return Err(EditorError::UnknownKey {
                partition,
                key: key.to_string(),
            });
        }
        if let Some(buffer) = &self.buffer {
            if buffer.is_bound_to(partition, key) {
                self.parked = None;
                return Ok(SelectOutcome::Unchanged);
            }
            if buffer.is_dirty() {
                self.parked = Some((partition, key.to_string()));
                return Ok(SelectOutcome::NeedsResolution);
            }
        }
        self.load_buffer(partition, key);
        Ok(SelectOutcome::Loaded)
    }

    /// Settles a parked selection. `Persist` returns the save to issue.
    pub fn resolve(&mut self, resolution: Resolution) -> Result<Option<PersistRequest>, EditorError> {
        let Some((partition, key)) = self.parked.clone() else {
            return Ok(None);
        };
        match resolution {
            Resolution::Persist => {
                if self.in_flight.is_some() {
                    // The parked key is applied when the pending save lands.
                    return Ok(None);
                }
                match self.submit() {
                    Ok(request) => Ok(Some(request)),
                    Err(err) => {
                        self.parked = None;
                        Err(err)
                    }
                }
            }
            Resolution::Discard => {
                if self.in_flight.is_some() {
                    return Err(EditorError::PersistInFlight);
                }
                self.parked = None;
                self.load_buffer(partition, &key);
                Ok(None)
            }
            Resolution::Stay => {
                self.parked = None;
                Ok(None)
            }
        }
    }

    /// Writes `value` at `path` inside the buffer.
    pub fn set_scalar(&mut self, path: &SettingPath, value: &str) -> Result<(), EditorError> {
        if self.in_flight.is_some() {
            return Err(EditorError::PersistInFlight);
        }
        let buffer = self.buffer.as_mut().ok_or(EditorError::NoSelection)?;
        if buffer.partition.is_read_only() {
            return Err(EditorError::ReadOnly(buffer.partition));
        }
        buffer.set_scalar(path, value)
    }

    /// Puts the buffer back to the value it had when selected (or last saved).
    pub fn cancel(&mut self) -> Result<(), EditorError> {
        if self.in_flight.is_some() {
            return Err(EditorError::PersistInFlight);
        }
        let buffer = self.buffer.as_mut().ok_or(EditorError::NoSelection)?;
        buffer.restore();
        self.parked = None;
        Ok(())
    }

    pub fn submit(&mut self) -> Result<PersistRequest, EditorError> {
        if self.in_flight.is_some() {
            return Err(EditorError::PersistInFlight);
        }
        let buffer = self.buffer.as_ref().ok_or(EditorError::NoSelection)?;
        if buffer.partition.is_read_only() {
            return Err(EditorError::ReadOnly(buffer.partition));
        }
        let (partition, key, value) = (buffer.partition, buffer.key.clone(), buffer.value.clone());
        let seq = self.bump_seq();
        self.in_flight = Some(PendingPersist {
            seq,
            partition,
            key: key.clone(),
            value: value.clone(),
        });
        self.notice = None;
        Ok(PersistRequest {
            seq,
            partition,
            key,
            value,
        })
    }

    pub fn apply_persisted(&mut self, seq: RequestSeq, result: Result<(), ViewError>) -> PersistOutcome {
        let pending = match self.in_flight.take() {
            Some(pending) if pending.seq == seq => pending,
            other => {
                self.in_flight = other;
                dash_debug!("discarding settings save response seq={}", seq);
                return PersistOutcome::Stale;
            }
        };

        match result {
            Ok(()) => {
                dash_info!("saved {}.{}", pending.partition, pending.key);
                let committed = pending.value.reclassified();
                if let Some(document) = self.document.as_mut() {
                    document
                        .partition_mut(pending.partition)
                        .replace(&pending.key, committed.clone());
                }
                if let Some(buffer) = self.buffer.as_mut() {
                    if buffer.is_bound_to(pending.partition, &pending.key) {
                        buffer.value = committed.clone();
                        buffer.snapshot = committed;
                        buffer.dirty = false;
                    }
                }
                self.notice = Some(Notice::Saved);
                if let Some((partition, key)) = self.parked.take() {
                    self.load_buffer(partition, &key);
                }
                PersistOutcome::Saved
            }
            Err(err) => {
                dash_warn!("saving {}.{} failed: {}", pending.partition, pending.key, err);
                self.notice = Some(Notice::SaveFailed(err.to_string()));
                self.parked = None;
                PersistOutcome::Failed
            }
        }
    }

    /// Filters `partition`'s top-level keys and returns the matches.
    pub fn search(&mut self, partition: Partition, needle: &str) -> Vec<String> {
        self.filters[partition.index()] = needle.to_string();
        self.visible_keys(partition)
    }

    pub fn clear_search(&mut self) {
        self.filters = Default::default();
    }

    /// Top-level keys of `partition` passing its current filter.
    pub fn visible_keys(&self, partition: Partition) -> Vec<String> {
        self.document
            .as_ref()
            .map(|document| {
                document
                    .partition(partition)
                    .matching_keys(self.filter(partition))
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn dismiss_notice(&mut self) -> bool {
        self.notice.take().is_some()
    }

    fn load_buffer(&mut self, partition: Partition, key: &str) {
        let Some(committed) = self
            .document
            .as_ref()
            .and_then(|document| document.partition(partition).get(key))
        else {
            return;
        };
        self.buffer = Some(EditBuffer::load(partition, key, committed));
    }

    fn bump_seq(&mut self) -> RequestSeq {
        self.next_seq += 1;
        self.next_seq
    }
}
