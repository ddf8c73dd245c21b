use crate::view_model::{job_list_view, settings_view, AppViewModel};
use crate::{JobListView, SettingsEditor};

/// State of one dashboard session: the job drawer and the settings page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    jobs: JobListView,
    settings: SettingsEditor,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> &JobListView {
        &self.jobs
    }

    pub fn settings(&self) -> &SettingsEditor {
        &self.settings
    }

    pub(crate) fn jobs_mut(&mut self) -> &mut JobListView {
        &mut self.jobs
    }

    pub(crate) fn settings_mut(&mut self) -> &mut SettingsEditor {
        &mut self.settings
    }

    /// False while the settings form holds unsaved edits.
    pub fn can_leave_settings(&self) -> bool {
        self.settings.can_leave()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            jobs: job_list_view(&self.jobs),
            settings: settings_view(&self.settings),
            dirty: self.dirty,
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether a render is due and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
