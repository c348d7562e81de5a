use std::sync::Arc;

use anyhow::Result;
use shared::{
    domain::{EducationResource, ResourceFields, ResourceId},
    service::ResourceService,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info};

use super::{
    events::{ListEvent, Notification},
    form::ResourceFormValues,
};

pub const CREATED_MESSAGE: &str = "Resource created successfully";
pub const UPDATED_MESSAGE: &str = "Resource updated successfully";
pub const DELETED_MESSAGE: &str = "Resource deleted successfully";
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save resource";
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete resource";
pub const EMPTY_LIST_MESSAGE: &str = "No resources found";

/// At most one of the editor or the delete confirmation is open.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ListModal {
    #[default]
    Closed,
    Create,
    Edit(EducationResource),
    ConfirmDelete(EducationResource),
}

#[derive(Debug, Default)]
struct ListState {
    resources: Vec<EducationResource>,
    loading: bool,
    search_query: String,
    modal: ListModal,
    is_submitting: bool,
    is_deleting: bool,
}

/// Point-in-time view of the list, with the search filter already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot {
    pub rows: Vec<EducationResource>,
    pub total: usize,
    pub loading: bool,
    pub search_query: String,
    pub modal: ListModal,
    pub is_submitting: bool,
    pub is_deleting: bool,
}

impl ListSnapshot {
    pub fn is_creating(&self) -> bool {
        self.modal == ListModal::Create
    }

    pub fn is_editing(&self) -> bool {
        self.selected_resource().is_some()
    }

    pub fn selected_resource(&self) -> Option<&EducationResource> {
        match &self.modal {
            ListModal::Edit(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn resource_to_delete(&self) -> Option<&EducationResource> {
        match &self.modal {
            ListModal::ConfirmDelete(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn can_clear_search(&self) -> bool {
        !self.search_query.is_empty()
    }

    pub fn empty_state(&self) -> Option<&'static str> {
        (!self.loading && self.rows.is_empty()).then_some(EMPTY_LIST_MESSAGE)
    }
}

pub fn delete_prompt(resource: &EducationResource) -> String {
    format!(
        "Are you sure you want to delete the resource \"{}\"? This action cannot be undone.",
        resource.title
    )
}

/// Case-insensitive substring match on title, description, category and
/// author. Input order is kept; an empty query matches everything.
pub fn filter_resources<'a>(
    resources: &'a [EducationResource],
    query: &str,
) -> Vec<&'a EducationResource> {
    let needle = query.to_lowercase();
    resources
        .iter()
        .filter(|resource| needle.is_empty() || matches_query(resource, &needle))
        .collect()
}

fn matches_query(resource: &EducationResource, needle: &str) -> bool {
    [
        resource.title.as_str(),
        resource.description.as_str(),
        resource.category.as_str(),
        resource.author.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

enum SaveTarget {
    Create,
    Update(ResourceId),
}

pub struct EducationListController {
    service: Arc<dyn ResourceService>,
    inner: Mutex<ListState>,
    events: broadcast::Sender<ListEvent>,
}

impl EducationListController {
    pub fn new(service: Arc<dyn ResourceService>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            service,
            inner: Mutex::new(ListState::default()),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ListEvent> {
        self.events.subscribe()
    }

    pub async fn set_loading(&self, loading: bool) {
        self.inner.lock().await.loading = loading;
    }

    /// Replaces the working record set and ends any loading phase.
    pub async fn set_resources(&self, resources: Vec<EducationResource>) {
        let mut state = self.inner.lock().await;
        state.resources = resources;
        state.loading = false;
    }

    pub async fn set_search_query(&self, query: impl Into<String>) {
        self.inner.lock().await.search_query = query.into();
    }

    pub async fn clear_search(&self) {
        self.inner.lock().await.search_query.clear();
    }

    pub async fn open_create(&self) {
        self.inner.lock().await.modal = ListModal::Create;
    }

    pub async fn open_edit(&self, resource: EducationResource) {
        self.inner.lock().await.modal = ListModal::Edit(resource);
    }

    pub async fn request_delete(&self, resource: EducationResource) {
        self.inner.lock().await.modal = ListModal::ConfirmDelete(resource);
    }

    pub async fn close_editor(&self) {
        let mut state = self.inner.lock().await;
        if matches!(state.modal, ListModal::Create | ListModal::Edit(_)) {
            state.modal = ListModal::Closed;
        }
    }

    pub async fn cancel_delete(&self) {
        let mut state = self.inner.lock().await;
        if matches!(state.modal, ListModal::ConfirmDelete(_)) {
            state.modal = ListModal::Closed;
        }
    }

    /// Initial editor contents: blank when creating, the record's values
    /// when editing, `None` when no editor is open.
    pub async fn form_defaults(&self) -> Option<ResourceFormValues> {
        match &self.inner.lock().await.modal {
            ListModal::Create => Some(ResourceFormValues::default()),
            ListModal::Edit(resource) => Some(ResourceFormValues::from_resource(resource)),
            ListModal::Closed | ListModal::ConfirmDelete(_) => None,
        }
    }

    pub async fn snapshot(&self) -> ListSnapshot {
        let state = self.inner.lock().await;
        ListSnapshot {
            rows: filter_resources(&state.resources, &state.search_query)
                .into_iter()
                .cloned()
                .collect(),
            total: state.resources.len(),
            loading: state.loading,
            search_query: state.search_query.clone(),
            modal: state.modal.clone(),
            is_submitting: state.is_submitting,
            is_deleting: state.is_deleting,
        }
    }

    /// Saves the editor contents: an update when a record is selected for
    /// editing, otherwise a create. Returns whether the backend accepted it.
    pub async fn submit_form(&self, values: ResourceFormValues) -> bool {
        let target = {
            let mut state = self.inner.lock().await;
            state.is_submitting = true;
            match &state.modal {
                ListModal::Edit(resource) => SaveTarget::Update(resource.id.clone()),
                _ => SaveTarget::Create,
            }
        };

        let fields = values.into_fields();
        let outcome = self.save(&target, &fields).await;

        let mut state = self.inner.lock().await;
        state.is_submitting = false;
        match outcome {
            Ok(()) => {
                let message = match &target {
                    SaveTarget::Create => {
                        if state.modal == ListModal::Create {
                            state.modal = ListModal::Closed;
                        }
                        CREATED_MESSAGE
                    }
                    SaveTarget::Update(id) => {
                        if matches!(&state.modal, ListModal::Edit(r) if &r.id == id) {
                            state.modal = ListModal::Closed;
                        }
                        UPDATED_MESSAGE
                    }
                };
                drop(state);
                info!(title = %fields.title, "{message}");
                self.emit(ListEvent::Notify(Notification::success(message)));
                self.emit(ListEvent::RefetchRequested);
                true
            }
            Err(err) => {
                drop(state);
                error!(error = %err, title = %fields.title, "error saving resource");
                self.emit(ListEvent::Notify(Notification::failure(
                    SAVE_FAILED_MESSAGE,
                    err.to_string(),
                )));
                false
            }
        }
    }

    /// Deletes the record awaiting confirmation. The confirmation closes
    /// whatever the outcome; returns `false` without a backend call when
    /// nothing is pending.
    pub async fn confirm_delete(&self) -> bool {
        let id = {
            let mut state = self.inner.lock().await;
            let ListModal::ConfirmDelete(resource) = &state.modal else {
                return false;
            };
            let id = resource.id.clone();
            state.is_deleting = true;
            id
        };

        let outcome = self.remove(&id).await;

        {
            let mut state = self.inner.lock().await;
            state.is_deleting = false;
            if matches!(&state.modal, ListModal::ConfirmDelete(r) if r.id == id) {
                state.modal = ListModal::Closed;
            }
        }

        match outcome {
            Ok(()) => {
                info!(resource_id = %id, "{DELETED_MESSAGE}");
                self.emit(ListEvent::Notify(Notification::success(DELETED_MESSAGE)));
                self.emit(ListEvent::RefetchRequested);
                true
            }
            Err(err) => {
                error!(resource_id = %id, error = %err, "error deleting resource");
                self.emit(ListEvent::Notify(Notification::failure(
                    DELETE_FAILED_MESSAGE,
                    err.to_string(),
                )));
                false
            }
        }
    }

    async fn save(&self, target: &SaveTarget, fields: &ResourceFields) -> Result<()> {
        let envelope = match target {
            SaveTarget::Create => self.service.create_resource(fields).await?,
            SaveTarget::Update(id) => self.service.update_resource(id, fields).await?,
        };
        envelope.into_result()?;
        Ok(())
    }

    async fn remove(&self, id: &ResourceId) -> Result<()> {
        self.service.delete_resource(id).await?.into_result()?;
        Ok(())
    }

    fn emit(&self, event: ListEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "../tests/education_tests.rs"]
mod tests;
