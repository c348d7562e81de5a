//! Admin list/editor for education resources: filtering, modal state,
//! busy flags and the create/edit/delete flows.

mod controller;
pub mod events;
mod form;
mod panel;

pub use controller::{
    delete_prompt, filter_resources, EducationListController, ListModal, ListSnapshot,
};
pub use events::{ListEvent, Notification, NotificationLevel};
pub use form::ResourceFormValues;
pub use panel::EducationPanel;
