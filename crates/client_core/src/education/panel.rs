use std::sync::Arc;

use anyhow::Result;
use shared::service::ResourceService;
use tokio::sync::{broadcast::error::TryRecvError, broadcast::Receiver, Mutex};
use tracing::{error, warn};

use super::{
    controller::EducationListController,
    events::{ListEvent, Notification},
};

/// Owns the record list for an [`EducationListController`]: loads it and
/// answers the controller's refetch requests.
pub struct EducationPanel {
    service: Arc<dyn ResourceService>,
    controller: EducationListController,
    events: Mutex<Receiver<ListEvent>>,
}

impl EducationPanel {
    pub fn new(service: Arc<dyn ResourceService>) -> Self {
        let controller = EducationListController::new(Arc::clone(&service));
        let events = controller.subscribe_events();
        Self {
            service,
            controller,
            events: Mutex::new(events),
        }
    }

    pub fn controller(&self) -> &EducationListController {
        &self.controller
    }

    pub async fn refetch(&self) -> Result<()> {
        self.controller.set_loading(true).await;
        match self.service.list_resources().await {
            Ok(resources) => {
                self.controller.set_resources(resources).await;
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "error fetching education resources");
                self.controller.set_loading(false).await;
                Err(err)
            }
        }
    }

    /// Drains pending controller events, refetching once if any of them
    /// asked for it, and hands back the notifications in arrival order.
    pub async fn settle(&self) -> Vec<Notification> {
        let mut notifications = Vec::new();
        let mut refetch = false;
        {
            let mut events = self.events.lock().await;
            loop {
                match events.try_recv() {
                    Ok(ListEvent::Notify(notification)) => notifications.push(notification),
                    Ok(ListEvent::RefetchRequested) => refetch = true,
                    Err(TryRecvError::Lagged(skipped)) => {
                        warn!(skipped, "list events lagged; refetching");
                        refetch = true;
                    }
                    Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                }
            }
        }

        if refetch {
            if let Err(err) = self.refetch().await {
                warn!(error = %err, "refetch after mutation failed");
            }
        }
        notifications
    }
}
