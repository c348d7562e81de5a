use shared::{
    domain::{AdminRole, SessionUser},
    service::ProfileStore,
};
use tracing::{info, warn};

use crate::admin::check_admin_status;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminAccess {
    pub role: Option<AdminRole>,
}

impl AdminAccess {
    pub fn is_admin(&self) -> bool {
        self.role.is_some()
    }
}

/// Records that the admin console was reached and resolves the session's
/// role.
pub async fn enter_admin_console(store: &dyn ProfileStore, session: &SessionUser) -> AdminAccess {
    info!(
        email = session.email.as_deref().unwrap_or("<none>"),
        app_metadata = %session.app_metadata,
        "admin console accessed"
    );

    let role = match &session.id {
        Some(user_id) => check_admin_status(store, user_id).await,
        None => {
            warn!("admin console reached without a signed-in user");
            None
        }
    };
    AdminAccess { role }
}
