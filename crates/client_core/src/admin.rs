use std::collections::HashMap;

use shared::{
    domain::{AdminRole, AdminSummary, UserId},
    service::{IdentityDirectory, ProfileStore},
};
use tracing::{error, info, warn};

/// Users requested from the identity directory when joining emails.
pub const IDENTITY_PAGE_SIZE: u32 = 100;
pub const UNKNOWN_EMAIL: &str = "Unknown";

/// Role of `user_id`, or `None` when the user is not an admin or the lookup
/// failed for any reason.
pub async fn check_admin_status(store: &dyn ProfileStore, user_id: &UserId) -> Option<AdminRole> {
    match store.admin_type(user_id).await {
        Ok(role) => role,
        Err(err) => {
            error!(user_id = %user_id, error = %err, "error checking admin status");
            None
        }
    }
}

/// Every profile with a role, newest first, joined with the identity
/// directory's emails.
///
/// A failed profile read yields an empty list. A failed identity listing
/// yields the profiles without any email. Users missing from the listing
/// are reported as [`UNKNOWN_EMAIL`].
pub async fn get_all_admins(
    store: &dyn ProfileStore,
    directory: &dyn IdentityDirectory,
    per_page: u32,
) -> Vec<AdminSummary> {
    let mut profiles = match store.list_admin_profiles().await {
        Ok(profiles) => profiles,
        Err(err) => {
            error!(error = %err, "error fetching admins");
            return Vec::new();
        }
    };
    if profiles.is_empty() {
        return Vec::new();
    }
    profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let users = match directory.list_users(per_page).await {
        Ok(users) => users,
        Err(err) => {
            warn!(error = %err, "error fetching user emails; listing admins without them");
            return profiles
                .into_iter()
                .map(|profile| AdminSummary {
                    profile,
                    email: None,
                })
                .collect();
        }
    };

    let emails: HashMap<&UserId, &str> = users
        .iter()
        .filter_map(|user| {
            user.email
                .as_deref()
                .filter(|email| !email.is_empty())
                .map(|email| (&user.id, email))
        })
        .collect();

    profiles
        .into_iter()
        .map(|profile| {
            let email = emails
                .get(&profile.id)
                .copied()
                .unwrap_or(UNKNOWN_EMAIL)
                .to_string();
            AdminSummary {
                profile,
                email: Some(email),
            }
        })
        .collect()
}

/// Sets or clears (`None`) the role of `user_id`. Returns whether the
/// backend accepted the change.
pub async fn update_admin_role(
    store: &dyn ProfileStore,
    user_id: &UserId,
    role: Option<AdminRole>,
) -> bool {
    match store.set_admin_type(user_id, role).await {
        Ok(()) => {
            info!(user_id = %user_id, role = ?role, "admin role updated");
            true
        }
        Err(err) => {
            error!(user_id = %user_id, error = %err, "error updating admin role");
            false
        }
    }
}

#[cfg(test)]
#[path = "tests/admin_tests.rs"]
mod tests;
