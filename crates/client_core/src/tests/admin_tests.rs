use super::*;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{
    domain::{AdminProfile, IdentityUser},
    service::MissingIdentityDirectory,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

#[derive(Default)]
struct FakeProfiles {
    admins: Vec<AdminProfile>,
    fail_reads: bool,
    fail_writes: bool,
    writes: Mutex<Vec<(UserId, Option<AdminRole>)>>,
}

#[async_trait]
impl ProfileStore for FakeProfiles {
    async fn admin_type(&self, user_id: &UserId) -> Result<Option<AdminRole>> {
        if self.fail_reads {
            return Err(anyhow!("profiles unavailable"));
        }
        self.admins
            .iter()
            .find(|profile| &profile.id == user_id)
            .map(|profile| profile.admin_type)
            .ok_or_else(|| anyhow!("no profile row for {user_id}"))
    }

    async fn list_admin_profiles(&self) -> Result<Vec<AdminProfile>> {
        if self.fail_reads {
            return Err(anyhow!("profiles unavailable"));
        }
        Ok(self
            .admins
            .iter()
            .filter(|profile| profile.admin_type.is_some())
            .cloned()
            .collect())
    }

    async fn set_admin_type(&self, user_id: &UserId, role: Option<AdminRole>) -> Result<()> {
        if self.fail_writes {
            return Err(anyhow!("permission denied"));
        }
        self.writes.lock().await.push((user_id.clone(), role));
        Ok(())
    }
}

#[derive(Default)]
struct FakeDirectory {
    users: Vec<IdentityUser>,
    calls: AtomicUsize,
    last_page_size: AtomicUsize,
}

#[async_trait]
impl IdentityDirectory for FakeDirectory {
    async fn list_users(&self, per_page: u32) -> Result<Vec<IdentityUser>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_page_size.store(per_page as usize, Ordering::SeqCst);
        Ok(self.users.clone())
    }
}

fn profile(id: &str, role: Option<AdminRole>, created_at: &str) -> AdminProfile {
    AdminProfile {
        id: UserId::new(id),
        admin_type: role,
        full_name: None,
        created_at: created_at.parse::<DateTime<Utc>>().expect("timestamp"),
    }
}

fn user(id: &str, email: Option<&str>) -> IdentityUser {
    IdentityUser {
        id: UserId::new(id),
        email: email.map(str::to_string),
    }
}

#[tokio::test]
async fn status_is_role_for_admin_and_none_otherwise() {
    let store = FakeProfiles {
        admins: vec![
            profile("u1", Some(AdminRole::Moderator), "2024-01-01T00:00:00Z"),
            profile("u2", None, "2024-01-01T00:00:00Z"),
        ],
        ..FakeProfiles::default()
    };

    assert_eq!(
        check_admin_status(&store, &UserId::new("u1")).await,
        Some(AdminRole::Moderator)
    );
    assert_eq!(check_admin_status(&store, &UserId::new("u2")).await, None);
    assert_eq!(check_admin_status(&store, &UserId::new("missing")).await, None);
}

#[tokio::test]
async fn status_is_none_when_lookup_fails() {
    let store = FakeProfiles {
        fail_reads: true,
        ..FakeProfiles::default()
    };
    assert_eq!(check_admin_status(&store, &UserId::new("u1")).await, None);
}

#[tokio::test]
async fn admins_are_joined_with_emails_newest_first() {
    let store = FakeProfiles {
        admins: vec![
            profile("old", Some(AdminRole::Admin), "2023-01-01T00:00:00Z"),
            profile("new", Some(AdminRole::SuperAdmin), "2024-01-01T00:00:00Z"),
            profile("plain", None, "2024-06-01T00:00:00Z"),
        ],
        ..FakeProfiles::default()
    };
    let directory = FakeDirectory {
        users: vec![user("old", Some("old@example.com")), user("new", Some(""))],
        ..FakeDirectory::default()
    };

    let admins = get_all_admins(&store, &directory, IDENTITY_PAGE_SIZE).await;
    let rows: Vec<(&str, Option<&str>)> = admins
        .iter()
        .map(|a| (a.profile.id.as_str(), a.email.as_deref()))
        .collect();
    assert_eq!(
        rows,
        vec![("new", Some("Unknown")), ("old", Some("old@example.com"))]
    );
    assert_eq!(directory.last_page_size.load(Ordering::SeqCst), 100);
}

#[tokio::test]
async fn identity_failure_returns_profiles_without_email() {
    let store = FakeProfiles {
        admins: vec![profile("u1", Some(AdminRole::Admin), "2024-01-01T00:00:00Z")],
        ..FakeProfiles::default()
    };

    let admins = get_all_admins(&store, &MissingIdentityDirectory, IDENTITY_PAGE_SIZE).await;
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].email, None);
    assert_eq!(admins[0].profile.admin_type, Some(AdminRole::Admin));
}

#[tokio::test]
async fn profile_failure_yields_empty_list() {
    let store = FakeProfiles {
        fail_reads: true,
        ..FakeProfiles::default()
    };
    let directory = FakeDirectory::default();

    assert!(get_all_admins(&store, &directory, IDENTITY_PAGE_SIZE)
        .await
        .is_empty());
    assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn directory_is_not_queried_without_admins() {
    let store = FakeProfiles {
        admins: vec![profile("u1", None, "2024-01-01T00:00:00Z")],
        ..FakeProfiles::default()
    };
    let directory = FakeDirectory::default();

    assert!(get_all_admins(&store, &directory, IDENTITY_PAGE_SIZE)
        .await
        .is_empty());
    assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn role_update_reports_outcome() {
    let store = FakeProfiles::default();
    assert!(update_admin_role(&store, &UserId::new("u1"), Some(AdminRole::Admin)).await);
    assert!(update_admin_role(&store, &UserId::new("u1"), None).await);
    assert_eq!(
        *store.writes.lock().await,
        vec![
            (UserId::new("u1"), Some(AdminRole::Admin)),
            (UserId::new("u1"), None)
        ]
    );

    let failing = FakeProfiles {
        fail_writes: true,
        ..FakeProfiles::default()
    };
    assert!(!update_admin_role(&failing, &UserId::new("u1"), Some(AdminRole::Admin)).await);
}
