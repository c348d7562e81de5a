use std::sync::Arc;

use chrono::Utc;
use client_core::{
    admin::{get_all_admins, update_admin_role, IDENTITY_PAGE_SIZE},
    education::{EducationPanel, NotificationLevel, ResourceFormValues},
    enter_admin_console,
    portfolio::PortfolioGallery,
};
use shared::domain::{AdminRole, ResourceKind, SessionUser};
use storage::{NewPortfolio, NewUser, Storage};

fn guide(title: &str) -> ResourceFormValues {
    ResourceFormValues {
        title: title.to_string(),
        description: "Healing timeline and cleaning routine".to_string(),
        kind: ResourceKind::Guide,
        category: "Aftercare".to_string(),
        author: "Sam Rivera".to_string(),
        ..ResourceFormValues::default()
    }
}

#[tokio::test]
async fn editor_round_trip_against_local_backend() {
    let storage = Arc::new(Storage::new("sqlite::memory:").await.expect("db"));
    let panel = EducationPanel::new(storage.clone());
    panel.refetch().await.expect("initial load");
    assert_eq!(
        panel.controller().snapshot().await.empty_state(),
        Some("No resources found")
    );

    panel.controller().open_create().await;
    assert!(panel.controller().submit_form(guide("Intro to Tattoo Care")).await);
    panel.settle().await;

    let snapshot = panel.controller().snapshot().await;
    assert_eq!(snapshot.rows.len(), 1);
    let created = snapshot.rows[0].clone();

    panel.controller().open_edit(created.clone()).await;
    let mut values = panel.controller().form_defaults().await.expect("editor");
    values.is_published = true;
    assert!(panel.controller().submit_form(values).await);
    panel.settle().await;
    let snapshot = panel.controller().snapshot().await;
    assert!(snapshot.rows[0].is_published);
    assert!(snapshot.rows[0].updated_at.is_some());

    panel.controller().request_delete(created).await;
    assert!(panel.controller().confirm_delete().await);
    panel.settle().await;
    assert!(panel.controller().snapshot().await.rows.is_empty());
}

#[tokio::test]
async fn unknown_type_is_refused_and_editor_stays_open() {
    let storage = Arc::new(Storage::new("sqlite::memory:").await.expect("db"));
    let panel = EducationPanel::new(storage);

    let mut values = guide("Podcast episode");
    values.kind = ResourceKind::Other("podcast".into());
    panel.controller().open_create().await;
    assert!(!panel.controller().submit_form(values).await);

    let notes = panel.settle().await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Error);
    assert!(panel.controller().snapshot().await.is_creating());
}

#[tokio::test]
async fn admin_listing_and_landing_against_local_backend() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let owner = storage
        .create_user(NewUser {
            email: Some("owner@example.com"),
            full_name: Some("Studio Owner"),
            username: None,
            admin_type: Some(AdminRole::SuperAdmin),
            created_at: Utc::now(),
        })
        .await
        .expect("owner");
    let artist = storage
        .create_user(NewUser {
            email: Some("artist@example.com"),
            full_name: Some("Ink Artist"),
            username: Some("ink"),
            admin_type: None,
            created_at: Utc::now(),
        })
        .await
        .expect("artist");

    let access = enter_admin_console(
        &storage,
        &SessionUser {
            id: Some(owner.clone()),
            email: Some("owner@example.com".into()),
            app_metadata: serde_json::json!({}),
        },
    )
    .await;
    assert_eq!(access.role, Some(AdminRole::SuperAdmin));

    assert!(update_admin_role(&storage, &artist, Some(AdminRole::Moderator)).await);
    let admins = get_all_admins(&storage, &storage, IDENTITY_PAGE_SIZE).await;
    let emails: Vec<Option<&str>> = admins.iter().map(|a| a.email.as_deref()).collect();
    assert_eq!(admins.len(), 2);
    assert!(emails.contains(&Some("artist@example.com")));
    assert!(emails.contains(&Some("owner@example.com")));

    storage
        .create_portfolio(NewPortfolio {
            owner: &artist,
            name: "Blackwork",
            description: None,
            is_public: true,
            created_at: Utc::now(),
        })
        .await
        .expect("portfolio");
    let gallery = PortfolioGallery::new(Arc::new(storage));
    gallery.load().await;
    gallery.set_search_query("ink artist").await;
    assert_eq!(gallery.snapshot().await.rows.len(), 1);
}
