use anyhow::{anyhow, bail, Context, Result};
use client_core::{
    admin::{check_admin_status, get_all_admins, update_admin_role},
    education::{delete_prompt, EducationPanel, ResourceFormValues},
    enter_admin_console,
    portfolio::PortfolioGallery,
};
use shared::domain::{AdminRole, EducationResource, ResourceKind, SessionUser, UserId};

use crate::{backend::Backend, render, NewResourceArgs, ResourceChanges};

async fn loaded_panel(backend: &Backend) -> Result<EducationPanel> {
    let panel = EducationPanel::new(backend.resources.clone());
    panel.refetch().await?;
    Ok(panel)
}

async fn find_resource(panel: &EducationPanel, id: &str) -> Result<EducationResource> {
    panel
        .controller()
        .snapshot()
        .await
        .rows
        .into_iter()
        .find(|resource| resource.id.as_str() == id)
        .ok_or_else(|| anyhow!("no education resource with id {id}"))
}

/// Prints the outcome of a mutation and, when it went through, the
/// refreshed list.
async fn finish_mutation(panel: &EducationPanel, accepted: bool) -> Result<()> {
    let notifications = panel.settle().await;
    render::print_notifications(&notifications);
    if !accepted {
        bail!("the backend did not accept the change");
    }
    render::print_resources(&panel.controller().snapshot().await);
    Ok(())
}

pub async fn list_resources(backend: &Backend, search: Option<String>) -> Result<()> {
    let panel = loaded_panel(backend).await?;
    if let Some(query) = search {
        panel.controller().set_search_query(query).await;
    }
    render::print_resources(&panel.controller().snapshot().await);
    Ok(())
}

pub async fn create_resource(backend: &Backend, args: NewResourceArgs) -> Result<()> {
    let panel = EducationPanel::new(backend.resources.clone());
    let controller = panel.controller();
    controller.open_create().await;

    let mut values = controller
        .form_defaults()
        .await
        .context("editor did not open")?;
    values.title = args.title;
    values.description = args.description;
    values.kind = ResourceKind::from(args.kind);
    values.category = args.category;
    values.author = args.author;
    values.external_url = args.external_url.unwrap_or_default();
    values.image_url = args.image_url.unwrap_or_default();
    values.is_published = args.published;

    let accepted = controller.submit_form(values).await;
    finish_mutation(&panel, accepted).await
}

fn apply_changes(values: &mut ResourceFormValues, changes: ResourceChanges) {
    if let Some(title) = changes.title {
        values.title = title;
    }
    if let Some(description) = changes.description {
        values.description = description;
    }
    if let Some(kind) = changes.kind {
        values.kind = ResourceKind::from(kind);
    }
    if let Some(category) = changes.category {
        values.category = category;
    }
    if let Some(author) = changes.author {
        values.author = author;
    }
    if let Some(external_url) = changes.external_url {
        values.external_url = external_url;
    }
    if let Some(image_url) = changes.image_url {
        values.image_url = image_url;
    }
    if let Some(published) = changes.published {
        values.is_published = published;
    }
}

pub async fn edit_resource(backend: &Backend, id: &str, changes: ResourceChanges) -> Result<()> {
    let panel = loaded_panel(backend).await?;
    let resource = find_resource(&panel, id).await?;
    let controller = panel.controller();
    controller.open_edit(resource).await;

    let mut values = controller
        .form_defaults()
        .await
        .context("editor did not open")?;
    apply_changes(&mut values, changes);

    let accepted = controller.submit_form(values).await;
    finish_mutation(&panel, accepted).await
}

pub async fn delete_resource(backend: &Backend, id: &str, confirmed: bool) -> Result<()> {
    let panel = loaded_panel(backend).await?;
    let resource = find_resource(&panel, id).await?;
    if !confirmed {
        println!("{}", delete_prompt(&resource));
        bail!("pass --yes to delete");
    }

    let controller = panel.controller();
    controller.request_delete(resource).await;
    let accepted = controller.confirm_delete().await;
    finish_mutation(&panel, accepted).await
}

pub async fn list_admins(backend: &Backend, per_page: u32) {
    let admins = get_all_admins(
        backend.profiles.as_ref(),
        backend.identities.as_ref(),
        per_page,
    )
    .await;
    render::print_admins(&admins);
}

pub async fn show_role(backend: &Backend, user_id: &str) {
    let role = check_admin_status(backend.profiles.as_ref(), &UserId::new(user_id)).await;
    println!("{}", role.map(|role| role.as_str()).unwrap_or("none"));
}

fn parse_role(raw: &str) -> Result<Option<AdminRole>> {
    if raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    Ok(Some(raw.parse::<AdminRole>()?))
}

pub async fn set_role(backend: &Backend, user_id: &str, role: &str) -> Result<()> {
    let role = parse_role(role)?;
    if !update_admin_role(backend.profiles.as_ref(), &UserId::new(user_id), role).await {
        bail!("failed to update admin role for {user_id}");
    }
    println!("Admin role updated");
    Ok(())
}

pub async fn list_portfolios(backend: &Backend, search: Option<String>) {
    let gallery = PortfolioGallery::new(backend.portfolios.clone());
    gallery.load().await;
    if let Some(query) = search {
        gallery.set_search_query(query).await;
    }
    render::print_gallery(&gallery.snapshot().await);
}

pub async fn landing(backend: &Backend, user_id: Option<String>, email: Option<String>) {
    let session = SessionUser {
        id: user_id.map(UserId::new),
        email,
        app_metadata: serde_json::Value::Null,
    };
    let access = enter_admin_console(backend.profiles.as_ref(), &session).await;
    match access.role {
        Some(role) => println!("Welcome to the admin console ({})", role.as_str()),
        None => println!("Access denied: not an admin"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use shared::service::ResourceService;
    use storage::{NewUser, Storage};

    async fn local_backend() -> (Backend, Arc<Storage>) {
        let storage = Arc::new(Storage::new("sqlite::memory:").await.expect("db"));
        (Backend::local(storage.clone()), storage)
    }

    #[test]
    fn parses_roles_and_none() {
        assert_eq!(parse_role("none").expect("none"), None);
        assert_eq!(
            parse_role("Moderator").expect("role"),
            Some(AdminRole::Moderator)
        );
        assert!(parse_role("owner").is_err());
    }

    #[test]
    fn changes_only_touch_given_fields() {
        let mut values = ResourceFormValues {
            title: "Intro".into(),
            author: "Sam".into(),
            external_url: "https://example.com".into(),
            ..ResourceFormValues::default()
        };
        apply_changes(
            &mut values,
            ResourceChanges {
                title: Some("Intro, revised".into()),
                description: None,
                kind: Some("video".into()),
                category: None,
                author: None,
                external_url: Some(String::new()),
                image_url: None,
                published: Some(true),
            },
        );
        assert_eq!(values.title, "Intro, revised");
        assert_eq!(values.author, "Sam");
        assert_eq!(values.kind, ResourceKind::Video);
        assert_eq!(values.external_url, "");
        assert!(values.is_published);
    }

    #[tokio::test]
    async fn create_then_edit_then_delete_locally() {
        let (backend, _storage) = local_backend().await;
        create_resource(
            &backend,
            NewResourceArgs {
                title: "Intro to Tattoo Care".into(),
                description: "Aftercare basics".into(),
                kind: "guide".into(),
                category: "Aftercare".into(),
                author: "Sam".into(),
                external_url: None,
                image_url: None,
                published: false,
            },
        )
        .await
        .expect("create");

        let resources = backend.resources.list_resources().await.expect("list");
        let id = resources[0].id.to_string();
        edit_resource(
            &backend,
            &id,
            ResourceChanges {
                title: None,
                description: None,
                kind: None,
                category: None,
                author: None,
                external_url: None,
                image_url: None,
                published: Some(true),
            },
        )
        .await
        .expect("edit");
        assert!(backend.resources.list_resources().await.expect("list")[0].is_published);

        assert!(delete_resource(&backend, &id, false).await.is_err());
        delete_resource(&backend, &id, true).await.expect("delete");
        assert!(backend
            .resources
            .list_resources()
            .await
            .expect("list")
            .is_empty());
    }

    #[tokio::test]
    async fn rejected_type_fails_the_command() {
        let (backend, _storage) = local_backend().await;
        let result = create_resource(
            &backend,
            NewResourceArgs {
                title: "Podcast".into(),
                description: String::new(),
                kind: "podcast".into(),
                category: String::new(),
                author: String::new(),
                external_url: None,
                image_url: None,
                published: false,
            },
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn set_role_round_trips_through_local_backend() {
        let (backend, storage) = local_backend().await;
        let user = storage
            .create_user(NewUser {
                email: Some("ada@example.com"),
                full_name: Some("Ada"),
                username: None,
                admin_type: None,
                created_at: Utc::now(),
            })
            .await
            .expect("user");

        set_role(&backend, user.as_str(), "admin")
            .await
            .expect("set role");
        assert_eq!(
            check_admin_status(backend.profiles.as_ref(), &user).await,
            Some(AdminRole::Admin)
        );
        assert!(set_role(&backend, user.as_str(), "owner").await.is_err());
    }

    #[tokio::test]
    async fn editing_unknown_id_fails() {
        let (backend, _storage) = local_backend().await;
        let changes = ResourceChanges {
            title: Some("x".into()),
            description: None,
            kind: None,
            category: None,
            author: None,
            external_url: None,
            image_url: None,
            published: None,
        };
        assert!(edit_resource(&backend, "missing", changes).await.is_err());
    }
}
