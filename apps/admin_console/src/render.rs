use client_core::{
    education::{ListSnapshot, Notification, NotificationLevel},
    portfolio::{portfolio_link, GallerySnapshot},
};
use shared::domain::AdminSummary;

pub fn print_notifications(notifications: &[Notification]) {
    for notification in notifications {
        match (notification.level, &notification.detail) {
            (NotificationLevel::Success, _) => println!("{}", notification.message),
            (NotificationLevel::Error, Some(detail)) => {
                eprintln!("{}: {detail}", notification.message)
            }
            (NotificationLevel::Error, None) => eprintln!("{}", notification.message),
        }
    }
}

pub fn print_resources(snapshot: &ListSnapshot) {
    if let Some(message) = snapshot.empty_state() {
        println!("{message}");
        return;
    }

    println!(
        "{:<38} {:<32} {:<8} {:<16} {:<20} {:<9} Created",
        "Id", "Title", "Type", "Category", "Author", "Status"
    );
    for resource in &snapshot.rows {
        println!(
            "{:<38} {:<32} {:<8} {:<16} {:<20} {:<9} {}",
            resource.id.as_str(),
            resource.title,
            resource.kind.label(),
            resource.category,
            resource.author,
            resource.status_label(),
            resource.readable_created_at()
        );
    }
    if snapshot.rows.len() != snapshot.total {
        println!("({} of {} resources)", snapshot.rows.len(), snapshot.total);
    }
}

pub fn print_admins(admins: &[AdminSummary]) {
    if admins.is_empty() {
        println!("No admins found");
        return;
    }
    for admin in admins {
        println!(
            "{:<38} {:<12} {:<24} {}",
            admin.profile.id.as_str(),
            admin
                .profile
                .admin_type
                .map(|role| role.as_str())
                .unwrap_or("-"),
            admin.profile.full_name.as_deref().unwrap_or("-"),
            admin.email.as_deref().unwrap_or("-")
        );
    }
}

pub fn print_gallery(snapshot: &GallerySnapshot) {
    if let Some(empty) = snapshot.empty_state() {
        println!("{}\n{}", empty.title, empty.hint);
        return;
    }
    for entry in &snapshot.rows {
        let artist = entry
            .artist
            .as_ref()
            .and_then(|artist| artist.full_name.as_deref())
            .unwrap_or("Unknown artist");
        println!(
            "{:<32} {:<24} {}",
            entry.portfolio.name,
            artist,
            portfolio_link(&entry.portfolio.id)
        );
        if let Some(description) = &entry.portfolio.description {
            println!("    {description}");
        }
    }
}
