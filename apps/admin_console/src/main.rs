use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod backend;
mod commands;
mod config;
mod render;

use backend::Backend;

const DEFAULT_LOG_FILTER: &str = "info";

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[derive(Parser, Debug)]
#[command(name = "admin_console", about = "Studio admin console")]
struct Cli {
    /// Local database to use when no hosted backend is configured.
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage education resources.
    #[command(subcommand)]
    Resources(ResourceCommand),
    /// Inspect and change admin roles.
    #[command(subcommand)]
    Admins(AdminCommand),
    /// List public artist portfolios.
    Portfolios {
        #[arg(long)]
        search: Option<String>,
    },
    /// Resolve the admin role for a signed-in session.
    Landing {
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ResourceCommand {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Create(NewResourceArgs),
    /// Edit a resource; omitted fields keep their current values.
    Edit {
        id: String,
        #[command(flatten)]
        changes: ResourceChanges,
    },
    Delete {
        id: String,
        /// Confirm the permanent deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
pub struct NewResourceArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long = "type", default_value = "article")]
    pub kind: String,
    #[arg(long, default_value = "")]
    pub category: String,
    #[arg(long, default_value = "")]
    pub author: String,
    #[arg(long)]
    pub external_url: Option<String>,
    #[arg(long)]
    pub image_url: Option<String>,
    #[arg(long)]
    pub published: bool,
}

#[derive(Args, Debug)]
pub struct ResourceChanges {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long = "type")]
    pub kind: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub external_url: Option<String>,
    #[arg(long)]
    pub image_url: Option<String>,
    #[arg(long)]
    pub published: Option<bool>,
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    List,
    Role {
        user_id: String,
    },
    /// Set a role (`super_admin`, `admin`, `moderator`) or `none` to revoke.
    SetRole {
        user_id: String,
        role: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = config::load_settings();
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }
    let backend = Backend::connect(&settings).await?;

    match cli.command {
        Command::Resources(ResourceCommand::List { search }) => {
            commands::list_resources(&backend, search).await
        }
        Command::Resources(ResourceCommand::Create(args)) => {
            commands::create_resource(&backend, args).await
        }
        Command::Resources(ResourceCommand::Edit { id, changes }) => {
            commands::edit_resource(&backend, &id, changes).await
        }
        Command::Resources(ResourceCommand::Delete { id, yes }) => {
            commands::delete_resource(&backend, &id, yes).await
        }
        Command::Admins(AdminCommand::List) => {
            commands::list_admins(&backend, settings.identity_page_size).await;
            Ok(())
        }
        Command::Admins(AdminCommand::Role { user_id }) => {
            commands::show_role(&backend, &user_id).await;
            Ok(())
        }
        Command::Admins(AdminCommand::SetRole { user_id, role }) => {
            commands::set_role(&backend, &user_id, &role).await
        }
        Command::Portfolios { search } => {
            commands::list_portfolios(&backend, search).await;
            Ok(())
        }
        Command::Landing { user_id, email } => {
            commands::landing(&backend, user_id, email).await;
            Ok(())
        }
    }
}
