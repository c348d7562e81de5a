use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use shared::domain::{AdminRole, ResourceFields, ResourceKind, UserId};
use storage::{NewPortfolio, NewUser, Storage};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/console.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CreateUser {
        email: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        username: Option<String>,
        /// `super_admin`, `admin` or `moderator`.
        #[arg(long)]
        role: Option<String>,
    },
    CreateResource {
        title: String,
        #[arg(long = "type", default_value = "article")]
        kind: String,
        #[arg(long, default_value = "General")]
        category: String,
        #[arg(long, default_value = "Studio")]
        author: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        published: bool,
    },
    CreatePortfolio {
        owner_user_id: String,
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        private: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::CreateUser {
            email,
            full_name,
            username,
            role,
        } => {
            let admin_type = role.as_deref().map(str::parse::<AdminRole>).transpose()?;
            let user_id = storage
                .create_user(NewUser {
                    email: Some(&email),
                    full_name: full_name.as_deref(),
                    username: username.as_deref(),
                    admin_type,
                    created_at: Utc::now(),
                })
                .await?;
            println!("created user_id={user_id}");
        }
        Command::CreateResource {
            title,
            kind,
            category,
            author,
            description,
            published,
        } => {
            let fields = ResourceFields {
                title,
                description,
                kind: ResourceKind::from(kind),
                category,
                author,
                external_url: None,
                image_url: None,
                is_published: published,
            };
            let resource = storage.insert_resource(&fields, Utc::now()).await?;
            println!("created resource_id={}", resource.id);
        }
        Command::CreatePortfolio {
            owner_user_id,
            name,
            description,
            private,
        } => {
            let owner = UserId::new(owner_user_id);
            let portfolio_id = storage
                .create_portfolio(NewPortfolio {
                    owner: &owner,
                    name: &name,
                    description: description.as_deref(),
                    is_public: !private,
                    created_at: Utc::now(),
                })
                .await?;
            println!("created portfolio_id={portfolio_id}");
        }
    }

    Ok(())
}
