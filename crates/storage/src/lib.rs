use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, warn};
use uuid::Uuid;

use shared::{
    domain::{
        AdminProfile, AdminRole, ArtistProfile, EducationResource, IdentityUser, Portfolio,
        PortfolioId, PortfolioWithArtist, ResourceFields, ResourceId, ResourceKind, UserId,
    },
    error::ErrorCode,
    protocol::Envelope,
    service::{IdentityDirectory, PortfolioCatalog, ProfileStore, ResourceService},
};

const RESOURCE_COLUMNS: &str = "id, title, description, type, category, author, external_url, image_url, is_published, created_at, updated_at";

/// SQLite-backed stand-in for the hosted backend, used for local
/// development and by the seeding tool.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: Option<&'a str>,
    pub full_name: Option<&'a str>,
    pub username: Option<&'a str>,
    pub admin_type: Option<AdminRole>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPortfolio<'a> {
    pub owner: &'a UserId,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to an in-memory database opens a fresh one.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Creates the identity row and its profile in one transaction.
    pub async fn create_user(&self, user: NewUser<'_>) -> Result<UserId> {
        let user_id = UserId(Uuid::new_v4().to_string());
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO identity_users (id, email, created_at) VALUES (?, ?, ?)")
            .bind(user_id.as_str())
            .bind(user.email)
            .bind(user.created_at)
            .execute(&mut *tx)
            .await
            .context("failed to insert identity user")?;
        sqlx::query(
            "INSERT INTO profiles (id, admin_type, full_name, username, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id.as_str())
        .bind(user.admin_type.map(|role| role.as_str()))
        .bind(user.full_name)
        .bind(user.username)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await
        .context("failed to insert profile")?;
        tx.commit().await?;
        Ok(user_id)
    }

    pub async fn create_portfolio(&self, portfolio: NewPortfolio<'_>) -> Result<PortfolioId> {
        let portfolio_id = PortfolioId(Uuid::new_v4().to_string());
        sqlx::query(
            "INSERT INTO portfolios (id, user_id, name, description, is_public, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(portfolio_id.as_str())
        .bind(portfolio.owner.as_str())
        .bind(portfolio.name)
        .bind(portfolio.description)
        .bind(portfolio.is_public)
        .bind(portfolio.created_at)
        .execute(&self.pool)
        .await
        .context("failed to insert portfolio")?;
        Ok(portfolio_id)
    }

    pub async fn insert_resource(
        &self,
        fields: &ResourceFields,
        created_at: DateTime<Utc>,
    ) -> Result<EducationResource, sqlx::Error> {
        let row = sqlx::query(&format!(
            "INSERT INTO education_resources (id, title, description, type, category, author, external_url, image_url, is_published, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {RESOURCE_COLUMNS}"
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(fields.title.as_str())
        .bind(fields.description.as_str())
        .bind(fields.kind.as_str())
        .bind(fields.category.as_str())
        .bind(fields.author.as_str())
        .bind(fields.external_url.as_deref())
        .bind(fields.image_url.as_deref())
        .bind(fields.is_published)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;
        resource_from_row(&row)
    }

    pub async fn update_resource_row(
        &self,
        id: &ResourceId,
        fields: &ResourceFields,
    ) -> Result<Option<EducationResource>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "UPDATE education_resources
             SET title = ?, description = ?, type = ?, category = ?, author = ?,
                 external_url = ?, image_url = ?, is_published = ?, updated_at = ?
             WHERE id = ?
             RETURNING {RESOURCE_COLUMNS}"
        ))
        .bind(fields.title.as_str())
        .bind(fields.description.as_str())
        .bind(fields.kind.as_str())
        .bind(fields.category.as_str())
        .bind(fields.author.as_str())
        .bind(fields.external_url.as_deref())
        .bind(fields.image_url.as_deref())
        .bind(fields.is_published)
        .bind(Utc::now())
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(resource_from_row).transpose()
    }

    pub async fn delete_resource_row(&self, id: &ResourceId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM education_resources WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[cfg(test)]
    async fn load_resource(&self, id: &ResourceId) -> Result<Option<EducationResource>> {
        let row = sqlx::query(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM education_resources WHERE id = ?"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(resource_from_row).transpose()?)
    }
}

fn resource_from_row(row: &SqliteRow) -> Result<EducationResource, sqlx::Error> {
    Ok(EducationResource {
        id: ResourceId(row.try_get("id")?),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        kind: ResourceKind::from(row.try_get::<String, _>("type")?),
        category: row.try_get("category")?,
        author: row.try_get("author")?,
        external_url: row.try_get("external_url")?,
        image_url: row.try_get("image_url")?,
        is_published: row.try_get("is_published")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn parse_admin_type(raw: Option<String>) -> Result<Option<AdminRole>> {
    raw.map(|value| value.parse::<AdminRole>().map_err(anyhow::Error::from))
        .transpose()
}

/// Turns constraint violations into rejected envelopes; anything else is a
/// backend failure.
fn rejection<T>(err: sqlx::Error) -> Result<Envelope<T>> {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_check_violation() {
            return Ok(Envelope::rejected(
                ErrorCode::Validation,
                db_err.message().to_string(),
            ));
        }
        if db_err.is_unique_violation() {
            return Ok(Envelope::rejected(
                ErrorCode::Conflict,
                db_err.message().to_string(),
            ));
        }
    }
    Err(err.into())
}

#[async_trait]
impl ResourceService for Storage {
    async fn list_resources(&self) -> Result<Vec<EducationResource>> {
        let rows = sqlx::query(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM education_resources ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| resource_from_row(row).map_err(anyhow::Error::from))
            .collect()
    }

    async fn create_resource(
        &self,
        fields: &ResourceFields,
    ) -> Result<Envelope<EducationResource>> {
        match self.insert_resource(fields, Utc::now()).await {
            Ok(resource) => {
                debug!(resource_id = %resource.id, "stored education resource");
                Ok(Envelope::ok(resource))
            }
            Err(err) => rejection(err),
        }
    }

    async fn update_resource(
        &self,
        id: &ResourceId,
        fields: &ResourceFields,
    ) -> Result<Envelope<EducationResource>> {
        match self.update_resource_row(id, fields).await {
            Ok(Some(resource)) => Ok(Envelope::ok(resource)),
            Ok(None) => Ok(Envelope::rejected(
                ErrorCode::NotFound,
                format!("education resource {id} not found"),
            )),
            Err(err) => rejection(err),
        }
    }

    async fn delete_resource(&self, id: &ResourceId) -> Result<Envelope<()>> {
        match self.delete_resource_row(id).await {
            Ok(true) => Ok(Envelope::empty()),
            Ok(false) => Ok(Envelope::rejected(
                ErrorCode::NotFound,
                format!("education resource {id} not found"),
            )),
            Err(err) => rejection(err),
        }
    }
}

#[async_trait]
impl ProfileStore for Storage {
    async fn admin_type(&self, user_id: &UserId) -> Result<Option<AdminRole>> {
        let row = sqlx::query("SELECT admin_type FROM profiles WHERE id = ?")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| anyhow!("profile {user_id} not found"))?;
        parse_admin_type(row.try_get("admin_type")?)
    }

    async fn list_admin_profiles(&self) -> Result<Vec<AdminProfile>> {
        let rows = sqlx::query(
            "SELECT id, admin_type, full_name, created_at
             FROM profiles
             WHERE admin_type IS NOT NULL
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| -> Result<AdminProfile> {
                Ok(AdminProfile {
                    id: UserId(r.try_get("id")?),
                    admin_type: parse_admin_type(r.try_get("admin_type")?)?,
                    full_name: r.try_get("full_name")?,
                    created_at: r.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn set_admin_type(&self, user_id: &UserId, role: Option<AdminRole>) -> Result<()> {
        let result = sqlx::query("UPDATE profiles SET admin_type = ? WHERE id = ?")
            .bind(role.map(|r| r.as_str()))
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            warn!(user_id = %user_id, "admin role update matched no profile");
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityDirectory for Storage {
    async fn list_users(&self, per_page: u32) -> Result<Vec<IdentityUser>> {
        let rows = sqlx::query("SELECT id, email FROM identity_users ORDER BY created_at ASC LIMIT ?")
            .bind(per_page)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| IdentityUser {
                id: UserId(r.get::<String, _>(0)),
                email: r.get::<Option<String>, _>(1),
            })
            .collect())
    }
}

#[async_trait]
impl PortfolioCatalog for Storage {
    async fn list_public_portfolios(&self) -> Result<Vec<PortfolioWithArtist>> {
        let rows = sqlx::query(
            "SELECT p.id, p.user_id, p.name, p.description, p.is_public, p.created_at,
                    pr.id AS profile_id, pr.full_name, pr.username, pr.avatar_url, pr.bio,
                    pr.instagram_url, pr.twitter_url, pr.website_url
             FROM portfolios p
             LEFT JOIN profiles pr ON pr.id = p.user_id
             WHERE p.is_public = 1
             ORDER BY p.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| -> Result<PortfolioWithArtist> {
                let artist = match r.try_get::<Option<String>, _>("profile_id")? {
                    Some(_) => Some(ArtistProfile {
                        full_name: r.try_get("full_name")?,
                        username: r.try_get("username")?,
                        avatar_url: r.try_get("avatar_url")?,
                        bio: r.try_get("bio")?,
                        instagram_url: r.try_get("instagram_url")?,
                        twitter_url: r.try_get("twitter_url")?,
                        website_url: r.try_get("website_url")?,
                    }),
                    None => None,
                };
                Ok(PortfolioWithArtist {
                    portfolio: Portfolio {
                        id: PortfolioId(r.try_get("id")?),
                        user_id: UserId(r.try_get("user_id")?),
                        name: r.try_get("name")?,
                        description: r.try_get("description")?,
                        is_public: r.try_get("is_public")?,
                        created_at: r.try_get("created_at")?,
                    },
                    artist,
                })
            })
            .collect()
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
