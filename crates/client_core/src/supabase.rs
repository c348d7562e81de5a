use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use shared::{
    domain::{
        AdminProfile, AdminRole, EducationResource, IdentityUser, PortfolioWithArtist,
        ResourceFields, ResourceId, UserId,
    },
    error::ErrorCode,
    protocol::Envelope,
    service::{IdentityDirectory, PortfolioCatalog, ProfileStore, ResourceService},
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

const RESOURCES_TABLE: &str = "education_resources";
const PROFILES_TABLE: &str = "profiles";
const PORTFOLIOS_TABLE: &str = "portfolios";
const ADMIN_PROFILE_COLUMNS: &str = "id,admin_type,full_name,created_at";
const PORTFOLIO_WITH_ARTIST_SELECT: &str = "*,profiles:user_id(full_name,username,avatar_url,bio,instagram_url,twitter_url,website_url)";
const SINGLE_OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    /// Needed for the auth admin endpoints; falls back to `anon_key` for
    /// everything else when absent.
    pub service_role_key: Option<String>,
}

#[derive(Debug, Error)]
pub enum SupabaseConfigError {
    #[error("invalid supabase url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("supabase api key must not be empty")]
    MissingApiKey,
}

/// HTTP client for the hosted backend's REST (PostgREST) and auth-admin APIs.
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdminTypeRow {
    admin_type: Option<AdminRole>,
}

#[derive(Debug, Serialize)]
struct AdminTypePatch {
    admin_type: Option<AdminRole>,
}

#[derive(Debug, Deserialize)]
struct ListUsersResponse {
    #[serde(default)]
    users: Vec<IdentityUser>,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Result<Self, SupabaseConfigError> {
        let api_key = config
            .service_role_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .unwrap_or(config.anon_key.as_str())
            .trim()
            .to_string();
        if api_key.is_empty() {
            return Err(SupabaseConfigError::MissingApiKey);
        }

        let mut raw = config.url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw).map_err(|source| SupabaseConfigError::InvalidUrl {
            url: config.url.clone(),
            source,
        })?;

        Ok(Self {
            http: Client::new(),
            base_url,
            api_key,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("failed to build endpoint url for '{path}'"))
    }

    fn table(&self, table: &str) -> Result<Url> {
        self.endpoint(&format!("rest/v1/{table}"))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Sends a mutation and classifies the answer. Only failures to obtain
    /// an answer are returned as `Err`.
    async fn mutation<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Envelope<Vec<T>>> {
        let response = request
            .header("Prefer", RETURN_REPRESENTATION)
            .send()
            .await
            .context("backend request failed")?;

        let status = response.status();
        if status.is_success() {
            return Ok(Envelope::ok(decode_rows(response).await?));
        }

        let body = response.text().await.unwrap_or_default();
        let detail: PostgrestError = serde_json::from_str(&body).unwrap_or_default();
        let message = detail
            .message
            .or(detail.details)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("backend responded with {status}"));
        warn!(status = status.as_u16(), %message, "backend rejected mutation");
        Ok(Envelope::rejected(
            ErrorCode::from_http_status(status.as_u16()),
            message,
        ))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let response = self
            .request(Method::GET, self.table(table)?)
            .query(query)
            .send()
            .await
            .with_context(|| format!("failed to query {table}"))?
            .error_for_status()?;
        decode_rows(response).await
    }
}

async fn decode_rows<T: DeserializeOwned>(response: Response) -> Result<Vec<T>> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(&bytes).context("failed to decode backend rows")
}

fn eq_filter(value: &str) -> String {
    format!("eq.{value}")
}

/// Picks the single row a keyed mutation is expected to touch.
fn single_row<T>(envelope: Envelope<Vec<T>>, id: &ResourceId) -> Envelope<T> {
    match envelope {
        Envelope::Success(rows) => match rows.and_then(|rows| rows.into_iter().next()) {
            Some(row) => Envelope::ok(row),
            None => Envelope::rejected(
                ErrorCode::NotFound,
                format!("education resource {id} not found"),
            ),
        },
        Envelope::Failure(err) => Envelope::Failure(err),
    }
}

#[async_trait]
impl ResourceService for SupabaseClient {
    async fn list_resources(&self) -> Result<Vec<EducationResource>> {
        self.select(
            RESOURCES_TABLE,
            &[
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn create_resource(
        &self,
        fields: &ResourceFields,
    ) -> Result<Envelope<EducationResource>> {
        let request = self
            .request(Method::POST, self.table(RESOURCES_TABLE)?)
            .json(fields);
        let envelope = self.mutation::<EducationResource>(request).await?;
        Ok(match envelope {
            Envelope::Success(rows) => {
                Envelope::Success(rows.and_then(|rows| rows.into_iter().next()))
            }
            Envelope::Failure(err) => Envelope::Failure(err),
        })
    }

    async fn update_resource(
        &self,
        id: &ResourceId,
        fields: &ResourceFields,
    ) -> Result<Envelope<EducationResource>> {
        let request = self
            .request(Method::PATCH, self.table(RESOURCES_TABLE)?)
            .query(&[("id", eq_filter(id.as_str()))])
            .json(fields);
        let envelope = self.mutation::<EducationResource>(request).await?;
        Ok(single_row(envelope, id))
    }

    async fn delete_resource(&self, id: &ResourceId) -> Result<Envelope<()>> {
        let request = self
            .request(Method::DELETE, self.table(RESOURCES_TABLE)?)
            .query(&[("id", eq_filter(id.as_str()))]);
        let envelope = self.mutation::<serde_json::Value>(request).await?;
        Ok(single_row(envelope, id).map(|_| ()))
    }
}

#[async_trait]
impl ProfileStore for SupabaseClient {
    async fn admin_type(&self, user_id: &UserId) -> Result<Option<AdminRole>> {
        let row: AdminTypeRow = self
            .request(Method::GET, self.table(PROFILES_TABLE)?)
            .header(header::ACCEPT, SINGLE_OBJECT_MEDIA_TYPE)
            .query(&[
                ("select", "admin_type".to_string()),
                ("id", eq_filter(user_id.as_str())),
            ])
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("no single profile row for user {user_id}"))?
            .json()
            .await?;
        Ok(row.admin_type)
    }

    async fn list_admin_profiles(&self) -> Result<Vec<AdminProfile>> {
        self.select(
            PROFILES_TABLE,
            &[
                ("select", ADMIN_PROFILE_COLUMNS.to_string()),
                ("admin_type", "not.is.null".to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn set_admin_type(&self, user_id: &UserId, role: Option<AdminRole>) -> Result<()> {
        self.request(Method::PATCH, self.table(PROFILES_TABLE)?)
            .query(&[("id", eq_filter(user_id.as_str()))])
            .json(&AdminTypePatch { admin_type: role })
            .send()
            .await?
            .error_for_status()?;
        debug!(user_id = %user_id, role = ?role, "admin role patched");
        Ok(())
    }
}

#[async_trait]
impl IdentityDirectory for SupabaseClient {
    async fn list_users(&self, per_page: u32) -> Result<Vec<IdentityUser>> {
        let response: ListUsersResponse = self
            .request(Method::GET, self.endpoint("auth/v1/admin/users")?)
            .query(&[("per_page", per_page)])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| anyhow!("identity listing failed: {e}"))?
            .json()
            .await?;
        Ok(response.users)
    }
}

#[async_trait]
impl PortfolioCatalog for SupabaseClient {
    async fn list_public_portfolios(&self) -> Result<Vec<PortfolioWithArtist>> {
        self.select(
            PORTFOLIOS_TABLE,
            &[
                ("select", PORTFOLIO_WITH_ARTIST_SELECT.to_string()),
                ("is_public", "eq.true".to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }
}

#[cfg(test)]
#[path = "tests/supabase_tests.rs"]
mod tests;
