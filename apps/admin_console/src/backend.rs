use std::sync::Arc;

use anyhow::{Context, Result};
use client_core::SupabaseClient;
use shared::service::{
    IdentityDirectory, MissingIdentityDirectory, PortfolioCatalog, ProfileStore, ResourceService,
};
use storage::Storage;
use tracing::{info, warn};

use crate::config::{normalize_database_url, Settings};

/// The backend handles every command works against.
pub struct Backend {
    pub resources: Arc<dyn ResourceService>,
    pub profiles: Arc<dyn ProfileStore>,
    pub identities: Arc<dyn IdentityDirectory>,
    pub portfolios: Arc<dyn PortfolioCatalog>,
}

impl Backend {
    pub async fn connect(settings: &Settings) -> Result<Self> {
        match settings.supabase_config() {
            Some(config) => {
                let client = Arc::new(SupabaseClient::new(&config)?);
                info!(url = %client.base_url(), "using hosted backend");
                let identities: Arc<dyn IdentityDirectory> = if config.service_role_key.is_some() {
                    client.clone()
                } else {
                    warn!("no service role key configured; admin emails are unavailable");
                    Arc::new(MissingIdentityDirectory)
                };
                Ok(Self {
                    resources: client.clone(),
                    profiles: client.clone(),
                    identities,
                    portfolios: client,
                })
            }
            None => {
                let database_url = normalize_database_url(&settings.database_url);
                let storage = Arc::new(Storage::new(&database_url).await?);
                storage
                    .health_check()
                    .await
                    .with_context(|| format!("local database {database_url} is not usable"))?;
                info!(%database_url, "using local backend");
                Ok(Self::local(storage))
            }
        }
    }

    pub fn local(storage: Arc<Storage>) -> Self {
        Self {
            resources: storage.clone(),
            profiles: storage.clone(),
            identities: storage.clone(),
            portfolios: storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_settings(database_url: &str) -> Settings {
        Settings {
            database_url: database_url.to_string(),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn local_backend_connects_and_answers() {
        let backend = Backend::connect(&local_settings("sqlite::memory:"))
            .await
            .expect("connect");
        assert!(backend
            .resources
            .list_resources()
            .await
            .expect("list")
            .is_empty());
    }

    #[tokio::test]
    async fn unusable_local_database_fails_at_connect() {
        let blocker = std::env::temp_dir().join(format!(
            "admin_console_not_a_dir_{}",
            std::process::id()
        ));
        std::fs::write(&blocker, b"file").expect("blocker file");
        let database_url = format!(
            "sqlite://{}/console.db",
            blocker.to_string_lossy().replace('\\', "/")
        );

        let result = Backend::connect(&local_settings(&database_url)).await;
        assert!(result.is_err());

        std::fs::remove_file(&blocker).expect("cleanup");
    }

    #[tokio::test]
    async fn hosted_backend_without_service_key_has_no_identity_directory() {
        let settings = Settings {
            supabase_url: Some("http://127.0.0.1:9".into()),
            supabase_anon_key: Some("anon".into()),
            ..Settings::default()
        };
        let backend = Backend::connect(&settings).await.expect("connect");
        assert!(backend.identities.list_users(10).await.is_err());
    }
}
