use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::{
    domain::{
        AdminProfile, AdminRole, EducationResource, IdentityUser, PortfolioWithArtist,
        ResourceFields, ResourceId, UserId,
    },
    protocol::Envelope,
};

/// Remote collection of education resources.
///
/// `Err` means the request never produced an answer (connection, decoding);
/// a backend that answered but refused the mutation returns
/// `Envelope::Failure`.
#[async_trait]
pub trait ResourceService: Send + Sync {
    async fn list_resources(&self) -> Result<Vec<EducationResource>>;
    async fn create_resource(&self, fields: &ResourceFields)
        -> Result<Envelope<EducationResource>>;
    async fn update_resource(
        &self,
        id: &ResourceId,
        fields: &ResourceFields,
    ) -> Result<Envelope<EducationResource>>;
    async fn delete_resource(&self, id: &ResourceId) -> Result<Envelope<()>>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fails when no profile row exists for `user_id`.
    async fn admin_type(&self, user_id: &UserId) -> Result<Option<AdminRole>>;
    /// Profiles with a non-null role, newest first.
    async fn list_admin_profiles(&self) -> Result<Vec<AdminProfile>>;
    async fn set_admin_type(&self, user_id: &UserId, role: Option<AdminRole>) -> Result<()>;
}

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn list_users(&self, per_page: u32) -> Result<Vec<IdentityUser>>;
}

#[async_trait]
pub trait PortfolioCatalog: Send + Sync {
    async fn list_public_portfolios(&self) -> Result<Vec<PortfolioWithArtist>>;
}

pub struct MissingIdentityDirectory;

#[async_trait]
impl IdentityDirectory for MissingIdentityDirectory {
    async fn list_users(&self, _per_page: u32) -> Result<Vec<IdentityUser>> {
        Err(anyhow!("identity directory is unavailable"))
    }
}
