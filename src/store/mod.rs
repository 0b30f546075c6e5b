//! Data access. Handlers only see these traits; "not found" is `Ok(None)` or
//! `Ok(false)`, never an error.

pub mod mongo;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;

use crate::models::{Admin, Client, ProjectManager};

pub use mongo::MongoStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn insert_client(&self, client: &Client) -> StoreResult<()>;
    async fn find_client(&self, id: &str) -> StoreResult<Option<Client>>;
    async fn list_clients(&self) -> StoreResult<Vec<Client>>;
    /// Returns `false` when no client has `client.id`.
    async fn replace_client(&self, client: &Client) -> StoreResult<bool>;
    async fn delete_client(&self, id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait ManagerStore: Send + Sync {
    async fn insert_manager(&self, manager: &ProjectManager) -> StoreResult<()>;
    async fn find_manager(&self, id: &str) -> StoreResult<Option<ProjectManager>>;
    async fn find_manager_by_email(&self, email: &str) -> StoreResult<Option<ProjectManager>>;
    /// Managers whose id is in `ids`, in no particular order. Unknown ids are
    /// simply absent from the result.
    async fn find_managers(&self, ids: &[String]) -> StoreResult<Vec<ProjectManager>>;
    async fn list_managers(&self) -> StoreResult<Vec<ProjectManager>>;
    async fn replace_manager(&self, manager: &ProjectManager) -> StoreResult<bool>;
    async fn delete_manager(&self, id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn insert_admin(&self, admin: &Admin) -> StoreResult<()>;
    async fn find_admin_by_username(&self, username: &str) -> StoreResult<Option<Admin>>;
}
