use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{options::ClientOptions, Client as MongoClient, Collection, Database};

use super::{AdminStore, ClientStore, ManagerStore, StoreResult};
use crate::models::{Admin, Client, ProjectManager};

const CLIENTS: &str = "clients";
const MANAGERS: &str = "projectmanagers";
const ADMINS: &str = "admins";

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, db_name: &str) -> StoreResult<Self> {
        let client_options = ClientOptions::parse(uri).await?;
        let client = MongoClient::with_options(client_options)?;
        Ok(MongoStore {
            db: client.database(db_name),
        })
    }

    fn clients(&self) -> Collection<Client> {
        self.db.collection(CLIENTS)
    }

    fn managers(&self) -> Collection<ProjectManager> {
        self.db.collection(MANAGERS)
    }

    fn admins(&self) -> Collection<Admin> {
        self.db.collection(ADMINS)
    }
}

#[async_trait]
impl ClientStore for MongoStore {
    async fn insert_client(&self, client: &Client) -> StoreResult<()> {
        self.clients().insert_one(client).await?;
        Ok(())
    }

    async fn find_client(&self, id: &str) -> StoreResult<Option<Client>> {
        Ok(self.clients().find_one(doc! { "_id": id }).await?)
    }

    async fn list_clients(&self) -> StoreResult<Vec<Client>> {
        let cursor = self.clients().find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn replace_client(&self, client: &Client) -> StoreResult<bool> {
        let res = self
            .clients()
            .replace_one(doc! { "_id": client.id.as_str() }, client)
            .await?;
        Ok(res.matched_count == 1)
    }

    async fn delete_client(&self, id: &str) -> StoreResult<bool> {
        let res = self.clients().delete_one(doc! { "_id": id }).await?;
        Ok(res.deleted_count == 1)
    }
}

#[async_trait]
impl ManagerStore for MongoStore {
    async fn insert_manager(&self, manager: &ProjectManager) -> StoreResult<()> {
        self.managers().insert_one(manager).await?;
        Ok(())
    }

    async fn find_manager(&self, id: &str) -> StoreResult<Option<ProjectManager>> {
        Ok(self.managers().find_one(doc! { "_id": id }).await?)
    }

    async fn find_manager_by_email(&self, email: &str) -> StoreResult<Option<ProjectManager>> {
        Ok(self.managers().find_one(doc! { "email": email }).await?)
    }

    async fn find_managers(&self, ids: &[String]) -> StoreResult<Vec<ProjectManager>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = ids.to_vec();
        let cursor = self.managers().find(doc! { "_id": { "$in": ids } }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list_managers(&self) -> StoreResult<Vec<ProjectManager>> {
        let cursor = self.managers().find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn replace_manager(&self, manager: &ProjectManager) -> StoreResult<bool> {
        let res = self
            .managers()
            .replace_one(doc! { "_id": manager.id.as_str() }, manager)
            .await?;
        Ok(res.matched_count == 1)
    }

    async fn delete_manager(&self, id: &str) -> StoreResult<bool> {
        let res = self.managers().delete_one(doc! { "_id": id }).await?;
        Ok(res.deleted_count == 1)
    }
}

#[async_trait]
impl AdminStore for MongoStore {
    async fn insert_admin(&self, admin: &Admin) -> StoreResult<()> {
        self.admins().insert_one(admin).await?;
        Ok(())
    }

    async fn find_admin_by_username(&self, username: &str) -> StoreResult<Option<Admin>> {
        Ok(self.admins().find_one(doc! { "username": username }).await?)
    }
}
