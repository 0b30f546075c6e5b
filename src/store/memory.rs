//! In-process store used by the endpoint tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{AdminStore, ClientStore, ManagerStore, StoreResult};
use crate::models::{Admin, Client, ProjectManager};

#[derive(Default)]
pub struct MemoryStore {
    clients: Mutex<Vec<Client>>,
    managers: Mutex<Vec<ProjectManager>>,
    admins: Mutex<Vec<Admin>>,
    reject_client_inserts: AtomicBool,
}

impl MemoryStore {
    /// Makes every later `insert_client` fail like an unreachable database.
    pub fn reject_client_inserts(&self) {
        self.reject_client_inserts.store(true, Ordering::SeqCst);
    }
}

fn replace_by<T: Clone>(items: &mut [T], item: &T, same: impl Fn(&T) -> bool) -> bool {
    match items.iter_mut().find(|existing| same(existing)) {
        Some(slot) => {
            *slot = item.clone();
            true
        }
        None => false,
    }
}

fn remove_by<T>(items: &mut Vec<T>, same: impl Fn(&T) -> bool) -> bool {
    let before = items.len();
    items.retain(|existing| !same(existing));
    items.len() != before
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn insert_client(&self, client: &Client) -> StoreResult<()> {
        if self.reject_client_inserts.load(Ordering::SeqCst) {
            return Err(mongodb::error::Error::custom("insert rejected").into());
        }
        self.clients.lock().unwrap().push(client.clone());
        Ok(())
    }

    async fn find_client(&self, id: &str) -> StoreResult<Option<Client>> {
        Ok(self.clients.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn list_clients(&self) -> StoreResult<Vec<Client>> {
        Ok(self.clients.lock().unwrap().clone())
    }

    async fn replace_client(&self, client: &Client) -> StoreResult<bool> {
        let mut clients = self.clients.lock().unwrap();
        Ok(replace_by(&mut clients, client, |c| c.id == client.id))
    }

    async fn delete_client(&self, id: &str) -> StoreResult<bool> {
        Ok(remove_by(&mut self.clients.lock().unwrap(), |c| c.id == id))
    }
}

#[async_trait]
impl ManagerStore for MemoryStore {
    async fn insert_manager(&self, manager: &ProjectManager) -> StoreResult<()> {
        self.managers.lock().unwrap().push(manager.clone());
        Ok(())
    }

    async fn find_manager(&self, id: &str) -> StoreResult<Option<ProjectManager>> {
        Ok(self.managers.lock().unwrap().iter().find(|m| m.id == id).cloned())
    }

    async fn find_manager_by_email(&self, email: &str) -> StoreResult<Option<ProjectManager>> {
        Ok(self
            .managers
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.email == email)
            .cloned())
    }

    async fn find_managers(&self, ids: &[String]) -> StoreResult<Vec<ProjectManager>> {
        Ok(self
            .managers
            .lock()
            .unwrap()
            .iter()
            .filter(|m| ids.contains(&m.id))
            .cloned()
            .collect())
    }

    async fn list_managers(&self) -> StoreResult<Vec<ProjectManager>> {
        Ok(self.managers.lock().unwrap().clone())
    }

    async fn replace_manager(&self, manager: &ProjectManager) -> StoreResult<bool> {
        let mut managers = self.managers.lock().unwrap();
        Ok(replace_by(&mut managers, manager, |m| m.id == manager.id))
    }

    async fn delete_manager(&self, id: &str) -> StoreResult<bool> {
        Ok(remove_by(&mut self.managers.lock().unwrap(), |m| m.id == id))
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn insert_admin(&self, admin: &Admin) -> StoreResult<()> {
        self.admins.lock().unwrap().push(admin.clone());
        Ok(())
    }

    async fn find_admin_by_username(&self, username: &str) -> StoreResult<Option<Admin>> {
        Ok(self
            .admins
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }
}
