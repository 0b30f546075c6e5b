use crate::config::Config;
use crate::store::{AdminStore, ClientStore, ManagerStore};
use crate::uploads::UploadDir;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub clients: Arc<dyn ClientStore>,
    pub managers: Arc<dyn ManagerStore>,
    pub admins: Arc<dyn AdminStore>,
    pub uploads: UploadDir,
    pub config: Config,
}
