pub mod admin;
pub mod client;
pub mod dates;
pub mod project_manager;

pub use admin::{Admin, LoginRequest, PublicAdmin, RegisterRequest};
pub use client::{Client, ClientInput, PopulatedClient, StoredFile};
pub use project_manager::{CreateManagerRequest, ProjectManager, UpdateManagerRequest};
