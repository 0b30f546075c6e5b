use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectManager {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Unique across managers; checked before insert and update.
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateManagerRequest {
    #[validate(length(min = 3, max = 20))]
    pub name: String,
    #[validate(email, length(min = 3, max = 40))]
    pub email: String,
    #[validate(length(min = 3, max = 20))]
    pub phone: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateManagerRequest {
    #[validate(length(min = 3, max = 20))]
    pub name: Option<String>,
    #[validate(email, length(min = 3, max = 40))]
    pub email: Option<String>,
    #[validate(length(min = 3, max = 20))]
    pub phone: Option<String>,
}

impl UpdateManagerRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none()
    }

    /// Copies the present fields onto `manager` and bumps `updated_at`.
    pub fn apply(self, manager: &mut ProjectManager, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            manager.name = name;
        }
        if let Some(email) = self.email {
            manager.email = email;
        }
        if let Some(phone) = self.phone {
            manager.phone = phone;
        }
        manager.updated_at = now;
    }
}
