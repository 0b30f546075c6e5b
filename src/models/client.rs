use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

use super::dates;
use super::project_manager::ProjectManager;
use crate::payment::{payment_status, PaymentStatus};

/// Top-level client fields a partial update may touch. Everything else
/// (`_id`, `files`, `payment`, timestamps) is owned by the server.
pub const EDITABLE_FIELDS: &[&str] = &[
    "clientDetails",
    "projectDetails",
    "AMC",
    "domain",
    "hosting",
    "socials",
    "status",
    "pricing",
    "paid",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ClientDetails {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetails {
    #[validate(length(min = 1, message = "projectName is required"))]
    pub project_name: String,
    /// Ids of [`ProjectManager`] records. Not owned by the client.
    pub project_managers: Vec<String>,
    #[serde(deserialize_with = "dates::deserialize")]
    pub project_start_date: DateTime<Utc>,
    #[serde(deserialize_with = "dates::deserialize")]
    pub project_expected_delivery_date: DateTime<Utc>,
    #[serde(deserialize_with = "dates::deserialize")]
    pub project_delivery_date: DateTime<Utc>,
}

/// Annual maintenance contract window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amc {
    #[serde(default, deserialize_with = "dates::deserialize_opt")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "dates::deserialize_opt")]
    pub end_date: Option<DateTime<Utc>>,
}

/// Registrar or hosting-panel login plus the registration window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "must be a valid email"))]
    pub id: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    #[serde(deserialize_with = "dates::deserialize")]
    pub start_date: DateTime<Utc>,
    #[serde(deserialize_with = "dates::deserialize")]
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialAccount {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OtherSocial {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub account: SocialAccount,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Socials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<SocialAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<SocialAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<SocialAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<SocialAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<OtherSocial>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub base_price: f64,
    #[serde(default)]
    pub additional_costs: f64,
    #[serde(default)]
    pub partial_paid: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Cancelled,
}

/// An uploaded attachment. `path` is relative to the server root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    pub filename: String,
    pub path: String,
}

/// A client record as stored in the `clients` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(rename = "_id")]
    pub id: String,
    #[validate(nested)]
    pub client_details: ClientDetails,
    #[validate(nested)]
    pub project_details: ProjectDetails,
    #[serde(rename = "AMC", default, skip_serializing_if = "Option::is_none")]
    pub amc: Option<Amc>,
    #[validate(nested)]
    pub domain: ServiceAccount,
    #[validate(nested)]
    pub hosting: ServiceAccount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socials: Option<Socials>,
    #[serde(default)]
    pub files: Vec<StoredFile>,
    #[serde(default)]
    pub status: ClientStatus,
    pub pricing: Pricing,
    /// Legacy flag kept alongside the derived `payment` label.
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub payment: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The `clientData` part of an intake request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClientInput {
    #[validate(nested)]
    pub client_details: ClientDetails,
    #[validate(nested)]
    pub project_details: ProjectDetails,
    #[serde(rename = "AMC", default)]
    pub amc: Option<Amc>,
    #[validate(nested)]
    pub domain: ServiceAccount,
    #[validate(nested)]
    pub hosting: ServiceAccount,
    #[serde(default)]
    pub socials: Option<Socials>,
    pub pricing: Pricing,
    #[serde(default)]
    pub status: Option<ClientStatus>,
    #[serde(default)]
    pub paid: Option<bool>,
}

impl ClientInput {
    pub fn into_client(self, files: Vec<StoredFile>, now: DateTime<Utc>) -> Client {
        let mut client = Client {
            id: Uuid::new_v4().to_string(),
            client_details: self.client_details,
            project_details: self.project_details,
            amc: self.amc,
            domain: self.domain,
            hosting: self.hosting,
            socials: self.socials,
            files,
            status: self.status.unwrap_or_default(),
            pricing: self.pricing,
            paid: self.paid.unwrap_or(false),
            payment: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        client.refresh_payment();
        client
    }
}

impl Client {
    pub fn refresh_payment(&mut self) {
        self.payment = payment_status(&self.pricing);
    }

    /// Applies `$set`-style updates. Keys are top-level field names or dotted
    /// paths into them; keys outside [`EDITABLE_FIELDS`] are skipped and
    /// returned so the caller can log them.
    pub fn merge_patch(
        &self,
        patch: &Map<String, Value>,
    ) -> Result<(Client, Vec<String>), serde_json::Error> {
        let mut merged = serde_json::to_value(self)?;
        let mut skipped = Vec::new();

        for (key, value) in patch {
            let path: Vec<&str> = key.split('.').collect();
            if path.iter().any(|segment| segment.is_empty())
                || !EDITABLE_FIELDS.contains(&path[0])
            {
                skipped.push(key.clone());
                continue;
            }
            set_path(&mut merged, &path, value.clone());
        }

        Ok((serde_json::from_value(merged)?, skipped))
    }

    /// Resolves manager ids into full records. Ids with no matching manager
    /// are dropped.
    pub fn populate(self, managers: &HashMap<String, ProjectManager>) -> PopulatedClient {
        let details = self.project_details;
        PopulatedClient {
            id: self.id,
            client_details: self.client_details,
            project_details: PopulatedProjectDetails {
                project_name: details.project_name,
                project_managers: details
                    .project_managers
                    .iter()
                    .filter_map(|id| managers.get(id).cloned())
                    .collect(),
                project_start_date: details.project_start_date,
                project_expected_delivery_date: details.project_expected_delivery_date,
                project_delivery_date: details.project_delivery_date,
            },
            amc: self.amc,
            domain: self.domain,
            hosting: self.hosting,
            socials: self.socials,
            files: self.files,
            status: self.status,
            pricing: self.pricing,
            paid: self.paid,
            payment: self.payment,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn set_path(target: &mut Value, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut cursor = target;
    for key in parents {
        let map = match cursor {
            Value::Object(map) => map,
            _ => return,
        };
        cursor = map
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if cursor.is_null() {
            *cursor = Value::Object(Map::new());
        }
    }
    if let Value::Object(map) = cursor {
        map.insert(last.to_string(), value);
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedProjectDetails {
    pub project_name: String,
    pub project_managers: Vec<ProjectManager>,
    pub project_start_date: DateTime<Utc>,
    pub project_expected_delivery_date: DateTime<Utc>,
    pub project_delivery_date: DateTime<Utc>,
}

/// What read endpoints return: a client with its managers expanded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedClient {
    #[serde(rename = "_id")]
    pub id: String,
    pub client_details: ClientDetails,
    pub project_details: PopulatedProjectDetails,
    #[serde(rename = "AMC", skip_serializing_if = "Option::is_none")]
    pub amc: Option<Amc>,
    pub domain: ServiceAccount,
    pub hosting: ServiceAccount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socials: Option<Socials>,
    pub files: Vec<StoredFile>,
    pub status: ClientStatus,
    pub pricing: Pricing,
    pub paid: bool,
    pub payment: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
