// src/client.rs

use std::collections::{HashMap, HashSet};

use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use futures_util::TryStreamExt;
use log::{debug, error, info};
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{Client, ClientInput, PopulatedClient, ProjectManager};
use crate::uploads::PendingUpload;
use crate::validation::{self, FieldViolation};

const CLIENT_DATA_FIELD: &str = "clientData";
const FILES_FIELD: &str = "files";
const MAX_FILES: usize = 5;
const CLIENT_DATA_LIMIT: usize = 1024 * 1024;

fn client_not_found() -> AppError {
    AppError::NotFound("Client not found!".to_string())
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::BadRequest(format!("Invalid multipart body: {}", e))
}

/// The parts of a client intake request, fully buffered.
struct IntakeForm {
    client_data: Option<String>,
    files: Vec<PendingUpload>,
}

async fn read_field(field: &mut Field, limit: usize) -> AppResult<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
        if bytes.len() + chunk.len() > limit {
            return Err(AppError::BadRequest(format!(
                "Field exceeds the {} byte limit",
                limit
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

async fn read_intake(mut payload: Multipart, max_file_bytes: usize) -> AppResult<IntakeForm> {
    let mut form = IntakeForm {
        client_data: None,
        files: Vec::new(),
    };

    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);

        match (name.as_str(), filename) {
            (FILES_FIELD, Some(original_name)) => {
                if form.files.len() == MAX_FILES {
                    return Err(AppError::BadRequest(format!(
                        "At most {} files may be attached",
                        MAX_FILES
                    )));
                }
                let bytes = read_field(&mut field, max_file_bytes).await?;
                form.files.push(PendingUpload { original_name, bytes });
            }
            (_, Some(_)) => {
                return Err(AppError::BadRequest(format!("Unexpected file field: {}", name)));
            }
            (CLIENT_DATA_FIELD, None) => {
                let bytes = read_field(&mut field, CLIENT_DATA_LIMIT).await?;
                let text = String::from_utf8(bytes)
                    .map_err(|_| AppError::BadRequest("clientData must be UTF-8".to_string()))?;
                form.client_data = Some(text);
            }
            _ => {
                debug!("Ignoring form field {:?}", name);
                while field.try_next().await.map_err(multipart_error)?.is_some() {}
            }
        }
    }
    Ok(form)
}

/// One violation listing every manager id with no stored manager.
async fn unknown_managers(data: &AppState, ids: &[String]) -> AppResult<Vec<FieldViolation>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let found: HashSet<String> = data
        .managers
        .find_managers(ids)
        .await?
        .into_iter()
        .map(|m| m.id)
        .collect();
    let missing: Vec<&str> = ids
        .iter()
        .filter(|id| !found.contains(*id))
        .map(String::as_str)
        .collect();
    if missing.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![FieldViolation::new(
        "projectDetails.projectManagers",
        "unknown_manager",
        format!("no project manager with id {}", missing.join(", ")),
    )])
}

async fn manager_index(data: &AppState, clients: &[Client]) -> AppResult<HashMap<String, ProjectManager>> {
    let mut ids: Vec<String> = clients
        .iter()
        .flat_map(|c| c.project_details.project_managers.iter().cloned())
        .collect();
    ids.sort();
    ids.dedup();
    let managers = data.managers.find_managers(&ids).await?;
    Ok(managers.into_iter().map(|m| (m.id.clone(), m)).collect())
}

/// POST /api/client
///
/// Multipart body: a `clientData` JSON part and up to five `files` parts.
/// Nothing is written to disk or the database unless the client data is valid.
pub async fn create_client(
    data: web::Data<AppState>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let form = read_intake(payload, data.config.max_upload_bytes).await?;

    let raw = form.client_data.ok_or_else(|| {
        AppError::invalid_request(vec![FieldViolation::new(
            CLIENT_DATA_FIELD,
            "required",
            "clientData is required",
        )])
    })?;
    let input: ClientInput = serde_json::from_str(&raw).map_err(|e| {
        AppError::invalid_request(vec![FieldViolation::new(CLIENT_DATA_FIELD, "invalid", e.to_string())])
    })?;

    let mut violations = validation::check(&input).err().unwrap_or_default();
    violations.extend(unknown_managers(&data, &input.project_details.project_managers).await?);
    if !violations.is_empty() {
        debug!("Rejected client intake: {:?}", violations);
        return Err(AppError::invalid_request(violations));
    }

    let files = data
        .uploads
        .store_all(&form.files)
        .await
        .map_err(|e| AppError::Internal(format!("Error storing uploads: {}", e)))?;

    let client = input.into_client(files, Utc::now());
    if let Err(e) = data.clients.insert_client(&client).await {
        error!("Error creating client: {}", e);
        data.uploads.discard(&client.files).await;
        return Err(e.into());
    }
    info!("Client created {} with {} files", client.id, client.files.len());

    Ok(HttpResponse::Ok().json(client))
}

/// GET /api/client/{id}
pub async fn get_client(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let client = data
        .clients
        .find_client(&id)
        .await?
        .ok_or_else(client_not_found)?;
    let managers = manager_index(&data, std::slice::from_ref(&client)).await?;
    Ok(HttpResponse::Ok().json(client.populate(&managers)))
}

/// GET /api/client
pub async fn list_clients(data: web::Data<AppState>) -> AppResult<HttpResponse> {
    let clients = data.clients.list_clients().await?;
    let managers = manager_index(&data, &clients).await?;
    let populated: Vec<PopulatedClient> = clients
        .into_iter()
        .map(|c| c.populate(&managers))
        .collect();
    Ok(HttpResponse::Ok().json(populated))
}

/// PUT /api/client/{id}
///
/// Each key of the body replaces the value at that field or dotted path.
pub async fn update_client(
    data: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<Value>,
) -> AppResult<HttpResponse> {
    let Value::Object(patch) = body.into_inner() else {
        return Err(AppError::BadRequest("Update body must be a JSON object".to_string()));
    };

    let existing = data
        .clients
        .find_client(&id)
        .await?
        .ok_or_else(client_not_found)?;

    let (mut client, skipped) = existing.merge_patch(&patch).map_err(|e| {
        AppError::unprocessable(vec![FieldViolation::new("body", "invalid", e.to_string())])
    })?;
    if !skipped.is_empty() {
        debug!("Ignoring non-editable keys for client {}: {:?}", id, skipped);
    }

    let mut violations = validation::check(&client).err().unwrap_or_default();
    // Ids already on the record may point at deleted managers; only new ones are checked.
    let added: Vec<String> = client
        .project_details
        .project_managers
        .iter()
        .filter(|id| !existing.project_details.project_managers.contains(*id))
        .cloned()
        .collect();
    violations.extend(unknown_managers(&data, &added).await?);
    if !violations.is_empty() {
        return Err(AppError::unprocessable(violations));
    }

    client.refresh_payment();
    client.updated_at = Utc::now();
    if !data.clients.replace_client(&client).await? {
        return Err(client_not_found());
    }
    info!("Client updated {} (payment {:?})", client.id, client.payment);

    Ok(HttpResponse::Ok().json(client))
}

/// DELETE /api/client/{id}
///
/// Succeeds whether or not the client existed.
pub async fn delete_client(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    if data.clients.delete_client(&id).await? {
        info!("Client deleted {}", id);
    } else {
        debug!("Delete for unknown client {}", id);
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "client deleted successfully" })))
}
