// src/project_manager.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::{debug, info, warn};
use serde_json::json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{CreateManagerRequest, ProjectManager, UpdateManagerRequest};
use crate::validation;

fn manager_not_found() -> AppError {
    AppError::NotFound("Manager not found!".to_string())
}

fn duplicate_email() -> AppError {
    AppError::Conflict("project manager already exist!".to_string())
}

/// POST /api/project-manager
pub async fn create_manager(
    data: web::Data<AppState>,
    body: web::Json<CreateManagerRequest>,
) -> AppResult<HttpResponse> {
    let info = body.into_inner();
    debug!("create_manager payload: {:?}", info);
    validation::check(&info).map_err(AppError::unprocessable)?;

    if data.managers.find_manager_by_email(&info.email).await?.is_some() {
        warn!("Project manager {} already exists", info.email);
        return Err(duplicate_email());
    }

    let now = Utc::now();
    let manager = ProjectManager {
        id: Uuid::new_v4().to_string(),
        name: info.name,
        email: info.email,
        phone: info.phone,
        created_at: now,
        updated_at: now,
    };
    data.managers.insert_manager(&manager).await?;
    info!("Project manager created {}", manager.id);

    Ok(HttpResponse::Ok().json(manager))
}

/// GET /api/project-manager
pub async fn list_managers(data: web::Data<AppState>) -> AppResult<HttpResponse> {
    let managers = data.managers.list_managers().await?;
    Ok(HttpResponse::Ok().json(managers))
}

/// GET /api/project-manager/{id}
pub async fn get_manager(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let manager = data
        .managers
        .find_manager(&id)
        .await?
        .ok_or_else(manager_not_found)?;
    Ok(HttpResponse::Ok().json(manager))
}

/// PUT /api/project-manager/{id}
pub async fn update_manager(
    data: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<UpdateManagerRequest>,
) -> AppResult<HttpResponse> {
    let update = body.into_inner();
    validation::check(&update).map_err(AppError::unprocessable)?;
    if update.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let mut manager = data
        .managers
        .find_manager(&id)
        .await?
        .ok_or_else(manager_not_found)?;

    if let Some(email) = update.email.as_deref() {
        if let Some(other) = data.managers.find_manager_by_email(email).await? {
            if other.id != manager.id {
                warn!("Email {} already belongs to manager {}", email, other.id);
                return Err(duplicate_email());
            }
        }
    }

    update.apply(&mut manager, Utc::now());
    if !data.managers.replace_manager(&manager).await? {
        return Err(manager_not_found());
    }
    info!("Project manager updated {}", manager.id);

    Ok(HttpResponse::Ok().json(manager))
}

/// DELETE /api/project-manager/{id}
///
/// Clients that reference the manager keep the id; it is skipped when their
/// managers are expanded.
pub async fn delete_manager(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    if !data.managers.delete_manager(&id).await? {
        return Err(manager_not_found());
    }
    info!("Project manager deleted {}", id);
    Ok(HttpResponse::Ok().json(json!("manager deleted")))
}
