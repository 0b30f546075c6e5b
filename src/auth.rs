use actix_web::{web, HttpResponse};
use bcrypt::{hash, verify};
use chrono::Utc;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{Admin, LoginRequest, PublicAdmin, RegisterRequest};
use crate::validation;

// Password hashing runs on the blocking pool.
async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    web::block(move || hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(format!("Error hashing password: {}", e)))
}

async fn verify_password(password: String, password_hash: String) -> AppResult<bool> {
    web::block(move || verify(password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(format!("Error verifying password: {}", e)))
}

/// POST /api/auth/register
pub async fn register(
    data: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let info = body.into_inner();
    validation::check(&info).map_err(AppError::unprocessable)?;
    debug!("register request for {}", info.username);

    if data.admins.find_admin_by_username(&info.username).await?.is_some() {
        warn!("Username {} already registered", info.username);
        return Err(AppError::Conflict("admin already exist!".to_string()));
    }

    let now = Utc::now();
    let admin = Admin {
        id: Uuid::new_v4().to_string(),
        password_hash: hash_password(info.password, data.config.bcrypt_cost).await?,
        username: info.username,
        email: info.email,
        created_at: now,
        updated_at: now,
    };
    data.admins.insert_admin(&admin).await?;
    info!("Admin {} registered", admin.username);

    Ok(HttpResponse::Ok().json(PublicAdmin::from(admin)))
}

/// POST /api/auth/login
pub async fn login(
    data: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let info = body.into_inner();
    validation::check(&info).map_err(AppError::unprocessable)?;

    let admin = data
        .admins
        .find_admin_by_username(&info.username)
        .await?
        .ok_or_else(|| AppError::NotFound("admin not found!".to_string()))?;

    if !verify_password(info.password, admin.password_hash.clone()).await? {
        warn!("Wrong password for {}", admin.username);
        return Err(AppError::Unauthorized("wrong credentials!".to_string()));
    }

    Ok(HttpResponse::Ok().json(PublicAdmin::from(admin)))
}
