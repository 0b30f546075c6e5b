// src/main.rs

mod app_state;
mod auth;
mod client;
mod config;
mod error;
mod expiry;
mod models;
mod notifier;
mod payment;
mod project_manager;
mod store;
mod uploads;
mod validation;

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{http, middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{error, info, warn};

use crate::app_state::AppState;
use crate::auth::{login, register};
use crate::client::{create_client, delete_client, get_client, list_clients, update_client};
use crate::error::AppError;
use crate::notifier::{LogNotifier, Notifier, SmtpNotifier};
use crate::project_manager::{
    create_manager, delete_manager, get_manager, list_managers, update_manager,
};
use crate::store::MongoStore;
use crate::uploads::UploadDir;
use crate::validation::FieldViolation;

/// Malformed or mistyped JSON bodies become the same 422 as failed validation.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::unprocessable(vec![FieldViolation::new("body", "invalid_json", err.to_string())])
            .into()
    })
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login)),
            )
            .service(
                web::scope("/client")
                    .route("", web::post().to(create_client))
                    .route("", web::get().to(list_clients))
                    .route("/{id}", web::get().to(get_client))
                    .route("/{id}", web::put().to(update_client))
                    .route("/{id}", web::delete().to(delete_client)),
            )
            .service(
                web::scope("/project-manager")
                    .route("", web::post().to(create_manager))
                    .route("", web::get().to(list_managers))
                    .route("/{id}", web::get().to(get_manager))
                    .route("/{id}", web::put().to(update_manager))
                    .route("/{id}", web::delete().to(delete_manager)),
            ),
    );
}

fn cors(origin: Option<&str>) -> Cors {
    match origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![http::header::CONTENT_TYPE, http::header::ACCEPT])
            .max_age(3600),
        None => Cors::permissive(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = config::Config::from_env().map_err(std::io::Error::other)?;
    let store = Arc::new(
        MongoStore::connect(&config.mongo_uri, &config.database_name)
            .await
            .map_err(std::io::Error::other)?,
    );
    info!("database connected");

    let notifier: Arc<dyn Notifier> = match &config.mail {
        Some(mail) => match SmtpNotifier::new(mail) {
            Ok(smtp) => Arc::new(smtp),
            Err(e) => {
                error!("Error configuring SMTP, expiry notices will only be logged: {}", e);
                Arc::new(LogNotifier)
            }
        },
        None => {
            warn!("SMTP_USER/SMTP_PASSWORD not set; expiry notices will only be logged");
            Arc::new(LogNotifier)
        }
    };
    expiry::spawn_daily(store.clone(), notifier);

    let state = AppState {
        clients: store.clone(),
        managers: store.clone(),
        admins: store,
        uploads: UploadDir::new(config.uploads_dir.clone(), config.upload_path_prefix.clone()),
        config: config.clone(),
    };

    info!("server running on 0.0.0.0:{}", config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(cors(state.config.cors_origin.as_deref()))
            .app_data(web::Data::new(state.clone()))
            .app_data(json_config())
            .configure(routes)
            .service(Files::new("/uploads", state.uploads.root()))
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await
}
