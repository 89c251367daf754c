mod api;
mod config;
mod database;
mod jobs;
mod middleware;
mod models;
mod router;
mod services;
mod utils;
mod views;

use actix_web::{middleware::Compress, middleware::Logger, middleware::NormalizePath, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use std::sync::Arc;

use crate::api::{AppState, Backends};
use crate::config::{Config, IdentityBackend, StoreBackend};
use crate::services::auth_service::SessionRegistry;
use crate::services::document_store::{DocumentStore, MemoryDocumentStore};
use crate::services::identity_service::{
    FirebaseIdentityProvider, FirebaseTokens, IdentityProvider, MemoryIdentityProvider,
};
use crate::services::recommendation_service::HttpRecommendationEngine;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("❌ Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    log::info!("🚀 Starting Course Recommender...");

    let (provider, tokens): (Arc<dyn IdentityProvider>, Option<Arc<FirebaseTokens>>) = match &config.identity {
        IdentityBackend::Memory => {
            log::warn!("⚠️  Using the in-memory identity provider; accounts are lost on restart");
            (Arc::new(MemoryIdentityProvider::new()), None)
        }
        IdentityBackend::Firebase {
            base_url,
            token_url,
            api_key,
        } => {
            log::info!("🔐 Identity provider: {}", base_url);
            let tokens = Arc::new(FirebaseTokens::new(token_url.clone(), api_key.clone()));
            let provider = FirebaseIdentityProvider::new(base_url.clone(), api_key.clone(), tokens.clone());
            (Arc::new(provider), Some(tokens))
        }
    };

    let store: Arc<dyn DocumentStore> = match &config.store {
        StoreBackend::Memory => {
            log::warn!("⚠️  Using the in-memory document store; data is lost on restart");
            Arc::new(MemoryDocumentStore::new())
        }
        StoreBackend::MongoDb { url } => {
            let db = database::MongoDB::new(url).await.map_err(|e| {
                log::error!("❌ Failed to connect to MongoDB: {}", e);
                io::Error::new(io::ErrorKind::Other, e.to_string())
            })?;
            Arc::new(db)
        }
        StoreBackend::Firestore { base_url, project_id } => {
            // config only accepts firestore together with the firebase provider
            let (Some(tokens), IdentityBackend::Firebase { api_key, .. }) = (tokens, &config.identity) else {
                log::error!("❌ Firestore needs the Firebase identity provider");
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "DOCUMENT_STORE=firestore requires IDENTITY_PROVIDER=firebase",
                ));
            };
            log::info!("🔥 Firestore project: {}", project_id);
            Arc::new(database::Firestore::new(base_url, project_id, api_key.clone(), tokens))
        }
    };

    log::info!("🎯 Recommendation engine: {}", config.recommendation_endpoint);
    if !config.engine_shares_store() {
        log::warn!(
            "⚠️  The default recommendation engine reads profiles from Firestore; with the {} store it will not find them. \
             Set DOCUMENT_STORE=firestore or point RECOMMENDATION_ENDPOINT at an engine that shares this store",
            config.store.name()
        );
    }
    let engine = Arc::new(HttpRecommendationEngine::new(config.recommendation_endpoint.clone()));

    let sessions = Arc::new(SessionRegistry::new(
        provider,
        config.session_secret.clone(),
        config.session_ttl,
    ));

    log::info!("📅 Starting background jobs...");
    let _sweeper = jobs::session_sweeper::start_session_sweeper(sessions.clone(), config.sweep_interval);
    log::info!("✅ Background jobs started");

    let state = web::Data::new(AppState {
        store,
        engine,
        sessions,
        backends: Backends {
            store: config.store.name(),
            identity: config.identity.name(),
        },
        secure_cookies: config.secure_cookies,
    });

    log::info!("🌐 Server starting on {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::SessionLoader)
            .wrap(middleware::SecurityHeaders)
            .wrap(Compress::default())
            .wrap(NormalizePath::trim())
            .wrap(Logger::default())
            .configure(api::configure)
            .default_service(web::to(api::not_found))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
