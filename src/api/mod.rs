pub mod auth;
pub mod courses;
pub mod dashboard;
pub mod health;
pub mod html;
pub mod profile;

use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;

use crate::middleware::Session;
use crate::services::auth_service::SessionRegistry;
use crate::services::document_store::DocumentStore;
use crate::services::recommendation_service::RecommendationEngine;

/// Collaborators shared by every handler, injected once at startup.
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub engine: Arc<dyn RecommendationEngine>,
    pub sessions: Arc<SessionRegistry>,
    pub backends: Backends,
    /// Whether the session cookie is marked `Secure`.
    pub secure_cookies: bool,
}

/// Names of the configured backends, reported by the health check.
#[derive(Debug, Clone, Copy)]
pub struct Backends {
    pub store: &'static str,
    pub identity: &'static str,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check
        .route("/health", web::get().to(health::health_check))
        // Public pages
        .route("/", web::get().to(auth::landing))
        .service(
            web::resource("/signup")
                .route(web::get().to(auth::sign_up_form))
                .route(web::post().to(auth::sign_up)),
        )
        .service(
            web::resource("/signin")
                .route(web::get().to(auth::sign_in_form))
                .route(web::post().to(auth::sign_in)),
        )
        .route("/logout", web::post().to(auth::logout))
        // Guarded pages
        .service(
            web::resource("/profile-setup")
                .route(web::get().to(profile::setup_form))
                .route(web::post().to(profile::submit_setup)),
        )
        .service(
            web::resource("/profilepage")
                .route(web::get().to(profile::edit_form))
                .route(web::post().to(profile::submit_edit)),
        )
        .service(
            web::resource("/dashboard")
                .route(web::get().to(dashboard::dashboard))
                .route(web::post().to(dashboard::submit_feedback)),
        )
        .route(
            "/course/{user_id}/{course_title}",
            web::get().to(courses::course_detail),
        )
        .route(
            "/recommended-courses/{user_id}",
            web::get().to(courses::recommended_courses),
        );
}

/// Catch-all for unmatched paths.
pub async fn not_found(req: HttpRequest, session: Session) -> HttpResponse {
    log::debug!("No route for {} {}", req.method(), req.path());
    let identity = session.identity();
    html::not_found_page(identity.as_ref(), "The page you are looking for does not exist.")
}
