use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::api::html;
use crate::services::auth_service::SessionError;

/// Failures a handler cannot turn into a rendered page of its own.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        log::error!("❌ Request failed: {}", self);
        let body = html::page(
            "Something went wrong",
            None,
            "<h1>Something went wrong</h1>\
             <p>Please try again in a moment.</p>\
             <p><a href=\"/\">Back to home</a></p>",
        );
        html::respond(self.status_code(), body)
    }
}
