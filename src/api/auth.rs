use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use super::{html, AppState};
use crate::middleware::Session;
use crate::router::Route;
use crate::services::auth_service::SESSION_COOKIE;
use crate::utils::AppError;

pub const SIGN_UP_FAILED_MESSAGE: &str = "Failed to sign up. Please try again.";
pub const SIGN_IN_FAILED_MESSAGE: &str = "Failed to sign in. Please check your credentials and try again.";

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn landing(session: Session) -> HttpResponse {
    let identity = session.identity();
    let body = format!(
        "<h1>Welcome to Course Recommender</h1>\
         <p>Find the best courses to boost your career and skills with our personalized recommendations.</p>\
         <p><a href=\"{}\">Login</a> <a href=\"{}\">Sign Up</a></p>",
        Route::SignIn.path(),
        Route::SignUp.path(),
    );
    html::ok(html::page("Welcome", identity.as_ref(), &body))
}

pub async fn sign_up_form() -> HttpResponse {
    html::ok(credentials_page(Route::SignUp, "", None))
}

pub async fn sign_in_form() -> HttpResponse {
    html::ok(credentials_page(Route::SignIn, "", None))
}

pub async fn sign_up(
    state: web::Data<AppState>,
    form: web::Form<Credentials>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 POST /signup - email: {}", form.email);

    let client = state.sessions.new_client();
    match client.create_account(form.email.trim(), &form.password).await {
        Ok(identity) => {
            log::info!("✅ Account created: {}", identity.uid);
            let token = state.sessions.open(client)?;
            Ok(with_session(html::redirect(&Route::ProfileSetup), &state, token))
        }
        Err(e) => {
            log::warn!("❌ Sign-up failed: {} - {}", form.email, e);
            Ok(html::respond(
                StatusCode::BAD_REQUEST,
                credentials_page(Route::SignUp, &form.email, Some(SIGN_UP_FAILED_MESSAGE)),
            ))
        }
    }
}

pub async fn sign_in(
    state: web::Data<AppState>,
    form: web::Form<Credentials>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔐 POST /signin - email: {}", form.email);

    let client = state.sessions.new_client();
    match client.sign_in(form.email.trim(), &form.password).await {
        Ok(identity) => {
            log::info!("✅ Signed in: {}", identity.uid);
            let token = state.sessions.open(client)?;
            Ok(with_session(html::redirect(&Route::Dashboard), &state, token))
        }
        Err(e) => {
            log::warn!("❌ Sign-in failed: {} - {}", form.email, e);
            Ok(html::respond(
                StatusCode::UNAUTHORIZED,
                credentials_page(Route::SignIn, &form.email, Some(SIGN_IN_FAILED_MESSAGE)),
            ))
        }
    }
}

/// Signs the browser out and sends it to sign-in. Works (and still clears the
/// cookie) when the session is already gone.
pub async fn logout(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    log::info!("👋 POST /logout");

    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        match state.sessions.revoke(cookie.value()) {
            Ok(()) => log::info!("✅ Session closed"),
            Err(e) => log::debug!("Logout with unusable session token: {}", e),
        }
    }

    let mut removal = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .secure(state.secure_cookies)
        .finish();
    removal.make_removal();

    let mut response = html::redirect(&Route::SignIn);
    if let Err(e) = response.add_cookie(&removal) {
        log::warn!("Failed to expire session cookie: {}", e);
    }
    response
}

fn with_session(mut response: HttpResponse, state: &AppState, token: String) -> HttpResponse {
    let cookie = Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(state.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(state.sessions.ttl().num_seconds()))
        .finish();
    if let Err(e) = response.add_cookie(&cookie) {
        log::error!("❌ Failed to set session cookie: {}", e);
    }
    response
}

fn credentials_page(route: Route, email: &str, error: Option<&str>) -> String {
    let (title, button, switch) = match route {
        Route::SignUp => (
            "Sign Up",
            "Sign Up",
            format!("Already have an account? <a href=\"{}\">Sign in</a>", Route::SignIn.path()),
        ),
        _ => (
            "Sign In",
            "Sign In",
            format!("Don't have an account? <a href=\"{}\">Sign up</a>", Route::SignUp.path()),
        ),
    };

    let body = format!(
        "<h1>{title}</h1>{error}\
         <form method=\"post\" action=\"{action}\">{email}{password}\
         <button type=\"submit\">{button}</button></form><p>{switch}</p>",
        title = title,
        error = html::message(error, true),
        action = route.path(),
        email = html::input("email", "Email", "email", email),
        password = html::input("password", "Password", "password", ""),
        button = button,
        switch = switch,
    );
    html::page(title, None, &body)
}
