// ==================== HTML RENDERING ====================
// Pages are plain strings assembled with `format!`. Every value that came from
// a user, the document store or the identity provider goes through `escape`.

use actix_web::http::{header, StatusCode};
use actix_web::HttpResponse;

use crate::models::Identity;
use crate::router::Route;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Full document. Authenticated pages pass the identity to get the header
/// navigation and the logout button.
pub fn page(title: &str, identity: Option<&Identity>, body: &str) -> String {
    let header = identity.map(nav).unwrap_or_default();
    format!(
        "<!DOCTYPE html>\
         <html lang=\"en\">\
         <head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{title} | Course Recommender</title></head>\
         <body>{header}<main>{body}</main></body></html>",
        title = escape(title),
        header = header,
        body = body,
    )
}

fn nav(identity: &Identity) -> String {
    format!(
        "<header><nav>\
         <a href=\"{dashboard}\">Dashboard</a> \
         <a href=\"{recommended}\">All Recommended Courses</a> \
         <a href=\"{setup}\">My Profile</a> \
         <a href=\"{edit}\">Edit Profile</a> \
         <form method=\"post\" action=\"/logout\" class=\"inline\"><button type=\"submit\">Logout</button></form>\
         </nav></header>",
        dashboard = Route::Dashboard.path(),
        recommended = escape(&Route::recommended(&identity.uid).path()),
        setup = Route::ProfileSetup.path(),
        edit = Route::ProfilePage.path(),
    )
}

/// `<p>` carrying a form message, or nothing.
pub fn message(text: Option<&str>, is_error: bool) -> String {
    match text {
        Some(text) => format!(
            "<p class=\"{}\" role=\"status\">{}</p>",
            if is_error { "error" } else { "notice" },
            escape(text)
        ),
        None => String::new(),
    }
}

/// Labelled single-line input.
pub fn input(name: &str, label: &str, kind: &str, value: &str) -> String {
    format!(
        "<label for=\"{name}\">{label}</label>\
         <input id=\"{name}\" name=\"{name}\" type=\"{kind}\" value=\"{value}\">",
        name = name,
        label = escape(label),
        kind = kind,
        value = escape(value),
    )
}

/// Labelled textarea.
pub fn textarea(name: &str, label: &str, value: &str) -> String {
    format!(
        "<label for=\"{name}\">{label}</label>\
         <textarea id=\"{name}\" name=\"{name}\" rows=\"3\">{value}</textarea>",
        name = name,
        label = escape(label),
        value = escape(value),
    )
}

pub fn respond(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

pub fn ok(body: String) -> HttpResponse {
    respond(StatusCode::OK, body)
}

/// `303 See Other`: the browser replaces the POST (or guarded GET) with a
/// GET of the target.
pub fn redirect(route: &Route) -> HttpResponse {
    redirect_to(&route.path())
}

pub fn redirect_to(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Page shown for unmatched paths and for courses that do not exist.
pub fn not_found_page(identity: Option<&Identity>, what: &str) -> HttpResponse {
    let body = format!(
        "<h1>Not found</h1><p>{}</p><p><a href=\"/\">Back to home</a></p>",
        escape(what)
    );
    respond(StatusCode::NOT_FOUND, page("Not found", identity, &body))
}
