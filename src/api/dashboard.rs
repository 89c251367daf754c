use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use super::{html, AppState};
use crate::middleware::Session;
use crate::models::{Course, Identity};
use crate::router::Route;
use crate::views::carousel::{Carousel, DashboardView};
use crate::views::feedback::{FeedbackForm, Notice};
use crate::views::guard::GuardOutcome;
use crate::views::state::ViewState;

const CAREER_PATHS: [&str; 3] = ["Data Scientist", "Machine Learning Engineer", "Software Developer"];
const CERTIFICATIONS: [&str; 3] = [
    "Google Data Analytics Professional Certificate",
    "Microsoft Certified: Azure AI Fundamentals",
    "AWS Certified Solutions Architect",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Next,
    Prev,
}

/// Raw query; every field is text so a hand-edited URL still reaches the
/// session guard and renders the dashboard.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub index: Option<String>,
    pub step: Option<String>,
    pub notice: Option<String>,
}

impl DashboardQuery {
    /// Anything unparseable (including a duplicated key) yields the defaults.
    fn from_request(req: &HttpRequest) -> Self {
        web::Query::<DashboardQuery>::from_query(req.query_string())
            .map(web::Query::into_inner)
            .unwrap_or_default()
    }

    fn index(&self) -> usize {
        self.index
            .as_deref()
            .and_then(|index| index.trim().parse().ok())
            .unwrap_or(0)
    }

    fn step(&self) -> Option<Step> {
        match self.step.as_deref().map(str::trim) {
            Some("next") => Some(Step::Next),
            Some("prev") => Some(Step::Prev),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedbackInput {
    #[serde(default)]
    pub feedback: String,
}

pub async fn dashboard(state: web::Data<AppState>, session: Session, req: HttpRequest) -> HttpResponse {
    let mut view = DashboardView::mount(session.client());
    let identity = match view.outcome() {
        GuardOutcome::Allow(identity) => identity,
        GuardOutcome::Redirect(route) => return html::redirect(&route),
    };

    let query = DashboardQuery::from_request(&req);
    view.load(state.store.as_ref()).await;
    view.seek(query.index());
    match query.step() {
        Some(Step::Next) => view.next(),
        Some(Step::Prev) => view.prev(),
        None => {}
    }

    let form = FeedbackForm {
        text: String::new(),
        notice: query.notice.as_deref().and_then(Notice::from_key),
    };
    html::ok(dashboard_page(&identity, view.state(), &form))
}

/// Feedback form post. Success redirects back with a notice so a reload does
/// not resubmit; a rejected submit re-renders with the text kept.
pub async fn submit_feedback(
    state: web::Data<AppState>,
    session: Session,
    input: web::Form<FeedbackInput>,
) -> HttpResponse {
    let mut view = DashboardView::mount(session.client());
    let identity = match view.outcome() {
        GuardOutcome::Allow(identity) => identity,
        GuardOutcome::Redirect(route) => return html::redirect(&route),
    };
    log::info!("💬 POST /dashboard (feedback) - user: {}", identity.uid);

    let mut form = FeedbackForm::new(input.into_inner().feedback);
    let notice = form.submit(state.store.as_ref(), &identity.uid).await;
    if notice == Notice::Sent {
        return html::redirect_to(&format!("{}?notice={}", Route::Dashboard.path(), notice.key()));
    }

    view.load(state.store.as_ref()).await;
    let status = match notice {
        Notice::Invalid => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    };
    html::respond(status, dashboard_page(&identity, view.state(), &form))
}

fn dashboard_page(identity: &Identity, courses: &ViewState<Carousel<Course>>, form: &FeedbackForm) -> String {
    let body = format!(
        "<h1>Welcome Back, {name}!</h1><p>Email: {email}</p>\
         <section><h2>Recommended Courses</h2>{carousel}</section>\
         <section><h2>Recommended Careers</h2>{careers}</section>\
         <section><h2>Professional Certifications</h2>{certifications}</section>\
         <section><h2>Your Feedback</h2>\
         <p>We value your feedback! Let us know how these recommendations are working for you.</p>{notice}\
         <form method=\"post\" action=\"{action}\">{textarea}\
         <button type=\"submit\">Submit Feedback</button></form></section>",
        name = html::escape(identity.name_or_default()),
        email = html::escape(&identity.email),
        carousel = carousel_panel(&identity.uid, courses),
        careers = list(&CAREER_PATHS),
        certifications = list(&CERTIFICATIONS),
        notice = html::message(form.notice.map(|n| n.message()), form.notice.map_or(false, |n| n.is_error())),
        action = Route::Dashboard.path(),
        textarea = html::textarea("feedback", "Feedback", &form.text),
    );
    html::page("Dashboard", Some(identity), &body)
}

fn carousel_panel(uid: &str, courses: &ViewState<Carousel<Course>>) -> String {
    let carousel = match courses {
        ViewState::Ready(carousel) => carousel,
        ViewState::Loading => return "<p>Loading...</p>".to_string(),
        ViewState::Empty | ViewState::NotFound => {
            return "<p>No recommended courses available at this time.</p>".to_string()
        }
    };

    let course = carousel.current();
    let link = course
        .url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .map(|url| {
            format!(
                "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">View Course</a>",
                html::escape(url)
            )
        })
        .unwrap_or_default();

    format!(
        "<div class=\"carousel\">{prev}\
         <article><h3><a href=\"{detail}\">{title}</a></h3><p>Rating: {rating}</p>{link}</article>\
         {next}<p>{position} of {len}</p></div>",
        prev = step_button(carousel.index(), "prev", "Previous"),
        detail = html::escape(&Route::course(uid, &course.title).path()),
        title = html::escape(&course.title),
        rating = html::escape(course.rating.as_deref().unwrap_or("N/A")),
        link = link,
        next = step_button(carousel.index(), "next", "Next"),
        position = carousel.index() + 1,
        len = carousel.len(),
    )
}

fn step_button(index: usize, step: &str, label: &str) -> String {
    format!(
        "<form method=\"get\" action=\"{}\" class=\"inline\">\
         <input type=\"hidden\" name=\"index\" value=\"{}\">\
         <button type=\"submit\" name=\"step\" value=\"{}\">{}</button></form>",
        Route::Dashboard.path(),
        index,
        step,
        label
    )
}

fn list(items: &[&str]) -> String {
    let items: String = items
        .iter()
        .map(|item| format!("<li>{}</li>", html::escape(item)))
        .collect();
    format!("<ul>{}</ul>", items)
}
