use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};

use super::{html, AppState};
use crate::middleware::Session;
use crate::models::{EditFields, Identity, SetupFields};
use crate::router::Route;
use crate::views::guard::GuardOutcome;
use crate::views::profile::{EditEditor, SetupEditor};

pub async fn setup_form(state: web::Data<AppState>, session: Session) -> HttpResponse {
    let mut editor = SetupEditor::mount(session.client());
    let identity = match editor.outcome() {
        GuardOutcome::Allow(identity) => identity,
        GuardOutcome::Redirect(route) => return html::redirect(&route),
    };

    editor.load(state.store.as_ref()).await;
    html::ok(setup_page(&identity, editor.fields(), editor.error()))
}

pub async fn submit_setup(
    state: web::Data<AppState>,
    session: Session,
    form: web::Form<SetupFields>,
) -> HttpResponse {
    let mut editor = SetupEditor::mount(session.client());
    let identity = match editor.outcome() {
        GuardOutcome::Allow(identity) => identity,
        GuardOutcome::Redirect(route) => return html::redirect(&route),
    };
    log::info!("📝 POST /profile-setup - user: {}", identity.uid);

    match editor
        .submit(state.store.as_ref(), state.engine.as_ref(), form.into_inner())
        .await
    {
        Ok(route) => html::redirect(&route),
        Err(e) => {
            log::warn!("❌ Profile setup rejected for user {}: {}", identity.uid, e);
            html::respond(
                StatusCode::UNPROCESSABLE_ENTITY,
                setup_page(&identity, editor.fields(), editor.error()),
            )
        }
    }
}

pub async fn edit_form(state: web::Data<AppState>, session: Session) -> HttpResponse {
    let mut editor = EditEditor::mount(session.client());
    let identity = match editor.outcome() {
        GuardOutcome::Allow(identity) => identity,
        GuardOutcome::Redirect(route) => return html::redirect(&route),
    };

    editor.load(state.store.as_ref()).await;
    html::ok(edit_page(&identity, editor.fields(), editor.error()))
}

pub async fn submit_edit(
    state: web::Data<AppState>,
    session: Session,
    form: web::Form<EditFields>,
) -> HttpResponse {
    let mut editor = EditEditor::mount(session.client());
    let identity = match editor.outcome() {
        GuardOutcome::Allow(identity) => identity,
        GuardOutcome::Redirect(route) => return html::redirect(&route),
    };
    log::info!("📝 POST /profilepage - user: {}", identity.uid);

    match editor.submit(state.store.as_ref(), form.into_inner()).await {
        Ok(route) => html::redirect(&route),
        Err(_) => html::respond(
            StatusCode::INTERNAL_SERVER_ERROR,
            edit_page(&identity, editor.fields(), editor.error()),
        ),
    }
}

fn setup_page(identity: &Identity, fields: &SetupFields, error: Option<&str>) -> String {
    let body = format!(
        "<h1>Set Up Your Profile</h1>\
         <p>Tell us where you want to go and we will recommend courses to get you there.</p>{error}\
         <form method=\"post\" action=\"{action}\">{goals}{skills}{interests}\
         <button type=\"submit\">Save and Get Recommendations</button></form>",
        error = html::message(error, true),
        action = Route::ProfileSetup.path(),
        goals = html::textarea("career_goals", "Career Goals", &fields.career_goals),
        skills = html::textarea("skills", "Skills", &fields.skills),
        interests = html::textarea("interests", "Interests", &fields.interests),
    );
    html::page("Profile Setup", Some(identity), &body)
}

fn edit_page(identity: &Identity, fields: &EditFields, error: Option<&str>) -> String {
    let body = format!(
        "<h1>Edit Profile</h1>{error}\
         <form method=\"post\" action=\"{action}\">{name}{age}{job_role}{interested}{liked}\
         <button type=\"submit\">Save Profile</button></form>",
        error = html::message(error, true),
        action = Route::ProfilePage.path(),
        name = html::input("name", "Name", "text", &fields.name),
        age = html::input("age", "Age", "text", &fields.age),
        job_role = html::input("job_role", "Job Role", "text", &fields.job_role),
        interested = html::textarea("interested_courses", "Interested Courses", &fields.interested_courses),
        liked = html::textarea("liked_courses", "Liked Courses", &fields.liked_courses),
    );
    html::page("Edit Profile", Some(identity), &body)
}
