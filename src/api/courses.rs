use actix_web::{web, HttpRequest, HttpResponse};

use super::{html, AppState};
use crate::middleware::Session;
use crate::models::{Course, Identity};
use crate::router::Route;
use crate::views::course_detail::CourseDetailView;
use crate::views::course_list::{CourseEntry, CourseListView};
use crate::views::guard::GuardOutcome;
use crate::views::state::ViewState;

/// `GET /course/{user_id}/{course_title}`. The raw path is parsed by `Route`
/// so an encoded `/` inside a title stays part of the title.
pub async fn course_detail(state: web::Data<AppState>, session: Session, req: HttpRequest) -> HttpResponse {
    let Some(Route::CourseDetail { user_id, course_title }) = Route::parse(req.path()) else {
        let identity = session.identity();
        return html::not_found_page(identity.as_ref(), "The page you are looking for does not exist.");
    };

    let mut view = CourseDetailView::mount(session.client(), user_id, course_title);
    let identity = match view.outcome() {
        GuardOutcome::Allow(identity) => identity,
        GuardOutcome::Redirect(route) => return html::redirect(&route),
    };

    view.load(state.store.as_ref()).await;
    match view.state() {
        ViewState::Ready(course) => html::ok(html::page(&course.title, Some(&identity), &detail_body(course))),
        ViewState::Loading => html::ok(html::page("Course", Some(&identity), "<p>Loading...</p>")),
        ViewState::Empty | ViewState::NotFound => html::not_found_page(
            Some(&identity),
            &format!("We could not find the course \"{}\".", view.course_title()),
        ),
    }
}

pub async fn recommended_courses(state: web::Data<AppState>, session: Session, req: HttpRequest) -> HttpResponse {
    let Some(Route::RecommendedCourses { user_id }) = Route::parse(req.path()) else {
        let identity = session.identity();
        return html::not_found_page(identity.as_ref(), "The page you are looking for does not exist.");
    };

    let mut view = CourseListView::mount(session.client(), user_id);
    let identity = match view.outcome() {
        GuardOutcome::Allow(identity) => identity,
        GuardOutcome::Redirect(route) => return html::redirect(&route),
    };

    view.load(state.store.as_ref()).await;
    match view.state() {
        ViewState::NotFound => html::not_found_page(Some(&identity), "These recommendations are not available."),
        courses => html::ok(list_page(&identity, courses)),
    }
}

fn detail_body(course: &Course) -> String {
    let field = |label: &str, value: Option<&str>, suffix: &str| {
        format!(
            "<p><strong>{}:</strong> {}{}</p>",
            label,
            html::escape(value.unwrap_or("N/A")),
            if value.is_some() { suffix } else { "" }
        )
    };

    let link = course
        .url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .map(|url| {
            format!(
                "<p><a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">Go to Course</a></p>",
                html::escape(url)
            )
        })
        .unwrap_or_default();

    format!(
        "<h1>{title}</h1><p>{keyword}</p>{learn}{instructor}{level}{duration}{offered}{rating}{reviews}{schedule}{modules}{link}",
        title = html::escape(&course.title),
        keyword = html::escape(course.keyword.as_deref().unwrap_or_default()),
        learn = field("What you will learn", course.what_you_will_learn.as_deref(), ""),
        instructor = field("Instructor", course.instructor.as_deref(), ""),
        level = field("Level", course.level.as_deref(), ""),
        duration = field("Duration", course.duration_hours.as_deref(), " hours"),
        offered = field("Offered By", course.offered_by.as_deref(), ""),
        rating = field("Rating", course.rating.as_deref(), ""),
        reviews = field("Number of Reviews", course.review_count.as_deref(), ""),
        schedule = field("Schedule", course.schedule.as_deref(), ""),
        modules = field("Modules", course.modules.as_deref(), ""),
        link = link,
    )
}

fn list_page(identity: &Identity, courses: &ViewState<Vec<CourseEntry>>) -> String {
    let content = match courses {
        ViewState::Ready(entries) => entries.iter().map(entry).collect::<String>(),
        ViewState::Loading => "<p>Loading...</p>".to_string(),
        ViewState::Empty | ViewState::NotFound => "<p>No recommended courses available at this time.</p>".to_string(),
    };
    let body = format!("<h1>Recommended Courses</h1><div class=\"courses\">{}</div>", content);
    html::page("Recommended Courses", Some(identity), &body)
}

fn entry(entry: &CourseEntry) -> String {
    let external = entry
        .external_url
        .as_deref()
        .map(|url| {
            format!(
                " <a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">Open Course</a>",
                html::escape(url)
            )
        })
        .unwrap_or_default();

    format!(
        "<article><h2>{title}</h2><p>{keyword}</p><a href=\"{detail}\">View Details</a>{external}</article>",
        title = html::escape(&entry.course.title),
        keyword = html::escape(entry.course.keyword.as_deref().unwrap_or_default()),
        detail = html::escape(&entry.detail_path),
        external = external,
    )
}
