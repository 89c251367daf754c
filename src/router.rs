//! Path patterns of the application.
//!
//! `:userId` and `:courseTitle` segments are percent-encoded when a path is
//! produced and decoded when one is parsed, so course titles containing
//! spaces, slashes or `&` survive the trip through a link.

use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    SignUp,
    SignIn,
    ProfileSetup,
    ProfilePage,
    Dashboard,
    CourseDetail { user_id: String, course_title: String },
    RecommendedCourses { user_id: String },
}

impl Route {
    /// Matches a raw (still percent-encoded) request path. Unknown paths are
    /// `None` and render the not-found page.
    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return Some(Route::Landing);
        }

        let segments: Vec<&str> = trimmed.strip_prefix('/')?.split('/').collect();
        match segments.as_slice() {
            ["signup"] => Some(Route::SignUp),
            ["signin"] => Some(Route::SignIn),
            ["profile-setup"] => Some(Route::ProfileSetup),
            ["profilepage"] => Some(Route::ProfilePage),
            ["dashboard"] => Some(Route::Dashboard),
            ["course", user_id, course_title] => Some(Route::CourseDetail {
                user_id: decode_segment(user_id)?,
                course_title: decode_segment(course_title)?,
            }),
            ["recommended-courses", user_id] => Some(Route::RecommendedCourses {
                user_id: decode_segment(user_id)?,
            }),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Landing => "/".to_string(),
            Route::SignUp => "/signup".to_string(),
            Route::SignIn => "/signin".to_string(),
            Route::ProfileSetup => "/profile-setup".to_string(),
            Route::ProfilePage => "/profilepage".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::CourseDetail { user_id, course_title } => format!(
                "/course/{}/{}",
                urlencoding::encode(user_id),
                urlencoding::encode(course_title)
            ),
            Route::RecommendedCourses { user_id } => {
                format!("/recommended-courses/{}", urlencoding::encode(user_id))
            }
        }
    }

    /// Views behind the session guard.
    pub fn requires_session(&self) -> bool {
        !matches!(self, Route::Landing | Route::SignUp | Route::SignIn)
    }

    pub fn course(user_id: &str, course_title: &str) -> Route {
        Route::CourseDetail {
            user_id: user_id.to_string(),
            course_title: course_title.to_string(),
        }
    }

    pub fn recommended(user_id: &str) -> Route {
        Route::RecommendedCourses {
            user_id: user_id.to_string(),
        }
    }
}

fn decode_segment(segment: &str) -> Option<String> {
    if segment.is_empty() {
        return None;
    }
    urlencoding::decode(segment).ok().map(Cow::into_owned)
}
