use std::sync::Arc;

use super::guard::{GuardOutcome, SessionGuard};
use super::lifecycle::ViewScope;
use super::state::ViewState;
use crate::models::Course;
use crate::router::Route;
use crate::services::auth_service::AuthClient;
use crate::services::course_service;
use crate::services::document_store::DocumentStore;

/// One row of the full recommendation list.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseEntry {
    pub course: Course,
    /// In-app link to the detail view, title percent-encoded.
    pub detail_path: String,
    /// Opened in a new browsing context.
    pub external_url: Option<String>,
}

impl CourseEntry {
    fn new(user_id: &str, course: Course) -> Self {
        Self {
            detail_path: Route::course(user_id, &course.title).path(),
            external_url: course.url.clone().filter(|url| !url.trim().is_empty()),
            course,
        }
    }
}

pub struct CourseListView {
    scope: ViewScope,
    guard: SessionGuard,
    user_id: String,
    entries: ViewState<Vec<CourseEntry>>,
}

impl CourseListView {
    pub fn mount(session: Option<&Arc<AuthClient>>, user_id: impl Into<String>) -> Self {
        let scope = ViewScope::mount();
        let guard = SessionGuard::subscribe(session, &scope);
        Self {
            scope,
            guard,
            user_id: user_id.into(),
            entries: ViewState::Loading,
        }
    }

    pub fn outcome(&self) -> GuardOutcome {
        self.guard.outcome()
    }

    pub async fn load(&mut self, store: &dyn DocumentStore) {
        let GuardOutcome::Allow(identity) = self.guard.outcome() else {
            return;
        };
        if identity.uid != self.user_id {
            log::warn!("User {} requested the course list of {}", identity.uid, self.user_id);
            self.entries = ViewState::NotFound;
            return;
        }

        let Some(fetched) = self
            .guard
            .run_signed_in(&self.scope, course_service::fetch_recommendations(store, &self.user_id))
            .await
        else {
            return;
        };

        let user_id = self.user_id.as_str();
        let entries = fetched.map(|courses| {
            courses.map(|courses| {
                courses
                    .into_iter()
                    .map(|course| CourseEntry::new(user_id, course))
                    .collect::<Vec<_>>()
            })
        });
        self.entries = ViewState::settle_list(entries, Vec::is_empty, "recommended courses");
    }

    pub fn state(&self) -> &ViewState<Vec<CourseEntry>> {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecommendationDocument;
    use crate::services::auth_service::tests::provider;
    use crate::services::document_store::{to_fields, Collection, MemoryDocumentStore, SetOptions};

    async fn seeded() -> (MemoryDocumentStore, Arc<AuthClient>, String) {
        let store = MemoryDocumentStore::new();
        let client = AuthClient::new(provider());
        let uid = client.create_account("a@b.c", "secret123").await.unwrap().uid;

        let mut second = Course::titled("Data Science: R & Python");
        second.url = Some("https://example.org/ds".into());
        let document = RecommendationDocument {
            courses: vec![Course::titled("Intro to ML"), second],
        };
        store
            .set_document(Collection::Recommendations, &uid, to_fields(&document).unwrap(), SetOptions::replace())
            .await
            .unwrap();
        (store, client, uid)
    }

    #[tokio::test]
    async fn test_entries_keep_fetch_order_and_encode_titles() {
        let (store, client, uid) = seeded().await;
        let mut view = CourseListView::mount(Some(&client), uid.clone());
        view.load(&store).await;

        let entries = view.state().ready().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].course.title, "Intro to ML");
        assert_eq!(entries[0].external_url, None);
        assert_eq!(
            entries[1].detail_path,
            format!("/course/{}/Data%20Science%3A%20R%20%26%20Python", uid)
        );
        assert_eq!(entries[1].external_url.as_deref(), Some("https://example.org/ds"));

        // the detail link resolves back to the exact title
        assert_eq!(
            Route::parse(&entries[1].detail_path),
            Some(Route::course(&uid, "Data Science: R & Python"))
        );
    }

    #[tokio::test]
    async fn test_other_users_list_is_not_found() {
        let (store, client, _) = seeded().await;
        let mut view = CourseListView::mount(Some(&client), "someone-else");
        view.load(&store).await;
        assert_eq!(*view.state(), ViewState::NotFound);
    }

    #[tokio::test]
    async fn test_missing_document_is_empty() {
        let store = MemoryDocumentStore::new();
        let client = AuthClient::new(provider());
        let uid = client.create_account("a@b.c", "secret123").await.unwrap().uid;

        let mut view = CourseListView::mount(Some(&client), uid);
        view.load(&store).await;
        assert_eq!(*view.state(), ViewState::Empty);
    }
}
