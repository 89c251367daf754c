use std::sync::Arc;

use super::guard::{GuardOutcome, SessionGuard};
use super::lifecycle::ViewScope;
use super::state::ViewState;
use crate::models::Course;
use crate::services::auth_service::AuthClient;
use crate::services::course_service;
use crate::services::document_store::DocumentStore;

/// First course whose title equals `title` exactly.
pub fn resolve_course(courses: Vec<Course>, title: &str) -> Option<Course> {
    courses.into_iter().find(|course| course.title == title)
}

pub struct CourseDetailView {
    scope: ViewScope,
    guard: SessionGuard,
    user_id: String,
    course_title: String,
    course: ViewState<Course>,
}

impl CourseDetailView {
    /// `course_title` is the already decoded path segment.
    pub fn mount(
        session: Option<&Arc<AuthClient>>,
        user_id: impl Into<String>,
        course_title: impl Into<String>,
    ) -> Self {
        let scope = ViewScope::mount();
        let guard = SessionGuard::subscribe(session, &scope);
        Self {
            scope,
            guard,
            user_id: user_id.into(),
            course_title: course_title.into(),
            course: ViewState::Loading,
        }
    }

    pub fn outcome(&self) -> GuardOutcome {
        self.guard.outcome()
    }

    #[cfg(test)]
    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub async fn load(&mut self, store: &dyn DocumentStore) {
        let GuardOutcome::Allow(identity) = self.guard.outcome() else {
            return;
        };
        if identity.uid != self.user_id {
            log::warn!("User {} requested a course of {}", identity.uid, self.user_id);
            self.course = ViewState::NotFound;
            return;
        }

        let Some(fetched) = self
            .guard
            .run_signed_in(&self.scope, course_service::fetch_recommendations(store, &self.user_id))
            .await
        else {
            return;
        };

        let title = self.course_title.as_str();
        let found = fetched.map(|courses| courses.and_then(|courses| resolve_course(courses, title)));
        self.course = ViewState::settle_item(found, "course detail");
    }

    pub fn state(&self) -> &ViewState<Course> {
        &self.course
    }

    pub fn course_title(&self) -> &str {
        &self.course_title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecommendationDocument;
    use crate::router::Route;
    use crate::services::auth_service::tests::provider;
    use crate::services::document_store::{
        to_fields, Collection, Fields, MemoryDocumentStore, SetOptions, StoreError,
    };
    use async_trait::async_trait;
    use tokio::sync::Notify;

    async fn seeded(titles: &[&str]) -> (MemoryDocumentStore, Arc<AuthClient>, String) {
        let store = MemoryDocumentStore::new();
        let client = AuthClient::new(provider());
        let uid = client.create_account("a@b.c", "secret123").await.unwrap().uid;
        let document = RecommendationDocument {
            courses: titles.iter().map(|title| Course::titled(*title)).collect(),
        };
        store
            .set_document(Collection::Recommendations, &uid, to_fields(&document).unwrap(), SetOptions::replace())
            .await
            .unwrap();
        (store, client, uid)
    }

    #[test]
    fn test_resolve_takes_first_exact_match() {
        let mut first = Course::titled("A");
        first.level = Some("Beginner".into());
        let mut duplicate = Course::titled("A");
        duplicate.level = Some("Advanced".into());
        let courses = vec![Course::titled("a"), first.clone(), duplicate];
        assert_eq!(resolve_course(courses, "A"), Some(first));
    }

    #[tokio::test]
    async fn test_encoded_title_resolves() {
        let (store, client, uid) = seeded(&["A", "B"]).await;
        let path = Route::course(&uid, "B").path();
        let Some(Route::CourseDetail { user_id, course_title }) = Route::parse(&path) else {
            panic!("course path did not parse");
        };

        let mut view = CourseDetailView::mount(Some(&client), user_id, course_title);
        view.load(&store).await;
        assert_eq!(view.state().ready().map(|c| c.title.as_str()), Some("B"));
    }

    #[tokio::test]
    async fn test_absent_title_is_not_found() {
        let (store, client, uid) = seeded(&["A", "B"]).await;
        let mut view = CourseDetailView::mount(Some(&client), uid, "C");
        view.load(&store).await;
        assert_eq!(*view.state(), ViewState::NotFound);
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let store = MemoryDocumentStore::new();
        let client = AuthClient::new(provider());
        let uid = client.create_account("a@b.c", "secret123").await.unwrap().uid;

        let mut view = CourseDetailView::mount(Some(&client), uid, "A");
        view.load(&store).await;
        assert_eq!(*view.state(), ViewState::NotFound);
    }

    #[tokio::test]
    async fn test_cross_user_request_is_not_found() {
        let (store, client, _) = seeded(&["A"]).await;
        let mut view = CourseDetailView::mount(Some(&client), "other-uid", "A");
        view.load(&store).await;
        assert_eq!(*view.state(), ViewState::NotFound);
    }

    /// Holds every read until released.
    struct GatedStore {
        inner: MemoryDocumentStore,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl DocumentStore for GatedStore {
        async fn get_document(&self, collection: Collection, key: &str) -> Result<Option<Fields>, StoreError> {
            self.entered.notify_one();
            self.release.notified().await;
            self.inner.get_document(collection, key).await
        }

        async fn set_document(
            &self,
            collection: Collection,
            key: &str,
            fields: Fields,
            options: SetOptions,
        ) -> Result<(), StoreError> {
            self.inner.set_document(collection, key, fields, options).await
        }
    }

    #[tokio::test]
    async fn test_unmount_during_fetch_discards_late_result() {
        let (inner, client, uid) = seeded(&["A"]).await;
        let store = Arc::new(GatedStore {
            inner,
            entered: Notify::new(),
            release: Notify::new(),
        });

        let mut view = CourseDetailView::mount(Some(&client), uid, "A");
        let handle = view.scope().handle();
        let task_store = store.clone();
        let task = tokio::spawn(async move {
            view.load(task_store.as_ref()).await;
            view
        });

        store.entered.notified().await;
        handle.unmount();
        store.release.notify_one();

        let view = task.await.unwrap();
        assert!(view.state().is_loading());
        assert_eq!(client.listener_count(), 0);
    }
}
