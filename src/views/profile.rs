//! Profile editor in its two variants: first-time setup (career goals, skills,
//! interests; triggers recommendation generation) and the later edit form.

use std::sync::Arc;

use super::guard::{GuardOutcome, SessionGuard};
use super::lifecycle::ViewScope;
use crate::models::{EditFields, ProfileRecord, SetupFields};
use crate::router::Route;
use crate::services::auth_service::AuthClient;
use crate::services::document_store::{DocumentStore, StoreError};
use crate::services::profile_service;
use crate::services::recommendation_service::{RecommendationEngine, RecommendationError};

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("failed to save profile: {0}")]
    Store(#[from] StoreError),

    #[error("failed to generate recommendations: {0}")]
    Recommendation(#[from] RecommendationError),
}

pub const SETUP_MISSING_MESSAGE: &str = "Please fill in career goals, skills and interests.";
pub const SETUP_FAILED_MESSAGE: &str = "Failed to save profile or generate recommendations. Please try again.";
pub const EDIT_FAILED_MESSAGE: &str = "Failed to save profile data. Please try again.";

/// Which of the two forms a `ProfileEditor` drives.
pub trait ProfileForm: Default + Clone {
    fn from_record(record: &ProfileRecord) -> Self;
}

impl ProfileForm for SetupFields {
    fn from_record(record: &ProfileRecord) -> Self {
        SetupFields::from_record(record)
    }
}

impl ProfileForm for EditFields {
    fn from_record(record: &ProfileRecord) -> Self {
        EditFields::from_record(record)
    }
}

pub struct ProfileEditor<F: ProfileForm> {
    scope: ViewScope,
    guard: SessionGuard,
    fields: F,
    error: Option<&'static str>,
}

pub type SetupEditor = ProfileEditor<SetupFields>;
pub type EditEditor = ProfileEditor<EditFields>;

impl<F: ProfileForm> ProfileEditor<F> {
    pub fn mount(session: Option<&Arc<AuthClient>>) -> Self {
        let scope = ViewScope::mount();
        let guard = SessionGuard::subscribe(session, &scope);
        Self {
            scope,
            guard,
            fields: F::default(),
            error: None,
        }
    }

    pub fn outcome(&self) -> GuardOutcome {
        self.guard.outcome()
    }

    /// Populates the form from `userData/<uid>`. A missing document or a
    /// failed read leaves the empty defaults in place.
    pub async fn load(&mut self, store: &dyn DocumentStore) {
        let GuardOutcome::Allow(identity) = self.guard.outcome() else {
            return;
        };
        let Some(fetched) = self
            .guard
            .run_signed_in(&self.scope, profile_service::load_profile(store, &identity.uid))
            .await
        else {
            return;
        };

        match fetched {
            Ok(record) => self.fields = F::from_record(&record),
            Err(e) => log::warn!("Failed to load profile for user {}: {}", identity.uid, e),
        }
    }

    pub fn fields(&self) -> &F {
        &self.fields
    }

    /// Message shown above the form after a rejected submit.
    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    /// Keeps what the user typed and shows `message`; used when a submit fails.
    pub fn reject(&mut self, fields: F, message: &'static str) {
        self.fields = fields;
        self.error = Some(message);
    }
}

impl SetupEditor {
    /// Validates, saves and asks the engine for recommendations. On success
    /// the caller navigates to the returned route.
    pub async fn submit(
        &mut self,
        store: &dyn DocumentStore,
        engine: &dyn RecommendationEngine,
        fields: SetupFields,
    ) -> Result<Route, ProfileError> {
        let GuardOutcome::Allow(identity) = self.guard.outcome() else {
            return Ok(Route::SignIn);
        };

        match submit_setup(store, engine, &identity.uid, &fields).await {
            Ok(()) => Ok(Route::Dashboard),
            Err(e) => {
                let message = match e {
                    ProfileError::MissingField(_) => SETUP_MISSING_MESSAGE,
                    _ => SETUP_FAILED_MESSAGE,
                };
                self.reject(fields, message);
                Err(e)
            }
        }
    }
}

impl EditEditor {
    pub async fn submit(&mut self, store: &dyn DocumentStore, fields: EditFields) -> Result<Route, ProfileError> {
        let GuardOutcome::Allow(identity) = self.guard.outcome() else {
            return Ok(Route::SignIn);
        };

        if let Err(e) = profile_service::save_profile(store, &identity.uid, &fields.to_record()).await {
            log::error!("❌ Failed to save profile for user {}: {}", identity.uid, e);
            self.reject(fields, EDIT_FAILED_MESSAGE);
            return Err(e.into());
        }
        Ok(Route::Dashboard)
    }
}

/// Saves the setup fields, then triggers recommendation generation. The
/// engine reads the profile it was just given, so the write is awaited
/// before the call is issued.
pub async fn submit_setup(
    store: &dyn DocumentStore,
    engine: &dyn RecommendationEngine,
    uid: &str,
    fields: &SetupFields,
) -> Result<(), ProfileError> {
    if let Some(missing) = fields.first_missing() {
        return Err(ProfileError::MissingField(missing));
    }

    profile_service::save_profile(store, uid, &fields.to_record())
        .await
        .map_err(|e| {
            log::error!("❌ Failed to save profile for user {}: {}", uid, e);
            e
        })?;

    engine.generate(uid).await.map_err(|e| {
        log::error!("❌ Recommendation generation failed for user {}: {}", uid, e);
        e
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth_service::tests::provider;
    use crate::services::document_store::{Collection, Fields, MemoryDocumentStore, SetOptions};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    /// Records the order of store writes and engine calls.
    #[derive(Default)]
    struct Journal {
        events: Mutex<Vec<String>>,
    }

    impl Journal {
        fn push(&self, event: &str) {
            self.events.lock().unwrap().push(event.to_string());
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    struct JournaledStore {
        inner: MemoryDocumentStore,
        journal: Arc<Journal>,
        fail_writes: bool,
    }

    #[async_trait]
    impl DocumentStore for JournaledStore {
        async fn get_document(&self, collection: Collection, key: &str) -> Result<Option<Fields>, StoreError> {
            self.inner.get_document(collection, key).await
        }

        async fn set_document(
            &self,
            collection: Collection,
            key: &str,
            fields: Fields,
            options: SetOptions,
        ) -> Result<(), StoreError> {
            // yield first so an un-awaited write would be overtaken
            tokio::task::yield_now().await;
            if self.fail_writes {
                return Err(StoreError::Backend("write rejected".into()));
            }
            self.inner.set_document(collection, key, fields, options).await?;
            self.journal.push("write");
            Ok(())
        }
    }

    struct FakeEngine {
        journal: Arc<Journal>,
        status: Option<StatusCode>,
    }

    #[async_trait]
    impl RecommendationEngine for FakeEngine {
        async fn generate(&self, _uid: &str) -> Result<(), RecommendationError> {
            self.journal.push("generate");
            match self.status {
                Some(status) => Err(RecommendationError::Status(status)),
                None => Ok(()),
            }
        }
    }

    fn setup_fields() -> SetupFields {
        SetupFields {
            career_goals: "ML engineer".into(),
            skills: "Python".into(),
            interests: "Deep learning".into(),
        }
    }

    fn fixtures(fail_writes: bool, status: Option<StatusCode>) -> (JournaledStore, FakeEngine, Arc<Journal>) {
        let journal = Arc::new(Journal::default());
        let store = JournaledStore {
            inner: MemoryDocumentStore::new(),
            journal: journal.clone(),
            fail_writes,
        };
        let engine = FakeEngine {
            journal: journal.clone(),
            status,
        };
        (store, engine, journal)
    }

    #[tokio::test]
    async fn test_profile_write_completes_before_engine_call() {
        let (store, engine, journal) = fixtures(false, None);
        submit_setup(&store, &engine, "u1", &setup_fields()).await.unwrap();
        assert_eq!(journal.events(), vec!["write", "generate"]);
    }

    #[tokio::test]
    async fn test_missing_field_touches_nothing() {
        let (store, engine, journal) = fixtures(false, None);
        let fields = SetupFields {
            skills: "  ".into(),
            ..setup_fields()
        };
        let err = submit_setup(&store, &engine, "u1", &fields).await.unwrap_err();
        assert!(matches!(err, ProfileError::MissingField("skills")));
        assert!(journal.events().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_skips_engine() {
        let (store, engine, journal) = fixtures(true, None);
        let err = submit_setup(&store, &engine, "u1", &setup_fields()).await.unwrap_err();
        assert!(matches!(err, ProfileError::Store(_)));
        assert!(journal.events().is_empty());
    }

    #[tokio::test]
    async fn test_engine_failure_blocks_navigation() {
        let (store, engine, _) = fixtures(false, Some(StatusCode::INTERNAL_SERVER_ERROR));
        let client = AuthClient::new(provider());
        client.create_account("a@b.c", "secret123").await.unwrap();

        let mut editor = SetupEditor::mount(Some(&client));
        let err = editor.submit(&store, &engine, setup_fields()).await.unwrap_err();
        assert!(matches!(err, ProfileError::Recommendation(_)));
        assert_eq!(editor.error(), Some(SETUP_FAILED_MESSAGE));
        // the typed values survive for the retry
        assert_eq!(editor.fields(), &setup_fields());
    }

    #[tokio::test]
    async fn test_setup_success_navigates_to_dashboard() {
        let (store, engine, _) = fixtures(false, None);
        let client = AuthClient::new(provider());
        client.create_account("a@b.c", "secret123").await.unwrap();

        let mut editor = SetupEditor::mount(Some(&client));
        let route = editor.submit(&store, &engine, setup_fields()).await.unwrap();
        assert_eq!(route, Route::Dashboard);
        assert_eq!(store.inner.count(Collection::UserData), 1);
    }

    #[tokio::test]
    async fn test_load_without_document_keeps_defaults() {
        let store = MemoryDocumentStore::new();
        let client = AuthClient::new(provider());
        client.create_account("a@b.c", "secret123").await.unwrap();

        let mut editor = EditEditor::mount(Some(&client));
        editor.load(&store).await;
        assert_eq!(editor.fields(), &EditFields::default());
        assert_eq!(editor.error(), None);
    }

    #[tokio::test]
    async fn test_edit_keeps_setup_fields() {
        let (store, engine, _) = fixtures(false, None);
        let client = AuthClient::new(provider());
        let uid = client.create_account("a@b.c", "secret123").await.unwrap().uid;
        submit_setup(&store, &engine, &uid, &setup_fields()).await.unwrap();

        let mut editor = EditEditor::mount(Some(&client));
        let edit = EditFields {
            name: "Grace".into(),
            job_role: "Engineer".into(),
            ..Default::default()
        };
        editor.submit(&store, edit.clone()).await.unwrap();

        let mut setup = SetupEditor::mount(Some(&client));
        setup.load(&store).await;
        assert_eq!(setup.fields(), &setup_fields());

        let mut reloaded = EditEditor::mount(Some(&client));
        reloaded.load(&store).await;
        assert_eq!(reloaded.fields(), &edit);
    }

    #[tokio::test]
    async fn test_edit_write_failure_surfaces_retry_message() {
        let (store, _, _) = fixtures(true, None);
        let client = AuthClient::new(provider());
        client.create_account("a@b.c", "secret123").await.unwrap();

        let mut editor = EditEditor::mount(Some(&client));
        assert!(editor.submit(&store, EditFields::default()).await.is_err());
        assert_eq!(editor.error(), Some(EDIT_FAILED_MESSAGE));
    }
}
