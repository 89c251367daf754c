//! Dashboard carousel: one recommended course at a time, wrapping around at
//! both ends.

use std::sync::Arc;

use super::guard::{GuardOutcome, SessionGuard};
use super::lifecycle::ViewScope;
use super::state::ViewState;
use crate::models::Course;
use crate::services::auth_service::AuthClient;
use crate::services::course_service;
use crate::services::document_store::DocumentStore;

/// Circular cursor over a non-empty list. An empty list has no carousel at
/// all (the view shows "no recommendations"), so the modulus is never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Carousel<T> {
    items: Vec<T>,
    index: usize,
}

impl<T> Carousel<T> {
    pub fn new(items: Vec<T>) -> Option<Self> {
        if items.is_empty() {
            return None;
        }
        Some(Self { items, index: 0 })
    }

    pub fn next(&mut self) {
        self.index = self.next_index();
    }

    pub fn prev(&mut self) {
        self.index = self.prev_index();
    }

    pub fn next_index(&self) -> usize {
        (self.index + 1) % self.items.len()
    }

    pub fn prev_index(&self) -> usize {
        (self.index + self.items.len() - 1) % self.items.len()
    }

    /// Jumps to `index`, wrapping out-of-range positions.
    pub fn seek(&mut self, index: usize) {
        self.index = index % self.items.len();
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn current(&self) -> &T {
        &self.items[self.index]
    }
}

pub struct DashboardView {
    scope: ViewScope,
    guard: SessionGuard,
    courses: ViewState<Carousel<Course>>,
}

impl DashboardView {
    pub fn mount(session: Option<&Arc<AuthClient>>) -> Self {
        let scope = ViewScope::mount();
        let guard = SessionGuard::subscribe(session, &scope);
        Self {
            scope,
            guard,
            courses: ViewState::Loading,
        }
    }

    pub fn outcome(&self) -> GuardOutcome {
        self.guard.outcome()
    }

    pub async fn load(&mut self, store: &dyn DocumentStore) {
        let GuardOutcome::Allow(identity) = self.guard.outcome() else {
            return;
        };
        let Some(fetched) = self
            .guard
            .run_signed_in(&self.scope, course_service::fetch_recommendations(store, &identity.uid))
            .await
        else {
            return;
        };

        let carousel = fetched.map(|courses| courses.and_then(Carousel::new));
        self.courses = ViewState::settle_list(carousel, |_| false, "dashboard recommendations");
    }

    pub fn state(&self) -> &ViewState<Carousel<Course>> {
        &self.courses
    }

    pub fn seek(&mut self, index: usize) {
        if let ViewState::Ready(carousel) = &mut self.courses {
            carousel.seek(index);
        }
    }

    pub fn next(&mut self) {
        if let ViewState::Ready(carousel) = &mut self.courses {
            carousel.next();
        }
    }

    pub fn prev(&mut self) {
        if let ViewState::Ready(carousel) = &mut self.courses {
            carousel.prev();
        }
    }
}
