pub mod auth_service;
pub mod course_service;
pub mod document_store;
pub mod feedback_service;
pub mod identity_service;
pub mod profile_service;
pub mod recommendation_service;
