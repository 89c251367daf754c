use crate::models::FeedbackRecord;
use crate::services::document_store::{DocumentStore, StoreError};
use crate::services::feedback_service;

#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("feedback text is empty")]
    Empty,

    #[error("failed to store feedback: {0}")]
    Store(#[from] StoreError),
}

pub const FEEDBACK_EMPTY_MESSAGE: &str = "Please enter your feedback.";
pub const FEEDBACK_SENT_MESSAGE: &str = "Feedback submitted successfully!";
pub const FEEDBACK_FAILED_MESSAGE: &str = "There was an error submitting your feedback. Please try again later.";

/// Overwrites the user's single feedback document. Blank text never reaches
/// the store.
pub async fn submit_feedback(store: &dyn DocumentStore, uid: &str, text: &str) -> Result<(), FeedbackError> {
    if text.trim().is_empty() {
        return Err(FeedbackError::Empty);
    }

    feedback_service::store_feedback(store, uid, &FeedbackRecord::now(text)).await?;
    log::info!("Feedback stored for user {}", uid);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Sent,
    Invalid,
    Failed,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::Sent => FEEDBACK_SENT_MESSAGE,
            Notice::Invalid => FEEDBACK_EMPTY_MESSAGE,
            Notice::Failed => FEEDBACK_FAILED_MESSAGE,
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Notice::Sent)
    }

    /// Query-string key used when the notice travels through a redirect.
    pub fn key(&self) -> &'static str {
        match self {
            Notice::Sent => "feedback-sent",
            Notice::Invalid => "feedback-empty",
            Notice::Failed => "feedback-failed",
        }
    }

    pub fn from_key(key: &str) -> Option<Notice> {
        match key {
            "feedback-sent" => Some(Notice::Sent),
            "feedback-empty" => Some(Notice::Invalid),
            "feedback-failed" => Some(Notice::Failed),
            _ => None,
        }
    }
}

/// Feedback textarea with its last notice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackForm {
    pub text: String,
    pub notice: Option<Notice>,
}

impl FeedbackForm {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            notice: None,
        }
    }

    /// Submits the current text. The input is cleared only on success.
    pub async fn submit(&mut self, store: &dyn DocumentStore, uid: &str) -> Notice {
        let notice = match submit_feedback(store, uid, &self.text).await {
            Ok(()) => {
                self.text.clear();
                Notice::Sent
            }
            Err(FeedbackError::Empty) => Notice::Invalid,
            Err(FeedbackError::Store(e)) => {
                log::error!("❌ Failed to store feedback for user {}: {}", uid, e);
                Notice::Failed
            }
        };
        self.notice = Some(notice);
        notice
    }
}
