use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document at `feedback/<uid>`. One per user; each submission overwrites it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FeedbackRecord {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}
