use crate::models::FeedbackRecord;
use crate::services::document_store::{to_fields, Collection, DocumentStore, SetOptions, StoreError};

/// Merge-writes `feedback/<uid>`; the previous submission is overwritten.
pub async fn store_feedback(store: &dyn DocumentStore, uid: &str, record: &FeedbackRecord) -> Result<(), StoreError> {
    let fields = to_fields(record)?;
    store
        .set_document(Collection::Feedback, uid, fields, SetOptions::merge())
        .await
}

#[cfg(test)]
pub async fn load_feedback(store: &dyn DocumentStore, uid: &str) -> Result<Option<FeedbackRecord>, StoreError> {
    match store.get_document(Collection::Feedback, uid).await? {
        Some(fields) => crate::services::document_store::from_fields(Collection::Feedback, uid, fields).map(Some),
        None => Ok(None),
    }
}
