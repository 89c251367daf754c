use crate::models::{Course, StoredRecommendations};
use crate::services::document_store::{from_fields, Collection, DocumentStore, StoreError};

/// Reads the course list at `recommendations/<uid>`, in stored order.
/// `None` means the engine has not produced a document for this user yet.
/// Rows that are not courses are logged and skipped.
pub async fn fetch_recommendations(store: &dyn DocumentStore, uid: &str) -> Result<Option<Vec<Course>>, StoreError> {
    let Some(fields) = store.get_document(Collection::Recommendations, uid).await? else {
        return Ok(None);
    };
    let stored: StoredRecommendations = from_fields(Collection::Recommendations, uid, fields)?;
    let (document, rejected) = stored.decode();
    for row in rejected {
        log::warn!(
            "⚠️  Skipping course row {} of recommendations/{}: {}",
            row.position,
            uid,
            row.error
        );
    }
    Ok(Some(document.courses))
}
