use crate::models::ProfileRecord;
use crate::services::document_store::{from_fields, to_fields, Collection, DocumentStore, SetOptions, StoreError};

/// Reads `userData/<uid>`. A missing document yields an empty record.
pub async fn load_profile(store: &dyn DocumentStore, uid: &str) -> Result<ProfileRecord, StoreError> {
    match store.get_document(Collection::UserData, uid).await? {
        Some(fields) => from_fields(Collection::UserData, uid, fields),
        None => Ok(ProfileRecord::default()),
    }
}

/// Merge-writes the fields set in `record`; unset fields are left untouched.
pub async fn save_profile(store: &dyn DocumentStore, uid: &str, record: &ProfileRecord) -> Result<(), StoreError> {
    let fields = to_fields(record)?;
    store
        .set_document(Collection::UserData, uid, fields, SetOptions::merge())
        .await?;
    log::info!("Profile saved for user {}", uid);
    Ok(())
}
