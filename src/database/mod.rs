pub mod firestore;

use async_trait::async_trait;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, Collection as MongoCollection, Database};
use serde_json::Value;
use std::error::Error;

use crate::services::document_store::{Collection, DocumentStore, Fields, SetOptions, StoreError};

pub use firestore::Firestore;

/// MongoDB-backed document store. Each collection maps onto a MongoDB
/// collection of the same name and the owner's uid is the `_id`.
#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));
        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));
        client_options.app_name = Some("course-recommender".to_string());

        let client = Client::with_options(client_options)?;

        // Extract database name from URI or use default
        let db_name = database_name(uri);
        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;
        log::info!("✅ Connected to MongoDB database: {}", db_name);

        Ok(Self { db })
    }

    fn collection(&self, collection: Collection) -> MongoCollection<Document> {
        self.db.collection(collection.as_str())
    }
}

fn database_name(uri: &str) -> &str {
    let rest = uri.split_once("://").map(|(_, rest)| rest).unwrap_or(uri);
    rest.split_once('/')
        .and_then(|(_, path)| path.split('?').next())
        .filter(|name| !name.is_empty())
        .unwrap_or("course_recommender")
}

fn backend(e: mongodb::error::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn into_fields(mut document: Document) -> Fields {
    document.remove("_id");
    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

#[async_trait]
impl DocumentStore for MongoDB {
    async fn get_document(&self, collection: Collection, key: &str) -> Result<Option<Fields>, StoreError> {
        let found = self
            .collection(collection)
            .find_one(doc! { "_id": key })
            .await
            .map_err(backend)?;
        Ok(found.map(into_fields))
    }

    async fn set_document(
        &self,
        collection: Collection,
        key: &str,
        fields: Fields,
        options: SetOptions,
    ) -> Result<(), StoreError> {
        let body = mongodb::bson::to_document(&fields)
            .map_err(|e| StoreError::Backend(format!("Failed to encode document: {}", e)))?;
        let filter = doc! { "_id": key };
        let target = self.collection(collection);

        if options.merge {
            // `$set` rejects an empty document; still create the record.
            let update = if body.is_empty() {
                doc! { "$setOnInsert": { "_id": key } }
            } else {
                doc! { "$set": body }
            };
            target.update_one(filter, update).upsert(true).await.map_err(backend)?;
        } else {
            target.replace_one(filter, body).upsert(true).await.map_err(backend)?;
        }

        log::debug!("Stored {}/{} (merge: {})", collection, key, options.merge);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_name_from_uri() {
        assert_eq!(database_name("mongodb://localhost:27017/courses"), "courses");
        assert_eq!(database_name("mongodb://localhost:27017/courses?retryWrites=true"), "courses");
        assert_eq!(database_name("mongodb://localhost:27017"), "course_recommender");
        assert_eq!(database_name("mongodb+srv://user:pw@cluster.example.net/"), "course_recommender");
    }

    #[test]
    fn test_into_fields_strips_id() {
        let document = doc! { "_id": "u1", "text": "hello", "count": 3_i64 };
        let fields = into_fields(document);
        assert!(fields.get("_id").is_none());
        assert_eq!(fields["text"], "hello");
        assert_eq!(fields["count"], 3);
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongodb_merge_roundtrip() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL").unwrap_or_else(|_| "mongodb://localhost:27017/course_recommender_test".to_string());
        let db = MongoDB::new(&uri).await.unwrap();

        let mut first = Fields::new();
        first.insert("a".into(), Value::from(1));
        db.set_document(Collection::UserData, "it-user", first, SetOptions::merge()).await.unwrap();

        let mut second = Fields::new();
        second.insert("b".into(), Value::from(2));
        db.set_document(Collection::UserData, "it-user", second, SetOptions::merge()).await.unwrap();

        let stored = db.get_document(Collection::UserData, "it-user").await.unwrap().unwrap();
        assert_eq!(stored["a"], 1);
        assert_eq!(stored["b"], 2);
    }
}
