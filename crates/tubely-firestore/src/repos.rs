//! Video record store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;
use tubely_models::{VideoId, VideoRecord};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FromFirestoreValue, ToFirestoreValue, Value};

/// Collection holding video records, keyed by video UUID.
pub const VIDEOS_COLLECTION: &str = "videos";

pub const VIDEO_URL_FIELD: &str = "video_url";
pub const THUMBNAIL_URL_FIELD: &str = "thumbnail_url";
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Lookup and field-scoped writes of video records.
///
/// Each setter touches one field plus `updated_at`; everything else on the
/// stored document is left as it is at write time.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Fetch a record, `None` if it does not exist.
    async fn get(&self, id: &VideoId) -> FirestoreResult<Option<VideoRecord>>;

    /// Point an existing record at its stored video, returning the record as
    /// stored after the write.
    async fn set_video_url(&self, id: &VideoId, video_url: &str) -> FirestoreResult<VideoRecord>;

    /// Attach a thumbnail to an existing record, returning the record as
    /// stored after the write.
    async fn set_thumbnail_url(
        &self,
        id: &VideoId,
        thumbnail_url: &str,
    ) -> FirestoreResult<VideoRecord>;
}

/// Firestore-backed [`VideoStore`].
#[derive(Clone)]
pub struct VideoRepository {
    client: FirestoreClient,
    collection: String,
}

impl VideoRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self {
            client,
            collection: VIDEOS_COLLECTION.to_string(),
        }
    }

    /// Use a different collection path.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    async fn set_field(&self, id: &VideoId, field: &str, value: &str) -> FirestoreResult<VideoRecord> {
        let doc = self
            .client
            .update_document(
                &self.collection,
                &id.to_string(),
                field_update(field, value, Utc::now()),
                &[field, UPDATED_AT_FIELD],
            )
            .await?;
        info!(video_id = %id, field, "Updated video record");
        document_to_video_record(&doc, id)
    }
}

#[async_trait]
impl VideoStore for VideoRepository {
    async fn get(&self, id: &VideoId) -> FirestoreResult<Option<VideoRecord>> {
        let doc = self
            .client
            .get_document(&self.collection, &id.to_string())
            .await?;

        doc.map(|d| document_to_video_record(&d, id)).transpose()
    }

    async fn set_video_url(&self, id: &VideoId, video_url: &str) -> FirestoreResult<VideoRecord> {
        self.set_field(id, VIDEO_URL_FIELD, video_url).await
    }

    async fn set_thumbnail_url(
        &self,
        id: &VideoId,
        thumbnail_url: &str,
    ) -> FirestoreResult<VideoRecord> {
        self.set_field(id, THUMBNAIL_URL_FIELD, thumbnail_url).await
    }
}

/// Body of a single-field write; pair it with the mask `[field, "updated_at"]`.
pub fn field_update(field: &str, value: &str, now: DateTime<Utc>) -> HashMap<String, Value> {
    HashMap::from([
        (field.to_string(), value.to_firestore_value()),
        (UPDATED_AT_FIELD.to_string(), now.to_firestore_value()),
    ])
}

/// Build a record from a stored document.
pub fn document_to_video_record(doc: &Document, id: &VideoId) -> FirestoreResult<VideoRecord> {
    if doc.fields.is_none() {
        return Err(FirestoreError::InvalidResponse(format!(
            "Video {} has no fields",
            id
        )));
    }

    let get_string = |key: &str| -> Option<String> {
        doc.field(key).and_then(String::from_firestore_value)
    };
    let get_time = |key: &str| -> Option<DateTime<Utc>> {
        doc.field(key).and_then(DateTime::<Utc>::from_firestore_value)
    };

    let user_id = get_string("user_id")
        .filter(|u| !u.is_empty())
        .ok_or_else(|| FirestoreError::InvalidResponse(format!("Video {} has no owner", id)))?;

    let created_at = get_time("created_at").unwrap_or_else(Utc::now);

    Ok(VideoRecord {
        id: *id,
        user_id,
        title: get_string("title").unwrap_or_default(),
        description: get_string("description").unwrap_or_default(),
        thumbnail_url: get_string("thumbnail_url"),
        video_url: get_string("video_url"),
        created_at,
        updated_at: get_time("updated_at").unwrap_or(created_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(fields: Vec<(&str, Value)>) -> Document {
        Document::new(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn test_document_to_record() {
        let id = VideoId::new();
        let doc = stored(vec![
            ("user_id", Value::StringValue("user-1".into())),
            ("title", Value::StringValue("Boots".into())),
            ("video_url", Value::StringValue("videos,landscape/abc.mp4".into())),
            ("thumbnail_url", Value::NullValue(())),
            ("created_at", Value::TimestampValue("2024-05-01T10:00:00Z".into())),
        ]);

        let record = document_to_video_record(&doc, &id).unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.user_id, "user-1");
        assert_eq!(record.title, "Boots");
        assert_eq!(record.description, "");
        assert_eq!(record.video_url.as_deref(), Some("videos,landscape/abc.mp4"));
        assert!(record.thumbnail_url.is_none());
        assert_eq!(record.updated_at, record.created_at);
    }

    #[test]
    fn test_document_without_owner_is_invalid() {
        let id = VideoId::new();
        let doc = stored(vec![("title", Value::StringValue("orphan".into()))]);
        assert!(matches!(
            document_to_video_record(&doc, &id),
            Err(FirestoreError::InvalidResponse(_))
        ));

        let empty = Document {
            name: None,
            fields: None,
            create_time: None,
            update_time: None,
        };
        assert!(document_to_video_record(&empty, &id).is_err());
    }

    #[test]
    fn test_field_update_carries_only_its_field() {
        let now = Utc::now();
        let fields = field_update(VIDEO_URL_FIELD, "videos,portrait/xyz.mp4", now);

        let mut keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["updated_at", "video_url"]);
        assert_eq!(
            fields.get("video_url"),
            Some(&Value::StringValue("videos,portrait/xyz.mp4".into()))
        );
        assert_eq!(fields.get("updated_at"), Some(&now.to_firestore_value()));
        assert!(!fields.contains_key("thumbnail_url"));
        assert!(!fields.contains_key("title"));
    }

    #[test]
    fn test_patched_document_keeps_other_fields() {
        let id = VideoId::new();
        // Server response after a thumbnail-only write
        let mut fields = field_update(THUMBNAIL_URL_FIELD, "data:image/png;base64,AAAA", Utc::now());
        fields.insert("user_id".to_string(), Value::StringValue("user-1".into()));
        fields.insert("video_url".to_string(), Value::StringValue("videos,other/k.mp4".into()));
        fields.insert("created_at".to_string(), Value::TimestampValue("2024-05-01T10:00:00Z".into()));

        let record = document_to_video_record(&Document::new(fields), &id).unwrap();
        assert_eq!(record.thumbnail_url.as_deref(), Some("data:image/png;base64,AAAA"));
        assert_eq!(record.video_url.as_deref(), Some("videos,other/k.mp4"));
        assert_eq!(record.user_id, "user-1");
    }
}
