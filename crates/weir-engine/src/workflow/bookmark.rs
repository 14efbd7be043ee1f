//! Bookmarks: persisted resumption points

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::graph::NodeId;

/// Options applied when creating a bookmark
#[derive(Debug, Clone)]
pub struct BookmarkOptions {
    /// Opaque payload carried on the bookmark
    pub payload: Value,

    /// Handler method dispatched on resumption
    pub callback_method: Option<String>,

    /// Remove the bookmark when it is resumed
    pub auto_burn: bool,

    /// Complete the owning activity when the resume callback returns
    /// without completing it explicitly
    pub auto_complete: bool,
}

impl Default for BookmarkOptions {
    fn default() -> Self {
        Self {
            payload: Value::Null,
            callback_method: None,
            auto_burn: true,
            auto_complete: false,
        }
    }
}

impl BookmarkOptions {
    /// Set the payload
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Set the resume callback method name
    pub fn with_callback(mut self, method: impl Into<String>) -> Self {
        self.callback_method = Some(method.into());
        self
    }

    /// Complete the owning activity after the resume callback
    pub fn auto_complete(mut self) -> Self {
        self.auto_complete = true;
        self
    }

    /// Keep the bookmark after resumption
    pub fn keep_after_resume(mut self) -> Self {
        self.auto_burn = false;
        self
    }
}

/// A persisted handle naming a future resumption point
///
/// `hash` is a deterministic fingerprint of `(name, payload)`; external
/// triggers look bookmarks up by hash without loading workflow state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Unique bookmark id
    pub id: Uuid,

    /// Node the bookmark belongs to
    pub activity_node_id: NodeId,

    /// Execution context the bookmark belongs to
    pub activity_instance_id: Uuid,

    /// Bookmark name (for example an event name)
    pub name: String,

    /// Deterministic fingerprint of `(name, payload)`
    pub hash: String,

    /// Opaque payload
    pub payload: Value,

    /// Handler method dispatched on resumption
    pub callback_method: Option<String>,

    /// Remove the bookmark when it is resumed
    pub auto_burn: bool,

    /// Complete the owning activity after the resume callback
    pub auto_complete: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    /// Create a bookmark for an execution context
    pub fn new(
        id: Uuid,
        activity_node_id: NodeId,
        activity_instance_id: Uuid,
        name: impl Into<String>,
        options: BookmarkOptions,
    ) -> Self {
        let name = name.into();
        let hash = Self::compute_hash(&name, &options.payload);
        Self {
            id,
            activity_node_id,
            activity_instance_id,
            name,
            hash,
            payload: options.payload,
            callback_method: options.callback_method,
            auto_burn: options.auto_burn,
            auto_complete: options.auto_complete,
            created_at: Utc::now(),
        }
    }

    /// Hex SHA-256 over the canonical JSON of `(name, payload)`
    pub fn compute_hash(name: &str, payload: &Value) -> String {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        hasher.update(b"\x00");
        // serde_json produces a stable rendering for a given Value
        hasher.update(payload.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hash_is_deterministic() {
        let a = Bookmark::compute_hash("evt", &json!({"k": 1}));
        let b = Bookmark::compute_hash("evt", &json!({"k": 1}));
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_varies_with_name_and_payload() {
        let base = Bookmark::compute_hash("evt", &Value::Null);
        assert_ne!(base, Bookmark::compute_hash("other", &Value::Null));
        assert_ne!(base, Bookmark::compute_hash("evt", &json!(1)));
    }

    #[test]
    fn test_bookmark_serialization() {
        let bookmark = Bookmark::new(
            Uuid::now_v7(),
            "seq:wait".into(),
            Uuid::now_v7(),
            "evt",
            BookmarkOptions::default().auto_complete(),
        );

        let encoded = serde_json::to_string(&bookmark).unwrap();
        let decoded: Bookmark = serde_json::from_str(&encoded).unwrap();
        assert_eq!(bookmark, decoded);
    }
}
