//! Versioned JSON documents stored per service object config.
//!
//! Two fixed kinds exist: JSON-LD contexts and CBOR-LD registry entries. The
//! kind is stamped by the server into `meta.type`; clients never supply it.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod guard;
pub mod service;
pub mod store;
pub mod upsert;
pub mod validation;

pub use service::DocumentService;
pub use store::{Abort, ConflictRule, DocumentStore, Resolution, UpsertOutcome};

/// Id prefix every registry entry document must carry.
pub const CBORLD_REGISTRY_ENTRY_URN_PREFIX: &str = "urn:cborld:registry-entry:";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    JsonLdContext,
    CborLdRegistryEntry,
}

impl DocumentKind {
    /// Value written to `meta.type`.
    pub const fn as_str(self) -> &'static str {
        match self {
            DocumentKind::JsonLdContext => "JsonLdContext",
            DocumentKind::CborLdRegistryEntry => "CborLdRegistryEntry",
        }
    }

    /// Name of the body/content property carrying the payload.
    pub const fn content_property(self) -> &'static str {
        match self {
            DocumentKind::JsonLdContext => "context",
            DocumentKind::CborLdRegistryEntry => "registryEntry",
        }
    }

    /// Human readable noun used in error messages.
    pub const fn noun(self) -> &'static str {
        match self {
            DocumentKind::JsonLdContext => "Context",
            DocumentKind::CborLdRegistryEntry => "CBOR-LD registry entry",
        }
    }

    /// Lower-case noun for mid-sentence use.
    pub const fn label(self) -> &'static str {
        match self {
            DocumentKind::JsonLdContext => "context",
            DocumentKind::CborLdRegistryEntry => "CBOR-LD registry entry",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            DocumentKind::JsonLdContext => "a JSON-LD context",
            DocumentKind::CborLdRegistryEntry => "a CBOR-LD registry entry",
        }
    }

    pub fn matches(self, stored_type: &str) -> bool {
        self.as_str() == stored_type
    }

    /// Stored content: `{id, <contentProperty>}`.
    pub fn content(self, id: &str, payload: Value) -> Value {
        let mut obj = Map::new();
        obj.insert("id".into(), Value::String(id.to_string()));
        obj.insert(self.content_property().into(), payload);
        Value::Object(obj)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Raw kind string; may hold types this service does not know.
    #[serde(rename = "type")]
    pub doc_type: String,
}

/// Document body handed to a store for commit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub id: String,
    pub content: Value,
    pub meta: DocumentMeta,
}

impl NewDocument {
    pub fn new(kind: DocumentKind, id: &str, payload: Value) -> Self {
        Self {
            id: id.to_string(),
            content: kind.content(id, payload),
            meta: DocumentMeta { doc_type: kind.as_str().to_string() },
        }
    }

    /// Escape hatch for foreign or legacy `meta.type` values.
    pub fn with_type(id: &str, content: Value, doc_type: &str) -> Self {
        Self { id: id.to_string(), content, meta: DocumentMeta { doc_type: doc_type.to_string() } }
    }
}

/// A document as committed by a store, with its current sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub content: Value,
    pub meta: DocumentMeta,
    pub sequence: i64,
}

impl StoredDocument {
    /// Payload stored under the kind's content property.
    pub fn payload(&self, kind: DocumentKind) -> Option<&Value> {
        self.content.get(kind.content_property())
    }

    /// Response body `{id, <contentProperty>, sequence}`.
    pub fn to_body(&self, kind: DocumentKind) -> Value {
        let mut obj = Map::new();
        let id = self.content.get("id").cloned().unwrap_or_else(|| Value::String(self.id.clone()));
        obj.insert("id".into(), id);
        obj.insert(kind.content_property().into(), self.payload(kind).cloned().unwrap_or(Value::Null));
        obj.insert("sequence".into(), Value::from(self.sequence));
        Value::Object(obj)
    }
}

impl From<models::document::Model> for StoredDocument {
    fn from(m: models::document::Model) -> Self {
        Self { id: m.id, content: m.content, meta: DocumentMeta { doc_type: m.doc_type }, sequence: m.sequence }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_tags_and_properties() {
        assert_eq!(DocumentKind::JsonLdContext.as_str(), "JsonLdContext");
        assert_eq!(DocumentKind::CborLdRegistryEntry.content_property(), "registryEntry");
        assert!(DocumentKind::JsonLdContext.matches("JsonLdContext"));
        assert!(!DocumentKind::JsonLdContext.matches("different"));
    }

    #[test]
    fn new_document_stamps_kind_and_content() {
        let doc = NewDocument::new(DocumentKind::JsonLdContext, "https://test.example/v1", json!({"@context": {}}));
        assert_eq!(doc.meta.doc_type, "JsonLdContext");
        assert_eq!(doc.content, json!({"id": "https://test.example/v1", "context": {"@context": {}}}));
    }

    #[test]
    fn stored_document_serializes_store_shape() {
        let stored = StoredDocument {
            id: "x".into(),
            content: json!({"id": "x", "context": {"@context": "https://a.example"}}),
            meta: DocumentMeta { doc_type: "JsonLdContext".into() },
            sequence: 3,
        };
        let v = serde_json::to_value(&stored).unwrap();
        assert_eq!(v["meta"]["type"], "JsonLdContext");
        assert_eq!(
            stored.to_body(DocumentKind::JsonLdContext),
            json!({"id": "x", "context": {"@context": "https://a.example"}, "sequence": 3})
        );
    }
}
