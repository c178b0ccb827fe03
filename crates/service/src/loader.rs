//! Read-only resolvers for other subsystems: JSON-LD contexts by URL and
//! CBOR-LD type tables by registry entry number.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Number, Value};

use crate::document::{guard, DocumentKind, DocumentService, CBORLD_REGISTRY_ENTRY_URN_PREFIX};
use crate::errors::ServiceError;

/// Type name -> (table key -> value).
pub type TypeTables = BTreeMap<String, BTreeMap<String, Number>>;

/// Result shape expected by JSON-LD processors.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    pub context_url: Option<String>,
    pub document_url: String,
    pub document: Value,
}

/// Resolves stored contexts for one service object config.
#[derive(Clone)]
pub struct ContextDocumentLoader {
    documents: DocumentService,
    config_id: String,
}

impl ContextDocumentLoader {
    pub fn new(documents: DocumentService, config_id: impl Into<String>) -> Self {
        Self { documents, config_id: config_id.into() }
    }

    pub async fn load(&self, url: &str) -> Result<RemoteDocument, ServiceError> {
        let kind = DocumentKind::JsonLdContext;
        let doc = guard::get_typed(self.documents.store().as_ref(), &self.config_id, url, kind)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Document \"{url}\" not found.")))?;
        Ok(RemoteDocument {
            context_url: None,
            document_url: url.to_string(),
            document: doc.payload(kind).cloned().unwrap_or(Value::Null),
        })
    }
}

/// Resolves CBOR-LD type tables for one service object config.
#[derive(Clone)]
pub struct TypeTableLoader {
    documents: DocumentService,
    config_id: String,
}

impl TypeTableLoader {
    pub fn new(documents: DocumentService, config_id: impl Into<String>) -> Self {
        Self { documents, config_id: config_id.into() }
    }

    pub async fn load(&self, registry_entry_id: u64) -> Result<TypeTables, ServiceError> {
        let kind = DocumentKind::CborLdRegistryEntry;
        let id = format!("{CBORLD_REGISTRY_ENTRY_URN_PREFIX}{registry_entry_id}");
        let doc = guard::get_typed(self.documents.store().as_ref(), &self.config_id, &id, kind)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("CBOR-LD registry entry \"{registry_entry_id}\" not found."))
            })?;
        let entry = doc.payload(kind).ok_or_else(|| ServiceError::Corrupt(format!("{id} has no registryEntry")))?;
        normalize_registry_entry(entry)
    }
}

/// Flatten either registry entry shape into [`TypeTables`].
///
/// Array form: `[{"type": "context", "table": {...}}, ...]`.
/// Object form: `{"context": {...}, ...}`.
pub fn normalize_registry_entry(entry: &Value) -> Result<TypeTables, ServiceError> {
    let pairs: Vec<(&str, &Value)> = match entry {
        Value::Array(items) => items
            .iter()
            .map(|item| match (item.get("type").and_then(Value::as_str), item.get("table")) {
                (Some(ty), Some(table)) => Ok((ty, table)),
                _ => Err(ServiceError::Corrupt("registry entry item lacks type or table".into())),
            })
            .collect::<Result<_, _>>()?,
        Value::Object(tables) => tables.iter().map(|(ty, table)| (ty.as_str(), table)).collect(),
        _ => return Err(ServiceError::Corrupt("registry entry is neither array nor object".into())),
    };

    let mut out = TypeTables::new();
    for (ty, table) in pairs {
        let table = table
            .as_object()
            .ok_or_else(|| ServiceError::Corrupt(format!("type table {ty} is not an object")))?;
        let mut entries = BTreeMap::new();
        for (key, value) in table {
            let Value::Number(n) = value else {
                return Err(ServiceError::Corrupt(format!("type table {ty} has non-numeric value for {key}")));
            };
            entries.insert(key.clone(), n.clone());
        }
        out.insert(ty.to_string(), entries);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentStore, NewDocument};
    use crate::storage::file_store::JsonFileDocumentStore;
    use serde_json::json;

    const CONFIG: &str = "https://localhost/service-objects/z1";

    async fn documents() -> DocumentService {
        let tmp = std::env::temp_dir().join(format!("loader_{}.json", uuid::Uuid::new_v4()));
        DocumentService::new(JsonFileDocumentStore::open(&tmp).await.unwrap())
    }

    #[tokio::test]
    async fn context_loader_returns_stored_context() {
        let docs = documents().await;
        let body = json!({"id": "https://test.example/v1", "context": {"@context": {"a": "https://a.example#"}}});
        docs.create(CONFIG, DocumentKind::JsonLdContext, &body).await.unwrap();

        let loader = ContextDocumentLoader::new(docs, CONFIG);
        let remote = loader.load("https://test.example/v1").await.unwrap();
        assert_eq!(remote.context_url, None);
        assert_eq!(remote.document_url, "https://test.example/v1");
        assert_eq!(remote.document, body["context"]);
    }

    #[tokio::test]
    async fn context_loader_hides_foreign_kind() {
        let docs = documents().await;
        docs.store()
            .put_unchecked(CONFIG, NewDocument::with_type("https://test.example/v1", json!({"context": {}}), "different"))
            .await
            .unwrap();
        let loader = ContextDocumentLoader::new(docs, CONFIG);
        let err = loader.load("https://test.example/v1").await.unwrap_err();
        assert_eq!(err.to_string(), "Document \"https://test.example/v1\" not found.");
    }

    #[tokio::test]
    async fn both_registry_shapes_normalize_identically() {
        let docs = documents().await;
        let array = json!({
            "id": "urn:cborld:registry-entry:1",
            "registryEntry": [
                {"type": "context", "table": {"https://www.w3.org/ns/credentials/v2": 1}},
                {"type": "url", "table": {"https://foo.example": 2}}
            ]
        });
        let object = json!({
            "id": "urn:cborld:registry-entry:2",
            "registryEntry": {
                "context": {"https://www.w3.org/ns/credentials/v2": 1},
                "url": {"https://foo.example": 2}
            }
        });
        docs.create(CONFIG, DocumentKind::CborLdRegistryEntry, &array).await.unwrap();
        docs.create(CONFIG, DocumentKind::CborLdRegistryEntry, &object).await.unwrap();

        let loader = TypeTableLoader::new(docs, CONFIG);
        let a = loader.load(1).await.unwrap();
        let b = loader.load(2).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a["context"]["https://www.w3.org/ns/credentials/v2"], Number::from(1));
        assert_eq!(a.len(), 2);
    }

    #[tokio::test]
    async fn type_table_loader_hides_foreign_kind() {
        let docs = documents().await;
        // a context stored under a registry entry id is not a registry entry
        docs.store()
            .put_unchecked(
                CONFIG,
                NewDocument::new(DocumentKind::JsonLdContext, "urn:cborld:registry-entry:7", json!({"@context": {}})),
            )
            .await
            .unwrap();
        let loader = TypeTableLoader::new(docs, CONFIG);
        let err = loader.load(7).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(err.to_string(), "CBOR-LD registry entry \"7\" not found.");
    }

    #[tokio::test]
    async fn type_table_loader_missing_entry() {
        let loader = TypeTableLoader::new(documents().await, CONFIG);
        let err = loader.load(42).await.unwrap_err();
        assert_eq!(err.to_string(), "CBOR-LD registry entry \"42\" not found.");
    }
}
