//! Request body validation for document create and update bodies.
//!
//! Every failure is reported as a `ValidationError` naming the validator and
//! listing each offending path.

use serde_json::{Map, Value};

use super::{DocumentKind, CBORLD_REGISTRY_ENTRY_URN_PREFIX};
use crate::errors::ServiceError;

/// Largest accepted `sequence` (2^53 - 2).
pub const MAX_SEQUENCE: i64 = 9_007_199_254_740_990;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyOp {
    Create,
    Update,
}

pub fn validator_name(kind: DocumentKind, op: BodyOp) -> &'static str {
    match (kind, op) {
        (DocumentKind::JsonLdContext, BodyOp::Create) => "createContextBody",
        (DocumentKind::JsonLdContext, BodyOp::Update) => "updateContextBody",
        (DocumentKind::CborLdRegistryEntry, BodyOp::Create) => "createCborLdRegistryEntryBody",
        (DocumentKind::CborLdRegistryEntry, BodyOp::Update) => "updateCborLdRegistryEntryBody",
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateBody {
    pub id: String,
    pub payload: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateBody {
    pub id: String,
    pub payload: Value,
    pub sequence: i64,
}

pub fn validate_create(kind: DocumentKind, body: &Value) -> Result<CreateBody, ServiceError> {
    let name = validator_name(kind, BodyOp::Create);
    let mut errors = Vec::new();
    let obj = check_envelope(body, &["id", kind.content_property()], &mut errors);
    let (id, payload) = match obj {
        Some(obj) => check_id_and_payload(kind, obj, &mut errors),
        None => (None, None),
    };
    match (id, payload) {
        (Some(id), Some(payload)) if errors.is_empty() => Ok(CreateBody { id, payload }),
        _ => Err(ServiceError::Validation { validator: name, errors }),
    }
}

/// Validate an update body whose `id` must equal `path_id`.
pub fn validate_update(kind: DocumentKind, body: &Value, path_id: &str) -> Result<UpdateBody, ServiceError> {
    let name = validator_name(kind, BodyOp::Update);
    let mut errors = Vec::new();
    let Some(obj) = check_envelope(body, &["id", kind.content_property(), "sequence"], &mut errors) else {
        return Err(ServiceError::Validation { validator: name, errors });
    };
    let (id, payload) = check_id_and_payload(kind, obj, &mut errors);
    let sequence = obj.get("sequence").and_then(|v| match as_integer(v) {
        Some(n) if (0..=MAX_SEQUENCE).contains(&n) => Some(n),
        _ => {
            errors.push(format!("/sequence must be an integer between 0 and {MAX_SEQUENCE}"));
            None
        }
    });
    if let Some(id) = &id {
        if id != path_id {
            errors.push("/id must match the document id in the request URL".to_string());
        }
    }
    match (id, payload, sequence) {
        (Some(id), Some(payload), Some(sequence)) if errors.is_empty() => Ok(UpdateBody { id, payload, sequence }),
        _ => Err(ServiceError::Validation { validator: name, errors }),
    }
}

/// JSON integers, including integral floats such as `1.0`.
fn as_integer(v: &Value) -> Option<i64> {
    v.as_i64().or_else(|| {
        v.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() <= MAX_SEQUENCE as f64)
            .map(|f| f as i64)
    })
}

fn check_envelope<'a>(
    body: &'a Value,
    allowed: &[&str],
    errors: &mut Vec<String>,
) -> Option<&'a Map<String, Value>> {
    let Some(obj) = body.as_object() else {
        errors.push("body must be an object".to_string());
        return None;
    };
    for key in allowed {
        if !obj.contains_key(*key) {
            errors.push(format!("body must have required property '{key}'"));
        }
    }
    for key in obj.keys() {
        if !allowed.contains(&key.as_str()) {
            errors.push(format!("body must not have additional property '{key}'"));
        }
    }
    Some(obj)
}

fn check_id_and_payload(
    kind: DocumentKind,
    obj: &Map<String, Value>,
    errors: &mut Vec<String>,
) -> (Option<String>, Option<Value>) {
    let id = match obj.get("id") {
        Some(Value::String(s)) => match kind {
            DocumentKind::CborLdRegistryEntry if !is_registry_entry_id(s) => {
                errors.push(format!("/id must match pattern \"^{CBORLD_REGISTRY_ENTRY_URN_PREFIX}[0-9]+$\""));
                None
            }
            _ => Some(s.clone()),
        },
        Some(_) => {
            errors.push("/id must be a string".to_string());
            None
        }
        None => None,
    };
    let property = kind.content_property();
    let payload = obj.get(property).and_then(|v| {
        let before = errors.len();
        match kind {
            DocumentKind::JsonLdContext => check_context(v, errors),
            DocumentKind::CborLdRegistryEntry => check_registry_entry(v, errors),
        }
        (errors.len() == before).then(|| v.clone())
    });
    (id, payload)
}

pub fn is_registry_entry_id(id: &str) -> bool {
    id.strip_prefix(CBORLD_REGISTRY_ENTRY_URN_PREFIX)
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

fn check_context(v: &Value, errors: &mut Vec<String>) {
    let Some(obj) = v.as_object() else {
        errors.push("/context must be an object".to_string());
        return;
    };
    match obj.get("@context") {
        None => errors.push("/context must have required property '@context'".to_string()),
        Some(Value::String(_)) | Some(Value::Object(_)) => {}
        Some(Value::Array(items)) => {
            if items.is_empty() {
                errors.push("/context/@context must not have fewer than 1 items".to_string());
            }
            for (i, item) in items.iter().enumerate() {
                if !(item.is_string() || item.is_object()) {
                    errors.push(format!("/context/@context/{i} must be string,object"));
                }
            }
        }
        Some(_) => errors.push("/context/@context must be a string, object or array".to_string()),
    }
}

fn check_registry_entry(v: &Value, errors: &mut Vec<String>) {
    match v {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let Some(item) = item.as_object() else {
                    errors.push(format!("/registryEntry/{i} must be an object"));
                    continue;
                };
                match item.get("type") {
                    Some(Value::String(_)) => {}
                    Some(_) => errors.push(format!("/registryEntry/{i}/type must be a string")),
                    None => errors.push(format!("/registryEntry/{i} must have required property 'type'")),
                }
                match item.get("table") {
                    Some(table) => check_type_table(table, &format!("/registryEntry/{i}/table"), errors),
                    None => errors.push(format!("/registryEntry/{i} must have required property 'table'")),
                }
            }
        }
        Value::Object(tables) => {
            for (ty, table) in tables {
                check_type_table(table, &format!("/registryEntry/{ty}"), errors);
            }
        }
        _ => errors.push("/registryEntry must be an array or an object".to_string()),
    }
}

fn check_type_table(v: &Value, path: &str, errors: &mut Vec<String>) {
    let Some(table) = v.as_object() else {
        errors.push(format!("{path} must be an object"));
        return;
    };
    for (key, value) in table {
        if !value.is_number() {
            errors.push(format!("{path}/{key} must be a number"));
        }
    }
}
