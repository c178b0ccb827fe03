//! Generic document collection routes, mounted once per document kind.
//!
//! ```text
//! OPTIONS <prefix>/:local_id<collection>          204
//! POST    <prefix>/:local_id<collection>          create, 201 + Location
//! OPTIONS <prefix>/:local_id<collection>/:doc_id  204
//! POST    <prefix>/:local_id<collection>/:doc_id  update, 200
//! GET     <prefix>/:local_id<collection>/:doc_id  read, 200
//! ```

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use service::document::validation::{validator_name, BodyOp};
use service::errors::ServiceError;
use service::metering::Operation;

use crate::auth;
use crate::errors::ApiError;
use crate::state::{AppState, ResourceSpec, ResourceState};

pub fn resource_router(app: AppState, spec: ResourceSpec) -> Router {
    let collection = format!("{}/:local_id{}", app.prefix, spec.collection);
    let item = format!("{collection}/:doc_id");
    let state = ResourceState { app, spec: Arc::new(spec) };

    Router::new()
        .route(&collection, post(create).options(preflight))
        .route(&item, get(read).post(update).options(preflight))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_scope))
        .with_state(state)
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

fn json_body(payload: Result<Json<Value>, JsonRejection>, st: &ResourceState, op: BodyOp) -> Result<Value, ApiError> {
    payload.map(|Json(v)| v).map_err(|rejection| {
        ApiError::from(ServiceError::Validation {
            validator: validator_name(st.spec.kind, op),
            errors: vec![rejection.body_text()],
        })
    })
}

async fn create(
    State(st): State<ResourceState>,
    Path(local_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let body = json_body(payload, &st, BodyOp::Create)?;
    let kind = st.spec.kind;
    let config_id = st.app.config_id(&local_id);

    let doc = st.app.documents.create(&config_id, kind, &body).await?;
    let location = format!("{config_id}{}/{}", st.spec.collection, urlencoding::encode(&doc.id));
    st.app.meter.report_operation_usage(&config_id, Operation::Create);

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(doc.to_body(kind))))
}

async fn update(
    State(st): State<ResourceState>,
    Path((local_id, doc_id)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let body = json_body(payload, &st, BodyOp::Update)?;
    let kind = st.spec.kind;
    let config_id = st.app.config_id(&local_id);

    let doc = st.app.documents.update(&config_id, kind, &doc_id, &body).await?;
    st.app.meter.report_operation_usage(&config_id, Operation::Update);
    Ok(Json(doc.to_body(kind)))
}

async fn read(
    State(st): State<ResourceState>,
    Path((local_id, doc_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let kind = st.spec.kind;
    let config_id = st.app.config_id(&local_id);

    let doc = st.app.documents.get(&config_id, kind, &doc_id).await?;
    st.app.meter.report_operation_usage(&config_id, Operation::Read);
    Ok(Json(doc.to_body(kind)))
}
