use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use service::errors::ServiceError;

use crate::errors::ApiError;
use crate::state::ResourceState;

#[derive(Debug, Deserialize)]
struct Claims {
    /// Space separated, e.g. `read:/contexts write:/contexts`.
    #[serde(default)]
    scope: String,
}

/// Scope a request needs: `read:<collection>` for GET, `write:<collection>` otherwise.
pub fn required_scope(method: &Method, collection: &str) -> String {
    let action = if method == Method::GET || method == Method::HEAD { "read" } else { "write" };
    format!("{action}:{collection}")
}

/// Bearer token check in front of a document collection.
///
/// Preflight requests always pass, as does everything when no secret is configured.
pub async fn require_scope(State(state): State<ResourceState>, req: Request, next: Next) -> Result<Response, ApiError> {
    let Some(secret) = state.app.jwt_secret.as_deref() else {
        return Ok(next.run(req).await);
    };
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }
    let path = req.uri().path().to_string();

    let token = match req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => {
                tracing::warn!(path = %path, "invalid Authorization format (expect Bearer)");
                return Err(ApiError::Unauthorized("Invalid Authorization header.".into()));
            }
        },
        None => {
            tracing::warn!(path = %path, "missing Authorization header");
            return Err(ApiError::Unauthorized("Missing bearer token.".into()));
        }
    };

    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let claims = match decode::<Claims>(&token, &key, &validation) {
        Ok(data) => data.claims,
        Err(e) => {
            tracing::warn!(path = %path, err = %e, "token validation failed");
            return Err(ApiError::Unauthorized("Invalid or expired bearer token.".into()));
        }
    };

    let needed = required_scope(req.method(), &state.spec.collection);
    if !claims.scope.split_whitespace().any(|s| s == needed) {
        tracing::warn!(path = %path, scope = %needed, "token lacks required scope");
        return Err(ServiceError::NotAllowed(format!("Token does not grant the \"{needed}\" scope.")).into());
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_follows_method() {
        assert_eq!(required_scope(&Method::GET, "/contexts"), "read:/contexts");
        assert_eq!(required_scope(&Method::POST, "/cborld-registry-entries"), "write:/cborld-registry-entries");
    }
}
