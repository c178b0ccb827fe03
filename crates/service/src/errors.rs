use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("A validation error occured in the '{validator}' validator.")]
    Validation { validator: &'static str, errors: Vec<String> },
    #[error("{0}")]
    Duplicate(String),
    #[error("{message}")]
    InvalidState { message: String, expected: i64, actual: i64 },
    #[error("{0}")]
    NotAllowed(String),
    #[error("{0}")]
    NotFound(String),
    #[error("malformed stored document: {0}")]
    Corrupt(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("{0}")]
    Migration(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found.", entity)) }

    /// Stable error name surfaced to HTTP clients.
    pub fn name(&self) -> &'static str {
        match self {
            ServiceError::Validation { .. } => "ValidationError",
            ServiceError::Duplicate(_) => "DuplicateError",
            ServiceError::InvalidState { .. } => "InvalidStateError",
            ServiceError::NotAllowed(_) => "NotAllowedError",
            ServiceError::NotFound(_) => "NotFoundError",
            ServiceError::Corrupt(_) | ServiceError::Db(_) | ServiceError::Migration(_) | ServiceError::Model(_) => "OperationError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_messages() {
        let e = ServiceError::Validation { validator: "createContextBody", errors: vec![] };
        assert_eq!(e.name(), "ValidationError");
        assert_eq!(e.to_string(), "A validation error occured in the 'createContextBody' validator.");
        assert_eq!(ServiceError::not_found("Context").to_string(), "Context not found.");
        assert_eq!(ServiceError::Db("x".into()).name(), "OperationError");
    }
}
