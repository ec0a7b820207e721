use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Stored data that the engine relies on is missing or malformed
    /// (settings rows, status ids). Never a legitimate business outcome.
    #[error("Integrity error: {0}")]
    Integrity(String),
}
