use thiserror::Error;

/// Error taxonomy for the resource store.
///
/// Maps 1:1 onto the behaviors an eventual HTTP layer would need: `ResourceTypeNotFound`
/// and `ResourceNotFound` are both "404", `WrongRevision` is "409", everything else is "500".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("resource type not found: {0}")]
    ResourceTypeNotFound(String),

    #[error("resource not found: {resource_type}/{id}")]
    ResourceNotFound { resource_type: String, id: String },

    #[error("wrong revision for {id}: current={current}, update={update}")]
    WrongRevision {
        id: String,
        current: String,
        update: String,
    },

    #[error("malformed search path: {0}")]
    InvalidSearch(String),

    #[error("document does not conform to schema: {0}")]
    ValidationError(String),

    #[error("internal invariant violated: {0}")]
    Internal(String),

    #[error(transparent)]
    Storage(#[from] rocksdb::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
