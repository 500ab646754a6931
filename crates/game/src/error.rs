use thiserror::Error;

use crate::registry::ObjectId;

#[derive(Debug, Error)]
pub enum PhysicsError {
    #[error("no physics body for object {0}")]
    MissingBody(ObjectId),
    #[error("heightfield {width}x{depth} needs {expected} samples, got {actual}")]
    HeightfieldSize {
        width: usize,
        depth: usize,
        expected: usize,
        actual: usize,
    },
    #[error("heightfield must be at least 2x2, got {width}x{depth}")]
    HeightfieldTooSmall { width: usize, depth: usize },
    #[error("invalid {what}: {value}")]
    InvalidDimension { what: &'static str, value: f32 },
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("object kind {0:?} has no physics representation")]
    UnsupportedKind(String),
    #[error("{kind} object {id} is missing field {field}")]
    MissingField {
        id: String,
        kind: &'static str,
        field: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Physics(#[from] PhysicsError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("object {0} already exists")]
    DuplicateObject(ObjectId),
    #[error("unknown object {0}")]
    UnknownObject(ObjectId),
}
