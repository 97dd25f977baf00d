//! Error types for the data layer.
//!
//! A lookup miss is `NotFound`, a duplicate id on create is `Conflict`,
//! and a row that fails to round-trip through the text codec is `Codec`.
//! `NotFound`/`Conflict` propagate to the caller and are never swallowed:
//! a missing entity during action resolution is a data error, not a
//! normal-flow condition.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A lookup by id found nothing.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The entity kind (e.g. `"npc"`).
        entity: &'static str,
        /// The id that missed.
        id: String,
    },

    /// A create collided with an existing id.
    #[error("{entity} already exists: {id}")]
    Conflict {
        /// The entity kind.
        entity: &'static str,
        /// The duplicate id.
        id: String,
    },

    /// A row failed to encode or decode at the text boundary.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl StoreError {
    /// Build a `NotFound` for the given entity kind and id.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Build a `Conflict` for the given entity kind and id.
    pub fn conflict(entity: &'static str, id: impl Into<String>) -> Self {
        Self::Conflict {
            entity,
            id: id.into(),
        }
    }
}
