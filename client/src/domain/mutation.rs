//! Mutation intents consumed by the record cache.

use serde::Serialize;

use super::user::{User, UserId, UserPayload};

/// Kind of write operation, used to key pending/error status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationKind {
    /// `POST /users`.
    Create,
    /// `PUT /users/{id}`.
    Update,
    /// `DELETE /users/{id}`.
    Delete,
}

impl MutationKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 3] = [Self::Create, Self::Update, Self::Delete];
}

/// One pending write, consumed by exactly one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationIntent {
    /// Create a record from a validated payload.
    Create {
        /// Attributes for the new record.
        payload: UserPayload,
    },
    /// Replace the attributes of an existing record.
    Update {
        /// Target record.
        id: UserId,
        /// New attributes.
        payload: UserPayload,
    },
    /// Remove a record.
    Delete {
        /// Target record.
        id: UserId,
    },
}

impl MutationIntent {
    /// Kind of write this intent performs.
    #[must_use]
    pub const fn kind(&self) -> MutationKind {
        match self {
            Self::Create { .. } => MutationKind::Create,
            Self::Update { .. } => MutationKind::Update,
            Self::Delete { .. } => MutationKind::Delete,
        }
    }
}

/// Result of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome", content = "record")]
pub enum MutationOutcome {
    /// The backend's copy of a created or updated record.
    Saved(User),
    /// Identifier of the removed record.
    Deleted(UserId),
}
