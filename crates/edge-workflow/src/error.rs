//! Workflow Error Taxonomy
//!
//! Every engine operation fails with one of these kinds. Collaborator
//! failures are mapped into the taxonomy at the storage boundary and never
//! swallowed; retry policy belongs to the caller, except the single
//! conflict-reapply the engine performs itself (see `engine`).

use thiserror::Error;
use uuid::Uuid;

use crate::permissions::{Operation, Role};

/// Error type for all workflow operations
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("record {0} not found")]
    NotFound(Uuid),

    #[error("{role} {user_id} may not perform {operation}")]
    Forbidden {
        operation: Operation,
        role: Role,
        user_id: Uuid,
    },

    #[error("{operation} is not valid from state '{from}'")]
    InvalidTransition { from: String, operation: Operation },

    #[error("missing required fields: {}", .missing_fields.join(", "))]
    Validation { missing_fields: Vec<String> },

    #[error("assessment {0} has been acknowledged and is read-only")]
    Terminal(Uuid),

    #[error("concurrent update detected for record {0}")]
    Conflict(Uuid),

    #[error("storage unavailable: {0}")]
    Transient(String),
}

impl WorkflowError {
    /// Stable kind tag for wire responses and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Forbidden { .. } => "forbidden",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Validation { .. } => "validation_error",
            Self::Terminal(_) => "terminal",
            Self::Conflict(_) => "conflict",
            Self::Transient(_) => "transient",
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
