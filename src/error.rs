//! Application-level error handling
//!
//! Wraps the workflow taxonomy and adds the failures only the application
//! layer can produce (directory lookups, manager-tree validation, raw
//! database errors). The HTTP layer maps these onto status codes.

use thiserror::Error;
use uuid::Uuid;

use edge_workflow::WorkflowError;

/// Main error type for the application layer
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("employee {0} not found")]
    EmployeeNotFound(Uuid),

    #[error("employee {0} is deactivated")]
    EmployeeInactive(Uuid),

    #[error("assigning manager {manager_id} to employee {employee_id} would create a reporting cycle")]
    ManagerCycle {
        employee_id: Uuid,
        manager_id: Uuid,
    },

    #[error("{0}")]
    AccessDenied(String),

    #[error("{0}")]
    InvalidRequest(String),
}

impl AppError {
    /// Stable kind tag for wire responses and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Workflow(w) => w.kind(),
            Self::Database(_) => "database_error",
            Self::EmployeeNotFound(_) => "not_found",
            Self::EmployeeInactive(_) => "forbidden",
            Self::ManagerCycle { .. } => "validation_error",
            Self::AccessDenied(_) => "forbidden",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_errors_keep_their_kind() {
        let err = AppError::from(WorkflowError::Terminal(Uuid::new_v4()));
        assert_eq!(err.kind(), "terminal");
    }

    #[test]
    fn test_manager_cycle_is_a_validation_failure() {
        let err = AppError::ManagerCycle {
            employee_id: Uuid::new_v4(),
            manager_id: Uuid::new_v4(),
        };
        assert_eq!(err.kind(), "validation_error");
    }
}
