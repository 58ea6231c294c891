//! Permission Gate
//!
//! A single pure gate for every mutating operation, consumed by the engine
//! before any state validation. Keeping it free of storage access makes the
//! gate and the state machine independently testable.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::assessment::Assessment;

/// Every mutating operation the engine exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    StartSelfAssessment,
    SaveSelfAssessmentDraft,
    SubmitSelfAssessment,
    StartManagerReview,
    SubmitManagerReview,
    RequestRevision,
    ApproveReview,
    AcknowledgeReview,
    AdminOverride,
    ActivateCycle,
    CloseCycle,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartSelfAssessment => "start_self_assessment",
            Self::SaveSelfAssessmentDraft => "save_self_assessment_draft",
            Self::SubmitSelfAssessment => "submit_self_assessment",
            Self::StartManagerReview => "start_manager_review",
            Self::SubmitManagerReview => "submit_manager_review",
            Self::RequestRevision => "request_revision",
            Self::ApproveReview => "approve_review",
            Self::AcknowledgeReview => "acknowledge_review",
            Self::AdminOverride => "admin_override",
            Self::ActivateCycle => "activate_cycle",
            Self::CloseCycle => "close_cycle",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved role of the acting user. Resolution itself is the identity
/// collaborator's job; the engine only ever receives the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "database", derive(sqlx::Type))]
#[cfg_attr(
    feature = "database",
    sqlx(type_name = "text", rename_all = "snake_case")
)]
pub enum Role {
    Employee,
    Manager,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employee" => Ok(Self::Employee),
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            _ => Err(RoleParseError::UnknownRole(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RoleParseError {
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// The acting user, as resolved by the identity collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// Can `actor` perform `operation` against `assessment`?
///
/// Employee-side operations require ownership; manager-side operations
/// require being the manager of record (an admin who is not that manager
/// must go through the override path); admin-side operations require the
/// admin role.
pub fn can_perform(operation: Operation, actor: &Actor, assessment: &Assessment) -> bool {
    match operation {
        Operation::StartSelfAssessment
        | Operation::SaveSelfAssessmentDraft
        | Operation::SubmitSelfAssessment
        | Operation::AcknowledgeReview => actor.user_id == assessment.employee_id,

        Operation::StartManagerReview | Operation::SubmitManagerReview => {
            assessment.manager_id == Some(actor.user_id)
        }

        Operation::RequestRevision | Operation::ApproveReview | Operation::AdminOverride => {
            actor.role == Role::Admin
        }

        // Cycle administration is not assessment-scoped
        Operation::ActivateCycle | Operation::CloseCycle => false,
    }
}

/// Can `actor` perform an operation that is not scoped to a single
/// assessment (cycle administration, admin override)?
pub fn can_administer(operation: Operation, actor: &Actor) -> bool {
    match operation {
        Operation::ActivateCycle | Operation::CloseCycle | Operation::AdminOverride => {
            actor.role == Role::Admin
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn assessment_for(employee_id: Uuid, manager_id: Option<Uuid>) -> Assessment {
        Assessment::new(Uuid::new_v4(), employee_id, manager_id, None, Utc::now())
    }

    #[test]
    fn test_employee_operations_require_ownership() {
        let employee = Uuid::new_v4();
        let other = Uuid::new_v4();
        let a = assessment_for(employee, None);

        for op in [
            Operation::StartSelfAssessment,
            Operation::SaveSelfAssessmentDraft,
            Operation::SubmitSelfAssessment,
            Operation::AcknowledgeReview,
        ] {
            assert!(can_perform(op, &Actor::new(employee, Role::Employee), &a));
            assert!(!can_perform(op, &Actor::new(other, Role::Employee), &a));
            // Even an admin does not pass the employee-side gate
            assert!(!can_perform(op, &Actor::new(other, Role::Admin), &a));
        }
    }

    #[test]
    fn test_manager_operations_require_manager_of_record() {
        let manager = Uuid::new_v4();
        let other_manager = Uuid::new_v4();
        let a = assessment_for(Uuid::new_v4(), Some(manager));

        for op in [Operation::StartManagerReview, Operation::SubmitManagerReview] {
            assert!(can_perform(op, &Actor::new(manager, Role::Manager), &a));
            assert!(!can_perform(
                op,
                &Actor::new(other_manager, Role::Manager),
                &a
            ));
        }
    }

    #[test]
    fn test_manager_operations_denied_without_manager_of_record() {
        let a = assessment_for(Uuid::new_v4(), None);
        let manager = Actor::new(Uuid::new_v4(), Role::Manager);
        assert!(!can_perform(Operation::StartManagerReview, &manager, &a));
    }

    #[test]
    fn test_admin_operations_require_admin_role() {
        let a = assessment_for(Uuid::new_v4(), Some(Uuid::new_v4()));
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        let manager = Actor::new(Uuid::new_v4(), Role::Manager);

        for op in [
            Operation::RequestRevision,
            Operation::ApproveReview,
            Operation::AdminOverride,
        ] {
            assert!(can_perform(op, &admin, &a));
            assert!(!can_perform(op, &manager, &a));
        }
    }

    #[test]
    fn test_cycle_administration_is_admin_only() {
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        let employee = Actor::new(Uuid::new_v4(), Role::Employee);

        for op in [Operation::ActivateCycle, Operation::CloseCycle] {
            assert!(can_administer(op, &admin));
            assert!(!can_administer(op, &employee));
        }
        // Assessment-scoped entry point never grants cycle operations
        let a = assessment_for(Uuid::new_v4(), None);
        assert!(!can_perform(Operation::ActivateCycle, &admin, &a));
    }

    #[test]
    fn test_stranger_is_denied_everything_assessment_scoped() {
        let a = assessment_for(Uuid::new_v4(), Some(Uuid::new_v4()));
        let stranger = Actor::new(Uuid::new_v4(), Role::Employee);

        for op in [
            Operation::StartSelfAssessment,
            Operation::SaveSelfAssessmentDraft,
            Operation::SubmitSelfAssessment,
            Operation::StartManagerReview,
            Operation::SubmitManagerReview,
            Operation::RequestRevision,
            Operation::ApproveReview,
            Operation::AcknowledgeReview,
            Operation::AdminOverride,
        ] {
            assert!(!can_perform(op, &stranger, &a));
        }
    }
}
