//! Assessment State Types
//!
//! The composite lifecycle position of an assessment, plus the legacy
//! per-dimension status projections that reporting still consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Composite lifecycle state of an assessment.
///
/// `ManagerCompleted` doubles as "pending admin approval": both
/// `approve_review` and `request_revision` act on it. The revision request
/// is the only backward edge (back to `ManagerInProgress`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "database", derive(sqlx::Type))]
#[cfg_attr(
    feature = "database",
    sqlx(type_name = "text", rename_all = "snake_case")
)]
pub enum AssessmentState {
    NotStarted,
    InProgress,
    EmployeeSubmitted,
    ManagerInProgress,
    ManagerCompleted,
    AdminApproved,
    Acknowledged,
}

impl AssessmentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::EmployeeSubmitted => "employee_submitted",
            Self::ManagerInProgress => "manager_in_progress",
            Self::ManagerCompleted => "manager_completed",
            Self::AdminApproved => "admin_approved",
            Self::Acknowledged => "acknowledged",
        }
    }

    /// Acknowledged assessments accept no further mutation
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Acknowledged)
    }

    /// Employee-side status projection
    pub fn self_assessment_status(&self) -> SelfAssessmentStatus {
        match self {
            Self::NotStarted => SelfAssessmentStatus::NotStarted,
            Self::InProgress => SelfAssessmentStatus::InProgress,
            _ => SelfAssessmentStatus::EmployeeComplete,
        }
    }

    /// Manager-side status projection
    pub fn manager_review_status(&self) -> ManagerReviewStatus {
        match self {
            Self::NotStarted | Self::InProgress | Self::EmployeeSubmitted => {
                ManagerReviewStatus::Pending
            }
            Self::ManagerInProgress => ManagerReviewStatus::InProgress,
            Self::ManagerCompleted | Self::AdminApproved | Self::Acknowledged => {
                ManagerReviewStatus::Completed
            }
        }
    }

    /// Admin-approval projection; only meaningful once the manager review
    /// has completed
    pub fn approval_status(&self) -> Option<ApprovalStatus> {
        match self {
            Self::ManagerCompleted => Some(ApprovalStatus::PendingApproval),
            Self::AdminApproved | Self::Acknowledged => Some(ApprovalStatus::Approved),
            _ => None,
        }
    }
}

impl std::fmt::Display for AssessmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AssessmentState {
    type Err = StateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "employee_submitted" => Ok(Self::EmployeeSubmitted),
            "manager_in_progress" => Ok(Self::ManagerInProgress),
            "manager_completed" => Ok(Self::ManagerCompleted),
            "admin_approved" => Ok(Self::AdminApproved),
            "acknowledged" => Ok(Self::Acknowledged),
            _ => Err(StateParseError::UnknownState(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateParseError {
    #[error("unknown assessment state: {0}")]
    UnknownState(String),
}

/// Legacy employee-side status column values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfAssessmentStatus {
    NotStarted,
    InProgress,
    EmployeeComplete,
}

/// Legacy manager-side status column values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerReviewStatus {
    Pending,
    InProgress,
    Completed,
}

/// Legacy admin-approval column values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    PendingApproval,
    Approved,
}

/// Read-only projection of the composite state onto the three legacy
/// status dimensions
#[derive(Debug, Clone, Serialize)]
pub struct StatusProjection {
    pub self_assessment_status: SelfAssessmentStatus,
    pub manager_review_status: ManagerReviewStatus,
    pub approval_status: Option<ApprovalStatus>,
}

impl From<AssessmentState> for StatusProjection {
    fn from(state: AssessmentState) -> Self {
        Self {
            self_assessment_status: state.self_assessment_status(),
            manager_review_status: state.manager_review_status(),
            approval_status: state.approval_status(),
        }
    }
}

/// Record of a state transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: AssessmentState,
    pub to: AssessmentState,
    /// Who triggered the transition
    pub actor_id: Option<Uuid>,
    /// Optional reason (revision notes, override justification)
    pub reason: Option<String>,
    pub transitioned_at: DateTime<Utc>,
    /// Set only by the explicit admin-override path
    #[serde(default)]
    pub admin_override: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trips_through_str() {
        for state in [
            AssessmentState::NotStarted,
            AssessmentState::InProgress,
            AssessmentState::EmployeeSubmitted,
            AssessmentState::ManagerInProgress,
            AssessmentState::ManagerCompleted,
            AssessmentState::AdminApproved,
            AssessmentState::Acknowledged,
        ] {
            assert_eq!(state.as_str().parse::<AssessmentState>().unwrap(), state);
        }
        assert!("finished".parse::<AssessmentState>().is_err());
    }

    #[test]
    fn test_projection_ordering_holds_in_every_state() {
        // Manager review may only show completed once the self-assessment
        // is employee_complete; approval only once the review completed.
        for state in [
            AssessmentState::NotStarted,
            AssessmentState::InProgress,
            AssessmentState::EmployeeSubmitted,
            AssessmentState::ManagerInProgress,
            AssessmentState::ManagerCompleted,
            AssessmentState::AdminApproved,
            AssessmentState::Acknowledged,
        ] {
            let p = StatusProjection::from(state);
            if p.manager_review_status == ManagerReviewStatus::Completed {
                assert_eq!(
                    p.self_assessment_status,
                    SelfAssessmentStatus::EmployeeComplete
                );
            }
            if p.approval_status.is_some() {
                assert_eq!(p.manager_review_status, ManagerReviewStatus::Completed);
            }
        }
    }

    #[test]
    fn test_only_acknowledged_is_terminal() {
        assert!(AssessmentState::Acknowledged.is_terminal());
        assert!(!AssessmentState::AdminApproved.is_terminal());
        assert!(!AssessmentState::NotStarted.is_terminal());
    }
}
