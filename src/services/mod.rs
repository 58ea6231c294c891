//! Service Layer
//!
//! Services wire the workflow engine and repositories together and resolve
//! acting users into engine actors. Identity arrives from the request; the
//! role always comes from the directory, never from the caller.

use uuid::Uuid;

use edge_workflow::{Actor, AssessmentState};

use crate::database::EmployeeRepository;
use crate::error::{AppError, AppResult};

pub mod admin_service;
pub mod assessment_service;
pub mod engagement_service;

pub use admin_service::{AdminService, CycleOverview};
pub use assessment_service::{AssessmentService, AssessmentSummary, TeamDashboard};
pub use engagement_service::{EngagementFeed, EngagementService};

/// Resolve an acting user id into an engine actor. Deactivated employees
/// cannot act.
pub(crate) async fn resolve_actor(
    employees: &EmployeeRepository,
    user_id: Uuid,
) -> AppResult<Actor> {
    let employee = employees.get(user_id).await?;
    if !employee.active {
        return Err(AppError::EmployeeInactive(user_id));
    }
    Ok(Actor::new(employee.employee_id, employee.role))
}

/// Per-state assessment counts for a team or cycle
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct StateRollup {
    pub not_started: usize,
    pub in_progress: usize,
    pub employee_submitted: usize,
    pub manager_in_progress: usize,
    pub manager_completed: usize,
    pub admin_approved: usize,
    pub acknowledged: usize,
}

impl StateRollup {
    pub fn add(&mut self, state: AssessmentState) {
        match state {
            AssessmentState::NotStarted => self.not_started += 1,
            AssessmentState::InProgress => self.in_progress += 1,
            AssessmentState::EmployeeSubmitted => self.employee_submitted += 1,
            AssessmentState::ManagerInProgress => self.manager_in_progress += 1,
            AssessmentState::ManagerCompleted => self.manager_completed += 1,
            AssessmentState::AdminApproved => self.admin_approved += 1,
            AssessmentState::Acknowledged => self.acknowledged += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.not_started
            + self.in_progress
            + self.employee_submitted
            + self.manager_in_progress
            + self.manager_completed
            + self.admin_approved
            + self.acknowledged
    }

    /// Share of assessments whose manager review has completed. Reported,
    /// never enforced.
    pub fn completion_pct(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let completed = self.manager_completed + self.admin_approved + self.acknowledged;
        (completed as f32 / total as f32) * 100.0
    }
}
