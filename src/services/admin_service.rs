//! Admin Service
//!
//! Employee administration and review-cycle lifecycle. Directory mutations
//! (role, manager link, deactivation) are gated on the admin role here;
//! cycle transitions are gated by the engine itself.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use edge_workflow::{
    AssessmentEngine, AssessmentStore, CycleOutcome, CycleStatus, ReviewCycle, Role,
};

use crate::database::{EmployeeRepository, PgAssessmentStore};
use crate::error::{AppError, AppResult};
use crate::models::{Employee, NewEmployeeFields};
use crate::services::{resolve_actor, StateRollup};

/// Service for admin-side directory and cycle operations
pub struct AdminService {
    engine: AssessmentEngine<PgAssessmentStore>,
    employees: EmployeeRepository,
}

impl AdminService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            engine: AssessmentEngine::new(PgAssessmentStore::new(pool.clone())),
            employees: EmployeeRepository::new(pool),
        }
    }

    async fn require_admin(&self, actor_id: Uuid) -> AppResult<()> {
        let actor = resolve_actor(&self.employees, actor_id).await?;
        if actor.role != Role::Admin {
            return Err(AppError::AccessDenied(
                "employee administration requires the admin role".to_string(),
            ));
        }
        Ok(())
    }

    // ── Employee administration ──────────────────────────────────────────

    pub async fn create_employee(
        &self,
        actor_id: Uuid,
        fields: NewEmployeeFields,
    ) -> AppResult<Employee> {
        self.require_admin(actor_id).await?;
        if let Some(manager_id) = fields.manager_id {
            // The manager must exist before anyone reports to them
            self.employees.get(manager_id).await?;
        }
        self.employees.create(&fields).await
    }

    pub async fn update_profile(
        &self,
        actor_id: Uuid,
        employee_id: Uuid,
        name: &str,
        job_title: Option<&str>,
    ) -> AppResult<Employee> {
        self.require_admin(actor_id).await?;
        self.employees
            .update_profile(employee_id, name, job_title)
            .await
    }

    pub async fn set_role(
        &self,
        actor_id: Uuid,
        employee_id: Uuid,
        role: Role,
    ) -> AppResult<Employee> {
        self.require_admin(actor_id).await?;
        self.employees.set_role(employee_id, role).await
    }

    pub async fn assign_manager(
        &self,
        actor_id: Uuid,
        employee_id: Uuid,
        manager_id: Option<Uuid>,
    ) -> AppResult<Employee> {
        self.require_admin(actor_id).await?;
        self.employees.assign_manager(employee_id, manager_id).await
    }

    pub async fn deactivate_employee(
        &self,
        actor_id: Uuid,
        employee_id: Uuid,
    ) -> AppResult<Employee> {
        self.require_admin(actor_id).await?;
        self.employees.deactivate(employee_id).await
    }

    pub async fn list_employees(&self) -> AppResult<Vec<Employee>> {
        self.employees.list_active().await
    }

    // ── Cycle lifecycle ──────────────────────────────────────────────────

    /// Create a draft cycle in `upcoming`
    pub async fn create_cycle(
        &self,
        actor_id: Uuid,
        name: &str,
        starts_on: NaiveDate,
        ends_on: NaiveDate,
    ) -> AppResult<ReviewCycle> {
        self.require_admin(actor_id).await?;
        if name.trim().is_empty() {
            return Err(AppError::InvalidRequest("cycle name is required".to_string()));
        }
        if ends_on < starts_on {
            return Err(AppError::InvalidRequest(
                "cycle end date precedes start date".to_string(),
            ));
        }

        let cycle = ReviewCycle::new(name, starts_on, ends_on, Utc::now());
        let cycle = self.engine.store().save_cycle(&cycle).await?;
        info!(cycle = %cycle.id, name = %cycle.name, "review cycle created");
        Ok(cycle)
    }

    pub async fn activate_cycle(&self, actor_id: Uuid, cycle_id: Uuid) -> AppResult<CycleOutcome> {
        let actor = resolve_actor(&self.employees, actor_id).await?;
        Ok(self.engine.activate_cycle(cycle_id, &actor).await?)
    }

    pub async fn close_cycle(&self, actor_id: Uuid, cycle_id: Uuid) -> AppResult<CycleOutcome> {
        let actor = resolve_actor(&self.employees, actor_id).await?;
        Ok(self.engine.close_cycle(cycle_id, &actor).await?)
    }

    /// Reporting rollup for a cycle: per-state counts and completion share
    pub async fn cycle_overview(&self, cycle_id: Uuid) -> AppResult<CycleOverview> {
        let cycle = self.engine.get_cycle(cycle_id).await?;
        let assessments = self.engine.list_by_cycle(cycle_id).await?;

        let mut rollup = StateRollup::default();
        for a in &assessments {
            rollup.add(a.state);
        }
        let completion_pct = rollup.completion_pct();
        let display_status = cycle.display_status(Utc::now().date_naive());

        Ok(CycleOverview {
            cycle,
            display_status,
            rollup,
            completion_pct,
        })
    }
}

/// Admin analytics payload for one cycle
#[derive(Debug, Serialize)]
pub struct CycleOverview {
    pub cycle: ReviewCycle,
    /// Date-derived display status; stored status is inside `cycle`
    pub display_status: CycleStatus,
    pub rollup: StateRollup,
    pub completion_pct: f32,
}
