//! Assessment Service
//!
//! Application entry point for every workflow operation plus the dashboard
//! read paths. Resolves acting users against the directory, then delegates
//! transition legality entirely to the engine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use edge_workflow::{
    Assessment, AssessmentEngine, AssessmentState, EngineConfig, ManagerReviewForm,
    SelfAssessmentForm, StatusProjection, TransitionOutcome,
};

use crate::database::{EmployeeRepository, PgAssessmentStore};
use crate::error::AppResult;
use crate::services::{resolve_actor, StateRollup};

/// Service for assessment workflow operations and dashboard reads
pub struct AssessmentService {
    engine: AssessmentEngine<PgAssessmentStore>,
    employees: EmployeeRepository,
}

impl AssessmentService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            engine: AssessmentEngine::new(PgAssessmentStore::new(pool.clone())),
            employees: EmployeeRepository::new(pool),
        }
    }

    pub fn with_config(pool: PgPool, config: EngineConfig) -> Self {
        Self {
            engine: AssessmentEngine::new(PgAssessmentStore::new(pool.clone()))
                .with_config(config),
            employees: EmployeeRepository::new(pool),
        }
    }

    // ── Workflow operations ──────────────────────────────────────────────

    pub async fn start_self_assessment(
        &self,
        assessment_id: Uuid,
        actor_id: Uuid,
    ) -> AppResult<TransitionOutcome> {
        let actor = resolve_actor(&self.employees, actor_id).await?;
        Ok(self
            .engine
            .start_self_assessment(assessment_id, &actor)
            .await?)
    }

    pub async fn save_self_assessment_draft(
        &self,
        assessment_id: Uuid,
        actor_id: Uuid,
        form: SelfAssessmentForm,
    ) -> AppResult<TransitionOutcome> {
        let actor = resolve_actor(&self.employees, actor_id).await?;
        Ok(self
            .engine
            .save_self_assessment_draft(assessment_id, &actor, form)
            .await?)
    }

    pub async fn submit_self_assessment(
        &self,
        assessment_id: Uuid,
        actor_id: Uuid,
        form: SelfAssessmentForm,
    ) -> AppResult<TransitionOutcome> {
        let actor = resolve_actor(&self.employees, actor_id).await?;
        Ok(self
            .engine
            .submit_self_assessment(assessment_id, &actor, form)
            .await?)
    }

    pub async fn start_manager_review(
        &self,
        assessment_id: Uuid,
        actor_id: Uuid,
    ) -> AppResult<TransitionOutcome> {
        let actor = resolve_actor(&self.employees, actor_id).await?;
        Ok(self
            .engine
            .start_manager_review(assessment_id, &actor)
            .await?)
    }

    pub async fn submit_manager_review(
        &self,
        assessment_id: Uuid,
        actor_id: Uuid,
        form: ManagerReviewForm,
    ) -> AppResult<TransitionOutcome> {
        let actor = resolve_actor(&self.employees, actor_id).await?;
        Ok(self
            .engine
            .submit_manager_review(assessment_id, &actor, form)
            .await?)
    }

    pub async fn request_revision(
        &self,
        assessment_id: Uuid,
        actor_id: Uuid,
        notes: &str,
    ) -> AppResult<TransitionOutcome> {
        let actor = resolve_actor(&self.employees, actor_id).await?;
        Ok(self
            .engine
            .request_revision(assessment_id, &actor, notes)
            .await?)
    }

    pub async fn approve_review(
        &self,
        assessment_id: Uuid,
        actor_id: Uuid,
        notes: Option<&str>,
    ) -> AppResult<TransitionOutcome> {
        let actor = resolve_actor(&self.employees, actor_id).await?;
        Ok(self
            .engine
            .approve_review(assessment_id, &actor, notes)
            .await?)
    }

    pub async fn acknowledge_review(
        &self,
        assessment_id: Uuid,
        actor_id: Uuid,
    ) -> AppResult<TransitionOutcome> {
        let actor = resolve_actor(&self.employees, actor_id).await?;
        Ok(self
            .engine
            .acknowledge_review(assessment_id, &actor)
            .await?)
    }

    pub async fn admin_override_state(
        &self,
        assessment_id: Uuid,
        actor_id: Uuid,
        to: AssessmentState,
        reason: &str,
    ) -> AppResult<TransitionOutcome> {
        let actor = resolve_actor(&self.employees, actor_id).await?;
        Ok(self
            .engine
            .admin_override_state(assessment_id, &actor, to, reason)
            .await?)
    }

    // ── Read paths ───────────────────────────────────────────────────────

    pub async fn get_assessment(&self, assessment_id: Uuid) -> AppResult<Assessment> {
        Ok(self.engine.get_assessment(assessment_id).await?)
    }

    /// All of an employee's assessments, newest cycle first
    pub async fn employee_dashboard(&self, employee_id: Uuid) -> AppResult<Vec<AssessmentSummary>> {
        let assessments = self.engine.list_by_employee(employee_id).await?;
        Ok(assessments.iter().map(AssessmentSummary::from).collect())
    }

    /// A manager's team view with per-state rollup
    pub async fn team_dashboard(&self, manager_id: Uuid) -> AppResult<TeamDashboard> {
        let assessments = self.engine.list_by_manager(manager_id).await?;
        let mut rollup = StateRollup::default();
        for a in &assessments {
            rollup.add(a.state);
        }
        Ok(TeamDashboard {
            assessments: assessments.iter().map(AssessmentSummary::from).collect(),
            rollup,
        })
    }
}

/// Compact assessment view for dashboard lists
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentSummary {
    pub assessment_id: Uuid,
    pub cycle_id: Uuid,
    pub employee_id: Uuid,
    pub manager_id: Option<Uuid>,
    pub state: AssessmentState,
    pub status: StatusProjection,
    pub due_date: Option<NaiveDate>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Assessment> for AssessmentSummary {
    fn from(a: &Assessment) -> Self {
        Self {
            assessment_id: a.id,
            cycle_id: a.cycle_id,
            employee_id: a.employee_id,
            manager_id: a.manager_id,
            state: a.state,
            status: a.status_projection(),
            due_date: a.due_date,
            acknowledged_at: a.acknowledged_at,
            updated_at: a.updated_at,
        }
    }
}

/// Manager dashboard payload
#[derive(Debug, Serialize)]
pub struct TeamDashboard {
    pub assessments: Vec<AssessmentSummary>,
    pub rollup: StateRollup,
}
