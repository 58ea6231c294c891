//! Postgres Workflow Store
//!
//! Postgres implementation of the `AssessmentStore` port. The save path is
//! a single conditional UPDATE keyed on the version column, so a transition
//! commits payload, status, and history together or not at all; bulk cycle
//! activation is one idempotent INSERT .. SELECT.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use edge_workflow::{
    Assessment, AssessmentState, AssessmentStore, CycleStatus, ReviewCycle, WorkflowError,
    WorkflowResult,
};

/// Postgres-backed implementation of the workflow storage port
#[derive(Clone)]
pub struct PgAssessmentStore {
    pool: PgPool,
}

impl PgAssessmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Assessment row - matches canonical DB schema
#[derive(Debug, FromRow)]
struct AssessmentRow {
    assessment_id: Uuid,
    cycle_id: Uuid,
    employee_id: Uuid,
    manager_id: Option<Uuid>,
    state: AssessmentState,
    self_assessment: Option<serde_json::Value>,
    manager_review: Option<serde_json::Value>,
    admin_notes: Option<String>,
    due_date: Option<NaiveDate>,
    acknowledged_at: Option<DateTime<Utc>>,
    history: serde_json::Value,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AssessmentRow {
    fn into_assessment(self) -> WorkflowResult<Assessment> {
        Ok(Assessment {
            id: self.assessment_id,
            cycle_id: self.cycle_id,
            employee_id: self.employee_id,
            manager_id: self.manager_id,
            state: self.state,
            self_assessment: self
                .self_assessment
                .map(serde_json::from_value)
                .transpose()
                .map_err(corrupt)?,
            manager_review: self
                .manager_review
                .map(serde_json::from_value)
                .transpose()
                .map_err(corrupt)?,
            admin_notes: self.admin_notes,
            due_date: self.due_date,
            acknowledged_at: self.acknowledged_at,
            history: serde_json::from_value(self.history).map_err(corrupt)?,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Review cycle row - matches canonical DB schema
#[derive(Debug, FromRow)]
struct CycleRow {
    cycle_id: Uuid,
    name: String,
    starts_on: NaiveDate,
    ends_on: NaiveDate,
    status: CycleStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CycleRow> for ReviewCycle {
    fn from(row: CycleRow) -> Self {
        Self {
            id: row.cycle_id,
            name: row.name,
            starts_on: row.starts_on,
            ends_on: row.ends_on,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ASSESSMENT_COLUMNS: &str = "assessment_id, cycle_id, employee_id, manager_id, state, \
     self_assessment, manager_review, admin_notes, due_date, acknowledged_at, history, \
     version, created_at, updated_at";

#[async_trait]
impl AssessmentStore for PgAssessmentStore {
    async fn get(&self, id: Uuid) -> WorkflowResult<Assessment> {
        let row = sqlx::query_as::<_, AssessmentRow>(&format!(
            "SELECT {ASSESSMENT_COLUMNS} FROM assessments WHERE assessment_id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(transient)?;

        row.ok_or(WorkflowError::NotFound(id))?.into_assessment()
    }

    async fn save(
        &self,
        assessment: &Assessment,
        expected_version: i64,
    ) -> WorkflowResult<Assessment> {
        let history = serde_json::to_value(&assessment.history).map_err(corrupt)?;
        let self_assessment = assessment
            .self_assessment
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(corrupt)?;
        let manager_review = assessment
            .manager_review
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(corrupt)?;

        let updated = sqlx::query_as::<_, AssessmentRow>(&format!(
            r#"
            UPDATE assessments
            SET state = $2,
                self_assessment = $3,
                manager_review = $4,
                admin_notes = $5,
                due_date = $6,
                acknowledged_at = $7,
                history = $8,
                version = version + 1,
                updated_at = $9
            WHERE assessment_id = $1 AND version = $10
            RETURNING {ASSESSMENT_COLUMNS}
            "#
        ))
        .bind(assessment.id)
        .bind(assessment.state)
        .bind(self_assessment)
        .bind(manager_review)
        .bind(&assessment.admin_notes)
        .bind(assessment.due_date)
        .bind(assessment.acknowledged_at)
        .bind(history)
        .bind(assessment.updated_at)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await
        .map_err(transient)?;

        match updated {
            Some(row) => {
                debug!(assessment = %assessment.id, version = row.version, "assessment saved");
                row.into_assessment()
            }
            None => {
                // Distinguish a lost race from a missing row
                let exists =
                    sqlx::query_scalar::<_, i64>("SELECT version FROM assessments WHERE assessment_id = $1")
                        .bind(assessment.id)
                        .fetch_optional(&self.pool)
                        .await
                        .map_err(transient)?;
                match exists {
                    Some(_) => Err(WorkflowError::Conflict(assessment.id)),
                    None => Err(WorkflowError::NotFound(assessment.id)),
                }
            }
        }
    }

    async fn get_cycle(&self, id: Uuid) -> WorkflowResult<ReviewCycle> {
        let row = sqlx::query_as::<_, CycleRow>(
            "SELECT cycle_id, name, starts_on, ends_on, status, created_at, updated_at \
             FROM review_cycles WHERE cycle_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(transient)?;

        row.map(ReviewCycle::from)
            .ok_or(WorkflowError::NotFound(id))
    }

    async fn save_cycle(&self, cycle: &ReviewCycle) -> WorkflowResult<ReviewCycle> {
        let row = sqlx::query_as::<_, CycleRow>(
            r#"
            INSERT INTO review_cycles (cycle_id, name, starts_on, ends_on, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (cycle_id) DO UPDATE
            SET name = EXCLUDED.name,
                starts_on = EXCLUDED.starts_on,
                ends_on = EXCLUDED.ends_on,
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at
            RETURNING cycle_id, name, starts_on, ends_on, status, created_at, updated_at
            "#,
        )
        .bind(cycle.id)
        .bind(&cycle.name)
        .bind(cycle.starts_on)
        .bind(cycle.ends_on)
        .bind(cycle.status)
        .bind(cycle.created_at)
        .bind(cycle.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(transient)?;

        Ok(row.into())
    }

    async fn create_assessments_for_cycle(
        &self,
        cycle_id: Uuid,
        due_date: Option<NaiveDate>,
    ) -> WorkflowResult<u64> {
        // Employees already covered for this cycle are skipped by the
        // unique (cycle_id, employee_id) constraint.
        let result = sqlx::query(
            r#"
            INSERT INTO assessments
                (assessment_id, cycle_id, employee_id, manager_id, state, history,
                 version, due_date, created_at, updated_at)
            SELECT gen_random_uuid(), $1, e.employee_id, e.manager_id, 'not_started',
                   '[]'::jsonb, 0, $2, now(), now()
            FROM employees e
            WHERE e.active
            ON CONFLICT (cycle_id, employee_id) DO NOTHING
            "#,
        )
        .bind(cycle_id)
        .bind(due_date)
        .execute(&self.pool)
        .await
        .map_err(transient)?;

        Ok(result.rows_affected())
    }

    async fn list_by_employee(&self, employee_id: Uuid) -> WorkflowResult<Vec<Assessment>> {
        let rows = sqlx::query_as::<_, AssessmentRow>(&format!(
            "SELECT {ASSESSMENT_COLUMNS} FROM assessments \
             WHERE employee_id = $1 ORDER BY created_at DESC"
        ))
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await
        .map_err(transient)?;

        rows.into_iter().map(AssessmentRow::into_assessment).collect()
    }

    async fn list_by_manager(&self, manager_id: Uuid) -> WorkflowResult<Vec<Assessment>> {
        let rows = sqlx::query_as::<_, AssessmentRow>(&format!(
            "SELECT {ASSESSMENT_COLUMNS} FROM assessments \
             WHERE manager_id = $1 ORDER BY created_at DESC"
        ))
        .bind(manager_id)
        .fetch_all(&self.pool)
        .await
        .map_err(transient)?;

        rows.into_iter().map(AssessmentRow::into_assessment).collect()
    }

    async fn list_by_cycle(&self, cycle_id: Uuid) -> WorkflowResult<Vec<Assessment>> {
        let rows = sqlx::query_as::<_, AssessmentRow>(&format!(
            "SELECT {ASSESSMENT_COLUMNS} FROM assessments \
             WHERE cycle_id = $1 ORDER BY created_at"
        ))
        .bind(cycle_id)
        .fetch_all(&self.pool)
        .await
        .map_err(transient)?;

        rows.into_iter().map(AssessmentRow::into_assessment).collect()
    }
}

fn transient(err: sqlx::Error) -> WorkflowError {
    WorkflowError::Transient(err.to_string())
}

fn corrupt(err: serde_json::Error) -> WorkflowError {
    WorkflowError::Transient(format!("corrupt stored payload: {err}"))
}
