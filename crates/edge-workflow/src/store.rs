//! Storage Port
//!
//! Abstract interface over the persistence/authorization collaborator.
//! Implementations target Postgres in production and an in-memory map for
//! tests. Every call can fail or be rejected by policy; failures surface as
//! `WorkflowError` and are never swallowed.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::assessment::Assessment;
use crate::cycle::ReviewCycle;
use crate::error::WorkflowResult;

/// Abstract store for assessments and review cycles.
///
/// `save` is the engine's atomicity boundary: payload, status, and history
/// commit together in one conditional write, or not at all.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    /// Fetch an assessment by id
    async fn get(&self, id: Uuid) -> WorkflowResult<Assessment>;

    /// Persist an assessment with optimistic concurrency: fails with
    /// `Conflict` unless the stored version equals `expected_version`,
    /// and bumps the version on success. Returns the stored record.
    async fn save(&self, assessment: &Assessment, expected_version: i64)
        -> WorkflowResult<Assessment>;

    /// Fetch a review cycle by id
    async fn get_cycle(&self, id: Uuid) -> WorkflowResult<ReviewCycle>;

    /// Persist a review cycle (insert or update)
    async fn save_cycle(&self, cycle: &ReviewCycle) -> WorkflowResult<ReviewCycle>;

    /// Create a `NotStarted` assessment for every active employee who does
    /// not already have one for this cycle. Safe to call twice: employees
    /// with an existing assessment are skipped. Returns the created count.
    async fn create_assessments_for_cycle(
        &self,
        cycle_id: Uuid,
        due_date: Option<NaiveDate>,
    ) -> WorkflowResult<u64>;

    /// Dashboard read path: all assessments belonging to an employee
    async fn list_by_employee(&self, employee_id: Uuid) -> WorkflowResult<Vec<Assessment>>;

    /// Dashboard read path: all assessments whose manager of record matches
    async fn list_by_manager(&self, manager_id: Uuid) -> WorkflowResult<Vec<Assessment>>;

    /// Reporting read path: all assessments in a cycle
    async fn list_by_cycle(&self, cycle_id: Uuid) -> WorkflowResult<Vec<Assessment>>;
}
