//! In-Memory Store
//!
//! Map-backed implementation of the storage port, used by tests and demo
//! wiring. Employees are seeded directly; the bulk-activation query walks
//! the seeded directory the way the Postgres implementation walks the
//! employees table.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::assessment::Assessment;
use crate::cycle::ReviewCycle;
use crate::error::{WorkflowError, WorkflowResult};
use crate::store::AssessmentStore;

/// Minimal employee directory entry for bulk activation
#[derive(Debug, Clone)]
pub struct EmployeeRef {
    pub id: Uuid,
    pub manager_id: Option<Uuid>,
    pub active: bool,
}

#[derive(Default)]
struct MemoryInner {
    assessments: HashMap<Uuid, Assessment>,
    cycles: HashMap<Uuid, ReviewCycle>,
    employees: HashMap<Uuid, EmployeeRef>,
}

/// In-memory implementation of `AssessmentStore`
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an employee into the directory
    pub async fn insert_employee(&self, employee: EmployeeRef) {
        self.inner
            .write()
            .await
            .employees
            .insert(employee.id, employee);
    }

    /// Seed a cycle directly (bypasses the engine)
    pub async fn insert_cycle(&self, cycle: ReviewCycle) {
        self.inner.write().await.cycles.insert(cycle.id, cycle);
    }

    /// Seed an assessment directly (bypasses the engine)
    pub async fn insert_assessment(&self, assessment: Assessment) {
        self.inner
            .write()
            .await
            .assessments
            .insert(assessment.id, assessment);
    }

    /// Number of stored assessments
    pub async fn assessment_count(&self) -> usize {
        self.inner.read().await.assessments.len()
    }
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn get(&self, id: Uuid) -> WorkflowResult<Assessment> {
        self.inner
            .read()
            .await
            .assessments
            .get(&id)
            .cloned()
            .ok_or(WorkflowError::NotFound(id))
    }

    async fn save(
        &self,
        assessment: &Assessment,
        expected_version: i64,
    ) -> WorkflowResult<Assessment> {
        let mut inner = self.inner.write().await;
        if let Some(stored) = inner.assessments.get(&assessment.id) {
            if stored.version != expected_version {
                return Err(WorkflowError::Conflict(assessment.id));
            }
        } else if expected_version != 0 {
            return Err(WorkflowError::NotFound(assessment.id));
        }

        let mut saved = assessment.clone();
        saved.version = expected_version + 1;
        inner.assessments.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn get_cycle(&self, id: Uuid) -> WorkflowResult<ReviewCycle> {
        self.inner
            .read()
            .await
            .cycles
            .get(&id)
            .cloned()
            .ok_or(WorkflowError::NotFound(id))
    }

    async fn save_cycle(&self, cycle: &ReviewCycle) -> WorkflowResult<ReviewCycle> {
        self.inner
            .write()
            .await
            .cycles
            .insert(cycle.id, cycle.clone());
        Ok(cycle.clone())
    }

    async fn create_assessments_for_cycle(
        &self,
        cycle_id: Uuid,
        due_date: Option<NaiveDate>,
    ) -> WorkflowResult<u64> {
        let mut inner = self.inner.write().await;
        if !inner.cycles.contains_key(&cycle_id) {
            return Err(WorkflowError::NotFound(cycle_id));
        }

        let covered: Vec<Uuid> = inner
            .assessments
            .values()
            .filter(|a| a.cycle_id == cycle_id)
            .map(|a| a.employee_id)
            .collect();

        let eligible: Vec<EmployeeRef> = inner
            .employees
            .values()
            .filter(|e| e.active && !covered.contains(&e.id))
            .cloned()
            .collect();

        let now = Utc::now();
        let mut created = 0u64;
        for employee in eligible {
            let assessment =
                Assessment::new(cycle_id, employee.id, employee.manager_id, due_date, now);
            inner.assessments.insert(assessment.id, assessment);
            created += 1;
        }
        Ok(created)
    }

    async fn list_by_employee(&self, employee_id: Uuid) -> WorkflowResult<Vec<Assessment>> {
        Ok(self
            .inner
            .read()
            .await
            .assessments
            .values()
            .filter(|a| a.employee_id == employee_id)
            .cloned()
            .collect())
    }

    async fn list_by_manager(&self, manager_id: Uuid) -> WorkflowResult<Vec<Assessment>> {
        Ok(self
            .inner
            .read()
            .await
            .assessments
            .values()
            .filter(|a| a.manager_id == Some(manager_id))
            .cloned()
            .collect())
    }

    async fn list_by_cycle(&self, cycle_id: Uuid) -> WorkflowResult<Vec<Assessment>> {
        Ok(self
            .inner
            .read()
            .await
            .assessments
            .values()
            .filter(|a| a.cycle_id == cycle_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_rejects_stale_version() {
        let store = MemoryStore::new();
        let a = Assessment::new(Uuid::new_v4(), Uuid::new_v4(), None, None, Utc::now());
        let saved = store.save(&a, 0).await.unwrap();
        assert_eq!(saved.version, 1);

        // A save based on the original read loses the race
        let result = store.save(&a, 0).await;
        assert!(matches!(result, Err(WorkflowError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_bulk_activation_skips_covered_employees() {
        let store = MemoryStore::new();
        let cycle = ReviewCycle::new(
            "FY26",
            "2026-01-01".parse().unwrap(),
            "2026-12-31".parse().unwrap(),
            Utc::now(),
        );
        let cycle_id = cycle.id;
        store.insert_cycle(cycle).await;

        let covered = Uuid::new_v4();
        for id in [covered, Uuid::new_v4(), Uuid::new_v4()] {
            store
                .insert_employee(EmployeeRef {
                    id,
                    manager_id: None,
                    active: true,
                })
                .await;
        }
        store
            .insert_employee(EmployeeRef {
                id: Uuid::new_v4(),
                manager_id: None,
                active: false,
            })
            .await;

        store
            .insert_assessment(Assessment::new(cycle_id, covered, None, None, Utc::now()))
            .await;

        // Two uncovered active employees; the inactive one is skipped
        let created = store
            .create_assessments_for_cycle(cycle_id, None)
            .await
            .unwrap();
        assert_eq!(created, 2);

        // Idempotent: a second run creates nothing
        let created_again = store
            .create_assessments_for_cycle(cycle_id, None)
            .await
            .unwrap();
        assert_eq!(created_again, 0);
        assert_eq!(store.assessment_count().await, 3);
    }
}
