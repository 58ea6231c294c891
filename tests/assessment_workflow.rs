//! Assessment Workflow Integration Tests
//!
//! Full lifecycle tests driving the workflow engine against the in-memory
//! store: state ordering, permission gating, cycle activation idempotence,
//! terminal behavior, and the single conflict-reapply.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use edge_workflow::{
    Actor, Assessment, AssessmentEngine, AssessmentState, AssessmentStore, EmployeeRef,
    FixedClock, ManagerReviewForm, ManagerReviewStatus, MemoryStore, NotificationKind, ReviewCycle,
    Role, SelfAssessmentForm, SelfAssessmentStatus, WorkflowError, WorkflowResult,
};

/// Test fixture: one employee reporting to one manager, one seeded
/// assessment, one admin
struct Fixture {
    engine: AssessmentEngine<MemoryStore>,
    assessment_id: Uuid,
    employee: Actor,
    manager: Actor,
    admin: Actor,
}

impl Fixture {
    async fn new() -> Self {
        let store = MemoryStore::new();
        let employee_id = Uuid::new_v4();
        let manager_id = Uuid::new_v4();

        let assessment = Assessment::new(
            Uuid::new_v4(),
            employee_id,
            Some(manager_id),
            None,
            Utc::now(),
        );
        let assessment_id = assessment.id;
        store.insert_assessment(assessment).await;

        Self {
            engine: AssessmentEngine::new(store),
            assessment_id,
            employee: Actor::new(employee_id, Role::Employee),
            manager: Actor::new(manager_id, Role::Manager),
            admin: Actor::new(Uuid::new_v4(), Role::Admin),
        }
    }

    /// Drive the assessment to `ManagerCompleted`
    async fn complete_manager_review(&self) {
        self.engine
            .submit_self_assessment(self.assessment_id, &self.employee, filled_self_form())
            .await
            .expect("self-assessment submission failed");
        self.engine
            .submit_manager_review(self.assessment_id, &self.manager, filled_review_form())
            .await
            .expect("manager review submission failed");
    }
}

fn filled_self_form() -> SelfAssessmentForm {
    SelfAssessmentForm {
        accomplishments: "Led the reporting rewrite and cut load times in half".to_string(),
        strengths: "Systems thinking, mentoring".to_string(),
        improvements: "Saying no to scope creep".to_string(),
        overall_rating: Some(4),
        gwc: Some(serde_json::json!({
            "gets_it": true,
            "wants_it": true,
            "capacity": true,
        })),
    }
}

fn filled_review_form() -> ManagerReviewForm {
    ManagerReviewForm {
        feedback: "Delivered the rewrite on time and brought two juniors along".to_string(),
        overall_rating: Some(4),
        gwc: None,
    }
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[tokio::test]
async fn submit_with_empty_required_fields_lists_them_and_leaves_state() {
    let f = Fixture::new().await;

    let blank = SelfAssessmentForm {
        accomplishments: String::new(),
        strengths: String::new(),
        improvements: String::new(),
        overall_rating: None,
        gwc: None,
    };
    let err = f
        .engine
        .submit_self_assessment(f.assessment_id, &f.employee, blank)
        .await
        .unwrap_err();

    match err {
        WorkflowError::Validation { missing_fields } => {
            assert_eq!(
                missing_fields,
                vec!["accomplishments", "strengths", "improvements"]
            );
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    // Nothing was persisted
    let stored = f.engine.get_assessment(f.assessment_id).await.unwrap();
    assert_eq!(stored.state, AssessmentState::NotStarted);
    assert_eq!(stored.version, 0);
}

#[tokio::test]
async fn foreign_manager_cannot_start_review() {
    let f = Fixture::new().await;
    f.engine
        .submit_self_assessment(f.assessment_id, &f.employee, filled_self_form())
        .await
        .unwrap();

    let other_manager = Actor::new(Uuid::new_v4(), Role::Manager);
    let err = f
        .engine
        .start_manager_review(f.assessment_id, &other_manager)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Forbidden { .. }));

    let stored = f.engine.get_assessment(f.assessment_id).await.unwrap();
    assert_eq!(stored.state, AssessmentState::EmployeeSubmitted);
}

#[tokio::test]
async fn revision_request_loops_back_and_notifies_manager() {
    let f = Fixture::new().await;
    f.complete_manager_review().await;

    let outcome = f
        .engine
        .request_revision(f.assessment_id, &f.admin, "needs more detail")
        .await
        .unwrap();

    assert_eq!(outcome.assessment.state, AssessmentState::ManagerInProgress);
    let to_manager = outcome
        .notifications
        .iter()
        .find(|n| n.recipient_id == Some(f.manager.user_id))
        .expect("manager notification missing");
    assert_eq!(to_manager.kind, NotificationKind::RevisionRequested);
    assert_eq!(to_manager.payload["notes"], "needs more detail");
}

#[tokio::test]
async fn acknowledged_assessment_is_terminal_for_every_operation() {
    let f = Fixture::new().await;
    f.complete_manager_review().await;
    f.engine
        .approve_review(f.assessment_id, &f.admin, None)
        .await
        .unwrap();

    let outcome = f
        .engine
        .acknowledge_review(f.assessment_id, &f.employee)
        .await
        .unwrap();
    assert_eq!(outcome.assessment.state, AssessmentState::Acknowledged);
    assert!(outcome.assessment.acknowledged_at.is_some());

    let before = f.engine.get_assessment(f.assessment_id).await.unwrap();

    let id = f.assessment_id;
    let results = vec![
        f.engine.start_self_assessment(id, &f.employee).await.err(),
        f.engine
            .save_self_assessment_draft(id, &f.employee, filled_self_form())
            .await
            .err(),
        f.engine
            .submit_self_assessment(id, &f.employee, filled_self_form())
            .await
            .err(),
        f.engine.start_manager_review(id, &f.manager).await.err(),
        f.engine
            .submit_manager_review(id, &f.manager, filled_review_form())
            .await
            .err(),
        f.engine.request_revision(id, &f.admin, "notes").await.err(),
        f.engine.approve_review(id, &f.admin, None).await.err(),
        f.engine.acknowledge_review(id, &f.employee).await.err(),
        f.engine
            .admin_override_state(id, &f.admin, AssessmentState::InProgress, "why")
            .await
            .err(),
    ];
    for err in results {
        assert!(matches!(err, Some(WorkflowError::Terminal(_))));
    }

    // No field changed
    let after = f.engine.get_assessment(f.assessment_id).await.unwrap();
    assert_eq!(after.version, before.version);
    assert_eq!(after.updated_at, before.updated_at);
    assert_eq!(after.state, AssessmentState::Acknowledged);
}

#[tokio::test]
async fn partial_activation_creates_only_missing_assessments() {
    let store = MemoryStore::new();
    let cycle = ReviewCycle::new("FY26", date("2026-01-01"), date("2026-12-31"), Utc::now());
    let cycle_id = cycle.id;
    store.insert_cycle(cycle).await;

    // Ten eligible employees, two already covered by a prior partial run
    let mut employee_ids = Vec::new();
    for _ in 0..10 {
        let id = Uuid::new_v4();
        employee_ids.push(id);
        store
            .insert_employee(EmployeeRef {
                id,
                manager_id: None,
                active: true,
            })
            .await;
    }
    for id in &employee_ids[..2] {
        store
            .insert_assessment(Assessment::new(cycle_id, *id, None, None, Utc::now()))
            .await;
    }

    let engine = AssessmentEngine::new(store);
    let admin = Actor::new(Uuid::new_v4(), Role::Admin);
    let outcome = engine.activate_cycle(cycle_id, &admin).await.unwrap();

    assert_eq!(outcome.created, 8);
    assert_eq!(engine.list_by_cycle(cycle_id).await.unwrap().len(), 10);
}

#[tokio::test]
async fn draft_then_submit_round_trips_payload_exactly() {
    let f = Fixture::new().await;
    let form = filled_self_form();

    f.engine
        .save_self_assessment_draft(f.assessment_id, &f.employee, form.clone())
        .await
        .unwrap();
    f.engine
        .submit_self_assessment(f.assessment_id, &f.employee, form.clone())
        .await
        .unwrap();

    let stored = f.engine.get_assessment(f.assessment_id).await.unwrap();
    assert_eq!(stored.self_assessment, Some(form));
}

#[tokio::test]
async fn manager_review_only_completes_after_self_assessment() {
    let f = Fixture::new().await;

    // The gate holds while the self-assessment is still open
    let err = f
        .engine
        .submit_manager_review(f.assessment_id, &f.manager, filled_review_form())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));

    f.engine
        .start_self_assessment(f.assessment_id, &f.employee)
        .await
        .unwrap();
    let err = f
        .engine
        .submit_manager_review(f.assessment_id, &f.manager, filled_review_form())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));

    // After submission the review can run, and the projections stay ordered
    f.engine
        .submit_self_assessment(f.assessment_id, &f.employee, filled_self_form())
        .await
        .unwrap();
    let outcome = f
        .engine
        .submit_manager_review(f.assessment_id, &f.manager, filled_review_form())
        .await
        .unwrap();

    let projection = outcome.assessment.status_projection();
    assert_eq!(
        projection.manager_review_status,
        ManagerReviewStatus::Completed
    );
    assert_eq!(
        projection.self_assessment_status,
        SelfAssessmentStatus::EmployeeComplete
    );
}

#[tokio::test]
async fn acknowledgment_timestamp_comes_from_the_injected_clock() {
    let store = MemoryStore::new();
    let employee_id = Uuid::new_v4();
    let manager_id = Uuid::new_v4();
    let assessment = Assessment::new(
        Uuid::new_v4(),
        employee_id,
        Some(manager_id),
        None,
        Utc::now(),
    );
    let id = assessment.id;
    store.insert_assessment(assessment).await;

    let frozen = Utc.with_ymd_and_hms(2026, 6, 30, 17, 0, 0).unwrap();
    let engine = AssessmentEngine::new(store).with_clock(Arc::new(FixedClock(frozen)));

    let employee = Actor::new(employee_id, Role::Employee);
    let manager = Actor::new(manager_id, Role::Manager);
    let admin = Actor::new(Uuid::new_v4(), Role::Admin);

    engine
        .submit_self_assessment(id, &employee, filled_self_form())
        .await
        .unwrap();
    engine
        .submit_manager_review(id, &manager, filled_review_form())
        .await
        .unwrap();
    engine.approve_review(id, &admin, None).await.unwrap();
    let outcome = engine.acknowledge_review(id, &employee).await.unwrap();

    assert_eq!(outcome.assessment.acknowledged_at, Some(frozen));
}

/// Store wrapper that fails the first `conflicts` saves with `Conflict`
struct FlakySaves {
    inner: MemoryStore,
    remaining: AtomicU32,
}

impl FlakySaves {
    fn new(inner: MemoryStore, conflicts: u32) -> Self {
        Self {
            inner,
            remaining: AtomicU32::new(conflicts),
        }
    }
}

#[async_trait]
impl AssessmentStore for FlakySaves {
    async fn get(&self, id: Uuid) -> WorkflowResult<Assessment> {
        self.inner.get(id).await
    }

    async fn save(
        &self,
        assessment: &Assessment,
        expected_version: i64,
    ) -> WorkflowResult<Assessment> {
        if self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(WorkflowError::Conflict(assessment.id));
        }
        self.inner.save(assessment, expected_version).await
    }

    async fn get_cycle(&self, id: Uuid) -> WorkflowResult<ReviewCycle> {
        self.inner.get_cycle(id).await
    }

    async fn save_cycle(&self, cycle: &ReviewCycle) -> WorkflowResult<ReviewCycle> {
        self.inner.save_cycle(cycle).await
    }

    async fn create_assessments_for_cycle(
        &self,
        cycle_id: Uuid,
        due_date: Option<NaiveDate>,
    ) -> WorkflowResult<u64> {
        self.inner
            .create_assessments_for_cycle(cycle_id, due_date)
            .await
    }

    async fn list_by_employee(&self, employee_id: Uuid) -> WorkflowResult<Vec<Assessment>> {
        self.inner.list_by_employee(employee_id).await
    }

    async fn list_by_manager(&self, manager_id: Uuid) -> WorkflowResult<Vec<Assessment>> {
        self.inner.list_by_manager(manager_id).await
    }

    async fn list_by_cycle(&self, cycle_id: Uuid) -> WorkflowResult<Vec<Assessment>> {
        self.inner.list_by_cycle(cycle_id).await
    }
}

async fn flaky_fixture(conflicts: u32) -> (AssessmentEngine<FlakySaves>, Uuid, Actor) {
    let store = MemoryStore::new();
    let employee_id = Uuid::new_v4();
    let assessment = Assessment::new(Uuid::new_v4(), employee_id, None, None, Utc::now());
    let id = assessment.id;
    store.insert_assessment(assessment).await;

    (
        AssessmentEngine::new(FlakySaves::new(store, conflicts)),
        id,
        Actor::new(employee_id, Role::Employee),
    )
}

#[tokio::test]
async fn single_conflict_is_reapplied_transparently() {
    let (engine, id, employee) = flaky_fixture(1).await;
    let outcome = engine.start_self_assessment(id, &employee).await.unwrap();
    assert_eq!(outcome.assessment.state, AssessmentState::InProgress);
}

#[tokio::test]
async fn second_consecutive_conflict_surfaces() {
    let (engine, id, employee) = flaky_fixture(2).await;
    let err = engine.start_self_assessment(id, &employee).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Conflict(_)));
}
