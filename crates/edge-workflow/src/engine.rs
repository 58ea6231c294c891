//! Assessment Workflow Engine
//!
//! Owns the lifecycle of one assessment per (employee, review cycle):
//! validates legal state transitions, applies the permission gate, and
//! produces the next persisted state plus any notification intents.
//!
//! Every mutating operation is a single read-validate-apply-save round trip
//! against the storage port; a transition is never issued against state read
//! more than one round trip earlier. A `Conflict` on save triggers exactly
//! one transparent re-read-and-reapply, since lost-update races between an
//! employee and a manager are expected.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::assessment::{Assessment, ManagerReviewForm, SelfAssessmentForm};
use crate::cycle::{CycleStatus, ReviewCycle};
use crate::error::{WorkflowError, WorkflowResult};
use crate::notify::{NotificationIntent, NotificationKind};
use crate::permissions::{can_administer, can_perform, Actor, Operation};
use crate::state::AssessmentState;
use crate::store::AssessmentStore;

/// Time source, injected so tests can pin the clock
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed time source for tests and deterministic wiring
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// When false, the admin-approval gate is configured out and
    /// acknowledgment is legal directly from `ManagerCompleted`
    pub require_admin_approval: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            require_admin_approval: true,
        }
    }
}

/// Result of a mutating assessment operation
#[derive(Debug)]
pub struct TransitionOutcome {
    pub assessment: Assessment,
    pub notifications: Vec<NotificationIntent>,
}

/// Result of a cycle lifecycle operation
#[derive(Debug)]
pub struct CycleOutcome {
    pub cycle: ReviewCycle,
    /// Assessments created by activation (0 for close)
    pub created: u64,
    pub notifications: Vec<NotificationIntent>,
}

/// What a validated operation decided to do
enum Step {
    /// Persist the mutation and emit these intents
    Commit(Vec<NotificationIntent>),
    /// Nothing to write (idempotent no-op)
    Skip,
}

/// The assessment workflow engine
pub struct AssessmentEngine<S> {
    store: S,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl<S: AssessmentStore> AssessmentEngine<S> {
    /// Create an engine over a storage port with the system clock
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config: EngineConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Access the underlying store (read paths, test seeding)
    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Employee-side operations ─────────────────────────────────────────

    /// `NotStarted -> InProgress`, by the assessment's employee
    pub async fn start_self_assessment(
        &self,
        id: Uuid,
        actor: &Actor,
    ) -> WorkflowResult<TransitionOutcome> {
        let op = Operation::StartSelfAssessment;
        self.apply(id, actor, op, |a, now| {
            if a.state != AssessmentState::NotStarted {
                return Err(invalid(a, op));
            }
            a.transition_to(AssessmentState::InProgress, Some(actor.user_id), None, false, now);
            Ok(Step::Commit(Vec::new()))
        })
        .await
    }

    /// Persist a draft without advancing state. Auto-promotes
    /// `NotStarted -> InProgress` on first save; a repeat save with an
    /// unchanged payload is a no-op.
    pub async fn save_self_assessment_draft(
        &self,
        id: Uuid,
        actor: &Actor,
        form: SelfAssessmentForm,
    ) -> WorkflowResult<TransitionOutcome> {
        let op = Operation::SaveSelfAssessmentDraft;
        self.apply(id, actor, op, |a, now| {
            match a.state {
                AssessmentState::NotStarted => {
                    a.self_assessment = Some(form.clone());
                    a.transition_to(
                        AssessmentState::InProgress,
                        Some(actor.user_id),
                        None,
                        false,
                        now,
                    );
                }
                AssessmentState::InProgress => {
                    if a.self_assessment.as_ref() == Some(&form) {
                        return Ok(Step::Skip);
                    }
                    a.self_assessment = Some(form.clone());
                    a.updated_at = now;
                }
                _ => return Err(invalid(a, op)),
            }
            Ok(Step::Commit(Vec::new()))
        })
        .await
    }

    /// Submit the self-assessment: validates mandatory fields, transitions
    /// to `EmployeeSubmitted`, and notifies the assigned manager
    pub async fn submit_self_assessment(
        &self,
        id: Uuid,
        actor: &Actor,
        form: SelfAssessmentForm,
    ) -> WorkflowResult<TransitionOutcome> {
        let op = Operation::SubmitSelfAssessment;
        self.apply(id, actor, op, |a, now| {
            let missing = form.missing_fields();
            if !missing.is_empty() {
                return Err(WorkflowError::Validation {
                    missing_fields: missing,
                });
            }
            if !matches!(
                a.state,
                AssessmentState::NotStarted | AssessmentState::InProgress
            ) {
                return Err(invalid(a, op));
            }

            a.self_assessment = Some(form.clone());
            a.transition_to(
                AssessmentState::EmployeeSubmitted,
                Some(actor.user_id),
                None,
                false,
                now,
            );

            let mut intents = Vec::new();
            if let Some(manager_id) = a.manager_id {
                intents.push(NotificationIntent::to_manager(
                    manager_id,
                    NotificationKind::SelfAssessmentSubmitted,
                    json!({
                        "assessment_id": a.id,
                        "employee_id": a.employee_id,
                        "cycle_id": a.cycle_id,
                    }),
                ));
            }
            Ok(Step::Commit(intents))
        })
        .await
    }

    // ── Manager-side operations ──────────────────────────────────────────

    /// `EmployeeSubmitted -> ManagerInProgress`, by the manager of record
    pub async fn start_manager_review(
        &self,
        id: Uuid,
        actor: &Actor,
    ) -> WorkflowResult<TransitionOutcome> {
        let op = Operation::StartManagerReview;
        self.apply(id, actor, op, |a, now| {
            if a.state != AssessmentState::EmployeeSubmitted {
                return Err(invalid(a, op));
            }
            a.transition_to(
                AssessmentState::ManagerInProgress,
                Some(actor.user_id),
                None,
                false,
                now,
            );
            Ok(Step::Commit(Vec::new()))
        })
        .await
    }

    /// Submit the manager review. Rating, feedback, and status commit in a
    /// single conditional write; the engine never splits this into partial
    /// updates. Auto-promotes directly from `EmployeeSubmitted`. Notifies
    /// the employee and the admin approval queue.
    pub async fn submit_manager_review(
        &self,
        id: Uuid,
        actor: &Actor,
        form: ManagerReviewForm,
    ) -> WorkflowResult<TransitionOutcome> {
        let op = Operation::SubmitManagerReview;
        self.apply(id, actor, op, |a, now| {
            let missing = form.missing_fields();
            if !missing.is_empty() {
                return Err(WorkflowError::Validation {
                    missing_fields: missing,
                });
            }
            if !matches!(
                a.state,
                AssessmentState::EmployeeSubmitted | AssessmentState::ManagerInProgress
            ) {
                return Err(invalid(a, op));
            }

            a.manager_review = Some(form.clone());
            a.transition_to(
                AssessmentState::ManagerCompleted,
                Some(actor.user_id),
                None,
                false,
                now,
            );

            let payload = json!({
                "assessment_id": a.id,
                "employee_id": a.employee_id,
                "cycle_id": a.cycle_id,
            });
            Ok(Step::Commit(vec![
                NotificationIntent::to_employee(
                    a.employee_id,
                    NotificationKind::ManagerReviewCompleted,
                    payload.clone(),
                ),
                NotificationIntent::to_admin_queue(
                    NotificationKind::ManagerReviewCompleted,
                    payload,
                ),
            ]))
        })
        .await
    }

    // ── Admin-side operations ────────────────────────────────────────────

    /// Send a completed review back to the manager for revision. The only
    /// backward edge in the lifecycle; notes are mandatory and travel with
    /// the notification.
    pub async fn request_revision(
        &self,
        id: Uuid,
        actor: &Actor,
        notes: &str,
    ) -> WorkflowResult<TransitionOutcome> {
        let op = Operation::RequestRevision;
        self.apply(id, actor, op, |a, now| {
            if notes.trim().is_empty() {
                return Err(WorkflowError::Validation {
                    missing_fields: vec!["notes".to_string()],
                });
            }
            if a.state != AssessmentState::ManagerCompleted {
                return Err(invalid(a, op));
            }

            a.admin_notes = Some(notes.to_string());
            a.transition_to(
                AssessmentState::ManagerInProgress,
                Some(actor.user_id),
                Some(notes.to_string()),
                false,
                now,
            );

            let mut intents = Vec::new();
            if let Some(manager_id) = a.manager_id {
                intents.push(NotificationIntent::to_manager(
                    manager_id,
                    NotificationKind::RevisionRequested,
                    json!({
                        "assessment_id": a.id,
                        "employee_id": a.employee_id,
                        "notes": notes,
                    }),
                ));
            }
            Ok(Step::Commit(intents))
        })
        .await
    }

    /// Finalize a completed review: `ManagerCompleted -> AdminApproved`,
    /// notifying the employee that it is ready to acknowledge
    pub async fn approve_review(
        &self,
        id: Uuid,
        actor: &Actor,
        notes: Option<&str>,
    ) -> WorkflowResult<TransitionOutcome> {
        let op = Operation::ApproveReview;
        self.apply(id, actor, op, |a, now| {
            if a.state != AssessmentState::ManagerCompleted {
                return Err(invalid(a, op));
            }
            if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
                a.admin_notes = Some(notes.to_string());
            }
            a.transition_to(
                AssessmentState::AdminApproved,
                Some(actor.user_id),
                None,
                false,
                now,
            );
            Ok(Step::Commit(vec![NotificationIntent::to_employee(
                a.employee_id,
                NotificationKind::ReviewFinalized,
                json!({
                    "assessment_id": a.id,
                    "cycle_id": a.cycle_id,
                }),
            )]))
        })
        .await
    }

    /// Terminal confirmation that the employee read the finalized feedback.
    /// After this, every mutating operation on the assessment fails with
    /// `Terminal`.
    pub async fn acknowledge_review(
        &self,
        id: Uuid,
        actor: &Actor,
    ) -> WorkflowResult<TransitionOutcome> {
        let op = Operation::AcknowledgeReview;
        self.apply(id, actor, op, |a, now| {
            let allowed = a.state == AssessmentState::AdminApproved
                || (!self.config.require_admin_approval
                    && a.state == AssessmentState::ManagerCompleted);
            if !allowed {
                return Err(invalid(a, op));
            }

            a.acknowledged_at = Some(now);
            a.transition_to(
                AssessmentState::Acknowledged,
                Some(actor.user_id),
                None,
                false,
                now,
            );

            let mut intents = Vec::new();
            if let Some(manager_id) = a.manager_id {
                intents.push(NotificationIntent::to_manager(
                    manager_id,
                    NotificationKind::ReviewAcknowledged,
                    json!({
                        "assessment_id": a.id,
                        "employee_id": a.employee_id,
                    }),
                ));
            }
            Ok(Step::Commit(intents))
        })
        .await
    }

    /// Explicit admin override: jump a non-terminal assessment to an
    /// arbitrary state, with a mandatory justification. Recorded in the
    /// transition history with the override flag and logged at WARN; there
    /// is no silent bypass of validation.
    pub async fn admin_override_state(
        &self,
        id: Uuid,
        actor: &Actor,
        to: AssessmentState,
        reason: &str,
    ) -> WorkflowResult<TransitionOutcome> {
        let op = Operation::AdminOverride;
        self.apply(id, actor, op, |a, now| {
            if reason.trim().is_empty() {
                return Err(WorkflowError::Validation {
                    missing_fields: vec!["reason".to_string()],
                });
            }
            if a.state == to {
                return Ok(Step::Skip);
            }

            warn!(
                assessment = %a.id,
                from = %a.state,
                to = %to,
                admin = %actor.user_id,
                "admin override applied"
            );
            if to == AssessmentState::Acknowledged {
                a.acknowledged_at = Some(now);
            }
            a.transition_to(to, Some(actor.user_id), Some(reason.to_string()), true, now);
            Ok(Step::Commit(Vec::new()))
        })
        .await
    }

    // ── Cycle lifecycle ──────────────────────────────────────────────────

    /// Activate an upcoming cycle: bulk-create assessments for every active
    /// employee without one (idempotent per employee), then mark the cycle
    /// active. Returns the created count.
    pub async fn activate_cycle(&self, cycle_id: Uuid, actor: &Actor) -> WorkflowResult<CycleOutcome> {
        let op = Operation::ActivateCycle;
        if !can_administer(op, actor) {
            return Err(forbidden(op, actor));
        }

        let mut cycle = self.store.get_cycle(cycle_id).await?;
        if cycle.status != CycleStatus::Upcoming {
            return Err(WorkflowError::InvalidTransition {
                from: cycle.status.as_str().to_string(),
                operation: op,
            });
        }

        let created = self
            .store
            .create_assessments_for_cycle(cycle_id, Some(cycle.ends_on))
            .await?;

        cycle.status = CycleStatus::Active;
        cycle.updated_at = self.clock.now();
        let cycle = self.store.save_cycle(&cycle).await?;

        info!(cycle = %cycle_id, created, "review cycle activated");
        Ok(CycleOutcome {
            cycle,
            created,
            notifications: vec![NotificationIntent::to_admin_queue(
                NotificationKind::CycleActivated,
                json!({
                    "cycle_id": cycle_id,
                    "assessments_created": created,
                }),
            )],
        })
    }

    /// Close an active cycle. Terminal for the cycle; assessment state is
    /// untouched — completion is reported, never enforced.
    pub async fn close_cycle(&self, cycle_id: Uuid, actor: &Actor) -> WorkflowResult<CycleOutcome> {
        let op = Operation::CloseCycle;
        if !can_administer(op, actor) {
            return Err(forbidden(op, actor));
        }

        let mut cycle = self.store.get_cycle(cycle_id).await?;
        if cycle.status != CycleStatus::Active {
            return Err(WorkflowError::InvalidTransition {
                from: cycle.status.as_str().to_string(),
                operation: op,
            });
        }

        cycle.status = CycleStatus::Closed;
        cycle.updated_at = self.clock.now();
        let cycle = self.store.save_cycle(&cycle).await?;

        info!(cycle = %cycle_id, "review cycle closed");
        Ok(CycleOutcome {
            cycle,
            created: 0,
            notifications: Vec::new(),
        })
    }

    // ── Read paths ───────────────────────────────────────────────────────

    pub async fn get_assessment(&self, id: Uuid) -> WorkflowResult<Assessment> {
        self.store.get(id).await
    }

    pub async fn list_by_employee(&self, employee_id: Uuid) -> WorkflowResult<Vec<Assessment>> {
        self.store.list_by_employee(employee_id).await
    }

    pub async fn list_by_manager(&self, manager_id: Uuid) -> WorkflowResult<Vec<Assessment>> {
        self.store.list_by_manager(manager_id).await
    }

    pub async fn list_by_cycle(&self, cycle_id: Uuid) -> WorkflowResult<Vec<Assessment>> {
        self.store.list_by_cycle(cycle_id).await
    }

    pub async fn get_cycle(&self, id: Uuid) -> WorkflowResult<ReviewCycle> {
        self.store.get_cycle(id).await
    }

    // ── Transition plumbing ──────────────────────────────────────────────

    /// Single read-validate-apply-save round trip. The permission gate runs
    /// before any state inspection, then the terminal check, then the
    /// operation's own preconditions. On `Conflict`, re-read and reapply
    /// exactly once before surfacing.
    async fn apply<F>(
        &self,
        id: Uuid,
        actor: &Actor,
        operation: Operation,
        mutate: F,
    ) -> WorkflowResult<TransitionOutcome>
    where
        F: Fn(&mut Assessment, DateTime<Utc>) -> WorkflowResult<Step>,
    {
        let mut retried = false;
        loop {
            let mut assessment = self.store.get(id).await?;

            if !can_perform(operation, actor, &assessment) {
                return Err(forbidden(operation, actor));
            }
            if assessment.is_terminal() {
                return Err(WorkflowError::Terminal(id));
            }

            let expected = assessment.version;
            let now = self.clock.now();
            match mutate(&mut assessment, now)? {
                Step::Skip => {
                    return Ok(TransitionOutcome {
                        assessment,
                        notifications: Vec::new(),
                    })
                }
                Step::Commit(notifications) => match self.store.save(&assessment, expected).await {
                    Ok(saved) => {
                        debug!(
                            assessment = %id,
                            operation = %operation,
                            state = %saved.state,
                            "transition applied"
                        );
                        return Ok(TransitionOutcome {
                            assessment: saved,
                            notifications,
                        });
                    }
                    Err(WorkflowError::Conflict(_)) if !retried => {
                        debug!(assessment = %id, operation = %operation, "conflict, reapplying");
                        retried = true;
                    }
                    Err(e) => return Err(e),
                },
            }
        }
    }
}

fn invalid(assessment: &Assessment, operation: Operation) -> WorkflowError {
    WorkflowError::InvalidTransition {
        from: assessment.state.as_str().to_string(),
        operation,
    }
}

fn forbidden(operation: Operation, actor: &Actor) -> WorkflowError {
    WorkflowError::Forbidden {
        operation,
        role: actor.role,
        user_id: actor.user_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{EmployeeRef, MemoryStore};
    use crate::permissions::Role;

    fn self_form() -> SelfAssessmentForm {
        SelfAssessmentForm {
            accomplishments: "Shipped the billing migration".to_string(),
            strengths: "Ownership".to_string(),
            improvements: "Estimation".to_string(),
            overall_rating: Some(4),
            gwc: None,
        }
    }

    fn review_form() -> ManagerReviewForm {
        ManagerReviewForm {
            feedback: "Consistent delivery this cycle".to_string(),
            overall_rating: Some(4),
            gwc: None,
        }
    }

    struct Setup {
        engine: AssessmentEngine<MemoryStore>,
        assessment_id: Uuid,
        employee: Actor,
        manager: Actor,
        admin: Actor,
    }

    async fn setup() -> Setup {
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

        Setup {
            engine: AssessmentEngine::new(store),
            assessment_id,
            employee: Actor::new(employee_id, Role::Employee),
            manager: Actor::new(manager_id, Role::Manager),
            admin: Actor::new(Uuid::new_v4(), Role::Admin),
        }
    }

    #[tokio::test]
    async fn test_full_lifecycle_happy_path() {
        let s = setup().await;
        let id = s.assessment_id;

        s.engine
            .start_self_assessment(id, &s.employee)
            .await
            .unwrap();
        let out = s
            .engine
            .submit_self_assessment(id, &s.employee, self_form())
            .await
            .unwrap();
        assert_eq!(out.assessment.state, AssessmentState::EmployeeSubmitted);
        assert_eq!(out.notifications.len(), 1);

        s.engine.start_manager_review(id, &s.manager).await.unwrap();
        let out = s
            .engine
            .submit_manager_review(id, &s.manager, review_form())
            .await
            .unwrap();
        assert_eq!(out.assessment.state, AssessmentState::ManagerCompleted);
        // Employee plus admin queue
        assert_eq!(out.notifications.len(), 2);

        s.engine.approve_review(id, &s.admin, None).await.unwrap();
        let out = s.engine.acknowledge_review(id, &s.employee).await.unwrap();
        assert_eq!(out.assessment.state, AssessmentState::Acknowledged);
        assert!(out.assessment.acknowledged_at.is_some());
    }

    #[tokio::test]
    async fn test_start_twice_is_invalid_transition() {
        let s = setup().await;
        s.engine
            .start_self_assessment(s.assessment_id, &s.employee)
            .await
            .unwrap();
        let err = s
            .engine
            .start_self_assessment(s.assessment_id, &s.employee)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_wrong_employee_is_forbidden() {
        let s = setup().await;
        let stranger = Actor::new(Uuid::new_v4(), Role::Employee);
        let err = s
            .engine
            .start_self_assessment(s.assessment_id, &stranger)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_manager_review_cannot_start_before_submission() {
        let s = setup().await;
        let err = s
            .engine
            .start_manager_review(s.assessment_id, &s.manager)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_draft_resave_is_noop() {
        let s = setup().await;
        let id = s.assessment_id;
        let form = self_form();

        let first = s
            .engine
            .save_self_assessment_draft(id, &s.employee, form.clone())
            .await
            .unwrap();
        let second = s
            .engine
            .save_self_assessment_draft(id, &s.employee, form)
            .await
            .unwrap();
        // Unchanged payload in an unchanged state does not bump the version
        assert_eq!(second.assessment.version, first.assessment.version);
    }

    #[tokio::test]
    async fn test_revision_loop_and_resubmit() {
        let s = setup().await;
        let id = s.assessment_id;

        s.engine
            .submit_self_assessment(id, &s.employee, self_form())
            .await
            .unwrap();
        s.engine
            .submit_manager_review(id, &s.manager, review_form())
            .await
            .unwrap();

        let out = s
            .engine
            .request_revision(id, &s.admin, "needs more detail")
            .await
            .unwrap();
        assert_eq!(out.assessment.state, AssessmentState::ManagerInProgress);
        assert_eq!(out.notifications.len(), 1);
        assert_eq!(
            out.notifications[0].kind,
            NotificationKind::RevisionRequested
        );

        // Manager revises and resubmits
        let out = s
            .engine
            .submit_manager_review(id, &s.manager, review_form())
            .await
            .unwrap();
        assert_eq!(out.assessment.state, AssessmentState::ManagerCompleted);
    }

    #[tokio::test]
    async fn test_revision_requires_notes() {
        let s = setup().await;
        let id = s.assessment_id;
        s.engine
            .submit_self_assessment(id, &s.employee, self_form())
            .await
            .unwrap();
        s.engine
            .submit_manager_review(id, &s.manager, review_form())
            .await
            .unwrap();

        let err = s.engine.request_revision(id, &s.admin, "  ").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_acknowledge_from_manager_completed_when_approval_configured_out() {
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

        let engine = AssessmentEngine::new(store).with_config(EngineConfig {
            require_admin_approval: false,
        });
        let employee = Actor::new(employee_id, Role::Employee);
        let manager = Actor::new(manager_id, Role::Manager);

        engine
            .submit_self_assessment(id, &employee, self_form())
            .await
            .unwrap();
        engine
            .submit_manager_review(id, &manager, review_form())
            .await
            .unwrap();
        let out = engine.acknowledge_review(id, &employee).await.unwrap();
        assert_eq!(out.assessment.state, AssessmentState::Acknowledged);
    }

    #[tokio::test]
    async fn test_admin_override_records_flagged_history() {
        let s = setup().await;
        let out = s
            .engine
            .admin_override_state(
                s.assessment_id,
                &s.admin,
                AssessmentState::EmployeeSubmitted,
                "employee on leave, carrying state forward",
            )
            .await
            .unwrap();
        assert_eq!(out.assessment.state, AssessmentState::EmployeeSubmitted);
        let last = out.assessment.history.last().unwrap();
        assert!(last.admin_override);
        assert!(last.reason.is_some());
    }

    #[tokio::test]
    async fn test_admin_override_requires_reason() {
        let s = setup().await;
        let err = s
            .engine
            .admin_override_state(s.assessment_id, &s.admin, AssessmentState::InProgress, "")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_cycle_activation_requires_admin_and_upcoming() {
        let store = MemoryStore::new();
        let cycle = ReviewCycle::new(
            "FY26",
            "2026-01-01".parse().unwrap(),
            "2026-12-31".parse().unwrap(),
            Utc::now(),
        );
        let cycle_id = cycle.id;
        store.insert_cycle(cycle).await;
        store
            .insert_employee(EmployeeRef {
                id: Uuid::new_v4(),
                manager_id: None,
                active: true,
            })
            .await;

        let engine = AssessmentEngine::new(store);
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        let manager = Actor::new(Uuid::new_v4(), Role::Manager);

        let err = engine.activate_cycle(cycle_id, &manager).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden { .. }));

        let out = engine.activate_cycle(cycle_id, &admin).await.unwrap();
        assert_eq!(out.created, 1);
        assert_eq!(out.cycle.status, CycleStatus::Active);

        // Already active: activation is no longer legal
        let err = engine.activate_cycle(cycle_id, &admin).await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));

        let out = engine.close_cycle(cycle_id, &admin).await.unwrap();
        assert_eq!(out.cycle.status, CycleStatus::Closed);
    }
}
