//! Assessment Record and Payloads
//!
//! One assessment per (employee, review cycle). The record carries the
//! composite state, both structured payloads, the transition history, and a
//! version counter for optimistic concurrency at the storage boundary.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::{AssessmentState, StateTransition, StatusProjection};

/// The per-employee-per-cycle review record and workflow unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub id: Uuid,
    pub cycle_id: Uuid,
    pub employee_id: Uuid,
    /// Manager of record, snapshotted when the assessment is created
    pub manager_id: Option<Uuid>,

    pub state: AssessmentState,

    pub self_assessment: Option<SelfAssessmentForm>,
    pub manager_review: Option<ManagerReviewForm>,
    pub admin_notes: Option<String>,

    pub due_date: Option<NaiveDate>,
    pub acknowledged_at: Option<DateTime<Utc>>,

    pub history: Vec<StateTransition>,

    /// Bumped by the store on every successful save
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assessment {
    /// Create a fresh assessment in `NotStarted`
    pub fn new(
        cycle_id: Uuid,
        employee_id: Uuid,
        manager_id: Option<Uuid>,
        due_date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            cycle_id,
            employee_id,
            manager_id,
            state: AssessmentState::NotStarted,
            self_assessment: None,
            manager_review: None,
            admin_notes: None,
            due_date,
            acknowledged_at: None,
            history: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a state transition
    pub fn transition_to(
        &mut self,
        to: AssessmentState,
        actor_id: Option<Uuid>,
        reason: Option<String>,
        admin_override: bool,
        now: DateTime<Utc>,
    ) {
        let from = std::mem::replace(&mut self.state, to);
        self.history.push(StateTransition {
            from,
            to,
            actor_id,
            reason,
            transitioned_at: now,
            admin_override,
        });
        self.updated_at = now;
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Legacy three-column status view
    pub fn status_projection(&self) -> StatusProjection {
        StatusProjection::from(self.state)
    }
}

/// Employee-authored portion of an assessment.
///
/// The GWC rubric rides along as opaque structured data; the engine never
/// interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfAssessmentForm {
    pub accomplishments: String,
    pub strengths: String,
    pub improvements: String,
    pub overall_rating: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gwc: Option<serde_json::Value>,
}

impl SelfAssessmentForm {
    /// Names of mandatory fields that are absent or blank
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.accomplishments.trim().is_empty() {
            missing.push("accomplishments".to_string());
        }
        if self.strengths.trim().is_empty() {
            missing.push("strengths".to_string());
        }
        if self.improvements.trim().is_empty() {
            missing.push("improvements".to_string());
        }
        missing
    }

    /// True if any field carries content at all
    pub fn has_content(&self) -> bool {
        !self.accomplishments.trim().is_empty()
            || !self.strengths.trim().is_empty()
            || !self.improvements.trim().is_empty()
            || self.overall_rating.is_some()
            || self.gwc.is_some()
    }
}

/// Manager-authored evaluation of an employee's self-assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerReviewForm {
    pub feedback: String,
    pub overall_rating: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gwc: Option<serde_json::Value>,
}

impl ManagerReviewForm {
    /// Names of mandatory fields that are absent or blank
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.feedback.trim().is_empty() {
            missing.push("feedback".to_string());
        }
        if self.overall_rating.is_none() {
            missing.push("overall_rating".to_string());
        }
        missing
    }
}
