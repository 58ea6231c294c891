//! Engagement Service
//!
//! Manager notes plus the append-only pulse/feedback/kudos records. Notes
//! are private to their author; the feed can only ever be assembled from
//! the acting manager's own notes.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use edge_workflow::Role;

use crate::database::{EmployeeRepository, EngagementRepository, NoteRepository};
use crate::error::{AppError, AppResult};
use crate::models::{Feedback, Kudo, ManagerNote, PulseResponse};
use crate::services::resolve_actor;

const FEED_LIMIT: i64 = 50;

/// Service for manager notes and engagement records
pub struct EngagementService {
    employees: EmployeeRepository,
    notes: NoteRepository,
    engagement: EngagementRepository,
}

impl EngagementService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            employees: EmployeeRepository::new(pool.clone()),
            notes: NoteRepository::new(pool.clone()),
            engagement: EngagementRepository::new(pool),
        }
    }

    // ── Manager notes ────────────────────────────────────────────────────

    pub async fn add_manager_note(
        &self,
        author_id: Uuid,
        employee_id: Uuid,
        content: &str,
    ) -> AppResult<ManagerNote> {
        let author = resolve_actor(&self.employees, author_id).await?;
        if author.role == Role::Employee {
            return Err(AppError::AccessDenied(
                "manager notes require the manager role".to_string(),
            ));
        }
        if content.trim().is_empty() {
            return Err(AppError::InvalidRequest("note content is required".to_string()));
        }
        self.employees.get(employee_id).await?;
        self.notes.create(author_id, employee_id, content).await
    }

    /// The acting manager's own notes, never anyone else's
    pub async fn notes_feed(&self, author_id: Uuid) -> AppResult<Vec<ManagerNote>> {
        resolve_actor(&self.employees, author_id).await?;
        self.notes.list_by_author(author_id).await
    }

    pub async fn notes_for_employee(
        &self,
        author_id: Uuid,
        employee_id: Uuid,
    ) -> AppResult<Vec<ManagerNote>> {
        resolve_actor(&self.employees, author_id).await?;
        self.notes.list_for_employee(author_id, employee_id).await
    }

    // ── Engagement records ───────────────────────────────────────────────

    pub async fn record_pulse(
        &self,
        employee_id: Uuid,
        score: i16,
        comment: Option<&str>,
    ) -> AppResult<PulseResponse> {
        if !(1..=5).contains(&score) {
            return Err(AppError::InvalidRequest(
                "pulse score must be between 1 and 5".to_string(),
            ));
        }
        resolve_actor(&self.employees, employee_id).await?;
        self.engagement.record_pulse(employee_id, score, comment).await
    }

    pub async fn record_feedback(
        &self,
        from_employee_id: Uuid,
        to_employee_id: Uuid,
        content: &str,
    ) -> AppResult<Feedback> {
        if content.trim().is_empty() {
            return Err(AppError::InvalidRequest("feedback content is required".to_string()));
        }
        resolve_actor(&self.employees, from_employee_id).await?;
        self.employees.get(to_employee_id).await?;
        self.engagement
            .record_feedback(from_employee_id, to_employee_id, content)
            .await
    }

    pub async fn record_kudo(
        &self,
        from_employee_id: Uuid,
        to_employee_id: Uuid,
        category: Option<&str>,
        message: &str,
    ) -> AppResult<Kudo> {
        if message.trim().is_empty() {
            return Err(AppError::InvalidRequest("kudo message is required".to_string()));
        }
        resolve_actor(&self.employees, from_employee_id).await?;
        self.employees.get(to_employee_id).await?;
        self.engagement
            .record_kudo(from_employee_id, to_employee_id, category, message)
            .await
    }

    /// Dashboard read: recent engagement records for one employee
    pub async fn engagement_feed(&self, employee_id: Uuid) -> AppResult<EngagementFeed> {
        Ok(EngagementFeed {
            pulses: self.engagement.recent_pulses(employee_id, FEED_LIMIT).await?,
            feedback: self.engagement.feedback_for(employee_id, FEED_LIMIT).await?,
            kudos: self.engagement.kudos_for(employee_id, FEED_LIMIT).await?,
        })
    }
}

/// Recent engagement records for an employee dashboard
#[derive(Debug, Serialize)]
pub struct EngagementFeed {
    pub pulses: Vec<PulseResponse>,
    pub feedback: Vec<Feedback>,
    pub kudos: Vec<Kudo>,
}
