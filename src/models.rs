//! Domain Row Types
//!
//! Rows for the identity directory and the append-only engagement records
//! that feed dashboards. Assessment and cycle types live in `edge-workflow`;
//! everything here matches the canonical DB schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use edge_workflow::Role;

/// Employee row - matches canonical DB schema
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub employee_id: Uuid,
    pub name: String,
    pub email: String,
    pub job_title: Option<String>,
    pub role: Role,
    /// Self-referential manager link; the reporting tree must stay acyclic
    pub manager_id: Option<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a new employee
#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployeeFields {
    pub name: String,
    pub email: String,
    pub job_title: Option<String>,
    pub role: Role,
    pub manager_id: Option<Uuid>,
}

/// Private, manager-authored, employee-scoped note. Visible only to its
/// author; every read path filters by `author_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ManagerNote {
    pub note_id: Uuid,
    pub author_id: Uuid,
    pub employee_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Anonymous-ish wellbeing pulse; append-only
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PulseResponse {
    pub pulse_id: Uuid,
    pub employee_id: Uuid,
    pub score: i16,
    pub comment: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Peer feedback record; append-only
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Feedback {
    pub feedback_id: Uuid,
    pub from_employee_id: Uuid,
    pub to_employee_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Public recognition record; append-only
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Kudo {
    pub kudo_id: Uuid,
    pub from_employee_id: Uuid,
    pub to_employee_id: Uuid,
    pub category: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
