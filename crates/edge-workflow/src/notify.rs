//! Notification Intents
//!
//! Transitions emit intents; the presentation collaborator decides how and
//! when to deliver them. The engine never calls a notification transport.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permissions::Role;

/// What the notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    SelfAssessmentSubmitted,
    ManagerReviewCompleted,
    RevisionRequested,
    ReviewFinalized,
    ReviewAcknowledged,
    CycleActivated,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelfAssessmentSubmitted => "self_assessment_submitted",
            Self::ManagerReviewCompleted => "manager_review_completed",
            Self::RevisionRequested => "revision_requested",
            Self::ReviewFinalized => "review_finalized",
            Self::ReviewAcknowledged => "review_acknowledged",
            Self::CycleActivated => "cycle_activated",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A notification the collaborator should deliver.
///
/// `recipient_id` is `None` for role-wide queues (the admin approval queue).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationIntent {
    pub recipient_role: Role,
    pub recipient_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub payload: serde_json::Value,
}

impl NotificationIntent {
    pub fn to_employee(id: Uuid, kind: NotificationKind, payload: serde_json::Value) -> Self {
        Self {
            recipient_role: Role::Employee,
            recipient_id: Some(id),
            kind,
            payload,
        }
    }

    pub fn to_manager(id: Uuid, kind: NotificationKind, payload: serde_json::Value) -> Self {
        Self {
            recipient_role: Role::Manager,
            recipient_id: Some(id),
            kind,
            payload,
        }
    }

    /// Queue-style intent for all admins
    pub fn to_admin_queue(kind: NotificationKind, payload: serde_json::Value) -> Self {
        Self {
            recipient_role: Role::Admin,
            recipient_id: None,
            kind,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_queue_has_no_specific_recipient() {
        let intent = NotificationIntent::to_admin_queue(
            NotificationKind::ManagerReviewCompleted,
            serde_json::json!({}),
        );
        assert_eq!(intent.recipient_role, Role::Admin);
        assert!(intent.recipient_id.is_none());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&NotificationKind::RevisionRequested).unwrap();
        assert_eq!(json, "\"revision_requested\"");
    }
}
