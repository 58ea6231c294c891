//! Engagement Record Repository
//!
//! Append-only pulse/feedback/kudos records. Read inputs to dashboards;
//! never part of the workflow state machine.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Feedback, Kudo, PulseResponse};

/// Repository for append-only engagement records
#[derive(Clone)]
pub struct EngagementRepository {
    pool: PgPool,
}

impl EngagementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record_pulse(
        &self,
        employee_id: Uuid,
        score: i16,
        comment: Option<&str>,
    ) -> AppResult<PulseResponse> {
        Ok(sqlx::query_as::<_, PulseResponse>(
            r#"
            INSERT INTO pulse_responses (pulse_id, employee_id, score, comment, recorded_at)
            VALUES (gen_random_uuid(), $1, $2, $3, now())
            RETURNING pulse_id, employee_id, score, comment, recorded_at
            "#,
        )
        .bind(employee_id)
        .bind(score)
        .bind(comment)
        .fetch_one(&self.pool)
        .await?)
    }

    pub async fn record_feedback(
        &self,
        from_employee_id: Uuid,
        to_employee_id: Uuid,
        content: &str,
    ) -> AppResult<Feedback> {
        Ok(sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO feedback (feedback_id, from_employee_id, to_employee_id, content, created_at)
            VALUES (gen_random_uuid(), $1, $2, $3, now())
            RETURNING feedback_id, from_employee_id, to_employee_id, content, created_at
            "#,
        )
        .bind(from_employee_id)
        .bind(to_employee_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?)
    }

    pub async fn record_kudo(
        &self,
        from_employee_id: Uuid,
        to_employee_id: Uuid,
        category: Option<&str>,
        message: &str,
    ) -> AppResult<Kudo> {
        Ok(sqlx::query_as::<_, Kudo>(
            r#"
            INSERT INTO kudos (kudo_id, from_employee_id, to_employee_id, category, message, created_at)
            VALUES (gen_random_uuid(), $1, $2, $3, $4, now())
            RETURNING kudo_id, from_employee_id, to_employee_id, category, message, created_at
            "#,
        )
        .bind(from_employee_id)
        .bind(to_employee_id)
        .bind(category)
        .bind(message)
        .fetch_one(&self.pool)
        .await?)
    }

    pub async fn recent_pulses(&self, employee_id: Uuid, limit: i64) -> AppResult<Vec<PulseResponse>> {
        Ok(sqlx::query_as::<_, PulseResponse>(
            "SELECT pulse_id, employee_id, score, comment, recorded_at \
             FROM pulse_responses WHERE employee_id = $1 \
             ORDER BY recorded_at DESC LIMIT $2",
        )
        .bind(employee_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn feedback_for(&self, employee_id: Uuid, limit: i64) -> AppResult<Vec<Feedback>> {
        Ok(sqlx::query_as::<_, Feedback>(
            "SELECT feedback_id, from_employee_id, to_employee_id, content, created_at \
             FROM feedback WHERE to_employee_id = $1 \
             ORDER BY created_at DESC LIMIT $2",
        )
        .bind(employee_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn kudos_for(&self, employee_id: Uuid, limit: i64) -> AppResult<Vec<Kudo>> {
        Ok(sqlx::query_as::<_, Kudo>(
            "SELECT kudo_id, from_employee_id, to_employee_id, category, message, created_at \
             FROM kudos WHERE to_employee_id = $1 \
             ORDER BY created_at DESC LIMIT $2",
        )
        .bind(employee_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }
}
