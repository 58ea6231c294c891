//! Manager Note Repository
//!
//! Private manager-authored notes. The ownership invariant lives here:
//! every read is filtered by author, so one manager's feed can never
//! surface another manager's notes regardless of who it is about.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::ManagerNote;

const NOTE_COLUMNS: &str = "note_id, author_id, employee_id, content, created_at, updated_at";

/// Repository for private manager notes
#[derive(Clone)]
pub struct NoteRepository {
    pool: PgPool,
}

impl NoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        author_id: Uuid,
        employee_id: Uuid,
        content: &str,
    ) -> AppResult<ManagerNote> {
        Ok(sqlx::query_as::<_, ManagerNote>(&format!(
            r#"
            INSERT INTO manager_notes (note_id, author_id, employee_id, content, created_at, updated_at)
            VALUES (gen_random_uuid(), $1, $2, $3, now(), now())
            RETURNING {NOTE_COLUMNS}
            "#
        ))
        .bind(author_id)
        .bind(employee_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?)
    }

    /// All notes written by this author, newest first
    pub async fn list_by_author(&self, author_id: Uuid) -> AppResult<Vec<ManagerNote>> {
        Ok(sqlx::query_as::<_, ManagerNote>(&format!(
            "SELECT {NOTE_COLUMNS} FROM manager_notes \
             WHERE author_id = $1 ORDER BY created_at DESC"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// This author's notes about one employee, newest first
    pub async fn list_for_employee(
        &self,
        author_id: Uuid,
        employee_id: Uuid,
    ) -> AppResult<Vec<ManagerNote>> {
        Ok(sqlx::query_as::<_, ManagerNote>(&format!(
            "SELECT {NOTE_COLUMNS} FROM manager_notes \
             WHERE author_id = $1 AND employee_id = $2 ORDER BY created_at DESC"
        ))
        .bind(author_id)
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
