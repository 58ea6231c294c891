//! Employee Directory Repository
//!
//! CRUD for the identity directory. Employees are soft-deactivated rather
//! than destroyed; role and manager links are only mutated through the
//! admin service. Manager assignment walks the reporting chain and rejects
//! anything that would close a cycle in the tree.

use std::collections::HashSet;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use edge_workflow::Role;

use crate::error::{AppError, AppResult};
use crate::models::{Employee, NewEmployeeFields};

const EMPLOYEE_COLUMNS: &str =
    "employee_id, name, email, job_title, role, manager_id, active, created_at, updated_at";

/// Repository for employee directory operations
#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, employee_id: Uuid) -> AppResult<Employee> {
        sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_id = $1"
        ))
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::EmployeeNotFound(employee_id))
    }

    pub async fn list_active(&self) -> AppResult<Vec<Employee>> {
        Ok(sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE active ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn create(&self, fields: &NewEmployeeFields) -> AppResult<Employee> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            INSERT INTO employees (employee_id, name, email, job_title, role, manager_id, active, created_at, updated_at)
            VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, true, now(), now())
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.job_title)
        .bind(fields.role)
        .bind(fields.manager_id)
        .fetch_one(&self.pool)
        .await?;

        info!(employee = %employee.employee_id, "employee created");
        Ok(employee)
    }

    pub async fn update_profile(
        &self,
        employee_id: Uuid,
        name: &str,
        job_title: Option<&str>,
    ) -> AppResult<Employee> {
        sqlx::query_as::<_, Employee>(&format!(
            r#"
            UPDATE employees SET name = $2, job_title = $3, updated_at = now()
            WHERE employee_id = $1
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(employee_id)
        .bind(name)
        .bind(job_title)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::EmployeeNotFound(employee_id))
    }

    pub async fn set_role(&self, employee_id: Uuid, role: Role) -> AppResult<Employee> {
        sqlx::query_as::<_, Employee>(&format!(
            r#"
            UPDATE employees SET role = $2, updated_at = now()
            WHERE employee_id = $1
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(employee_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::EmployeeNotFound(employee_id))
    }

    /// Re-point an employee's manager link. Rejects assignments whose
    /// reporting chain would lead back to the employee.
    pub async fn assign_manager(
        &self,
        employee_id: Uuid,
        manager_id: Option<Uuid>,
    ) -> AppResult<Employee> {
        if let Some(manager_id) = manager_id {
            if self.would_create_cycle(employee_id, manager_id).await? {
                return Err(AppError::ManagerCycle {
                    employee_id,
                    manager_id,
                });
            }
        }

        sqlx::query_as::<_, Employee>(&format!(
            r#"
            UPDATE employees SET manager_id = $2, updated_at = now()
            WHERE employee_id = $1
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(employee_id)
        .bind(manager_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::EmployeeNotFound(employee_id))
    }

    /// Soft-delete: the record stays for reporting, the employee drops out
    /// of cycle activation and dashboards
    pub async fn deactivate(&self, employee_id: Uuid) -> AppResult<Employee> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            UPDATE employees SET active = false, updated_at = now()
            WHERE employee_id = $1
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::EmployeeNotFound(employee_id))?;

        info!(employee = %employee_id, "employee deactivated");
        Ok(employee)
    }

    /// Walk the manager chain upward from `candidate_manager`; a path that
    /// reaches `employee_id` (or revisits any node) means the assignment
    /// would close a loop in the reporting tree.
    async fn would_create_cycle(
        &self,
        employee_id: Uuid,
        candidate_manager: Uuid,
    ) -> AppResult<bool> {
        if candidate_manager == employee_id {
            return Ok(true);
        }

        let mut seen = HashSet::new();
        let mut current = Some(candidate_manager);
        while let Some(id) = current {
            if id == employee_id {
                return Ok(true);
            }
            if !seen.insert(id) {
                return Ok(true);
            }
            current = sqlx::query_scalar::<_, Option<Uuid>>(
                "SELECT manager_id FROM employees WHERE employee_id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .flatten();
        }
        Ok(false)
    }
}
