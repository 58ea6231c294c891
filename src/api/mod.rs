//! HTTP API
//!
//! Thin axum surface over the service layer. Acting identity arrives as an
//! explicit `actor_id` in the request body (authentication itself is the
//! identity collaborator's concern); the role is always resolved
//! server-side from the directory.
//!
//! Callers are expected to render `validation_error` responses inline near
//! the offending field and everything else as a dismissible banner.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;
use uuid::Uuid;

use edge_workflow::{
    Assessment, AssessmentState, CycleOutcome, ManagerReviewForm, NotificationIntent, ReviewCycle,
    Role, SelfAssessmentForm, StateTransition, StatusProjection, TransitionOutcome, WorkflowError,
};

use crate::error::AppError;
use crate::models::{Employee, ManagerNote, NewEmployeeFields};
use crate::services::{
    AdminService, AssessmentService, AssessmentSummary, CycleOverview, EngagementFeed,
    EngagementService, TeamDashboard,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub assessments: Arc<AssessmentService>,
    pub admin: Arc<AdminService>,
    pub engagement: Arc<EngagementService>,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        Self {
            assessments: Arc::new(AssessmentService::new(pool.clone())),
            admin: Arc::new(AdminService::new(pool.clone())),
            engagement: Arc::new(EngagementService::new(pool)),
        }
    }
}

/// Uniform response envelope
#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<T>>)>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse {
        success: true,
        data: Some(data),
        error: None,
        error_kind: None,
    }))
}

fn fail<T>(err: AppError) -> ApiResult<T> {
    warn!(kind = err.kind(), "request failed: {err}");
    Err((
        status_for(&err),
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind().to_string()),
        }),
    ))
}

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Workflow(w) => match w {
            WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkflowError::Forbidden { .. } => StatusCode::FORBIDDEN,
            WorkflowError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            WorkflowError::InvalidTransition { .. }
            | WorkflowError::Terminal(_)
            | WorkflowError::Conflict(_) => StatusCode::CONFLICT,
            WorkflowError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
        },
        AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        AppError::EmployeeNotFound(_) => StatusCode::NOT_FOUND,
        AppError::EmployeeInactive(_) | AppError::AccessDenied(_) => StatusCode::FORBIDDEN,
        AppError::ManagerCycle { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
    }
}

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        // Assessment workflow
        .route("/api/assessments/:id", get(get_assessment))
        .route("/api/assessments/:id/start", post(start_self_assessment))
        .route("/api/assessments/:id/draft", post(save_draft))
        .route("/api/assessments/:id/submit", post(submit_self_assessment))
        .route("/api/assessments/:id/review/start", post(start_manager_review))
        .route("/api/assessments/:id/review/submit", post(submit_manager_review))
        .route("/api/assessments/:id/revision", post(request_revision))
        .route("/api/assessments/:id/approve", post(approve_review))
        .route("/api/assessments/:id/acknowledge", post(acknowledge_review))
        .route("/api/assessments/:id/override", post(admin_override))
        // Directory
        .route("/api/employees", get(list_employees).post(create_employee))
        .route("/api/employees/:id/profile", post(update_profile))
        .route("/api/employees/:id/role", post(set_role))
        .route("/api/employees/:id/manager", post(assign_manager))
        .route("/api/employees/:id/deactivate", post(deactivate_employee))
        // Dashboards
        .route("/api/employees/:id/assessments", get(employee_dashboard))
        .route("/api/employees/:id/engagement", get(engagement_feed))
        .route("/api/managers/:id/team", get(team_dashboard))
        .route("/api/managers/:id/notes", get(notes_feed).post(add_note))
        .route("/api/managers/:id/notes/:employee_id", get(notes_for_employee))
        // Cycles
        .route("/api/cycles", post(create_cycle))
        .route("/api/cycles/:id/activate", post(activate_cycle))
        .route("/api/cycles/:id/close", post(close_cycle))
        .route("/api/cycles/:id/overview", get(cycle_overview))
        // Engagement
        .route("/api/pulse", post(record_pulse))
        .route("/api/feedback", post(record_feedback))
        .route("/api/kudos", post(record_kudo))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

// ── Request bodies ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ActorRequest {
    actor_id: Uuid,
}

#[derive(Deserialize)]
struct SelfAssessmentRequest {
    actor_id: Uuid,
    form: SelfAssessmentForm,
}

#[derive(Deserialize)]
struct ManagerReviewRequest {
    actor_id: Uuid,
    form: ManagerReviewForm,
}

#[derive(Deserialize)]
struct RevisionRequest {
    actor_id: Uuid,
    notes: String,
}

#[derive(Deserialize)]
struct ApprovalRequest {
    actor_id: Uuid,
    notes: Option<String>,
}

#[derive(Deserialize)]
struct OverrideRequest {
    actor_id: Uuid,
    to: AssessmentState,
    reason: String,
}

#[derive(Deserialize)]
struct CreateEmployeeRequest {
    actor_id: Uuid,
    #[serde(flatten)]
    fields: NewEmployeeFields,
}

#[derive(Deserialize)]
struct UpdateProfileRequest {
    actor_id: Uuid,
    name: String,
    job_title: Option<String>,
}

#[derive(Deserialize)]
struct SetRoleRequest {
    actor_id: Uuid,
    role: Role,
}

#[derive(Deserialize)]
struct AssignManagerRequest {
    actor_id: Uuid,
    manager_id: Option<Uuid>,
}

#[derive(Deserialize)]
struct CreateCycleRequest {
    actor_id: Uuid,
    name: String,
    starts_on: NaiveDate,
    ends_on: NaiveDate,
}

#[derive(Deserialize)]
struct NoteRequest {
    employee_id: Uuid,
    content: String,
}

#[derive(Deserialize)]
struct PulseRequest {
    employee_id: Uuid,
    score: i16,
    comment: Option<String>,
}

#[derive(Deserialize)]
struct FeedbackRequest {
    from_employee_id: Uuid,
    to_employee_id: Uuid,
    content: String,
}

#[derive(Deserialize)]
struct KudoRequest {
    from_employee_id: Uuid,
    to_employee_id: Uuid,
    category: Option<String>,
    message: String,
}

// ── Response views ───────────────────────────────────────────────────────

/// Full assessment view with legacy status projection
#[derive(Serialize)]
struct AssessmentView {
    assessment_id: Uuid,
    cycle_id: Uuid,
    employee_id: Uuid,
    manager_id: Option<Uuid>,
    state: AssessmentState,
    status: StatusProjection,
    self_assessment: Option<SelfAssessmentForm>,
    manager_review: Option<ManagerReviewForm>,
    admin_notes: Option<String>,
    due_date: Option<NaiveDate>,
    acknowledged_at: Option<DateTime<Utc>>,
    history: Vec<StateTransition>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Assessment> for AssessmentView {
    fn from(a: Assessment) -> Self {
        let status = a.status_projection();
        Self {
            assessment_id: a.id,
            cycle_id: a.cycle_id,
            employee_id: a.employee_id,
            manager_id: a.manager_id,
            state: a.state,
            status,
            self_assessment: a.self_assessment,
            manager_review: a.manager_review,
            admin_notes: a.admin_notes,
            due_date: a.due_date,
            acknowledged_at: a.acknowledged_at,
            history: a.history,
            version: a.version,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Serialize)]
struct TransitionResponse {
    assessment: AssessmentView,
    notifications: Vec<NotificationIntent>,
}

impl From<TransitionOutcome> for TransitionResponse {
    fn from(outcome: TransitionOutcome) -> Self {
        Self {
            assessment: outcome.assessment.into(),
            notifications: outcome.notifications,
        }
    }
}

#[derive(Serialize)]
struct CycleResponse {
    cycle: ReviewCycle,
    created: u64,
    notifications: Vec<NotificationIntent>,
}

impl From<CycleOutcome> for CycleResponse {
    fn from(outcome: CycleOutcome) -> Self {
        Self {
            cycle: outcome.cycle,
            created: outcome.created,
            notifications: outcome.notifications,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn health_check() -> Json<ApiResponse<String>> {
    Json(ApiResponse {
        success: true,
        data: Some("OK".to_string()),
        error: None,
        error_kind: None,
    })
}

async fn get_assessment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<AssessmentView> {
    match state.assessments.get_assessment(id).await {
        Ok(a) => ok(a.into()),
        Err(e) => fail(e),
    }
}

async fn start_self_assessment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActorRequest>,
) -> ApiResult<TransitionResponse> {
    match state.assessments.start_self_assessment(id, req.actor_id).await {
        Ok(outcome) => ok(outcome.into()),
        Err(e) => fail(e),
    }
}

async fn save_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelfAssessmentRequest>,
) -> ApiResult<TransitionResponse> {
    match state
        .assessments
        .save_self_assessment_draft(id, req.actor_id, req.form)
        .await
    {
        Ok(outcome) => ok(outcome.into()),
        Err(e) => fail(e),
    }
}

async fn submit_self_assessment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelfAssessmentRequest>,
) -> ApiResult<TransitionResponse> {
    match state
        .assessments
        .submit_self_assessment(id, req.actor_id, req.form)
        .await
    {
        Ok(outcome) => ok(outcome.into()),
        Err(e) => fail(e),
    }
}

async fn start_manager_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActorRequest>,
) -> ApiResult<TransitionResponse> {
    match state.assessments.start_manager_review(id, req.actor_id).await {
        Ok(outcome) => ok(outcome.into()),
        Err(e) => fail(e),
    }
}

async fn submit_manager_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ManagerReviewRequest>,
) -> ApiResult<TransitionResponse> {
    match state
        .assessments
        .submit_manager_review(id, req.actor_id, req.form)
        .await
    {
        Ok(outcome) => ok(outcome.into()),
        Err(e) => fail(e),
    }
}

async fn request_revision(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RevisionRequest>,
) -> ApiResult<TransitionResponse> {
    match state
        .assessments
        .request_revision(id, req.actor_id, &req.notes)
        .await
    {
        Ok(outcome) => ok(outcome.into()),
        Err(e) => fail(e),
    }
}

async fn approve_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ApprovalRequest>,
) -> ApiResult<TransitionResponse> {
    match state
        .assessments
        .approve_review(id, req.actor_id, req.notes.as_deref())
        .await
    {
        Ok(outcome) => ok(outcome.into()),
        Err(e) => fail(e),
    }
}

async fn acknowledge_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActorRequest>,
) -> ApiResult<TransitionResponse> {
    match state.assessments.acknowledge_review(id, req.actor_id).await {
        Ok(outcome) => ok(outcome.into()),
        Err(e) => fail(e),
    }
}

async fn admin_override(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<OverrideRequest>,
) -> ApiResult<TransitionResponse> {
    match state
        .assessments
        .admin_override_state(id, req.actor_id, req.to, &req.reason)
        .await
    {
        Ok(outcome) => ok(outcome.into()),
        Err(e) => fail(e),
    }
}

async fn list_employees(State(state): State<AppState>) -> ApiResult<Vec<Employee>> {
    match state.admin.list_employees().await {
        Ok(employees) => ok(employees),
        Err(e) => fail(e),
    }
}

async fn create_employee(
    State(state): State<AppState>,
    Json(req): Json<CreateEmployeeRequest>,
) -> ApiResult<Employee> {
    match state.admin.create_employee(req.actor_id, req.fields).await {
        Ok(employee) => ok(employee),
        Err(e) => fail(e),
    }
}

async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Employee> {
    match state
        .admin
        .update_profile(req.actor_id, id, &req.name, req.job_title.as_deref())
        .await
    {
        Ok(employee) => ok(employee),
        Err(e) => fail(e),
    }
}

async fn set_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetRoleRequest>,
) -> ApiResult<Employee> {
    match state.admin.set_role(req.actor_id, id, req.role).await {
        Ok(employee) => ok(employee),
        Err(e) => fail(e),
    }
}

async fn assign_manager(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignManagerRequest>,
) -> ApiResult<Employee> {
    match state
        .admin
        .assign_manager(req.actor_id, id, req.manager_id)
        .await
    {
        Ok(employee) => ok(employee),
        Err(e) => fail(e),
    }
}

async fn deactivate_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActorRequest>,
) -> ApiResult<Employee> {
    match state.admin.deactivate_employee(req.actor_id, id).await {
        Ok(employee) => ok(employee),
        Err(e) => fail(e),
    }
}

async fn employee_dashboard(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<AssessmentSummary>> {
    match state.assessments.employee_dashboard(id).await {
        Ok(summaries) => ok(summaries),
        Err(e) => fail(e),
    }
}

async fn team_dashboard(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<TeamDashboard> {
    match state.assessments.team_dashboard(id).await {
        Ok(dashboard) => ok(dashboard),
        Err(e) => fail(e),
    }
}

async fn engagement_feed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<EngagementFeed> {
    match state.engagement.engagement_feed(id).await {
        Ok(feed) => ok(feed),
        Err(e) => fail(e),
    }
}

async fn notes_feed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<ManagerNote>> {
    match state.engagement.notes_feed(id).await {
        Ok(notes) => ok(notes),
        Err(e) => fail(e),
    }
}

async fn add_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<NoteRequest>,
) -> ApiResult<ManagerNote> {
    match state
        .engagement
        .add_manager_note(id, req.employee_id, &req.content)
        .await
    {
        Ok(note) => ok(note),
        Err(e) => fail(e),
    }
}

async fn notes_for_employee(
    State(state): State<AppState>,
    Path((id, employee_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Vec<ManagerNote>> {
    match state.engagement.notes_for_employee(id, employee_id).await {
        Ok(notes) => ok(notes),
        Err(e) => fail(e),
    }
}

async fn create_cycle(
    State(state): State<AppState>,
    Json(req): Json<CreateCycleRequest>,
) -> ApiResult<ReviewCycle> {
    match state
        .admin
        .create_cycle(req.actor_id, &req.name, req.starts_on, req.ends_on)
        .await
    {
        Ok(cycle) => ok(cycle),
        Err(e) => fail(e),
    }
}

async fn activate_cycle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActorRequest>,
) -> ApiResult<CycleResponse> {
    match state.admin.activate_cycle(req.actor_id, id).await {
        Ok(outcome) => ok(outcome.into()),
        Err(e) => fail(e),
    }
}

async fn close_cycle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActorRequest>,
) -> ApiResult<CycleResponse> {
    match state.admin.close_cycle(req.actor_id, id).await {
        Ok(outcome) => ok(outcome.into()),
        Err(e) => fail(e),
    }
}

async fn cycle_overview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<CycleOverview> {
    match state.admin.cycle_overview(id).await {
        Ok(overview) => ok(overview),
        Err(e) => fail(e),
    }
}

async fn record_pulse(
    State(state): State<AppState>,
    Json(req): Json<PulseRequest>,
) -> ApiResult<crate::models::PulseResponse> {
    match state
        .engagement
        .record_pulse(req.employee_id, req.score, req.comment.as_deref())
        .await
    {
        Ok(pulse) => ok(pulse),
        Err(e) => fail(e),
    }
}

async fn record_feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> ApiResult<crate::models::Feedback> {
    match state
        .engagement
        .record_feedback(req.from_employee_id, req.to_employee_id, &req.content)
        .await
    {
        Ok(feedback) => ok(feedback),
        Err(e) => fail(e),
    }
}

async fn record_kudo(
    State(state): State<AppState>,
    Json(req): Json<KudoRequest>,
) -> ApiResult<crate::models::Kudo> {
    match state
        .engagement
        .record_kudo(
            req.from_employee_id,
            req.to_employee_id,
            req.category.as_deref(),
            &req.message,
        )
        .await
    {
        Ok(kudo) => ok(kudo),
        Err(e) => fail(e),
    }
}
