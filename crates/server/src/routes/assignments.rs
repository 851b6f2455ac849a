use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::work_assignment::{CreateWorkAssignment, UpdateWorkAssignment, WorkAssignment};
use serde::{Deserialize, Serialize};
use services::services::{
    assignment::{
        AssignmentOutcome, ChangeHistoryEntry, ChangeOutcome, ChangeResponsibleRequest,
    },
    job_queue::JobSnapshot,
};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl, error::ApiError, http::auth::ActingUser,
    middleware::load_assignment_middleware,
};

#[derive(Debug, Deserialize, TS)]
pub struct BulkCreateRequest {
    pub assignments: Vec<CreateWorkAssignment>,
}

#[derive(Debug, Serialize, TS)]
pub struct BulkCreateStarted {
    pub job_id: String,
}

pub async fn get_assignment_by_key(
    State(deployment): State<DeploymentImpl>,
    Path((build, year, month)): Path<(String, i32, i32)>,
) -> Result<ResponseJson<ApiResponse<WorkAssignment>>, ApiError> {
    let assignment = deployment
        .assignments()
        .get_by_key(&build, year, month)
        .await?;
    Ok(ResponseJson(ApiResponse::success(assignment)))
}

pub async fn get_assignment_by_id(
    State(deployment): State<DeploymentImpl>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<WorkAssignment>>, ApiError> {
    let assignment = deployment.assignments().get_by_id(id).await?;
    Ok(ResponseJson(ApiResponse::success(assignment)))
}

pub async fn create_assignment(
    State(deployment): State<DeploymentImpl>,
    Extension(ActingUser(acting_user)): Extension<ActingUser>,
    Json(payload): Json<CreateWorkAssignment>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<AssignmentOutcome>>), ApiError> {
    let outcome = deployment.assignments().create(payload, acting_user).await?;
    let response = match &outcome.reset_error {
        Some(_) => ApiResponse::success_with_message(
            outcome,
            "Assignment created; monthly data reset failed and can be repaired via reset-data",
        ),
        None => ApiResponse::success(outcome),
    };
    Ok((StatusCode::CREATED, ResponseJson(response)))
}

pub async fn update_assignment(
    State(deployment): State<DeploymentImpl>,
    Extension(assignment): Extension<WorkAssignment>,
    Json(payload): Json<UpdateWorkAssignment>,
) -> Result<ResponseJson<ApiResponse<AssignmentOutcome>>, ApiError> {
    let outcome = deployment
        .assignments()
        .update(assignment.id, payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(outcome)))
}

pub async fn delete_assignment(
    State(deployment): State<DeploymentImpl>,
    Extension(assignment): Extension<WorkAssignment>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    deployment.assignments().delete(assignment.id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn reset_assignment_data(
    State(deployment): State<DeploymentImpl>,
    Extension(assignment): Extension<WorkAssignment>,
) -> Result<ResponseJson<ApiResponse<WorkAssignment>>, ApiError> {
    let assignment = deployment.assignments().reset_data(assignment.id).await?;
    Ok(ResponseJson(ApiResponse::success(assignment)))
}

pub async fn change_responsible(
    State(deployment): State<DeploymentImpl>,
    Extension(assignment): Extension<WorkAssignment>,
    Extension(ActingUser(acting_user)): Extension<ActingUser>,
    Json(payload): Json<ChangeResponsibleRequest>,
) -> Result<ResponseJson<ApiResponse<ChangeOutcome>>, ApiError> {
    let outcome = deployment
        .assignments()
        .change_responsible(assignment.id, payload, acting_user)
        .await?;
    Ok(ResponseJson(ApiResponse::success(outcome)))
}

pub async fn get_change_history(
    State(deployment): State<DeploymentImpl>,
    Extension(assignment): Extension<WorkAssignment>,
) -> Result<ResponseJson<ApiResponse<Vec<ChangeHistoryEntry>>>, ApiError> {
    let history = deployment.assignments().change_history(assignment.id).await?;
    Ok(ResponseJson(ApiResponse::success(history)))
}

pub async fn bulk_create(
    State(deployment): State<DeploymentImpl>,
    Extension(ActingUser(acting_user)): Extension<ActingUser>,
    Json(payload): Json<BulkCreateRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<BulkCreateStarted>>), ApiError> {
    let job_id = deployment.assignments().enqueue_bulk_create(
        deployment.job_queue(),
        payload.assignments,
        acting_user,
    )?;
    Ok((
        StatusCode::ACCEPTED,
        ResponseJson(ApiResponse::success(BulkCreateStarted { job_id })),
    ))
}

pub async fn get_bulk_job(
    State(deployment): State<DeploymentImpl>,
    Path(job_id): Path<String>,
) -> Result<ResponseJson<ApiResponse<JobSnapshot>>, ApiError> {
    let snapshot = deployment
        .job_queue()
        .get_job(&job_id)
        .ok_or_else(|| ApiError::NotFound(format!("Job {} not found", job_id)))?;
    Ok(ResponseJson(ApiResponse::success(snapshot)))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let assignment_id_router = Router::new()
        .route("/", put(update_assignment).delete(delete_assignment))
        .route("/reset-data", post(reset_assignment_data))
        .route("/change-responsible", post(change_responsible))
        .route("/change-history", get(get_change_history))
        .layer(from_fn_with_state(
            deployment.clone(),
            load_assignment_middleware,
        ));

    Router::new()
        .route("/work-assignments", post(create_assignment))
        .route("/work-assignments/bulk-create", post(bulk_create))
        .route("/work-assignments/bulk-create/{job_id}", get(get_bulk_job))
        .route("/work-assignments/by-id/{id}", get(get_assignment_by_id))
        .route(
            "/work-assignments/{id}/{year}/{month}",
            get(get_assignment_by_key),
        )
        .nest("/work-assignments/{id}", assignment_id_router)
}
