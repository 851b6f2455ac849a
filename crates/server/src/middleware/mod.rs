use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use db::models::work_assignment::WorkAssignment;
use uuid::Uuid;

use crate::DeploymentImpl;

/// Loads the live assignment for `{id}` routes and hands it to the
/// handler as an `Extension<WorkAssignment>`.
pub async fn load_assignment_middleware(
    State(deployment): State<DeploymentImpl>,
    Path(id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let assignment = match WorkAssignment::find_by_uuid(&deployment.db().conn, id).await {
        Ok(Some(assignment)) => assignment,
        Ok(None) => {
            tracing::warn!("work assignment {} not found", id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(error) => {
            tracing::error!("failed to fetch work assignment {}: {}", id, error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    request.extensions_mut().insert(assignment);
    Ok(next.run(request).await)
}
