use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

use crate::error::ApiError;

/// Identity of the staff member behind the request. The gateway in
/// front of this service authenticates users and stamps the
/// `X-User-Id` header; we only parse it.
#[derive(Debug, Clone, Copy)]
pub struct ActingUser(pub Uuid);

pub async fn require_user(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .headers()
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .ok_or(ApiError::Unauthorized)?;
    request.extensions_mut().insert(ActingUser(user));
    Ok(next.run(request).await)
}
