use axum::{Router, middleware::from_fn, routing::get};

use crate::{DeploymentImpl, routes};

pub mod auth;

pub fn router(deployment: DeploymentImpl) -> Router {
    let api_routes = Router::new()
        .merge(routes::assignments::router(&deployment))
        .layer(from_fn(auth::require_user));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .with_state(deployment)
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, time::Duration};

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    };
    use chrono::Utc;
    use db::entities::{client, employee};
    use sea_orm::{ActiveModelTrait, Set};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::DeploymentImpl;

    struct TestServer {
        app: Router,
        db_path: PathBuf,
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.db_path);
            let _ = std::fs::remove_file(self.db_path.with_extension("sqlite-wal"));
            let _ = std::fs::remove_file(self.db_path.with_extension("sqlite-shm"));
        }
    }

    async fn setup() -> TestServer {
        let db_path =
            std::env::temp_dir().join(format!("assignments-http-{}.sqlite", Uuid::new_v4()));
        let db_url = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());
        let deployment = DeploymentImpl::new(&db_url).await.unwrap();

        let now = Utc::now();
        client::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            build: Set("B0101".to_string()),
            company_name: Set("Alpha Trading Co.".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(&deployment.db().conn)
        .await
        .unwrap();
        client::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            build: Set("B0202".to_string()),
            company_name: Set("Beta Logistics Ltd.".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(&deployment.db().conn)
        .await
        .unwrap();
        for (id, name) in [("E001", "Somchai Jaidee"), ("E002", "Malee Suksawat")] {
            employee::ActiveModel {
                uuid: Set(Uuid::new_v4()),
                employee_id: Set(id.to_string()),
                full_name: Set(name.to_string()),
                nick_name: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&deployment.db().conn)
            .await
            .unwrap();
        }

        TestServer {
            app: super::router(deployment),
            db_path,
        }
    }

    fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-user-id", Uuid::new_v4().to_string())
            .header(header::CONTENT_TYPE, "application/json");
        match body {
            Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn create_payload(build: &str, month: i32) -> Value {
        json!({
            "build": build,
            "assignment_year": 2025,
            "assignment_month": month,
            "roles": {
                "accounting": "E001",
                "tax_inspection": "E002",
                "wht_filer": "E001",
                "vat_filer": null,
                "document_entry": "E002"
            },
            "assignment_note": null
        })
    }

    #[tokio::test]
    async fn health_is_public() {
        let server = setup().await;
        let response = server
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn api_requires_user_header() {
        let server = setup().await;
        let response = server
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/work-assignments")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(create_payload("B0101", 7).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_then_fetch_round_trip() {
        let server = setup().await;

        let response = server
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/work-assignments",
                Some(create_payload("B0101", 7)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(
            body["data"]["assignment"]["is_reset_completed"],
            json!(true)
        );
        let id = body["data"]["assignment"]["id"].as_str().unwrap().to_string();

        let response = server
            .app
            .clone()
            .oneshot(request(
                Method::GET,
                "/api/work-assignments/B0101/2025/7",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["build"], json!("B0101"));

        let response = server
            .app
            .clone()
            .oneshot(request(
                Method::GET,
                &format!("/api/work-assignments/by-id/{}", id),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = server
            .app
            .clone()
            .oneshot(request(
                Method::GET,
                "/api/work-assignments/B0101/2025/8",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let server = setup().await;
        for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
            let response = server
                .app
                .clone()
                .oneshot(request(
                    Method::POST,
                    "/api/work-assignments",
                    Some(create_payload("B0101", 7)),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), expected);
        }
    }

    #[tokio::test]
    async fn validation_failures_are_bad_requests() {
        let server = setup().await;

        let response = server
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/work-assignments",
                Some(create_payload("B0101", 13)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = server
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/work-assignments",
                Some(create_payload("B9999", 7)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
        assert!(body["message"].as_str().unwrap().contains("B9999"));
    }

    #[tokio::test]
    async fn change_responsible_round_trip_and_history() {
        let server = setup().await;
        let response = server
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/work-assignments",
                Some(create_payload("B0101", 7)),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        let id = body["data"]["assignment"]["id"].as_str().unwrap().to_string();

        let response = server
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/work-assignments/{}/change-responsible", id),
                Some(json!({
                    "role_type": "accounting",
                    "new_employee_id": "E002",
                    "change_reason": "Handover"
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["previous_employee_id"], json!("E001"));
        assert_eq!(body["data"]["new_employee_id"], json!("E002"));

        // Same change again is a no-op rejection.
        let response = server
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/work-assignments/{}/change-responsible", id),
                Some(json!({
                    "role_type": "accounting",
                    "new_employee_id": "E002",
                    "change_reason": null
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Unknown role names never reach the workflow.
        let response = server
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/work-assignments/{}/change-responsible", id),
                Some(json!({
                    "role_type": "payroll",
                    "new_employee_id": "E001",
                    "change_reason": null
                })),
            ))
            .await
            .unwrap();
        assert!(response.status().is_client_error());

        let response = server
            .app
            .clone()
            .oneshot(request(
                Method::GET,
                &format!("/api/work-assignments/{}/change-history", id),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let history = body["data"].as_array().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["role_type"], json!("accounting"));
        assert_eq!(history[0]["new_employee_id"], json!("E002"));
    }

    #[tokio::test]
    async fn delete_then_fetch_is_not_found() {
        let server = setup().await;
        let response = server
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/work-assignments",
                Some(create_payload("B0101", 7)),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        let id = body["data"]["assignment"]["id"].as_str().unwrap().to_string();

        let response = server
            .app
            .clone()
            .oneshot(request(
                Method::DELETE,
                &format!("/api/work-assignments/{}", id),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = server
            .app
            .clone()
            .oneshot(request(
                Method::GET,
                &format!("/api/work-assignments/by-id/{}", id),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bulk_create_accepts_and_job_is_pollable() {
        let server = setup().await;

        let response = server
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/work-assignments/bulk-create",
                Some(json!({
                    "assignments": [
                        create_payload("B0101", 7),
                        create_payload("B0202", 7),
                        create_payload("B9999", 7),
                    ]
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        let job_id = body["data"]["job_id"].as_str().unwrap().to_string();

        let snapshot = loop {
            let response = server
                .app
                .clone()
                .oneshot(request(
                    Method::GET,
                    &format!("/api/work-assignments/bulk-create/{}", job_id),
                    None,
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = body_json(response).await;
            let status = body["data"]["status"].as_str().unwrap().to_string();
            if status == "completed" || status == "failed" {
                break body;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        };

        assert_eq!(snapshot["data"]["status"], json!("completed"));
        assert_eq!(snapshot["data"]["result"]["success"], json!(2));
        assert_eq!(snapshot["data"]["result"]["failed"], json!(1));
        assert_eq!(
            snapshot["data"]["result"]["errors"][0]["build"],
            json!("B9999")
        );

        let response = server
            .app
            .clone()
            .oneshot(request(
                Method::GET,
                &format!("/api/work-assignments/bulk-create/{}", Uuid::new_v4()),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_bulk_request_is_rejected() {
        let server = setup().await;
        let response = server
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/work-assignments/bulk-create",
                Some(json!({ "assignments": [] })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn manual_reset_repairs_monthly_data() {
        let server = setup().await;
        let response = server
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/work-assignments",
                Some(create_payload("B0101", 7)),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        let id = body["data"]["assignment"]["id"].as_str().unwrap().to_string();

        let response = server
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/work-assignments/{}/reset-data", id),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["is_reset_completed"], json!(true));
        assert!(body["data"]["reset_completed_at"].is_string());
    }
}
