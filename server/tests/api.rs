use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use platform_authn::{AuthConfig, issue_token};
use platform_authz::Role;
use platform_db::{DatabaseSettings, connect};
use products_hr::HrSettings;
use serde_json::{Value, json};
use server::{AppConfig, AppState, build_router};
use tower::ServiceExt;

const SECRET: &str = "test-secret-0123456789";

struct TestApp {
    router: Router,
    auth: AuthConfig,
}

impl TestApp {
    async fn new(page_size: u64) -> Self {
        let pool = connect(&DatabaseSettings::new("sqlite::memory:"))
            .await
            .unwrap();
        Migrator::up(&pool, None).await.unwrap();
        let auth = AuthConfig::new(SECRET, 60).unwrap();
        let config = AppConfig {
            auth: auth.clone(),
            hr: HrSettings {
                page_size,
                ..HrSettings::default()
            },
            cors_allowed_origins: Vec::new(),
        };
        let router = build_router(AppState::new(pool, Arc::new(config)));
        Self { router, auth }
    }

    fn token(&self, role: Role) -> String {
        issue_token("tester", &[role], &self.auth).unwrap()
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let token = self.token(Role::Admin);
        self.send(method, uri, Some(&token), body).await
    }

    async fn create_department(&self, name: &str) -> String {
        let (status, body) = self
            .admin(Method::POST, "/api/department", Some(json!({"name": name})))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_owned()
    }

    async fn create_employee(&self, surname: &str, salary: &str, department: Option<&str>) -> Value {
        let (status, body) = self
            .admin(
                Method::POST,
                "/api/employee",
                Some(json!({
                    "name": "Test",
                    "surname": surname,
                    "position": "Engineer",
                    "salary": salary,
                    "age": 30,
                    "department": department,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

#[tokio::test]
async fn health_reports_database() {
    let app = TestApp::new(10).await;
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["db_ok"], true);
}

#[tokio::test]
async fn departments_are_public_to_read() {
    let app = TestApp::new(10).await;
    app.create_department("Engineering").await;

    let (status, body) = app.send(Method::GET, "/api/department", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Engineering");
    assert_eq!(body[0]["num_employees"], 0);
    assert_eq!(body[0]["total_salary"], "0.00");
    assert_eq!(body[0]["director"], Value::Null);
}

#[tokio::test]
async fn employees_require_authentication_to_read() {
    let app = TestApp::new(10).await;
    let (status, body) = app.send(Method::GET, "/api/employee", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let staff = app.token(Role::Staff);
    let (status, body) = app
        .send(Method::GET, "/api/employee", Some(&staff), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn writes_require_admin() {
    let app = TestApp::new(10).await;
    let payload = json!({"name": "Finance"});

    let (status, _) = app
        .send(Method::POST, "/api/department", None, Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let staff = app.token(Role::Staff);
    let (status, body) = app
        .send(Method::POST, "/api/department", Some(&staff), Some(payload))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn invalid_token_is_rejected_even_on_public_routes() {
    let app = TestApp::new(10).await;
    let (status, _) = app
        .send(Method::GET, "/api/department", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn creating_employee_in_unknown_department_is_not_found() {
    let app = TestApp::new(10).await;
    let (status, body) = app
        .admin(
            Method::POST,
            "/api/employee",
            Some(json!({
                "name": "Ivan",
                "surname": "Petrov",
                "position": "Engineer",
                "salary": "100.00",
                "age": 30,
                "department": "00000000-0000-4000-8000-000000000000",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

    let (_, body) = app.admin(Method::GET, "/api/employee", None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn missing_fields_are_reported_per_field() {
    let app = TestApp::new(10).await;
    let (status, body) = app
        .admin(Method::POST, "/api/employee", Some(json!({"name": "Ivan"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
    assert_eq!(body["errors"]["position"], json!(["This field is required."]));
    assert!(body["errors"]["salary"].is_array());
    assert!(body["errors"]["age"].is_array());
}

#[tokio::test]
async fn wrongly_typed_fields_are_reported_per_field() {
    let app = TestApp::new(10).await;
    let (status, body) = app
        .admin(
            Method::POST,
            "/api/employee",
            Some(json!({
                "name": "Ivan",
                "surname": "Petrov",
                "position": "Engineer",
                "salary": "abc",
                "age": "thirty",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
    assert_eq!(body["errors"]["salary"], json!(["A valid number is required."]));
    assert_eq!(body["errors"]["age"], json!(["A valid integer is required."]));
    assert!(body["errors"].get("position").is_none());

    let eng = app.create_department("Engineering").await;
    let (status, body) = app
        .admin(
            Method::PATCH,
            &format!("/api/department/{eng}"),
            Some(json!({"director": 12})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["errors"]["director"],
        json!(["Incorrect type. Expected pk value, received number."])
    );
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new(10).await;
    let token = app.token(Role::Admin);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/department")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn department_view_aggregates_and_nests_director() {
    let app = TestApp::new(10).await;
    let eng = app.create_department("Engineering").await;
    let head = app.create_employee("Ivanova", "4000.00", Some(&eng)).await;
    app.create_employee("Petrov", "2500.50", Some(&eng)).await;

    let (status, body) = app
        .admin(
            Method::PATCH,
            &format!("/api/department/{eng}"),
            Some(json!({"director": head["id"]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["num_employees"], 2);
    assert_eq!(body["total_salary"], "6500.50");
    assert_eq!(body["director"]["surname"], "Ivanova");
    assert_eq!(body["director"]["department"], "Engineering");
    let members = body["employees"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["surname"], "Petrov");
}

#[tokio::test]
async fn employee_list_filters_and_paginates() {
    let app = TestApp::new(2).await;
    let eng = app.create_department("R&D").await;
    for surname in ["Ivanov", "Ivanenko", "Petrov"] {
        app.create_employee(surname, "100", Some(&eng)).await;
    }
    app.create_employee("Ivashov", "100", None).await;

    let (status, body) = app
        .admin(Method::GET, "/api/employee?department=R%26D&surname=IVA", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["next"], Value::Null);
    let surnames: Vec<_> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["surname"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(surnames, ["Ivanenko", "Ivanov"]);
    assert_eq!(body["results"][0]["department"], "R&D");

    let (_, body) = app
        .admin(Method::GET, "/api/employee?surname=iva", None)
        .await;
    assert_eq!(body["count"], 3);
    assert_eq!(body["next"], "/api/employee?surname=iva&page=2");
    assert_eq!(body["previous"], Value::Null);

    let (_, body) = app
        .admin(Method::GET, "/api/employee?surname=iva&page=2", None)
        .await;
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["previous"], "/api/employee?surname=iva&page=1");

    let (status, body) = app
        .admin(Method::GET, "/api/employee?page=9", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn deleting_department_keeps_employees() {
    let app = TestApp::new(10).await;
    let eng = app.create_department("Engineering").await;
    let ivan = app.create_employee("Petrov", "100", Some(&eng)).await;

    let (status, _) = app
        .admin(Method::DELETE, &format!("/api/department/{eng}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let id = ivan["id"].as_str().unwrap();
    let (status, body) = app
        .admin(Method::GET, &format!("/api/employee/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["department"], Value::Null);
}

#[tokio::test]
async fn unknown_or_malformed_ids_are_not_found() {
    let app = TestApp::new(10).await;
    let (status, _) = app
        .admin(
            Method::GET,
            "/api/employee/00000000-0000-4000-8000-000000000000",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.admin(Method::GET, "/api/employee/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::new(10).await;
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
