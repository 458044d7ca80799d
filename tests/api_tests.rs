/// Router-level tests: every request goes through the full axum stack against
/// a database in a temp directory.
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Days;
use schoolbooks::app;
use schoolbooks::db::Database;
use schoolbooks::handler::{AppState, today};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    app: Router,
    _dir: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db = Database::open_local(&dir.path().join("api.db")).await.unwrap();
        let app = app(AppState::new(Arc::new(db), 15));
        TestApp { app, _dir: dir }
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        match body {
            Some(body) => {
                self.send_raw(method, uri, Some("application/json"), body.to_string())
                    .await
            }
            None => self.send_raw(method, uri, None, String::new()).await,
        }
    }

    async fn send_raw(
        &self,
        method: &str,
        uri: &str,
        content_type: Option<&str>,
        body: String,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        let request = builder.body(Body::from(body)).unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn create(&self, uri: &str, body: Value) -> Value {
        let (status, json) = self.send("POST", uri, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "POST {uri} answered {json}");
        json["data"].clone()
    }
}

fn days_ago(days: u64) -> String {
    today().checked_sub_days(Days::new(days)).unwrap().format("%Y-%m-%d").to_string()
}

async fn student_and_book(app: &TestApp, quantity: i32) -> (i64, i64) {
    let student = app
        .create(
            "/students",
            json!({"name": "Ana Silva", "registration": "2024001", "class": "6º Ano A"}),
        )
        .await;
    let book = app
        .create(
            "/books",
            json!({"title": "Matemática - 6º Ano", "subject": "Matemática", "quantity": quantity}),
        )
        .await;
    (student["id"].as_i64().unwrap(), book["id"].as_i64().unwrap())
}

#[tokio::test]
async fn test_healthcheck_and_local_sync() {
    let app = TestApp::new().await;

    let (status, json) = app.send("GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": "ok"}));

    let (status, json) = app.send("POST", "/sync", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "local");
}

#[tokio::test]
async fn test_student_crud_over_http() {
    let app = TestApp::new().await;

    let student = app
        .create(
            "/students",
            json!({"name": "João Oliveira", "registration": "2024002", "class": "7º Ano A"}),
        )
        .await;
    let id = student["id"].as_i64().unwrap();
    assert_eq!(student["class"], "7º Ano A");

    let (status, json) = app.send("GET", "/students", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["data"][0]["name"], "João Oliveira");

    let (status, json) = app
        .send("PUT", &format!("/students/{id}"), Some(json!({"class": "7º Ano B"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["class"], "7º Ano B");
    assert_eq!(json["data"]["registration"], "2024002");

    let (status, _) = app.send("DELETE", &format!("/students/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, json) = app.send("GET", &format!("/students/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Student not found");
}

#[tokio::test]
async fn test_validation_errors_list_every_field() {
    let app = TestApp::new().await;

    let (status, json) = app.send("POST", "/books", Some(json!({"author": "Ana Costa"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Validation failed");
    let fields: Vec<_> = json["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(fields, vec!["title", "subject", "quantity"]);
}

#[tokio::test]
async fn test_duplicate_teacher_email_is_conflict() {
    let app = TestApp::new().await;
    let teacher = json!({"name": "João Silva", "email": "joao.silva@escola.edu.br"});

    app.create("/teachers", teacher.clone()).await;
    let (status, _) = app.send("POST", "/teachers", Some(teacher)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_books_filter_by_subject_and_search() {
    let app = TestApp::new().await;
    app.create("/books", json!({"title": "História do Brasil", "subject": "História", "quantity": 3}))
        .await;
    app.create("/books", json!({"title": "Geografia Mundial", "subject": "Geografia", "quantity": 3}))
        .await;

    let (_, json) = app.send("GET", "/books?subject=Geografia", None).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["data"][0]["title"], "Geografia Mundial");

    let (_, json) = app.send("GET", "/books?q=brasil", None).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["data"][0]["available"], 3);
}

#[tokio::test]
async fn test_notification_mark_read() {
    let app = TestApp::new().await;
    let notification = app
        .create(
            "/notifications",
            json!({"title": "Reunião", "message": "Às 19h", "audience": "Todos"}),
        )
        .await;
    let id = notification["id"].as_i64().unwrap();
    assert_eq!(notification["read"], false);
    assert_eq!(notification["date"], today().format("%Y-%m-%d").to_string());

    let (status, json) = app.send("POST", &format!("/notifications/{id}/read"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["read"], true);

    let (_, json) = app.send("GET", "/notifications?unread=true", None).await;
    assert_eq!(json["count"], 0);
}

#[tokio::test]
async fn test_loan_lifecycle() {
    let app = TestApp::new().await;
    let (student_id, book_id) = student_and_book(&app, 1).await;

    let loan = app
        .create("/loans", json!({"book_id": book_id, "student_id": student_id}))
        .await;
    let id = loan["id"].as_i64().unwrap();
    assert_eq!(loan["status"], "active");
    assert_eq!(loan["overdue"], false);
    assert_eq!(loan["book_title"], "Matemática - 6º Ano");
    assert_eq!(loan["student_name"], "Ana Silva");
    assert_eq!(loan["loan_date"], days_ago(0));

    let (status, json) = app
        .send("POST", "/loans", Some(json!({"book_id": book_id, "student_id": student_id})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "book has no available copies");

    let (status, _) = app.send("DELETE", &format!("/students/{student_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = app.send("POST", &format!("/loans/{id}/return"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "returned");
    assert_eq!(json["data"]["return_date"], days_ago(0));

    let (status, _) = app.send("POST", &format!("/loans/{id}/return"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, json) = app.send("GET", &format!("/students/{student_id}/loans"), None).await;
    assert_eq!(json["count"], 1);

    let (status, _) = app.send("DELETE", &format!("/students/{student_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send("GET", &format!("/loans/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_overdue_loans_endpoint() {
    let app = TestApp::new().await;
    let (student_id, book_id) = student_and_book(&app, 5).await;

    let late = app
        .create(
            "/loans",
            json!({
                "book_id": book_id,
                "student_id": student_id,
                "loan_date": days_ago(30),
                "due_date": days_ago(10),
            }),
        )
        .await;
    assert_eq!(late["overdue"], true);

    let returned = app
        .create(
            "/loans",
            json!({
                "book_id": book_id,
                "student_id": student_id,
                "loan_date": days_ago(30),
                "due_date": days_ago(15),
            }),
        )
        .await;
    let (status, _) = app
        .send(
            "POST",
            &format!("/loans/{}/return", returned["id"]),
            Some(json!({"return_date": days_ago(5)})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    app.create("/loans", json!({"book_id": book_id, "student_id": student_id}))
        .await;

    let (status, json) = app.send("GET", "/loans/overdue", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["data"][0]["id"], late["id"]);

    let (_, json) = app.send("GET", "/loans?status=returned", None).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["data"][0]["overdue"], false);

    let (_, json) = app.send("GET", &format!("/books/{book_id}/loans"), None).await;
    assert_eq!(json["count"], 3);

    let (status, _) = app.send("GET", "/loans?status=lost", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_ids_answer_not_found() {
    let app = TestApp::new().await;

    for uri in ["/teachers/9", "/subjects/9", "/books/9", "/schedules/9", "/reminders/9", "/loans/9"] {
        let (status, _) = app.send("GET", uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "GET {uri}");
    }

    let (status, json) = app.send("GET", "/students/9/loans", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Student not found");

    let (status, _) = app.send("POST", "/loans/9/return", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_return_body_must_be_valid_json() {
    let app = TestApp::new().await;
    let (student_id, book_id) = student_and_book(&app, 1).await;
    let loan = app
        .create(
            "/loans",
            json!({"book_id": book_id, "student_id": student_id, "loan_date": days_ago(10)}),
        )
        .await;
    let uri = format!("/loans/{}/return", loan["id"]);
    let return_date = days_ago(5);

    let (status, json) = app
        .send_raw("POST", &uri, None, json!({"return_date": return_date}).to_string())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    let (status, json) = app
        .send_raw(
            "POST",
            &uri,
            Some("application/json"),
            r#"{"return_date": 20240105}"#.to_string(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    let (_, json) = app.send("GET", &format!("/loans/{}", loan["id"]), None).await;
    assert_eq!(json["data"]["status"], "active");

    let (status, json) = app
        .send("POST", &uri, Some(json!({"return_date": return_date})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["return_date"], return_date);
}

#[tokio::test]
async fn test_malformed_requests_answer_json_bad_request() {
    let app = TestApp::new().await;

    let (status, json) = app.send("POST", "/students", Some(json!({"name": 5}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    let (status, json) = app
        .send_raw("POST", "/books", Some("application/json"), "{\"title\":".to_string())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    let (status, json) = app.send("GET", "/students/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    let (status, json) = app.send("GET", "/loans?student_id=x", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    let (status, json) = app.send("GET", "/notifications?unread=maybe", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    let (_, json) = app.send("GET", "/students", None).await;
    assert_eq!(json["count"], 0);
}
