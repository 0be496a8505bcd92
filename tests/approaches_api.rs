use std::fs;
use std::sync::atomic::{AtomicU32, Ordering};

use actix_web::{App, test, web};
use assert_json_diff::assert_json_eq;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use sqlx::sqlite::SqlitePool;

use approaches::config::{OneQuestionConfig, QuestionConfig};
use approaches::database as db;
use approaches::language::{LanguageCatalog, StarterSnippet};
use approaches::quota::QuotaLimits;
use approaches::validation::SubmissionLimits;
use approaches::web_server::configure;

// Global counter to ensure unique test database names
static TEST_DB_COUNTER: AtomicU32 = AtomicU32::new(0);

async fn create_test_db() -> (SqlitePool, String) {
    let test_id = TEST_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let db_path = format!("data/test_approaches_{}.db", test_id);

    fs::create_dir_all("data").unwrap();
    db::remove_db(&db_path);

    let db_pool = db::init_db(&db_path).await.unwrap();
    (db_pool, db_path)
}

// Test guard that ensures cleanup on drop
struct TestDbGuard {
    db_path: String,
}

impl Drop for TestDbGuard {
    fn drop(&mut self) {
        db::remove_db(&self.db_path);
    }
}

fn test_limits() -> SubmissionLimits {
    SubmissionLimits {
        quota: QuotaLimits::new(3, 100),
        text_max_length: 20,
        code_max_length: 60,
    }
}

fn test_questions() -> QuestionConfig {
    vec![
        OneQuestionConfig {
            id: 1,
            name: "Two Sum".to_string(),
            snippets: vec![StarterSnippet {
                language: "Java".to_string(),
                code: "class Solution {}".to_string(),
                description: String::new(),
            }],
        },
        OneQuestionConfig {
            id: 2,
            name: "Reverse a Linked List".to_string(),
            snippets: vec![],
        },
    ]
}

macro_rules! init_app {
    ($pool:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new(LanguageCatalog::builtin()))
                .app_data(web::Data::new(test_limits()))
                .app_data(web::Data::new(test_questions()))
                .configure(configure),
        )
        .await
    };
}

fn submission(text: &str, code: &str, language: &str) -> Value {
    json!({
        "text_content": text,
        "code_content": code,
        "code_language": language,
    })
}

fn as_user(req: test::TestRequest, user_id: u32) -> test::TestRequest {
    req.insert_header(("X-User-Id", user_id.to_string()))
}

#[actix_web::test]
async fn test_post_and_list_approaches() {
    let (db_pool, db_path) = create_test_db().await;
    let _guard = TestDbGuard { db_path };
    let app = init_app!(db_pool);

    let req = as_user(test::TestRequest::post(), 1)
        .uri("/questions/1/approaches")
        .set_json(submission("two pointers", "print(1)", "Python"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["id"].is_number());
    assert_eq!(body["user_id"], 1);
    assert_eq!(body["question_id"], 1);
    assert_eq!(body["code_language"], "Python");
    assert_eq!(body["content_size"], 20);
    assert_eq!(body["created_time"], body["updated_time"]);

    let req = as_user(test::TestRequest::get(), 1)
        .uri("/questions/1/approaches")
        .to_request();
    let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], body["id"]);

    let req = as_user(test::TestRequest::get(), 2)
        .uri("/questions/1/approaches")
        .to_request();
    let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert!(listed.is_empty());
}

#[actix_web::test]
async fn test_missing_identity_is_rejected() {
    let (db_pool, db_path) = create_test_db().await;
    let _guard = TestDbGuard { db_path };
    let app = init_app!(db_pool);

    let req = test::TestRequest::post()
        .uri("/questions/1/approaches")
        .set_json(submission("", "print(1)", "Python"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["reason"], "ERR_UNAUTHORIZED");
    assert_eq!(body["code"], 7);

    let req = test::TestRequest::get()
        .uri("/questions/1/approaches")
        .insert_header(("X-User-Id", "not-a-number"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let count = db::count_approaches(std::sync::Arc::new(db_pool)).await.unwrap();
    assert_eq!(count, 0);
}

#[actix_web::test]
async fn test_unknown_question_is_not_found() {
    let (db_pool, db_path) = create_test_db().await;
    let _guard = TestDbGuard { db_path };
    let app = init_app!(db_pool);

    let req = as_user(test::TestRequest::post(), 1)
        .uri("/questions/9/approaches")
        .set_json(submission("", "print(1)", "Python"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["reason"], "ERR_NOT_FOUND");
}

#[actix_web::test]
async fn test_approach_limit_blocks_extra_approach() {
    let (db_pool, db_path) = create_test_db().await;
    let _guard = TestDbGuard { db_path };
    let app = init_app!(db_pool);

    let mut ids = Vec::new();
    for i in 0..3 {
        let req = as_user(test::TestRequest::post(), 1)
            .uri("/questions/1/approaches")
            .set_json(submission("", &format!("print({i})"), "Python"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        ids.push(body["id"].as_u64().unwrap());
    }

    let req = as_user(test::TestRequest::post(), 1)
        .uri("/questions/1/approaches")
        .set_json(submission("", "print(3)", "Python"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
    let body: Value = test::read_body_json(resp).await;
    assert_json_eq!(
        body,
        json!({
            "reason": "ERR_QUOTA_EXCEEDED",
            "code": 8,
            "message": "Approach limit reached (3/3). Delete an approach to add a new one.",
            "errors": ["Approach limit reached (3/3). Delete an approach to add a new one."]
        })
    );

    // Nothing was written for the rejected submission
    let pool = std::sync::Arc::new(db_pool.clone());
    assert_eq!(db::count_approaches(pool.clone()).await.unwrap(), 3);

    // Another user on the same question is unaffected
    let req = as_user(test::TestRequest::post(), 2)
        .uri("/questions/1/approaches")
        .set_json(submission("", "print(3)", "Python"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = as_user(test::TestRequest::delete(), 1)
        .uri(&format!("/approaches/{}", ids[0]))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = as_user(test::TestRequest::post(), 1)
        .uri("/questions/1/approaches")
        .set_json(submission("", "print(3)", "Python"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);
}

#[actix_web::test]
async fn test_shape_and_size_errors() {
    let (db_pool, db_path) = create_test_db().await;
    let _guard = TestDbGuard { db_path };
    let app = init_app!(db_pool);

    let req = as_user(test::TestRequest::post(), 1)
        .uri("/questions/1/approaches")
        .set_json(submission(&"t".repeat(21), "   ", "Python"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["reason"], "ERR_INVALID_ARGUMENT");
    assert_eq!(
        body["errors"],
        json!([
            "Code must not be empty.",
            "Description is too long: 21/20 characters."
        ])
    );

    let req = as_user(test::TestRequest::post(), 1)
        .uri("/questions/1/approaches")
        .set_json(submission("", &"x".repeat(60), "Python"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = as_user(test::TestRequest::post(), 1)
        .uri("/questions/1/approaches")
        .set_json(submission("", &"y".repeat(50), "Python"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Size limit exceeded: 110/100 bytes.");

    let req = as_user(test::TestRequest::post(), 1)
        .uri("/questions/1/approaches")
        .set_payload("{not json")
        .insert_header(("Content-Type", "application/json"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_update_replaces_edited_approach_in_quota() {
    let (db_pool, db_path) = create_test_db().await;
    let _guard = TestDbGuard { db_path };
    let app = init_app!(db_pool);

    let req = as_user(test::TestRequest::post(), 1)
        .uri("/questions/1/approaches")
        .set_json(submission("", &"x".repeat(60), "Python"))
        .to_request();
    let first: Value = test::call_and_read_body_json(&app, req).await;

    let req = as_user(test::TestRequest::post(), 1)
        .uri("/questions/1/approaches")
        .set_json(submission("", &"y".repeat(30), "Java"))
        .to_request();
    let second: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(second["content_size"], 30);

    // 65 + 30 fits only because the old 60 bytes are not counted
    let req = as_user(test::TestRequest::put(), 1)
        .uri(&format!("/approaches/{}", first["id"]))
        .set_json(submission(&"t".repeat(10), &"z".repeat(55), "Rust"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let updated: Value = test::read_body_json(resp).await;
    assert_eq!(updated["id"], first["id"]);
    assert_eq!(updated["code_language"], "Rust");
    assert_eq!(updated["content_size"], 65);
    assert_eq!(updated["created_time"], first["created_time"]);

    let req = as_user(test::TestRequest::put(), 1)
        .uri(&format!("/approaches/{}", first["id"]))
        .set_json(submission(&"t".repeat(15), &"z".repeat(60), "Rust"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Size limit exceeded: 105/100 bytes.");
}

#[actix_web::test]
async fn test_update_and_delete_require_ownership() {
    let (db_pool, db_path) = create_test_db().await;
    let _guard = TestDbGuard { db_path };
    let app = init_app!(db_pool);

    let req = as_user(test::TestRequest::post(), 1)
        .uri("/questions/2/approaches")
        .set_json(submission("", "fn main() {}", "Rust"))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/approaches/{}", created["id"]);

    let req = as_user(test::TestRequest::put(), 2)
        .uri(&uri)
        .set_json(submission("", "fn main() { 1; }", "Rust"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["reason"], "ERR_FORBIDDEN");
    assert_eq!(body["code"], 4);

    let req = as_user(test::TestRequest::delete(), 2).uri(&uri).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = as_user(test::TestRequest::delete(), 1)
        .uri("/approaches/999")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = as_user(test::TestRequest::delete(), 1).uri(&uri).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = as_user(test::TestRequest::get(), 1)
        .uri("/questions/2/approaches")
        .to_request();
    let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert!(listed.is_empty());
}

#[actix_web::test]
async fn test_status_endpoint() {
    let (db_pool, db_path) = create_test_db().await;
    let _guard = TestDbGuard { db_path };
    let app = init_app!(db_pool);

    let req = as_user(test::TestRequest::post(), 1)
        .uri("/questions/1/approaches")
        .set_json(submission(&"t".repeat(10), &"x".repeat(60), "Python"))
        .to_request();
    let existing: Value = test::call_and_read_body_json(&app, req).await;

    let req = as_user(test::TestRequest::post(), 1)
        .uri("/questions/1/status")
        .set_json(json!({"code_content": "x"}))
        .to_request();
    let view: Value = test::call_and_read_body_json(&app, req).await;
    assert_json_eq!(
        view,
        json!({
            "message": "2/3 approaches used, 29 bytes available.",
            "type": "info",
            "can_submit": true
        })
    );

    let req = as_user(test::TestRequest::post(), 1)
        .uri("/questions/1/status")
        .set_json(json!({"code_content": "x".repeat(10)}))
        .to_request();
    let view: Value = test::call_and_read_body_json(&app, req).await;
    assert_json_eq!(
        view,
        json!({
            "message": "Approaching size limit, 20 bytes remaining.",
            "type": "warning",
            "can_submit": true
        })
    );

    let req = as_user(test::TestRequest::post(), 1)
        .uri("/questions/1/status")
        .set_json(json!({
            "code_content": "x".repeat(10),
            "exclude_approach_id": existing["id"]
        }))
        .to_request();
    let view: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(view["message"], "1/3 approaches used, 90 bytes available.");
}

#[actix_web::test]
async fn test_starter_endpoint() {
    let (db_pool, db_path) = create_test_db().await;
    let _guard = TestDbGuard { db_path };
    let app = init_app!(db_pool);

    let req = as_user(test::TestRequest::get(), 1)
        .uri("/questions/1/starter")
        .to_request();
    let starter: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(starter["language"]["name"], "Java");
    assert_eq!(starter["code"], "class Solution {}");
    assert_eq!(starter["source"], json!({"kind": "starter_snippet"}));

    let req = as_user(test::TestRequest::get(), 1)
        .uri("/questions/2/starter")
        .to_request();
    let starter: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(starter["language"]["name"], "Java");
    assert_eq!(starter["source"], json!({"kind": "default"}));

    let req = as_user(test::TestRequest::post(), 1)
        .uri("/questions/1/approaches")
        .set_json(submission("", "print(42)", "python3"))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;

    let req = as_user(test::TestRequest::get(), 1)
        .uri("/questions/1/starter")
        .to_request();
    let starter: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(starter["language"]["name"], "Python");
    assert_eq!(starter["code"], "print(42)");
    assert_eq!(
        starter["source"],
        json!({"kind": "approach", "approach_id": created["id"]})
    );

    // Switching never offers code written in another language
    let req = as_user(test::TestRequest::get(), 1)
        .uri("/questions/1/starter?language=java")
        .to_request();
    let starter: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(starter["code"], "class Solution {}");

    let req = as_user(test::TestRequest::get(), 1)
        .uri("/questions/1/starter?language=rs")
        .to_request();
    let starter: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(starter["language"]["name"], "Rust");
    assert_eq!(starter["source"], json!({"kind": "default"}));

    let req = as_user(test::TestRequest::get(), 1)
        .uri("/questions/9/starter")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_web::test]
async fn test_concurrent_creates_respect_approach_limit() {
    let (db_pool, db_path) = create_test_db().await;
    let _guard = TestDbGuard { db_path };
    let app = init_app!(db_pool);

    let create = |i: u32| {
        as_user(test::TestRequest::post(), 1)
            .uri("/questions/1/approaches")
            .set_json(submission("", &format!("print({i})"), "Python"))
            .to_request()
    };

    for i in 0..2 {
        assert_eq!(test::call_service(&app, create(i)).await.status(), 200);
    }

    let (a, b, c) = tokio::join!(
        test::call_service(&app, create(2)),
        test::call_service(&app, create(3)),
        test::call_service(&app, create(4)),
    );
    let mut statuses = vec![
        a.status().as_u16(),
        b.status().as_u16(),
        c.status().as_u16(),
    ];
    statuses.sort();
    assert_eq!(statuses, vec![200, 403, 403]);

    let stored = db::count_approaches(std::sync::Arc::new(db_pool)).await.unwrap();
    assert_eq!(stored, 3);
}

#[actix_web::test]
async fn test_concurrent_updates_respect_size_limit() {
    let (db_pool, db_path) = create_test_db().await;
    let _guard = TestDbGuard { db_path };
    let app = init_app!(db_pool);

    let mut ids = Vec::new();
    for _ in 0..2 {
        let req = as_user(test::TestRequest::post(), 1)
            .uri("/questions/1/approaches")
            .set_json(submission("", &"x".repeat(30), "Python"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        ids.push(body["id"].clone());
    }

    // Each edit fits on its own (60 + 30), but not both together (60 + 60)
    let grow = |id: &Value| {
        as_user(test::TestRequest::put(), 1)
            .uri(&format!("/approaches/{id}"))
            .set_json(submission("", &"y".repeat(60), "Python"))
            .to_request()
    };
    let (a, b) = tokio::join!(
        test::call_service(&app, grow(&ids[0])),
        test::call_service(&app, grow(&ids[1])),
    );
    let mut statuses = vec![a.status().as_u16(), b.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, vec![200, 403]);

    let req = as_user(test::TestRequest::get(), 1)
        .uri("/questions/1/approaches")
        .to_request();
    let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    let total: u64 = listed
        .iter()
        .map(|a| a["content_size"].as_u64().unwrap())
        .sum();
    assert_eq!(total, 90);
}

#[actix_web::test]
async fn test_saved_approach_carries_quota_status() {
    let (db_pool, db_path) = create_test_db().await;
    let _guard = TestDbGuard { db_path };
    let app = init_app!(db_pool);

    let req = as_user(test::TestRequest::post(), 1)
        .uri("/questions/1/approaches")
        .set_json(submission("", "print(1)", "Python"))
        .to_request();
    let saved: Value = test::call_and_read_body_json(&app, req).await;
    assert_json_eq!(
        saved["status"],
        json!({
            "message": "1/3 approaches used, 92 bytes available.",
            "type": "info",
            "can_submit": true
        })
    );

    let req = as_user(test::TestRequest::put(), 1)
        .uri(&format!("/approaches/{}", saved["id"]))
        .set_json(submission(&"t".repeat(20), &"x".repeat(60), "Python"))
        .to_request();
    let saved: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(saved["content_size"], 80);
    assert_json_eq!(
        saved["status"],
        json!({
            "message": "Approaching size limit, 20 bytes remaining.",
            "type": "warning",
            "can_submit": true
        })
    );
}
