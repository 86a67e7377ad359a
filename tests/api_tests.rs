// tests/api_tests.rs

use std::sync::Arc;

use assessment_engine::{
    config::Config,
    routes,
    state::AppState,
    store::MemoryStore,
    utils::{
        clock::ManualClock,
        jwt::{Claims, Role},
    },
};
use chrono::{TimeZone, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};

const JWT_SECRET: &str = "test_secret_for_integration_tests";
const TEACHER: i64 = 1;
const STUDENT: i64 = 10;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    let config = Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        rust_log: "error".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        max_connections: 1,
        log_dir: "logs".to_string(),
    };

    // Inside the window used by `publish_body`.
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2030, 1, 1, 10, 30, 0).unwrap(),
    ));
    let state = AppState::new(MemoryStore::new(), clock, config);
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn token(user_id: i64, role: Role) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

fn publish_body(students: &[i64]) -> Value {
    json!({
        "start_time": "2030-01-01T10:00:00Z",
        "end_time": "2030-01-01T12:00:00Z",
        "student_ids": students,
    })
}

/// Creates an assessment with two 5-point questions and publishes it for `STUDENT`.
/// Returns (assessment id, question ids).
async fn seed_published(client: &reqwest::Client, address: &str) -> (i64, Vec<i64>) {
    let teacher = token(TEACHER, Role::Teacher);

    let created: Value = client
        .post(format!("{}/api/assessments", address))
        .bearer_auth(&teacher)
        .json(&json!({ "title": "Chapter 3", "description": "Cells" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().expect("id missing");

    let mut question_ids = Vec::new();
    for (content, answer) in [("Powerhouse of the cell?", "A"), ("Holds the DNA?", "B")] {
        let response = client
            .post(format!("{}/api/assessments/{}/questions", address, id))
            .bearer_auth(&teacher)
            .json(&json!({
                "content": content,
                "options": ["A", "B", "C"],
                "answer": answer,
                "score": 5,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        let question: Value = response.json().await.unwrap();
        question_ids.push(question["id"].as_i64().unwrap());
    }

    let response = client
        .post(format!("{}/api/assessments/{}/publish", address, id))
        .bearer_auth(&teacher)
        .json(&publish_body(&[STUDENT]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    (id, question_ids)
}

#[tokio::test]
async fn unknown_path_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn missing_or_invalid_token_is_401() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/assessments", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .get(format!("{}/api/student/assessments", address))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn wrong_role_is_403() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/assessments", address))
        .bearer_auth(token(STUDENT, Role::Student))
        .json(&json!({ "title": "Nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = client
        .get(format!("{}/api/student/assessments", address))
        .bearer_auth(token(TEACHER, Role::Teacher))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = client
        .get(format!("{}/api/assessments", address))
        .bearer_auth(token(2, Role::Parent))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn admins_can_author() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/assessments", address))
        .bearer_auth(token(3, Role::Admin))
        .json(&json!({ "title": "Staff quiz" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "draft");
    assert_eq!(body["creator_id"], 3);
    assert_eq!(body["total_score"], 0);
}

#[tokio::test]
async fn errors_carry_stable_codes() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let teacher = token(TEACHER, Role::Teacher);

    let response = client
        .get(format!("{}/api/assessments/999", address))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "NOT_FOUND");

    let created: Value = client
        .post(format!("{}/api/assessments", address))
        .bearer_auth(&teacher)
        .json(&json!({ "title": "Empty" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/api/assessments/{}/publish", address, id))
        .bearer_auth(&teacher)
        .json(&publish_body(&[STUDENT]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let response = client
        .post(format!("{}/api/assessments/{}/close", address, id))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "INVALID_STATE");

    let response = client
        .get(format!("{}/api/assessments/{}", address, id))
        .bearer_auth(token(2, Role::Teacher))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "FORBIDDEN");
}

#[tokio::test]
async fn full_attempt_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (id, questions) = seed_published(&client, &address).await;
    let student = token(STUDENT, Role::Student);

    // 1. Student sees the assignment
    let listed: Vec<Value> = client
        .get(format!("{}/api/student/assessments", address))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], id);
    assert_eq!(listed[0]["student_status"], "assigned");

    // 2. Questions come without answers
    let view: Value = client
        .get(format!("{}/api/student/assessments/{}", address, id))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["questions"].as_array().unwrap().len(), 2);
    assert!(view["questions"][0].get("answer").is_none());

    // 3. Result is not available yet
    let response = client
        .get(format!("{}/api/student/assessments/{}/result", address, id))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "NOT_ELIGIBLE");

    // 4. Start, then submit one right and one wrong answer
    let response = client
        .post(format!("{}/api/student/assessments/{}/start", address, id))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .post(format!("{}/api/student/assessments/{}/submit", address, id))
        .bearer_auth(&student)
        .json(&json!({
            "answers": [
                { "question_id": questions[0], "answer": "A" },
                { "question_id": questions[1], "answer": "C" },
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let graded: Value = response.json().await.unwrap();
    assert_eq!(graded["your_score"], 5);
    assert_eq!(graded["total_score"], 10);
    assert!(graded["analysis"].as_str().unwrap().contains("Holds the DNA?"));

    // 5. Resubmitting is rejected
    let response = client
        .post(format!("{}/api/student/assessments/{}/submit", address, id))
        .bearer_auth(&student)
        .json(&json!({ "answers": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // 6. Stored result matches
    let result: Value = client
        .get(format!("{}/api/student/assessments/{}/result", address, id))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(result["your_score"], 5);
    assert_eq!(result["answers"].as_array().unwrap().len(), 2);
    assert_eq!(result["answers"][1]["correct_answer"], "B");

    // 7. Teacher sees the completed attempt
    let students: Vec<Value> = client
        .get(format!("{}/api/assessments/{}/students", address, id))
        .bearer_auth(token(TEACHER, Role::Teacher))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0]["status"], "completed");
    assert_eq!(students[0]["score"], 5);
}
