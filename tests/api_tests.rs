// tests/api_tests.rs

use quizclash_backend::{config::Config, routes, state::AppState, utils::hash::hash_password};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    // Note: For Postgres, you must have a running database.
    // We'll read from DATABASE_URL environment variable.
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        admin_email: None,
        admin_password: None,
        mail_api_url: None,
        mail_api_key: None,
        mail_from: None,
        authority_email: None,
        upload_dir: std::env::temp_dir()
            .join("quizclash-test-uploads")
            .to_string_lossy()
            .into_owned(),
        public_base_url: "http://localhost:3000".to_string(),
    };

    let state = AppState { pool, config };
    let app = routes::create_router(state);

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

async fn test_pool() -> PgPool {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test DB")
}

fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

/// Pre-creates a passwordless identity, returning its id.
async fn create_identity(client: &reqwest::Client, address: &str, email: &str) -> i64 {
    let resp = client
        .post(format!("{}/api/auth/identities", address))
        .json(&serde_json::json!({ "email": email }))
        .send()
        .await
        .expect("Failed to create identity");
    assert_eq!(resp.status().as_u16(), 201);
    resp.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .unwrap()
}

fn participant_payload(user_id: i64, email: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "userId": user_id,
        "password": "password123",
        "name": name,
        "email": email,
        "phone": "9876543210",
        "schoolName": "Test High School",
        "aadhar": "123456789012",
    })
}

/// Registers a fresh two-member team and returns (team_name, email1).
async fn register_team(client: &reqwest::Client, address: &str) -> (String, String) {
    let email1 = format!("{}@example.com", unique("p1"));
    let email2 = format!("{}@example.com", unique("p2"));
    let id1 = create_identity(client, address, &email1).await;
    let id2 = create_identity(client, address, &email2).await;
    let team_name = unique("team");

    let resp = client
        .post(format!("{}/api/auth/register-team", address))
        .json(&serde_json::json!({
            "teamName": team_name,
            "participant1": participant_payload(id1, &email1, "Participant One"),
            "participant2": participant_payload(id2, &email2, "Participant Two"),
        }))
        .send()
        .await
        .expect("Registration request failed");
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true, "registration failed: {:?}", body);

    (team_name, email1)
}

async fn login(client: &reqwest::Client, address: &str, email: &str, password: &str) -> String {
    let resp = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Login failed");
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

/// Seeds an admin identity directly and returns a logged-in token.
async fn admin_token(client: &reqwest::Client, address: &str, pool: &PgPool) -> String {
    let email = format!("{}@example.com", unique("admin"));
    let hash = hash_password("adminpass123").unwrap();

    let (user_id,): (i64,) = sqlx::query_as(
        "INSERT INTO users (email, password_hash, display_name) VALUES ($1, $2, 'Admin') RETURNING id",
    )
    .bind(&email)
    .bind(&hash)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO profiles (user_id, role, name) VALUES ($1, 'admin', 'Admin')")
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();

    login(client, address, &email, "adminpass123").await
}

#[tokio::test]
async fn health_check_404() {
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
async fn identity_creation_rejects_bad_email() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/identities", address))
        .json(&serde_json::json!({ "email": "not-an-email" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn login_fails_before_registration_sets_password() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = format!("{}@example.com", unique("pw"));
    create_identity(&client, &address, &email).await;

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": "whatever1" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn team_registration_end_to_end() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (_team, email1) = register_team(&client, &address).await;

    // Both identities can now log in, and resolve as participants.
    let token = login(&client, &address, &email1, "password123").await;
    let me: serde_json::Value = client
        .get(format!("{}/api/auth/me", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["role"], "participant");
}

#[tokio::test]
async fn duplicate_team_name_creates_nothing() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    let (team_name, _) = register_team(&client, &address).await;

    // Second registration with the same team name and fresh identities.
    let email1 = format!("{}@example.com", unique("dup1"));
    let email2 = format!("{}@example.com", unique("dup2"));
    let id1 = create_identity(&client, &address, &email1).await;
    let id2 = create_identity(&client, &address, &email2).await;

    let resp = client
        .post(format!("{}/api/auth/register-team", address))
        .json(&serde_json::json!({
            "teamName": team_name,
            "participant1": participant_payload(id1, &email1, "Dup One"),
            "participant2": participant_payload(id2, &email2, "Dup Two"),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Team name already exists.");

    // No participant rows were created for the failed registration.
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM participants WHERE user_id = $1 OR user_id = $2")
            .bind(id1)
            .bind(id2)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn admin_routes_reject_anonymous_and_participants() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // No token: 401.
    let resp = client
        .get(format!("{}/api/admin/stats", address))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    // Participant token: 403.
    let (_, email1) = register_team(&client, &address).await;
    let token = login(&client, &address, &email1, "password123").await;
    let resp = client
        .get(format!("{}/api/admin/stats", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn metadata_role_fallback_grants_admin() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    // Identity with no profile row but a legacy metadata role.
    let email = format!("{}@example.com", unique("legacy"));
    let hash = hash_password("legacypass1").unwrap();
    sqlx::query(
        r#"INSERT INTO users (email, password_hash, metadata) VALUES ($1, $2, '{"role": "admin"}')"#,
    )
    .bind(&email)
    .bind(&hash)
    .execute(&pool)
    .await
    .unwrap();

    let token = login(&client, &address, &email, "legacypass1").await;
    let resp = client
        .get(format!("{}/api/admin/stats", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn schedule_conflicts_use_inclusive_bounds() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;
    let token = admin_token(&client, &address, &pool).await;

    // Exam occupying [10:00, 11:00].
    let resp = client
        .post(format!("{}/api/admin/exams", address))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "title": unique("Scheduled Exam"),
            "scheduledStart": "2030-06-01T10:00:00Z",
            "scheduledEnd": "2030-06-01T11:00:00Z",
            "durationMinutes": 60,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let exam_id = resp.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .unwrap();

    // Touching window [11:00, 12:00] conflicts.
    let body: serde_json::Value = client
        .post(format!("{}/api/admin/schedule/conflicts", address))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "startTime": "2030-06-01T11:00:00Z",
            "endTime": "2030-06-01T12:00:00Z",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<i64> = body["conflicts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect();
    assert!(ids.contains(&exam_id), "touching window must conflict");

    // One minute later does not.
    let body: serde_json::Value = client
        .post(format!("{}/api/admin/schedule/conflicts", address))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "startTime": "2030-06-01T11:01:00Z",
            "endTime": "2030-06-01T12:00:00Z",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<i64> = body["conflicts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect();
    assert!(!ids.contains(&exam_id));

    // The exam never conflicts with itself.
    let body: serde_json::Value = client
        .post(format!("{}/api/admin/schedule/conflicts", address))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "examId": exam_id,
            "startTime": "2030-06-01T10:00:00Z",
            "endTime": "2030-06-01T11:00:00Z",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<i64> = body["conflicts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect();
    assert!(!ids.contains(&exam_id));
}

#[tokio::test]
async fn calendar_feed_lists_scheduled_exams() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;
    let token = admin_token(&client, &address, &pool).await;

    let title = unique("Calendar Exam");
    let resp = client
        .post(format!("{}/api/admin/exams", address))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "title": title,
            "scheduledStart": "2030-07-01T09:00:00Z",
            "scheduledEnd": "2030-07-01T10:30:00Z",
            "durationMinutes": 90,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let resp = client
        .get(format!("{}/api/admin/schedule/calendar-feed", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert!(
        resp.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/calendar")
    );
    let body = resp.text().await.unwrap();
    assert!(body.contains("BEGIN:VCALENDAR"));
    assert!(body.contains(&format!("SUMMARY:{}", title)));
    assert!(body.contains("DTSTART:20300701T090000Z"));
}

#[tokio::test]
async fn full_exam_flow_scores_and_aggregates() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;
    let admin = admin_token(&client, &address, &pool).await;

    // Exam with two questions worth 10 and 5 points, passing score 10.
    let resp = client
        .post(format!("{}/api/admin/exams", address))
        .bearer_auth(&admin)
        .json(&serde_json::json!({
            "title": unique("Flow Exam"),
            "scheduledStart": "2031-01-10T09:00:00Z",
            "scheduledEnd": "2031-01-10T10:00:00Z",
            "durationMinutes": 30,
            "passingScore": 10,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let exam_id = resp.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .unwrap();

    for (text, answer, points) in [("Q1", "A", 10), ("Q2", "C", 5)] {
        let resp = client
            .post(format!("{}/api/admin/exams/{}/questions", address, exam_id))
            .bearer_auth(&admin)
            .json(&serde_json::json!({
                "questionText": text,
                "optionA": "first",
                "optionB": "second",
                "optionC": "third",
                "optionD": "fourth",
                "correctAnswer": answer,
                "points": points,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 201);
    }

    // Activate the exam.
    let resp = client
        .put(format!("{}/api/admin/exams/{}", address, exam_id))
        .bearer_auth(&admin)
        .json(&serde_json::json!({ "status": "active" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    // Register a team and assign participant 1.
    let (_, email1) = register_team(&client, &address).await;
    let (participant_id,): (i64,) = sqlx::query_as(
        "SELECT p.id FROM participants p JOIN users u ON u.id = p.user_id WHERE u.email = $1",
    )
    .bind(&email1)
    .fetch_one(&pool)
    .await
    .unwrap();

    let resp = client
        .post(format!("{}/api/admin/exams/{}/participants", address, exam_id))
        .bearer_auth(&admin)
        .json(&serde_json::json!({ "participantIds": [participant_id] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.json::<serde_json::Value>().await.unwrap()["assigned"],
        1
    );

    // Assigning again is idempotent.
    let resp = client
        .post(format!("{}/api/admin/exams/{}/participants", address, exam_id))
        .bearer_auth(&admin)
        .json(&serde_json::json!({ "participantIds": [participant_id] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.json::<serde_json::Value>().await.unwrap()["assigned"],
        0
    );

    // Participant takes the exam: one right (10 pts), one wrong.
    let token = login(&client, &address, &email1, "password123").await;

    let questions: Vec<serde_json::Value> = client
        .get(format!("{}/api/exams/{}/questions", address, exam_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(questions.len(), 2);
    assert!(questions[0].get("correctAnswer").is_none());

    let resp = client
        .post(format!("{}/api/exams/{}/start", address, exam_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let q1 = questions[0]["id"].as_i64().unwrap();
    let q2 = questions[1]["id"].as_i64().unwrap();
    let result: serde_json::Value = client
        .post(format!("{}/api/exams/{}/submit", address, exam_id))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "answers": { q1.to_string(): "A", q2.to_string(): "B" },
            "timeTakenMinutes": 12,
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(result["score"], 10);
    assert_eq!(result["correctAnswers"], 1);
    assert_eq!(result["totalQuestions"], 2);
    // 10 of 15 possible points -> 67%.
    assert_eq!(result["percentage"], 67);
    assert_eq!(result["passed"], true);

    // Second submit is rejected.
    let resp = client
        .post(format!("{}/api/exams/{}/submit", address, exam_id))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "answers": { q1.to_string(): "A" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    // Per-exam analytics sees exactly this submitted attempt.
    let analytics: serde_json::Value = client
        .get(format!("{}/api/admin/analytics?examId={}", address, exam_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(analytics["totalAttempts"], 1);
    assert_eq!(analytics["submittedAttempts"], 1);
    assert_eq!(analytics["averageScore"], 10);

    // Difficulty report: Q1 answered correctly by its only taker -> Easy.
    let difficulty: Vec<serde_json::Value> = client
        .get(format!(
            "{}/api/admin/analytics/difficulty?examId={}",
            address, exam_id
        ))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let q1_entry = difficulty
        .iter()
        .find(|e| e["questionId"].as_i64() == Some(q1))
        .expect("Q1 in difficulty report");
    assert_eq!(q1_entry["correctPercentage"], 100);
    assert_eq!(q1_entry["difficulty"], "Easy");
}

#[tokio::test]
async fn notification_skips_when_mail_unconfigured() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;
    let admin = admin_token(&client, &address, &pool).await;

    let resp = client
        .post(format!("{}/api/send-authority-notification", address))
        .bearer_auth(&admin)
        .json(&serde_json::json!({
            "subject": "Score update",
            "message": "Results are out.",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.json::<serde_json::Value>().await.unwrap()["skipped"], true);
}

#[tokio::test]
async fn notification_is_admin_only() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, email1) = register_team(&client, &address).await;
    let token = login(&client, &address, &email1, "password123").await;

    let resp = client
        .post(format!("{}/api/send-authority-notification", address))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "subject": "Score update",
            "message": "Results are out.",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn profile_photo_upload_validates_type() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, email1) = register_team(&client, &address).await;
    let token = login(&client, &address, &email1, "password123").await;

    // Wrong content type is rejected.
    let form = reqwest::multipart::Form::new().part(
        "photo",
        reqwest::multipart::Part::bytes(vec![1, 2, 3])
            .file_name("notes.txt")
            .mime_str("text/plain")
            .unwrap(),
    );
    let resp = client
        .post(format!("{}/api/upload/profile-photo", address))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // A small png payload is accepted and yields a public URL.
    let form = reqwest::multipart::Form::new().part(
        "photo",
        reqwest::multipart::Part::bytes(vec![0x89, 0x50, 0x4E, 0x47])
            .file_name("me.png")
            .mime_str("image/png")
            .unwrap(),
    );
    let resp = client
        .post(format!("{}/api/upload/profile-photo", address))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let url = resp.json::<serde_json::Value>().await.unwrap()["url"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(url.contains("/uploads/profile-"));
    assert!(url.ends_with(".png"));
}

#[tokio::test]
async fn question_set_rejects_empty_input() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;
    let token = admin_token(&client, &address, &pool).await;

    let resp = client
        .post(format!("{}/api/admin/question-sets", address))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "name": "", "questionIds": [1] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = client
        .post(format!("{}/api/admin/question-sets", address))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "name": "Warmup", "questionIds": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn question_set_rolls_back_on_bad_question() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;
    let token = admin_token(&client, &address, &pool).await;

    // A question id that cannot exist makes the join insert fail; the set
    // row created before it must be deleted again.
    let name = unique("doomed-set");
    let resp = client
        .post(format!("{}/api/admin/question-sets", address))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "name": name, "questionIds": [i64::MAX] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 500);

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM question_sets WHERE name = $1")
        .bind(&name)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn windowless_exam_cannot_leave_draft() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;
    let admin = admin_token(&client, &address, &pool).await;

    // A draft without a window is fine.
    let resp = client
        .post(format!("{}/api/admin/exams", address))
        .bearer_auth(&admin)
        .json(&serde_json::json!({
            "title": unique("Windowless Exam"),
            "durationMinutes": 30,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let exam_id = resp.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .unwrap();

    // Promoting it without ever scheduling it is not.
    for status in ["scheduled", "active"] {
        let resp = client
            .put(format!("{}/api/admin/exams/{}", address, exam_id))
            .bearer_auth(&admin)
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400, "status '{}' must be rejected", status);
    }

    // Supplying the window in the same update makes it legal.
    let resp = client
        .put(format!("{}/api/admin/exams/{}", address, exam_id))
        .bearer_auth(&admin)
        .json(&serde_json::json!({
            "status": "scheduled",
            "scheduledStart": "2031-03-01T09:00:00Z",
            "scheduledEnd": "2031-03-01T10:00:00Z",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn registration_failure_mid_transaction_reports_and_rolls_back() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    // Participant 1 is already part of a team.
    let email1 = format!("{}@example.com", unique("taken"));
    let email2 = format!("{}@example.com", unique("fresh"));
    let id1 = create_identity(&client, &address, &email1).await;
    let id2 = create_identity(&client, &address, &email2).await;

    let first_team = unique("team");
    let resp = client
        .post(format!("{}/api/auth/register-team", address))
        .json(&serde_json::json!({
            "teamName": first_team,
            "participant1": participant_payload(id1, &email1, "Taken One"),
            "participant2": participant_payload(id2, &email2, "Fresh Two"),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.json::<serde_json::Value>().await.unwrap()["success"], true);

    // Re-registering the same identity under a new team fails inside the
    // transaction, after the team row is written. The caller still gets the
    // workflow result shape, and the half-built team is gone.
    let email3 = format!("{}@example.com", unique("other"));
    let id3 = create_identity(&client, &address, &email3).await;
    let second_team = unique("team");
    let resp = client
        .post(format!("{}/api/auth/register-team", address))
        .json(&serde_json::json!({
            "teamName": second_team,
            "participant1": participant_payload(id1, &email1, "Taken One"),
            "participant2": participant_payload(id3, &email3, "Other Three"),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().len() > 0);

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM teams WHERE team_name = $1")
        .bind(&second_team)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0, "failed registration must not leave a team row");
}

#[tokio::test]
async fn admin_lists_teams() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;
    let admin = admin_token(&client, &address, &pool).await;
    let (team_name, _) = register_team(&client, &address).await;

    let teams: Vec<serde_json::Value> = client
        .get(format!("{}/api/admin/teams", address))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(teams.iter().any(|t| t["teamName"] == team_name.as_str()));
}

#[tokio::test]
async fn role_update_promotes_participant_to_admin() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;
    let admin = admin_token(&client, &address, &pool).await;
    let (_, email1) = register_team(&client, &address).await;
    let token = login(&client, &address, &email1, "password123").await;

    // Fresh participants cannot reach the admin surface.
    let resp = client
        .get(format!("{}/api/admin/stats", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let (user_id,): (i64,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&email1)
        .fetch_one(&pool)
        .await
        .unwrap();

    // An unknown role is rejected.
    let resp = client
        .put(format!("{}/api/admin/users/{}/role", address, user_id))
        .bearer_auth(&admin)
        .json(&serde_json::json!({ "role": "superuser" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = client
        .put(format!("{}/api/admin/users/{}/role", address, user_id))
        .bearer_auth(&admin)
        .json(&serde_json::json!({ "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.json::<serde_json::Value>().await.unwrap()["role"], "admin");

    // The same token now passes; roles are read from the database per request.
    let resp = client
        .get(format!("{}/api/admin/stats", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}
