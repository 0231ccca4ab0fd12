// tests/analytics_tests.rs

use quizmaster::{
    config::Config, models::user::Role, routes, services::answer_key::migrate_legacy_keys,
    state::AppState, utils::jwt::sign_jwt,
};
use serde_json::Value;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

const SECRET: &str = "analytics_test_secret";

async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    pool
}

async fn spawn_app(pool: SqlitePool) -> String {
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: SECRET.to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        server_port: 0,
    };

    let state = AppState { pool, config };
    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

async fn seed_user(pool: &SqlitePool, username: &str, role: Role) -> String {
    let id: i64 = sqlx::query_scalar("INSERT INTO users (username, role) VALUES (?, ?) RETURNING id")
        .bind(username)
        .bind(role.as_str())
        .fetch_one(pool)
        .await
        .unwrap();
    sign_jwt(id, role, SECRET, 600).unwrap()
}

async fn seed_quiz(pool: &SqlitePool, subject: &str, chapter: &str, quiz: &str, passing_score: f64) -> i64 {
    let subject_id: i64 = sqlx::query_scalar("INSERT INTO subjects (name) VALUES (?) RETURNING id")
        .bind(subject)
        .fetch_one(pool)
        .await
        .unwrap();
    let chapter_id: i64 = sqlx::query_scalar("INSERT INTO chapters (subject_id, name) VALUES (?, ?) RETURNING id")
        .bind(subject_id)
        .bind(chapter)
        .fetch_one(pool)
        .await
        .unwrap();
    sqlx::query_scalar(
        "INSERT INTO quizzes (chapter_id, name, time_duration, passing_score) VALUES (?, ?, 30, ?) RETURNING id",
    )
    .bind(chapter_id)
    .bind(quiz)
    .bind(passing_score)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn seed_question(
    pool: &SqlitePool,
    quiz_id: i64,
    kind: &str,
    options: &[&str],
    correct: &str,
    marks: i64,
    difficulty: &str,
) -> i64 {
    let slot = |i: usize| options.get(i).map(|o| o.to_string());
    sqlx::query_scalar(
        r#"
        INSERT INTO questions
            (quiz_id, question_statement, option1, option2, option3, question_type, correct_option, marks, difficulty)
        VALUES (?, 'Statement', ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(quiz_id)
    .bind(slot(0))
    .bind(slot(1))
    .bind(slot(2))
    .bind(kind)
    .bind(correct)
    .bind(marks)
    .bind(difficulty)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn submit(client: &reqwest::Client, address: &str, token: &str, quiz_id: i64, form: &[(String, String)]) {
    let response = client
        .post(format!("{}/api/quizzes/{}/submit", address, quiz_id))
        .bearer_auth(token)
        .form(form)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 303);
}

async fn get_json(client: &reqwest::Client, url: String, token: &str) -> Value {
    let response = client.get(url).bearer_auth(token).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    response.json().await.unwrap()
}

fn approx(value: &Value, expected: f64) -> bool {
    value.as_f64().is_some_and(|v| (v - expected).abs() < 1e-6)
}

struct Seeded {
    address: String,
    client: reqwest::Client,
    alice: String,
    bob: String,
    admin: String,
    mechanics: i64,
}

/// Alice aces Mechanics and the Optics quiz; Bob misses the only question he answers.
/// Carol is registered but never attempts anything.
async fn seed_attempts() -> Seeded {
    let pool = test_pool().await;
    let address = spawn_app(pool.clone()).await;
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let alice = seed_user(&pool, "alice", Role::Student).await;
    let bob = seed_user(&pool, "bob", Role::Student).await;
    seed_user(&pool, "carol", Role::Student).await;
    let admin = seed_user(&pool, "root", Role::Admin).await;

    let mechanics = seed_quiz(&pool, "Physics", "Kinematics", "Mechanics", 2.0).await;
    let q1 = seed_question(&pool, mechanics, "single", &["A", "B", "C"], "B", 1, "Easy").await;
    let q2 = seed_question(&pool, mechanics, "multiselect", &["X", "Y", "Z"], "X,Y", 2, "Hard").await;

    let optics = seed_quiz(&pool, "Science", "Optics", "Lenses", 1.0).await;
    let q3 = seed_question(&pool, optics, "integer", &[], "7", 1, "Medium").await;

    let field = |name: String, value: &str| (name, value.to_string());

    submit(
        &client,
        &address,
        &alice,
        mechanics,
        &[
            field(format!("answer_{}", q1), "B"),
            field(format!("answer_{}", q2), "X"),
            field(format!("answer_{}", q2), "Y"),
            field(format!("time_{}", q1), "10"),
            field(format!("time_{}", q2), "50"),
        ],
    )
    .await;
    submit(
        &client,
        &address,
        &alice,
        optics,
        &[field(format!("answer_{}", q3), "7"), field(format!("time_{}", q3), "5")],
    )
    .await;
    submit(
        &client,
        &address,
        &bob,
        mechanics,
        &[field(format!("answer_{}", q1), "C"), field(format!("time_{}", q1), "20")],
    )
    .await;

    Seeded {
        address,
        client,
        alice,
        bob,
        admin,
        mechanics,
    }
}

#[tokio::test]
async fn quiz_stats_aggregate_all_attempts() {
    let app = seed_attempts().await;
    let url = format!("{}/api/admin/quizzes/{}/stats", app.address, app.mechanics);

    let stats = get_json(&app.client, url.clone(), &app.admin).await;

    assert_eq!(stats["attempts"], 2);
    assert!(approx(&stats["average_score"], 1.5));
    assert!(approx(&stats["highest_score"], 3.0));
    assert!(approx(&stats["lowest_score"], 0.0));
    assert!(approx(&stats["pass_rate"], 50.0));
    // Two scores over three registered students; admins are not counted.
    assert!(approx(&stats["completion_rate"], 200.0 / 3.0));

    let difficulty = stats["difficulty"].as_array().unwrap();
    assert_eq!(difficulty.len(), 2);
    assert_eq!(difficulty[0]["difficulty"], "Easy");
    assert_eq!(difficulty[0]["attempted"], 2);
    assert_eq!(difficulty[0]["correct"], 1);
    assert_eq!(difficulty[1]["difficulty"], "Hard");
    assert!(approx(&difficulty[1]["accuracy"], 100.0));

    // Reading twice without new attempts yields identical results.
    let again = get_json(&app.client, url, &app.admin).await;
    assert_eq!(stats, again);

    let missing = app
        .client
        .get(format!("{}/api/admin/quizzes/{}/stats", app.address, 9_999))
        .bearer_auth(&app.admin)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);

    let student = app
        .client
        .get(format!("{}/api/admin/quizzes/{}/stats", app.address, app.mechanics))
        .bearer_auth(&app.bob)
        .send()
        .await
        .unwrap();
    assert_eq!(student.status().as_u16(), 403);
}

#[tokio::test]
async fn user_summary_reports_progress_and_topics() {
    let app = seed_attempts().await;

    let summary = get_json(&app.client, format!("{}/api/analytics/me", app.address), &app.alice).await;

    assert_eq!(summary["total_attempts"], 2);
    assert_eq!(summary["passed"], 2);
    assert_eq!(summary["total_correct"], 3);
    assert_eq!(summary["total_incorrect"], 0);
    assert!(approx(&summary["average_accuracy"], 100.0));
    assert!(approx(&summary["consistency"], 0.0));

    let timeline = summary["timeline"].as_array().unwrap();
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[0]["quiz_name"], "Mechanics");
    // Alice beat Bob on Mechanics and was alone on Lenses.
    assert!(approx(&timeline[0]["percentile"], 50.0));
    assert!(approx(&timeline[1]["percentile"], 0.0));
    assert_eq!(timeline[0]["pass_fail"], "Pass");

    let difficulty: Vec<&str> = summary["difficulty"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["difficulty"].as_str().unwrap())
        .collect();
    assert_eq!(difficulty, vec!["Easy", "Medium", "Hard"]);

    let slowest = &summary["topics"]["time_consuming"][0];
    assert_eq!(slowest["chapter_name"], "Kinematics");
    assert!(approx(&slowest["average_time"], 30.0));
    assert_eq!(summary["topics"]["time_efficient"][0]["chapter_name"], "Optics");
}

#[tokio::test]
async fn user_summary_without_attempts_is_empty() {
    let pool = test_pool().await;
    let address = spawn_app(pool.clone()).await;
    let token = seed_user(&pool, "dora", Role::Student).await;

    let summary = get_json(&reqwest::Client::new(), format!("{}/api/analytics/me", address), &token).await;

    assert_eq!(summary["total_attempts"], 0);
    assert!(approx(&summary["average_accuracy"], 0.0));
    assert!(approx(&summary["consistency"], 0.0));
    assert_eq!(summary["timeline"].as_array().unwrap().len(), 0);
    assert_eq!(summary["difficulty"].as_array().unwrap().len(), 0);
    assert_eq!(summary["topics"]["time_consuming"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn admin_summary_sorts_and_charts_per_user() {
    let app = seed_attempts().await;

    let by_score = get_json(
        &app.client,
        format!("{}/api/admin/summary?sort_by=score", app.address),
        &app.admin,
    )
    .await;
    assert_eq!(by_score["sort_by"], "score");
    let rows = by_score["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["username"], "alice");
    assert!(approx(&rows[0]["total_scored"], 3.0));
    assert_eq!(rows[2]["username"], "bob");
    assert_eq!(rows[0]["subject_name"], "Physics");

    assert_eq!(by_score["chart_labels"], serde_json::json!(["alice", "bob"]));
    assert!(approx(&by_score["chart_data"][0], 4.0));
    assert!(approx(&by_score["chart_data"][1], 0.0));

    // Unknown sort keys fall back to ordering by user.
    let fallback = get_json(
        &app.client,
        format!("{}/api/admin/summary?sort_by=shoe_size", app.address),
        &app.admin,
    )
    .await;
    assert_eq!(fallback["sort_by"], "user");
    let users: Vec<&str> = fallback["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["username"].as_str().unwrap())
        .collect();
    assert_eq!(users, vec!["alice", "alice", "bob"]);
}

#[tokio::test]
async fn legacy_index_keys_are_rewritten_once() {
    let pool = test_pool().await;
    let quiz_id = seed_quiz(&pool, "History", "Rome", "Emperors", 1.0).await;
    let single = seed_question(&pool, quiz_id, "single", &["Nero", "Trajan", "Otho"], "option2", 1, "Easy").await;
    let multi = seed_question(&pool, quiz_id, "multiselect", &["Nero", "Trajan", "Otho"], "option1, option3", 2, "Hard").await;
    let integer = seed_question(&pool, quiz_id, "integer", &[], "117", 1, "Medium").await;

    let rewritten = migrate_legacy_keys(&pool).await.unwrap();
    assert_eq!(rewritten, 2);

    let key = |id: i64| {
        let pool = pool.clone();
        async move {
            sqlx::query_scalar::<_, String>("SELECT correct_option FROM questions WHERE id = ?")
                .bind(id)
                .fetch_one(&pool)
                .await
                .unwrap()
        }
    };
    assert_eq!(key(single).await, "Trajan");
    assert_eq!(key(multi).await, "Nero,Otho");
    assert_eq!(key(integer).await, "117");

    // Nothing left to rewrite.
    assert_eq!(migrate_legacy_keys(&pool).await.unwrap(), 0);
}
