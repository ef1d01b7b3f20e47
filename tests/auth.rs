use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use dotenv::dotenv;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use sqlx::PgPool;
use tasknest::auth::{AuthMiddleware, Claims, TokenService};
use tasknest::config::Config;
use tasknest::routes;
use tasknest::routes::health;
use uuid::Uuid;

const TEST_SECRET: &str = "integration-test-signing-secret";

fn test_config(database_url: &str) -> Config {
    Config {
        database_url: database_url.to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        server_port: 8080,
        server_host: "127.0.0.1".to_string(),
        token_ttl_days: 7,
        // Minimum cost keeps registration fast in tests.
        bcrypt_cost: 4,
    }
}

/// Connects to the test database, or skips the test when no DATABASE_URL is
/// configured for this environment.
async fn connect() -> Option<(PgPool, String)> {
    dotenv().ok(); // Load .env file
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL not set; skipping DB-backed test");
            return None;
        }
    };
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");
    Some((pool, database_url))
}

async fn cleanup_user(pool: &PgPool, email: &str) {
    // Tasks are removed by the owner cascade.
    let _ = sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await;
}

macro_rules! test_app {
    ($pool:expr, $database_url:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new(TokenService::new(TEST_SECRET, 7)))
                .app_data(web::Data::new(test_config(&$database_url)))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header()
                        .max_age(3600),
                )
                .wrap(Logger::default())
                .service(health::health)
                .service(
                    web::scope("/api")
                        .wrap(AuthMiddleware)
                        .configure(routes::config),
                ),
        )
        .await
    };
}

#[actix_rt::test]
async fn test_register_and_login_flow() {
    let Some((pool, database_url)) = connect().await else {
        return;
    };
    let email = "integration@example.com";
    cleanup_user(&pool, email).await;

    let app = test_app!(pool, database_url);

    // Register a new user
    let register_payload = json!({
        "name": "Integration User",
        "email": email,
        "password": "Password123!"
    });
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body_bytes = test::read_body(resp).await;
    assert_eq!(
        status,
        actix_web::http::StatusCode::CREATED,
        "Registration failed. Body: {:?}",
        String::from_utf8_lossy(&body_bytes)
    );

    let register_response: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
    assert!(register_response["token"].is_string());
    assert_eq!(register_response["user"]["name"], "Integration User");
    assert_eq!(register_response["user"]["email"], email);
    // No credential material in the response, under any naming
    assert!(register_response["user"].get("password").is_none());
    assert!(register_response["user"].get("password_hash").is_none());
    assert!(register_response["user"].get("passwordHash").is_none());

    // The stored representation must not contain the plaintext
    let stored_hash: String =
        sqlx::query_scalar("SELECT password_hash FROM users WHERE email = $1")
            .bind(email)
            .fetch_one(&pool)
            .await
            .expect("registered user should be stored");
    assert_ne!(stored_hash, "Password123!");
    assert!(!stored_hash.contains("Password123!"));

    // Try to register the same user again (should fail)
    let req_conflict = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp_conflict = test::call_service(&app, req_conflict).await;
    assert_eq!(
        resp_conflict.status(),
        actix_web::http::StatusCode::BAD_REQUEST,
        "Duplicate registration did not fail as expected"
    );

    // Login with the registered user
    let req_login = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(&json!({ "email": email, "password": "Password123!" }))
        .to_request();
    let resp_login = test::call_service(&app, req_login).await;
    let status_login = resp_login.status();
    let body_bytes_login = test::read_body(resp_login).await;
    assert_eq!(
        status_login,
        actix_web::http::StatusCode::OK,
        "Login failed. Body: {:?}",
        String::from_utf8_lossy(&body_bytes_login)
    );

    let login_response: tasknest::auth::AuthResponse =
        serde_json::from_slice(&body_bytes_login).expect("Failed to parse login response JSON");
    assert!(!login_response.token.is_empty());
    assert_eq!(
        login_response.user.id.to_string(),
        register_response["user"]["id"].as_str().unwrap()
    );

    // Wrong password and unknown email must be indistinguishable
    let req_wrong_password = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(&json!({ "email": email, "password": "WrongPassword1" }))
        .to_request();
    let resp_wrong_password = test::call_service(&app, req_wrong_password).await;
    let status_wrong_password = resp_wrong_password.status();
    let body_wrong_password = test::read_body(resp_wrong_password).await;

    let req_unknown_email = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(&json!({ "email": "nobody@example.com", "password": "Password123!" }))
        .to_request();
    let resp_unknown_email = test::call_service(&app, req_unknown_email).await;
    let status_unknown_email = resp_unknown_email.status();
    let body_unknown_email = test::read_body(resp_unknown_email).await;

    assert_eq!(status_wrong_password, actix_web::http::StatusCode::UNAUTHORIZED);
    assert_eq!(status_unknown_email, actix_web::http::StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_wrong_password, body_unknown_email,
        "Login failures must not reveal which check failed"
    );

    cleanup_user(&pool, email).await;
}

#[actix_rt::test]
async fn test_email_is_normalized() {
    let Some((pool, database_url)) = connect().await else {
        return;
    };
    let email = "mixedcase@example.com";
    cleanup_user(&pool, email).await;

    let app = test_app!(pool, database_url);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&json!({
            "name": "Mixed Case",
            "email": "  MixedCase@Example.Com ",
            "password": "Password123!"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body_bytes = test::read_body(resp).await;
    assert_eq!(
        status,
        actix_web::http::StatusCode::CREATED,
        "Registration failed. Body: {:?}",
        String::from_utf8_lossy(&body_bytes)
    );
    let register_response: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(register_response["user"]["email"], email);

    // A differently-cased duplicate is still a duplicate
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&json!({
            "name": "Mixed Case",
            "email": "MIXEDCASE@EXAMPLE.COM",
            "password": "Password123!"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);

    // Login with the normalized form works
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(&json!({ "email": email, "password": "Password123!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);

    cleanup_user(&pool, email).await;
}

#[actix_rt::test]
async fn test_invalid_registration_inputs() {
    let Some((pool, database_url)) = connect().await else {
        return;
    };
    let app = test_app!(pool, database_url);

    let test_cases = vec![
        // Deserialization errors (expect 400 for missing fields)
        (
            json!({ "email": "test@example.com", "password": "Password123!" }),
            actix_web::http::StatusCode::BAD_REQUEST,
            "missing name",
        ),
        (
            json!({ "name": "Test User", "password": "Password123!" }),
            actix_web::http::StatusCode::BAD_REQUEST,
            "missing email",
        ),
        (
            json!({ "name": "Test User", "email": "test@example.com" }),
            actix_web::http::StatusCode::BAD_REQUEST,
            "missing password",
        ),
        // Validation errors (expect 422 for invalid formats/lengths after successful deserialization)
        (
            json!({ "name": "Test User", "email": "invalid-email", "password": "Password123!" }),
            actix_web::http::StatusCode::UNPROCESSABLE_ENTITY,
            "invalid email format",
        ),
        (
            json!({ "name": "T", "email": "test@example.com", "password": "Password123!" }),
            actix_web::http::StatusCode::UNPROCESSABLE_ENTITY,
            "name too short",
        ),
        (
            json!({ "name": "Test User", "email": "test@example.com", "password": "12345" }),
            actix_web::http::StatusCode::UNPROCESSABLE_ENTITY,
            "password too short",
        ),
    ];

    for (payload, expected_status, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&payload)
            .to_request();

        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body_bytes = test::read_body(resp).await;

        assert_eq!(
            status,
            expected_status,
            "Test case failed: {}. Expected {}, got {}. Body: {:?}",
            description,
            expected_status,
            status,
            String::from_utf8_lossy(&body_bytes)
        );
    }
}

#[actix_rt::test]
async fn test_access_guard_rejections() {
    let Some((pool, database_url)) = connect().await else {
        return;
    };
    let email = "guard_test_user@example.com";
    cleanup_user(&pool, email).await;

    let app = test_app!(pool, database_url);

    // Register a user to obtain a real token and subject id
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&json!({
            "name": "Guard User",
            "email": email,
            "password": "Password123!"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    let user_id: Uuid = body["user"]["id"].as_str().unwrap().parse().unwrap();

    // No credential at all
    let req = test::TestRequest::get().uri("/api/auth/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);

    // Garbage credential
    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .append_header(("Authorization", "Bearer not-a-real-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);

    // Expired credential, signed with the right secret
    let now = chrono::Utc::now().timestamp() as usize;
    let expired_claims = Claims {
        sub: user_id,
        iat: now - 120,
        exp: now - 60,
    };
    let expired_token = encode(
        &Header::default(),
        &expired_claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();
    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .append_header(("Authorization", format!("Bearer {}", expired_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body_bytes = test::read_body(resp).await;
    assert_eq!(status, actix_web::http::StatusCode::UNAUTHORIZED);
    // The body must not say the token expired
    assert!(!String::from_utf8_lossy(&body_bytes)
        .to_lowercase()
        .contains("expire"));

    // A valid credential resolves the identity, and does so consistently on
    // repeated requests
    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .append_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
        let me: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
        assert_eq!(me["id"].as_str().unwrap(), user_id.to_string());
        assert_eq!(me["email"], email);
    }

    // A token whose subject no longer exists is rejected
    cleanup_user(&pool, email).await;
    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .append_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
}
