use crate::{
    auth::{
        hash_password, verify_password, AuthResponse, CurrentUser, LoginRequest, RegisterRequest,
        TokenService,
    },
    config::Config,
    error::AppError,
    store,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Register a new user
///
/// Creates a new user account and returns a session token alongside the
/// public identity. The password is hashed before it goes anywhere near the
/// storage boundary; the plaintext is dropped with the request body.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    tokens: web::Data<TokenService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    register_data.validate()?;

    // Check if email already exists
    let existing_user = store::users::find_user_by_email(&pool, &register_data.email).await?;
    if existing_user.is_some() {
        return Err(AppError::BadRequest(
            "User already exists with this email".into(),
        ));
    }

    // Hash password at the configured cost
    let password_hash = hash_password(&register_data.password, config.bcrypt_cost)?;

    // Insert new user; a concurrent registration racing past the pre-check is
    // caught by the unique index and reported identically.
    let record = store::users::insert_user(
        &pool,
        register_data.name.trim(),
        &register_data.email,
        &password_hash,
    )
    .await?;

    let user = record.into_public();
    log::info!("registered user {}", user.id);

    // Issue token
    let token = tokens.issue(user.id)?;

    Ok(HttpResponse::Created().json(AuthResponse { token, user }))
}

/// Login user
///
/// Authenticates a user and returns a session token. An unknown email and a
/// wrong password produce byte-identical failures so the endpoint cannot be
/// used to enumerate accounts.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    login_data.validate()?;

    // Get user from storage
    let record = store::users::find_user_by_email(&pool, &login_data.email).await?;

    match record {
        Some(record) => {
            // Verify password
            if verify_password(&login_data.password, &record.password_hash)? {
                let user = record.into_public();
                let token = tokens.issue(user.id)?;
                Ok(HttpResponse::Ok().json(AuthResponse { token, user }))
            } else {
                log::debug!("login failed: password mismatch");
                Err(AppError::Unauthorized("Invalid credentials".into()))
            }
        }
        None => {
            log::debug!("login failed: unknown email");
            Err(AppError::Unauthorized("Invalid credentials".into()))
        }
    }
}

/// Get current user
///
/// Returns the public identity resolved by the authentication gate.
#[get("/me")]
pub async fn me(user: CurrentUser) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(user.into_inner()))
}
