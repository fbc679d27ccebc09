use crate::{
    auth::{jwt::generate_access_token, password::verify_password},
    config::Config,
    error::ApiError,
    model::{member::Member, member::MEMBER_COLUMNS, user::User},
    models::{LoginReqDto, LoginResponse},
    utils::validation::{Validator, normalize_email},
};
use actix_web::{HttpResponse, web};
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};

/// Login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Invalid credentials", body = Object, example = json!({
            "message": "Invalid credentials"
        })),
        (status = 403, description = "Account deactivated")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    // 1️⃣ Basic validation
    Validator::new()
        .email(&user.email, "email")
        .password(&user.password, "password")
        .finish()?;

    let email = normalize_email(&user.email);

    // 2️⃣ Fetch user
    let db_user = sqlx::query_as::<_, User>(
        "SELECT id, email, password, created_at FROM users WHERE email = ?",
    )
    .bind(&email)
    .fetch_optional(pool.get_ref())
    .await?;

    let Some(db_user) = db_user else {
        info!("Invalid credentials: user not found");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    };
    debug!(user_id = db_user.id, "User found");

    // 3️⃣ Verify password
    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    // 4️⃣ Resolve the member profile
    let member = sqlx::query_as::<_, Member>(&format!(
        "SELECT {MEMBER_COLUMNS} FROM members WHERE user_id = ?"
    ))
    .bind(db_user.id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::forbidden("No member profile"))?;

    if !member.is_active {
        info!(member_id = member.id, "Login refused: member inactive");
        return Err(ApiError::forbidden("Account is deactivated"));
    }

    // 5️⃣ Issue access token
    let (access_token, _) = generate_access_token(
        db_user.id,
        member.id,
        db_user.email.clone(),
        member.role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| ApiError::Internal(format!("token encoding failed: {e}")))?;

    info!(member_id = member.id, role = %member.role, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        role: member.role,
        dashboard: member.role.dashboard_path().to_string(),
    }))
}
