use chrono::NaiveDate;
use sqlx::MySqlPool;
use tracing::{error, info};

use crate::{
    auth::password::hash_password,
    db,
    error::{ApiError, is_integrity_violation},
    model::{member::Member, role::Role},
    utils::{email_filter, report_cache, validation::normalize_email},
};

/// Everything needed to create a login plus its member record.
pub struct NewAccount<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub full_name: &'a str,
    pub member_type: &'a str,
    pub department: &'a str,
    pub role: Role,
    pub total_required_hours: u32,
    pub start_date: NaiveDate,
}

/// Creates the user and member rows together. If the member insert fails the
/// user row is rolled back with it, so no orphaned login is left behind.
pub async fn create_account(pool: &MySqlPool, account: NewAccount<'_>) -> Result<Member, ApiError> {
    let email = normalize_email(account.email);

    if !email_filter::is_email_available(&email, pool).await {
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hashed = hash_password(account.password)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;

    let mut tx = pool.begin().await?;

    let user_id = match sqlx::query("INSERT INTO users (email, password) VALUES (?, ?)")
        .bind(&email)
        .bind(&hashed)
        .execute(&mut *tx)
        .await
    {
        Ok(done) => done.last_insert_id(),
        Err(e) if is_integrity_violation(&e) => {
            return Err(ApiError::Conflict("Email already registered".into()));
        }
        Err(e) => return Err(e.into()),
    };

    let inserted = sqlx::query(
        r#"
        INSERT INTO members
            (user_id, full_name, member_type, department, role, total_required_hours, start_date, is_active)
        VALUES (?, ?, ?, ?, ?, ?, ?, TRUE)
        "#,
    )
    .bind(user_id)
    .bind(account.full_name.trim())
    .bind(account.member_type.trim())
    .bind(account.department.trim())
    .bind(account.role.as_ref())
    .bind(account.total_required_hours)
    .bind(account.start_date)
    .execute(&mut *tx)
    .await;

    let member_id = match inserted {
        Ok(done) => done.last_insert_id(),
        Err(e) => {
            // dropping `tx` rolls back the user insert
            error!(error = %e, user_id, "Member creation failed, discarding user");
            return Err(e.into());
        }
    };

    tx.commit().await?;

    email_filter::insert(&email);
    report_cache::invalidate_all();
    info!(member_id, role = %account.role, "Account registered");

    db::find_member(pool, member_id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("member {member_id} missing after insert")))
}
