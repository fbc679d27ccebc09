use crate::{
    api::registration::{NewAccount, create_account},
    auth::auth::AuthUser,
    config::Config,
    db,
    error::ApiError,
    model::{department::MANAGEMENT, role::Role},
    utils::{
        hours::department_performance as rollup,
        report_cache::{self, Report, ReportKey},
        validation::{MIN_MEMBER_TYPE_LEN, MIN_NAME_LEN, Validator},
    },
};
use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::{debug, info};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct RegisterExecutive {
    #[schema(example = "Maria Santos")]
    pub full_name: String,
    #[schema(example = "maria@example.com", format = "email")]
    pub email: String,
    #[schema(example = "secret123")]
    pub password: String,
    #[schema(example = "Chief Executive Officer")]
    pub member_type: String,
}

impl RegisterExecutive {
    fn validate(&self) -> Result<(), ApiError> {
        Validator::new()
            .min_len(&self.full_name, MIN_NAME_LEN, "full_name", "Full name is required")
            .email(&self.email, "email")
            .password(&self.password, "password")
            .min_len(&self.member_type, MIN_MEMBER_TYPE_LEN, "member_type", "Position is required")
            .finish()
    }
}

/// Register an executive
#[utoipa::path(
    post,
    path = "/api/executives",
    request_body = RegisterExecutive,
    responses(
        (status = 201, description = "Executive registered", body = Member),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Email already registered")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Executive"
)]
pub async fn register_executive(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<RegisterExecutive>,
) -> Result<impl Responder, ApiError> {
    auth.require_super()?;

    payload.validate()?;

    let member = create_account(
        pool.get_ref(),
        NewAccount {
            email: &payload.email,
            password: &payload.password,
            full_name: &payload.full_name,
            member_type: &payload.member_type,
            department: MANAGEMENT,
            role: Role::Super,
            total_required_hours: 0,
            start_date: config.attendance_window.local_date(Utc::now()),
        },
    )
    .await?;

    info!(member_id = member.id, registered_by = auth.member_id, "Executive registered");

    Ok(HttpResponse::Created().json(member))
}

/// Hours and completion rolled up per department
#[utoipa::path(
    get,
    path = "/api/departments/performance",
    responses(
        (status = 200, description = "Department rollups sorted by name", body = [crate::utils::hours::DepartmentPerformance]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Executive"
)]
pub async fn department_performance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, ApiError> {
    auth.require_super()?;

    if let Some(cached) = report_cache::get(ReportKey::Departments).await {
        if let Report::Departments(rows) = cached.as_ref() {
            debug!("Department performance served from cache");
            return Ok(HttpResponse::Ok().json(rows));
        }
    }

    let members = db::tracked_members(pool.get_ref()).await?;
    let hours = db::rendered_hours(pool.get_ref(), None).await?;
    let rows = rollup(&members, &hours);

    report_cache::put(ReportKey::Departments, Report::Departments(rows.clone())).await;

    Ok(HttpResponse::Ok().json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executive() -> RegisterExecutive {
        RegisterExecutive {
            full_name: "Maria Santos".into(),
            email: "maria@example.com".into(),
            password: "secret123".into(),
            member_type: "Chief Executive Officer".into(),
        }
    }

    #[test]
    fn accepts_complete_registration() {
        assert!(executive().validate().is_ok());
    }

    #[test]
    fn position_must_be_named() {
        let mut reg = executive();
        reg.member_type = "CEO".into();

        match reg.validate().unwrap_err() {
            ApiError::Validation(issues) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].field, "member_type");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
