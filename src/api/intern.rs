use crate::{
    api::{
        attendance::clamp_limit,
        registration::{NewAccount, create_account},
    },
    auth::auth::AuthUser,
    db,
    error::ApiError,
    model::{
        department,
        member::{MEMBER_COLUMNS, Member},
        role::Role,
    },
    utils::{
        db_utils::{ColumnKind, build_update_sql, execute_update},
        hours::MemberProgress,
        report_cache,
        validation::{
            MAX_REQUIRED_HOURS, MIN_DEPARTMENT_LEN, MIN_MEMBER_TYPE_LEN, MIN_NAME_LEN, Validator,
        },
    },
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct RegisterIntern {
    #[schema(example = "Juan Dela Cruz")]
    pub full_name: String,
    #[schema(example = "juan@example.com", format = "email")]
    pub email: String,
    #[schema(example = "temp1234")]
    pub temporary_password: String,
    #[schema(example = "IT")]
    pub department: String,
    /// Defaults to the department catalogue's member type
    #[schema(example = "IT Intern")]
    pub member_type: Option<String>,
    /// Defaults to the department catalogue's role; `super` is not allowed here
    pub role: Option<Role>,
    #[schema(example = 486)]
    pub required_hours: u32,
    #[schema(example = "2026-02-02", value_type = String, format = "date")]
    pub start_date: NaiveDate,
}

/// Fully resolved registration after catalogue defaults are applied.
#[derive(Debug)]
struct ResolvedIntern<'a> {
    member_type: &'a str,
    role: Role,
}

impl RegisterIntern {
    fn resolve(&self) -> Result<ResolvedIntern<'_>, ApiError> {
        let catalogue = department::lookup(&self.department);
        let member_type = self
            .member_type
            .as_deref()
            .or(catalogue.map(|d| d.member_type))
            .unwrap_or("");
        let role = self.role.or(catalogue.map(|d| d.default_role));

        Validator::new()
            .min_len(&self.full_name, MIN_NAME_LEN, "full_name", "Full name is required")
            .email(&self.email, "email")
            .password(&self.temporary_password, "temporary_password")
            .min_len(&self.department, MIN_DEPARTMENT_LEN, "department", "Department is required")
            .min_len(member_type, MIN_MEMBER_TYPE_LEN, "member_type", "Type is required")
            .check(role.is_some(), "role", "Role is required")
            .check(role != Some(Role::Super), "role", "Role must be member or admin")
            .check(
                (1..=MAX_REQUIRED_HOURS).contains(&self.required_hours),
                "required_hours",
                "Required hours must be between 1 and 9999",
            )
            .finish()?;

        Ok(ResolvedIntern {
            member_type,
            role: role.unwrap_or(Role::Member),
        })
    }
}

#[derive(Deserialize, Serialize, ToSchema, Default)]
pub struct UpdateIntern {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_required_hours: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "2026-02-02", value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

const EDITABLE_COLUMNS: [(&str, ColumnKind); 7] = [
    ("full_name", ColumnKind::Text),
    ("member_type", ColumnKind::Text),
    ("department", ColumnKind::Text),
    ("role", ColumnKind::Text),
    ("total_required_hours", ColumnKind::UInt),
    ("start_date", ColumnKind::Date),
    ("is_active", ColumnKind::Bool),
];

impl UpdateIntern {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        if let Some(name) = &self.full_name {
            v.min_len(name, MIN_NAME_LEN, "full_name", "Full name is required");
        }
        if let Some(member_type) = &self.member_type {
            v.min_len(member_type, MIN_MEMBER_TYPE_LEN, "member_type", "Type is required");
        }
        if let Some(dept) = &self.department {
            v.min_len(dept, MIN_DEPARTMENT_LEN, "department", "Department is required");
        }
        if let Some(role) = self.role {
            v.check(role != Role::Super, "role", "Role must be member or admin");
        }
        if let Some(hours) = self.total_required_hours {
            v.check(
                (1..=MAX_REQUIRED_HOURS).contains(&hours),
                "total_required_hours",
                "Required hours must be between 1 and 9999",
            );
        }
        v.finish()
    }
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "id": 3,
    "full_name": "Juan Dela Cruz",
    "department": "IT",
    "member_type": "IT Intern",
    "role": "member",
    "is_active": true,
    "hours_rendered": 120.5,
    "total_required": 486,
    "completion_percentage": 25,
    "hours": "121/486",
    "progress": "25%"
}))]
pub struct InternSummary {
    pub id: u64,
    pub full_name: String,
    pub department: String,
    pub member_type: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(flatten)]
    pub progress: MemberProgress,
}

impl InternSummary {
    fn new(member: Member, rendered: f64) -> Self {
        let progress = MemberProgress::new(rendered, member.total_required_hours);
        InternSummary {
            id: member.id,
            full_name: member.full_name,
            department: member.department,
            member_type: member.member_type,
            role: member.role,
            is_active: member.is_active,
            progress,
        }
    }
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct OverviewQuery {
    /// Number of active interns (default 3, max 50)
    pub limit: Option<u32>,
}

/// Register an intern
#[utoipa::path(
    post,
    path = "/api/interns",
    request_body = RegisterIntern,
    responses(
        (status = 201, description = "Intern registered", body = Member),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Email already registered", body = Object, example = json!({
            "message": "Email already registered"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Intern"
)]
pub async fn register_intern(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<RegisterIntern>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let resolved = payload.resolve()?;

    let member = create_account(
        pool.get_ref(),
        NewAccount {
            email: &payload.email,
            password: &payload.temporary_password,
            full_name: &payload.full_name,
            member_type: resolved.member_type,
            department: &payload.department,
            role: resolved.role,
            total_required_hours: payload.required_hours,
            start_date: payload.start_date,
        },
    )
    .await?;

    info!(member_id = member.id, registered_by = auth.member_id, "Intern registered");

    Ok(HttpResponse::Created().json(member))
}

/// List interns with hours and progress, newest first
#[utoipa::path(
    get,
    path = "/api/interns",
    responses(
        (status = 200, description = "Interns", body = [InternSummary]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Intern"
)]
pub async fn list_interns(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin_or_super()?;

    let members = sqlx::query_as::<_, Member>(&format!(
        "SELECT {MEMBER_COLUMNS} FROM members WHERE role IN ('member', 'admin') \
         ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool.get_ref())
    .await?;

    let hours = db::rendered_hours(pool.get_ref(), None).await?;

    let interns: Vec<InternSummary> = members
        .into_iter()
        .map(|m| {
            let rendered = hours.get(&m.id).copied().unwrap_or(0.0);
            InternSummary::new(m, rendered)
        })
        .collect();

    Ok(HttpResponse::Ok().json(interns))
}

/// A few active interns with their progress, for the admin overview card
#[utoipa::path(
    get,
    path = "/api/interns/overview",
    params(OverviewQuery),
    responses(
        (status = 200, description = "Intern overview", body = [InternSummary]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Intern"
)]
pub async fn intern_overview(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<OverviewQuery>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin_or_super()?;

    let limit = clamp_limit(query.limit, 3, 50);

    let members = sqlx::query_as::<_, Member>(&format!(
        "SELECT {MEMBER_COLUMNS} FROM members WHERE role IN ('member', 'admin') AND is_active = TRUE \
         ORDER BY id LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool.get_ref())
    .await?;

    let ids: Vec<u64> = members.iter().map(|m| m.id).collect();
    let hours = db::rendered_hours(pool.get_ref(), Some(&ids)).await?;

    let overview: Vec<InternSummary> = members
        .into_iter()
        .map(|m| {
            let rendered = hours.get(&m.id).copied().unwrap_or(0.0);
            InternSummary::new(m, rendered)
        })
        .collect();

    Ok(HttpResponse::Ok().json(overview))
}

/// Edit an intern record
#[utoipa::path(
    put,
    path = "/api/interns/{member_id}",
    params(
        ("member_id" = u64, Path, description = "Member ID")
    ),
    request_body = UpdateIntern,
    responses(
        (status = 200, description = "Intern updated", body = Member),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Intern not found", body = Object, example = json!({
            "message": "Intern not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Intern"
)]
pub async fn update_intern(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateIntern>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let member_id = path.into_inner();
    if body.is_active == Some(false) {
        refuse_self_deactivation(&auth, member_id)?;
    }
    find_intern(pool.get_ref(), member_id).await?;

    body.validate()?;

    let payload = serde_json::to_value(&*body)
        .map_err(|e| ApiError::Internal(format!("update payload encoding failed: {e}")))?;
    let update = build_update_sql("members", &payload, &EDITABLE_COLUMNS, "id", member_id)?;

    execute_update(pool.get_ref(), update).await?;

    report_cache::invalidate_all();
    info!(member_id, updated_by = auth.member_id, "Intern updated");

    let member = find_intern(pool.get_ref(), member_id).await?;
    Ok(HttpResponse::Ok().json(member))
}

/// Deactivate an intern (soft delete)
#[utoipa::path(
    delete,
    path = "/api/interns/{member_id}",
    params(
        ("member_id" = u64, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Intern deactivated", body = Object, example = json!({
            "message": "Intern deactivated"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Intern not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Intern"
)]
pub async fn deactivate_intern(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let member_id = path.into_inner();
    refuse_self_deactivation(&auth, member_id)?;
    find_intern(pool.get_ref(), member_id).await?;

    sqlx::query("UPDATE members SET is_active = FALSE WHERE id = ?")
        .bind(member_id)
        .execute(pool.get_ref())
        .await?;

    report_cache::invalidate_all();
    info!(member_id, deactivated_by = auth.member_id, "Intern deactivated");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Intern deactivated"
    })))
}

fn refuse_self_deactivation(auth: &AuthUser, member_id: u64) -> Result<(), ApiError> {
    if member_id == auth.member_id {
        return Err(ApiError::bad_request("You cannot deactivate your own account"));
    }
    Ok(())
}

/// Member row that admins may manage; executives are out of reach.
async fn find_intern(pool: &MySqlPool, member_id: u64) -> Result<Member, ApiError> {
    match db::find_member(pool, member_id).await? {
        Some(m) if m.role.is_tracked() => Ok(m),
        _ => Err(ApiError::not_found("Intern not found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> RegisterIntern {
        RegisterIntern {
            full_name: "Juan Dela Cruz".into(),
            email: "juan@example.com".into(),
            temporary_password: "temp1234".into(),
            department: "IT".into(),
            member_type: None,
            role: None,
            required_hours: 486,
            start_date: NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
        }
    }

    fn issue_fields(err: ApiError) -> Vec<&'static str> {
        match err {
            ApiError::Validation(issues) => issues.into_iter().map(|i| i.field).collect(),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn catalogue_fills_type_and_role() {
        let mut reg = registration();
        reg.department = "HR".into();

        let resolved = reg.resolve().unwrap();
        assert_eq!(resolved.member_type, "HR Intern");
        assert_eq!(resolved.role, Role::Admin);
    }

    #[test]
    fn explicit_values_win_over_catalogue() {
        let mut reg = registration();
        reg.member_type = Some("Backend Intern".into());
        reg.role = Some(Role::Admin);

        let resolved = reg.resolve().unwrap();
        assert_eq!(resolved.member_type, "Backend Intern");
        assert_eq!(resolved.role, Role::Admin);
    }

    #[test]
    fn unknown_department_needs_type_and_role() {
        let mut reg = registration();
        reg.department = "Finance".into();

        let fields = issue_fields(reg.resolve().unwrap_err());
        assert_eq!(fields, ["member_type", "role"]);
    }

    #[test]
    fn interns_cannot_be_registered_as_executives() {
        let mut reg = registration();
        reg.role = Some(Role::Super);

        assert_eq!(issue_fields(reg.resolve().unwrap_err()), ["role"]);
    }

    #[test]
    fn required_hours_must_be_in_range() {
        let mut reg = registration();
        reg.required_hours = 0;
        assert_eq!(issue_fields(reg.resolve().unwrap_err()), ["required_hours"]);

        reg.required_hours = 10_000;
        assert_eq!(issue_fields(reg.resolve().unwrap_err()), ["required_hours"]);
    }

    #[test]
    fn update_validation_checks_only_present_fields() {
        assert!(UpdateIntern::default().validate().is_ok());

        let update = UpdateIntern {
            full_name: Some("Al".into()),
            role: Some(Role::Super),
            ..Default::default()
        };
        assert_eq!(issue_fields(update.validate().unwrap_err()), ["full_name", "role"]);
    }

    #[test]
    fn update_serializes_only_present_fields() {
        let update = UpdateIntern {
            role: Some(Role::Admin),
            is_active: Some(false),
            ..Default::default()
        };
        let payload = serde_json::to_value(&update).unwrap();
        let built = build_update_sql("members", &payload, &EDITABLE_COLUMNS, "id", 4).unwrap();

        assert_eq!(built.sql, "UPDATE members SET role = ?, is_active = ? WHERE id = ?");
    }

    #[test]
    fn summary_flattens_progress() {
        let member = Member {
            id: 3,
            user_id: 7,
            full_name: "Juan Dela Cruz".into(),
            member_type: "IT Intern".into(),
            department: "IT".into(),
            role: Role::Member,
            total_required_hours: 486,
            start_date: NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
            is_active: true,
            created_at: chrono::Utc::now(),
        };

        let json = serde_json::to_value(InternSummary::new(member, 120.6)).unwrap();
        assert_eq!(json["hours"], "121/486");
        assert_eq!(json["progress"], "25%");
        assert_eq!(json["role"], "member");
    }

    fn admin(member_id: u64) -> AuthUser {
        AuthUser {
            user_id: member_id,
            member_id,
            email: "admin@example.com".into(),
            role: Role::Admin,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn admins_cannot_deactivate_themselves_through_an_edit(pool: MySqlPool) {
        let me = crate::db::fixtures::member(&pool, "admin@example.com", Role::Admin, "HR", 300).await;
        let data = web::Data::new(pool.clone());

        let edit = UpdateIntern {
            is_active: Some(false),
            ..Default::default()
        };
        let result = update_intern(admin(me), data.clone(), web::Path::from(me), web::Json(edit)).await;
        assert!(matches!(result.err(), Some(ApiError::BadRequest(_))));

        let removed = deactivate_intern(admin(me), data, web::Path::from(me)).await;
        assert!(matches!(removed.err(), Some(ApiError::BadRequest(_))));

        let member = crate::db::find_member(&pool, me).await.unwrap().unwrap();
        assert!(member.is_active);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn other_edits_of_own_record_are_allowed(pool: MySqlPool) {
        let me = crate::db::fixtures::member(&pool, "admin@example.com", Role::Admin, "HR", 300).await;

        let edit = UpdateIntern {
            full_name: Some("Ana Reyes Santos".into()),
            is_active: Some(true),
            ..Default::default()
        };
        let result = update_intern(admin(me), web::Data::new(pool.clone()), web::Path::from(me), web::Json(edit)).await;
        assert!(result.is_ok());

        let member = crate::db::find_member(&pool, me).await.unwrap().unwrap();
        assert_eq!(member.full_name, "Ana Reyes Santos");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn executives_are_not_editable_as_interns(pool: MySqlPool) {
        let me = crate::db::fixtures::member(&pool, "admin@example.com", Role::Admin, "HR", 300).await;
        let exec = crate::db::fixtures::member(&pool, "exec@example.com", Role::Super, "Management", 0).await;

        let removed = deactivate_intern(admin(me), web::Data::new(pool.clone()), web::Path::from(exec)).await;
        assert!(matches!(removed.err(), Some(ApiError::NotFound(_))));
    }
}
