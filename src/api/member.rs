use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    config::Config,
    db,
    error::ApiError,
    model::{
        attendance::AttendanceLog,
        department::CATALOGUE,
        member::Member,
    },
    utils::{
        attendance_window::today_hours,
        hours::{completion_percentage, hours_remaining, hours_rendered},
    },
};

#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "total_required": 486,
    "hours_rendered": 120.5,
    "hours_remaining": 365.5,
    "completion_percentage": 25,
    "today_hours": 3.25,
    "is_clocked_in": true,
    "current_attendance_id": 12
}))]
pub struct MemberStats {
    pub total_required: u32,
    pub hours_rendered: f64,
    pub hours_remaining: f64,
    pub completion_percentage: u32,
    pub today_hours: f64,
    pub is_clocked_in: bool,
    /// Open log of today (or of a shift carried over from yesterday), if any
    pub current_attendance_id: Option<u64>,
}

impl MemberStats {
    pub fn new(
        member: &Member,
        rendered: f64,
        today: Option<&AttendanceLog>,
        now: DateTime<Utc>,
    ) -> Self {
        let open = today.filter(|log| log.is_open());
        MemberStats {
            total_required: member.total_required_hours,
            hours_rendered: rendered,
            hours_remaining: hours_remaining(rendered, member.total_required_hours),
            completion_percentage: completion_percentage(rendered, member.total_required_hours),
            today_hours: today_hours(now, today),
            is_clocked_in: open.is_some(),
            current_attendance_id: open.map(|log| log.id),
        }
    }
}

async fn current_member(pool: &MySqlPool, auth: &AuthUser) -> Result<Member, ApiError> {
    db::find_member(pool, auth.member_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Member not found"))
}

/// Member profile of the caller
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current member", body = Member),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Member not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Member"
)]
pub async fn me(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<impl Responder, ApiError> {
    let member = current_member(pool.get_ref(), &auth).await?;
    Ok(HttpResponse::Ok().json(member))
}

/// Hours progress of the caller
#[utoipa::path(
    get,
    path = "/api/me/stats",
    responses(
        (status = 200, description = "Hours progress", body = MemberStats),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Member not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Member"
)]
pub async fn my_stats(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<impl Responder, ApiError> {
    let member = current_member(pool.get_ref(), &auth).await?;

    let rendered = if member.role.is_tracked() {
        hours_rendered(&db::approved_logs(pool.get_ref(), member.id).await?)
    } else {
        0.0
    };

    let now = Utc::now();
    let date = config.attendance_window.local_date(now);
    let current = db::find_time_out_log(pool.get_ref(), member.id, date).await?;

    Ok(HttpResponse::Ok().json(MemberStats::new(&member, rendered, current.as_ref(), now)))
}

/// Departments an intern can be registered under
#[utoipa::path(
    get,
    path = "/api/departments",
    responses(
        (status = 200, description = "Department catalogue", body = [crate::model::department::Department]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Member"
)]
pub async fn departments(_auth: AuthUser) -> impl Responder {
    HttpResponse::Ok().json(CATALOGUE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{attendance::AttendanceStatus, role::Role};
    use chrono::{NaiveDate, TimeZone};

    fn member() -> Member {
        Member {
            id: 3,
            user_id: 7,
            full_name: "Juan Dela Cruz".into(),
            member_type: "IT Intern".into(),
            department: "IT".into(),
            role: Role::Member,
            total_required_hours: 486,
            start_date: NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn log(time_out: Option<DateTime<Utc>>) -> AttendanceLog {
        AttendanceLog {
            id: 12,
            member_id: 3,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            time_in: Utc.with_ymd_and_hms(2026, 3, 2, 1, 0, 0).unwrap(),
            time_out,
            time_in_photo_url: "https://storage.example.com/in.jpg".into(),
            time_out_photo_url: None,
            status: AttendanceStatus::Pending,
            approved_by: None,
            approved_at: None,
        }
    }

    #[test]
    fn clocked_in_member_reports_elapsed_time() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 4, 15, 0).unwrap();
        let open = log(None);

        let stats = MemberStats::new(&member(), 120.6, Some(&open), now);
        assert!(stats.is_clocked_in);
        assert_eq!(stats.current_attendance_id, Some(12));
        assert_eq!(stats.today_hours, 3.25);
        assert_eq!(stats.completion_percentage, 25);
        assert!((stats.hours_remaining - 365.4).abs() < 1e-9);
    }

    #[test]
    fn closed_day_is_not_clocked_in() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        let closed = log(Some(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()));

        let stats = MemberStats::new(&member(), 0.0, Some(&closed), now);
        assert!(!stats.is_clocked_in);
        assert_eq!(stats.current_attendance_id, None);
        assert_eq!(stats.today_hours, 8.0);
    }

    #[test]
    fn no_log_means_no_hours_today() {
        let stats = MemberStats::new(&member(), 500.0, None, Utc::now());
        assert_eq!(stats.today_hours, 0.0);
        assert_eq!(stats.hours_remaining, 0.0);
        assert_eq!(stats.completion_percentage, 103);
    }
}
