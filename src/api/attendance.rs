use crate::{
    auth::auth::AuthUser,
    config::Config,
    db,
    error::{ApiError, is_integrity_violation},
    model::attendance::{ATTENDANCE_COLUMNS, AttendanceLog, AttendanceStatus},
    utils::{
        attendance_window::{Availability, Unavailable},
        report_cache,
    },
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, MySqlPool};
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

const MAX_PHOTO_URL_LEN: usize = 2048;

#[derive(Deserialize, ToSchema)]
pub struct PhotoPayload {
    /// URL of the photo captured at time-in/time-out
    #[schema(example = "https://storage.example.com/attendance-photos/7/time_in_1772413091.jpg")]
    pub photo_url: String,
}

impl PhotoPayload {
    fn validated(&self) -> Result<&str, ApiError> {
        let url = self.photo_url.trim();
        if url.is_empty() {
            return Err(ApiError::bad_request("photo_url is required"));
        }
        if url.len() > MAX_PHOTO_URL_LEN {
            return Err(ApiError::bad_request("photo_url is too long"));
        }
        Ok(url)
    }
}

#[derive(Serialize, ToSchema)]
pub struct TodayResponse {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub log: Option<AttendanceLog>,
    pub availability: Availability,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    /// Number of most recent logs (default 10, max 100)
    pub limit: Option<u32>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LogFilter {
    /// Filter by approval status
    pub status: Option<AttendanceStatus>,
    /// Filter by member
    pub member_id: Option<u64>,
    /// Number of most recent logs (default 50, max 200)
    pub limit: Option<u32>,
}

#[derive(FromRow)]
struct LogRow {
    id: u64,
    member_id: u64,
    full_name: String,
    department: String,
    date: NaiveDate,
    time_in: DateTime<Utc>,
    time_out: Option<DateTime<Utc>>,
    #[sqlx(try_from = "String")]
    status: AttendanceStatus,
    time_in_photo_url: String,
    time_out_photo_url: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "id": 12,
    "member_id": 3,
    "full_name": "Juan Dela Cruz",
    "department": "IT",
    "type": "Time Out",
    "date": "2026-03-02",
    "time": "2026-03-02T09:03:40Z",
    "time_in": "2026-03-02T00:58:11Z",
    "time_out": "2026-03-02T09:03:40Z",
    "status": "pending",
    "time_in_photo_url": "https://storage.example.com/attendance-photos/7/time_in_1772413091.jpg",
    "time_out_photo_url": "https://storage.example.com/attendance-photos/7/time_out_1772442220.jpg"
}))]
pub struct AttendanceEntry {
    pub id: u64,
    pub member_id: u64,
    pub full_name: String,
    pub department: String,
    /// "Time In" while the log is open, "Time Out" once closed
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "Time Out")]
    pub entry_type: &'static str,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    /// Latest event of the day
    #[schema(value_type = String, format = "date-time")]
    pub time: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub time_in: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub time_out: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
    pub time_in_photo_url: String,
    pub time_out_photo_url: Option<String>,
}

impl From<LogRow> for AttendanceEntry {
    fn from(row: LogRow) -> Self {
        let entry_type = if row.time_out.is_some() { "Time Out" } else { "Time In" };
        AttendanceEntry {
            id: row.id,
            member_id: row.member_id,
            full_name: row.full_name,
            department: row.department,
            entry_type,
            date: row.date,
            time: row.time_out.unwrap_or(row.time_in),
            time_in: row.time_in,
            time_out: row.time_out,
            status: row.status,
            time_in_photo_url: row.time_in_photo_url,
            time_out_photo_url: row.time_out_photo_url,
        }
    }
}

fn unavailable(reason: Unavailable) -> ApiError {
    match reason {
        Unavailable::Inactive => ApiError::forbidden(reason.message()),
        _ => ApiError::bad_request(reason.message()),
    }
}

/// Time-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/time-in",
    request_body = PhotoPayload,
    responses(
        (status = 201, description = "Timed in successfully", body = AttendanceLog),
        (status = 400, description = "Already timed in today or outside the time-in window", body = Object, example = json!({
            "message": "Already timed in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Member inactive or missing"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn time_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<PhotoPayload>,
) -> Result<impl Responder, ApiError> {
    let photo_url = payload.validated()?;
    let member = db::find_member(pool.get_ref(), auth.member_id)
        .await?
        .ok_or_else(|| ApiError::forbidden("No member profile"))?;

    let window = &config.attendance_window;
    let now = Utc::now();
    let date = window.local_date(now);
    let today = db::find_log_for_day(pool.get_ref(), member.id, date).await?;

    window
        .check_time_in(now, today.as_ref(), member.is_active)
        .map_err(unavailable)?;

    let attendance_id = insert_time_in(pool.get_ref(), member.id, date, now, photo_url).await?;

    info!(member_id = member.id, attendance_id, %date, "Timed in");

    let log = db::find_log_for_day(pool.get_ref(), member.id, date)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("attendance {attendance_id} vanished after insert")))?;

    Ok(HttpResponse::Created().json(log))
}

/// Inserts today's pending log. The `(member_id, date)` key turns a racing
/// second time-in into "Already timed in today".
async fn insert_time_in(
    pool: &MySqlPool,
    member_id: u64,
    date: NaiveDate,
    now: DateTime<Utc>,
    photo_url: &str,
) -> Result<u64, ApiError> {
    let result = sqlx::query(
        r#"
        INSERT INTO attendance_logs (member_id, date, time_in, time_in_photo_url, status)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(member_id)
    .bind(date)
    .bind(now)
    .bind(photo_url)
    .bind(AttendanceStatus::Pending.as_ref())
    .execute(pool)
    .await;

    match result {
        Ok(done) => Ok(done.last_insert_id()),
        Err(e) if is_integrity_violation(&e) => Err(unavailable(Unavailable::AlreadyTimedIn)),
        Err(e) => Err(e.into()),
    }
}

/// Time-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance/time-out",
    request_body = PhotoPayload,
    responses(
        (status = 200, description = "Timed out successfully", body = AttendanceLog),
        (status = 400, description = "No active time in found for today", body = Object, example = json!({
            "message": "No active time in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn time_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<PhotoPayload>,
) -> Result<impl Responder, ApiError> {
    let photo_url = payload.validated()?;
    let window = &config.attendance_window;
    let now = Utc::now();
    let date = window.local_date(now);

    let open = db::find_time_out_log(pool.get_ref(), auth.member_id, date).await?;
    window.check_time_out(open.as_ref()).map_err(unavailable)?;
    let Some(open) = open else {
        return Err(unavailable(Unavailable::NotTimedIn));
    };

    let result = sqlx::query(
        r#"
        UPDATE attendance_logs
        SET time_out = ?, time_out_photo_url = ?
        WHERE id = ?
        AND time_out IS NULL
        "#,
    )
    .bind(now)
    .bind(photo_url)
    .bind(open.id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(unavailable(Unavailable::AlreadyTimedOut));
    }

    report_cache::invalidate_all();
    info!(member_id = auth.member_id, attendance_id = open.id, date = %open.date, "Timed out");

    let log = db::find_log(pool.get_ref(), open.id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("attendance {} vanished after time-out", open.id)))?;

    Ok(HttpResponse::Ok().json(log))
}

/// Today's log and whether time-in / time-out are available
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's attendance state", body = TodayResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No member profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<impl Responder, ApiError> {
    let member = db::find_member(pool.get_ref(), auth.member_id)
        .await?
        .ok_or_else(|| ApiError::forbidden("No member profile"))?;

    let window = &config.attendance_window;
    let now = Utc::now();
    let date = window.local_date(now);
    let log = db::find_log_for_day(pool.get_ref(), member.id, date).await?;
    let open = match &log {
        Some(_) => None,
        None => db::find_time_out_log(pool.get_ref(), member.id, date).await?,
    };
    let time_out_log = log.as_ref().or(open.as_ref());
    let availability = window.availability(now, log.as_ref(), time_out_log, member.is_active);

    Ok(HttpResponse::Ok().json(TodayResponse {
        date,
        log,
        availability,
    }))
}

/// Caller's recent attendance, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Recent attendance logs", body = [AttendanceLog]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<HistoryQuery>,
) -> Result<impl Responder, ApiError> {
    let limit = clamp_limit(query.limit, 10, 100);

    let logs = sqlx::query_as::<_, AttendanceLog>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance_logs WHERE member_id = ? \
         ORDER BY date DESC, time_in DESC LIMIT ?"
    ))
    .bind(auth.member_id)
    .bind(limit)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(logs))
}

/// Latest attendance logs for review (executives' own logs are excluded)
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(LogFilter),
    responses(
        (status = 200, description = "Attendance logs", body = [AttendanceEntry]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_logs(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LogFilter>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin_or_super()?;

    let entries = fetch_entries(pool.get_ref(), &query).await?;

    Ok(HttpResponse::Ok().json(entries))
}

async fn fetch_entries(pool: &MySqlPool, query: &LogFilter) -> Result<Vec<AttendanceEntry>, ApiError> {
    let limit = clamp_limit(query.limit, 50, 200);

    let mut where_sql = String::from(" WHERE m.role <> 'super'");
    if query.status.is_some() {
        where_sql.push_str(" AND a.status = ?");
    }
    if query.member_id.is_some() {
        where_sql.push_str(" AND a.member_id = ?");
    }

    let data_sql = format!(
        r#"
        SELECT a.id, a.member_id, m.full_name, m.department, a.date, a.time_in, a.time_out,
               a.status, a.time_in_photo_url, a.time_out_photo_url
        FROM attendance_logs a
        JOIN members m ON m.id = a.member_id
        {}
        ORDER BY a.date DESC, a.time_in DESC
        LIMIT ?
        "#,
        where_sql
    );
    debug!(sql = %data_sql, limit, "Fetching attendance logs");

    let mut data_q = sqlx::query_as::<_, LogRow>(&data_sql);
    if let Some(status) = query.status {
        data_q = data_q.bind(status.as_ref().to_string());
    }
    if let Some(member_id) = query.member_id {
        data_q = data_q.bind(member_id);
    }

    let rows = data_q.bind(limit).fetch_all(pool).await?;
    Ok(rows.into_iter().map(AttendanceEntry::from).collect())
}

/// Approve a pending attendance log
#[utoipa::path(
    put,
    path = "/api/attendance/{attendance_id}/approve",
    params(
        ("attendance_id" = u64, Path, description = "ID of the attendance log to approve")
    ),
    responses(
        (status = 200, description = "Attendance approved", body = Object, example = json!({
            "message": "Attendance approved"
        })),
        (status = 400, description = "Attendance already processed", body = Object, example = json!({
            "message": "Attendance already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Attendance not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn approve(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let attendance_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE attendance_logs
        SET status = 'approved', approved_by = ?, approved_at = ?
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(auth.member_id)
    .bind(Utc::now())
    .bind(attendance_id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(not_pending(pool.get_ref(), attendance_id).await);
    }

    report_cache::invalidate_all();
    info!(attendance_id, approved_by = auth.member_id, "Attendance approved");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance approved"
    })))
}

/// Reject a pending attendance log
#[utoipa::path(
    put,
    path = "/api/attendance/{attendance_id}/reject",
    params(
        ("attendance_id" = u64, Path, description = "ID of the attendance log to reject")
    ),
    responses(
        (status = 200, description = "Attendance rejected", body = Object, example = json!({
            "message": "Attendance rejected"
        })),
        (status = 400, description = "Attendance already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Attendance not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn reject(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let attendance_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE attendance_logs
        SET status = 'rejected'
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(attendance_id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(not_pending(pool.get_ref(), attendance_id).await);
    }

    report_cache::invalidate_all();
    info!(attendance_id, rejected_by = auth.member_id, "Attendance rejected");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance rejected"
    })))
}

/// Distinguish "no such log" from "already decided" after a no-op status update.
async fn not_pending(pool: &MySqlPool, attendance_id: u64) -> ApiError {
    let found = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM attendance_logs WHERE id = ?")
        .bind(attendance_id)
        .fetch_one(pool)
        .await;

    match found {
        Ok(0) => ApiError::not_found("Attendance not found"),
        Ok(_) => ApiError::bad_request("Attendance already processed"),
        Err(e) => e.into(),
    }
}

pub(crate) fn clamp_limit(requested: Option<u32>, default: u32, max: u32) -> u32 {
    requested.unwrap_or(default).clamp(1, max)
}
