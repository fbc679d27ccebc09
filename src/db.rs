use std::collections::HashMap;

use anyhow::Context;
use chrono::NaiveDate;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

use crate::model::attendance::{ATTENDANCE_COLUMNS, AttendanceLog};
use crate::model::member::{MEMBER_COLUMNS, Member};
use crate::utils::hours::{LogInterval, TrackedMember, hours_by_member};

pub async fn init_db(database_url: &str) -> anyhow::Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(pool)
}

pub async fn find_member(pool: &MySqlPool, member_id: u64) -> Result<Option<Member>, sqlx::Error> {
    sqlx::query_as::<_, Member>(&format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?"))
        .bind(member_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_log_for_day(
    pool: &MySqlPool,
    member_id: u64,
    date: NaiveDate,
) -> Result<Option<AttendanceLog>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceLog>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance_logs WHERE member_id = ? AND date = ?"
    ))
    .bind(member_id)
    .bind(date)
    .fetch_optional(pool)
    .await
}

pub async fn find_log(pool: &MySqlPool, attendance_id: u64) -> Result<Option<AttendanceLog>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceLog>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance_logs WHERE id = ?"
    ))
    .bind(attendance_id)
    .fetch_optional(pool)
    .await
}

/// The log a time-out closes: today's, or the previous day's if it is still
/// open after a shift that crossed midnight.
pub async fn find_time_out_log(
    pool: &MySqlPool,
    member_id: u64,
    date: NaiveDate,
) -> Result<Option<AttendanceLog>, sqlx::Error> {
    if let Some(log) = find_log_for_day(pool, member_id, date).await? {
        return Ok(Some(log));
    }
    let Some(previous) = date.pred_opt() else {
        return Ok(None);
    };
    Ok(find_log_for_day(pool, member_id, previous)
        .await?
        .filter(AttendanceLog::is_open))
}

/// Approved, closed logs of one member.
pub async fn approved_logs(pool: &MySqlPool, member_id: u64) -> Result<Vec<AttendanceLog>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceLog>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance_logs \
         WHERE member_id = ? AND status = 'approved' AND time_out IS NOT NULL"
    ))
    .bind(member_id)
    .fetch_all(pool)
    .await
}

/// Every `member`/`admin` row; executives never take part in aggregation.
pub async fn tracked_members(pool: &MySqlPool) -> Result<Vec<TrackedMember>, sqlx::Error> {
    sqlx::query_as::<_, TrackedMember>(
        r#"
        SELECT id, department, total_required_hours, is_active
        FROM members
        WHERE role IN ('member', 'admin')
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Approved, closed intervals of tracked members, summed per member.
///
/// `member_ids = None` covers every tracked member.
pub async fn rendered_hours(
    pool: &MySqlPool,
    member_ids: Option<&[u64]>,
) -> Result<HashMap<u64, f64>, sqlx::Error> {
    let mut sql = String::from(
        r#"
        SELECT a.member_id, a.time_in, a.time_out, a.status
        FROM attendance_logs a
        JOIN members m ON m.id = a.member_id
        WHERE a.status = 'approved'
        AND a.time_out IS NOT NULL
        AND m.role IN ('member', 'admin')
        "#,
    );

    if let Some(ids) = member_ids {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        sql.push_str(&format!(" AND a.member_id IN ({placeholders})"));
    }

    let mut query = sqlx::query_as::<_, LogInterval>(&sql);
    for id in member_ids.unwrap_or_default() {
        query = query.bind(*id);
    }

    let logs = query.fetch_all(pool).await?;
    Ok(hours_by_member(&logs))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{attendance::AttendanceStatus, role::Role};
    use chrono::{TimeZone, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn at(d: u32, h: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, d, h, 0, 0).unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn aggregation_skips_executives(pool: MySqlPool) {
        let intern = fixtures::member(&pool, "intern@example.com", Role::Member, "IT", 486).await;
        let admin = fixtures::member(&pool, "admin@example.com", Role::Admin, "HR", 300).await;
        let exec = fixtures::member(&pool, "exec@example.com", Role::Super, "Management", 0).await;

        for id in [intern, admin, exec] {
            fixtures::log(&pool, id, day(2), at(2, 1), Some(at(2, 9)), AttendanceStatus::Approved).await;
        }

        let members = tracked_members(&pool).await.unwrap();
        let ids: Vec<u64> = members.iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&intern) && ids.contains(&admin));

        let hours = rendered_hours(&pool, None).await.unwrap();
        assert_eq!(hours.get(&intern), Some(&8.0));
        assert_eq!(hours.get(&admin), Some(&8.0));
        assert!(!hours.contains_key(&exec));

        let scoped = rendered_hours(&pool, Some(&[exec][..])).await.unwrap();
        assert!(scoped.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn rendered_hours_counts_only_approved_closed_logs(pool: MySqlPool) {
        let intern = fixtures::member(&pool, "intern@example.com", Role::Member, "IT", 486).await;
        fixtures::log(&pool, intern, day(2), at(2, 1), Some(at(2, 5)), AttendanceStatus::Approved).await;
        fixtures::log(&pool, intern, day(3), at(3, 1), Some(at(3, 9)), AttendanceStatus::Pending).await;
        fixtures::log(&pool, intern, day(4), at(4, 1), Some(at(4, 9)), AttendanceStatus::Rejected).await;
        fixtures::log(&pool, intern, day(5), at(5, 1), None, AttendanceStatus::Approved).await;

        let hours = rendered_hours(&pool, Some(&[intern][..])).await.unwrap();
        assert_eq!(hours.get(&intern), Some(&4.0));
        let logs = approved_logs(&pool, intern).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(crate::utils::hours::hours_rendered(&logs), 4.0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn time_out_log_falls_back_to_open_previous_day(pool: MySqlPool) {
        let intern = fixtures::member(&pool, "intern@example.com", Role::Member, "IT", 486).await;
        let overnight = fixtures::log(&pool, intern, day(2), at(2, 20), None, AttendanceStatus::Pending).await;

        let found = find_time_out_log(&pool, intern, day(3)).await.unwrap();
        assert_eq!(found.map(|l| l.id), Some(overnight));

        // two days later the open log is no longer picked up
        assert!(find_time_out_log(&pool, intern, day(4)).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn closed_previous_day_is_not_a_time_out_target(pool: MySqlPool) {
        let intern = fixtures::member(&pool, "intern@example.com", Role::Member, "IT", 486).await;
        fixtures::log(&pool, intern, day(2), at(2, 1), Some(at(2, 9)), AttendanceStatus::Pending).await;

        assert!(find_time_out_log(&pool, intern, day(3)).await.unwrap().is_none());
    }
}
