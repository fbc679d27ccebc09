use actix_web::{HttpResponse, Responder, web};
use sqlx::MySqlPool;
use tracing::debug;

use crate::{
    auth::auth::AuthUser,
    db,
    error::ApiError,
    utils::{
        hours::dashboard_stats as summarize,
        report_cache::{self, Report, ReportKey},
    },
};

/// Organisation-wide intern totals
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses(
        (status = 200, description = "Dashboard totals", body = crate::utils::hours::DashboardStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Dashboard"
)]
pub async fn dashboard_stats(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin_or_super()?;

    if let Some(cached) = report_cache::get(ReportKey::Dashboard).await {
        if let Report::Dashboard(stats) = cached.as_ref() {
            debug!("Dashboard stats served from cache");
            return Ok(HttpResponse::Ok().json(stats));
        }
    }

    let members = db::tracked_members(pool.get_ref()).await?;
    let hours = db::rendered_hours(pool.get_ref(), None).await?;
    let stats = summarize(&members, &hours);

    report_cache::put(ReportKey::Dashboard, Report::Dashboard(stats.clone())).await;

    Ok(HttpResponse::Ok().json(stats))
}
