use moka::future::Cache;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;

use crate::utils::hours::{DashboardStats, DepartmentPerformance};

/// Aggregated reports, recomputed at most once per TTL unless a write invalidates them.
#[derive(Debug, Clone)]
pub enum Report {
    Dashboard(DashboardStats),
    Departments(Vec<DepartmentPerformance>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKey {
    Dashboard,
    Departments,
}

static REPORT_CACHE: OnceCell<Cache<ReportKey, Arc<Report>>> = OnceCell::new();

const DEFAULT_TTL_SECS: u64 = 30;

/// Sets the TTL; only the first call has an effect.
pub fn init(ttl_secs: u64) {
    let _ = REPORT_CACHE.set(build(ttl_secs));
}

fn build(ttl_secs: u64) -> Cache<ReportKey, Arc<Report>> {
    Cache::builder()
        .max_capacity(16)
        .time_to_live(Duration::from_secs(ttl_secs))
        .build()
}

fn cache() -> &'static Cache<ReportKey, Arc<Report>> {
    REPORT_CACHE.get_or_init(|| build(DEFAULT_TTL_SECS))
}

pub async fn get(key: ReportKey) -> Option<Arc<Report>> {
    cache().get(&key).await
}

pub async fn put(key: ReportKey, report: Report) {
    cache().insert(key, Arc::new(report)).await;
}

/// Drop every cached report after a write that changes hours or membership.
pub fn invalidate_all() {
    cache().invalidate_all();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn stores_and_invalidates() {
        let stats = DashboardStats {
            total_interns: 2,
            active_interns: 1,
            avg_completion: "10%".into(),
            total_hours: 40,
        };
        put(ReportKey::Dashboard, Report::Dashboard(stats.clone())).await;

        match get(ReportKey::Dashboard).await.as_deref() {
            Some(Report::Dashboard(cached)) => assert_eq!(cached, &stats),
            other => panic!("unexpected cache entry: {other:?}"),
        }

        invalidate_all();
        assert!(get(ReportKey::Dashboard).await.is_none());
    }
}
