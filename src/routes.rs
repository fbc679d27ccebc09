use crate::{
    api::{attendance, dashboard, executive, intern, member},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::anyhow;
use std::sync::Arc;

type Limiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiters, built once and shared by every worker.
#[derive(Clone)]
pub struct RateLimiters {
    login: Arc<Limiter>,
    protected: Arc<Limiter>,
}

impl RateLimiters {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            login: Arc::new(build_limiter(config.rate_login_per_min)?),
            protected: Arc::new(build_limiter(config.rate_protected_per_min)?),
        })
    }
}

fn build_limiter(requests_per_min: u32) -> anyhow::Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = 60_000 / u64::from(requests_per_min);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms.max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min}/min"))?;
    Ok(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &RateLimiters) {
    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(limiters.login.clone())
                .route(web::post().to(handlers::login)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limiters.protected.clone()) // rate limiting
            // /me
            .service(
                web::scope("/me")
                    .service(web::resource("").route(web::get().to(member::me)))
                    .service(web::resource("/stats").route(web::get().to(member::my_stats))),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(web::resource("").route(web::get().to(attendance::list_logs)))
                    .service(web::resource("/time-in").route(web::post().to(attendance::time_in)))
                    .service(web::resource("/time-out").route(web::put().to(attendance::time_out)))
                    .service(web::resource("/today").route(web::get().to(attendance::today)))
                    .service(web::resource("/history").route(web::get().to(attendance::history)))
                    // /attendance/{id}/approve
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(attendance::approve)),
                    )
                    // /attendance/{id}/reject
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(attendance::reject)),
                    ),
            )
            .service(
                web::scope("/interns")
                    // /interns
                    .service(
                        web::resource("")
                            .route(web::post().to(intern::register_intern))
                            .route(web::get().to(intern::list_interns)),
                    )
                    .service(
                        web::resource("/overview").route(web::get().to(intern::intern_overview)),
                    )
                    // /interns/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(intern::update_intern))
                            .route(web::delete().to(intern::deactivate_intern)),
                    ),
            )
            .service(
                web::resource("/dashboard/stats").route(web::get().to(dashboard::dashboard_stats)),
            )
            .service(
                web::scope("/departments")
                    .service(web::resource("").route(web::get().to(member::departments)))
                    .service(
                        web::resource("/performance")
                            .route(web::get().to(executive::department_performance)),
                    ),
            )
            .service(
                web::resource("/executives").route(web::post().to(executive::register_executive)),
            ),
    );
}

// LOGIN
//  └─ access_token (ACCESS_TOKEN_TTL, default 15 min)

// API REQUEST
//  └─ Authorization: Bearer access_token

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_limiters_for_configured_rates() {
        assert!(build_limiter(60).is_ok());
        assert!(build_limiter(1000).is_ok());
    }

    #[test]
    fn zero_rate_still_builds_a_limiter() {
        assert!(build_limiter(0).is_ok());
    }

    #[test]
    fn rates_above_one_per_millisecond_are_accepted() {
        assert!(build_limiter(120_000).is_ok());
    }
}
