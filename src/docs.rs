use crate::api::attendance::{AttendanceEntry, HistoryQuery, LogFilter, PhotoPayload, TodayResponse};
use crate::api::executive::RegisterExecutive;
use crate::api::intern::{InternSummary, OverviewQuery, RegisterIntern, UpdateIntern};
use crate::api::member::MemberStats;
use crate::model::attendance::{AttendanceLog, AttendanceStatus};
use crate::model::department::Department;
use crate::model::member::Member;
use crate::model::role::Role;
use crate::models::{LoginReqDto, LoginResponse};
use crate::utils::attendance_window::{Availability, Unavailable};
use crate::utils::hours::{DashboardStats, DepartmentPerformance, MemberProgress};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "OJT Attendance Tracker API",
        version = "1.0.0",
        description = r#"
## OJT Attendance Tracker

Tracks internship hours: interns time in and out each day with a photo,
admins approve the logs, and approved hours count toward each intern's
required total.

### 🔹 Key Features
- **Attendance**
  - Daily time-in / time-out with photo, one log per day
  - Approval workflow (pending → approved / rejected)
- **Intern Management**
  - Register, edit and deactivate interns
  - Hours rendered and completion progress per intern
- **Dashboards**
  - Organisation totals for admins
  - Department rollups for executives

### 🔐 Security
All `/api` endpoints require a **JWT Bearer** access token from `/auth/login`.
Roles: `member`, `admin`, `super`.
"#,
    ),
    paths(
        crate::auth::handlers::login,

        crate::api::member::me,
        crate::api::member::my_stats,
        crate::api::member::departments,

        crate::api::attendance::time_in,
        crate::api::attendance::time_out,
        crate::api::attendance::today,
        crate::api::attendance::history,
        crate::api::attendance::list_logs,
        crate::api::attendance::approve,
        crate::api::attendance::reject,

        crate::api::intern::register_intern,
        crate::api::intern::list_interns,
        crate::api::intern::intern_overview,
        crate::api::intern::update_intern,
        crate::api::intern::deactivate_intern,

        crate::api::dashboard::dashboard_stats,

        crate::api::executive::register_executive,
        crate::api::executive::department_performance
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            Role,
            Member,
            MemberStats,
            MemberProgress,
            Department,
            AttendanceLog,
            AttendanceStatus,
            AttendanceEntry,
            PhotoPayload,
            TodayResponse,
            Availability,
            Unavailable,
            HistoryQuery,
            LogFilter,
            RegisterIntern,
            UpdateIntern,
            InternSummary,
            OverviewQuery,
            RegisterExecutive,
            DashboardStats,
            DepartmentPerformance
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login"),
        (name = "Member", description = "Caller profile and progress"),
        (name = "Attendance", description = "Time-in / time-out and approvals"),
        (name = "Intern", description = "Intern management APIs"),
        (name = "Dashboard", description = "Organisation totals"),
        (name = "Executive", description = "Executive registration and department rollups"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
