use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 3,
        "user_id": 7,
        "full_name": "Juan Dela Cruz",
        "member_type": "IT Intern",
        "department": "IT",
        "role": "member",
        "total_required_hours": 486,
        "start_date": "2026-02-02",
        "is_active": true,
        "created_at": "2026-01-30T08:00:00Z"
    })
)]
pub struct Member {
    #[schema(example = 3)]
    pub id: u64,

    #[schema(example = 7)]
    pub user_id: u64,

    #[schema(example = "Juan Dela Cruz")]
    pub full_name: String,

    #[schema(example = "IT Intern")]
    pub member_type: String,

    #[schema(example = "IT")]
    pub department: String,

    #[sqlx(try_from = "String")]
    pub role: Role,

    #[schema(example = 486)]
    pub total_required_hours: u32,

    #[schema(example = "2026-02-02", value_type = String, format = "date")]
    pub start_date: NaiveDate,

    #[schema(example = true)]
    pub is_active: bool,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

pub const MEMBER_COLUMNS: &str = "id, user_id, full_name, member_type, department, role, \
     total_required_hours, start_date, is_active, created_at";
