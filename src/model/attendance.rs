use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AttendanceStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl TryFrom<String> for AttendanceStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One member's time-in/time-out record for a single calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 12,
    "member_id": 3,
    "date": "2026-03-02",
    "time_in": "2026-03-02T00:58:11Z",
    "time_out": "2026-03-02T09:03:40Z",
    "time_in_photo_url": "https://storage.example.com/attendance-photos/7/time_in_1772413091.jpg",
    "time_out_photo_url": "https://storage.example.com/attendance-photos/7/time_out_1772442220.jpg",
    "status": "approved",
    "approved_by": 1,
    "approved_at": "2026-03-02T10:00:00Z"
}))]
pub struct AttendanceLog {
    pub id: u64,
    pub member_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, format = "date-time")]
    pub time_in: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub time_out: Option<DateTime<Utc>>,
    pub time_in_photo_url: String,
    pub time_out_photo_url: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
    pub approved_by: Option<u64>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub approved_at: Option<DateTime<Utc>>,
}

impl AttendanceLog {
    pub fn is_open(&self) -> bool {
        self.time_out.is_none()
    }
}

pub const ATTENDANCE_COLUMNS: &str = "id, member_id, date, time_in, time_out, time_in_photo_url, \
     time_out_photo_url, status, approved_by, approved_at";
