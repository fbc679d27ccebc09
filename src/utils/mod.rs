pub mod attendance_window;
pub mod db_utils;
pub mod email_filter;
pub mod hours;
pub mod report_cache;
pub mod validation;
