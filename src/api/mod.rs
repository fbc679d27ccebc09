pub mod attendance;
pub mod dashboard;
pub mod executive;
pub mod intern;
pub mod member;
pub mod registration;
