pub mod attendance;
pub mod department;
pub mod member;
pub mod role;
pub mod user;
