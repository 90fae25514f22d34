pub mod error;
pub mod smeta_repo;
pub mod user_repo;
