pub mod auth;
pub mod health;
pub mod smetas;
pub mod users;
