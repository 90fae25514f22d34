/*
 * Responsibility
 * - Request/response bodies of the v1 API
 * - Format checks live next to each request type (`validate()`)
 */
pub mod auth;
pub mod smetas;
pub mod users;
