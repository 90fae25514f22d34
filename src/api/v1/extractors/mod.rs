/*
 * Responsibility
 * - Request extractors shared by v1 handlers
 */
pub mod client_addr;
pub mod current_user;
pub mod json_body;
pub mod public_id;
pub mod query_params;

pub use client_addr::ClientAddr;
pub use current_user::CurrentUser;
pub use json_body::JsonBody;
pub use public_id::PublicSmetaId;
pub use query_params::QueryParams;
