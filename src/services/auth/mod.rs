pub mod base64url;
pub mod claims;
pub mod gate;
pub mod principal;
pub mod signer;
pub mod throttle;
pub mod token;
pub mod user_store;

#[cfg(test)]
pub mod testing;

pub use gate::{AuthGate, AuthRequest, RoleGate};
pub use principal::ROLE_ADMIN;
pub use throttle::{CacheLoginThrottle, LoginThrottle};
pub use token::TokenCodec;
pub use user_store::PgUserStore;
