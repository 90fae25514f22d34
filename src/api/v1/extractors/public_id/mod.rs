/*
 * Responsibility
 * - Bundle core (extractor) and types (per-resource aliases)
 */
mod core;
mod types;

pub use self::core::PublicId;
pub use types::*;
