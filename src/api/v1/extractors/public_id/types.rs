/*
 * Responsibility
 * - Per-resource public id types; new resources add a tag + alias here
 * - No decode logic, no AppState access
 */
use super::core::PublicId;

// smetas
pub enum SmetaTag {}
pub type PublicSmetaId = PublicId<SmetaTag>;
