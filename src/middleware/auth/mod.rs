pub mod access;

pub use access::{apply, apply_role};
