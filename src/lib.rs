pub mod error;
pub mod inventory;
pub mod metadata;
pub mod registry;
pub mod requirement;
pub mod rewrite;
pub mod runtime;
