//! Modules shipped with the crate, registered by `ModuleRegistry::builtin`

pub mod search;
pub mod wiki;
