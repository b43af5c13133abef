//! Shared domain types for the LearnHub catalog.
//!
//! Skills, resources, verification outcomes, configuration, and their error
//! types. Zero infrastructure dependencies -- only serde, uuid, chrono,
//! thiserror.

pub mod config;
pub mod error;
pub mod resource;
pub mod skill;
pub mod verification;
