//! Infrastructure layer for LearnHub.
//!
//! Contains implementations of the ports defined in `learnhub-core`: SQLite
//! storage for skills and resources, the reqwest-backed URL probe, and the
//! `config.toml` loader.

pub mod config;
pub mod probe;
pub mod sqlite;
