//! Catalog business logic and repository trait definitions for LearnHub.
//!
//! This crate defines the "ports" (repository and probe traits) that the
//! infrastructure layer implements, plus the statistics engine, the trust
//! verifier and the catalog services built on top of them. It depends only
//! on `learnhub-types` -- never on `learnhub-infra` or any database/IO crate.

pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;
