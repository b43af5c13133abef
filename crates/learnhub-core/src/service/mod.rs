//! Business logic services (use cases).
//!
//! Services orchestrate repository calls, statistics refreshes and URL
//! verification. They depend on traits (ports) -- never on concrete
//! infrastructure implementations.

pub mod probe;
pub mod resource;
pub mod skill;
pub mod statistics;
pub mod verifier;
