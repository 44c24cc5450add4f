//! Domain model for meetings and their ordered topics.
//!
//! # Responsibility
//! - Define the read models returned by repositories and services.
//!
//! # Invariants
//! - Every meeting and topic is identified by a stable UUID.
//! - A topic belongs to exactly one meeting for its whole lifetime.

pub mod topic;
