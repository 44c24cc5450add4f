//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Keep SQL details and rank persistence out of service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`MeetingNotFound`,
//!   `TopicNotFound`) in addition to DB transport errors.

pub mod topic_repo;
