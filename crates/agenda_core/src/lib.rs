//! Core domain logic for the agenda backend.
//!
//! The interesting part is [`rank`]: lexicographic sort keys that let topics
//! be inserted between neighbors without renumbering the rest of a meeting.
//! The storage and service layers wire those keys to SQLite.

pub mod db;
pub mod logging;
pub mod model;
pub mod rank;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::topic::{Meeting, MeetingId, Topic, TopicId};
pub use rank::{
    has_room_between, is_strictly_between, rank_between, rank_for_index, Rank, RankError,
};
pub use repo::topic_repo::{
    SqliteTopicRepository, TopicRepoError, TopicRepoResult, TopicRepository,
};
pub use service::topic_service::{TopicService, TopicServiceError};

/// Minimal health-check API for wiring checks.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
