//! Meeting and topic read models.
//!
//! # Invariants
//! - `Topic::rank` orders topics within `meeting_uuid` only.
//! - Ranks of two topics in one meeting are never equal.

use crate::rank::Rank;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable meeting identifier.
pub type MeetingId = Uuid;

/// Stable topic identifier.
pub type TopicId = Uuid;

/// Meeting that owns an ordered topic list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub meeting_uuid: MeetingId,
    /// User-facing meeting name.
    pub name: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

/// One agenda point of a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub topic_uuid: TopicId,
    /// Owning meeting.
    pub meeting_uuid: MeetingId,
    pub title: String,
    /// Sort key within the owning meeting.
    pub rank: Rank,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp; bumped on every reorder.
    pub updated_at: i64,
}
