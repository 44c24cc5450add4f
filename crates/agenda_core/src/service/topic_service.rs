//! Meeting topic use-case service.
//!
//! # Responsibility
//! - Validate agenda inputs above the repository layer.
//! - Provide create, list, move, rebalance and delete operations.
//!
//! # Invariants
//! - Meeting names and topic titles are trimmed and never blank.
//! - A topic is never its own neighbor in a move.
//! - Neighbors of a move belong to the moved topic's meeting.

use crate::model::topic::{Meeting, MeetingId, Topic, TopicId};
use crate::repo::topic_repo::{TopicRepoError, TopicRepository};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from topic service operations.
#[derive(Debug)]
pub enum TopicServiceError {
    /// Title or name is blank after trim.
    InvalidTitle,
    /// Target meeting does not exist.
    MeetingNotFound(MeetingId),
    /// Target topic does not exist.
    TopicNotFound(TopicId),
    /// Move names the moved topic as its own neighbor.
    SelfNeighbor(TopicId),
    /// Neighbor belongs to another meeting.
    NeighborInOtherMeeting {
        topic_uuid: TopicId,
        neighbor_uuid: TopicId,
    },
    /// `after` does not sort before `before`.
    NeighborsOutOfOrder { after: TopicId, before: TopicId },
    /// Repository-level failure.
    Repo(TopicRepoError),
}

impl Display for TopicServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "title must not be blank"),
            Self::MeetingNotFound(id) => write!(f, "meeting not found: {id}"),
            Self::TopicNotFound(id) => write!(f, "topic not found: {id}"),
            Self::SelfNeighbor(id) => write!(f, "topic cannot be moved next to itself: {id}"),
            Self::NeighborInOtherMeeting {
                topic_uuid,
                neighbor_uuid,
            } => write!(
                f,
                "neighbor {neighbor_uuid} is not in the meeting of topic {topic_uuid}"
            ),
            Self::NeighborsOutOfOrder { after, before } => {
                write!(f, "topic {after} does not sort before topic {before}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TopicServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TopicRepoError> for TopicServiceError {
    fn from(value: TopicRepoError) -> Self {
        match value {
            TopicRepoError::MeetingNotFound(id) => Self::MeetingNotFound(id),
            TopicRepoError::TopicNotFound(id) => Self::TopicNotFound(id),
            TopicRepoError::NeighborOutsideMeeting {
                topic_uuid,
                neighbor_uuid,
            } => Self::NeighborInOtherMeeting {
                topic_uuid,
                neighbor_uuid,
            },
            TopicRepoError::NeighborsOutOfOrder { after, before } => {
                Self::NeighborsOutOfOrder { after, before }
            }
            other => Self::Repo(other),
        }
    }
}

/// Topic service facade.
pub struct TopicService<R: TopicRepository> {
    repo: R,
}

impl<R: TopicRepository> TopicService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one meeting.
    pub fn create_meeting(&self, name: impl Into<String>) -> Result<Meeting, TopicServiceError> {
        let normalized = normalize_title(name.into())?;
        self.repo
            .create_meeting(normalized.as_str())
            .map_err(Into::into)
    }

    /// Appends one topic to the end of a meeting's agenda.
    pub fn create_topic(
        &self,
        meeting_uuid: MeetingId,
        title: impl Into<String>,
    ) -> Result<Topic, TopicServiceError> {
        let normalized = normalize_title(title.into())?;
        self.ensure_meeting_exists(meeting_uuid)?;
        self.repo
            .create_topic(meeting_uuid, normalized.as_str())
            .map_err(Into::into)
    }

    /// Loads one topic.
    pub fn get_topic(&self, topic_uuid: TopicId) -> Result<Topic, TopicServiceError> {
        self.repo
            .get_topic(topic_uuid)?
            .ok_or(TopicServiceError::TopicNotFound(topic_uuid))
    }

    /// Lists a meeting's topics in ascending rank order.
    pub fn list_topics(&self, meeting_uuid: MeetingId) -> Result<Vec<Topic>, TopicServiceError> {
        self.ensure_meeting_exists(meeting_uuid)?;
        self.repo.list_topics(meeting_uuid).map_err(Into::into)
    }

    /// Moves one topic between `after` and `before`.
    ///
    /// `None` for `after` moves to the head, `None` for `before` to the tail.
    pub fn move_topic(
        &self,
        topic_uuid: TopicId,
        after: Option<TopicId>,
        before: Option<TopicId>,
    ) -> Result<Topic, TopicServiceError> {
        if after == Some(topic_uuid) || before == Some(topic_uuid) {
            return Err(TopicServiceError::SelfNeighbor(topic_uuid));
        }
        self.get_topic(topic_uuid)?;
        self.repo
            .move_topic(topic_uuid, after, before)
            .map_err(Into::into)
    }

    /// Moves one topic to a zero-based position among its siblings.
    ///
    /// Positions past the end clamp to the tail.
    pub fn move_topic_to_position(
        &self,
        topic_uuid: TopicId,
        position: usize,
    ) -> Result<Topic, TopicServiceError> {
        let topic = self.get_topic(topic_uuid)?;
        let siblings: Vec<TopicId> = self
            .repo
            .list_topics(topic.meeting_uuid)?
            .into_iter()
            .map(|sibling| sibling.topic_uuid)
            .filter(|id| *id != topic_uuid)
            .collect();

        let position = position.min(siblings.len());
        let after = position.checked_sub(1).map(|index| siblings[index]);
        let before = siblings.get(position).copied();
        self.move_topic(topic_uuid, after, before)
    }

    /// Rewrites a meeting's ranks densely; returns the number of topics.
    pub fn rebalance(&self, meeting_uuid: MeetingId) -> Result<usize, TopicServiceError> {
        self.repo
            .rebalance_meeting(meeting_uuid)
            .map_err(Into::into)
    }

    /// Deletes one topic.
    pub fn delete_topic(&self, topic_uuid: TopicId) -> Result<(), TopicServiceError> {
        self.repo.delete_topic(topic_uuid).map_err(Into::into)
    }

    fn ensure_meeting_exists(&self, meeting_uuid: MeetingId) -> Result<(), TopicServiceError> {
        self.repo
            .get_meeting(meeting_uuid)?
            .ok_or(TopicServiceError::MeetingNotFound(meeting_uuid))?;
        Ok(())
    }
}

fn normalize_title(value: String) -> Result<String, TopicServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TopicServiceError::InvalidTitle);
    }
    Ok(trimmed.to_string())
}
