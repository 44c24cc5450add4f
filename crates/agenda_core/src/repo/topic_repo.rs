//! Meeting topic repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist meetings and their ranked topics.
//! - Implement the rank collaborators: create (index-based rank), move
//!   (neighbor interpolation) and list (byte-ordered rank).
//!
//! # Invariants
//! - Topic listing is deterministic: `rank ASC, topic_uuid ASC`.
//! - Every rank read-modify-write runs inside one IMMEDIATE transaction, so
//!   concurrent writers cannot interpolate against stale neighbor ranks.
//! - New topics always sort after every existing topic of their meeting.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::topic::{Meeting, MeetingId, Topic, TopicId};
use crate::rank::{
    has_room_between, is_floor, is_strictly_between, rank_between, rank_for_index, Rank,
};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TOPIC_SELECT_SQL: &str = "SELECT
    topic_uuid,
    meeting_uuid,
    title,
    rank,
    created_at,
    updated_at
FROM topics";

/// First index assigned by a rebalance; index 0 stays free as head room.
const REBALANCE_FIRST_INDEX: u64 = 1;

/// Result type used by topic repository operations.
pub type TopicRepoResult<T> = Result<T, TopicRepoError>;

/// Errors from topic repository operations.
#[derive(Debug)]
pub enum TopicRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target meeting does not exist.
    MeetingNotFound(MeetingId),
    /// Target topic does not exist.
    TopicNotFound(TopicId),
    /// Requested neighbor belongs to a different meeting than the moved topic.
    NeighborOutsideMeeting {
        topic_uuid: TopicId,
        neighbor_uuid: TopicId,
    },
    /// Requested predecessor does not sort before requested successor.
    NeighborsOutOfOrder { after: TopicId, before: TopicId },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for TopicRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MeetingNotFound(id) => write!(f, "meeting not found: {id}"),
            Self::TopicNotFound(id) => write!(f, "topic not found: {id}"),
            Self::NeighborOutsideMeeting {
                topic_uuid,
                neighbor_uuid,
            } => write!(
                f,
                "neighbor {neighbor_uuid} is not in the meeting of topic {topic_uuid}"
            ),
            Self::NeighborsOutOfOrder { after, before } => write!(
                f,
                "neighbor {after} does not sort before neighbor {before}"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "topic repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "topic repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "topic repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid topic data: {message}"),
        }
    }
}

impl Error for TopicRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for TopicRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for TopicRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for meetings and ranked topics.
pub trait TopicRepository {
    /// Creates one meeting.
    fn create_meeting(&self, name: &str) -> TopicRepoResult<Meeting>;
    /// Loads one meeting by id.
    fn get_meeting(&self, meeting_uuid: MeetingId) -> TopicRepoResult<Option<Meeting>>;
    /// Appends one topic to a meeting, ranked by current topic count.
    fn create_topic(&self, meeting_uuid: MeetingId, title: &str) -> TopicRepoResult<Topic>;
    /// Loads one topic by id.
    fn get_topic(&self, topic_uuid: TopicId) -> TopicRepoResult<Option<Topic>>;
    /// Lists a meeting's topics in display order.
    fn list_topics(&self, meeting_uuid: MeetingId) -> TopicRepoResult<Vec<Topic>>;
    /// Re-ranks one topic between two neighbors (`None` = list end).
    fn move_topic(
        &self,
        topic_uuid: TopicId,
        after: Option<TopicId>,
        before: Option<TopicId>,
    ) -> TopicRepoResult<Topic>;
    /// Reassigns dense ranks to a meeting in current order.
    fn rebalance_meeting(&self, meeting_uuid: MeetingId) -> TopicRepoResult<usize>;
    /// Deletes one topic; sibling ranks are left untouched.
    fn delete_topic(&self, topic_uuid: TopicId) -> TopicRepoResult<()>;
}

/// SQLite-backed topic repository.
pub struct SqliteTopicRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTopicRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> TopicRepoResult<Self> {
        ensure_topic_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TopicRepository for SqliteTopicRepository<'_> {
    fn create_meeting(&self, name: &str) -> TopicRepoResult<Meeting> {
        let meeting_uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO meetings (meeting_uuid, name) VALUES (?1, ?2);",
            params![meeting_uuid.to_string(), name],
        )?;
        self.get_meeting(meeting_uuid)?
            .ok_or(TopicRepoError::MeetingNotFound(meeting_uuid))
    }

    fn get_meeting(&self, meeting_uuid: MeetingId) -> TopicRepoResult<Option<Meeting>> {
        let row = self
            .conn
            .query_row(
                "SELECT meeting_uuid, name, created_at
                 FROM meetings
                 WHERE meeting_uuid = ?1;",
                [meeting_uuid.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, name, created_at)| -> TopicRepoResult<Meeting> {
            Ok(Meeting {
                meeting_uuid: parse_uuid(&id, "meetings.meeting_uuid")?,
                name,
                created_at,
            })
        })
        .transpose()
    }

    fn create_topic(&self, meeting_uuid: MeetingId, title: &str) -> TopicRepoResult<Topic> {
        let topic_uuid = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_meeting_exists(&tx, meeting_uuid)?;

        let count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM topics WHERE meeting_uuid = ?1;",
            [meeting_uuid.to_string()],
            |row| row.get(0),
        )?;
        let max_rank: Option<String> = tx.query_row(
            "SELECT MAX(rank) FROM topics WHERE meeting_uuid = ?1;",
            [meeting_uuid.to_string()],
            |row| row.get(0),
        )?;

        let indexed = rank_for_index(count.max(0) as u64);
        let rank = match max_rank {
            Some(max) => {
                let max = parse_rank(&max)?;
                if indexed > max {
                    indexed
                } else {
                    // Deletes or moves left the count behind the tail rank;
                    // take the next dense rank after it.
                    rank_between(max.as_str(), "")
                }
            }
            None => indexed,
        };

        tx.execute(
            "INSERT INTO topics (topic_uuid, meeting_uuid, title, rank)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                topic_uuid.to_string(),
                meeting_uuid.to_string(),
                title,
                rank.as_str(),
            ],
        )?;
        tx.commit()?;

        debug!("event=topic_create module=repo status=ok index={count} rank={rank}");
        load_required_topic(self.conn, topic_uuid)
    }

    fn get_topic(&self, topic_uuid: TopicId) -> TopicRepoResult<Option<Topic>> {
        load_topic(self.conn, topic_uuid)
    }

    fn list_topics(&self, meeting_uuid: MeetingId) -> TopicRepoResult<Vec<Topic>> {
        let sql = format!(
            "{TOPIC_SELECT_SQL} WHERE meeting_uuid = ?1 ORDER BY rank ASC, topic_uuid ASC;"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([meeting_uuid.to_string()])?;

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_topic_row(row)?);
        }
        Ok(items)
    }

    fn move_topic(
        &self,
        topic_uuid: TopicId,
        after: Option<TopicId>,
        before: Option<TopicId>,
    ) -> TopicRepoResult<Topic> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let topic = load_required_topic(&tx, topic_uuid)?;

        let (mut lower, mut upper) = neighbor_ranks(&tx, &topic, after, before)?;
        let mut rebalanced = false;
        // Floor heads and padding-equal neighbors leave no usable gap.
        if (lower.is_empty() && is_floor(&upper)) || !has_room_between(&lower, &upper) {
            rebalance_in(&tx, topic.meeting_uuid)?;
            (lower, upper) = neighbor_ranks(&tx, &topic, after, before)?;
            rebalanced = true;
        }

        let rank = rank_between(&lower, &upper);
        if !is_strictly_between(&lower, rank.as_str(), &upper) {
            return Err(TopicRepoError::InvalidData(format!(
                "no rank fits between `{lower}` and `{upper}`"
            )));
        }

        tx.execute(
            "UPDATE topics
             SET rank = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE topic_uuid = ?1;",
            params![topic_uuid.to_string(), rank.as_str()],
        )?;
        tx.commit()?;

        info!(
            "event=topic_move module=repo status=ok from_rank={} to_rank={rank} rebalanced={rebalanced}",
            topic.rank
        );
        load_required_topic(self.conn, topic_uuid)
    }

    fn rebalance_meeting(&self, meeting_uuid: MeetingId) -> TopicRepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_meeting_exists(&tx, meeting_uuid)?;
        let rewritten = rebalance_in(&tx, meeting_uuid)?;
        tx.commit()?;
        Ok(rewritten)
    }

    fn delete_topic(&self, topic_uuid: TopicId) -> TopicRepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM topics WHERE topic_uuid = ?1;",
            [topic_uuid.to_string()],
        )?;
        if changed == 0 {
            return Err(TopicRepoError::TopicNotFound(topic_uuid));
        }
        Ok(())
    }
}

/// Resolves neighbor ids to rank strings; `""` marks an open end.
fn neighbor_ranks(
    conn: &Connection,
    topic: &Topic,
    after: Option<TopicId>,
    before: Option<TopicId>,
) -> TopicRepoResult<(String, String)> {
    let lower = match after {
        Some(id) => load_neighbor(conn, topic, id)?.rank.into_string(),
        None => String::new(),
    };
    let upper = match before {
        Some(id) => load_neighbor(conn, topic, id)?.rank.into_string(),
        None => String::new(),
    };

    if let (Some(after), Some(before)) = (after, before) {
        if lower >= upper {
            return Err(TopicRepoError::NeighborsOutOfOrder { after, before });
        }
    }
    Ok((lower, upper))
}

fn load_neighbor(
    conn: &Connection,
    topic: &Topic,
    neighbor_uuid: TopicId,
) -> TopicRepoResult<Topic> {
    let neighbor = load_required_topic(conn, neighbor_uuid)?;
    if neighbor.meeting_uuid != topic.meeting_uuid {
        return Err(TopicRepoError::NeighborOutsideMeeting {
            topic_uuid: topic.topic_uuid,
            neighbor_uuid,
        });
    }
    Ok(neighbor)
}

fn rebalance_in(conn: &Connection, meeting_uuid: MeetingId) -> TopicRepoResult<usize> {
    let mut ids = Vec::new();
    {
        let mut stmt = conn.prepare(
            "SELECT topic_uuid
             FROM topics
             WHERE meeting_uuid = ?1
             ORDER BY rank ASC, topic_uuid ASC;",
        )?;
        let mut rows = stmt.query([meeting_uuid.to_string()])?;
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            ids.push(parse_uuid(&value, "topics.topic_uuid")?);
        }
    }

    for (offset, id) in ids.iter().enumerate() {
        let rank = rank_for_index(REBALANCE_FIRST_INDEX + offset as u64);
        conn.execute(
            "UPDATE topics
             SET rank = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE topic_uuid = ?1;",
            params![id.to_string(), rank.as_str()],
        )?;
    }

    info!(
        "event=topic_rebalance module=repo status=ok topics={}",
        ids.len()
    );
    Ok(ids.len())
}

fn ensure_meeting_exists(conn: &Connection, meeting_uuid: MeetingId) -> TopicRepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM meetings WHERE meeting_uuid = ?1);",
        [meeting_uuid.to_string()],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(TopicRepoError::MeetingNotFound(meeting_uuid))
    }
}

fn load_topic(conn: &Connection, topic_uuid: TopicId) -> TopicRepoResult<Option<Topic>> {
    let sql = format!("{TOPIC_SELECT_SQL} WHERE topic_uuid = ?1;");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([topic_uuid.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_topic_row(row)?));
    }
    Ok(None)
}

fn load_required_topic(conn: &Connection, topic_uuid: TopicId) -> TopicRepoResult<Topic> {
    load_topic(conn, topic_uuid)?.ok_or(TopicRepoError::TopicNotFound(topic_uuid))
}

fn parse_topic_row(row: &Row<'_>) -> TopicRepoResult<Topic> {
    let topic_uuid_text: String = row.get("topic_uuid")?;
    let meeting_uuid_text: String = row.get("meeting_uuid")?;
    let rank_text: String = row.get("rank")?;

    Ok(Topic {
        topic_uuid: parse_uuid(&topic_uuid_text, "topics.topic_uuid")?,
        meeting_uuid: parse_uuid(&meeting_uuid_text, "topics.meeting_uuid")?,
        title: row.get("title")?,
        rank: parse_rank(&rank_text)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_rank(value: &str) -> TopicRepoResult<Rank> {
    Rank::parse(value).map_err(|err| {
        TopicRepoError::InvalidData(format!("invalid rank `{value}` in topics.rank: {err}"))
    })
}

fn parse_uuid(value: &str, column: &'static str) -> TopicRepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| TopicRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_topic_connection_ready(conn: &Connection) -> TopicRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(TopicRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["meetings", "topics"] {
        if !table_exists(conn, table)? {
            return Err(TopicRepoError::MissingRequiredTable(table));
        }
    }

    for column in [
        "topic_uuid",
        "meeting_uuid",
        "title",
        "rank",
        "created_at",
        "updated_at",
    ] {
        if !table_has_column(conn, "topics", column)? {
            return Err(TopicRepoError::MissingRequiredColumn {
                table: "topics",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> TopicRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> TopicRepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
