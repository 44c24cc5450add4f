use agenda_core::db::open_db_in_memory;
use agenda_core::{
    Meeting, SqliteTopicRepository, Topic, TopicRepoError, TopicRepository, TopicService,
    TopicServiceError,
};
use rusqlite::Connection;
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn service(conn: &Connection) -> TopicService<SqliteTopicRepository<'_>> {
    TopicService::new(SqliteTopicRepository::try_new(conn).unwrap())
}

fn titles(topics: &[Topic]) -> Vec<&str> {
    topics.iter().map(|topic| topic.title.as_str()).collect()
}

fn ranks(topics: &[Topic]) -> Vec<&str> {
    topics.iter().map(|topic| topic.rank.as_str()).collect()
}

fn meeting_with(
    service: &TopicService<SqliteTopicRepository<'_>>,
    titles: &[&str],
) -> (Meeting, Vec<Topic>) {
    let meeting = service.create_meeting("Weekly").unwrap();
    let topics = titles
        .iter()
        .map(|title| service.create_topic(meeting.meeting_uuid, *title).unwrap())
        .collect();
    (meeting, topics)
}

#[test]
fn created_topics_get_sequential_ranks() {
    let conn = setup();
    let service = service(&conn);
    let (meeting, _) = meeting_with(&service, &["T1", "T2", "T3"]);

    let listed = service.list_topics(meeting.meeting_uuid).unwrap();
    assert_eq!(titles(&listed), ["T1", "T2", "T3"]);
    assert_eq!(ranks(&listed), ["aaaa", "aaab", "aaac"]);
}

#[test]
fn listing_reproduces_insertion_order() {
    let conn = setup();
    let service = service(&conn);

    for count in [0_usize, 1, 1000] {
        let meeting = service.create_meeting(format!("Meeting {count}")).unwrap();
        let created: Vec<Uuid> = (0..count)
            .map(|index| {
                service
                    .create_topic(meeting.meeting_uuid, format!("topic {index}"))
                    .unwrap()
                    .topic_uuid
            })
            .collect();

        let listed: Vec<Uuid> = service
            .list_topics(meeting.meeting_uuid)
            .unwrap()
            .into_iter()
            .map(|topic| topic.topic_uuid)
            .collect();
        assert_eq!(listed, created);
    }
}

#[test]
fn moving_third_topic_between_first_and_second() {
    let conn = setup();
    let service = service(&conn);
    let (meeting, topics) = meeting_with(&service, &["T1", "T2", "T3"]);

    let moved = service
        .move_topic(
            topics[2].topic_uuid,
            Some(topics[0].topic_uuid),
            Some(topics[1].topic_uuid),
        )
        .unwrap();
    assert_eq!(moved.rank.as_str(), "aaaan");

    let listed = service.list_topics(meeting.meeting_uuid).unwrap();
    assert_eq!(titles(&listed), ["T1", "T3", "T2"]);
    assert_eq!(ranks(&listed), ["aaaa", "aaaan", "aaab"]);
}

#[test]
fn moving_to_tail_ranks_after_last_topic() {
    let conn = setup();
    let service = service(&conn);
    let (meeting, topics) = meeting_with(&service, &["T1", "T2", "T3"]);

    service
        .move_topic(topics[0].topic_uuid, Some(topics[2].topic_uuid), None)
        .unwrap();

    let listed = service.list_topics(meeting.meeting_uuid).unwrap();
    assert_eq!(titles(&listed), ["T2", "T3", "T1"]);
}

#[test]
fn moving_before_floor_rank_rebalances_first() {
    let conn = setup();
    let service = service(&conn);
    let (meeting, topics) = meeting_with(&service, &["T1", "T2", "T3"]);

    let moved = service
        .move_topic(topics[2].topic_uuid, None, Some(topics[0].topic_uuid))
        .unwrap();

    let listed = service.list_topics(meeting.meeting_uuid).unwrap();
    assert_eq!(titles(&listed), ["T3", "T1", "T2"]);
    assert_eq!(listed[1].rank.as_str(), "aaab");
    assert_eq!(listed[2].rank.as_str(), "aaac");
    assert_eq!(moved.rank.as_str(), "aaaan");
}

#[test]
fn moving_between_padding_equal_neighbors_rebalances_first() {
    let conn = setup();
    let service = service(&conn);
    let (meeting, topics) = meeting_with(&service, &["T1", "T2", "T3"]);

    conn.execute(
        "UPDATE topics SET rank = 'aaaba' WHERE topic_uuid = ?1;",
        [topics[2].topic_uuid.to_string()],
    )
    .unwrap();

    let moved = service
        .move_topic(
            topics[0].topic_uuid,
            Some(topics[1].topic_uuid),
            Some(topics[2].topic_uuid),
        )
        .unwrap();

    let listed = service.list_topics(meeting.meeting_uuid).unwrap();
    assert_eq!(titles(&listed), ["T2", "T1", "T3"]);
    assert_eq!(ranks(&listed), ["aaac", "aaacn", "aaad"]);
    assert_eq!(moved.rank.as_str(), "aaacn");
}

#[test]
fn repeated_head_moves_keep_order() {
    let conn = setup();
    let service = service(&conn);
    let (meeting, topics) = meeting_with(&service, &["A", "B", "C", "D"]);

    // Rotate the last topic to the front repeatedly.
    let mut expected: Vec<Uuid> = topics.iter().map(|topic| topic.topic_uuid).collect();
    for _ in 0..25 {
        let last = expected.pop().unwrap();
        service.move_topic(last, None, Some(expected[0])).unwrap();
        expected.insert(0, last);

        let listed: Vec<Uuid> = service
            .list_topics(meeting.meeting_uuid)
            .unwrap()
            .into_iter()
            .map(|topic| topic.topic_uuid)
            .collect();
        assert_eq!(listed, expected);
    }
}

#[test]
fn repeated_moves_into_same_gap_never_collide() {
    let conn = setup();
    let service = service(&conn);
    let (meeting, topics) = meeting_with(&service, &["A", "B", "X", "Y"]);

    // Alternately drop X and Y right after A, in front of whichever sits there.
    let (a, x, y) = (topics[0].topic_uuid, topics[2].topic_uuid, topics[3].topic_uuid);
    for round in 0..30 {
        let moving = if round % 2 == 0 { y } else { x };
        let successor = service.list_topics(meeting.meeting_uuid).unwrap()[1].topic_uuid;
        service.move_topic(moving, Some(a), Some(successor)).unwrap();

        let listed = service.list_topics(meeting.meeting_uuid).unwrap();
        assert_eq!(listed[0].topic_uuid, a);
        assert_eq!(listed[1].topic_uuid, moving);
        let mut sorted = ranks(&listed);
        sorted.dedup();
        assert_eq!(sorted.len(), listed.len(), "duplicate rank in {:?}", ranks(&listed));
    }
}

#[test]
fn move_to_position_clamps_and_reorders() {
    let conn = setup();
    let service = service(&conn);
    let (meeting, topics) = meeting_with(&service, &["A", "B", "C", "D", "E"]);

    service
        .move_topic_to_position(topics[4].topic_uuid, 1)
        .unwrap();
    let listed = service.list_topics(meeting.meeting_uuid).unwrap();
    assert_eq!(titles(&listed), ["A", "E", "B", "C", "D"]);

    service
        .move_topic_to_position(topics[0].topic_uuid, 99)
        .unwrap();
    let listed = service.list_topics(meeting.meeting_uuid).unwrap();
    assert_eq!(titles(&listed), ["E", "B", "C", "D", "A"]);

    service
        .move_topic_to_position(topics[2].topic_uuid, 0)
        .unwrap();
    let listed = service.list_topics(meeting.meeting_uuid).unwrap();
    assert_eq!(titles(&listed), ["C", "E", "B", "D", "A"]);
}

#[test]
fn create_after_delete_still_appends() {
    let conn = setup();
    let service = service(&conn);
    let (meeting, topics) = meeting_with(&service, &["T1", "T2", "T3"]);

    service.delete_topic(topics[1].topic_uuid).unwrap();
    let appended = service.create_topic(meeting.meeting_uuid, "T4").unwrap();
    assert!(appended.rank > topics[2].rank);

    let listed = service.list_topics(meeting.meeting_uuid).unwrap();
    assert_eq!(titles(&listed), ["T1", "T3", "T4"]);
}

#[test]
fn creates_after_delete_keep_ranks_short() {
    let conn = setup();
    let service = service(&conn);
    let (meeting, topics) = meeting_with(&service, &["T1", "T2"]);

    service.delete_topic(topics[0].topic_uuid).unwrap();
    for index in 0..1000 {
        service
            .create_topic(meeting.meeting_uuid, format!("topic {index}"))
            .unwrap();
    }

    let listed = service.list_topics(meeting.meeting_uuid).unwrap();
    assert_eq!(listed.len(), 1001);
    assert_eq!(listed[0].title, "T2");
    assert_eq!(listed[1000].title, "topic 999");
    let longest = listed.iter().map(|topic| topic.rank.as_str().len()).max();
    assert_eq!(longest, Some(4));
}

#[test]
fn repeated_tail_moves_keep_ranks_short() {
    let conn = setup();
    let service = service(&conn);
    let (meeting, _) = meeting_with(&service, &["A", "B", "C"]);

    for _ in 0..1000 {
        let listed = service.list_topics(meeting.meeting_uuid).unwrap();
        let (first, last) = (listed[0].topic_uuid, listed[2].topic_uuid);
        let moved = service.move_topic(first, Some(last), None).unwrap();
        assert!(moved.rank.as_str().len() <= 4, "rank grew to {}", moved.rank);
    }

    let listed = service.list_topics(meeting.meeting_uuid).unwrap();
    // 1000 rotations of three topics end one step past the start.
    assert_eq!(titles(&listed), ["B", "C", "A"]);
}

#[test]
fn rebalance_rewrites_dense_ranks_in_current_order() {
    let conn = setup();
    let service = service(&conn);
    let (meeting, topics) = meeting_with(&service, &["T1", "T2", "T3"]);
    service
        .move_topic(
            topics[2].topic_uuid,
            Some(topics[0].topic_uuid),
            Some(topics[1].topic_uuid),
        )
        .unwrap();

    let rewritten = service.rebalance(meeting.meeting_uuid).unwrap();
    assert_eq!(rewritten, 3);

    let listed = service.list_topics(meeting.meeting_uuid).unwrap();
    assert_eq!(titles(&listed), ["T1", "T3", "T2"]);
    assert_eq!(ranks(&listed), ["aaab", "aaac", "aaad"]);
}

#[test]
fn meetings_order_topics_independently() {
    let conn = setup();
    let service = service(&conn);
    let (first, _) = meeting_with(&service, &["A1", "A2"]);
    let (second, _) = meeting_with(&service, &["B1"]);

    assert_eq!(titles(&service.list_topics(first.meeting_uuid).unwrap()), ["A1", "A2"]);
    let second_topics = service.list_topics(second.meeting_uuid).unwrap();
    assert_eq!(titles(&second_topics), ["B1"]);
    assert_eq!(second_topics[0].rank.as_str(), "aaaa");
}

#[test]
fn titles_are_trimmed_and_must_not_be_blank() {
    let conn = setup();
    let service = service(&conn);
    let meeting = service.create_meeting("  Planning  ").unwrap();
    assert_eq!(meeting.name, "Planning");

    let topic = service.create_topic(meeting.meeting_uuid, "  Budget ").unwrap();
    assert_eq!(topic.title, "Budget");

    let err = service.create_topic(meeting.meeting_uuid, "   ").unwrap_err();
    assert!(matches!(err, TopicServiceError::InvalidTitle));
    let err = service.create_meeting("").unwrap_err();
    assert!(matches!(err, TopicServiceError::InvalidTitle));
}

#[test]
fn unknown_meeting_and_topic_are_reported() {
    let conn = setup();
    let service = service(&conn);
    let missing = Uuid::new_v4();

    let err = service.create_topic(missing, "Orphan").unwrap_err();
    assert!(matches!(err, TopicServiceError::MeetingNotFound(id) if id == missing));

    let err = service.list_topics(missing).unwrap_err();
    assert!(matches!(err, TopicServiceError::MeetingNotFound(id) if id == missing));

    let err = service.move_topic(missing, None, None).unwrap_err();
    assert!(matches!(err, TopicServiceError::TopicNotFound(id) if id == missing));

    let err = service.delete_topic(missing).unwrap_err();
    assert!(matches!(err, TopicServiceError::TopicNotFound(id) if id == missing));

    let err = service.rebalance(missing).unwrap_err();
    assert!(matches!(err, TopicServiceError::MeetingNotFound(id) if id == missing));
}

#[test]
fn move_rejects_invalid_neighbors() {
    let conn = setup();
    let service = service(&conn);
    let (_, topics) = meeting_with(&service, &["T1", "T2", "T3"]);
    let (_, foreign) = meeting_with(&service, &["F1"]);

    let err = service
        .move_topic(topics[0].topic_uuid, Some(topics[0].topic_uuid), None)
        .unwrap_err();
    assert!(matches!(err, TopicServiceError::SelfNeighbor(id) if id == topics[0].topic_uuid));

    let err = service
        .move_topic(topics[0].topic_uuid, Some(foreign[0].topic_uuid), None)
        .unwrap_err();
    assert!(matches!(
        err,
        TopicServiceError::NeighborInOtherMeeting { neighbor_uuid, .. }
            if neighbor_uuid == foreign[0].topic_uuid
    ));

    let err = service
        .move_topic(
            topics[0].topic_uuid,
            Some(topics[2].topic_uuid),
            Some(topics[1].topic_uuid),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TopicServiceError::NeighborsOutOfOrder { after, before }
            if after == topics[2].topic_uuid && before == topics[1].topic_uuid
    ));

    // Failed moves leave ranks untouched.
    let reloaded = service.get_topic(topics[0].topic_uuid).unwrap();
    assert_eq!(reloaded.rank.as_str(), "aaaa");
}

#[test]
fn corrupt_persisted_rank_is_invalid_data() {
    let conn = setup();
    let service = service(&conn);
    let (_, topics) = meeting_with(&service, &["T1"]);

    conn.execute(
        "UPDATE topics SET rank = 'AB1' WHERE topic_uuid = ?1;",
        [topics[0].topic_uuid.to_string()],
    )
    .unwrap();

    let err = service.get_topic(topics[0].topic_uuid).unwrap_err();
    assert!(matches!(
        err,
        TopicServiceError::Repo(TopicRepoError::InvalidData(ref message)) if message.contains("AB1")
    ));
}

#[test]
fn repository_requires_migrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let result = SqliteTopicRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(TopicRepoError::UninitializedConnection {
            actual_version: 0,
            ..
        })
    ));
}

#[test]
fn repository_get_meeting_and_topic() {
    let conn = setup();
    let repo = SqliteTopicRepository::try_new(&conn).unwrap();

    let meeting = repo.create_meeting("Retro").unwrap();
    let loaded = repo.get_meeting(meeting.meeting_uuid).unwrap().unwrap();
    assert_eq!(loaded, meeting);
    assert!(repo.get_meeting(Uuid::new_v4()).unwrap().is_none());

    let topic = repo.create_topic(meeting.meeting_uuid, "Wins").unwrap();
    assert_eq!(repo.get_topic(topic.topic_uuid).unwrap(), Some(topic.clone()));

    repo.delete_topic(topic.topic_uuid).unwrap();
    assert!(repo.get_topic(topic.topic_uuid).unwrap().is_none());
}

#[test]
fn deleting_meeting_cascades_topics() {
    let conn = setup();
    let service = service(&conn);
    let (meeting, topics) = meeting_with(&service, &["T1", "T2"]);

    conn.execute(
        "DELETE FROM meetings WHERE meeting_uuid = ?1;",
        [meeting.meeting_uuid.to_string()],
    )
    .unwrap();

    let err = service.get_topic(topics[0].topic_uuid).unwrap_err();
    assert!(matches!(err, TopicServiceError::TopicNotFound(_)));
}

#[test]
fn topic_serializes_rank_as_string() {
    let conn = setup();
    let service = service(&conn);
    let (_, topics) = meeting_with(&service, &["T1"]);

    let value = serde_json::to_value(&topics[0]).unwrap();
    assert_eq!(value["rank"], "aaaa");
    assert_eq!(value["title"], "T1");
}
