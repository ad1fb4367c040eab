//! MongoEventRepository against a real MongoDB.
//!
//! Requires Docker: `cargo test -p domain_events -- --ignored`

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use database::ensure_indexes;
use domain_events::{
    ChatMessage, Event, EventError, EventFilter, EventRepository, EventType,
    MongoEventRepository, models::NewEvent,
};
use test_utils::{TestDataBuilder, TestMongo};

async fn repository(mongo: &TestMongo, name: &str) -> MongoEventRepository {
    let db = mongo.database(name);
    ensure_indexes(&db, MongoEventRepository::indexes())
        .await
        .unwrap();
    MongoEventRepository::new(db)
}

fn event(data: &TestDataBuilder, name: &str, day: u32, price: f64) -> Event {
    Event::new(NewEvent {
        name: name.into(),
        description: "Integration".into(),
        date: Utc.with_ymd_and_hms(2025, 6, day, 18, 0, 0).unwrap(),
        price,
        event_type: EventType::Meetup,
        event_link: None,
        location: data.id(0),
        organizer: data.id(1),
        attendees: vec![data.id(2)],
        images: vec![],
    })
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_roundtrip_and_unique_name() {
    let mongo = TestMongo::new().await;
    let repo = repository(&mongo, "events_roundtrip").await;
    let data = TestDataBuilder::from_test_name("events_roundtrip");

    let created = repo.create(event(&data, "Expo", 5, 10.0)).await.unwrap();
    let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Expo");
    assert_eq!(fetched.organizer, data.id(1));
    assert_eq!(fetched.attendees, vec![data.id(2)]);

    assert!(repo.name_exists("Expo", None).await.unwrap());
    assert!(!repo.name_exists("Expo", Some(created.id)).await.unwrap());

    let err = repo.create(event(&data, "Expo", 6, 0.0)).await.unwrap_err();
    assert!(matches!(err, EventError::DuplicateName));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_filters_and_pagination() {
    let mongo = TestMongo::new().await;
    let repo = repository(&mongo, "events_filters").await;
    let data = TestDataBuilder::from_test_name("events_filters");

    for (i, (day, price)) in [(5, 0.0), (5, 15.0), (6, 30.0), (7, 45.0)].into_iter().enumerate() {
        repo.create(event(&data, &format!("Rust night {i}"), day, price))
            .await
            .unwrap();
    }

    let same_day = EventFilter {
        date: NaiveDate::from_ymd_opt(2025, 6, 5),
        ..Default::default()
    };
    assert_eq!(repo.count(same_day).await.unwrap(), 2);

    let priced = EventFilter {
        min_price: Some(10.0),
        max_price: Some(40.0),
        search: Some("RUST".into()),
        organizer: Some(data.id(1)),
        ..Default::default()
    };
    assert_eq!(repo.count(priced).await.unwrap(), 2);

    let page = EventFilter {
        page: 2,
        limit: 3,
        ..Default::default()
    };
    assert_eq!(repo.list(page).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_day_filter_boundaries_with_fractional_seconds() {
    let mongo = TestMongo::new().await;
    let repo = repository(&mongo, "events_day_bounds").await;
    let data = TestDataBuilder::from_test_name("events_day_bounds");
    let half_second = Duration::milliseconds(500);

    let mut early = event(&data, "Just after midnight", 5, 0.0);
    early.date = Utc.with_ymd_and_hms(2025, 6, 5, 0, 0, 0).unwrap() + half_second;
    let mut late = event(&data, "Last half second", 5, 0.0);
    late.date = Utc.with_ymd_and_hms(2025, 6, 5, 23, 59, 59).unwrap() + half_second;
    let mut next = event(&data, "Next day", 6, 0.0);
    next.date = Utc.with_ymd_and_hms(2025, 6, 6, 0, 0, 0).unwrap() + half_second;
    for e in [early, late, next] {
        repo.create(e).await.unwrap();
    }

    let filter = EventFilter {
        date: NaiveDate::from_ymd_opt(2025, 6, 5),
        ..Default::default()
    };
    let mut names: Vec<String> = repo
        .list(filter.clone())
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["Just after midnight", "Last half second"]);
    assert_eq!(repo.count(filter).await.unwrap(), 2);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_update_delete_and_messages() {
    let mongo = TestMongo::new().await;
    let repo = repository(&mongo, "events_update").await;
    let data = TestDataBuilder::from_test_name("events_update");

    let mut created = repo.create(event(&data, "Chatty", 5, 0.0)).await.unwrap();
    created.price = 25.0;
    repo.update(created.clone()).await.unwrap();
    assert_eq!(repo.get_by_id(created.id).await.unwrap().unwrap().price, 25.0);

    let message = ChatMessage {
        sender: "user".into(),
        text: "hi".into(),
        timestamp: Utc::now(),
        extra: [("avatar".to_string(), serde_json::json!("a.png"))].into(),
    };
    assert!(repo.push_message(created.id, message.clone()).await.unwrap());
    assert!(repo.push_message(created.id, message).await.unwrap());
    let messages = repo.get_by_id(created.id).await.unwrap().unwrap().messages;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].extra["avatar"], "a.png");

    assert!(repo.delete(created.id).await.unwrap());
    assert!(!repo.delete(created.id).await.unwrap());
    assert!(repo.get_by_id(created.id).await.unwrap().is_none());
}
