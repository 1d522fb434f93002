//! Repository tests against a real PostgreSQL

mod helpers;

use assert_matches::assert_matches;
use serial_test::serial;

use helpers::{date, event_request, news_request, TestDatabase};
use RunRace::models::event::{EventStatus, UpdateEventRequest};
use RunRace::models::news::UpdateNewsRequest;
use RunRace::policy::NewRegistration;
use RunRace::RunRaceError;

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn test_event_crud_and_summary_counts() {
    let db = TestDatabase::new().await;
    let repos = db.database();

    let event = repos.events.create(event_request("Bali Marathon", date(2025, 9, 7))).await.unwrap();
    assert_eq!(event.status, "upcoming");

    let summary = repos.events.get_summary(event.id).await.unwrap().unwrap();
    assert_eq!(summary.registration_count, 0);

    let updated = repos.events.update(event.id, UpdateEventRequest {
        event_date: Some(date(2025, 9, 14)),
        status: Some(EventStatus::Ongoing),
        ..Default::default()
    }).await.unwrap();
    assert_eq!(updated.event_date, date(2025, 9, 14));
    assert_eq!(updated.status, "ongoing");
    assert_eq!(updated.name, "Bali Marathon");

    assert_matches!(
        repos.events.update(9999, UpdateEventRequest::default()).await,
        Err(RunRaceError::EventNotFound { event_id: 9999 })
    );

    assert!(repos.events.delete(event.id).await.unwrap());
    assert!(!repos.events.delete(event.id).await.unwrap());
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn test_event_list_ordering_and_filter() {
    let db = TestDatabase::new().await;
    let repos = db.database();

    let late = db.create_event("Late", date(2025, 12, 1)).await;
    let early = db.create_event("Early", date(2025, 10, 1)).await;
    repos.events.update(late.id, UpdateEventRequest {
        status: Some(EventStatus::Completed),
        ..Default::default()
    }).await.unwrap();

    let all = repos.events.list(None).await.unwrap();
    let ids: Vec<i64> = all.iter().map(|summary| summary.event.id).collect();
    assert_eq!(ids, vec![early.id, late.id]);

    let completed = repos.events.list(Some(EventStatus::Completed)).await.unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].event.id, late.id);
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn test_unique_pair_constraint() {
    let db = TestDatabase::new().await;
    let repos = db.database();
    let user = db.create_user(1001).await;
    let event = db.create_event("Borobudur Marathon", date(2025, 11, 16)).await;

    let pair = NewRegistration { user_id: user.id, event_id: event.id };
    repos.registrations.insert(pair).await.unwrap();

    match repos.registrations.insert(pair).await {
        Err(RunRaceError::Database(sqlx::Error::Database(db_error))) => assert!(db_error.is_unique_violation()),
        other => panic!("expected unique violation, got {:?}", other),
    }

    assert_eq!(repos.registrations.count_for_event(event.id).await.unwrap(), 1);
    assert_eq!(repos.registrations.find_for_pair(user.id, event.id).await.unwrap().len(), 1);
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn test_deleting_event_removes_registrations() {
    let db = TestDatabase::new().await;
    let repos = db.database();
    let user = db.create_user(1002).await;
    let event = db.create_event("Pocari Run", date(2025, 7, 20)).await;

    repos.registrations.insert(NewRegistration { user_id: user.id, event_id: event.id }).await.unwrap();
    assert_eq!(repos.registrations.count().await.unwrap(), 1);

    repos.events.delete(event.id).await.unwrap();
    assert_eq!(repos.registrations.count().await.unwrap(), 0);
    assert!(repos.registrations.list_for_user(user.id).await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn test_participants_most_recent_first() {
    let db = TestDatabase::new().await;
    let repos = db.database();
    let first = db.create_user(2001).await;
    let second = db.create_user(2002).await;
    let event = db.create_event("Maybank Marathon", date(2025, 8, 24)).await;

    repos.registrations.insert(NewRegistration { user_id: first.id, event_id: event.id }).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    repos.registrations.insert(NewRegistration { user_id: second.id, event_id: event.id }).await.unwrap();

    let participants = repos.registrations.participants(event.id).await.unwrap();
    let telegram_ids: Vec<i64> = participants.iter().map(|p| p.telegram_id).collect();
    assert_eq!(telegram_ids, vec![2002, 2001]);
    assert_eq!(participants[0].display_name(), "Test (@runner2002)");

    let removed = repos.registrations.delete(first.id, event.id).await.unwrap();
    assert_eq!(removed, 1);
    assert_eq!(repos.registrations.delete(first.id, event.id).await.unwrap(), 0);
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn test_user_lookup_and_language_update() {
    let db = TestDatabase::new().await;
    let repos = db.database();
    let user = db.create_user(3001).await;

    let by_id = repos.users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(by_id.telegram_id, 3001);
    assert!(repos.users.find_by_telegram_id(9999).await.unwrap().is_none());

    let updated = repos.users.update(user.id, RunRace::models::UpdateUserRequest {
        language_code: Some("en".to_string()),
        ..Default::default()
    }).await.unwrap();
    assert_eq!(updated.language_code, "en");
    assert_eq!(updated.username.as_deref(), Some("runner3001"));
    assert_eq!(repos.users.count().await.unwrap(), 1);
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn test_news_listing_newest_first() {
    let db = TestDatabase::new().await;
    let repos = db.database();

    let older = repos.news.create(news_request("Route announced")).await.unwrap();
    let newer = repos.news.create(news_request("Bib numbers out")).await.unwrap();

    let listed = repos.news.list_recent(10).await.unwrap();
    assert_eq!(listed.iter().map(|n| n.id).collect::<Vec<_>>(), vec![newer.id, older.id]);
    assert_eq!(repos.news.list_recent(1).await.unwrap().len(), 1);

    let edited = repos.news.update(older.id, UpdateNewsRequest {
        image_url: Some("https://cdn.example.com/route.png".to_string()),
        ..Default::default()
    }).await.unwrap();
    assert_eq!(edited.title, "Route announced");
    assert_eq!(edited.image_url.as_deref(), Some("https://cdn.example.com/route.png"));

    assert_matches!(
        repos.news.update(9999, UpdateNewsRequest::default()).await,
        Err(RunRaceError::NewsNotFound { news_id: 9999 })
    );
    assert!(repos.news.delete(older.id).await.unwrap());
    assert!(!repos.news.delete(older.id).await.unwrap());
    assert_eq!(repos.news.count().await.unwrap(), 1);
}
