//! Flashcard review against the in-memory store.

mod common;

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use common::FlakyListing;
use neura_core::{Error, Flashcard, FlashcardStore, ScheduleError, StoreError};
use neura_memory::InMemoryStore;
use neura_pipeline::ReviewService;
use neura_srs::Sm2Scheduler;

const USER: &str = "alice";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap()
}

fn card(question: &str, due_in_hours: i64) -> Flashcard {
    let mut card = Flashcard::new(USER, "doc-1", question, "answer");
    card.schedule.next_review = now() + TimeDelta::hours(due_in_hours);
    card
}

async fn seeded(cards: Vec<Flashcard>) -> (InMemoryStore, Vec<String>) {
    let store = InMemoryStore::new();
    let ids = cards.iter().map(|c| c.id.clone()).collect();
    store.insert_flashcards(cards).await.unwrap();
    (store, ids)
}

fn service(store: &InMemoryStore) -> ReviewService {
    ReviewService::new(Sm2Scheduler::default(), Arc::new(store.clone()))
}

#[tokio::test]
async fn passing_review_points_to_next_due_card() {
    let (store, ids) = seeded(vec![
        card("first", -2),
        card("second", -1),
        card("later", 24),
    ])
    .await;

    let outcome = service(&store)
        .review_at(USER, &ids[0], 4, now())
        .await
        .unwrap();

    assert_eq!(outcome.card.schedule.repetitions, 1);
    assert_eq!(outcome.card.schedule.interval_days, 1);
    assert_eq!(outcome.card.last_reviewed, Some(now()));
    assert_eq!(outcome.next_card.as_ref().map(|c| c.id.as_str()), Some(ids[1].as_str()));
    assert_eq!(outcome.due_count, 1);
    assert_eq!(outcome.message, "Review again in 1 day");

    let stored = store.get_flashcard(USER, &ids[0]).await.unwrap().unwrap();
    assert_eq!(stored.schedule.next_review, now() + TimeDelta::days(1));
}

#[tokio::test]
async fn last_due_card_reports_nothing_left() {
    let (store, ids) = seeded(vec![card("only", 0), card("later", 48)]).await;

    let outcome = service(&store)
        .review_at(USER, &ids[0], 5, now())
        .await
        .unwrap();

    assert!(outcome.next_card.is_none());
    assert_eq!(outcome.due_count, 0);
    assert_eq!(outcome.message, "No more flashcards due");
}

#[tokio::test]
async fn failing_grade_resets_progress() {
    let mut mature = card("mature", -1);
    mature.schedule.repetitions = 6;
    mature.schedule.interval_days = 90;
    let (store, ids) = seeded(vec![mature]).await;

    let outcome = service(&store)
        .review_at(USER, &ids[0], 1, now())
        .await
        .unwrap();
    assert_eq!(outcome.card.schedule.repetitions, 0);
    assert_eq!(outcome.card.schedule.interval_days, 1);
}

#[tokio::test]
async fn invalid_quality_leaves_card_untouched() {
    let (store, ids) = seeded(vec![card("q", -1)]).await;

    let err = service(&store)
        .review_at(USER, &ids[0], 6, now())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Schedule(ScheduleError::InvalidQuality(6))));

    let stored = store.get_flashcard(USER, &ids[0]).await.unwrap().unwrap();
    assert!(stored.last_reviewed.is_none());
    assert_eq!(stored.schedule.repetitions, 0);
}

#[tokio::test]
async fn foreign_card_is_not_found() {
    let (store, ids) = seeded(vec![card("q", -1)]).await;
    let err = service(&store)
        .review_at("mallory", &ids[0], 4, now())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::NotFound { kind: "Flashcard", .. })));
}

#[tokio::test]
async fn listing_failure_degrades_to_nothing_due() {
    let (store, ids) = seeded(vec![card("a", -2), card("b", -1)]).await;
    let service = ReviewService::new(Sm2Scheduler::default(), Arc::new(FlakyListing(store)));

    let outcome = service.review_at(USER, &ids[0], 4, now()).await.unwrap();
    assert_eq!(outcome.card.schedule.repetitions, 1);
    assert!(outcome.next_card.is_none());
    assert_eq!(outcome.due_count, 0);
    assert_eq!(outcome.message, "No more flashcards due");
}

#[tokio::test]
async fn due_lists_earliest_first() {
    let past = Utc::now() - TimeDelta::days(3);
    let mut older = Flashcard::new(USER, "doc-1", "older", "a");
    older.schedule.next_review = past;
    let newer = Flashcard::new(USER, "doc-1", "newer", "a");
    let mut future = Flashcard::new(USER, "doc-1", "future", "a");
    future.schedule.next_review = Utc::now() + TimeDelta::days(3);
    let (store, _) = seeded(vec![newer, future, older]).await;

    let due = service(&store).due(USER, "doc-1", 10).await.unwrap();
    let questions: Vec<&str> = due.iter().map(|c| c.question.as_str()).collect();
    assert_eq!(questions, vec!["older", "newer"]);
}
