//! MongoThreadStore against a real MongoDB.
//!
//! Requires Docker: `cargo test -p domain_assistant -- --ignored`

use domain_assistant::{MongoThreadStore, Thread, ThreadMessage, ThreadStore};
use test_utils::TestMongo;

#[tokio::test]
#[ignore] // Requires Docker
async fn test_upsert_and_reload() {
    let mongo = TestMongo::new().await;
    let store = MongoThreadStore::new(mongo.database("assistant_threads"));

    let mut thread = Thread::new();
    thread.messages.push(ThreadMessage::user("any jazz this week?"));
    store.save(thread.clone()).await.unwrap();

    thread.messages.push(ThreadMessage::assistant("===\nTry Jazz night 🎷"));
    store.save(thread.clone()).await.unwrap();

    let loaded = store.get(&thread.id).await.unwrap().unwrap();
    assert_eq!(loaded.messages, thread.messages);
    assert!(store.get("missing").await.unwrap().is_none());
}
