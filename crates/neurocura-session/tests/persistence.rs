use std::sync::Arc;

use neurocura_session::{
    EditOutcome, JsonFileStore, JsonFileStoreConfig, Message, SessionManager,
};
use tempfile::TempDir;

async fn open(dir: &TempDir) -> SessionManager {
    let store = JsonFileStore::new(JsonFileStoreConfig::new(dir.path()))
        .await
        .unwrap();
    let (manager, report) = SessionManager::open(Arc::new(store)).await.unwrap();
    assert!(!report.has_failures());
    manager
}

#[tokio::test]
async fn demo_conversation_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = open(&temp_dir).await;

    let id = manager
        .create(Some("Demo".to_string()))
        .await
        .unwrap()
        .id()
        .to_string();

    let session = manager.require_mut(&id).unwrap();
    session.add_message(Message::user("Hello"));
    session.add_message(Message::assistant("Hi there"));
    manager.persist(&id).await.unwrap();

    let restarted = open(&temp_dir).await;
    let session = restarted.get(&id).unwrap();
    assert_eq!(session.title(), "Demo");
    let pairs: Vec<_> = session
        .messages()
        .iter()
        .map(|m| (m.text(), m.is_user()))
        .collect();
    assert_eq!(pairs, vec![("Hello", true), ("Hi there", false)]);
}

#[tokio::test]
async fn edit_history_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = open(&temp_dir).await;
    let id = manager.create(None).await.unwrap().id().to_string();

    let session = manager.require_mut(&id).unwrap();
    session.add_message(Message::user("Hello"));
    session.add_message(Message::assistant("Hi there"));
    let outcome = session.edit_message(0, "Hello!").unwrap();
    assert!(matches!(outcome, EditOutcome::Regenerate(_)));
    session.insert_message(1, Message::assistant("Hello again"));
    manager.persist(&id).await.unwrap();

    let restarted = open(&temp_dir).await;
    let session = restarted.get(&id).unwrap();
    assert_eq!(session.messages()[0].text(), "Hello!");
    assert_eq!(session.messages()[0].edit_history(), ["Hello"]);
    assert_eq!(session.messages()[1].text(), "Hello again");
    assert_eq!(session.created_at(), manager.get(&id).unwrap().created_at());
}

#[tokio::test]
async fn files_deleted_outside_disappear_on_reload() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = open(&temp_dir).await;
    let keep = manager.create(None).await.unwrap().id().to_string();
    let gone = manager.create(None).await.unwrap().id().to_string();

    std::fs::remove_file(temp_dir.path().join(format!("{}.json", gone))).unwrap();

    let report = manager.load_all().await.unwrap();
    assert_eq!(report.loaded, vec![keep.clone()]);
    assert!(manager.get(&gone).is_none());
    assert!(manager.get(&keep).is_some());
}
