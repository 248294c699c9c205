//! Service lifecycle tests with scripted collaborators.

use pretty_assertions::assert_eq;
use rapport::config::{ConversationConfig, RapportConfig, StorageConfig};
use rapport::core::{AdvanceOutcome, StaticDirectory, TurnOutcome};
use rapport::memory::ConversationKey;
use rapport::{Rapport, RapportError};
use rapport_test_utils::{ScriptedGenerator, coaching_json, sample_persona, sample_profile};
use std::sync::Arc;
use tempfile::tempdir;

fn config_at(path: &std::path::Path) -> RapportConfig {
    RapportConfig::builder()
        .storage(StorageConfig {
            path: Some(path.to_string_lossy().to_string()),
        })
        .build()
}

fn directory() -> Arc<StaticDirectory> {
    Arc::new(
        StaticDirectory::new()
            .with_persona(sample_persona("maya", "Maya"))
            .with_profile("session-1", sample_profile("Sam")),
    )
}

#[tokio::test]
async fn chat_then_suggest_then_forget() {
    let temp = tempdir().expect("tempdir");
    let generator = Arc::new(
        ScriptedGenerator::new()
            .then_reply("omg hiii")
            .then_reply(coaching_json(4, "mention the climbing trip")),
    );
    let directory = directory();
    let rapport = Rapport::open_with(
        config_at(temp.path()),
        generator,
        directory.clone(),
        directory,
    )
    .expect("open");
    let key = ConversationKey::new("session-1", "maya");

    let outcome = rapport
        .conversations()
        .respond(&key, "hey maya")
        .await
        .expect("turn");
    assert_eq!(outcome.text(), "omg hiii");

    let advanced = rapport
        .recommendations()
        .advance(&key)
        .await
        .expect("advance");
    match advanced {
        AdvanceOutcome::Advanced {
            new_count,
            recommendations,
        } => {
            assert_eq!(new_count, 1);
            assert_eq!(recommendations[0].suggestion, "mention the climbing trip");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let forgotten = rapport.conversations().forget(&key).await.expect("forget");
    assert!(forgotten.removed_anything());
    rapport.close();
}

#[tokio::test]
async fn stores_survive_reopen() {
    let temp = tempdir().expect("tempdir");
    let key = ConversationKey::new("session-1", "maya");
    {
        let directory = directory();
        let rapport = Rapport::open_with(
            config_at(temp.path()),
            Arc::new(ScriptedGenerator::new().then_reply("see you")),
            directory.clone(),
            directory,
        )
        .expect("open");
        let outcome = rapport
            .conversations()
            .respond(&key, "bye")
            .await
            .expect("turn");
        assert!(matches!(outcome, TurnOutcome::Replied { .. }));
        rapport.close();
    }

    let directory = directory();
    let reopened = Rapport::open_with(
        config_at(temp.path()),
        Arc::new(ScriptedGenerator::new()),
        directory.clone(),
        directory,
    )
    .expect("reopen");
    let history = reopened.conversations().history(&key).await.expect("history");
    let contents = history
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>();
    assert_eq!(contents, vec!["bye", "see you"]);
    assert_eq!(reopened.storage_root(), temp.path());
}

#[test]
fn open_rejects_invalid_config() {
    let temp = tempdir().expect("tempdir");
    let config = RapportConfig::builder()
        .storage(StorageConfig {
            path: Some(temp.path().to_string_lossy().to_string()),
        })
        .conversation(ConversationConfig {
            max_turns: 0,
            ..ConversationConfig::default()
        })
        .build();
    let directory = directory();
    let result = Rapport::open_with(
        config,
        Arc::new(ScriptedGenerator::new()),
        directory.clone(),
        directory,
    );
    assert!(matches!(result, Err(RapportError::Config(_))));
}
