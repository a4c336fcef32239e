//! End-to-end credential flow across the stores and the resolver.

use std::sync::Arc;

use relaymeter_core::{ConfigSource, CredentialPair};
use relaymeter_store::{ConfigResolver, SettingsStore, StateStore};

#[tokio::test]
async fn test_discovered_credentials_yield_to_manual_settings() {
    let dir = tempfile::tempdir().unwrap();
    let claude_path = dir.path().join("claude-settings.json");
    tokio::fs::write(
        &claude_path,
        r#"{"env": {"ANTHROPIC_AUTH_TOKEN": "cr_discovered_0001", "ANTHROPIC_BASE_URL": "https://relay.example.com/api"}}"#,
    )
    .await
    .unwrap();

    let settings = SettingsStore::new(dir.path().join("settings.json"));
    let state = Arc::new(StateStore::load(dir.path().join("state.json")).await);
    let resolver = ConfigResolver::new(Arc::clone(&state), claude_path);

    // Nothing configured: the file is adopted as runtime.
    let first = resolver.resolve(&settings.manual_config().await).await.unwrap();
    assert!(first.auto_configured);
    assert_eq!(
        state.runtime_config().await,
        Some(CredentialPair::new("https://relay.example.com", "cr_discovered_0001"))
    );

    // The user types a full manual config: it wins, runtime stays untouched.
    settings.set("apiUrl", "https://manual.example.com").await.unwrap();
    settings.set("apiKey", "cr_manual_0002").await.unwrap();
    let second = resolver.resolve(&settings.manual_config().await).await.unwrap();
    let effective = second.effective.unwrap();
    assert_eq!(effective.source, ConfigSource::Manual);
    assert_eq!(effective.credential(), Some("cr_manual_0002"));
    assert!(state.runtime_config().await.is_some());

    // Clearing manual settings falls back to the persisted runtime pair.
    settings.reset().await.unwrap();
    let reloaded = Arc::new(StateStore::load(state.path().to_path_buf()).await);
    let resolver = ConfigResolver::new(reloaded, resolver.claude_settings_path().to_path_buf());
    let third = resolver.resolve(&settings.manual_config().await).await.unwrap();
    assert_eq!(third.effective.unwrap().source, ConfigSource::Runtime);
    assert!(!third.auto_configured);
}
