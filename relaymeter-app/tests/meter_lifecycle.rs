//! Meter lifecycle: activation, polling, failures, focus, settings.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{harness, manual_id, wait_for, write_claude, StubSource, API_ID, API_URL, RESOLVED_ID};
use relaymeter_app::{CycleOutcome, FileEvent, WatcherState};
use relaymeter_core::{CommandId, CredentialPair, Language, MissingConfig, StatusColor};
use tokio::sync::Notify;

#[tokio::test]
async fn test_activate_renders_daily_usage() {
    let h = &harness(StubSource::new(40.0, 100.0), manual_id).await;

    h.meter.activate().await.unwrap();

    assert_eq!(h.presenter.last_text().as_deref(), Some("📊 $40/$100 40%"));
    assert_eq!(h.presenter.last_color(), Some(StatusColor::Hex("#66BB6A".to_string())));
    assert_eq!(*h.presenter.command.lock().unwrap(), Some(CommandId::RefreshStats));
    assert!(h.meter.is_timer_running().await);
    assert!(h.meter.last_snapshot().await.is_some());

    let texts = h.presenter.texts.lock().unwrap().clone();
    assert!(texts[0].starts_with('⟳'));
}

#[tokio::test]
async fn test_unconfigured_activation_prompts_once() {
    let h = &harness(StubSource::new(0.0, 0.0), |_| {}).await;

    h.meter.activate().await.unwrap();

    assert_eq!(h.presenter.last_text().as_deref(), Some("⚙ Configuration needed"));
    assert!(!h.meter.is_timer_running().await);
    assert!(wait_for(|| async move { h.window.warning_count() == 1 }).await);
    let (_, actions) = h.window.warnings.lock().unwrap()[0].clone();
    assert_eq!(actions, vec!["Configure now".to_string(), "Later".to_string()]);
    assert_eq!(h.source.fetch_count(), 0);
}

#[tokio::test]
async fn test_failure_streak_notifies_once() {
    let source = StubSource::new(0.0, 0.0);
    source.fail.store(true, Ordering::SeqCst);
    let h = &harness(source, manual_id).await;

    for _ in 0..3 {
        assert!(matches!(h.meter.update_stats().await, CycleOutcome::Failed(_)));
    }
    assert_eq!(h.source.fetch_count(), 9);
    assert!(wait_for(|| async move { h.window.error_count() == 1 }).await);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(h.window.error_count(), 1);

    let text = h.presenter.last_text().unwrap();
    assert!(text.starts_with("⚠ "));
    assert!(text.contains("relay unavailable"));

    // Recovery ends the streak; the next failure notifies again.
    h.source.fail.store(false, Ordering::SeqCst);
    assert_eq!(h.meter.update_stats().await, CycleOutcome::Updated);
    assert_eq!(h.meter.last_error().await, None);

    h.source.fail.store(true, Ordering::SeqCst);
    h.meter.update_stats().await;
    assert!(wait_for(|| async move { h.window.error_count() == 2 }).await);
}

#[tokio::test]
async fn test_retry_from_error_notification_runs_another_cycle() {
    let source = StubSource::new(0.0, 0.0);
    source.fail.store(true, Ordering::SeqCst);
    let h = &harness(source, manual_id).await;
    h.window.answer_errors([Some(0)]);

    assert!(matches!(h.meter.update_stats().await, CycleOutcome::Failed(_)));
    assert_eq!(h.source.fetch_count(), 3);

    assert!(wait_for(|| async move { h.source.fetch_count() == 6 }).await);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.source.fetch_count(), 6);
    // The retry continues the streak, so nothing new is raised.
    assert_eq!(h.window.error_count(), 1);
    let (_, actions) = h.window.errors.lock().unwrap()[0].clone();
    assert_eq!(actions[0], "Retry");
}

#[tokio::test]
async fn test_overlapping_refresh_is_skipped() {
    let h = &harness(StubSource::new(1.0, 10.0), manual_id).await;
    let gate = Arc::new(Notify::new());
    *h.source.gate.lock().unwrap() = Some(Arc::clone(&gate));

    let meter = h.meter.clone();
    let first = tokio::spawn(async move { meter.update_stats().await });
    h.source.started.notified().await;

    assert_eq!(h.meter.update_stats().await, CycleOutcome::Skipped);

    gate.notify_one();
    assert_eq!(first.await.unwrap(), CycleOutcome::Updated);
    assert_eq!(h.source.fetch_count(), 1);
}

#[tokio::test]
async fn test_key_is_resolved_to_id_each_cycle() {
    let h = &harness(StubSource::new(1.0, 10.0), |s| {
        s.api_url = API_URL.to_string();
        s.api_key = "cr_0123456789abcdef".to_string();
    })
    .await;

    assert_eq!(h.meter.update_stats().await, CycleOutcome::Updated);
    assert_eq!(h.source.resolves.load(Ordering::SeqCst), 1);
    assert_eq!(h.source.fetched_ids.lock().unwrap().as_slice(), [RESOLVED_ID]);
}

#[tokio::test]
async fn test_invalid_id_shows_unconfigured() {
    let h = &harness(StubSource::new(1.0, 10.0), |s| {
        s.api_url = API_URL.to_string();
        s.api_id = "not-a-uuid".to_string();
    })
    .await;

    assert_eq!(
        h.meter.update_stats().await,
        CycleOutcome::Unconfigured(MissingConfig::ApiId)
    );
    assert_eq!(h.source.fetch_count(), 0);
}

#[tokio::test]
async fn test_focus_regained_refreshes() {
    let h = &harness(StubSource::new(1.0, 10.0), manual_id).await;
    h.meter.activate().await.unwrap();
    assert_eq!(h.source.fetch_count(), 1);

    h.focus.send(false).unwrap();
    assert!(wait_for(|| async move { !h.meter.is_focused().await }).await);
    assert_eq!(h.source.fetch_count(), 1);

    h.focus.send(true).unwrap();
    assert!(wait_for(|| async move { h.source.fetch_count() == 2 }).await);
    assert!(h.meter.is_timer_running().await);
}

#[tokio::test(start_paused = true)]
async fn test_timer_polls_only_while_focused() {
    let h = &harness(StubSource::new(1.0, 10.0), manual_id).await;
    h.meter.activate().await.unwrap();
    assert_eq!(h.source.fetch_count(), 1);
    let period = h.settings.effective_refresh_interval().await;

    tokio::time::sleep(period + Duration::from_secs(1)).await;
    assert!(wait_for(|| async move { h.source.fetch_count() == 2 }).await);

    h.focus.send(false).unwrap();
    assert!(wait_for(|| async move { !h.meter.is_focused().await }).await);

    tokio::time::sleep(period * 3).await;
    assert_eq!(h.source.fetch_count(), 2);
    assert!(h.meter.is_timer_running().await);
}

#[tokio::test]
async fn test_settings_changes_apply_live() {
    let h = &harness(StubSource::new(1.0, 10.0), manual_id).await;
    h.meter.activate().await.unwrap();

    h.settings.set("language", "zh").await.unwrap();
    assert!(wait_for(|| async move { h.meter.translator().await.language() == Language::Zh }).await);
    assert!(wait_for(|| async move { h.source.fetch_count() >= 2 }).await);

    h.settings.set("enableLogging", "false").await.unwrap();
    assert!(wait_for(|| async move { h.logging.lock().unwrap().as_slice() == [false] }).await);
}

#[tokio::test]
async fn test_auto_configures_from_claude_settings() {
    let h = &harness(StubSource::new(1.0, 10.0), |_| {}).await;
    write_claude(&h.claude_path(), API_URL, "cr_discovered_0001").await;

    h.meter.activate().await.unwrap();

    assert_eq!(
        h.state.runtime_config().await,
        Some(CredentialPair::new(API_URL, "cr_discovered_0001"))
    );
    assert!(h.window.infos.lock().unwrap()[0].contains("claude-settings.json"));
    assert_eq!(h.source.fetch_count(), 1);
    assert!(wait_for(|| async move { h.meter.watcher_state().await == WatcherState::Watching }).await);
    assert_eq!(h.window.warning_count(), 0);
}

#[tokio::test]
async fn test_pair_found_after_unconfigured_start_prompts_then_polls() {
    let h = &harness(StubSource::new(1.0, 10.0), |_| {}).await;
    let token_only = serde_json::json!({ "env": { "ANTHROPIC_AUTH_TOKEN": "cr_discovered_0001" } });
    tokio::fs::write(h.claude_path(), token_only.to_string()).await.unwrap();
    h.window.answer_warnings([None, Some(0)]);

    h.meter.activate().await.unwrap();
    assert!(!h.meter.is_timer_running().await);
    assert!(wait_for(|| async move { h.window.warning_count() == 1 }).await);
    assert!(wait_for(|| async move { h.meter.watcher_state().await == WatcherState::Watching }).await);

    write_claude(&h.claude_path(), API_URL, "cr_discovered_0001").await;
    h.file_tx.send(FileEvent::Changed).await.unwrap();

    assert!(wait_for(|| async move { h.source.fetch_count() == 1 }).await);
    assert_eq!(h.window.warning_count(), 2);
    assert_eq!(
        h.state.runtime_config().await,
        Some(CredentialPair::new(API_URL, "cr_discovered_0001"))
    );
    assert!(wait_for(|| async move { h.meter.is_timer_running().await }).await);
    assert!(h.presenter.last_text().unwrap().starts_with("📊"));
}

#[tokio::test]
async fn test_deactivate_stops_everything() {
    let h = &harness(StubSource::new(1.0, 10.0), |_| {}).await;
    write_claude(&h.claude_path(), API_URL, "cr_discovered_0001").await;
    h.meter.activate().await.unwrap();

    h.meter.deactivate().await;

    assert!(!h.meter.is_timer_running().await);
    assert_eq!(h.meter.watcher_state().await, WatcherState::Idle);

    // Settings changes no longer reach the meter.
    let before = h.source.fetch_count();
    h.settings.set("refreshInterval", "30").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(h.source.fetch_count(), before);
}

// ============================================================================
// Commands
// ============================================================================

#[tokio::test]
async fn test_open_dashboard_with_and_without_argument() {
    let h = &harness(StubSource::new(1.0, 10.0), manual_id).await;

    h.meter
        .execute(CommandId::OpenWebDashboard, Some("https://x.example.com/d".to_string()))
        .await
        .unwrap();
    h.meter.execute(CommandId::OpenWebDashboard, None).await.unwrap();

    let opened = h.window.opened.lock().unwrap().clone();
    assert_eq!(opened[0], "https://x.example.com/d");
    assert_eq!(
        opened[1],
        format!("{API_URL}/admin-next/api-stats?apiId={API_ID}")
    );
}

#[tokio::test]
async fn test_select_language_persists() {
    let h = &harness(StubSource::new(1.0, 10.0), manual_id).await;
    *h.window.pick.lock().unwrap() = Some("中文".to_string());

    h.meter.execute(CommandId::SelectLanguage, None).await.unwrap();

    assert_eq!(h.settings.language().await, Language::Zh);
    let saved = tokio::fs::read_to_string(h.settings.path()).await.unwrap();
    assert!(saved.contains(r#""language": "zh""#));
    assert_eq!(h.window.info_count(), 1);
}

#[tokio::test]
async fn test_reload_and_clear_state() {
    let h = &harness(StubSource::new(1.0, 10.0), |_| {}).await;

    h.meter.execute(CommandId::ReloadCredentials, None).await.unwrap();
    assert_eq!(h.window.warning_count(), 1);
    assert_eq!(h.state.runtime_config().await, None);

    write_claude(&h.claude_path(), API_URL, "cr_discovered_0001").await;
    h.meter.execute(CommandId::ReloadCredentials, None).await.unwrap();
    assert!(h.state.runtime_config().await.is_some());
    assert_eq!(h.source.fetch_count(), 1);

    h.meter.execute(CommandId::ClearState, None).await.unwrap();
    assert_eq!(h.state.skipped_config().await, None);
    assert!(h.window.infos.lock().unwrap().iter().any(|m| m.contains("cleared")));
}

#[tokio::test]
async fn test_reload_with_manual_config_keeps_fallback() {
    let h = &harness(StubSource::new(1.0, 10.0), manual_id).await;
    write_claude(&h.claude_path(), API_URL, "cr_discovered_0001").await;

    h.meter.execute(CommandId::ReloadCredentials, None).await.unwrap();

    assert_eq!(
        h.state.runtime_config().await,
        Some(CredentialPair::new(API_URL, "cr_discovered_0001"))
    );
    assert!(h.window.infos.lock().unwrap()[0].contains("Manual settings"));
    assert_eq!(h.source.fetch_count(), 0);
}

#[tokio::test]
async fn test_open_settings_command() {
    let h = &harness(StubSource::new(1.0, 10.0), manual_id).await;
    h.meter.execute(CommandId::OpenSettings, None).await.unwrap();
    assert_eq!(h.window.settings_opened.load(Ordering::SeqCst), 1);
}
