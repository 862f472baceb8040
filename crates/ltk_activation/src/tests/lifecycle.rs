use super::mock::{MockHelper, GAME_PATH};
use super::{custom, orchestrator, skin};
use crate::helper::BrowseOutcome;
use crate::selection::ActivationRequest;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_stop_without_overlay_still_calls_helper() {
    let (orchestrator, helper) = orchestrator(MockHelper::new());
    assert!(!orchestrator.is_overlay_running());

    let response = orchestrator.stop().await;
    let response_again = orchestrator.stop().await;

    assert!(response.success);
    assert!(response_again.success);
    assert_eq!(helper.stop_calls.load(Ordering::SeqCst), 2);
    assert!(!orchestrator.is_overlay_running());
}

#[tokio::test]
async fn test_stop_keeps_fingerprint_and_cache() {
    let (orchestrator, helper) = orchestrator(MockHelper::new());
    let request = ActivationRequest::new(vec![skin(1, 101)], vec![custom("c1")]);

    orchestrator.activate(&request, |_| {}).await.unwrap();
    assert!(orchestrator.is_overlay_running());

    orchestrator.stop().await;
    assert!(!orchestrator.is_overlay_running());

    let summary = orchestrator.activate(&request, |_| {}).await.unwrap();
    assert!(summary.selection_unchanged);
    assert_eq!(helper.download_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_stop_leaves_flag_set() {
    let (orchestrator, helper) = orchestrator(MockHelper::new());
    orchestrator
        .activate(&ActivationRequest::new(vec![], vec![custom("c1")]), |_| {})
        .await
        .unwrap();

    helper.stop_success.store(false, Ordering::SeqCst);
    let response = orchestrator.stop().await;

    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("Access denied"));
    assert!(orchestrator.is_overlay_running());
}

#[tokio::test]
async fn test_check_overlay_status_syncs_flag() {
    let (orchestrator, helper) = orchestrator(MockHelper::new());

    helper.overlay_running.store(true, Ordering::SeqCst);
    assert!(orchestrator.check_overlay_status().await);
    assert!(orchestrator.is_overlay_running());

    helper.overlay_running.store(false, Ordering::SeqCst);
    assert!(!orchestrator.check_overlay_status().await);
    assert!(!orchestrator.is_overlay_running());
}

#[tokio::test]
async fn test_manual_game_path_skips_detection() {
    let (orchestrator, helper) = orchestrator(MockHelper::new().without_game());
    let manual = Utf8Path::new("D:/Games/League of Legends/Game");

    orchestrator.set_game_path(manual).await.unwrap();
    orchestrator
        .activate(&ActivationRequest::new(vec![], vec![custom("c1")]), |_| {})
        .await
        .unwrap();

    assert_eq!(helper.detect_calls.load(Ordering::SeqCst), 0);
    assert_eq!(helper.last_activate_request().game_path.as_path(), manual);
}

#[tokio::test]
async fn test_rejected_game_path_is_not_cached() {
    let (orchestrator, _helper) = orchestrator(MockHelper::new());

    assert!(orchestrator.set_game_path(Utf8Path::new("")).await.is_err());
    assert_eq!(orchestrator.game_path(), None);
}

#[tokio::test]
async fn test_clear_game_path_triggers_detection() {
    let (orchestrator, helper) = orchestrator(MockHelper::new());
    let request = ActivationRequest::new(vec![], vec![custom("c1")]);

    orchestrator.activate(&request, |_| {}).await.unwrap();
    assert!(orchestrator.clear_game_path().await);
    assert_eq!(orchestrator.game_path(), None);

    orchestrator.activate(&request, |_| {}).await.unwrap();
    assert_eq!(helper.detect_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_browse_selection_becomes_game_path() {
    let (orchestrator, helper) = orchestrator(MockHelper::new());
    let picked = Utf8PathBuf::from("E:/League/Game");

    assert_eq!(orchestrator.browse_game_path().await, BrowseOutcome::Cancelled);
    assert_eq!(orchestrator.game_path(), None);

    *helper.browse_outcome.lock().unwrap() = BrowseOutcome::Selected(picked.clone());
    assert_eq!(
        orchestrator.browse_game_path().await,
        BrowseOutcome::Selected(picked.clone())
    );
    assert_eq!(orchestrator.game_path(), Some(picked));
    assert_ne!(orchestrator.game_path(), Some(Utf8PathBuf::from(GAME_PATH)));
}
