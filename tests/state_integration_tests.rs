//! Integration tests for AppContext and StateStore change events
//!
//! These tests verify that:
//! - Opening a context loads the on-disk state into the store
//! - Refreshes republish state and surface per-file scan issues
//! - Engine mutations reach subscribers
//! - Malformed singletons do not prevent startup
//! - A rescan racing a toggle or profile change never leaves the store
//!   disagreeing with disk

use camino::{Utf8Path, Utf8PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use tempfile::TempDir;
use tokio::sync::Notify;
use tokio::sync::broadcast::Receiver;
use tokio::time::{Duration, timeout};
use weave_manager::models::ModInfo;
use weave_manager::repository::{JarManifestReader, ManifestReader};
use weave_manager::services::{GithubReleaseSource, Sha256Integrity};
use weave_manager::{
    AppContext, Collaborators, DirectoryKind, EngineConfig, Layout, ModProfile, Settings, StateChange,
    SyncResult,
};

/// Manifest reader that, once armed, parks the scan until released.
struct GatedReader {
    armed: AtomicBool,
    entered: Notify,
    release: Mutex<mpsc::Receiver<()>>,
}

impl ManifestReader for GatedReader {
    fn read_manifest(&self, _jar: &Utf8Path) -> SyncResult<ModInfo> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            let _ = self.release.lock().unwrap().recv();
        }
        Ok(ModInfo::default())
    }
}

fn create_test_layout() -> (Layout, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp_dir.path().join(".weave")).unwrap();
    (Layout::new(root), temp_dir)
}

async fn open(layout: &Layout) -> AppContext {
    open_with(layout, Arc::new(JarManifestReader)).await
}

async fn open_with(layout: &Layout, manifests: Arc<dyn ManifestReader>) -> AppContext {
    let config = EngineConfig::default();
    // Never contacted by these tests
    let collaborators = Collaborators {
        manifests,
        releases: Arc::new(GithubReleaseSource::new(&config).unwrap()),
        integrity: Arc::new(Sha256Integrity::new(layout.loader_file())),
    };
    AppContext::open(layout.clone(), &config, collaborators)
        .await
        .unwrap()
}

async fn next_event(rx: &mut Receiver<StateChange>) -> StateChange {
    timeout(Duration::from_millis(500), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed")
}

#[tokio::test]
async fn test_open_creates_tree_and_loads_state() {
    let (layout, _temp_dir) = create_test_layout();
    let mods = layout.path_of(DirectoryKind::Mods);
    std::fs::create_dir_all(&mods).unwrap();
    std::fs::write(mods.join("A.jar"), b"").unwrap();
    std::fs::write(mods.join("B.jar.disabled"), b"").unwrap();

    let context = open(&layout).await;

    for kind in DirectoryKind::all() {
        assert!(layout.path_of(*kind).is_dir(), "{:?} was not created", kind);
    }
    let state = context.store().snapshot();
    assert_eq!(state.mods.len(), 2);
    assert_eq!(state.enabled_mods().len(), 1);
    assert_eq!(state.settings, Settings::default());
    assert!(layout.settings_file().is_file());
}

#[tokio::test]
async fn test_malformed_settings_fall_back_to_defaults() {
    let (layout, _temp_dir) = create_test_layout();
    std::fs::create_dir_all(layout.root()).unwrap();
    std::fs::write(layout.settings_file(), "{ definitely not json").unwrap();

    let context = open(&layout).await;

    assert_eq!(context.store().read(|s| s.settings.clone()), Settings::default());
    // The user's file is left alone
    assert_eq!(
        std::fs::read_to_string(layout.settings_file()).unwrap(),
        "{ definitely not json"
    );
}

#[tokio::test]
async fn test_settings_update_recovers_from_malformed_file() {
    let (layout, _temp_dir) = create_test_layout();
    std::fs::create_dir_all(layout.root()).unwrap();
    std::fs::write(layout.settings_file(), "{ definitely not json").unwrap();
    let context = open(&layout).await;

    let updated = context
        .update_settings(|s| s.loader_version = Some("v1.2.0".to_string()))
        .await
        .unwrap();

    assert_eq!(updated.loader_version.as_deref(), Some("v1.2.0"));
    assert_eq!(context.repository().read_settings().await.unwrap(), updated);
    assert_eq!(context.store().read(|s| s.settings.clone()), updated);
    assert!(layout.root().join("manager.settings.corrupt").is_file());
}

#[tokio::test]
async fn test_refresh_profiles_reports_scan_issue() {
    let (layout, _temp_dir) = create_test_layout();
    let context = open(&layout).await;
    context
        .profiles()
        .save_mod_profile(&ModProfile::snapshot("Fine", &[]))
        .await
        .unwrap();
    let broken = layout.path_of(DirectoryKind::Profiles).join("broken.mprof");
    std::fs::write(&broken, "[").unwrap();

    let mut rx = context.store().subscribe();
    context.refresh_profiles().await.unwrap();

    let event = next_event(&mut rx).await;
    assert!(
        matches!(&event, StateChange::ScanIssue { path, .. } if path == broken.as_str()),
        "Expected ScanIssue for {}, got: {:?}",
        broken,
        event
    );
    assert!(context.store().read(|s| s.mod_profiles.contains_key("fine")));
}

#[tokio::test]
async fn test_refresh_mods_picks_up_new_jars() {
    let (layout, _temp_dir) = create_test_layout();
    let context = open(&layout).await;
    let mut rx = context.store().subscribe();

    std::fs::write(layout.path_of(DirectoryKind::Mods).join("New.jar"), b"").unwrap();
    let count = context.refresh_mods().await.unwrap();

    assert_eq!(count, 1);
    assert_eq!(
        next_event(&mut rx).await,
        StateChange::ModsChanged {
            enabled: 1,
            total: 1
        }
    );
    // Empty jar has no readable manifest
    assert!(matches!(next_event(&mut rx).await, StateChange::ScanIssue { .. }));
}

#[tokio::test]
async fn test_toggle_reaches_subscribers() {
    let (layout, _temp_dir) = create_test_layout();
    std::fs::create_dir_all(layout.path_of(DirectoryKind::Mods)).unwrap();
    std::fs::write(layout.path_of(DirectoryKind::Mods).join("A.jar"), b"").unwrap();
    let context = open(&layout).await;
    let mut rx = context.store().subscribe();

    let a = context.store().read(|s| s.find_mod("A.jar").cloned()).unwrap();
    context.toggles().toggle_mod(&a).await.unwrap();

    assert_eq!(
        next_event(&mut rx).await,
        StateChange::ModsChanged {
            enabled: 0,
            total: 1
        }
    );
}

#[tokio::test]
async fn test_update_settings_persists_then_publishes() {
    let (layout, _temp_dir) = create_test_layout();
    let context = open(&layout).await;
    let mut rx = context.store().subscribe();

    context
        .update_settings(|s| {
            s.compact_buttons = true;
            s.ignore_updates = true;
        })
        .await
        .unwrap();

    assert_eq!(next_event(&mut rx).await, StateChange::SettingsChanged);
    let on_disk = context.repository().read_settings().await.unwrap();
    assert!(on_disk.compact_buttons);
    assert!(on_disk.ignore_updates);
    assert_eq!(context.store().read(|s| s.settings.clone()), on_disk);
}

#[tokio::test]
async fn test_shutdown_event() {
    let (layout, _temp_dir) = create_test_layout();
    let context = open(&layout).await;
    let mut rx = context.store().subscribe();

    context.shutdown();

    assert_eq!(next_event(&mut rx).await, StateChange::Shutdown);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_toggle_during_refresh_keeps_store_in_step_with_disk() {
    let (layout, _temp_dir) = create_test_layout();
    let mods = layout.path_of(DirectoryKind::Mods);
    std::fs::create_dir_all(&mods).unwrap();
    std::fs::write(mods.join("A.jar"), b"").unwrap();

    let (release_tx, release_rx) = mpsc::channel();
    let reader = Arc::new(GatedReader {
        armed: AtomicBool::new(false),
        entered: Notify::new(),
        release: Mutex::new(release_rx),
    });
    let context = open_with(&layout, reader.clone()).await;
    let a = context.store().read(|s| s.find_mod("A.jar").cloned()).unwrap();

    reader.armed.store(true, Ordering::SeqCst);
    let refresh = {
        let context = context.clone();
        tokio::spawn(async move { context.refresh_mods().await })
    };
    timeout(Duration::from_secs(2), reader.entered.notified())
        .await
        .expect("Refresh never reached the manifest reader");

    // The listing above still says A.jar is enabled
    let toggle = {
        let context = context.clone();
        tokio::spawn(async move { context.toggles().toggle_mod(&a).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    release_tx.send(()).unwrap();

    timeout(Duration::from_secs(2), refresh)
        .await
        .expect("Refresh hung")
        .unwrap()
        .unwrap();
    let toggled = timeout(Duration::from_secs(2), toggle)
        .await
        .expect("Toggle hung")
        .unwrap()
        .unwrap();
    assert!(toggled.disabled);

    let stored = context.store().read(|s| s.find_mod("A.jar").cloned()).unwrap();
    assert!(stored.disabled, "Store reverted a toggle that is on disk");
    assert!(mods.join("A.jar.disabled").is_file());
    assert!(!mods.join("A.jar").exists());

    // Not stuck: the next toggle renames back
    let enabled = context.toggles().toggle_mod(&stored).await.unwrap();
    assert!(!enabled.disabled);
    assert!(mods.join("A.jar").is_file());
}

#[tokio::test]
async fn test_profile_reload_waits_for_in_flight_mutation() {
    let (layout, _temp_dir) = create_test_layout();
    let context = open(&layout).await;

    // Stand-in for a create that has written its file but not yet published
    let in_flight = context.repository().share_catalog().await;
    std::fs::write(
        layout.path_of(DirectoryKind::Profiles).join("late.mprof"),
        r#"{"name":"Late","mods":[]}"#,
    )
    .unwrap();

    let reload = {
        let context = context.clone();
        tokio::spawn(async move { context.refresh_profiles().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!reload.is_finished(), "Reload must wait for the mutation");

    drop(in_flight);
    timeout(Duration::from_secs(2), reload)
        .await
        .expect("Reload hung")
        .unwrap()
        .unwrap();
    assert!(context.store().read(|s| s.mod_profiles.contains_key("late")));
}
