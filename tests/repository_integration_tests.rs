//! Integration tests for the repository layer
//!
//! These tests verify that the Repository correctly:
//! - Creates profiles at most once per sanitized name
//! - Round-trips both profile kinds through disk
//! - Saves launch profiles and their mod profiles as one unit
//! - Isolates unreadable files during scans
//! - Initializes singletons on first access

use camino::Utf8PathBuf;
use proptest::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;
use weave_manager::models::{ClientType, MinecraftInfo, ModInfo};
use weave_manager::repository::JarManifestReader;
use weave_manager::sanitize::sanitize_file_name;
use weave_manager::{DirectoryKind, LaunchProfile, Layout, Mod, ModProfile, Repository, Settings, SyncError};

fn create_test_repository() -> (Repository, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp_dir.path().join(".weave")).unwrap();
    let repository = Repository::new(Layout::new(root), Arc::new(JarManifestReader));
    (repository, temp_dir)
}

fn jar(repository: &Repository, name: &str, disabled: bool) -> Mod {
    Mod {
        mod_info: ModInfo {
            name: name.trim_end_matches(".jar").to_string(),
            version: "1.0.0".to_string(),
            description: "test mod".to_string(),
            authors: vec!["tester".to_string()],
        },
        file_path: repository.layout().path_of(DirectoryKind::Mods).join(name),
        file_name: name.to_string(),
        disabled,
    }
}

fn lunar() -> MinecraftInfo {
    MinecraftInfo {
        client: ClientType::Lunar,
        version: "1.8.9".to_string(),
        cmd: vec!["java".to_string(), "-jar".to_string(), "lunar.jar".to_string()],
        cwd: "/home/player/.lunarclient".to_string(),
    }
}

#[tokio::test]
async fn test_create_collision_keeps_first_file() {
    let (repository, _temp_dir) = create_test_repository();
    let first = ModProfile::snapshot("PvP Pack", &[jar(&repository, "A.jar", false)]);
    let second = ModProfile::snapshot("pvp-pack", &[]);

    repository.create_profile(&first).await.unwrap();
    let (_, path) = repository.profile_location::<ModProfile>(&first.name).unwrap();
    let before = std::fs::read(&path).unwrap();

    let result = repository.create_profile(&second).await;

    assert!(
        matches!(result, Err(SyncError::AlreadyExists { .. })),
        "Expected AlreadyExists, got: {:?}",
        result
    );
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_colliding_names_create_once(base in "[a-z]{1,8}", sep_a in "[ _.-]", sep_b in "[ _.-]") {
        let n1 = format!("{base}{sep_a}x");
        let n2 = format!("{base}{sep_b}X");
        prop_assume!(n1 != n2);
        prop_assert_eq!(sanitize_file_name(&n1), sanitize_file_name(&n2));

        let (repository, _temp_dir) = create_test_repository();
        let outcome = tokio_test::block_on(async {
            let first = repository.create_profile(&ModProfile::snapshot(n1.clone(), &[])).await;
            let second = repository.create_profile(&ModProfile::snapshot(n2.clone(), &[])).await;
            let stored = repository.read_profiles::<ModProfile>().await.unwrap();
            (first, second, stored)
        });

        prop_assert!(outcome.0.is_ok());
        let second_is_collision = matches!(outcome.1, Err(SyncError::AlreadyExists { .. }));
        prop_assert!(second_is_collision);
        prop_assert_eq!(outcome.2.items.len(), 1);
        prop_assert_eq!(&outcome.2.items[0].name, &n1);
    }
}

#[tokio::test]
async fn test_concurrent_creates_only_one_wins() {
    let (repository, _temp_dir) = create_test_repository();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let repository = repository.clone();
            tokio::spawn(async move {
                let profile = ModProfile::snapshot(if i % 2 == 0 { "Race" } else { "race" }, &[]);
                repository.create_profile(&profile).await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            created += 1;
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test]
async fn test_mod_profile_round_trip() {
    let (repository, _temp_dir) = create_test_repository();
    let profile = ModProfile::snapshot(
        "Hypixel",
        &[jar(&repository, "A.jar", false), jar(&repository, "B.jar", false)],
    );

    repository.save_profile(&profile).await.unwrap();
    let report = repository.read_profiles::<ModProfile>().await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.items.get("hypixel"), Some(&profile));
}

#[tokio::test]
async fn test_launch_profile_round_trip() {
    let (repository, _temp_dir) = create_test_repository();
    let profile = LaunchProfile {
        name: "Lunar 1.8".to_string(),
        mc_info: lunar(),
        mod_profile: Some(ModProfile::snapshot("Lunar Mods", &[jar(&repository, "A.jar", false)])),
    };

    repository.save_launch_profile(&profile).await.unwrap();

    let launch = repository.read_profiles::<LaunchProfile>().await.unwrap();
    assert_eq!(launch.items.get("lunar_1_8"), Some(&profile));

    // Cascade wrote the embedded mod profile too
    let mods = repository.read_profiles::<ModProfile>().await.unwrap();
    assert_eq!(mods.items.get("lunar_mods"), profile.mod_profile.as_ref());
}

#[tokio::test]
async fn test_failed_launch_save_restores_mod_profile() {
    let (repository, _temp_dir) = create_test_repository();
    let original = ModProfile::snapshot("Shared", &[jar(&repository, "A.jar", false)]);
    repository.save_profile(&original).await.unwrap();

    // A directory where the launch profile file should go makes its rename fail
    let (_, launch_path) = repository.profile_location::<LaunchProfile>("Broken").unwrap();
    std::fs::create_dir_all(&launch_path).unwrap();
    std::fs::write(launch_path.join("keep"), b"x").unwrap();

    let profile = LaunchProfile {
        name: "Broken".to_string(),
        mc_info: lunar(),
        mod_profile: Some(ModProfile::snapshot("Shared", &[])),
    };
    let result = repository.save_launch_profile(&profile).await;

    assert!(result.is_err());
    let mods = repository.read_profiles::<ModProfile>().await.unwrap();
    assert_eq!(mods.items.get("shared"), Some(&original));
}

#[tokio::test]
async fn test_failed_launch_save_removes_new_mod_profile() {
    let (repository, _temp_dir) = create_test_repository();
    let (_, launch_path) = repository.profile_location::<LaunchProfile>("Broken").unwrap();
    std::fs::create_dir_all(&launch_path).unwrap();
    std::fs::write(launch_path.join("keep"), b"x").unwrap();

    let profile = LaunchProfile {
        name: "Broken".to_string(),
        mc_info: lunar(),
        mod_profile: Some(ModProfile::snapshot("Fresh", &[])),
    };
    assert!(repository.save_launch_profile(&profile).await.is_err());

    let (_, mod_path) = repository.profile_location::<ModProfile>("Fresh").unwrap();
    assert!(!mod_path.exists());
}

#[tokio::test]
async fn test_unparsable_profile_is_isolated() {
    let (repository, _temp_dir) = create_test_repository();
    repository
        .save_profile(&ModProfile::snapshot("Good", &[]))
        .await
        .unwrap();
    repository
        .save_profile(&ModProfile::snapshot("Also Good", &[]))
        .await
        .unwrap();
    let profiles_dir = repository.layout().path_of(DirectoryKind::Profiles);
    std::fs::write(profiles_dir.join("broken.mprof"), "{\"name\": ").unwrap();

    let report = repository.read_profiles::<ModProfile>().await.unwrap();

    assert_eq!(
        report.items.keys().collect::<Vec<_>>(),
        vec!["also_good", "good"]
    );
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].path, profiles_dir.join("broken.mprof"));
    assert!(matches!(report.issues[0].error, SyncError::Parse { .. }));
}

#[tokio::test]
async fn test_read_mods_scenario() {
    let (repository, _temp_dir) = create_test_repository();
    let mods_dir = repository.layout().resolve(DirectoryKind::Mods).await.unwrap();
    std::fs::write(mods_dir.join("A.jar"), b"").unwrap();
    std::fs::write(mods_dir.join("B.jar.disabled"), b"").unwrap();

    let report = repository.read_mods().await.unwrap();

    // Empty files are not zips; both stay listed
    assert_eq!(report.items.len(), 2);
    assert_eq!(report.issues.len(), 2);
    let a = &report.items[0];
    let b = &report.items[1];
    assert_eq!((a.file_name.as_str(), a.disabled), ("A.jar", false));
    assert_eq!((b.file_name.as_str(), b.disabled), ("B.jar", true));
    assert_eq!(a.file_path, mods_dir.join("A.jar"));
    assert_eq!(b.file_path, mods_dir.join("B.jar"));
    assert_eq!(b.mod_info, ModInfo::default());
}

#[tokio::test]
async fn test_settings_absent_initializes_defaults() {
    let (repository, _temp_dir) = create_test_repository();
    let path = repository.layout().settings_file();
    assert!(!path.exists());

    let settings = repository.read_settings().await.unwrap();

    assert_eq!(settings, Settings::default());
    let on_disk = std::fs::read_to_string(&path).unwrap();
    assert_eq!(on_disk, serde_json::to_string(&Settings::default()).unwrap());
}

#[tokio::test]
async fn test_process_history_absent_initializes_empty() {
    let (repository, _temp_dir) = create_test_repository();

    let history = repository.read_process_history().await.unwrap();

    assert!(history.history.is_empty());
    assert!(repository.layout().history_file().is_file());
}
