use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use psm_core::{CopiedItem, CopySelection, ManagerError, SaveManager, ServerLayout, ToolConfig};

// Server root with an active world `ACTIVE` and the given extra worlds
// (folder, optional name.txt).
fn setup(root: &Path, worlds: &[(&str, Option<&str>)]) -> SaveManager {
    let layout = ServerLayout::new(root);
    let saves = layout.saves_dir();
    fs::create_dir_all(saves.join("ACTIVE")).unwrap();
    fs::write(saves.join("ACTIVE").join("name.txt"), "Main\n").unwrap();
    for (folder, name) in worlds {
        fs::create_dir_all(saves.join(folder)).unwrap();
        if let Some(n) = name {
            fs::write(saves.join(folder).join("name.txt"), n).unwrap();
        }
    }
    SaveManager::open(layout, "ACTIVE").unwrap()
}

fn dir_names(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .flatten()
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn listing_excludes_active_and_trash() {
    let d = tempfile::tempdir().unwrap();
    let m = setup(d.path(), &[("world1", Some("  Island  ")), ("abc", None)]);
    fs::create_dir_all(m.layout().saves_dir().join("__trash__old")).unwrap();
    fs::write(m.layout().saves_dir().join("stray.txt"), "x").unwrap();

    let worlds = m.worlds().unwrap();
    let pairs: Vec<_> = worlds
        .iter()
        .map(|w| (w.folder.as_str(), w.display_name.as_str()))
        .collect();
    assert_eq!(pairs, vec![("abc", "abc"), ("world1", "Island")]);
    assert!(worlds.iter().all(|w| w.modified.is_some()));
    assert_eq!(m.active_display_name(), "Main");
}

#[test]
fn open_requires_existing_active_folder() {
    let d = tempfile::tempdir().unwrap();
    let layout = ServerLayout::new(d.path());
    fs::create_dir_all(layout.saves_dir()).unwrap();
    let err = SaveManager::open(layout.clone(), "MISSING").unwrap_err();
    assert!(matches!(err, ManagerError::WorldNotFound(_)));
    assert!(SaveManager::open(layout, "../escape").is_err());
}

#[test]
fn detects_active_id_from_game_user_settings() {
    let d = tempfile::tempdir().unwrap();
    let layout = ServerLayout::new(d.path());
    assert_eq!(psm_core::detect_active_id(&layout).unwrap(), None);

    fs::create_dir_all(layout.config_dir()).unwrap();
    fs::write(
        layout.game_user_settings(),
        "[/Script/Pal.PalGameLocalSettings]\nDedicatedServerName=ABC123\n",
    )
    .unwrap();
    // Named folder does not exist yet.
    assert_eq!(psm_core::detect_active_id(&layout).unwrap(), None);

    fs::create_dir_all(layout.world_dir("ABC123")).unwrap();
    assert_eq!(
        psm_core::detect_active_id(&layout).unwrap().as_deref(),
        Some("ABC123")
    );
}

#[test]
fn switch_archives_active_under_lowest_free_world_name() {
    let d = tempfile::tempdir().unwrap();
    let m = setup(
        d.path(),
        &[("world1", Some("One")), ("world3", None), ("target", Some("Target"))],
    );
    let saves = m.layout().saves_dir();
    let mut expected = dir_names(&saves);

    let report = m.switch_to("target").unwrap();
    assert_eq!(report.archived_as, "world2");
    assert_eq!(report.activated, "Target");

    expected.remove("target");
    expected.insert("world2".to_string());
    assert_eq!(dir_names(&saves), expected);
    assert_eq!(m.active_display_name(), "Target");
    assert_eq!(
        fs::read_to_string(saves.join("world2").join("name.txt")).unwrap(),
        "Main\n"
    );
}

#[test]
fn switch_rejects_active_and_unknown_worlds() {
    let d = tempfile::tempdir().unwrap();
    let m = setup(d.path(), &[]);
    assert!(matches!(
        m.switch_to("ACTIVE"),
        Err(ManagerError::ActiveWorld(_))
    ));
    assert!(matches!(
        m.switch_to("nope"),
        Err(ManagerError::WorldNotFound(_))
    ));
    assert!(m.layout().world_dir("ACTIVE").is_dir());
}

#[test]
fn switch_parks_and_restores_mods() {
    let d = tempfile::tempdir().unwrap();
    let m = setup(d.path(), &[("world1", Some("Modded"))]);
    let layout = m.layout().clone();

    // Live mods of the current world.
    let live_mods = layout.paks_dir().join("~mods");
    fs::create_dir_all(&live_mods).unwrap();
    fs::write(live_mods.join("a.pak"), "A").unwrap();
    fs::create_dir_all(layout.binaries_dir()).unwrap();
    fs::write(layout.binaries_dir().join("dwmapi.dll"), "dll").unwrap();
    fs::write(layout.default_settings(), "defaults").unwrap();

    // Parked mods and settings of the target world.
    let parked = layout.world_dir("world1").join("Mods").join("LogicMods");
    fs::create_dir_all(parked.join("nested")).unwrap();
    fs::write(parked.join("nested").join("b.pak"), "B").unwrap();
    fs::write(
        layout.world_dir("world1").join("PalWorldSettings.ini"),
        "target settings",
    )
    .unwrap();

    m.switch_to("world1").unwrap();

    let archived_mods = layout.world_dir("world2").join("Mods");
    assert_eq!(
        fs::read_to_string(archived_mods.join("~mods").join("a.pak")).unwrap(),
        "A"
    );
    assert_eq!(
        fs::read_to_string(archived_mods.join("dwmapi.dll")).unwrap(),
        "dll"
    );
    assert!(!live_mods.exists());
    assert!(!layout.binaries_dir().join("dwmapi.dll").exists());
    assert_eq!(
        fs::read_to_string(layout.paks_dir().join("LogicMods").join("nested").join("b.pak"))
            .unwrap(),
        "B"
    );
    assert_eq!(
        fs::read_to_string(layout.live_settings()).unwrap(),
        "target settings"
    );
}

#[test]
fn switch_without_world_settings_leaves_defaults_live() {
    let d = tempfile::tempdir().unwrap();
    let m = setup(d.path(), &[("world1", None)]);
    fs::write(m.layout().default_settings(), "defaults").unwrap();
    m.switch_to("world1").unwrap();
    assert_eq!(
        fs::read_to_string(m.layout().live_settings()).unwrap(),
        "defaults"
    );
}

#[test]
fn create_world_archives_active_and_seeds_settings() {
    let d = tempfile::tempdir().unwrap();
    let m = setup(d.path(), &[]);
    fs::write(m.layout().default_settings(), "defaults").unwrap();

    let report = m.create_world("  Fresh Start ").unwrap();
    assert_eq!(report.archived_as, "world1");
    assert_eq!(report.display_name, "Fresh Start");
    let active = m.layout().world_dir("ACTIVE");
    assert_eq!(
        fs::read_to_string(active.join("name.txt")).unwrap(),
        "Fresh Start"
    );
    assert_eq!(
        fs::read_to_string(active.join("PalWorldSettings.ini")).unwrap(),
        "defaults"
    );
    let worlds = m.worlds().unwrap();
    assert_eq!(worlds.len(), 1);
    assert_eq!(worlds[0].display_name, "Main");
}

#[test]
fn create_world_with_blank_name_uses_default() {
    let d = tempfile::tempdir().unwrap();
    let m = setup(d.path(), &[]);
    let report = m.create_world("   ").unwrap();
    assert_eq!(report.display_name, "New World");
    let settings = m.layout().world_dir("ACTIVE").join("PalWorldSettings.ini");
    assert_eq!(fs::read_to_string(settings).unwrap(), "");
}

#[test]
fn trash_moves_world_with_timestamp_suffix() {
    let d = tempfile::tempdir().unwrap();
    let m = setup(d.path(), &[("world1", Some("Doomed"))]);

    let name = m.trash_world_at("world1", 1_700_000_000).unwrap();
    assert_eq!(name, "world1_1700000000");
    assert!(m.worlds().unwrap().is_empty());
    let trash = m.trash().unwrap();
    assert_eq!(trash.len(), 1);
    assert_eq!(trash[0].folder, "world1_1700000000");
    assert_eq!(trash[0].display_name, "Doomed");

    assert!(matches!(
        m.trash_world("ACTIVE"),
        Err(ManagerError::ActiveWorld(_))
    ));
}

#[test]
fn restore_picks_non_colliding_name() {
    let d = tempfile::tempdir().unwrap();
    let m = setup(
        d.path(),
        &[("Doomed", None), ("Doomed_1", None), ("world1", Some("Doomed"))],
    );
    let trashed = m.trash_world_at("world1", 42).unwrap();

    let restored = m.restore_from_trash(&trashed).unwrap();
    assert_eq!(restored, "Doomed_2");
    assert!(m.trash().unwrap().is_empty());
    assert!(m.layout().world_dir("Doomed_2").is_dir());
    assert!(matches!(
        m.restore_from_trash(&trashed),
        Err(ManagerError::NotInTrash(_))
    ));
}

#[test]
fn restore_sanitizes_display_name() {
    let d = tempfile::tempdir().unwrap();
    let m = setup(d.path(), &[("world1", Some("a/b:c"))]);
    let trashed = m.trash_world_at("world1", 1).unwrap();
    assert_eq!(m.restore_from_trash(&trashed).unwrap(), "a_b_c");
}

#[test]
fn clear_trash_empties_trash() {
    let d = tempfile::tempdir().unwrap();
    let m = setup(d.path(), &[("world1", None), ("world2", None)]);
    m.trash_world_at("world1", 1).unwrap();
    m.trash_world_at("world2", 2).unwrap();
    assert_eq!(m.clear_trash().unwrap(), 2);
    assert!(m.trash().unwrap().is_empty());
    assert!(m.layout().trash_dir().is_dir());
}

#[cfg(unix)]
#[test]
fn clear_trash_removes_folders_with_non_utf8_names() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let d = tempfile::tempdir().unwrap();
    let m = setup(d.path(), &[("world1", None)]);
    m.trash_world_at("world1", 7).unwrap();
    let odd = m.layout().trash_dir().join(OsStr::from_bytes(b"w\xff_1"));
    fs::create_dir_all(odd.join("inner")).unwrap();

    assert_eq!(m.clear_trash().unwrap(), 2);
    assert_eq!(fs::read_dir(m.layout().trash_dir()).unwrap().count(), 0);
}

#[test]
fn rename_writes_name_file_only() {
    let d = tempfile::tempdir().unwrap();
    let m = setup(d.path(), &[("world1", None)]);
    let before = dir_names(&m.layout().saves_dir());

    m.rename_world("world1", " Renamed ").unwrap();
    m.rename_world("ACTIVE", "Home").unwrap();

    assert_eq!(dir_names(&m.layout().saves_dir()), before);
    assert_eq!(m.worlds().unwrap()[0].display_name, "Renamed");
    assert_eq!(m.active_display_name(), "Home");
    assert!(matches!(
        m.rename_world("world1", "  "),
        Err(ManagerError::InvalidName(_))
    ));
}

#[test]
fn copy_settings_and_mods_into_active() {
    let d = tempfile::tempdir().unwrap();
    let m = setup(d.path(), &[("world1", None)]);
    let layout = m.layout().clone();
    let src = layout.world_dir("world1");
    fs::write(src.join("PalWorldSettings.ini"), "copied").unwrap();
    fs::create_dir_all(src.join("Mods").join("ue4ss")).unwrap();
    fs::write(src.join("Mods").join("ue4ss").join("cfg.txt"), "u").unwrap();

    let settings_only = m.copy_into_active("world1", CopySelection::Settings).unwrap();
    assert_eq!(settings_only, vec![CopiedItem::Settings]);
    assert!(!layout.binaries_dir().join("ue4ss").exists());

    let both = m.copy_into_active("world1", CopySelection::Both).unwrap();
    assert_eq!(both, vec![CopiedItem::Settings, CopiedItem::Mod("ue4ss")]);
    let active = layout.world_dir("ACTIVE");
    assert_eq!(
        fs::read_to_string(active.join("PalWorldSettings.ini")).unwrap(),
        "copied"
    );
    assert_eq!(fs::read_to_string(layout.live_settings()).unwrap(), "copied");
    assert!(active.join("Mods").join("ue4ss").join("cfg.txt").is_file());
    assert!(layout.binaries_dir().join("ue4ss").join("cfg.txt").is_file());
}

#[test]
fn launch_without_executable_fails() {
    let d = tempfile::tempdir().unwrap();
    let m = setup(d.path(), &[]);
    assert!(matches!(
        m.launch_server(),
        Err(ManagerError::ServerNotFound(_))
    ));
}

#[cfg(unix)]
#[test]
fn launch_starts_server_script_in_root() {
    use std::os::unix::fs::PermissionsExt;

    let d = tempfile::tempdir().unwrap();
    let m = setup(d.path(), &[]);
    let exe = m.layout().server_exe();
    fs::write(&exe, "#!/bin/sh\ntouch launched\n").unwrap();
    fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();

    let pid = m.launch_server().unwrap();
    assert!(pid > 0);
    let marker = d.path().join("launched");
    for _ in 0..100 {
        if marker.exists() {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
    assert!(marker.exists());
}

#[test]
fn archive_world_writes_zip_outside_saves() {
    let d = tempfile::tempdir().unwrap();
    let m = setup(d.path(), &[("world1", Some("Zipped"))]);
    fs::create_dir_all(m.layout().world_dir("world1").join("Players")).unwrap();
    fs::write(
        m.layout().world_dir("world1").join("Players").join("p.sav"),
        [1u8, 2, 3],
    )
    .unwrap();

    let zip = m.archive_world("world1").unwrap();
    assert!(zip.is_file());
    assert!(zip.starts_with(m.layout().archive_dir()));
    assert_eq!(zip.extension().and_then(|s| s.to_str()), Some("zip"));
    let names: Vec<_> = m.worlds().unwrap().into_iter().map(|w| w.folder).collect();
    assert_eq!(names, vec!["world1".to_string()]);
}

#[test]
fn tool_config_roundtrip_and_first_run() {
    let d = tempfile::tempdir().unwrap();
    let path = d.path().join("config.ini");
    assert_eq!(ToolConfig::load(&path).unwrap(), None);

    let cfg = ToolConfig::new(r"C:\Program Files (x86)\Steam\SteamApps\common\PalServer");
    cfg.save(&path).unwrap();
    assert_eq!(ToolConfig::load(&path).unwrap(), Some(cfg));

    fs::write(&path, "[DEFAULT]\n").unwrap();
    assert!(matches!(
        ToolConfig::load(&path),
        Err(ManagerError::Config(_))
    ));
}

#[test]
fn name_helpers() {
    let d = tempfile::tempdir().unwrap();
    assert_eq!(psm_core::next_world_name(d.path()), "world1");
    fs::create_dir(d.path().join("world1")).unwrap();
    fs::write(d.path().join("world2"), "file counts too").unwrap();
    assert_eq!(psm_core::next_world_name(d.path()), "world3");

    assert_eq!(psm_core::unique_name(d.path(), "fresh"), "fresh");
    assert_eq!(psm_core::unique_name(d.path(), "world1"), "world1_1");
    assert_eq!(psm_core::worlds::sanitize_folder_name("  "), "world");
    assert_eq!(
        psm_core::worlds::sanitize_folder_name("__trash__x"),
        "world__trash__x"
    );
}
