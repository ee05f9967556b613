//! End-to-end tests: a file-backed library, a real decoder worker script,
//! and real game processes.
//!
//! The worker and games are small shell scripts, so these only run on Unix.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use thlauncher_core::events::{self, LauncherEvent};
use thlauncher_core::lifecycle::CoordinatorOptions;
use thlauncher_core::replay::{JSON_END, JSON_START, report_path};
use thlauncher_core::{
    GameLifecycleCoordinator, GameStore, JsonStore, ReplayDirectoryScanner, WorkerDecoder,
};
use thlauncher_shared::Game;

fn write_script(path: &Path, body: &str) {
    std::fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// Worker that answers from a `<replay>.json` fixture next to each replay,
/// or fails like a real decoder when there is none.
fn fixture_worker(dir: &Path) -> WorkerDecoder {
    let script = dir.join("decode.sh");
    write_script(
        &script,
        &format!(
            r#"echo "decoding $1" >&2
if [ ! -f "$1.json" ]; then
  echo "Traceback (most recent call last): unsupported replay" >&2
  exit 1
fi
echo "{}"
cat "$1.json"
echo
echo "{}""#,
            JSON_START, JSON_END
        ),
    );
    WorkerDecoder::new(script.display().to_string(), Vec::<String>::new())
        .with_timeout(Duration::from_secs(10))
}

fn add_replay(dir: &Path, name: &str, payload: Option<&str>) {
    std::fs::write(dir.join(name), b"T6RP").unwrap();
    if let Some(payload) = payload {
        std::fs::write(dir.join(format!("{}.json", name)), payload).unwrap();
    }
}

fn installed_game(number: u32, title: &str, install: &Path) -> Game {
    let mut game = Game::new(number, "", title, "");
    game.install_path = install.display().to_string();
    game.exe_name = "game.sh".to_string();
    game.replay_dir = "replay".to_string();
    game.installed = true;
    game
}

#[test]
fn test_scan_library_with_worker() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(JsonStore::open(temp.path().join("library.json")).unwrap());

    let th06 = temp.path().join("th06");
    let th08 = temp.path().join("th08");
    for dir in [&th06, &th08] {
        std::fs::create_dir_all(dir.join("replay")).unwrap();
    }
    store.insert_game(installed_game(6, "东方红魔乡", &th06)).unwrap();
    store.insert_game(installed_game(8, "东方永夜抄", &th08)).unwrap();

    let replays06 = th06.join("replay");
    add_replay(
        &replays06,
        "th6_01.rpy",
        Some(
            r#"{"baseInfoDic": {"character": "Reimu", "shottype": "A", "rank": "Normal", "stage": "6"},
                "date": "2015/02/17 22:23", "stageScore": [100, 250, 900]}"#,
        ),
    );
    add_replay(&replays06, "th6_02.RPY", None);
    add_replay(&replays06, "notes.txt", None);

    let replays08 = th08.join("replay");
    add_replay(
        &replays08,
        "th8_01.rpy",
        Some(
            r#"{"baseInfoDic": {"character": "Yuyuko", "shottype": "", "rank": "Lunatic", "stage": "Final B"},
                "date": "2016/05/01 10:00", "stageScore": [], "errors": ["stage 3 score missing"]}"#,
        ),
    );

    let scanner = ReplayDirectoryScanner::new(store.clone(), Arc::new(fixture_worker(temp.path())));
    let report = scanner.scan_all_games_report();

    let names: Vec<&str> = report.replays.iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(names, vec!["th8_01.rpy", "th6_01.rpy"]);

    let th8 = &report.replays[0];
    assert_eq!(th8.game_version, "TH08");
    assert_eq!(th8.game_title, "TH08 - 东方永夜抄");
    assert_eq!(th8.score, 0);
    assert_eq!(th8.errors, vec!["stage 3 score missing"]);

    let th6 = &report.replays[1];
    assert_eq!(th6.game_version, "TH06");
    assert_eq!(th6.shot_type, "Reimu A");
    assert_eq!(th6.score, 900);

    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].path.ends_with("th6_02.RPY"));

    // Reports only for successful decodes.
    assert!(report_path(&replays06.join("th6_01.rpy")).exists());
    assert!(report_path(&replays08.join("th8_01.rpy")).exists());
    assert!(!report_path(&replays06.join("th6_02.RPY")).exists());
}

#[test]
fn test_play_time_persists_across_reopen() {
    let temp = TempDir::new().unwrap();
    let library = temp.path().join("library.json");
    let install = temp.path().join("th07");
    std::fs::create_dir_all(&install).unwrap();
    write_script(&install.join("game.sh"), "sleep 2");

    let game_id = {
        let store = Arc::new(JsonStore::open(&library).unwrap());
        let game_id = store
            .insert_game(installed_game(7, "东方妖妖梦", &install))
            .unwrap();
        let game = store.game_by_id(game_id).unwrap();

        let (tx, queue) = events::channel();
        let options = CoordinatorOptions {
            countdown_interval: Duration::from_millis(10),
            monitor_poll: Duration::from_millis(5),
        };
        let coordinator = GameLifecycleCoordinator::new(store.clone(), tx, options).unwrap();
        coordinator.launch(game).unwrap();

        let total = loop {
            match queue.next_timeout(Duration::from_secs(10)) {
                Some(LauncherEvent::GameEnded {
                    total_play_seconds, ..
                }) => break total_play_seconds,
                Some(_) => {}
                None => panic!("game never ended"),
            }
        };
        assert!(total >= 1);

        coordinator.shutdown();
        drop(coordinator);
        Arc::try_unwrap(store).ok().unwrap().close().unwrap();
        game_id
    };

    let store = JsonStore::open(&library).unwrap();
    let game = store.game_by_id(game_id).unwrap();
    let sessions = store.sessions_for_game(game_id);
    assert_eq!(sessions.len(), 1);
    assert!(!sessions[0].is_open());
    assert_eq!(game.total_play_seconds, sessions[0].duration_seconds);
    assert_eq!(store.total_play_time(game_id), game.total_play_seconds);
    assert!(game.last_played.is_some());
}
