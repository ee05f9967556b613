//! Plain-text report written beside each decoded replay.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use thlauncher_shared::Replay;

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// `th06_01.rpy` -> `th06_01.rpy_info.txt`, in the same directory.
pub fn report_path(replay_path: &Path) -> PathBuf {
    let mut name = replay_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push("_info.txt");
    replay_path.with_file_name(name)
}

pub fn render_report(replay: &Replay, generated_at: DateTime<Local>) -> String {
    let or_unknown = |s: &str| (if s.is_empty() { "Unknown" } else { s }).to_string();
    let date = replay
        .date
        .map(|d| d.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let mut lines = vec![
        "===== Touhou Replay Report =====".to_string(),
        String::new(),
        "[File]".to_string(),
        format!("Name: {}", replay.file_name),
        format!("Path: {}", replay.file_path.display()),
        format!("Size: {} bytes", replay.file_size),
        String::new(),
        "[Game]".to_string(),
        format!("Version: {}", or_unknown(&replay.game_version)),
        format!("Difficulty: {}", or_unknown(&replay.difficulty)),
        format!("Shot: {}", or_unknown(&replay.shot_type)),
        format!("Stage: {}", or_unknown(&replay.stage)),
        format!("Score: {}", replay.formatted_score()),
        format!("Player: {}", or_unknown(&replay.player_name)),
        format!("Slow rate: {:.3}", replay.slow_rate),
        format!("Date: {}", date),
        format!("Frames: {}", replay.frame_count),
        String::new(),
    ];

    if replay.has_errors() {
        lines.push("[Decoder errors]".to_string());
        lines.extend(replay.errors.iter().map(|e| format!("- {}", e)));
        lines.push(String::new());
    }

    lines.push("===== End of report =====".to_string());
    lines.push(format!("Generated: {}", generated_at.format(TIMESTAMP_FORMAT)));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Write (or overwrite) the report for `replay` and return its path.
pub fn write_report(replay: &Replay) -> std::io::Result<PathBuf> {
    let path = report_path(&replay.file_path);
    std::fs::write(&path, render_report(replay, Local::now()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use tempfile::TempDir;

    fn sample() -> Replay {
        Replay {
            file_name: "th06_01.rpy".to_string(),
            file_path: PathBuf::from("/games/th06/replay/th06_01.rpy"),
            file_size: 5120,
            game_version: "TH06".to_string(),
            difficulty: "Lunatic".to_string(),
            shot_type: "Reimu A".to_string(),
            score: 123_456_780,
            date: NaiveDate::from_ymd_opt(2015, 2, 17).and_then(|d| d.and_hms_opt(22, 23, 0)),
            stage: "6".to_string(),
            slow_rate: 0.5,
            player_name: "NAZRIN".to_string(),
            frame_count: 86400,
            ..Default::default()
        }
    }

    #[test]
    fn test_report_path_appends_suffix() {
        assert_eq!(
            report_path(Path::new("/games/th06/replay/th06_01.rpy")),
            PathBuf::from("/games/th06/replay/th06_01.rpy_info.txt")
        );
    }

    #[test]
    fn test_render_sections() {
        let generated = Local.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let text = render_report(&sample(), generated);

        assert!(text.contains("Name: th06_01.rpy\n"));
        assert!(text.contains("Size: 5120 bytes\n"));
        assert!(text.contains("Score: 123,456,780\n"));
        assert!(text.contains("Slow rate: 0.500\n"));
        assert!(text.contains("Date: 2015/02/17 22:23:00\n"));
        assert!(text.ends_with("Generated: 2024/05/01 08:00:00\n"));
        assert!(!text.contains("[Decoder errors]"));
    }

    #[test]
    fn test_render_lists_decoder_errors() {
        let mut replay = sample();
        replay.errors = vec!["bad stage 3".to_string(), "bad stage 4".to_string()];
        let text = render_report(&replay, Local::now());
        assert!(text.contains("[Decoder errors]\n- bad stage 3\n- bad stage 4\n"));
    }

    #[test]
    fn test_write_overwrites() {
        let temp = TempDir::new().unwrap();
        let mut replay = sample();
        replay.file_path = temp.path().join("th06_01.rpy");

        let path = report_path(&replay.file_path);
        std::fs::write(&path, "stale").unwrap();

        assert_eq!(write_report(&replay).unwrap(), path);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("===== Touhou Replay Report ====="));
    }
}
