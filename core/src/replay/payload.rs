//! Decoder payload extraction and field mapping.

use chrono::{Local, NaiveDateTime};
use serde_json::{Map, Value};
use thlauncher_shared::Replay;

use super::DecodeError;

/// Line printed by the worker right before the payload.
pub const JSON_START: &str = "###JSON_START###";
/// Line printed by the worker right after the payload.
pub const JSON_END: &str = "###JSON_END###";

/// Format of the payload's `date` field, e.g. `2015/02/17 22:23`.
const DATE_FORMAT: &str = "%Y/%m/%d %H:%M";

const UNKNOWN: &str = "Unknown";

/// Pull the payload out of the worker's merged output.
///
/// Prefers the text between [`JSON_START`] and [`JSON_END`]. Without both
/// markers, falls back to the span from the first `{` to the last `}`.
pub fn extract_payload(output: &str) -> Option<&str> {
    if let Some(start) = output.find(JSON_START) {
        let body_start = start + JSON_START.len();
        if let Some(len) = output[body_start..].find(JSON_END) {
            let body = output[body_start..body_start + len].trim();
            if !body.is_empty() {
                return Some(body);
            }
        }
    }

    let start = output.find('{')?;
    let end = output.rfind('}')?;
    (end > start).then(|| &output[start..=end])
}

/// Guess which game a replay belongs to from its shot.
///
/// Character names and `needle` match case-insensitively. Shot variant
/// letters match as the worker prints them (`A` to `D`), which keeps
/// `Needle` from reading as a `D` shot.
pub fn infer_game_version(character: &str, variant: &str) -> &'static str {
    let character = character.to_lowercase();
    let reimu = character.contains("reimu");
    let marisa = character.contains("marisa");
    let has = |letters: [char; 2]| letters.iter().any(|l| variant.contains(*l));

    if (reimu || marisa) && has(['A', 'B']) {
        "TH06"
    } else if character.contains("sakuya") {
        "TH07"
    } else if character.contains("youmu") || character.contains("yuyuko") {
        "TH08"
    } else if (reimu || marisa) && has(['C', 'D']) {
        "TH08"
    } else if reimu && variant.to_lowercase().contains("needle") {
        "TH10"
    } else {
        "TH??"
    }
}

/// Parse a payload into a [`Replay`] with its decoded fields set.
///
/// Fails on invalid JSON or when the payload carries an `error` field.
/// Missing fields fall back to defaults. The payload's own `errors` list
/// is copied onto the replay and does not fail the decode.
pub fn parse_payload(payload: &str) -> Result<Replay, DecodeError> {
    let root: Value = serde_json::from_str(payload)?;
    let empty = Map::new();
    let root_obj = root.as_object().unwrap_or(&empty);

    if let Some(error) = root_obj.get("error").filter(|v| !v.is_null()) {
        return Err(DecodeError::DecodeSemanticError(value_text(error)));
    }

    let base = root_obj
        .get("baseInfoDic")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let character = text(base, "character").unwrap_or_else(|| UNKNOWN.to_string());
    let variant = text(base, "shottype").unwrap_or_default();

    let shot_type = if variant.is_empty() {
        character.clone()
    } else {
        format!("{} {}", character, variant)
    };

    let date = text(root_obj, "date")
        .and_then(|s| NaiveDateTime::parse_from_str(s.trim(), DATE_FORMAT).ok())
        .unwrap_or_else(|| Local::now().naive_local());

    let score = root_obj
        .get("stageScore")
        .and_then(Value::as_array)
        .and_then(|scores| scores.last())
        .and_then(number_i64)
        .unwrap_or(0);

    let errors = root_obj
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| errors.iter().map(value_text).collect())
        .unwrap_or_default();

    Ok(Replay {
        game_version: infer_game_version(&character, &variant).to_string(),
        difficulty: text(base, "rank").unwrap_or_else(|| UNKNOWN.to_string()),
        shot_type,
        score,
        date: Some(date),
        stage: text(base, "stage").unwrap_or_else(|| UNKNOWN.to_string()),
        slow_rate: root_obj.get("slowRate").and_then(number_f64).unwrap_or(0.0),
        player_name: text(root_obj, "player").unwrap_or_else(|| UNKNOWN.to_string()),
        frame_count: root_obj
            .get("frameCount")
            .and_then(number_i64)
            .map_or(0, |n| n.max(0) as u64),
        raw_payload: payload.to_string(),
        errors,
        ..Default::default()
    })
}

/// String form of a field, `None` when missing or null.
fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).filter(|v| !v.is_null()).map(value_text)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn number_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
