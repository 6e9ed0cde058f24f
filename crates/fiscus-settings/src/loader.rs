//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`FiscusSettings::default()`]
//! 2. If `~/.fiscus/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::FiscusSettings;

/// Resolve the path to the settings file (`~/.fiscus/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".fiscus").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<FiscusSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<FiscusSettings> {
    let defaults = serde_json::to_value(FiscusSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: FiscusSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Each env var has strict parsing rules; invalid values are silently
/// ignored (fall back to file/default).
pub fn apply_env_overrides(settings: &mut FiscusSettings) {
    if let Some(v) = read_env_string("FISCUS_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_env_u16("FISCUS_PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = read_env_usize("FISCUS_MAX_SESSIONS", 1, 10_000) {
        settings.server.max_sessions = v;
    }
    if let Some(v) = read_env_string("FISCUS_DB_PATH") {
        settings.database.path = v;
    }
    if let Some(v) = read_env_string("FISCUS_AUTH_SECRET") {
        settings.auth.secret = v;
    }
    if let Some(v) = read_env_string("FISCUS_GENERATION_URL") {
        settings.generation.base_url = v;
    }
    if let Some(v) = read_env_string("FISCUS_GENERATION_MODEL") {
        settings.generation.model = v;
    }
    if let Some(v) = read_env_string("FISCUS_EMBEDDING_URL") {
        settings.embedding.base_url = v;
    }
    if let Some(v) = read_env_string("FISCUS_EMBEDDING_MODEL") {
        settings.embedding.model = v;
    }
    if let Some(v) = read_env_usize("FISCUS_EMBEDDING_DIMENSIONS", 1, 8192) {
        settings.embedding.dimensions = v;
    }
    if let Some(v) = read_env_usize("FISCUS_QUEUE_WORKERS", 1, 64) {
        settings.queue.workers = v;
    }
    if let Some(v) = read_env_usize("FISCUS_CHAT_TOP_K", 1, 100) {
        settings.chat.top_k = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u16(name: &str, min: u16, max: u16) -> Option<u16> {
    let val = std::env::var(name).ok()?;
    let result = parse_u16_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
    }
    result
}

fn read_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    let val = std::env::var(name).ok()?;
    let result = parse_usize_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_merge_objects_recursively() {
        let target = json!({"a": {"x": 1, "y": 2}, "b": 3});
        let source = json!({"a": {"y": 20}});
        let merged = deep_merge(target, source);
        assert_eq!(merged, json!({"a": {"x": 1, "y": 20}, "b": 3}));
    }

    #[test]
    fn deep_merge_null_preserves_target() {
        let target = json!({"a": 1});
        let source = json!({"a": null});
        assert_eq!(deep_merge(target, source), json!({"a": 1}));
    }

    #[test]
    fn deep_merge_arrays_replaced() {
        let target = json!({"a": [1, 2, 3]});
        let source = json!({"a": [9]});
        assert_eq!(deep_merge(target, source), json!({"a": [9]}));
    }

    #[test]
    fn deep_merge_primitive_replaced() {
        assert_eq!(deep_merge(json!(1), json!("x")), json!("x"));
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let settings =
            load_settings_from_path(Path::new("/definitely/not/here.json")).unwrap();
        assert_eq!(settings.server.port, FiscusSettings::default().server.port);
    }

    #[test]
    fn load_partial_file_merges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"chat": {"topK": 3}, "server": {"port": 9000}}"#)
            .unwrap();
        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.chat.top_k, 3);
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.embedding.dimensions, 768);
    }

    #[test]
    fn load_invalid_json_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_settings_from_path(&path).is_err());
    }

    #[test]
    fn parse_u16_range_bounds() {
        assert_eq!(parse_u16_range("80", 1, 65535), Some(80));
        assert_eq!(parse_u16_range("0", 1, 65535), None);
        assert_eq!(parse_u16_range("x", 1, 65535), None);
    }

    #[test]
    fn parse_usize_range_bounds() {
        assert_eq!(parse_usize_range("5", 1, 10), Some(5));
        assert_eq!(parse_usize_range("11", 1, 10), None);
    }

    #[test]
    fn settings_path_under_home() {
        let path = settings_path();
        assert!(path.ends_with(".fiscus/settings.json"));
    }
}
