//! Configuration loading and environment parsing.

use super::Config;
use serde_json::{Map, Value};
use std::env;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "SIGNAL_RELAY__";

/// Load configuration, merging every source on top of the compiled defaults.
/// Later layers win:
/// 1) Defaults compiled into the binary
/// 2) `config.json` next to the executable
/// 3) `config.json` in the current working directory
/// 4) File pointed to by `SIGNAL_RELAY_CONFIG_PATH`
/// 5) JSON read from stdin when `SIGNAL_RELAY_CONFIG_STDIN` is truthy
/// 6) Raw JSON in `SIGNAL_RELAY_CONFIG_JSON`
/// 7) Field overrides such as `SIGNAL_RELAY__PORT=9443` or
///    `SIGNAL_RELAY__RELAY__STATUS_INTERVAL_SECS=5` (`__` separates nesting levels)
///
/// Unreadable or malformed sources are reported on stderr and skipped. The
/// result is not validated; see [`super::validate_config`].
#[must_use]
pub fn load() -> Config {
    let defaults = Config::default();
    let mut merged =
        serde_json::to_value(&defaults).unwrap_or_else(|_| Value::Object(Map::new()));

    if let Ok(exe_path) = env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            merge_file_source(&mut merged, &exe_dir.join("config.json"));
        }
    }

    merge_file_source(&mut merged, Path::new("config.json"));

    if let Ok(path) = env::var("SIGNAL_RELAY_CONFIG_PATH") {
        merge_file_source(&mut merged, &PathBuf::from(path));
    }

    if env::var("SIGNAL_RELAY_CONFIG_STDIN").is_ok_and(|val| env_var_truthy(&val)) {
        let mut buf = String::new();
        match std::io::stdin().read_to_string(&mut buf) {
            Ok(_) => {
                if let Some(value) = parse_json_document(&buf, "stdin") {
                    merge_values(&mut merged, value);
                }
            }
            Err(e) => eprintln!("Failed to read config from stdin: {e}"),
        }
    }

    if let Ok(json) = env::var("SIGNAL_RELAY_CONFIG_JSON") {
        if let Some(value) = parse_json_document(&json, "SIGNAL_RELAY_CONFIG_JSON") {
            merge_values(&mut merged, value);
        }
    }

    apply_env_overrides(&mut merged, env::vars());

    match serde_json::from_value::<Config>(merged) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to deserialize config; using defaults: {e}");
            defaults
        }
    }
}

fn parse_json_document(raw: &str, label: &str) -> Option<Value> {
    if raw.trim().is_empty() {
        return None;
    }

    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            eprintln!("Failed to parse config from {label}: {err}");
            None
        }
    }
}

fn merge_file_source(target: &mut Value, path: &Path) {
    if path.as_os_str().is_empty() || !path.exists() {
        return;
    }

    match fs::read_to_string(path) {
        Ok(contents) => {
            if let Some(value) = parse_json_document(&contents, &format!("file {}", path.display()))
            {
                merge_values(target, value);
            }
        }
        Err(err) => {
            eprintln!("Failed to read config from {}: {}", path.display(), err);
        }
    }
}

/// Deep-merge `source` into `target`. Objects merge key by key; anything else replaces.
fn merge_values(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn apply_env_overrides(root: &mut Value, vars: impl IntoIterator<Item = (String, String)>) {
    for (key, raw_value) in vars {
        let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };

        let segments: Vec<String> = stripped
            .split("__")
            .filter(|segment| !segment.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();

        if segments.is_empty() {
            continue;
        }

        set_nested_value(root, &segments, parse_scalar(raw_value.trim()));
    }
}

fn env_var_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

/// Numbers and booleans become JSON scalars; everything else stays a string.
fn parse_scalar(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::String(String::new());
    }

    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn set_nested_value(target: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *target = value;
        return;
    };

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }

    if let Value::Object(map) = target {
        let slot = map.entry(head.clone()).or_insert(Value::Null);
        set_nested_value(slot, rest, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DuplicatePolicy;
    use serde_json::json;
    use serial_test::serial;
    use std::io::Write;

    fn env_pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn merge_replaces_scalars_and_keeps_siblings() {
        let mut target = json!({"relay": {"status_interval_secs": 2, "max_message_size": 10}});
        merge_values(&mut target, json!({"relay": {"status_interval_secs": 7}}));
        assert_eq!(target["relay"]["status_interval_secs"], 7);
        assert_eq!(target["relay"]["max_message_size"], 10);
    }

    #[test]
    fn env_overrides_are_nested_and_typed() {
        let mut root = json!({"port": 8443, "relay": {}});
        apply_env_overrides(
            &mut root,
            env_pairs(&[
                ("SIGNAL_RELAY__PORT", "9000"),
                ("SIGNAL_RELAY__RELAY__DUPLICATE_POLICY", "evict_existing"),
                ("SIGNAL_RELAY__LOGGING__ENABLE_FILE_LOGGING", "false"),
                ("UNRELATED__PORT", "1"),
            ]),
        );
        assert_eq!(root["port"], 9000);
        assert_eq!(root["relay"]["duplicate_policy"], "evict_existing");
        assert_eq!(root["logging"]["enable_file_logging"], false);
    }

    #[test]
    fn truthy_values() {
        assert!(env_var_truthy("1"));
        assert!(env_var_truthy(" YES "));
        assert!(!env_var_truthy("off"));
    }

    #[test]
    #[serial]
    fn load_layers_file_json_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(br#"{"port": 7443, "relay": {"status_interval_secs": 9}}"#)
            .unwrap();

        env::set_var("SIGNAL_RELAY_CONFIG_PATH", &path);
        env::set_var(
            "SIGNAL_RELAY_CONFIG_JSON",
            r#"{"relay": {"outbound_queue_capacity": 8}}"#,
        );
        env::set_var("SIGNAL_RELAY__RELAY__DUPLICATE_POLICY", "evict_existing");

        let config = load();

        env::remove_var("SIGNAL_RELAY_CONFIG_PATH");
        env::remove_var("SIGNAL_RELAY_CONFIG_JSON");
        env::remove_var("SIGNAL_RELAY__RELAY__DUPLICATE_POLICY");

        assert_eq!(config.port, 7443);
        assert_eq!(config.relay.status_interval_secs, 9);
        assert_eq!(config.relay.outbound_queue_capacity, 8);
        assert_eq!(config.relay.duplicate_policy, DuplicatePolicy::EvictExisting);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    #[serial]
    fn malformed_inline_json_is_skipped() {
        env::set_var("SIGNAL_RELAY_CONFIG_JSON", "{not json");
        let config = load();
        env::remove_var("SIGNAL_RELAY_CONFIG_JSON");

        assert_eq!(config.relay.status_interval_secs, 2);
    }
}
