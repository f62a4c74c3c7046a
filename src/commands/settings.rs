use crate::models::policy::RiskPolicy;
use crate::models::profile::{FeatureProfile, InputBound, PROFILE_NAMES};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_SCHEMA_VERSION: i64 = 1;
pub const WORKSPACE_DIR: &str = ".loanrisk";

const POLICY_NAMES: [&str; 4] = ["profile", "binary", "three_band", "five_band"];

#[derive(Debug, Clone)]
pub struct EffectivePredictionSettings {
    pub profile: FeatureProfile,
    pub artifact_path: Option<PathBuf>,
    pub history_enabled: bool,
    pub history_retention: u32,
}

pub async fn get_settings(workspace_path: String) -> Result<Value, String> {
    load_settings_from_disk(&workspace_path)
}

pub async fn save_settings(workspace_path: String, settings: Value) -> Result<Value, String> {
    save_settings_to_disk(&workspace_path, settings)
}

/// Resolve the active profile, with policy and bound overrides applied.
pub fn load_effective_prediction_settings(workspace_path: &str) -> Result<EffectivePredictionSettings, String> {
    let settings = load_settings_from_disk(workspace_path)?;
    effective_from_value(workspace_path, &settings)
}

fn effective_from_value(workspace_path: &str, settings: &Value) -> Result<EffectivePredictionSettings, String> {
    let profile_name = settings
        .get("activeProfile")
        .and_then(Value::as_str)
        .unwrap_or("seven_input");
    let mut profile = FeatureProfile::by_name(profile_name).map_err(|e| e.to_string())?;

    let policy_name = settings
        .get("riskPolicy")
        .and_then(Value::as_str)
        .unwrap_or("profile");
    if let Some(policy) = RiskPolicy::by_name(policy_name) {
        profile = profile.with_policy(policy);
    }

    if let Some(obj) = settings.get("inputBounds").and_then(Value::as_object) {
        for (field, bound) in obj {
            match serde_json::from_value::<InputBound>(bound.clone()) {
                Ok(bound) if bound.min <= bound.max => {
                    profile.bounds.insert(field.clone(), bound);
                }
                _ => log::warn!("ignoring malformed input bound for {field}"),
            }
        }
    }

    let artifact_path = settings
        .get("artifactPath")
        .and_then(Value::as_str)
        .filter(|p| !p.trim().is_empty())
        .map(|p| {
            let path = Path::new(p);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                Path::new(workspace_path).join(path)
            }
        });

    Ok(EffectivePredictionSettings {
        profile,
        artifact_path,
        history_enabled: settings
            .get("historyEnabled")
            .and_then(Value::as_bool)
            .unwrap_or(true),
        history_retention: settings
            .get("historyRetention")
            .and_then(Value::as_u64)
            .unwrap_or(500)
            .clamp(10, 100_000) as u32,
    })
}

pub fn load_settings_from_disk(workspace_path: &str) -> Result<Value, String> {
    let path = settings_path(workspace_path);
    ensure_workspace_dir(workspace_path)?;

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read settings.json: {e}"))?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => value,
            Err(e) => {
                let backup = path.with_extension("json.bak");
                fs::write(&backup, &raw)
                    .map_err(|e| format!("Failed to back up settings.json: {e}"))?;
                log::warn!(
                    "settings.json is not valid JSON ({e}), moved to {} and reset to defaults",
                    backup.display()
                );
                json!({})
            }
        }
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original || !path.exists() {
        write_settings_file(&path, &migrated)?;
    }

    Ok(migrated)
}

pub fn save_settings_to_disk(workspace_path: &str, settings: Value) -> Result<Value, String> {
    let path = settings_path(workspace_path);
    ensure_workspace_dir(workspace_path)?;

    let mut merged = load_settings_from_disk(workspace_path).unwrap_or_else(|_| default_settings());
    merge_settings(&mut merged, &settings);

    let migrated = migrate_settings(merged);
    write_settings_file(&path, &migrated)?;
    log::info!("saved settings for {workspace_path}");
    Ok(migrated)
}

fn settings_path(workspace_path: &str) -> PathBuf {
    Path::new(workspace_path)
        .join(WORKSPACE_DIR)
        .join("settings.json")
}

pub fn ensure_workspace_dir(workspace_path: &str) -> Result<(), String> {
    let dir = Path::new(workspace_path).join(WORKSPACE_DIR);
    fs::create_dir_all(&dir)
        .map_err(|e| format!("Failed to create {WORKSPACE_DIR} directory: {e}"))
}

fn write_settings_file(path: &Path, settings: &Value) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write settings.json: {e}"))
}

fn migrate_settings(input: Value) -> Value {
    let defaults = default_settings();
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    deep_merge_defaults(&mut out, &defaults);
    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "activeProfile": "seven_input",
        "riskPolicy": "profile",
        "artifactPath": "",
        "inputBounds": {},
        "historyEnabled": true,
        "historyRetention": 500
    })
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn merge_settings(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target_obj), Value::Object(incoming_obj)) => {
            for (key, value) in incoming_obj {
                if let Some(existing) = target_obj.get_mut(key) {
                    merge_settings(existing, value);
                } else {
                    target_obj.insert(key.clone(), value.clone());
                }
            }
        }
        (target_slot, incoming_value) => {
            *target_slot = incoming_value.clone();
        }
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    clamp_u64(obj, "historyRetention", 10, 100_000, 500);

    sanitize_enum(obj, "activeProfile", &PROFILE_NAMES, "seven_input");
    sanitize_enum(obj, "riskPolicy", &POLICY_NAMES, "profile");

    ensure_bool(obj, "historyEnabled", true);

    if !obj.get("artifactPath").map(Value::is_string).unwrap_or(false) {
        obj.insert("artifactPath".to_string(), json!(""));
    }

    // Drop bounds that are not {min, max} with min <= max.
    let bounds = obj
        .entry("inputBounds".to_string())
        .or_insert_with(|| json!({}));
    if let Some(bound_obj) = bounds.as_object_mut() {
        bound_obj.retain(|_, bound| {
            let min = bound.get("min").and_then(Value::as_f64);
            let max = bound.get("max").and_then(Value::as_f64);
            matches!((min, max), (Some(min), Some(max)) if min <= max)
        });
    } else {
        *bounds = json!({});
    }
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn sanitize_enum(map: &mut Map<String, Value>, key: &str, allowed: &[&str], default: &str) {
    let valid = map
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| allowed.contains(value))
        .unwrap_or(default);
    map.insert(key.to_string(), json!(valid));
}

fn ensure_bool(map: &mut Map<String, Value>, key: &str, default: bool) {
    let value = map.get(key).and_then(Value::as_bool).unwrap_or(default);
    map.insert(key.to_string(), json!(value));
}
