//! Layered TOML loading with deep merge.
//!
//! Layer order, lowest priority first: compiled defaults, the default root's
//! `config.toml`, then an optional override root's `config.toml`. Tables are
//! merged per key with the override winning; scalars and arrays replace
//! wholesale. A missing file is an empty layer, not an error.

use std::path::Path;

use toml::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::Settings;

/// Deep-merge `overlay` into `base`, override wins per key.
///
/// Tables merge recursively; every other value type (including arrays)
/// replaces the base value wholesale.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base_table), Value::Table(overlay_table)) => {
            for (key, overlay_value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        let _ = base_table.insert(key, overlay_value);
                    }
                }
            }
        }
        (base_slot, overlay_value) => *base_slot = overlay_value,
    }
}

/// Load settings from a single `config.toml`, merged over compiled defaults.
pub fn load_settings(path: &Path) -> Result<Settings> {
    load_layered(path, None)
}

/// Load settings from the default file plus an optional override file.
///
/// Either file may be absent; absent layers contribute nothing. The merged
/// document is validated (value clamping) before being returned.
pub fn load_layered(default_path: &Path, override_path: Option<&Path>) -> Result<Settings> {
    let mut merged = toml::Value::try_from(Settings::default())
        .expect("compiled defaults always serialize");

    if let Some(layer) = read_layer(default_path)? {
        debug!(path = %default_path.display(), "loaded config layer");
        deep_merge(&mut merged, layer);
    }
    if let Some(path) = override_path {
        if let Some(layer) = read_layer(path)? {
            debug!(path = %path.display(), "loaded override config layer");
            deep_merge(&mut merged, layer);
        }
    }

    let mut settings: Settings = merged.try_into().map_err(SettingsError::Invalid)?;
    settings.validate();
    Ok(settings)
}

/// Read one TOML layer. A missing file yields `None`.
fn read_layer(path: &Path) -> Result<Option<Value>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let value = raw.parse::<Value>().map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(value))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_config(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn deep_merge_override_wins_per_key() {
        let mut base: Value = "[conversation]\nmemory_rounds = 18\ncontext_rounds = 6\n"
            .parse()
            .unwrap();
        let overlay: Value = "[conversation]\nmemory_rounds = 4\n".parse().unwrap();
        deep_merge(&mut base, overlay);

        let table = base.get("conversation").unwrap();
        assert_eq!(table.get("memory_rounds").unwrap().as_integer(), Some(4));
        // Untouched sibling keys survive
        assert_eq!(table.get("context_rounds").unwrap().as_integer(), Some(6));
    }

    #[test]
    fn deep_merge_inserts_new_keys() {
        let mut base: Value = "agent_id = \"a\"\n".parse().unwrap();
        let overlay: Value = "[api]\nhost = \"h\"\n".parse().unwrap();
        deep_merge(&mut base, overlay);
        assert_eq!(
            base.get("api").unwrap().get("host").unwrap().as_str(),
            Some("h")
        );
    }

    #[test]
    fn deep_merge_scalar_replaces() {
        let mut base: Value = "agent_id = \"a\"\n".parse().unwrap();
        let overlay: Value = "agent_id = \"b\"\n".parse().unwrap();
        deep_merge(&mut base, overlay);
        assert_eq!(base.get("agent_id").unwrap().as_str(), Some("b"));
    }

    #[test]
    fn missing_files_yield_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_layered(&dir.path().join("config.toml"), None).unwrap();
        assert_eq!(settings, {
            let mut expected = Settings::default();
            expected.validate();
            expected
        });
    }

    #[test]
    fn override_layer_wins() {
        let dir = tempfile::tempdir().unwrap();
        let default_path = write_config(
            dir.path(),
            "config.toml",
            "agent_id = \"base\"\n[conversation]\nmemory_rounds = 10\n",
        );
        let override_path = write_config(
            dir.path(),
            "override.toml",
            "[conversation]\nmemory_rounds = 3\n",
        );

        let settings = load_layered(&default_path, Some(&override_path)).unwrap();
        assert_eq!(settings.agent_id, "base");
        assert_eq!(settings.conversation.memory_rounds, 3);
        // Default-layer keys absent in both files still come from compiled defaults
        assert_eq!(settings.server.port, 9999);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "config.toml", "agent_id = [broken\n");
        assert!(load_settings(&path).is_err());
    }

    #[test]
    fn loaded_settings_are_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "config.toml",
            "[conversation]\nmemory_rounds = 0\n",
        );
        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.conversation.memory_rounds, 1);
    }
}
