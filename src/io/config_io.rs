use std::fs;
use std::path::Path;

use crate::io::store::StoreError;
use crate::model::config::StoreConfig;

/// Template written by `tb init`. Every value here matches the serde
/// defaults in `StoreConfig`.
const DEFAULT_CONFIG: &str = r#"[app]
name = "taskboard"

[notifications]
# Warn about tasks due within this many hours
deadline_window_hours = 48
# Skip a deadline warning if one was raised for the task this recently
dedup_hours = 24
# Delay between scans in `tb watch`
scan_interval_secs = 60

[ui]
default_language = "en"
default_theme = "light"
"#;

/// Read the board config, returning both the parsed config and the raw
/// toml_edit document for format-preserving edits.
pub fn read_config(board_dir: &Path) -> Result<(StoreConfig, toml_edit::DocumentMut), StoreError> {
    let config_path = board_dir.join("config.toml");
    let config_text = fs::read_to_string(&config_path).map_err(|e| StoreError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: StoreConfig = toml::from_str(&config_text)?;
    let doc: toml_edit::DocumentMut = config_text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(board_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), StoreError> {
    let config_path = board_dir.join("config.toml");
    fs::write(&config_path, doc.to_string()).map_err(|e| StoreError::WriteError {
        path: config_path,
        source: e,
    })?;
    Ok(())
}

/// Write the default config with the given board name.
pub fn write_default_config(board_dir: &Path, name: &str) -> Result<(), StoreError> {
    let mut doc: toml_edit::DocumentMut = DEFAULT_CONFIG.parse()?;
    doc["app"]["name"] = toml_edit::value(name);
    write_config(board_dir, &doc)
}

/// Set a key in the `[ui]` table, creating the table if needed
pub fn set_ui_value(doc: &mut toml_edit::DocumentMut, key: &str, value: &str) {
    if !doc.contains_key("ui") {
        doc["ui"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["ui"][key] = toml_edit::value(value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_template_parses_to_defaults() {
        let config: StoreConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        let defaults = StoreConfig::default();
        assert_eq!(config.app.name, defaults.app.name);
        assert_eq!(
            config.notifications.deadline_window_hours,
            defaults.notifications.deadline_window_hours
        );
        assert_eq!(config.notifications.dedup_hours, defaults.notifications.dedup_hours);
        assert_eq!(
            config.notifications.scan_interval_secs,
            defaults.notifications.scan_interval_secs
        );
        assert_eq!(config.ui.default_language, defaults.ui.default_language);
    }

    #[test]
    fn test_round_trip_preserves_comments() {
        let tmp = TempDir::new().unwrap();
        write_default_config(tmp.path(), "demo").unwrap();
        let (config, doc) = read_config(tmp.path()).unwrap();
        assert_eq!(config.app.name, "demo");
        write_config(tmp.path(), &doc).unwrap();
        let written = fs::read_to_string(tmp.path().join("config.toml")).unwrap();
        assert!(written.contains("# Warn about tasks due within this many hours"));
    }

    #[test]
    fn test_set_ui_value() {
        let mut doc: toml_edit::DocumentMut = "[app]\nname = \"x\"\n".parse().unwrap();
        set_ui_value(&mut doc, "default_language", "es");
        let config: StoreConfig = toml::from_str(&doc.to_string()).unwrap();
        assert_eq!(config.ui.default_language, "es");
        assert_eq!(config.ui.default_theme, "light");
    }
}
