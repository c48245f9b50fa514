use serde::{Deserialize, Serialize};

/// Configuration from `taskboard/config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub app: AppInfo,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppInfo {
    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        AppInfo {
            name: default_name(),
        }
    }
}

fn default_name() -> String {
    "taskboard".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// How far ahead of a deadline the scanner starts warning
    #[serde(default = "default_window_hours")]
    pub deadline_window_hours: i64,
    /// Lookback for an existing deadline notification on the same task
    #[serde(default = "default_dedup_hours")]
    pub dedup_hours: i64,
    /// Fixed delay between scans in `tb watch`
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        NotificationConfig {
            deadline_window_hours: default_window_hours(),
            dedup_hours: default_dedup_hours(),
            scan_interval_secs: default_scan_interval(),
        }
    }
}

fn default_window_hours() -> i64 {
    48
}

fn default_dedup_hours() -> i64 {
    24
}

fn default_scan_interval() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Language used when the store has no saved preference
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default = "default_theme")]
    pub default_theme: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            default_language: default_language(),
            default_theme: default_theme(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_theme() -> String {
    "light".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: StoreConfig = toml::from_str("").unwrap();
        assert_eq!(config.app.name, "taskboard");
        assert_eq!(config.notifications.deadline_window_hours, 48);
        assert_eq!(config.notifications.dedup_hours, 24);
        assert_eq!(config.notifications.scan_interval_secs, 60);
        assert_eq!(config.ui.default_language, "en");
        assert_eq!(config.ui.default_theme, "light");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: StoreConfig = toml::from_str(
            r#"
[notifications]
scan_interval_secs = 5
"#,
        )
        .unwrap();
        assert_eq!(config.notifications.scan_interval_secs, 5);
        assert_eq!(config.notifications.dedup_hours, 24);
    }
}
