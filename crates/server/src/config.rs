use std::{fs, path::PathBuf, time::Duration};

use relay::DispatchPolicy;
use shared::domain::{GameInput, KeyMap};
use target_control::XdotoolConfig;
use tracing::warn;

const CONFIG_FILE: &str = "server.toml";
const ENV_PREFIX: &str = "APP__";
const ENV_ALIASES: [(&str, &str); 2] = [
    ("SERVER_BIND", "bind_addr"),
    ("LEDGER_PATH", "ledger_path"),
];

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub ledger_path: PathBuf,
    pub index_html_path: PathBuf,
    pub target_window_class: String,
    pub key_delay_ms: u64,
    /// Zero disables the dispatch timeout.
    pub dispatch_timeout_ms: u64,
    pub key_map: KeyMap,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "0.0.0.0:8080".into(),
            ledger_path: "./inputs.log".into(),
            index_html_path: "./index.html".into(),
            target_window_class: "vbam".into(),
            key_delay_ms: 100,
            dispatch_timeout_ms: 10_000,
            key_map: KeyMap::default(),
        }
    }
}

impl Settings {
    pub fn xdotool_config(&self) -> XdotoolConfig {
        XdotoolConfig {
            window_class: self.target_window_class.clone(),
            key_delay_ms: self.key_delay_ms,
        }
    }

    pub fn dispatch_policy(&self) -> DispatchPolicy {
        DispatchPolicy {
            action_timeout: (self.dispatch_timeout_ms > 0)
                .then(|| Duration::from_millis(self.dispatch_timeout_ms)),
        }
    }

    /// Applies one named setting. Returns `false` for unrecognized names.
    fn set(&mut self, key: &str, value: &str) -> bool {
        match key {
            "bind_addr" => self.server_bind = value.to_string(),
            "ledger_path" => self.ledger_path = value.into(),
            "index_html_path" => self.index_html_path = value.into(),
            "target_window_class" => self.target_window_class = value.to_string(),
            "key_delay_ms" => match value.trim().parse() {
                Ok(parsed) => self.key_delay_ms = parsed,
                Err(_) => warn!(key, value, "ignoring non-numeric setting"),
            },
            "dispatch_timeout_ms" => match value.trim().parse() {
                Ok(parsed) => self.dispatch_timeout_ms = parsed,
                Err(_) => warn!(key, value, "ignoring non-numeric setting"),
            },
            _ => {
                let Some(input) = key
                    .strip_prefix("key_")
                    .and_then(|name| name.to_ascii_uppercase().parse::<GameInput>().ok())
                else {
                    return false;
                };
                self.key_map.set(input, value);
            }
        }
        true
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(CONFIG_FILE) {
        apply_file_overrides(&mut settings, &raw);
    }
    let vars: Vec<(String, String)> = std::env::vars().collect();
    apply_env_overrides(&mut settings, &vars);

    settings
}

/// Reads a flat TOML table. String and integer values are accepted.
pub(crate) fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let table = match toml::from_str::<toml::Table>(raw) {
        Ok(table) => table,
        Err(error) => {
            warn!(file = CONFIG_FILE, %error, "ignoring unreadable config file");
            return;
        }
    };

    for (key, value) in &table {
        let value = match value {
            toml::Value::String(s) => s.clone(),
            toml::Value::Integer(i) => i.to_string(),
            _ => continue,
        };
        if !settings.set(key, &value) {
            warn!(key = %key, "unknown config key");
        }
    }
}

/// `SERVER_BIND` and `LEDGER_PATH` are applied first so that their
/// `APP__` counterparts win when both are set.
pub(crate) fn apply_env_overrides(settings: &mut Settings, vars: &[(String, String)]) {
    for (alias, key) in ENV_ALIASES {
        if let Some((_, value)) = vars.iter().find(|(name, _)| name == alias) {
            settings.set(key, value);
        }
    }

    for (name, value) in vars {
        if let Some(key) = name.strip_prefix(ENV_PREFIX) {
            settings.set(&key.to_ascii_lowercase(), value);
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
