//! Environment configuration.

use std::env;

pub const LOG_ENV: &str = "GH_COPILOT_LOG";

#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub no_color: bool,
    pub dumb_terminal: bool,
    pub log_filter: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            no_color: env::var_os("NO_COLOR").is_some(),
            dumb_terminal: env::var("TERM").map(|term| term == "dumb").unwrap_or(false),
            log_filter: env_string_opt(LOG_ENV),
        }
    }

    /// Whether output should skip markdown styling: stdout is not a terminal, `NO_COLOR` is
    /// present, or `TERM=dumb`.
    pub fn prefers_plain_output(&self, stdout_is_tty: bool) -> bool {
        !stdout_is_tty || self.no_color || self.dumb_terminal
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::EnvConfig;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn defaults_allow_styling_on_a_terminal() {
        let _lock = env_lock();
        let _g1 = set_env_guard("NO_COLOR", None);
        let _g2 = set_env_guard("TERM", Some("xterm-256color"));
        let _g3 = set_env_guard("GH_COPILOT_LOG", None);

        let config = EnvConfig::from_env();
        assert!(!config.no_color);
        assert!(!config.dumb_terminal);
        assert!(config.log_filter.is_none());
        assert!(!config.prefers_plain_output(true));
        assert!(config.prefers_plain_output(false));
    }

    #[test]
    fn no_color_presence_forces_plain_even_when_empty() {
        let _lock = env_lock();
        let _g1 = set_env_guard("NO_COLOR", Some(""));
        let _g2 = set_env_guard("TERM", Some("xterm"));

        let config = EnvConfig::from_env();
        assert!(config.no_color);
        assert!(config.prefers_plain_output(true));
    }

    #[test]
    fn dumb_terminal_forces_plain() {
        let _lock = env_lock();
        let _g1 = set_env_guard("NO_COLOR", None);
        let _g2 = set_env_guard("TERM", Some("dumb"));

        assert!(EnvConfig::from_env().prefers_plain_output(true));
    }

    #[test]
    fn blank_log_filter_is_ignored() {
        let _lock = env_lock();
        let _g1 = set_env_guard("GH_COPILOT_LOG", Some("  "));
        assert!(EnvConfig::from_env().log_filter.is_none());

        let _g2 = set_env_guard("GH_COPILOT_LOG", Some("debug"));
        assert_eq!(EnvConfig::from_env().log_filter.as_deref(), Some("debug"));
    }
}
