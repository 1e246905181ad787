use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default agentmux data directory: ~/.agentmux
pub fn data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".agentmux"))
}

/// Load configuration with the usual ladder: ~/.agentmux/config.toml, then
/// ./config.toml, then built-in defaults. AGENTMUX_* environment variables
/// override whatever the files said.
pub fn load_default() -> anyhow::Result<AppConfig> {
    let home_config = data_dir()?.join("config.toml");
    let local_config = Path::new("config.toml");

    let mut cfg: AppConfig = if home_config.exists() {
        let s = std::fs::read_to_string(&home_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else if local_config.exists() {
        let s = std::fs::read_to_string(local_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

pub fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Some(v) = env_u64("AGENTMUX_TIMEOUT_SECS") {
        cfg.runner.timeout_secs = v;
    }
    if let Some(v) = env_bool("AGENTMUX_KEEP_LOGS") {
        cfg.runner.keep_logs = v;
    }
    if let Some(v) = env_bool("AGENTMUX_CLAUDE_SKIP_PERMISSIONS") {
        cfg.runner.claude_skip_permissions = v;
    }
    if let Some(v) = env_str("AGENTMUX_DEFAULT_BACKEND") {
        cfg.dispatch.default_backend = v;
    }
    if let Some(v) = env_u64("AGENTMUX_MAX_PARALLEL") {
        cfg.dispatch.max_parallel = v as usize;
    }
    if let Some(v) = env_str("AGENTMUX_LOG_DIR") {
        cfg.runner.log_dir = Some(v);
    }
}

fn env_str(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|v| v.parse::<u64>().ok())
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|v| {
        matches!(
            v.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_take_effect() {
        let mut cfg = AppConfig::default();
        std::env::set_var("AGENTMUX_TIMEOUT_SECS", "90");
        std::env::set_var("AGENTMUX_KEEP_LOGS", "true");
        std::env::set_var("AGENTMUX_DEFAULT_BACKEND", "claude");
        apply_env_overrides(&mut cfg);
        std::env::remove_var("AGENTMUX_TIMEOUT_SECS");
        std::env::remove_var("AGENTMUX_KEEP_LOGS");
        std::env::remove_var("AGENTMUX_DEFAULT_BACKEND");

        assert_eq!(cfg.runner.timeout_secs, 90);
        assert!(cfg.runner.keep_logs);
        assert_eq!(cfg.dispatch.default_backend, "claude");
    }

    #[test]
    fn skip_permissions_defaults_off() {
        let cfg = AppConfig::default();
        assert!(!cfg.runner.claude_skip_permissions);
    }
}
