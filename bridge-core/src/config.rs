//! Configuration system for the Aura bridge.
//!
//! Uses `figment` for layered configuration: defaults -> config file ->
//! environment -> CLI overrides. The user-level file lives at
//! `~/.config/aura-bridge/config.toml` (platform equivalent via `directories`).

use crate::error::ConfigError;
use crate::gateway::GatewayConfig;
use crate::terminal::TerminalConfig;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Port variable used by earlier bridge deployments; still honoured.
pub const LEGACY_PORT_ENV: &str = "BRIDGE_WS_PORT";

/// Prefix for environment overrides, e.g. `AURA_BRIDGE_TERMINAL__TMUX_TARGET`.
pub const ENV_PREFIX: &str = "AURA_BRIDGE_";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub gateway: GatewayConfig,
    pub terminal: TerminalConfig,
}

impl BridgeConfig {
    /// Reject values that would make the bridge unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.max_connections == 0 {
            return Err(ConfigError::Invalid {
                message: "gateway.max_connections must be at least 1".into(),
            });
        }
        if self.terminal.tmux_target.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "terminal.tmux_target must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Path of the user-level config file, if a home directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "aura", "aura-bridge")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables prefixed with `AURA_BRIDGE_` (`__` separates sections)
/// 3. `BRIDGE_WS_PORT`
/// 4. The explicit config file, which must exist when given
/// 5. User config (`~/.config/aura-bridge/config.toml`)
/// 6. Built-in defaults
pub fn load_config(
    config_file: Option<&Path>,
    overrides: Option<&BridgeConfig>,
) -> Result<BridgeConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(BridgeConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(path) = config_file {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    figment = figment
        .merge(
            Env::raw()
                .only(&[LEGACY_PORT_ENV])
                .map(|_| "gateway.port".into()),
        )
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: BridgeConfig = figment.extract()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::InjectorBackend;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.gateway.port, 8765);
        assert_eq!(config.terminal.backend, InjectorBackend::Tmux);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = BridgeConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let restored: BridgeConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(restored.gateway.port, config.gateway.port);
        assert_eq!(restored.terminal.tmux_target, config.terminal.tmux_target);
    }

    #[test]
    fn test_validate_rejects_zero_connections() {
        let mut config = BridgeConfig::default();
        config.gateway.max_connections = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_blank_target() {
        let mut config = BridgeConfig::default();
        config.terminal.tmux_target = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/aura-bridge.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        std::fs::write(&path, "[gateway]\nmax_connections = 0\n").unwrap();
        let err = load_config(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_load_config_rejects_wrong_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        std::fs::write(&path, "[gateway]\nport = \"not-a-port\"\n").unwrap();
        assert!(load_config(Some(&path), None).is_err());
    }

    #[test]
    fn test_load_config_layers() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "bridge.toml",
                r#"
                [gateway]
                port = 9100

                [terminal]
                tmux_target = "work:2"
                key_delay_ms = 0
                "#,
            )?;
            jail.set_env("AURA_BRIDGE_TERMINAL__BACKEND", "dry_run");

            let config = load_config(Some(Path::new("bridge.toml")), None)
                .map_err(|e| e.to_string())?;
            assert_eq!(config.gateway.port, 9100);
            assert_eq!(config.gateway.host, "127.0.0.1");
            assert_eq!(config.terminal.tmux_target, "work:2");
            assert_eq!(config.terminal.key_delay_ms, 0);
            assert_eq!(config.terminal.backend, InjectorBackend::DryRun);
            Ok(())
        });
    }

    #[test]
    fn test_legacy_port_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env(LEGACY_PORT_ENV, "9200");
            let config = load_config(None, None).map_err(|e| e.to_string())?;
            assert_eq!(config.gateway.port, 9200);
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_env_beats_legacy_port() {
        figment::Jail::expect_with(|jail| {
            jail.set_env(LEGACY_PORT_ENV, "9200");
            jail.set_env("AURA_BRIDGE_GATEWAY__PORT", "9300");
            let config = load_config(None, None).map_err(|e| e.to_string())?;
            assert_eq!(config.gateway.port, 9300);
            Ok(())
        });
    }

    #[test]
    fn test_overrides_win() {
        let mut overrides = BridgeConfig::default();
        overrides.gateway.port = 9400;
        overrides.terminal.backend = InjectorBackend::DryRun;
        let config = load_config(None, Some(&overrides)).unwrap();
        assert_eq!(config.gateway.port, 9400);
        assert_eq!(config.terminal.backend, InjectorBackend::DryRun);
    }
}
