//! Subcommand handlers.

use crate::{Commands, ConfigAction, ServeArgs};
use aura_bridge_core::config::{load_config, user_config_path, BridgeConfig};
use aura_bridge_core::gateway::{run_gateway, GatewayServer};
use aura_bridge_core::selection::parse_number;
use aura_bridge_core::terminal::{build_injector, InjectorBackend};
use std::path::Path;
use tracing::info;

pub(crate) async fn handle_command(
    command: Commands,
    serve_args: &ServeArgs,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match command {
        Commands::Serve => {
            let mut config = load_config(config_file, None)
                .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
            apply_serve_overrides(&mut config, serve_args);
            config
                .validate()
                .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
            serve(config).await
        }
        Commands::Parse { text } => {
            let text = text.join(" ");
            println!("{}", describe_parse(&text));
            Ok(())
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let config = load_config(config_file, None)
                    .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
                print!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
            ConfigAction::Path => {
                match user_config_path() {
                    Some(path) => println!("{}", path.display()),
                    None => println!("No home directory; only --config files are used"),
                }
                Ok(())
            }
        },
    }
}

/// CLI flags take precedence over every config layer.
pub(crate) fn apply_serve_overrides(config: &mut BridgeConfig, args: &ServeArgs) {
    if let Some(host) = &args.host {
        config.gateway.host = host.clone();
    }
    if let Some(port) = args.port {
        config.gateway.port = port;
    }
    if let Some(target) = &args.tmux_target {
        config.terminal.tmux_target = target.clone();
    }
    if args.dry_run {
        config.terminal.backend = InjectorBackend::DryRun;
    }
}

pub(crate) fn describe_parse(text: &str) -> String {
    match parse_number(text) {
        Some(n) => format!("'{}' -> {}", text, n),
        None => format!("'{}' -> not a number", text),
    }
}

async fn serve(config: BridgeConfig) -> anyhow::Result<()> {
    let injector = build_injector(&config.terminal);
    info!(
        backend = %config.terminal.backend,
        target = %config.terminal.tmux_target,
        "Terminal injector ready"
    );

    let gw = GatewayServer::new(config.gateway.clone(), injector).into_shared();
    run_gateway(gw, shutdown_signal()).await?;
    info!("Bridge server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_describe_parse() {
        assert_eq!(describe_parse("three"), "'three' -> 3");
        assert_eq!(describe_parse("07"), "'07' -> 7");
        assert_eq!(describe_parse("eleven"), "'eleven' -> not a number");
    }

    #[test]
    fn test_serve_overrides() {
        let mut config = BridgeConfig::default();
        let args = ServeArgs {
            host: Some("0.0.0.0".into()),
            port: Some(9999),
            tmux_target: Some("agent:0.1".into()),
            dry_run: true,
        };
        apply_serve_overrides(&mut config, &args);
        assert_eq!(config.gateway.host, "0.0.0.0");
        assert_eq!(config.gateway.port, 9999);
        assert_eq!(config.terminal.tmux_target, "agent:0.1");
        assert_eq!(config.terminal.backend, InjectorBackend::DryRun);
    }

    #[test]
    fn test_empty_overrides_keep_config() {
        let mut config = BridgeConfig::default();
        apply_serve_overrides(&mut config, &ServeArgs::default());
        assert_eq!(config.gateway.port, 8765);
        assert_eq!(config.terminal.backend, InjectorBackend::Tmux);
    }
}
