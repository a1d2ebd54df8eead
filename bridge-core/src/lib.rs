//! # Aura Bridge Core
//!
//! Core library for the Aura bridge: lets a remote client answer the menus of
//! a terminal-based coding assistant. Provides reply parsing and option
//! selection, per-session dispatch, terminal key injection, the WebSocket
//! gateway, configuration, and error types.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod selection;
pub mod terminal;

// Re-export commonly used types at the crate root.
pub use config::{load_config, BridgeConfig};
pub use dispatcher::SessionDispatcher;
pub use error::{BridgeError, ConfigError, InjectionError, ProtocolError, Result};
pub use gateway::{
    gateway_router, run_gateway, GatewayConfig, GatewayServer, InboundMessage, OutboundMessage,
    QuestionPayload, SharedGateway,
};
pub use selection::{parse_number, resolve, ActionOutcome, OptionRegistry, PendingQuestion};
pub use terminal::{
    build_injector, DryRunInjector, InjectorBackend, KeyCommand, TerminalConfig,
    TerminalInjector, TmuxInjector,
};
