//! HTTP façade of SessionBridge: routes, startup wiring and CLI helpers.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod credentials;
pub mod state;
