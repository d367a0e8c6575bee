//! Shared types for SessionBridge: configuration, errors, the clock
//! abstraction, and structured trace events.

pub mod clock;
pub mod config;
pub mod error;
pub mod trace;
