//! Chat-facing layer for keydesk: action dispatch, cooldowns, rendering and
//! presence.

pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod handlers;
pub mod outcome;
pub mod presence;
pub mod rate_limit;
pub mod render;

pub use config::BotConfig;
pub use dispatcher::{ActionDispatcher, DispatchSettings};
pub use outcome::{Action, ActionKind, Failure, InboundEvent, Outcome, Payload, Plan};
pub use rate_limit::{Acquire, RateLimiter};
