//! keydesk core
//!
//! Domain types and pure logic shared by the licensing client and the bot:
//! the license key model, error handling, calendar-day arithmetic, cooldown
//! parsing, and the `LicenseApi` port.

pub mod cooldown;
pub mod dates;
pub mod error;
pub mod key;
pub mod ports;

pub use cooldown::CooldownSignal;
pub use error::{Error, Result};
pub use key::{KeyRecord, LicenseKey, Namespace};
pub use ports::{EditKeyRequest, GenerateKeyRequest, LicenseApi, ResetReply};
