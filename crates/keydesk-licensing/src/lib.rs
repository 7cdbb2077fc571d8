//! Remote licensing API client for keydesk.

pub mod client;
pub mod http;
pub mod wire;

pub use client::{Extension, LicenseClient};
pub use http::{HttpLicenseApi, LicenseApiConfig};
