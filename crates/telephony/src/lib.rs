//! Telephony provider integration
//!
//! Outbound call placement against the provider's REST API, and signature
//! verification for provider webhooks.

pub mod client;
pub mod signature;

pub use client::{Dialer, TelephonyClient};

use thiserror::Error;

/// Telephony provider errors
#[derive(Error, Debug)]
pub enum TelephonyError {
    #[error("call placement request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider rejected call: {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    Malformed(String),
}
