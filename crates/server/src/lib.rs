//! Control server for the voice bridge
//!
//! Serves the provider-facing control endpoints (call-setup descriptor,
//! media stream upgrade) and a thin agent-facing HTTP surface over the
//! call manager.

pub mod http;
pub mod state;
pub mod ws;

pub use http::create_router;
pub use state::AppState;
