//! Core types for the voice bridge
//!
//! This crate provides foundational types used across all other crates:
//! - Call identity and lifecycle states
//! - Conversation history types

pub mod call;
pub mod conversation;

pub use call::{CallId, CallState, ParseCallIdError};
pub use conversation::{Speaker, Turn};
