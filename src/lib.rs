//! vidrelay - fetch remote videos and post them into chat under the upload cap
//!
//! This library crate exposes the core functionality for integration testing.

pub mod chat;
pub mod config;
pub mod pipeline;
