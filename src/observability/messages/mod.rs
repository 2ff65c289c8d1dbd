// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! # Organization
//!
//! * `engine` - executor lifecycle and dispatch events
//! * `hook` - hook failures, authorisation decisions and tracking records
//! * `job` - job lifecycle and worker pool events

use tracing::Span;

pub mod engine;
pub mod hook;
pub mod job;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog: std::fmt::Display {
    /// Emit the message as a `tracing` event at its level.
    fn log(&self);

    /// Open a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
