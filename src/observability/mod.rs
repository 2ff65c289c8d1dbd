// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Diagnostic and operational log lines are emitted through message structs
//! rather than inline format strings. Each message implements `Display` for
//! the human-readable line and [`messages::StructuredLog`] for the structured
//! `tracing` event and span carrying the same fields.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - executor construction and dispatch lifecycle
//! * `messages::hook` - hook failures, authorisation and execution tracking
//! * `messages::job` - job scheduling, status changes and the worker pool
//!
//! # Usage
//!
//! ```rust
//! use maestro::observability::messages::job::WorkerPoolStarted;
//! use maestro::observability::messages::StructuredLog;
//!
//! WorkerPoolStarted { threads: 4 }.log();
//! ```

pub mod messages;
