// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod operation;

pub use config::ConfigError;
pub use operation::{HookPhase, OperationError, OperationResult};
