// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod handler;
pub mod hook;

pub use handler::OperationHandler;
pub use hook::Hook;
