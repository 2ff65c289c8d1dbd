// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod cache;          // namespaced cache services
pub mod config;         // properties + declarations
pub mod context;        // user, context, request
pub mod errors;         // error handling
pub mod executor;       // dispatch pipeline
pub mod handlers;       // built-in operation handlers
pub mod hooks;          // authoriser + monitor
pub mod jobs;           // job tracking and worker pool
pub mod observability;
pub mod operation;      // operation model
pub mod serialisation;  // json/yaml wire format
pub mod traits;         // handler and hook contracts
