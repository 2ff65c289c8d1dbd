// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in hooks and the factory that creates them by name.

mod authoriser;
mod monitor;

use crate::traits::Hook;
use std::sync::Arc;

pub use authoriser::OperationAuthoriser;
pub use monitor::{MonitorHook, TracingSink, TrackingSink, TrackingStage};

/// Factory for hooks named in executor properties
///
/// The authoriser is not listed here: it needs an auths file and is
/// configured through its own property.
pub struct HookFactory;

impl HookFactory {
    /// Create a hook from its configured name
    pub fn create_hook(name: &str) -> Result<Arc<dyn Hook>, String> {
        match name {
            "monitor" => Ok(Arc::new(MonitorHook::default())),
            _ => Err(format!("Unknown hook: '{}'", name)),
        }
    }

    /// List all available hook implementations
    pub fn list_available_implementations() -> Vec<&'static str> {
        vec!["monitor"]
    }

    /// Check if an implementation is available
    pub fn is_implementation_available(name: &str) -> bool {
        Self::list_available_implementations().contains(&name)
    }
}
