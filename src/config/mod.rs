// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod declarations;
mod loader;

pub mod consts;

pub use declarations::{load_declarations, OperationDeclaration, OperationDeclarations};
pub use loader::{load_properties, ExecutorProperties, SerialiserProperties};
