//! workbench - headless editor group workbench.
//!
//! Module layout:
//! - models: resource identifiers
//! - kernel: editor registry, editor groups, the editor service
//! - kernel::services: file layer and dialog ports with their adapters

pub mod kernel;
pub mod models;
