//! Services layer (ports + adapters).
//!
//! - `ports`: contracts the editor service depends on.
//! - `adapters`: disk, terminal and in-memory implementations.

pub mod adapters;
pub mod ports;
