//! File layer adapters.

pub mod local;
pub mod memory;

pub use local::LocalFileLayer;
pub use memory::MemoryFileLayer;
