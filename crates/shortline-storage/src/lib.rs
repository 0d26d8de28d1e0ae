//! Repository implementations backing the short code mapping.

pub mod memory;

pub use memory::InMemoryRepository;
pub use shortline_core::Repository;
